use miette::Diagnostic;
use thiserror::Error;

/// Main error type for pxbake operations
#[derive(Error, Diagnostic, Debug)]
pub enum BakeError {
    #[error("Unsupported source format: {path}")]
    #[diagnostic(code(pxbake::format))]
    UnsupportedFormat {
        path: std::path::PathBuf,
        #[help]
        help: Option<String>,
    },

    #[error("Invalid argument: {message}")]
    #[diagnostic(code(pxbake::args))]
    InvalidArgument {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Shape mismatch: {message}")]
    #[diagnostic(code(pxbake::shape))]
    ShapeMismatch { message: String },

    #[error("Empty result: {message}")]
    #[diagnostic(code(pxbake::empty))]
    EmptyResult { message: String },

    #[error("Failed to decode {path}: {message}")]
    #[diagnostic(code(pxbake::decode))]
    Decode {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Failed to write {path}: {message}")]
    #[diagnostic(code(pxbake::write))]
    Write {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("IO error: {0}")]
    #[diagnostic(code(pxbake::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(pxbake::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(pxbake::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Batch failed: {message}")]
    #[diagnostic(code(pxbake::batch))]
    Batch { message: String },
}

impl BakeError {
    /// Short kind label used when reporting batch-item failures.
    pub fn kind(&self) -> &'static str {
        match self {
            BakeError::UnsupportedFormat { .. } => "unsupported format",
            BakeError::InvalidArgument { .. } => "invalid argument",
            BakeError::ShapeMismatch { .. } => "shape mismatch",
            BakeError::EmptyResult { .. } => "empty result",
            BakeError::Decode { .. } => "decode failure",
            BakeError::Write { .. } => "write failure",
            BakeError::IoError(_) | BakeError::Io { .. } => "io error",
            BakeError::Parse { .. } => "parse error",
            BakeError::Batch { .. } => "batch failure",
        }
    }
}

pub type Result<T> = std::result::Result<T, BakeError>;
