pub mod bake;
pub mod completions;
pub mod flatten;
pub mod scale;
pub mod tile;

use clap::{Parser, Subcommand};

/// pxbake - layered pixel-art document baker
#[derive(Parser, Debug)]
#[command(name = "pxbake")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the batch described by pxbake.yaml
    Bake(bake::BakeArgs),

    /// Tile a source image a given number of times in each direction
    Tile(tile::TileArgs),

    /// Flatten a layered document into a single PNG
    Flatten(flatten::FlattenArgs),

    /// Integer-upscale a source image, optionally splitting it first
    Scale(scale::ScaleArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}
