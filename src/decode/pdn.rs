//! paint.net (`.pdn`) document adapter.
//!
//! A `.pdn` file is a small container: the `PDN3` magic, a length-prefixed
//! XML header, a two-byte data-format indicator, a .NET remoting object
//! graph describing the document and its layers, and finally the deferred
//! layer bitmaps as gzip-or-plain chunked blocks. Pixels are BGRA with a
//! row stride; this adapter converts each layer into a tightly-packed
//! RGBA [`PixelBuffer`].

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;

use super::nrbf::{self, as_i64, Instance, Object, Stream, Value};
use crate::error::{BakeError, Result};
use crate::types::{Layer, LayeredDocument, PixelBuffer};

const MAGIC: &[u8; 4] = b"PDN3";
const DATA_INDICATOR: [u8; 2] = [0x00, 0x01];

/// Deferred-block payload encodings.
const FORMAT_GZIP: u8 = 0;
const FORMAT_PLAIN: u8 = 1;

/// Decode a `.pdn` file into a layered document.
pub fn decode_pdn(path: &Path) -> Result<LayeredDocument> {
    let bytes = std::fs::read(path).map_err(|e| BakeError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to read file: {}", e),
    })?;

    decode_document(&bytes).map_err(|message| BakeError::Decode {
        path: path.to_path_buf(),
        message,
    })
}

/// Decode an in-memory `.pdn` byte stream.
fn decode_document(bytes: &[u8]) -> std::result::Result<LayeredDocument, String> {
    let mut pos = 0usize;

    let magic = take(bytes, &mut pos, 4)?;
    if magic != MAGIC {
        return Err("not a paint.net document (bad magic)".to_string());
    }

    // Header length is a 3-byte little-endian integer.
    let len_bytes = take(bytes, &mut pos, 3)?;
    let header_len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], 0]) as usize;
    let header = take(bytes, &mut pos, header_len)?;
    std::str::from_utf8(header).map_err(|_| "document header is not UTF-8".to_string())?;

    let indicator = take(bytes, &mut pos, 2)?;
    if indicator != DATA_INDICATOR {
        return Err("unexpected data-format indicator".to_string());
    }

    let (stream, consumed) = nrbf::parse(&bytes[pos..])
        .map_err(|e| format!("invalid document object stream: {}", e))?;
    pos += consumed;

    let deferred = read_deferred_blocks(&stream, bytes, &mut pos)?;
    assemble(&stream, &deferred)
}

fn take<'a>(bytes: &'a [u8], pos: &mut usize, n: usize) -> std::result::Result<&'a [u8], String> {
    if *pos + n > bytes.len() {
        return Err("unexpected end of file".to_string());
    }
    let slice = &bytes[*pos..*pos + n];
    *pos += n;
    Ok(slice)
}

/// Read the chunked payloads that follow the object stream.
///
/// Blocks appear in the order their memory-block objects were serialized.
/// Each block: a format byte (gzip or plain), a big-endian chunk size,
/// then `(chunk number, data size, data)` triples until the block's
/// declared length is filled.
fn read_deferred_blocks(
    stream: &Stream,
    bytes: &[u8],
    pos: &mut usize,
) -> std::result::Result<HashMap<i32, Vec<u8>>, String> {
    let mut blocks = HashMap::new();

    for id in stream.instances_where(|name| name.ends_with("MemoryBlock")) {
        let inst = match stream.get(id) {
            Some(Object::Instance(inst)) => inst,
            _ => continue,
        };
        if !member_bool(inst, "deferred").unwrap_or(false) {
            continue;
        }
        let length = block_length(inst)
            .ok_or_else(|| "memory block is missing its length".to_string())?;

        let format = take(bytes, pos, 1)?[0];
        if format != FORMAT_GZIP && format != FORMAT_PLAIN {
            return Err(format!("unknown deferred block format {}", format));
        }
        let chunk_size = u32::from_be_bytes(take(bytes, pos, 4)?.try_into().unwrap()) as usize;
        if chunk_size == 0 {
            return Err("deferred block chunk size is zero".to_string());
        }

        let mut data = vec![0u8; length];
        let mut filled = 0usize;
        while filled < length {
            let chunk_number =
                u32::from_be_bytes(take(bytes, pos, 4)?.try_into().unwrap()) as usize;
            let data_size = u32::from_be_bytes(take(bytes, pos, 4)?.try_into().unwrap()) as usize;
            let raw = take(bytes, pos, data_size)?;

            let offset = chunk_number * chunk_size;
            if offset >= length {
                return Err("deferred chunk offset out of range".to_string());
            }
            let want = chunk_size.min(length - offset);
            let chunk = if format == FORMAT_GZIP {
                let mut decoded = Vec::with_capacity(want);
                GzDecoder::new(raw)
                    .read_to_end(&mut decoded)
                    .map_err(|e| format!("failed to decompress layer data: {}", e))?;
                decoded
            } else {
                raw.to_vec()
            };
            if chunk.len() != want {
                return Err(format!(
                    "deferred chunk has {} bytes, expected {}",
                    chunk.len(),
                    want
                ));
            }
            data[offset..offset + want].copy_from_slice(&chunk);
            filled += want;
        }

        blocks.insert(id, data);
    }

    Ok(blocks)
}

fn block_length(inst: &Instance) -> Option<usize> {
    ["length64", "length"]
        .iter()
        .find_map(|name| inst.member(name).and_then(as_i64))
        .and_then(|v| usize::try_from(v).ok())
}

/// Walk the object graph and build the layered document.
fn assemble(
    stream: &Stream,
    deferred: &HashMap<i32, Vec<u8>>,
) -> std::result::Result<LayeredDocument, String> {
    let doc = stream.root().map_err(|e| e.to_string())?;
    let width = member_u32(doc, "width").ok_or("document has no width")?;
    let height = member_u32(doc, "height").ok_or("document has no height")?;

    let layer_list = stream
        .member_instance(doc, "layers")
        .map_err(|e| e.to_string())?;
    let items = match layer_list.member("_items") {
        Some(value) => match stream.deref(value).map_err(|e| e.to_string())? {
            Object::Array(values) => values,
            _ => return Err("layer list is not an array".to_string()),
        },
        None => return Err("layer list has no items".to_string()),
    };
    let count = layer_list
        .member("_size")
        .and_then(as_i64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(items.len());

    let mut layers = Vec::new();
    for value in items.iter().take(count) {
        if matches!(value, Value::Null) {
            continue;
        }
        let layer = stream.deref_instance(value).map_err(|e| e.to_string())?;
        layers.push(read_layer(stream, layer, deferred)?);
    }

    Ok(LayeredDocument::new(width, height, layers))
}

fn read_layer(
    stream: &Stream,
    layer: &Instance,
    deferred: &HashMap<i32, Vec<u8>>,
) -> std::result::Result<Layer, String> {
    let props = stream
        .member_instance(layer, "properties")
        .map_err(|e| e.to_string())?;
    let name = stream
        .member_string(props, "name")
        .map_err(|e| e.to_string())?;
    let visible = member_bool(props, "visible").unwrap_or(true);
    let opacity = props
        .member("opacity")
        .and_then(as_i64)
        .map(|v| v.clamp(0, 255) as u8)
        .unwrap_or(255);

    let surface = stream
        .member_instance(layer, "surface")
        .map_err(|e| e.to_string())?;
    let width = member_u32(surface, "width")
        .ok_or_else(|| format!("layer '{}' surface has no width", name))?;
    let height = member_u32(surface, "height")
        .ok_or_else(|| format!("layer '{}' surface has no height", name))?;
    let stride = member_u32(surface, "stride")
        .ok_or_else(|| format!("layer '{}' surface has no stride", name))? as usize;

    let scan0 = surface
        .member("scan0")
        .ok_or_else(|| format!("layer '{}' surface has no pixel block", name))?;
    let data = block_data(stream, scan0, deferred)
        .ok_or_else(|| format!("layer '{}' has no pixel data", name))?;

    let image = bgra_to_buffer(data, width, height, stride)
        .map_err(|e| format!("layer '{}': {}", name, e))?;

    Ok(Layer {
        name,
        visible,
        opacity,
        image,
    })
}

/// Resolve a surface's scan0 reference to its bytes: deferred payload
/// first, then any inline byte-array member.
fn block_data<'a>(
    stream: &'a Stream,
    scan0: &Value,
    deferred: &'a HashMap<i32, Vec<u8>>,
) -> Option<&'a [u8]> {
    let id = match scan0 {
        Value::Ref(id) => *id,
        _ => return None,
    };
    if let Some(data) = deferred.get(&id) {
        return Some(data);
    }
    match stream.get(id)? {
        Object::Bytes(data) => Some(data),
        Object::Instance(inst) => inst.members.iter().find_map(|v| match stream.deref(v) {
            Ok(Object::Bytes(data)) => Some(data.as_slice()),
            _ => None,
        }),
        _ => None,
    }
}

fn bgra_to_buffer(
    data: &[u8],
    width: u32,
    height: u32,
    stride: usize,
) -> std::result::Result<PixelBuffer, String> {
    let row_bytes = width as usize * 4;
    if stride < row_bytes {
        return Err(format!("stride {} below row size {}", stride, row_bytes));
    }
    if data.len() < stride * height as usize {
        return Err(format!(
            "pixel block has {} bytes, needs {}",
            data.len(),
            stride * height as usize
        ));
    }

    let mut rgba = Vec::with_capacity(row_bytes * height as usize);
    for y in 0..height as usize {
        let row = &data[y * stride..y * stride + row_bytes];
        for px in row.chunks_exact(4) {
            rgba.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
        }
    }
    PixelBuffer::from_raw(width, height, rgba).map_err(|e| e.to_string())
}

fn member_bool(inst: &Instance, name: &str) -> Option<bool> {
    match inst.member(name) {
        Some(Value::Bool(v)) => Some(*v),
        _ => None,
    }
}

fn member_u32(inst: &Instance, name: &str) -> Option<u32> {
    inst.member(name)
        .and_then(as_i64)
        .and_then(|v| u32::try_from(v).ok())
}
