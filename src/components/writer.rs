use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::RgbImage;
use tracing::debug;

use crate::components::{
    codec::PayloadCodec,
    common::{PREVIEW_BLOCK, PRINTER_BLOCK, ThumbnailError},
    metadata::Metadata,
};

/// Base64 characters per block line.
pub const LINE_WIDTH: usize = 76;

/// Size the Marlin begin line always announces.
const DECLARED_SIZE: u32 = 300;

/// Trailing begin-line field the firmware expects but does not document.
const RESERVED: u32 = 500;

const FILLER: [&str; 5] = [
    ";Material Diameter:1.75",
    ";Material Density:1.24",
    ";Filament Cost:0.000000",
    ";Filament Weight:49.942665",
    ";Filament Length:16.744957",
];

/// Split base64 text into `; `-prefixed lines of at most [`LINE_WIDTH`]
/// characters.
pub fn chunk_lines(encoded: &str) -> Vec<String> {
    encoded
        .as_bytes()
        .chunks(LINE_WIDTH)
        .map(|chunk| format!("; {}", String::from_utf8_lossy(chunk)))
        .collect()
}

/// Serialise compressed image bytes as a Marlin comment block, including
/// the final line break.
pub fn format_block(
    name: &str,
    jpg: &[u8],
) -> String {
    let x1 = DECLARED_SIZE / 80 + 1;
    let x2 = DECLARED_SIZE - x1;
    let mut block = format!(
        "; {name} begin {DECLARED_SIZE}*{DECLARED_SIZE} {} {x1} {x2} {RESERVED}\n",
        jpg.len()
    );
    for line in chunk_lines(&STANDARD.encode(jpg)) {
        block.push_str(&line);
        block.push('\n');
    }
    block.push_str(&format!("; {name} end\n"));
    block
}

/// Encode `image` and serialise it under `name`.
pub fn write_block(
    codec: &PayloadCodec,
    name: &str,
    image: &RgbImage,
) -> Result<String, ThumbnailError> {
    let jpg = codec.encode(image)?;
    debug!("writing {} block ({} bytes)", name, jpg.len());
    Ok(format_block(name, &jpg))
}

/// The Marlin statistics header, one line per field.
pub fn format_header(metadata: &Metadata) -> String {
    let mut header = String::new();
    header.push_str(";FLAVOR:Marlin\n");
    header.push_str(&format!(";TIME:{}\n", metadata.duration));
    header.push_str(&format!(";Filament used:{:.6}m\n", metadata.filament));
    for line in FILLER {
        header.push_str(line);
        header.push('\n');
    }
    header.push_str(&format!(";Layer height:{:.2}\n", metadata.layer_height));
    header.push_str(&metadata.dimensions);
    header.push('\n');
    header
}

/// Drop lines that are nothing but `;` or `; `.
pub fn clean_residual(doc: &str) -> String {
    doc.split_inclusive('\n')
        .filter(|line| {
            let content = line.trim_end_matches('\n').trim_end_matches('\r');
            content != ";" && content != "; "
        })
        .collect()
}

/// Assemble the converted document.
///
/// Without an image both blocks and the blank line after the first one are
/// left out.
pub fn assemble(
    codec: &PayloadCodec,
    image: Option<&RgbImage>,
    metadata: &Metadata,
    residual: &str,
) -> Result<String, ThumbnailError> {
    let mut out = String::with_capacity(residual.len());
    if let Some(image) = image {
        out.push_str(&write_block(codec, PRINTER_BLOCK, image)?);
        out.push('\n');
    }
    out.push_str(&format_header(metadata));
    out.push('\n');
    if let Some(image) = image {
        out.push_str(&write_block(codec, PREVIEW_BLOCK, image)?);
    }
    out.push_str(&clean_residual(residual));
    Ok(out)
}
