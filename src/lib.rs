#![doc = include_str!("../README.md")]

mod components;

pub use components::codec::{PayloadCodec, to_rgb};
pub use components::common::{
    Config, DEFAULT_QUALITY, LAYER_HEIGHT_ENV, PREVIEW_BLOCK, PRINTER_BLOCK,
    SOURCE_BLOCK, ThumbnailError,
};
pub use components::convert::{convert_file, convert_gcode};
pub use components::extractor::{
    BlockExtractor, BlockHeader, DimensionsExtractor, ExtractedBlock,
};
pub use components::metadata::{Metadata, MetadataNormalizer};
pub use components::writer::{
    LINE_WIDTH, assemble, chunk_lines, clean_residual, format_block,
    format_header, write_block,
};
