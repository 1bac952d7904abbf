use std::{fs, io::Write, path::Path};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::components::{
    codec::PayloadCodec,
    common::{Config, SOURCE_BLOCK, ThumbnailError},
    extractor::{BlockExtractor, DimensionsExtractor},
    metadata::MetadataNormalizer,
    writer::assemble,
};

/// Convert a PrusaSlicer G-code document into the Marlin thumbnail layout.
///
/// The `thumbnail_JPG` block is lifted out and re-emitted as a `jpg` block
/// and a `thumbnail` block around a Marlin statistics header. A document
/// without the block still gets the header.
pub fn convert_gcode(
    gcode: &str,
    config: &Config,
) -> Result<String, ThumbnailError> {
    let codec = PayloadCodec::new(config);
    let normalizer = MetadataNormalizer::new(config)?;

    let mut doc = gcode.to_string();
    let block = BlockExtractor::new(SOURCE_BLOCK)?.extract(&mut doc);
    let image = match block {
        Some(block) => {
            let bytes = codec.decode_bytes(&block.payload)?;
            if !block.header.len_matches(bytes.len()) {
                warn!(
                    "thumbnail declared as {} bytes but decoded to {}",
                    block.header.declared_len,
                    bytes.len()
                );
            }
            let image = codec.decode_image(&bytes)?;
            if !block.header.size_matches(image.width(), image.height()) {
                warn!(
                    "thumbnail declared as {}x{} but decoded as {}x{}",
                    block.header.width,
                    block.header.height,
                    image.width(),
                    image.height()
                );
            }
            Some(image)
        }
        None => None,
    };

    let dimensions = DimensionsExtractor::new()?.extract(&mut doc);
    let metadata = normalizer.normalize(&doc, dimensions);
    assemble(&codec, image.as_ref(), &metadata, &doc)
}

/// Convert the G-code file at `input` and write the result to `output`.
///
/// The result goes to a temporary file next to `output` which is then
/// renamed over it, so `output` is either fully replaced or left as it was.
/// The result takes the permissions of `output`, or of `input` when
/// `output` does not exist yet. `input` and `output` may be the same path.
pub fn convert_file(
    input: &Path,
    output: &Path,
    config: &Config,
) -> Result<(), ThumbnailError> {
    let gcode = fs::read_to_string(input).map_err(|source| ThumbnailError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let converted = convert_gcode(&gcode, config)?;

    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(converted.as_bytes())?;
    tmp.as_file().sync_all()?;
    // Keep the mode of the file being replaced, not the temp file's 0600.
    let permissions = match fs::metadata(output) {
        Ok(meta) => meta.permissions(),
        Err(_) => fs::metadata(input)?.permissions(),
    };
    tmp.as_file().set_permissions(permissions)?;
    debug!("persisting {} bytes to {}", converted.len(), output.display());
    tmp.persist(output).map_err(|e| ThumbnailError::Assembly(e.error))?;
    Ok(())
}
