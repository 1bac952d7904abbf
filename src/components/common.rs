use std::{env, path::PathBuf};

use thiserror::Error;

/// Name of the block PrusaSlicer writes its JPG thumbnail into.
pub const SOURCE_BLOCK: &str = "thumbnail_JPG";

/// Name of the block the printer firmware reads.
pub const PRINTER_BLOCK: &str = "jpg";

/// Name of the block the printer UI previews.
pub const PREVIEW_BLOCK: &str = "thumbnail";

/// Environment variable PrusaSlicer exports to post-processing scripts.
pub const LAYER_HEIGHT_ENV: &str = "SLIC3R_LAYER_HEIGHT";

/// JPG quality used when re-encoding the thumbnail.
pub const DEFAULT_QUALITY: u8 = 40;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("thumbnail payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("thumbnail payload is not a readable image: {0}")]
    Format(#[source] image::ImageError),
    #[error("failed to encode thumbnail: {0}")]
    Encode(#[source] image::ImageError),
    #[error("{variable}={value:?} is not a decimal number")]
    Config { variable: &'static str, value: String },
    #[error("invalid block pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write output: {0}")]
    Assembly(#[from] std::io::Error),
}

/// Values that come from outside the document being converted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub layer_height: f64,
    pub quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layer_height: 0.0,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl Config {
    /// Read the layer height from [`LAYER_HEIGHT_ENV`].
    pub fn from_env() -> Result<Self, ThumbnailError> {
        let value = env::var(LAYER_HEIGHT_ENV).ok();
        Self::from_env_value(value.as_deref())
    }

    /// Build a config from the raw value of [`LAYER_HEIGHT_ENV`].
    ///
    /// An absent variable means a layer height of 0. A present but
    /// unparsable one is an error rather than a silent 0.
    pub fn from_env_value(value: Option<&str>) -> Result<Self, ThumbnailError> {
        let layer_height = match value {
            None => 0.0,
            Some(v) => v.trim().parse::<f64>().map_err(|_| {
                ThumbnailError::Config {
                    variable: LAYER_HEIGHT_ENV,
                    value: v.to_string(),
                }
            })?,
        };
        Ok(Self {
            layer_height,
            ..Self::default()
        })
    }
}
