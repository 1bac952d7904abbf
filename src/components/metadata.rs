use regex::Regex;
use tracing::{debug, warn};

use crate::components::common::{Config, ThumbnailError};

/// The print statistics carried into the Marlin header.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata {
    /// Estimated print time in seconds.
    pub duration: u64,
    /// Filament used in meters.
    pub filament: f64,
    pub layer_height: f64,
    /// The `;MINX:..;MAXZ:..` text, or empty when the file has none.
    pub dimensions: String,
}

/// Reads the PrusaSlicer statistics comments out of G-code text.
#[derive(Debug)]
pub struct MetadataNormalizer {
    time: Regex,
    days: Regex,
    hours: Regex,
    minutes: Regex,
    seconds: Regex,
    filament: Regex,
    layer_height: f64,
}

impl MetadataNormalizer {
    pub fn new(config: &Config) -> Result<Self, ThumbnailError> {
        Ok(Self {
            time: Regex::new(r"; estimated printing time \(normal mode\) = (.*)\n")?,
            days: Regex::new(r"(\d+)d")?,
            hours: Regex::new(r"(\d+)h")?,
            minutes: Regex::new(r"(\d+)m")?,
            seconds: Regex::new(r"(\d+)s")?,
            filament: Regex::new(r"; filament used \[mm\] = ([0-9.]+)")?,
            layer_height: config.layer_height,
        })
    }

    /// Collect every field, substituting defaults for the ones that are
    /// missing. `dimensions` is taken as already extracted.
    pub fn normalize(
        &self,
        doc: &str,
        dimensions: String,
    ) -> Metadata {
        let metadata = Metadata {
            duration: self.duration(doc),
            filament: self.filament(doc),
            layer_height: self.layer_height,
            dimensions,
        };
        debug!("{:?}", metadata);
        metadata
    }

    /// Estimated print time in seconds, 0 when absent.
    pub fn duration(
        &self,
        doc: &str,
    ) -> u64 {
        let Some(caps) = self.time.captures(doc) else {
            return 0;
        };
        let text = &caps[1];
        let units = [
            (&self.days, 86_400u64),
            (&self.hours, 3600),
            (&self.minutes, 60),
            (&self.seconds, 1),
        ];
        // A total that does not fit is treated like a missing line.
        units
            .iter()
            .try_fold(0u64, |total, (re, scale)| {
                let count: u64 = re
                    .captures(text)
                    .and_then(|c| c[1].parse().ok())
                    .unwrap_or(0);
                total.checked_add(count.checked_mul(*scale)?)
            })
            .unwrap_or_else(|| {
                warn!("estimated printing time {:?} is out of range", text);
                0
            })
    }

    /// Filament used in meters, 0 when absent.
    pub fn filament(
        &self,
        doc: &str,
    ) -> f64 {
        self.filament
            .captures(doc)
            .and_then(|c| c[1].parse::<f64>().ok())
            .map(|mm| mm / 1000.0)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> MetadataNormalizer {
        MetadataNormalizer::new(&Config::default()).unwrap()
    }

    #[test]
    fn parses_full_duration() {
        let doc = "; estimated printing time (normal mode) = 1h 2m 3s\n";
        assert_eq!(normalizer().duration(doc), 3723);
    }

    #[test]
    fn parses_partial_duration() {
        let doc = "G28\n; estimated printing time (normal mode) = 42m 7s\nG1\n";
        assert_eq!(normalizer().duration(doc), 42 * 60 + 7);
        let doc = "; estimated printing time (normal mode) = 2h\n";
        assert_eq!(normalizer().duration(doc), 7200);
    }

    #[test]
    fn parses_days() {
        let doc = "; estimated printing time (normal mode) = 1d 0h 1m 0s\n";
        assert_eq!(normalizer().duration(doc), 86_460);
    }

    #[test]
    fn silent_mode_time_is_ignored() {
        let doc = "; estimated printing time (silent mode) = 1h\n";
        assert_eq!(normalizer().duration(doc), 0);
    }

    #[test]
    fn oversized_duration_is_zero() {
        let doc = "; estimated printing time (normal mode) = 99999999999999999h\n";
        assert_eq!(normalizer().duration(doc), 0);
        let doc = format!(
            "; estimated printing time (normal mode) = {}d {}s\n",
            u64::MAX / 86_400,
            u64::MAX
        );
        assert_eq!(normalizer().duration(&doc), 0);
    }

    #[test]
    fn missing_duration_is_zero() {
        assert_eq!(normalizer().duration("G28\n"), 0);
    }

    #[test]
    fn parses_filament() {
        let doc = "; filament used [mm] = 2500.0\n";
        assert_eq!(normalizer().filament(doc), 2.5);
    }

    #[test]
    fn missing_or_garbled_filament_is_zero() {
        assert_eq!(normalizer().filament("G28\n"), 0.0);
        assert_eq!(normalizer().filament("; filament used [mm] = 1.2.3\n"), 0.0);
    }

    #[test]
    fn layer_height_comes_from_config() {
        let config = Config {
            layer_height: 0.2,
            ..Config::default()
        };
        let metadata = MetadataNormalizer::new(&config)
            .unwrap()
            .normalize("G28\n", String::new());
        assert_eq!(metadata.layer_height, 0.2);
        assert_eq!(metadata.duration, 0);
        assert_eq!(metadata.filament, 0.0);
        assert_eq!(metadata.dimensions, "");
    }
}
