use regex::Regex;
use tracing::{debug, warn};

use crate::components::common::ThumbnailError;

/// Layout declared on a block's begin line, `; <name> begin <W>x<H> <LEN>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub width: u32,
    pub height: u32,
    pub declared_len: usize,
}

impl BlockHeader {
    /// Whether `len` decoded bytes agree with the declared length.
    pub fn len_matches(&self, len: usize) -> bool {
        self.declared_len == len
    }

    /// Whether a decoded raster agrees with the declared size.
    pub fn size_matches(
        &self,
        width: u32,
        height: u32,
    ) -> bool {
        (self.width, self.height) == (width, height)
    }
}

/// A block lifted out of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBlock {
    pub header: BlockHeader,
    /// The base64 body with comment prefixes and line breaks removed.
    pub payload: String,
}

/// Finds and removes a named base64 block from free-form G-code text.
#[derive(Debug)]
pub struct BlockExtractor {
    begin: Regex,
    size: Regex,
    end: Regex,
}

impl BlockExtractor {
    pub fn new(name: &str) -> Result<Self, ThumbnailError> {
        let name = regex::escape(name);
        Ok(Self {
            begin: Regex::new(&format!(r"; {name} begin[^\n]*\n"))?,
            size: Regex::new(&format!(r"; {name} begin (\d+)x(\d+) (\d+)"))?,
            end: Regex::new(&format!(r"; {name} end"))?,
        })
    }

    /// Remove the first block from `doc`.
    ///
    /// Returns `None` and leaves `doc` untouched unless the begin line,
    /// the size declaration and an end marker following the begin line are
    /// all present. The removed span runs from the start of the size
    /// declaration to the end of the end marker; the line break after the
    /// end marker stays in the document.
    pub fn extract(
        &self,
        doc: &mut String,
    ) -> Option<ExtractedBlock> {
        let Some(begin) = self.begin.find(doc) else {
            warn!("no thumbnail begin marker found");
            return None;
        };
        let Some(size) = self.size.captures(doc) else {
            warn!("no thumbnail size declaration found");
            return None;
        };
        let Some(end) = self.end.find_at(doc, begin.end()) else {
            warn!("no thumbnail end marker found");
            return None;
        };

        let first = size.get(0)?.start();
        let last = end.end();
        if first != begin.start() {
            warn!("thumbnail size declaration is detached from its block");
            return None;
        }

        let (Ok(width), Ok(height), Ok(declared_len)) =
            (size[1].parse::<u32>(), size[2].parse::<u32>(), size[3].parse::<usize>())
        else {
            warn!("thumbnail size declaration {:?} is out of range", &size[0]);
            return None;
        };
        let header = BlockHeader {
            width,
            height,
            declared_len,
        };
        let payload = strip_body(&doc[begin.end()..end.start()]);
        debug!(
            "found {}x{} block at {}..{} ({} base64 chars)",
            header.width,
            header.height,
            first,
            last,
            payload.len()
        );

        doc.replace_range(first..last, "");
        Some(ExtractedBlock { header, payload })
    }
}

/// Join comment-prefixed body lines back into one base64 string.
pub fn strip_body(body: &str) -> String {
    body.replace("; ", "")
        .chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .collect()
}

/// Finds and removes the `;MINX:..;MAXZ:..` bounding box comment.
#[derive(Debug)]
pub struct DimensionsExtractor {
    pattern: Regex,
}

impl DimensionsExtractor {
    pub fn new() -> Result<Self, ThumbnailError> {
        let field = r"-?[0-9]+(?:\.[0-9]*)?";
        let pattern = ["MINX", "MINY", "MINZ", "MAXX", "MAXY", "MAXZ"]
            .iter()
            .map(|axis| format!(";{axis}:{field}"))
            .collect::<Vec<_>>()
            .join(r"\s*");
        Ok(Self {
            pattern: Regex::new(&format!(r"({pattern})(?:\r?\n)?"))?,
        })
    }

    /// Remove the first bounding box from `doc`, returning its text, or an
    /// empty string when there is none.
    pub fn extract(
        &self,
        doc: &mut String,
    ) -> String {
        let Some(caps) = self.pattern.captures(doc) else {
            warn!("no dimensions found");
            return String::new();
        };
        let (Some(span), Some(value)) = (caps.get(0), caps.get(1)) else {
            return String::new();
        };
        let range = span.range();
        let value = value.as_str().to_string();
        doc.replace_range(range, "");
        value
    }
}
