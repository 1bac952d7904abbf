pub mod codec;
pub mod common;
pub mod convert;
pub mod extractor;
pub mod metadata;
pub mod writer;
