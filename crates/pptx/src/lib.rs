//! PPTX (Office Open XML) reader for font inventory scanning.
//!
//! Parses .pptx files which are ZIP archives containing XML documents and
//! produces the shape tree model from `fontpush-core`.

mod chart;
pub mod parser;
mod rels;
mod slide;
mod text;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use parser::{scan_file, PptxParser};
