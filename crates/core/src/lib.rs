//! Core domain types and font inventory scanning for slide decks.

pub mod error;
pub mod fonts;
pub mod scan;
pub mod types;

pub use error::{Error, Result};
pub use fonts::{FontArchive, FontSet};
pub use scan::FontScanner;
pub use types::{
    Chart, ChartSeries, DataLabel, DataPoint, Paragraph, Presentation, PresentationFormat, Run,
    Shape, Slide, Table, TableCell, TableRow, TextFrame,
};
