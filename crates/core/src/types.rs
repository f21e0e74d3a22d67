//! Domain types for representing a parsed slide deck.
//!
//! The model only carries what font scanning needs: the shape tree of each
//! slide down to individual text runs. It is read-only once built.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Represents an entire presentation with its parsed shape tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentation {
    /// Original filename (without path).
    pub filename: String,

    /// Detected format of the source file.
    pub format: PresentationFormat,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Presentation {
    /// Create a new presentation with the given filename and format.
    pub fn new(filename: impl Into<String>, format: PresentationFormat) -> Self {
        Self {
            filename: filename.into(),
            format,
            slides: Vec::new(),
        }
    }

    /// Add a slide to the presentation.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Iterate over every top-level shape of every slide, in order.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.slides.iter().flat_map(|s| s.shapes.iter())
    }
}

/// The format of the source presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary). Detected but not parsed.
    Ppt,
}

impl PresentationFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "ppt" => Some(Self::Ppt),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        // PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Ppt);
        }

        None
    }
}

/// A single slide and its top-level shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,

    /// Shapes directly under the slide's shape tree, in document order.
    pub shapes: Vec<Shape>,
}

impl Slide {
    /// Create a new, empty slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            shapes: Vec::new(),
        }
    }

    /// Add a shape to this slide.
    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }
}

/// A shape on a slide.
///
/// A shape may carry any combination of a text frame, a table and a chart.
/// Pictures, connectors and group shapes carry none of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shape {
    /// Shape name from its non-visual properties (`cNvPr/@name`).
    pub name: String,

    text_frame: Option<TextFrame>,
    table: Option<Table>,
    chart: Option<Chart>,
}

impl Shape {
    /// Create a shape with no capabilities.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_text_frame(mut self, frame: TextFrame) -> Self {
        self.text_frame = Some(frame);
        self
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    pub fn with_chart(mut self, chart: Chart) -> Self {
        self.chart = Some(chart);
        self
    }

    pub fn text_frame(&self) -> Option<&TextFrame> {
        self.text_frame.as_ref()
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn chart(&self) -> Option<&Chart> {
        self.chart.as_ref()
    }
}

/// Text body of a shape, table cell or data label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextFrame {
    pub paragraphs: Vec<Paragraph>,
}

impl TextFrame {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }

    /// Iterate over every run of every paragraph.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.paragraphs.iter().flat_map(|p| p.runs.iter())
    }

    /// Concatenated text of the frame, one line per paragraph.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A paragraph of runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>) -> Self {
        Self { runs }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// The smallest unit of styled text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Text content of the run.
    pub text: String,

    /// Explicit latin typeface. `None` when the run inherits its font.
    pub font_name: Option<String>,
}

impl Run {
    pub fn new(text: impl Into<String>, font_name: Option<String>) -> Self {
        Self {
            text: text.into(),
            font_name,
        }
    }
}

/// A table held by a graphic frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Iterate over all cells, row by row.
    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.rows.iter().flat_map(|r| r.cells.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

/// A table cell. Every cell has a text frame, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub text_frame: TextFrame,
}

/// A chart held by a graphic frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub series: Vec<ChartSeries>,
}

impl Chart {
    /// Iterate over the stored data points of every series.
    pub fn points(&self) -> impl Iterator<Item = &DataPoint> {
        self.series.iter().flat_map(|s| s.points.values())
    }
}

/// One chart series.
///
/// Points are stored sparsely by index: only points that carry a data label
/// are kept, and `point_count` records how many points the series has.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub point_count: usize,
    pub points: BTreeMap<usize, DataPoint>,
}

impl ChartSeries {
    pub fn new(point_count: usize) -> Self {
        Self {
            point_count,
            points: BTreeMap::new(),
        }
    }

    /// Store `point` at `idx`. Indices outside the series are ignored.
    pub fn insert_point(&mut self, idx: usize, point: DataPoint) -> bool {
        if idx >= self.point_count {
            return false;
        }
        self.points.insert(idx, point);
        true
    }

    /// The point at `idx`; a point without a label is `None`.
    pub fn point(&self, idx: usize) -> Option<&DataPoint> {
        self.points.get(&idx)
    }
}

/// One data point of a series and its optional label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub data_label: Option<DataLabel>,
}

/// Per-point data label. Only labels with custom rich text carry a frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataLabel {
    pub text_frame: Option<TextFrame>,
}
