//! Font inventory scanning.
//!
//! Walks the top-level shapes of every slide and collects the explicit
//! typeface of each text run found in shape text, table cells and chart
//! data labels. Theme fonts, master/layout runs and embedded fonts are not
//! consulted, and group shapes are not descended into.

use crate::{FontSet, Presentation, Shape, TextFrame};

/// Collects the distinct font family names used by a presentation.
#[derive(Debug, Clone, Default)]
pub struct FontScanner;

impl FontScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self
    }

    /// Scan a whole presentation.
    pub fn scan(&self, presentation: &Presentation) -> FontSet {
        let mut fonts = FontSet::new();
        for shape in presentation.shapes() {
            self.scan_shape(shape, &mut fonts);
        }
        log::debug!(
            "Found {} distinct fonts in {} ({} slides)",
            fonts.len(),
            presentation.filename,
            presentation.slides.len()
        );
        fonts
    }

    /// Add the fonts of one shape to `fonts`.
    pub fn scan_shape(&self, shape: &Shape, fonts: &mut FontSet) {
        if let Some(frame) = shape.text_frame() {
            collect_from_text_frame(frame, fonts);
        }

        if let Some(table) = shape.table() {
            for cell in table.cells() {
                collect_from_text_frame(&cell.text_frame, fonts);
            }
        }

        if let Some(chart) = shape.chart() {
            let label_frames = chart
                .points()
                .filter_map(|p| p.data_label.as_ref())
                .filter_map(|l| l.text_frame.as_ref());
            for frame in label_frames {
                collect_from_text_frame(frame, fonts);
            }
        }
    }
}

fn collect_from_text_frame(frame: &TextFrame, fonts: &mut FontSet) {
    for run in frame.runs() {
        if let Some(name) = run.font_name.as_deref() {
            fonts.insert(name);
        }
    }
}
