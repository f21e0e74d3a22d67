//! DrawingML text body reading (`a:p` / `a:r` / `a:rPr`).
//!
//! Shared by slide shapes (`p:txBody`), table cells (`a:txBody`) and chart
//! rich text (`c:rich`). The caller feeds the events that occur between the
//! body's start and end tags.

use fontpush_core::{Paragraph, Run, TextFrame};
use quick_xml::events::BytesStart;

/// Incremental builder for one text body.
#[derive(Debug, Default)]
pub(crate) struct TextBodyReader {
    paragraphs: Vec<Paragraph>,
    paragraph: Option<Vec<Run>>,
    run: Option<Run>,
    in_run_props: bool,
    in_text: bool,
}

impl TextBodyReader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start(&mut self, local: &[u8], e: &BytesStart<'_>) {
        match local {
            b"p" => self.paragraph = Some(Vec::new()),
            b"r" if self.paragraph.is_some() => self.run = Some(Run::default()),
            b"rPr" if self.run.is_some() => self.in_run_props = true,
            b"t" if self.run.is_some() => self.in_text = true,
            _ => self.typeface(local, e),
        }
    }

    pub(crate) fn empty(&mut self, local: &[u8], e: &BytesStart<'_>) {
        match local {
            b"p" => self.paragraphs.push(Paragraph::default()),
            _ => self.typeface(local, e),
        }
    }

    pub(crate) fn text(&mut self, text: &str) {
        if self.in_text {
            if let Some(run) = self.run.as_mut() {
                run.text.push_str(text);
            }
        }
    }

    pub(crate) fn end(&mut self, local: &[u8]) {
        match local {
            b"t" => self.in_text = false,
            b"rPr" => self.in_run_props = false,
            b"r" => {
                if let (Some(run), Some(paragraph)) = (self.run.take(), self.paragraph.as_mut()) {
                    paragraph.push(run);
                }
            }
            b"p" => {
                if let Some(runs) = self.paragraph.take() {
                    self.paragraphs.push(Paragraph::new(runs));
                }
            }
            _ => {}
        }
    }

    pub(crate) fn finish(self) -> TextFrame {
        TextFrame::new(self.paragraphs)
    }

    /// `a:latin/@typeface` directly inside a run's `a:rPr`.
    ///
    /// Paragraph defaults (`a:defRPr`) and end-of-paragraph properties
    /// (`a:endParaRPr`) are not run properties and are ignored.
    fn typeface(&mut self, local: &[u8], e: &BytesStart<'_>) {
        if local != b"latin" || !self.in_run_props {
            return;
        }
        if let Some(run) = self.run.as_mut() {
            run.font_name = attr_value(e, b"typeface").filter(|name| !name.is_empty());
        }
    }
}

/// Read an attribute by local name, ignoring any namespace prefix.
pub(crate) fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}
