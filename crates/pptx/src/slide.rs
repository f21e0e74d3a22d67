//! Slide part reading: top-level shapes of `p:cSld/p:spTree`.

use crate::text::{attr_value, local_name, TextBodyReader};
use fontpush_core::{Error, Result, Table, TableCell, TableRow, TextFrame};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Kind of a top-level shape element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShapeKind {
    /// `p:sp` autoshape or placeholder.
    AutoShape,
    /// `p:graphicFrame` holding a table, chart or other graphic.
    GraphicFrame,
    /// `p:pic`, `p:cxnSp`, `p:grpSp`, `p:contentPart`.
    Other,
}

impl ShapeKind {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"sp" => Some(Self::AutoShape),
            b"graphicFrame" => Some(Self::GraphicFrame),
            b"pic" | b"cxnSp" | b"grpSp" | b"contentPart" => Some(Self::Other),
            _ => None,
        }
    }
}

/// A shape as read from slide XML, before chart relationships are resolved.
#[derive(Debug, Clone)]
pub(crate) struct ShapeDraft {
    pub kind: ShapeKind,
    pub name: String,
    pub text_frame: Option<TextFrame>,
    pub table: Option<Table>,
    /// Relationship id of a `c:chart` reference.
    pub chart_rel: Option<String>,
}

impl ShapeDraft {
    fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            name: String::new(),
            text_frame: None,
            table: None,
            chart_rel: None,
        }
    }

    fn finish(mut self) -> Self {
        // An autoshape always exposes a text frame, even without a txBody.
        if self.kind == ShapeKind::AutoShape && self.text_frame.is_none() {
            self.text_frame = Some(TextFrame::default());
        }
        self
    }
}

/// Reading state for the shape currently open.
struct OpenShape {
    draft: ShapeDraft,
    depth: usize,
    body: Option<(TextBodyReader, usize)>,
    cell: Option<TableCell>,
}

impl OpenShape {
    fn new(kind: ShapeKind, depth: usize) -> Self {
        Self {
            draft: ShapeDraft::new(kind),
            depth,
            body: None,
            cell: None,
        }
    }

    fn start(&mut self, local: &[u8], e: &BytesStart<'_>, depth: usize) {
        if let Some((body, _)) = self.body.as_mut() {
            body.start(local, e);
            return;
        }

        match (self.draft.kind, local) {
            (_, b"cNvPr") => self.name(e),
            (ShapeKind::AutoShape, b"txBody") if self.draft.text_frame.is_none() => {
                self.body = Some((TextBodyReader::new(), depth));
            }
            (ShapeKind::GraphicFrame, b"tbl") if self.draft.table.is_none() => {
                self.draft.table = Some(Table::default());
            }
            (ShapeKind::GraphicFrame, b"tr") => {
                if let Some(table) = self.draft.table.as_mut() {
                    table.rows.push(TableRow::default());
                }
            }
            (ShapeKind::GraphicFrame, b"tc") if self.draft.table.is_some() => {
                self.cell = Some(TableCell::default());
            }
            (ShapeKind::GraphicFrame, b"txBody") if self.cell.is_some() => {
                self.body = Some((TextBodyReader::new(), depth));
            }
            (ShapeKind::GraphicFrame, b"chart") => self.chart(e),
            _ => {}
        }
    }

    fn empty(&mut self, local: &[u8], e: &BytesStart<'_>) {
        if let Some((body, _)) = self.body.as_mut() {
            body.empty(local, e);
            return;
        }

        match (self.draft.kind, local) {
            (_, b"cNvPr") => self.name(e),
            (ShapeKind::GraphicFrame, b"tc") => self.push_cell(TableCell::default()),
            (ShapeKind::GraphicFrame, b"chart") => self.chart(e),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((body, _)) = self.body.as_mut() {
            body.text(text);
        }
    }

    fn end(&mut self, local: &[u8], depth: usize) {
        if let Some((mut body, body_depth)) = self.body.take() {
            if depth != body_depth {
                body.end(local);
                self.body = Some((body, body_depth));
                return;
            }
            let frame = body.finish();
            match self.cell.as_mut() {
                Some(cell) => cell.text_frame = frame,
                None => self.draft.text_frame = Some(frame),
            }
            return;
        }

        if local == b"tc" {
            if let Some(cell) = self.cell.take() {
                self.push_cell(cell);
            }
        }
    }

    fn name(&mut self, e: &BytesStart<'_>) {
        if self.draft.name.is_empty() {
            self.draft.name = attr_value(e, b"name").unwrap_or_default();
        }
    }

    fn chart(&mut self, e: &BytesStart<'_>) {
        if self.draft.chart_rel.is_none() {
            self.draft.chart_rel = attr_value(e, b"id");
        }
    }

    fn push_cell(&mut self, cell: TableCell) {
        if let Some(row) = self
            .draft
            .table
            .as_mut()
            .and_then(|table| table.rows.last_mut())
        {
            row.cells.push(cell);
        }
    }
}

/// Read the top-level shapes of a slide part.
///
/// Children of group shapes are not visited.
pub(crate) fn read_slide_shapes(xml: &str) -> Result<Vec<ShapeDraft>> {
    let mut reader = Reader::from_str(xml);
    let mut shapes = Vec::new();

    let mut depth = 0usize;
    let mut tree_depth: Option<usize> = None;
    let mut current: Option<OpenShape> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let name = e.name();
                let local = local_name(name.as_ref());

                if let Some(shape) = current.as_mut() {
                    if shape.draft.kind != ShapeKind::Other || local == b"cNvPr" {
                        shape.start(local, e, depth);
                    }
                    continue;
                }

                match tree_depth {
                    None if local == b"spTree" => tree_depth = Some(depth),
                    Some(tree) if depth == tree + 1 => {
                        if let Some(kind) = ShapeKind::from_local_name(local) {
                            current = Some(OpenShape::new(kind, depth));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if let Some(shape) = current.as_mut() {
                    if shape.draft.kind != ShapeKind::Other || local == b"cNvPr" {
                        shape.empty(local, e);
                    }
                } else if tree_depth.is_some_and(|tree| depth == tree) {
                    if let Some(kind) = ShapeKind::from_local_name(local) {
                        shapes.push(ShapeDraft::new(kind).finish());
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(shape) = current.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Xml(format!("Bad text in slide: {}", e)))?;
                    shape.text(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if let Some(mut shape) = current.take() {
                    if depth == shape.depth {
                        shapes.push(shape.draft.finish());
                    } else {
                        if shape.draft.kind != ShapeKind::Other {
                            shape.end(local, depth);
                        }
                        current = Some(shape);
                    }
                } else if tree_depth == Some(depth) {
                    tree_depth = None;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing slide: {}", e)));
            }
            _ => {}
        }
    }

    Ok(shapes)
}
