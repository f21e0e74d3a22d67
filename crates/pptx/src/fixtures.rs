//! In-memory `.pptx` packages for tests.
//!
//! Produces the minimum set of parts the parser reads: the presentation part
//! and its relationships, slide parts, and chart parts with their slide
//! relationships.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const NAMESPACES: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_CHART: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";

#[derive(Debug, Clone)]
enum ShapeSpec {
    Text { text: String, font: Option<String> },
    TableCell { text: String, font: String },
    ChartLabel { text: String, font: String },
}

/// Shapes of one slide.
#[derive(Debug, Clone, Default)]
pub struct SlideContent {
    shapes: Vec<ShapeSpec>,
}

impl SlideContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// A text box with one run using `font`.
    pub fn text_run(mut self, text: &str, font: &str) -> Self {
        self.shapes.push(ShapeSpec::Text {
            text: text.to_string(),
            font: Some(font.to_string()),
        });
        self
    }

    /// A text box with one run that inherits its font.
    pub fn plain_run(mut self, text: &str) -> Self {
        self.shapes.push(ShapeSpec::Text {
            text: text.to_string(),
            font: None,
        });
        self
    }

    /// A one-cell table whose cell run uses `font`.
    pub fn table_cell_run(mut self, text: &str, font: &str) -> Self {
        self.shapes.push(ShapeSpec::TableCell {
            text: text.to_string(),
            font: font.to_string(),
        });
        self
    }

    /// A one-point bar chart whose data label run uses `font`.
    ///
    /// Only one chart per slide is supported.
    pub fn chart_label_run(mut self, text: &str, font: &str) -> Self {
        self.shapes.push(ShapeSpec::ChartLabel {
            text: text.to_string(),
            font: font.to_string(),
        });
        self
    }
}

/// Builder for a whole deck.
#[derive(Debug, Clone, Default)]
pub struct DeckBuilder {
    slides: Vec<SlideContent>,
    reversed: bool,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slide(mut self, content: SlideContent) -> Self {
        self.slides.push(content);
        self
    }

    /// List the slides in reverse part order in `p:sldIdLst`.
    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }

    /// Serialize the package.
    pub fn build(&self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        let mut rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_MASTER}" Target="slideMasters/slideMaster1.xml"/>"#
        );
        let mut id_list = Vec::new();
        for n in 1..=self.slides.len() {
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{REL_SLIDE}" Target="slides/slide{}.xml"/>"#,
                n + 1,
                n
            ));
            id_list.push(format!(
                r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                255 + n,
                n + 1
            ));
        }
        rels.push_str("</Relationships>");
        if self.reversed {
            id_list.reverse();
        }

        let presentation = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {NAMESPACES}><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#,
            id_list.concat()
        );

        put(&mut writer, "[Content_Types].xml", CONTENT_TYPES);
        put(&mut writer, "ppt/presentation.xml", &presentation);
        put(&mut writer, "ppt/_rels/presentation.xml.rels", &rels);

        for (idx, slide) in self.slides.iter().enumerate() {
            let n = idx + 1;
            let (xml, chart) = slide_xml(slide);
            put(&mut writer, &format!("ppt/slides/slide{}.xml", n), &xml);
            if let Some(chart) = chart {
                let slide_rels = format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="{REL_CHART}" Target="../charts/chart{}.xml"/></Relationships>"#,
                    n
                );
                put(
                    &mut writer,
                    &format!("ppt/slides/_rels/slide{}.xml.rels", n),
                    &slide_rels,
                );
                put(&mut writer, &format!("ppt/charts/chart{}.xml", n), &chart);
            }
        }

        writer
            .finish()
            .expect("finishing in-memory zip")
            .into_inner()
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/></Types>"#;

fn put(writer: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, content: &str) {
    writer
        .start_file(name, FileOptions::default())
        .expect("starting zip entry");
    writer
        .write_all(content.as_bytes())
        .expect("writing zip entry");
}

fn run_xml(text: &str, font: Option<&str>) -> String {
    let props = match font {
        Some(font) => format!(
            r#"<a:rPr lang="en-US"><a:latin typeface="{}"/></a:rPr>"#,
            escape(font)
        ),
        None => r#"<a:rPr lang="en-US"/>"#.to_string(),
    };
    format!("<a:r>{}<a:t>{}</a:t></a:r>", props, escape(text))
}

/// Slide XML plus the chart part, if the slide has a chart.
fn slide_xml(slide: &SlideContent) -> (String, Option<String>) {
    let mut tree = String::new();
    let mut chart = None;

    for (idx, shape) in slide.shapes.iter().enumerate() {
        let id = idx + 2;
        match shape {
            ShapeSpec::Text { text, font } => tree.push_str(&format!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p>{}</a:p></p:txBody></p:sp>"#,
                run_xml(text, font.as_deref())
            )),
            ShapeSpec::TableCell { text, font } => tree.push_str(&format!(
                r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Table {id}"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblGrid><a:gridCol w="914400"/></a:tblGrid><a:tr h="370840"><a:tc><a:txBody><a:bodyPr/><a:lstStyle/><a:p>{}</a:p></a:txBody><a:tcPr/></a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
                run_xml(text, Some(font))
            )),
            ShapeSpec::ChartLabel { text, font } => {
                tree.push_str(&format!(
                    r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Chart {id}"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" r:id="rId2"/></a:graphicData></a:graphic></p:graphicFrame>"#
                ));
                chart = Some(format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><c:chart><c:plotArea><c:barChart><c:ser><c:idx val="0"/><c:order val="0"/><c:dLbls><c:dLbl><c:idx val="0"/><c:tx><c:rich><a:bodyPr/><a:p>{}</a:p></c:rich></c:tx><c:showVal val="1"/></c:dLbl></c:dLbls><c:cat><c:strRef><c:strCache><c:ptCount val="1"/><c:pt idx="0"><c:v>A</c:v></c:pt></c:strCache></c:strRef></c:cat><c:val><c:numRef><c:numCache><c:ptCount val="1"/><c:pt idx="0"><c:v>1</c:v></c:pt></c:numCache></c:numRef></c:val></c:ser></c:barChart></c:plotArea></c:chart></c:chartSpace>"#,
                    run_xml(text, Some(font))
                ));
            }
        }
    }

    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {NAMESPACES}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{tree}</p:spTree></p:cSld></p:sld>"#
    );
    (xml, chart)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
