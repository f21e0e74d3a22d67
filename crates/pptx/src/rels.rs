//! Package relationship parts (`_rels/*.rels`).

use crate::text::attr_value;
use fontpush_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

/// One `Relationship` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

impl Relationship {
    /// Whether this relationship points at a slide (not a layout or master).
    pub fn is_slide(&self) -> bool {
        self.rel_type.ends_with("/slide")
    }
}

/// Parse the relationship entries of a `.rels` part.
pub(crate) fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut rels = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attr_value(e, b"Id").unwrap_or_default();
                let rel_type = attr_value(e, b"Type").unwrap_or_default();
                let target = attr_value(e, b"Target").unwrap_or_default();
                rels.push(Relationship {
                    id,
                    rel_type,
                    target,
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing relationships: {}", e)));
            }
            _ => {}
        }
    }

    Ok(rels)
}

/// Path of the relationships part belonging to `part_path`.
///
/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`
pub(crate) fn rels_path_for(part_path: &str) -> String {
    match part_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_path),
    }
}

/// Resolve a relationship target against the directory of its source part.
///
/// Absolute targets (leading `/`) are package-rooted.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
pub(crate) fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relationships() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>
</Relationships>"#;
        let rels = parse_relationships(xml).unwrap();
        assert_eq!(rels.len(), 2);
        assert!(!rels[0].is_slide());
        assert!(rels[1].is_slide());
        assert_eq!(rels[1].target, "slides/slide1.xml");
    }

    #[test]
    fn test_slide_layout_is_not_a_slide() {
        let rel = Relationship {
            id: "rId1".into(),
            rel_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout".into(),
            target: "../slideLayouts/slideLayout1.xml".into(),
        };
        assert!(!rel.is_slide());
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(
            rels_path_for("ppt/slides/slide1.xml"),
            "ppt/slides/_rels/slide1.xml.rels"
        );
        assert_eq!(
            rels_path_for("ppt/presentation.xml"),
            "ppt/_rels/presentation.xml.rels"
        );
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../charts/chart1.xml"),
            "ppt/charts/chart1.xml"
        );
        assert_eq!(
            resolve_target("ppt/presentation.xml", "slides/slide2.xml"),
            "ppt/slides/slide2.xml"
        );
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "/ppt/charts/chart9.xml"),
            "ppt/charts/chart9.xml"
        );
    }

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }
}
