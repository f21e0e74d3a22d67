//! PPTX file parser implementation.

use crate::chart::read_chart;
use crate::rels::{extract_slide_number, parse_relationships, rels_path_for, resolve_target};
use crate::slide::{read_slide_shapes, ShapeDraft};
use crate::text::local_name;
use fontpush_core::{
    Error, FontScanner, FontSet, Presentation, PresentationFormat, Result, Shape, Slide,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Open and parse a deck from disk.
    ///
    /// The format is sniffed from the file header, falling back to the
    /// extension. Legacy `.ppt` files are rejected.
    pub fn open(&self, path: &Path) -> Result<Presentation> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 8];
        let read = reader.read(&mut magic)?;
        reader.seek(SeekFrom::Start(0))?;

        let format = PresentationFormat::from_magic(&magic[..read]).or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(PresentationFormat::from_extension)
        });

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");

        match format {
            Some(PresentationFormat::Pptx) => self.parse(reader, filename),
            Some(PresentationFormat::Ppt) => Err(Error::UnsupportedFormat(format!(
                "{} is a legacy PPT file; only PPTX is supported",
                filename
            ))),
            None => Err(Error::UnsupportedFormat(filename.to_string())),
        }
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Presentation> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::Archive(format!("Failed to open ZIP: {}", e)))?;

        let mut presentation = Presentation::new(filename, PresentationFormat::Pptx);

        let slide_paths = self.slide_paths(&mut archive)?;
        log::debug!("{}: {} slides", filename, slide_paths.len());

        for (idx, slide_path) in slide_paths.iter().enumerate() {
            let slide = self.parse_slide(&mut archive, slide_path, idx + 1)?;
            presentation.add_slide(slide);
        }

        Ok(presentation)
    }

    /// Ordered part names of the slides.
    ///
    /// The order comes from `p:sldIdLst` in the presentation part. Without
    /// it, slides are ordered by the number in their relationship id or
    /// target name.
    fn slide_paths<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = self.read_file_from_archive(archive, PRESENTATION_RELS)?;
        let slide_rels: HashMap<String, String> = parse_relationships(&rels_content)?
            .into_iter()
            .filter(|rel| rel.is_slide())
            .map(|rel| (rel.id, resolve_target(PRESENTATION_PART, &rel.target)))
            .collect();

        if archive.by_name(PRESENTATION_PART).is_ok() {
            let content = self.read_file_from_archive(archive, PRESENTATION_PART)?;
            let ids = slide_id_list(&content)?;
            if !ids.is_empty() {
                return ids
                    .iter()
                    .map(|id| {
                        slide_rels.get(id).cloned().ok_or_else(|| {
                            Error::MissingPart(format!("Slide relationship '{}' not found", id))
                        })
                    })
                    .collect();
            }
        }

        let mut slides: Vec<(String, Option<usize>)> = slide_rels
            .into_iter()
            .map(|(id, path)| {
                let order = extract_slide_number(&id).or_else(|| extract_slide_number(&path));
                (path, order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<Slide> {
        let content = self.read_file_from_archive(archive, slide_path)?;
        let drafts = read_slide_shapes(&content)?;

        let mut slide = Slide::new(slide_number);
        let mut slide_rels: Option<HashMap<String, String>> = None;

        for draft in drafts {
            let ShapeDraft {
                name,
                text_frame,
                table,
                chart_rel,
                ..
            } = draft;

            let mut shape = Shape::new(name);
            if let Some(frame) = text_frame {
                shape = shape.with_text_frame(frame);
            }
            if let Some(table) = table {
                shape = shape.with_table(table);
            }
            if let Some(rel_id) = chart_rel {
                if slide_rels.is_none() {
                    slide_rels = Some(self.part_relationships(archive, slide_path)?);
                }
                let target = slide_rels
                    .as_ref()
                    .and_then(|rels| rels.get(&rel_id))
                    .ok_or_else(|| {
                        Error::MissingPart(format!(
                            "Chart relationship '{}' not found for {}",
                            rel_id, slide_path
                        ))
                    })?;
                let chart_xml = self.read_file_from_archive(archive, target)?;
                shape = shape.with_chart(read_chart(&chart_xml)?);
            }
            slide.add_shape(shape);
        }

        Ok(slide)
    }

    /// Relationship id to resolved part name for the given part.
    fn part_relationships<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        part_path: &str,
    ) -> Result<HashMap<String, String>> {
        let content = self.read_file_from_archive(archive, &rels_path_for(part_path))?;
        Ok(parse_relationships(&content)?
            .into_iter()
            .map(|rel| (rel.id, resolve_target(part_path, &rel.target)))
            .collect())
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::Archive(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::Archive(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Open a deck and collect its fonts.
pub fn scan_file(path: &Path) -> Result<FontSet> {
    let presentation = PptxParser::new().open(path)?;
    Ok(FontScanner::new().scan(&presentation))
}

/// Relationship ids of `p:sldIdLst/p:sldId`, in presentation order.
fn slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                if let Some(id) = relationship_id(e) {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing presentation: {}", e)));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// The prefixed `r:id` attribute; `sldId` also has an unprefixed numeric `id`.
fn relationship_id(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref().ends_with(b":id"))
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}
