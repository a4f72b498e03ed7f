use std::collections::HashMap;
use std::io::Cursor;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;

use crate::converter::archive::check_zip_budget;
use crate::converter::ooxml::{
    attr_value, parse_core_title, parse_relationships, read_part, rels_path_for, resolve_target,
};
use crate::converter::{
    ConversionOptions, ConversionResult, ConversionWarning, Converter, WarningCode,
};
use crate::error::ConvertError;
use crate::markdown::build_table;

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// PowerPoint decks: one `## Slide N` section per slide with body text,
/// tables, pictures and speaker notes.
pub struct PptxConverter;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Placeholder {
    Title,
    Body,
    /// Date, footer, header and slide-number boxes.
    Furniture,
}

impl Placeholder {
    fn from_type(kind: Option<&str>) -> Self {
        match kind {
            Some("title" | "ctrTitle") => Placeholder::Title,
            Some("dt" | "ftr" | "hdr" | "sldNum" | "sldImg") => Placeholder::Furniture,
            _ => Placeholder::Body,
        }
    }
}

#[derive(Debug, PartialEq)]
enum Shape {
    Title(String),
    Body(String),
    Table(Vec<Vec<String>>),
    Picture { embed: Option<String>, alt: String },
}

#[derive(Default)]
struct TextShape {
    placeholder: Option<Placeholder>,
    paragraphs: Vec<String>,
    paragraph: String,
}

#[derive(Default)]
struct Picture {
    embed: Option<String>,
    alt: String,
}

/// Event-driven walker over a slide or notes part.
#[derive(Default)]
struct SlideWalker {
    shapes: Vec<Shape>,
    warnings: Vec<ConversionWarning>,
    text_shape: Option<TextShape>,
    table: Option<Vec<Vec<String>>>,
    row: Option<Vec<String>>,
    cell: Option<String>,
    picture: Option<Picture>,
    in_text: bool,
}

impl SlideWalker {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        match e.local_name().as_ref() {
            b"sp" if self.table.is_none() => self.text_shape = Some(TextShape::default()),
            b"ph" => {
                if let Some(shape) = self.text_shape.as_mut() {
                    shape.placeholder =
                        Some(Placeholder::from_type(attr_value(e, b"type").as_deref()));
                }
            }
            b"p" => {
                if let Some(cell) = self.cell.as_mut() {
                    if !cell.is_empty() {
                        cell.push(' ');
                    }
                } else if let Some(shape) = self.text_shape.as_mut() {
                    shape.paragraph.clear();
                }
            }
            b"t" => self.in_text = !empty,
            b"br" => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.push(' ');
                } else if let Some(shape) = self.text_shape.as_mut() {
                    shape.paragraph.push('\n');
                }
            }
            b"tbl" => self.table = Some(Vec::new()),
            b"tr" if self.table.is_some() => self.row = Some(Vec::new()),
            b"tc" if self.row.is_some() => self.cell = Some(String::new()),
            b"pic" => self.picture = Some(Picture::default()),
            b"cNvPr" => {
                if let Some(picture) = self.picture.as_mut() {
                    picture.alt = attr_value(e, b"descr").unwrap_or_default();
                }
            }
            b"blip" => {
                if let Some(picture) = self.picture.as_mut() {
                    picture.embed = attr_value(e, b"embed");
                }
            }
            b"graphicData" => {
                if attr_value(e, b"uri").is_some_and(|uri| uri.ends_with("/chart")) {
                    self.warnings.push(ConversionWarning {
                        code: WarningCode::UnsupportedFeature,
                        message: "chart skipped".to_string(),
                        location: None,
                    });
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, local: &[u8]) {
        match local {
            b"t" => self.in_text = false,
            b"p" if self.cell.is_none() => {
                if let Some(shape) = self.text_shape.as_mut() {
                    let text = std::mem::take(&mut shape.paragraph);
                    if !text.trim().is_empty() {
                        shape.paragraphs.push(text);
                    }
                }
            }
            b"sp" => {
                if let Some(shape) = self.text_shape.take() {
                    self.finish_text_shape(shape);
                }
            }
            b"tc" => {
                if let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) {
                    row.push(cell.trim().to_string());
                }
            }
            b"tr" => {
                if let (Some(row), Some(table)) = (self.row.take(), self.table.as_mut()) {
                    table.push(row);
                }
            }
            b"tbl" => {
                if let Some(table) = self.table.take()
                    && !table.is_empty()
                {
                    self.shapes.push(Shape::Table(table));
                }
            }
            b"pic" => {
                if let Some(Picture { embed, alt }) = self.picture.take() {
                    self.shapes.push(Shape::Picture { embed, alt });
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if !self.in_text {
            return;
        }
        if let Some(cell) = self.cell.as_mut() {
            cell.push_str(text);
        } else if let Some(shape) = self.text_shape.as_mut() {
            shape.paragraph.push_str(text);
        }
    }

    fn finish_text_shape(&mut self, shape: TextShape) {
        let text = shape.paragraphs.join("\n").trim().to_string();
        if text.is_empty() {
            return;
        }
        match shape.placeholder.unwrap_or(Placeholder::Body) {
            Placeholder::Title => self.shapes.push(Shape::Title(text)),
            Placeholder::Body => self.shapes.push(Shape::Body(text)),
            Placeholder::Furniture => {}
        }
    }
}

/// Walk one slide-like part. Malformed XML keeps what was read so far and
/// records a warning at `location`.
fn parse_slide(xml: &str, location: &str) -> (Vec<Shape>, Vec<ConversionWarning>) {
    let mut reader = Reader::from_str(xml);
    let mut walker = SlideWalker::default();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                walker.warnings.push(ConversionWarning {
                    code: WarningCode::MalformedSegment,
                    message: format!("XML parse error: {e}"),
                    location: Some(location.to_string()),
                });
                break;
            }
        };
        match event {
            Event::Start(e) => walker.open(&e, false),
            Event::Empty(e) => {
                walker.open(&e, true);
                walker.close(e.local_name().as_ref());
            }
            Event::End(e) => walker.close(e.local_name().as_ref()),
            Event::Text(t) => match t.unescape() {
                Ok(text) => walker.text(&text),
                Err(_) => walker.text(&String::from_utf8_lossy(&t)),
            },
            Event::Eof => break,
            _ => {}
        }
    }

    for w in walker.warnings.iter_mut() {
        if w.location.is_none() {
            w.location = Some(location.to_string());
        }
    }
    (walker.shapes, walker.warnings)
}

/// Slide part names in presentation order, from `p:sldIdLst`.
fn slide_order(
    presentation: &str,
    rels: &HashMap<String, String>,
    warnings: &mut Vec<ConversionWarning>,
) -> Result<Vec<String>, ConvertError> {
    let mut reader = Reader::from_str(presentation);
    let mut slides = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldId" => {
                // `id` is the numeric slide id; the relationship is the prefixed `r:id`.
                let Some(id) = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id")
                    .and_then(|a| a.unescape_value().ok())
                    .map(|v| v.into_owned())
                else {
                    continue;
                };
                match rels.get(&id) {
                    Some(target) => slides.push(resolve_target(PRESENTATION_PART, target)),
                    None => warnings.push(ConversionWarning {
                        code: WarningCode::SkippedElement,
                        message: format!("slide relationship {id} not found"),
                        location: Some(PRESENTATION_PART.to_string()),
                    }),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(slides)
}

fn render_slide(
    number: usize,
    shapes: &[Shape],
    notes: Option<&str>,
    images: &HashMap<String, String>,
) -> String {
    let title = shapes.iter().find_map(|s| match s {
        Shape::Title(t) => Some(t.as_str()),
        _ => None,
    });
    let mut blocks = vec![match title {
        Some(t) => format!("## Slide {number}: {}", t.replace('\n', " ")),
        None => format!("## Slide {number}"),
    }];

    for shape in shapes {
        match shape {
            Shape::Title(_) => {}
            Shape::Body(text) => blocks.push(text.clone()),
            Shape::Table(rows) => {
                let Some((header, body)) = rows.split_first() else {
                    continue;
                };
                let header: Vec<&str> = header.iter().map(String::as_str).collect();
                let body: Vec<Vec<&str>> = body
                    .iter()
                    .map(|r| r.iter().map(String::as_str).collect())
                    .collect();
                blocks.push(build_table(&header, &body).trim_end().to_string());
            }
            Shape::Picture { embed, alt } => {
                if let Some(file) = embed.as_ref().and_then(|id| images.get(id)) {
                    blocks.push(format!("![{alt}]({file})"));
                }
            }
        }
    }

    if let Some(notes) = notes {
        let quoted: Vec<String> = notes
            .lines()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    format!("> Note: {line}")
                } else {
                    format!("> {line}")
                }
            })
            .collect();
        blocks.push(quoted.join("\n"));
    }

    blocks.join("\n\n")
}

impl Converter for PptxConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["pptx"]
    }

    fn convert(
        &self,
        data: &[u8],
        options: &ConversionOptions,
    ) -> Result<ConversionResult, ConvertError> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        check_zip_budget(&mut archive, options.max_input_bytes)?;

        let presentation = read_part(&mut archive, PRESENTATION_PART)?.ok_or_else(|| {
            ConvertError::MalformedDocument {
                reason: format!("missing {PRESENTATION_PART}"),
            }
        })?;
        let rels = match read_part(&mut archive, &rels_path_for(PRESENTATION_PART))? {
            Some(xml) => parse_relationships(&xml)?,
            None => HashMap::new(),
        };
        let core_title = match read_part(&mut archive, "docProps/core.xml")? {
            Some(xml) => parse_core_title(&xml)?,
            None => None,
        };

        let mut warnings = Vec::new();
        let slides = slide_order(&presentation, &rels, &mut warnings)?;

        let mut sections = Vec::new();
        let mut first_title = None;

        for (i, part) in slides.iter().enumerate() {
            let Some(xml) = read_part(&mut archive, part)? else {
                warnings.push(ConversionWarning {
                    code: WarningCode::SkippedElement,
                    message: "slide part not found".to_string(),
                    location: Some(part.clone()),
                });
                continue;
            };
            let (shapes, slide_warnings) = parse_slide(&xml, part);
            warnings.extend(slide_warnings);

            let slide_rels = match read_part(&mut archive, &rels_path_for(part))? {
                Some(xml) => parse_relationships(&xml)?,
                None => HashMap::new(),
            };

            let mut notes = None;
            if let Some(target) = slide_rels.values().find(|t| t.contains("notesSlide")) {
                let notes_part = resolve_target(part, target);
                if let Some(xml) = read_part(&mut archive, &notes_part)? {
                    let (note_shapes, note_warnings) = parse_slide(&xml, &notes_part);
                    warnings.extend(note_warnings);
                    let text: Vec<&str> = note_shapes
                        .iter()
                        .filter_map(|s| match s {
                            Shape::Body(t) => Some(t.as_str()),
                            _ => None,
                        })
                        .collect();
                    notes = (!text.is_empty()).then(|| text.join("\n"));
                }
            }

            let images: HashMap<String, String> = slide_rels
                .iter()
                .map(|(id, target)| {
                    let file = target.rsplit('/').next().unwrap_or(target);
                    (id.clone(), file.to_string())
                })
                .collect();

            if first_title.is_none() {
                first_title = shapes.iter().find_map(|s| match s {
                    Shape::Title(t) => Some(t.clone()),
                    _ => None,
                });
            }

            sections.push(render_slide(i + 1, &shapes, notes.as_deref(), &images));
        }

        let markdown = if sections.is_empty() {
            String::new()
        } else {
            sections.join("\n\n---\n\n") + "\n"
        };

        Ok(ConversionResult {
            markdown,
            title: core_title.or(first_title),
            warnings,
        })
    }
}
