use std::collections::HashMap;
use std::io::Cursor;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;

use crate::converter::archive::check_zip_budget;
use crate::converter::ooxml::{attr_value, parse_core_title, parse_relationships, read_part};
use crate::converter::{
    ConversionOptions, ConversionResult, ConversionWarning, Converter, WarningCode,
};
use crate::error::ConvertError;
use crate::markdown::{build_table, format_heading, format_list_item, wrap_formatting};

/// Word documents: headings, paragraphs, emphasis, links, list items and tables.
pub struct DocxConverter;

/// `<w:b/>` is on; `<w:b w:val="false"/>` or `"0"` is off.
fn toggle_on(e: &BytesStart<'_>) -> bool {
    !matches!(attr_value(e, b"val").as_deref(), Some("false" | "0" | "off"))
}

/// Heading level for a style name such as `heading 2` or `Title`.
fn heading_level(name: &str) -> Option<u8> {
    let lower = name.to_ascii_lowercase();
    if lower == "title" {
        return Some(1);
    }
    let digits = lower.strip_prefix("heading")?.trim();
    digits.parse::<u8>().ok().filter(|l| (1..=6).contains(l))
}

/// styles.xml: style id → heading level, for localized or renamed heading styles.
fn parse_styles(xml: &str) -> Result<HashMap<String, u8>, ConvertError> {
    let mut reader = Reader::from_str(xml);
    let mut levels = HashMap::new();
    let mut current_id: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"style" => current_id = attr_value(&e, b"styleId"),
                b"name" => {
                    if let (Some(id), Some(level)) = (
                        current_id.as_ref(),
                        attr_value(&e, b"val").as_deref().and_then(heading_level),
                    ) {
                        levels.insert(id.clone(), level);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(levels)
}

#[derive(Default)]
struct Paragraph {
    style: Option<String>,
    list_level: Option<u8>,
    text: String,
}

#[derive(Default)]
struct Run {
    bold: bool,
    italic: bool,
    text: String,
}

#[derive(Default)]
struct Table {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: Vec<String>,
}

struct DocumentWalker<'a> {
    styles: &'a HashMap<String, u8>,
    rels: &'a HashMap<String, String>,
    blocks: Vec<String>,
    first_heading: Option<String>,
    warnings: Vec<ConversionWarning>,
    paragraph: Option<Paragraph>,
    run: Option<Run>,
    in_run_props: bool,
    in_text: bool,
    link: Option<(Option<String>, String)>,
    tables: Vec<Table>,
    list_counters: HashMap<u8, usize>,
    in_list: bool,
}

impl<'a> DocumentWalker<'a> {
    fn new(styles: &'a HashMap<String, u8>, rels: &'a HashMap<String, String>) -> Self {
        Self {
            styles,
            rels,
            blocks: Vec::new(),
            first_heading: None,
            warnings: Vec::new(),
            paragraph: None,
            run: None,
            in_run_props: false,
            in_text: false,
            link: None,
            tables: Vec::new(),
            list_counters: HashMap::new(),
            in_list: false,
        }
    }

    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        match e.local_name().as_ref() {
            b"p" => self.paragraph = Some(Paragraph::default()),
            b"pStyle" => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.style = attr_value(e, b"val");
                }
            }
            b"numPr" => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.list_level.get_or_insert(0);
                }
            }
            b"ilvl" => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.list_level = attr_value(e, b"val").and_then(|v| v.parse().ok());
                }
            }
            b"r" => self.run = Some(Run::default()),
            b"rPr" => self.in_run_props = !empty,
            b"b" if self.in_run_props => {
                if let Some(r) = self.run.as_mut() {
                    r.bold = toggle_on(e);
                }
            }
            b"i" if self.in_run_props => {
                if let Some(r) = self.run.as_mut() {
                    r.italic = toggle_on(e);
                }
            }
            b"t" => self.in_text = !empty,
            b"tab" => self.push_run_text("\t"),
            b"br" | b"cr" => self.push_run_text("\n"),
            b"hyperlink" => {
                let target = attr_value(e, b"id").and_then(|id| {
                    let target = self.rels.get(&id).cloned();
                    if target.is_none() {
                        self.warnings.push(ConversionWarning {
                            code: WarningCode::SkippedElement,
                            message: format!("hyperlink relationship {id} not found"),
                            location: None,
                        });
                    }
                    target
                });
                let target = target.or_else(|| attr_value(e, b"anchor").map(|a| format!("#{a}")));
                self.link = Some((target, String::new()));
            }
            b"tbl" => self.tables.push(Table::default()),
            b"tr" => {
                if let Some(t) = self.tables.last_mut() {
                    t.row.clear();
                }
            }
            b"tc" => {
                if let Some(t) = self.tables.last_mut() {
                    t.cell.clear();
                }
            }
            b"drawing" | b"pict" => self.warnings.push(ConversionWarning {
                code: WarningCode::UnsupportedFeature,
                message: "embedded graphic skipped".to_string(),
                location: None,
            }),
            _ => {}
        }
    }

    fn close(&mut self, local: &[u8]) {
        match local {
            b"t" => self.in_text = false,
            b"rPr" => self.in_run_props = false,
            b"r" => {
                if let Some(run) = self.run.take() {
                    let text = wrap_formatting(&run.text, run.bold, run.italic);
                    match self.link.as_mut() {
                        Some((_, label)) => label.push_str(&text),
                        None => {
                            if let Some(p) = self.paragraph.as_mut() {
                                p.text.push_str(&text);
                            }
                        }
                    }
                }
            }
            b"hyperlink" => {
                if let Some((target, label)) = self.link.take()
                    && let Some(p) = self.paragraph.as_mut()
                {
                    match target {
                        Some(url) if !label.trim().is_empty() => {
                            p.text.push_str(&format!("[{}]({url})", label.trim()));
                        }
                        _ => p.text.push_str(&label),
                    }
                }
            }
            b"p" => {
                if let Some(p) = self.paragraph.take() {
                    self.finish_paragraph(p);
                }
            }
            b"tc" => {
                if let Some(t) = self.tables.last_mut() {
                    let cell = std::mem::take(&mut t.cell).join(" ");
                    t.row.push(cell);
                }
            }
            b"tr" => {
                if let Some(t) = self.tables.last_mut() {
                    let row = std::mem::take(&mut t.row);
                    t.rows.push(row);
                }
            }
            b"tbl" => {
                if let Some(table) = self.tables.pop() {
                    self.finish_table(table);
                }
            }
            _ => {}
        }
    }

    fn push_run_text(&mut self, text: &str) {
        if let Some(r) = self.run.as_mut() {
            r.text.push_str(text);
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_text {
            self.push_run_text(text);
        }
    }

    fn finish_paragraph(&mut self, p: Paragraph) {
        let text = p.text.trim();

        // Inside a table, paragraphs feed the current cell.
        if let Some(t) = self.tables.last_mut() {
            if !text.is_empty() {
                t.cell.push(text.replace('\n', " "));
            }
            return;
        }
        if text.is_empty() {
            return;
        }

        let level = p.style.as_deref().and_then(|s| {
            self.styles
                .get(s)
                .copied()
                .or_else(|| heading_level(s))
        });

        if let (None, Some(list_level)) = (level, p.list_level) {
            let counter = self.list_counters.entry(list_level).or_insert(0);
            *counter += 1;
            let item = format_list_item(list_level, false, *counter, text);
            // Consecutive items form one list block.
            if self.in_list
                && let Some(prev) = self.blocks.last_mut()
            {
                prev.push('\n');
                prev.push_str(&item);
            } else {
                self.blocks.push(item);
            }
            self.in_list = true;
            return;
        }

        self.in_list = false;
        self.list_counters.clear();
        let block = match level {
            Some(level) => {
                if level == 1 && self.first_heading.is_none() {
                    self.first_heading = Some(text.to_string());
                }
                format_heading(level, text).trim_end().to_string()
            }
            None => text.to_string(),
        };
        self.blocks.push(block);
    }

    fn finish_table(&mut self, table: Table) {
        let rendered = match table.rows.split_first() {
            Some((header, body)) => {
                let header: Vec<&str> = header.iter().map(String::as_str).collect();
                let body: Vec<Vec<&str>> = body
                    .iter()
                    .map(|row| row.iter().map(String::as_str).collect())
                    .collect();
                build_table(&header, &body).trim_end().to_string()
            }
            None => return,
        };

        match self.tables.last_mut() {
            // A nested table collapses into its enclosing cell.
            Some(outer) => outer.cell.push(
                table
                    .rows
                    .iter()
                    .map(|r| r.join(" / "))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            None => self.blocks.push(rendered),
        }
    }
}

fn parse_document(
    xml: &str,
    styles: &HashMap<String, u8>,
    rels: &HashMap<String, String>,
) -> Result<(String, Option<String>, Vec<ConversionWarning>), ConvertError> {
    let mut reader = Reader::from_str(xml);
    let mut walker = DocumentWalker::new(styles, rels);

    loop {
        match reader.read_event()? {
            Event::Start(e) => walker.open(&e, false),
            Event::Empty(e) => {
                walker.open(&e, true);
                walker.close(e.local_name().as_ref());
            }
            Event::End(e) => walker.close(e.local_name().as_ref()),
            Event::Text(t) => walker.text(&t.unescape()?),
            Event::CData(t) => walker.text(&String::from_utf8_lossy(&t)),
            Event::Eof => break,
            _ => {}
        }
    }

    let markdown = if walker.blocks.is_empty() {
        String::new()
    } else {
        walker.blocks.join("\n\n") + "\n"
    };
    Ok((markdown, walker.first_heading, walker.warnings))
}

impl Converter for DocxConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn convert(
        &self,
        data: &[u8],
        options: &ConversionOptions,
    ) -> Result<ConversionResult, ConvertError> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        check_zip_budget(&mut archive, options.max_input_bytes)?;

        let styles = match read_part(&mut archive, "word/styles.xml")? {
            Some(xml) => parse_styles(&xml)?,
            None => HashMap::new(),
        };
        let rels = match read_part(&mut archive, "word/_rels/document.xml.rels")? {
            Some(xml) => parse_relationships(&xml)?,
            None => HashMap::new(),
        };
        let core_title = match read_part(&mut archive, "docProps/core.xml")? {
            Some(xml) => parse_core_title(&xml)?,
            None => None,
        };
        let document = read_part(&mut archive, "word/document.xml")?.ok_or_else(|| {
            ConvertError::MalformedDocument {
                reason: "missing word/document.xml".to_string(),
            }
        })?;

        let (markdown, first_heading, warnings) = parse_document(&document, &styles, &rels)?;

        Ok(ConversionResult {
            markdown,
            title: core_title.or(first_heading),
            warnings,
        })
    }
}
