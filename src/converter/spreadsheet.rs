use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::{Datelike, NaiveDateTime, Timelike};
use zip::ZipArchive;

use crate::converter::archive::check_zip_budget;
use crate::converter::{
    ConversionOptions, ConversionResult, ConversionWarning, Converter, WarningCode,
};
use crate::error::ConvertError;
use crate::markdown::{build_table, format_heading};

/// Workbooks of any format calamine can sniff: one section per non-empty sheet.
pub struct SpreadsheetConverter;

/// Zero-based column index to spreadsheet letters (0 → A, 26 → AA).
fn column_name(mut col: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn format_datetime(dt: NaiveDateTime) -> String {
    let date = format!("{:04}-{:02}-{:02}", dt.year(), dt.month(), dt.day());
    if dt.num_seconds_from_midnight() == 0 {
        date
    } else {
        format!(
            "{date} {:02}:{:02}:{:02}",
            dt.hour(),
            dt.minute(),
            dt.second()
        )
    }
}

/// Render one cell. Formula cells arrive as their cached value.
fn cell_text(
    cell: &Data,
    location: impl FnOnce() -> String,
    warnings: &mut Vec<ConversionWarning>,
) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(format_datetime)
            .unwrap_or_else(|| dt.to_string()),
        Data::Error(e) => {
            let text = e.to_string();
            warnings.push(ConversionWarning {
                code: WarningCode::MalformedSegment,
                message: format!("cell contains error: {text}"),
                location: Some(location()),
            });
            text
        }
    }
}

impl Converter for SpreadsheetConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["xlsx", "xlsm", "xls", "xlsb", "ods"]
    }

    fn convert(
        &self,
        data: &[u8],
        options: &ConversionOptions,
    ) -> Result<ConversionResult, ConvertError> {
        // xlsx, xlsb and ods are ZIP packages; an unreadable one is left for calamine to report.
        if data.starts_with(b"PK\x03\x04")
            && let Ok(mut archive) = ZipArchive::new(Cursor::new(data))
        {
            check_zip_budget(&mut archive, options.max_input_bytes)?;
        }

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))?;
        let mut sections = Vec::new();
        let mut warnings = Vec::new();

        for name in workbook.sheet_names() {
            let range = match workbook.worksheet_range(&name) {
                Ok(range) => range,
                Err(e) => {
                    warnings.push(ConversionWarning {
                        code: WarningCode::SkippedElement,
                        message: format!("failed to read sheet: {e}"),
                        location: Some(name.clone()),
                    });
                    continue;
                }
            };
            if range.is_empty() {
                continue;
            }

            let (first_row, first_col) = range.start().unwrap_or((0, 0));
            let rows: Vec<Vec<String>> = range
                .rows()
                .enumerate()
                .map(|(r, row)| {
                    row.iter()
                        .enumerate()
                        .map(|(c, cell)| {
                            let location = || {
                                format!(
                                    "{name}!{}{}",
                                    column_name(first_col as usize + c),
                                    first_row as usize + r + 1
                                )
                            };
                            cell_text(cell, location, &mut warnings)
                        })
                        .collect()
                })
                .collect();

            let Some((header, body)) = rows.split_first() else {
                continue;
            };
            let header: Vec<&str> = header.iter().map(String::as_str).collect();
            let body: Vec<Vec<&str>> = body
                .iter()
                .map(|row| row.iter().map(String::as_str).collect())
                .collect();

            sections.push(format!(
                "{}\n{}",
                format_heading(2, &name),
                build_table(&header, &body)
            ));
        }

        Ok(ConversionResult {
            markdown: sections.join("\n"),
            warnings,
            ..Default::default()
        })
    }
}
