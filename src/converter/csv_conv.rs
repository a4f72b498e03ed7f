use crate::converter::{ConversionOptions, ConversionResult, Converter};
use crate::error::ConvertError;
use crate::markdown::build_table;

/// Delimited text rendered as a pipe table; the first record is the header.
pub struct CsvConverter {
    delimiter: u8,
}

impl CsvConverter {
    pub fn comma() -> Self {
        Self { delimiter: b',' }
    }

    pub fn tab() -> Self {
        Self { delimiter: b'\t' }
    }
}

impl Converter for CsvConverter {
    fn supported_extensions(&self) -> &[&str] {
        if self.delimiter == b'\t' {
            &["tsv"]
        } else {
            &["csv"]
        }
    }

    fn convert(
        &self,
        data: &[u8],
        _options: &ConversionOptions,
    ) -> Result<ConversionResult, ConvertError> {
        let text = super::utf8_text(data)?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(text.as_bytes());

        let mut rows: Vec<Vec<String>> = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| ConvertError::MalformedDocument {
                reason: format!("failed to parse record {}: {e}", i + 1),
            })?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        let Some((header, body)) = rows.split_first() else {
            return Ok(ConversionResult::default());
        };

        let header_refs: Vec<&str> = header.iter().map(String::as_str).collect();
        let row_refs: Vec<Vec<&str>> = body
            .iter()
            .map(|row| row.iter().map(String::as_str).collect())
            .collect();

        Ok(ConversionResult {
            markdown: build_table(&header_refs, &row_refs),
            ..Default::default()
        })
    }
}
