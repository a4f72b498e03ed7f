pub mod adapter;
pub mod cli;
pub mod config;
pub mod converter;
pub mod detection;
pub mod error;
pub mod markdown;
pub mod report;

pub use converter::{
    ConversionOptions, ConversionResult, ConversionWarning, Converter, WarningCode,
};
pub use error::{ConvertError, ErrorKind};
pub use report::ConversionReport;

use std::path::Path;

use converter::archive::ZipConverter;
use converter::code::CodeConverter;
use converter::csv_conv::CsvConverter;
use converter::docx::DocxConverter;
use converter::html::HtmlConverter;
use converter::ipynb::IpynbConverter;
use converter::json_conv::{JsonConverter, JsonLinesConverter};
use converter::plain_text::PlainTextConverter;
use converter::pptx::PptxConverter;
use converter::spreadsheet::SpreadsheetConverter;
use converter::xml::XmlConverter;

/// Convert a file at the given path to Markdown.
///
/// The format is auto-detected from magic bytes and file extension. Files
/// larger than `options.max_input_bytes` are rejected before being read.
pub fn convert_file(
    path: impl AsRef<Path>,
    options: &ConversionOptions,
) -> Result<ConversionResult, ConvertError> {
    let path = path.as_ref();
    let size = std::fs::metadata(path)?.len();
    if size > options.max_input_bytes {
        return Err(ConvertError::InputTooLarge {
            size,
            limit: options.max_input_bytes,
        });
    }
    let data = std::fs::read(path)?;

    let header = &data[..data.len().min(16)];
    let format = detection::resolve_format(path, header, &data).unwrap_or_else(|| {
        path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
    });
    tracing::debug!(path = %path.display(), %format, bytes = data.len(), "detected format");

    convert_bytes(&data, &format, options)
}

/// Convert raw bytes to Markdown with an explicit format name or extension.
pub fn convert_bytes(
    data: &[u8],
    extension: &str,
    options: &ConversionOptions,
) -> Result<ConversionResult, ConvertError> {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    let ext = extension.as_str();

    let text_formats: [&dyn Converter; 6] = [
        &PlainTextConverter,
        &HtmlConverter,
        &JsonConverter,
        &JsonLinesConverter,
        &XmlConverter,
        &IpynbConverter,
    ];
    let binary_formats: [&dyn Converter; 4] = [
        &DocxConverter,
        &PptxConverter,
        &SpreadsheetConverter,
        &ZipConverter,
    ];

    let result = if let Some(converter) = text_formats
        .into_iter()
        .chain(binary_formats)
        .find(|c| c.can_convert(ext))
    {
        converter.convert(data, options)
    } else if CsvConverter::comma().can_convert(ext) {
        CsvConverter::comma().convert(data, options)
    } else if CsvConverter::tab().can_convert(ext) {
        CsvConverter::tab().convert(data, options)
    } else if CodeConverter::default().can_convert(ext) {
        CodeConverter::for_extension(ext).convert(data, options)
    } else {
        Err(ConvertError::UnsupportedFormat {
            extension: if ext.is_empty() {
                "<none>".to_string()
            } else {
                extension.clone()
            },
        })
    }?;

    result.enforce(options)
}
