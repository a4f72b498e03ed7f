pub mod archive;
pub mod code;
pub mod csv_conv;
pub mod docx;
pub mod html;
pub mod ipynb;
pub mod json_conv;
pub mod ooxml;
pub mod plain_text;
pub mod pptx;
pub mod spreadsheet;
pub mod xml;

use crate::error::ConvertError;

/// Default cap on input size: 256 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 256 * 1024 * 1024;

/// Categories for recoverable conversion warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningCode {
    SkippedElement,
    UnsupportedFeature,
    MalformedSegment,
}

/// A recoverable issue encountered during conversion.
#[derive(Debug, Clone)]
pub struct ConversionWarning {
    pub code: WarningCode,
    pub message: String,
    pub location: Option<String>,
}

/// Options controlling conversion behavior.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// If true, return an error on recoverable parse failures instead of warnings.
    pub strict: bool,
    /// Hard cap on the bytes read from disk, and on the total uncompressed
    /// size of ZIP-based containers.
    pub max_input_bytes: u64,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

/// The result of converting a document to Markdown.
#[derive(Debug, Clone, Default)]
pub struct ConversionResult {
    /// Converted Markdown content.
    pub markdown: String,
    /// Document title, if the format carries one.
    pub title: Option<String>,
    /// Recoverable issues encountered during conversion.
    pub warnings: Vec<ConversionWarning>,
}

impl ConversionResult {
    /// Apply strict mode: the first warning becomes a hard error.
    pub(crate) fn enforce(self, options: &ConversionOptions) -> Result<Self, ConvertError> {
        if options.strict
            && let Some(w) = self.warnings.first()
        {
            let loc = w
                .location
                .as_deref()
                .map(|l| format!(" at {l}"))
                .unwrap_or_default();
            return Err(ConvertError::MalformedDocument {
                reason: format!("{}{loc} (strict mode)", w.message),
            });
        }
        Ok(self)
    }
}

/// Trait implemented by each format-specific converter.
pub trait Converter {
    /// Returns the file extensions this converter supports (e.g., `["docx"]`).
    fn supported_extensions(&self) -> &[&str];

    /// Check if this converter can handle the given extension.
    fn can_convert(&self, extension: &str) -> bool {
        self.supported_extensions().contains(&extension)
    }

    /// Convert file bytes to Markdown.
    fn convert(
        &self,
        data: &[u8],
        options: &ConversionOptions,
    ) -> Result<ConversionResult, ConvertError>;
}

/// Decode bytes of unknown text encoding.
///
/// A byte-order mark selects UTF-8 or UTF-16; otherwise UTF-8 is tried and
/// Windows-1252 is the fallback. Anything other than plain or BOM-prefixed
/// UTF-8 yields a warning describing the encoding that was assumed.
pub(crate) fn decode_text(data: &[u8]) -> (String, Option<ConversionWarning>) {
    if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(data) {
        let (text, _) = encoding.decode_without_bom_handling(&data[bom_len..]);
        let warning = (encoding != encoding_rs::UTF_8).then(|| ConversionWarning {
            code: WarningCode::UnsupportedFeature,
            message: format!("decoded {} text via byte-order mark", encoding.name()),
            location: None,
        });
        return (text.into_owned(), warning);
    }

    match std::str::from_utf8(data) {
        Ok(text) => (text.to_string(), None),
        Err(_) => {
            let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(data);
            (
                text.into_owned(),
                Some(ConversionWarning {
                    code: WarningCode::UnsupportedFeature,
                    message: "input is not valid UTF-8; decoded as windows-1252".to_string(),
                    location: None,
                }),
            )
        }
    }
}

/// Strict UTF-8 decoding with the BOM removed, for formats that require UTF-8.
pub(crate) fn utf8_text(data: &[u8]) -> Result<&str, ConvertError> {
    let text = std::str::from_utf8(data)?;
    Ok(text.strip_prefix('\u{FEFF}').unwrap_or(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_plain_utf8() {
        let (text, warning) = decode_text("héllo".as_bytes());
        assert_eq!(text, "héllo");
        assert!(warning.is_none());
    }

    #[test]
    fn test_decode_text_utf8_bom_is_silent() {
        let (text, warning) = decode_text(b"\xEF\xBB\xBFabc");
        assert_eq!(text, "abc");
        assert!(warning.is_none());
    }

    #[test]
    fn test_decode_text_utf16_be() {
        let (text, warning) = decode_text(&[0xFE, 0xFF, 0x00, b'O', 0x00, b'k']);
        assert_eq!(text, "Ok");
        assert!(warning.unwrap().message.contains("UTF-16BE"));
    }

    #[test]
    fn test_decode_text_windows_1252_fallback() {
        let (text, warning) = decode_text(b"na\xefve");
        assert_eq!(text, "naïve");
        assert_eq!(warning.unwrap().code, WarningCode::UnsupportedFeature);
    }

    #[test]
    fn test_utf8_text_strips_bom() {
        assert_eq!(utf8_text(b"\xEF\xBB\xBF{}").unwrap(), "{}");
    }

    #[test]
    fn test_utf8_text_rejects_invalid() {
        let err = utf8_text(&[0xC3, 0x28]).unwrap_err();
        assert!(matches!(err, ConvertError::Utf8Error(_)));
    }

    #[test]
    fn test_enforce_lenient_keeps_warnings() {
        let result = ConversionResult {
            warnings: vec![ConversionWarning {
                code: WarningCode::SkippedElement,
                message: "skipped".to_string(),
                location: None,
            }],
            ..Default::default()
        };
        let kept = result.enforce(&ConversionOptions::default()).unwrap();
        assert_eq!(kept.warnings.len(), 1);
    }

    #[test]
    fn test_enforce_strict_fails_on_warning() {
        let result = ConversionResult {
            warnings: vec![ConversionWarning {
                code: WarningCode::MalformedSegment,
                message: "cell contains error: #DIV/0!".to_string(),
                location: Some("Sheet1!B2".to_string()),
            }],
            ..Default::default()
        };
        let options = ConversionOptions {
            strict: true,
            ..Default::default()
        };
        let err = result.enforce(&options).unwrap_err();
        assert!(err.to_string().contains("Sheet1!B2"));
        assert!(err.to_string().contains("strict mode"));
    }
}
