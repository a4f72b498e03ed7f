use crate::converter::{ConversionOptions, ConversionResult, ConversionWarning, Converter, WarningCode};
use crate::error::ConvertError;

pub struct JsonConverter;

/// Newline-delimited JSON: one fenced block per record.
pub struct JsonLinesConverter;

fn pretty(value: &serde_json::Value) -> Result<String, ConvertError> {
    serde_json::to_string_pretty(value).map_err(|e| ConvertError::MalformedDocument {
        reason: format!("failed to serialize JSON: {e}"),
    })
}

impl Converter for JsonConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn convert(
        &self,
        data: &[u8],
        _options: &ConversionOptions,
    ) -> Result<ConversionResult, ConvertError> {
        let text = super::utf8_text(data)?;
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ConvertError::MalformedDocument {
                reason: format!("invalid JSON: {e}"),
            })?;

        Ok(ConversionResult {
            markdown: format!("```json\n{}\n```\n", pretty(&value)?),
            ..Default::default()
        })
    }
}

impl Converter for JsonLinesConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["jsonl", "ndjson"]
    }

    fn convert(
        &self,
        data: &[u8],
        _options: &ConversionOptions,
    ) -> Result<ConversionResult, ConvertError> {
        let text = super::utf8_text(data)?;
        let mut blocks = Vec::new();
        let mut warnings = Vec::new();

        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<serde_json::Value>(line) {
                Ok(value) => blocks.push(format!("```json\n{}\n```\n", pretty(&value)?)),
                Err(e) => warnings.push(ConversionWarning {
                    code: WarningCode::MalformedSegment,
                    message: format!("skipped invalid record: {e}"),
                    location: Some(format!("line {}", i + 1)),
                }),
            }
        }

        if blocks.is_empty() && !warnings.is_empty() {
            return Err(ConvertError::MalformedDocument {
                reason: "no valid JSON records".to_string(),
            });
        }

        Ok(ConversionResult {
            markdown: blocks.join("\n"),
            warnings,
            ..Default::default()
        })
    }
}
