use crate::converter::{ConversionOptions, ConversionResult, Converter};
use crate::error::ConvertError;

pub struct PlainTextConverter;

impl Converter for PlainTextConverter {
    fn supported_extensions(&self) -> &[&str] {
        &[
            "txt", "text", "log", "md", "markdown", "rst", "ini", "cfg", "conf", "toml", "yaml",
            "yml",
        ]
    }

    fn convert(
        &self,
        data: &[u8],
        _options: &ConversionOptions,
    ) -> Result<ConversionResult, ConvertError> {
        let (markdown, warning) = super::decode_text(data);
        Ok(ConversionResult {
            markdown,
            warnings: warning.into_iter().collect(),
            ..Default::default()
        })
    }
}
