use quick_xml::events::Event;
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::converter::{ConversionOptions, ConversionResult, Converter};
use crate::error::ConvertError;

pub struct XmlConverter;

/// Re-indent XML with two spaces by streaming events through a quick-xml writer.
fn reindent(input: &str) -> Result<String, ConvertError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text_start = true;
    reader.config_mut().trim_text_end = true;
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    String::from_utf8(writer.into_inner()).map_err(|e| ConvertError::MalformedDocument {
        reason: format!("XML output is not valid UTF-8: {e}"),
    })
}

impl Converter for XmlConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["xml"]
    }

    fn convert(
        &self,
        data: &[u8],
        _options: &ConversionOptions,
    ) -> Result<ConversionResult, ConvertError> {
        let text = super::utf8_text(data)?;
        if text.trim().is_empty() {
            return Err(ConvertError::MalformedDocument {
                reason: "empty XML input".to_string(),
            });
        }

        Ok(ConversionResult {
            markdown: format!("```xml\n{}\n```\n", reindent(text)?),
            ..Default::default()
        })
    }
}
