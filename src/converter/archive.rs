use std::io::{Cursor, Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use crate::converter::{
    ConversionOptions, ConversionResult, ConversionWarning, Converter, WarningCode,
};
use crate::detection;
use crate::error::ConvertError;

/// Reject a ZIP container whose declared uncompressed size exceeds `budget`.
///
/// Sizes come from the central directory, so nothing is decompressed.
pub(crate) fn check_zip_budget<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    budget: u64,
) -> Result<(), ConvertError> {
    let mut total: u64 = 0;
    for i in 0..archive.len() {
        if let Ok(entry) = archive.by_index_raw(i) {
            total = total.saturating_add(entry.size());
        }
    }
    if total > budget {
        return Err(ConvertError::InputTooLarge {
            size: total,
            limit: budget,
        });
    }
    Ok(())
}

/// Plain ZIP archives: every member with a known format becomes a
/// `## File: <name>` section.
pub struct ZipConverter;

impl Converter for ZipConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["zip"]
    }

    fn convert(
        &self,
        data: &[u8],
        options: &ConversionOptions,
    ) -> Result<ConversionResult, ConvertError> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        check_zip_budget(&mut archive, options.max_input_bytes)?;

        let mut sections = Vec::new();
        let mut warnings = Vec::new();

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();

            let mut bytes = Vec::with_capacity(entry.size().min(options.max_input_bytes) as usize);
            entry.read_to_end(&mut bytes)?;
            drop(entry);

            let header = &bytes[..bytes.len().min(16)];
            let Some(format) = detection::resolve_format(Path::new(&name), header, &bytes) else {
                warnings.push(ConversionWarning {
                    code: WarningCode::SkippedElement,
                    message: "no converter for archive member".to_string(),
                    location: Some(name),
                });
                continue;
            };
            // Only one level of archive is unpacked.
            if format == "zip" {
                warnings.push(ConversionWarning {
                    code: WarningCode::SkippedElement,
                    message: "nested archive skipped".to_string(),
                    location: Some(name),
                });
                continue;
            }

            match crate::convert_bytes(&bytes, &format, options) {
                Ok(converted) => {
                    warnings.extend(converted.warnings.into_iter().map(|mut w| {
                        let inner = w.location.take();
                        w.location = Some(match inner {
                            Some(loc) => format!("{name}: {loc}"),
                            None => name.clone(),
                        });
                        w
                    }));
                    sections.push(format!("## File: {name}\n\n{}", converted.markdown.trim_end()));
                }
                Err(e) => warnings.push(ConversionWarning {
                    code: WarningCode::SkippedElement,
                    message: format!("failed to convert archive member: {e}"),
                    location: Some(name),
                }),
            }
        }

        let markdown = if sections.is_empty() {
            String::new()
        } else {
            sections.join("\n\n") + "\n"
        };

        Ok(ConversionResult {
            markdown,
            warnings,
            ..Default::default()
        })
    }
}
