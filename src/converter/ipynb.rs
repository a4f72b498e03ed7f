use serde_json::{Map, Value};

use crate::converter::{
    ConversionOptions, ConversionResult, ConversionWarning, Converter, WarningCode,
};
use crate::error::ConvertError;

pub struct IpynbConverter;

fn malformed(reason: &str) -> ConvertError {
    ConvertError::MalformedDocument {
        reason: reason.to_string(),
    }
}

impl Converter for IpynbConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["ipynb"]
    }

    fn convert(
        &self,
        data: &[u8],
        _options: &ConversionOptions,
    ) -> Result<ConversionResult, ConvertError> {
        let text = super::utf8_text(data)?;
        let root: Value = serde_json::from_str(text).map_err(|e| ConvertError::MalformedDocument {
            reason: format!("invalid notebook JSON: {e}"),
        })?;
        let notebook = root
            .as_object()
            .ok_or_else(|| malformed("notebook root is not a JSON object"))?;
        let cells = notebook
            .get("cells")
            .and_then(Value::as_array)
            .ok_or_else(|| malformed("notebook missing \"cells\" array"))?;

        let language = kernel_language(notebook);
        let mut sections = Vec::new();
        let mut heading_title = None;
        let mut warnings = Vec::new();

        for (i, cell) in cells.iter().enumerate() {
            let source = cell_source(cell.get("source"));
            if source.trim().is_empty() {
                continue;
            }
            match cell.get("cell_type").and_then(Value::as_str) {
                Some("markdown") => {
                    if heading_title.is_none() {
                        heading_title = first_heading(&source);
                    }
                    sections.push(source);
                }
                Some("code") => sections.push(format!("```{language}\n{source}\n```")),
                Some("raw") => sections.push(format!("```\n{source}\n```")),
                other => warnings.push(ConversionWarning {
                    code: WarningCode::SkippedElement,
                    message: format!("unknown cell type: {}", other.unwrap_or("<missing>")),
                    location: Some(format!("cell {i}")),
                }),
            }
        }

        let meta_title = notebook
            .get("metadata")
            .and_then(|m| m.get("title"))
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string);

        Ok(ConversionResult {
            markdown: sections.join("\n\n"),
            title: meta_title.or(heading_title),
            warnings,
        })
    }
}

/// `metadata.kernelspec.language`, then `metadata.language_info.name`, then python.
fn kernel_language(notebook: &Map<String, Value>) -> &str {
    let metadata = notebook.get("metadata");
    [
        metadata.and_then(|m| m.get("kernelspec")).and_then(|k| k.get("language")),
        metadata.and_then(|m| m.get("language_info")).and_then(|l| l.get("name")),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .find(|lang| !lang.is_empty())
    .unwrap_or("python")
}

/// Cell sources are either one string or a list of line strings.
fn cell_source(source: Option<&Value>) -> String {
    match source {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(lines)) => lines.iter().filter_map(Value::as_str).collect(),
        _ => String::new(),
    }
}

fn first_heading(markdown: &str) -> Option<String> {
    markdown.lines().find_map(|line| {
        let title = line.trim_start().strip_prefix("# ")?.trim();
        (!title.is_empty()).then(|| title.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(json: &str) -> Result<ConversionResult, ConvertError> {
        IpynbConverter.convert(json.as_bytes(), &ConversionOptions::default())
    }

    #[test]
    fn test_ipynb_cells_rendered_in_order() {
        let result = convert(
            r##"{"cells":[
                {"cell_type":"markdown","source":["# Analysis\n","Intro"]},
                {"cell_type":"code","source":"print(1)"},
                {"cell_type":"raw","source":"raw text"}
            ],"metadata":{}}"##,
        )
        .unwrap();
        assert_eq!(
            result.markdown,
            "# Analysis\nIntro\n\n```python\nprint(1)\n```\n\n```\nraw text\n```"
        );
        assert_eq!(result.title.as_deref(), Some("Analysis"));
    }

    #[test]
    fn test_ipynb_metadata_title_wins() {
        let result = convert(
            r##"{"cells":[{"cell_type":"markdown","source":"# Heading"}],
                "metadata":{"title":"Notebook Title"}}"##,
        )
        .unwrap();
        assert_eq!(result.title.as_deref(), Some("Notebook Title"));
    }

    #[test]
    fn test_ipynb_kernel_language_used_for_code() {
        let result = convert(
            r#"{"cells":[{"cell_type":"code","source":"1+1"}],
                "metadata":{"kernelspec":{"language":"julia"}}}"#,
        )
        .unwrap();
        assert!(result.markdown.starts_with("```julia\n"));
    }

    #[test]
    fn test_ipynb_language_info_fallback() {
        let result = convert(
            r#"{"cells":[{"cell_type":"code","source":"x"}],
                "metadata":{"language_info":{"name":"r"}}}"#,
        )
        .unwrap();
        assert!(result.markdown.starts_with("```r\n"));
    }

    #[test]
    fn test_ipynb_unknown_cell_warns() {
        let result = convert(r#"{"cells":[{"cell_type":"widget","source":"x"}]}"#).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].location.as_deref(), Some("cell 0"));
    }

    #[test]
    fn test_ipynb_missing_cells_is_malformed() {
        let err = convert(r#"{"metadata":{}}"#).unwrap_err();
        assert!(err.to_string().contains("cells"));
    }

    #[test]
    fn test_ipynb_non_object_root_is_malformed() {
        assert!(matches!(
            convert("[1,2]").unwrap_err(),
            ConvertError::MalformedDocument { .. }
        ));
    }
}
