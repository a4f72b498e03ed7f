use crate::converter::{ConversionOptions, ConversionResult, Converter};
use crate::error::ConvertError;

/// Wraps source files in a fenced block tagged with their language.
///
/// The trait entry point has no extension to work with, so it emits a bare
/// fence; callers that know the extension use `for_extension`.
pub struct CodeConverter<'a> {
    extension: &'a str,
}

const LANGUAGES: &[(&[&str], &str)] = &[
    (&["c", "h"], "c"),
    (&["cpp", "cc", "cxx", "hpp", "hxx", "hh"], "cpp"),
    (&["cs"], "csharp"),
    (&["css"], "css"),
    (&["scss"], "scss"),
    (&["sass"], "sass"),
    (&["less"], "less"),
    (&["go"], "go"),
    (&["java"], "java"),
    (&["js", "mjs", "cjs"], "javascript"),
    (&["jsx"], "jsx"),
    (&["kt", "kts"], "kotlin"),
    (&["lua"], "lua"),
    (&["php"], "php"),
    (&["pl", "pm"], "perl"),
    (&["py", "pyw"], "python"),
    (&["r"], "r"),
    (&["rb"], "ruby"),
    (&["rs"], "rust"),
    (&["scala"], "scala"),
    (&["sh", "bash", "zsh"], "bash"),
    (&["sql"], "sql"),
    (&["swift"], "swift"),
    (&["ts", "mts", "cts"], "typescript"),
    (&["tsx"], "tsx"),
    (&["ps1"], "powershell"),
    (&["bat", "cmd"], "batch"),
];

const SUPPORTED_EXTENSIONS: &[&str] = &[
    "c", "h", "cpp", "cc", "cxx", "hpp", "hxx", "hh", "cs", "css", "scss", "sass", "less", "go",
    "java", "js", "mjs", "cjs", "jsx", "kt", "kts", "lua", "php", "pl", "pm", "py", "pyw", "r",
    "rb", "rs", "scala", "sh", "bash", "zsh", "sql", "swift", "ts", "mts", "cts", "tsx", "ps1",
    "bat", "cmd",
];

/// Map a file extension to its fenced code block language identifier.
fn language_for_extension(ext: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(exts, _)| exts.contains(&ext))
        .map(|(_, lang)| *lang)
}

impl<'a> CodeConverter<'a> {
    pub fn for_extension(extension: &'a str) -> Self {
        Self { extension }
    }
}

impl Default for CodeConverter<'_> {
    fn default() -> Self {
        Self { extension: "" }
    }
}

impl Converter for CodeConverter<'_> {
    fn supported_extensions(&self) -> &[&str] {
        SUPPORTED_EXTENSIONS
    }

    fn convert(
        &self,
        data: &[u8],
        _options: &ConversionOptions,
    ) -> Result<ConversionResult, ConvertError> {
        let (text, warning) = super::decode_text(data);
        let language = language_for_extension(self.extension).unwrap_or("");
        let markdown = format!("```{language}\n{}\n```\n", text.trim_end());

        Ok(ConversionResult {
            markdown,
            warnings: warning.into_iter().collect(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(ext: &str, input: &[u8]) -> String {
        CodeConverter::for_extension(ext)
            .convert(input, &ConversionOptions::default())
            .unwrap()
            .markdown
    }

    #[test]
    fn test_code_python_fence() {
        let md = convert("py", b"def hello():\n    return 1\n");
        assert_eq!(md, "```python\ndef hello():\n    return 1\n```\n");
    }

    #[test]
    fn test_code_rust_fence() {
        let md = convert("rs", b"fn main() {}");
        assert!(md.starts_with("```rust\n"));
    }

    #[test]
    fn test_code_stylesheet_languages() {
        assert!(convert("css", b"a{}").starts_with("```css\n"));
        assert!(convert("scss", b"a{}").starts_with("```scss\n"));
        assert!(convert("less", b"a{}").starts_with("```less\n"));
    }

    #[test]
    fn test_code_default_has_bare_fence() {
        let md = CodeConverter::default()
            .convert(b"x = 1", &ConversionOptions::default())
            .unwrap()
            .markdown;
        assert_eq!(md, "```\nx = 1\n```\n");
    }

    #[test]
    fn test_code_every_supported_extension_has_language() {
        for ext in SUPPORTED_EXTENSIONS {
            assert!(
                language_for_extension(ext).is_some(),
                "no language for .{ext}"
            );
        }
    }

    #[test]
    fn test_code_can_convert() {
        let converter = CodeConverter::default();
        assert!(converter.can_convert("go"));
        assert!(!converter.can_convert("txt"));
    }
}
