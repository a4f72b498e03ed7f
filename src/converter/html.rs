use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};

use crate::converter::{
    ConversionOptions, ConversionResult, ConversionWarning, Converter, WarningCode,
};
use crate::error::ConvertError;
use crate::markdown::{build_table, format_heading, format_list_item};

/// Elements nested deeper than this are flattened to their plain text.
const MAX_DEPTH: usize = 256;

pub struct HtmlConverter;

impl Converter for HtmlConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["html", "htm"]
    }

    fn convert(
        &self,
        data: &[u8],
        _options: &ConversionOptions,
    ) -> Result<ConversionResult, ConvertError> {
        let (text, warning) = super::decode_text(data);
        let document = Html::parse_document(&text);

        let mut renderer = Renderer::default();
        let mut blocks = Vec::new();
        renderer.blocks(*document.root_element(), 0, &mut blocks);
        let markdown = if blocks.is_empty() {
            String::new()
        } else {
            blocks.join("\n\n") + "\n"
        };

        let mut warnings: Vec<ConversionWarning> = warning.into_iter().collect();
        if renderer.flattened > 0 {
            warnings.push(ConversionWarning {
                code: WarningCode::SkippedElement,
                message: format!(
                    "{} element(s) nested deeper than {MAX_DEPTH} levels rendered as plain text",
                    renderer.flattened
                ),
                location: None,
            });
        }

        Ok(ConversionResult {
            markdown,
            title: extract_title(&document),
            warnings,
        })
    }
}

/// `<title>` first, then the first `<h1>`.
fn extract_title(document: &Html) -> Option<String> {
    ["title", "h1"].iter().find_map(|tag| {
        let selector = Selector::parse(tag).ok()?;
        let el = document.select(&selector).next()?;
        let text = collapse_whitespace(&el.text().collect::<String>());
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}

fn is_skipped(tag: &str) -> bool {
    matches!(
        tag,
        "head" | "script" | "style" | "noscript" | "template" | "iframe" | "svg"
    )
}

fn tag_name<'a>(node: &NodeRef<'a, Node>) -> Option<&'a str> {
    match node.value() {
        Node::Element(el) => Some(el.name()),
        _ => None,
    }
}

fn attr<'a>(node: &NodeRef<'a, Node>, name: &str) -> Option<&'a str> {
    match node.value() {
        Node::Element(el) => el.attr(name),
        _ => None,
    }
}

/// All text below `node`, whitespace collapsed. Iterative, so safe at any depth.
fn flat_text(node: NodeRef<'_, Node>) -> String {
    let text: String = node
        .descendants()
        .filter_map(|n| match n.value() {
            Node::Text(t) => Some(&*t.text),
            _ => None,
        })
        .collect();
    collapse_whitespace(&text)
}

/// Recursive walk over the DOM, bounded by `MAX_DEPTH`.
#[derive(Default)]
struct Renderer {
    /// Subtrees cut off at the depth limit.
    flattened: usize,
}

impl Renderer {
    fn too_deep(&mut self, depth: usize) -> bool {
        if depth < MAX_DEPTH {
            return false;
        }
        self.flattened += 1;
        true
    }

    // ---- Block level ----

    /// Walk the children of `node`, pushing finished Markdown blocks.
    ///
    /// Runs of inline content between block elements are gathered into a single
    /// paragraph.
    fn blocks(&mut self, node: NodeRef<'_, Node>, depth: usize, out: &mut Vec<String>) {
        if self.too_deep(depth) {
            let text = tidy_inline(&flat_text(node));
            if !text.is_empty() {
                out.push(text);
            }
            return;
        }

        let mut pending = String::new();

        for child in node.children() {
            let Some(tag) = tag_name(&child) else {
                if let Node::Text(text) = child.value() {
                    pending.push_str(&collapse_whitespace(&text.text));
                }
                continue;
            };

            if is_skipped(tag) {
                continue;
            }

            let block = match tag {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    let level = tag[1..].parse::<u8>().unwrap_or(1);
                    let text = self.inline_text(child, depth + 1);
                    (!text.is_empty()).then(|| format_heading(level, &text).trim_end().to_string())
                }
                "p" => Some(self.inline_text(child, depth + 1)).filter(|t| !t.is_empty()),
                "pre" => Some(render_pre(child)),
                "ul" | "ol" => Some(self.list(child, 0, depth + 1)).filter(|t| !t.is_empty()),
                "blockquote" => {
                    let mut inner = Vec::new();
                    self.blocks(child, depth + 1, &mut inner);
                    (!inner.is_empty()).then(|| quote(&inner.join("\n\n")))
                }
                "table" => self.table(child, depth + 1),
                "hr" => Some("---".to_string()),
                "html" | "body" | "div" | "section" | "article" | "main" | "header" | "footer"
                | "nav" | "aside" | "figure" | "form" | "fieldset" | "details" | "dl" => {
                    flush(&mut pending, out);
                    self.blocks(child, depth + 1, out);
                    continue;
                }
                _ => {
                    pending.push_str(&self.inline(child, depth + 1));
                    continue;
                }
            };

            flush(&mut pending, out);
            if let Some(block) = block {
                out.push(block);
            }
        }

        flush(&mut pending, out);
    }

    fn list(&mut self, node: NodeRef<'_, Node>, level: u8, depth: usize) -> String {
        if self.too_deep(depth) {
            return tidy_inline(&flat_text(node));
        }

        let ordered = tag_name(&node) == Some("ol");
        let mut lines = Vec::new();
        let mut counter = 0;

        for item in node.children().filter(|c| tag_name(c) == Some("li")) {
            counter += 1;
            let mut text = String::new();
            let mut nested = Vec::new();
            for child in item.children() {
                match tag_name(&child) {
                    Some("ul") | Some("ol") => {
                        nested.push(self.list(child, level.saturating_add(1), depth + 2))
                    }
                    Some("p") => {
                        text.push(' ');
                        text.push_str(&self.inline(child, depth + 2));
                    }
                    _ => text.push_str(&self.inline(child, depth + 2)),
                }
            }
            lines.push(format_list_item(level, ordered, counter, &tidy_inline(&text)));
            lines.extend(nested.into_iter().filter(|n| !n.is_empty()));
        }

        lines.join("\n")
    }

    fn table(&mut self, node: NodeRef<'_, Node>, depth: usize) -> Option<String> {
        let rows: Vec<Vec<String>> = node
            .descendants()
            .filter(|n| tag_name(n) == Some("tr"))
            .map(|tr| {
                tr.children()
                    .filter(|c| matches!(tag_name(c), Some("th") | Some("td")))
                    .map(|cell| self.inline_text(cell, depth + 1))
                    .collect::<Vec<_>>()
            })
            .filter(|row| !row.is_empty())
            .collect();

        let (header, body) = rows.split_first()?;
        let header: Vec<&str> = header.iter().map(String::as_str).collect();
        let body: Vec<Vec<&str>> = body
            .iter()
            .map(|row| row.iter().map(String::as_str).collect())
            .collect();
        Some(build_table(&header, &body).trim_end().to_string())
    }

    // ---- Inline level ----

    fn inline_text(&mut self, node: NodeRef<'_, Node>, depth: usize) -> String {
        let mut text = String::new();
        for child in node.children() {
            text.push_str(&self.inline(child, depth + 1));
        }
        tidy_inline(&text)
    }

    fn inline(&mut self, node: NodeRef<'_, Node>, depth: usize) -> String {
        let tag = match node.value() {
            Node::Text(text) => return collapse_whitespace(&text.text),
            Node::Element(el) => el.name(),
            _ => return String::new(),
        };

        if is_skipped(tag) {
            return String::new();
        }
        if self.too_deep(depth) {
            return flat_text(node);
        }

        match tag {
            "br" => "\n".to_string(),
            "img" => {
                let alt = attr(&node, "alt").unwrap_or("");
                let src = attr(&node, "src").unwrap_or("");
                format!("![{alt}]({src})")
            }
            "strong" | "b" => wrap(&self.inline_text(node, depth), "**"),
            "em" | "i" => wrap(&self.inline_text(node, depth), "*"),
            "code" => wrap(&self.inline_text(node, depth), "`"),
            "a" => {
                let text = self.inline_text(node, depth);
                match attr(&node, "href") {
                    Some(href) if !href.is_empty() && !text.is_empty() => {
                        format!("[{text}]({href})")
                    }
                    _ => text,
                }
            }
            "input" if attr(&node, "type") == Some("checkbox") => {
                if attr(&node, "checked").is_some() {
                    "[x] ".to_string()
                } else {
                    "[ ] ".to_string()
                }
            }
            _ => node
                .children()
                .map(|child| self.inline(child, depth + 1))
                .collect(),
        }
    }
}

fn flush(pending: &mut String, out: &mut Vec<String>) {
    let text = tidy_inline(pending);
    if !text.is_empty() {
        out.push(text);
    }
    pending.clear();
}

fn render_pre(node: NodeRef<'_, Node>) -> String {
    let language = node
        .children()
        .find(|c| tag_name(c) == Some("code"))
        .and_then(|code| attr(&code, "class"))
        .and_then(|class| {
            class
                .split_whitespace()
                .find_map(|c| c.strip_prefix("language-"))
        })
        .unwrap_or("");
    let body = ElementRef::wrap(node)
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default();
    format!("```{language}\n{}\n```", body.trim_end_matches('\n'))
}

fn quote(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn wrap(text: &str, marker: &str) -> String {
    if text.is_empty() {
        String::new()
    } else {
        format!("{marker}{text}{marker}")
    }
}

/// Collapse consecutive whitespace characters into a single space.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_ws = false;
    for c in s.chars() {
        if c.is_ascii_whitespace() {
            if !prev_ws {
                result.push(' ');
            }
            prev_ws = true;
        } else {
            result.push(c);
            prev_ws = false;
        }
    }
    result
}

/// Trim every line of gathered inline text and collapse the spaces left
/// where adjacent text nodes met.
fn tidy_inline(s: &str) -> String {
    s.split('\n')
        .map(|line| collapse_whitespace(line).trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(html: &str) -> ConversionResult {
        HtmlConverter
            .convert(html.as_bytes(), &ConversionOptions::default())
            .unwrap()
    }

    #[test]
    fn test_html_headings_and_paragraphs() {
        let result = convert("<h1>Title</h1><p>Hello   <b>bold</b> world</p><h3>Sub</h3>");
        assert_eq!(result.markdown, "# Title\n\nHello **bold** world\n\n### Sub\n");
    }

    #[test]
    fn test_html_title_prefers_title_tag() {
        let result = convert("<html><head><title> Page </title></head><body><h1>H</h1></body></html>");
        assert_eq!(result.title.as_deref(), Some("Page"));
        assert!(!result.markdown.contains("Page"));
    }

    #[test]
    fn test_html_title_falls_back_to_h1() {
        let result = convert("<body><h1>First <em>one</em></h1><h1>Second</h1></body>");
        assert_eq!(result.title.as_deref(), Some("First one"));
    }

    #[test]
    fn test_html_no_title() {
        assert!(convert("<p>just text</p>").title.is_none());
    }

    #[test]
    fn test_html_links_and_images() {
        let result = convert(r#"<p>See <a href="https://example.com">Example</a> <img alt="logo" src="l.png"></p>"#);
        assert!(result.markdown.contains("[Example](https://example.com)"));
        assert!(result.markdown.contains("![logo](l.png)"));
    }

    #[test]
    fn test_html_nested_lists() {
        let result = convert("<ul><li>One<ol><li>A</li><li>B</li></ol></li><li>Two</li></ul>");
        assert_eq!(result.markdown, "- One\n  1. A\n  2. B\n- Two\n");
    }

    #[test]
    fn test_html_table_first_row_header() {
        let result = convert("<table><tr><th>Name</th><th>Age</th></tr><tr><td>Alice</td><td>30</td></tr></table>");
        assert!(result.markdown.contains("| Name | Age |"));
        assert!(result.markdown.contains("|---|---|"));
        assert!(result.markdown.contains("| Alice | 30 |"));
    }

    #[test]
    fn test_html_pre_keeps_whitespace_and_language() {
        let result = convert("<pre><code class=\"language-rust\">fn main() {\n    run();\n}\n</code></pre>");
        assert_eq!(result.markdown, "```rust\nfn main() {\n    run();\n}\n```\n");
    }

    #[test]
    fn test_html_blockquote_prefixed() {
        let result = convert("<blockquote><p>one</p><p>two</p></blockquote>");
        assert_eq!(result.markdown, "> one\n>\n> two\n");
    }

    #[test]
    fn test_html_scripts_and_styles_skipped() {
        let result = convert("<style>p{}</style><script>alert(1)</script><p>kept</p>");
        assert_eq!(result.markdown, "kept\n");
    }

    #[test]
    fn test_html_inline_text_in_div_becomes_paragraph() {
        let result = convert("<div>loose <i>text</i><p>para</p>tail</div>");
        assert_eq!(result.markdown, "loose *text*\n\npara\n\ntail\n");
    }

    #[test]
    fn test_html_line_break() {
        let result = convert("<p>a<br>b</p>");
        assert_eq!(result.markdown, "a\nb\n");
    }

    #[test]
    fn test_html_empty_document() {
        assert_eq!(convert("").markdown, "");
    }

    #[test]
    fn test_html_shallow_document_has_no_depth_warning() {
        let result = convert("<div><div><p>near</p></div></div>");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_html_deeply_nested_divs_flattened_with_warning() {
        let depth = 5_000;
        let html = format!("{}bottom text{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let result = convert(&html);
        assert_eq!(result.markdown, "bottom text\n");
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, WarningCode::SkippedElement);
    }

    #[test]
    fn test_html_deeply_nested_inline_spans() {
        let depth = 5_000;
        let html = format!(
            "<p>start {}deep{} end</p>",
            "<span>".repeat(depth),
            "</span>".repeat(depth)
        );
        let result = convert(&html);
        assert_eq!(result.markdown, "start deep end\n");
        assert_eq!(result.warnings[0].code, WarningCode::SkippedElement);
    }

    #[test]
    fn test_html_deep_nesting_fails_in_strict_mode() {
        let html = format!("{}x{}", "<div>".repeat(1_000), "</div>".repeat(1_000));
        let options = ConversionOptions {
            strict: true,
            ..Default::default()
        };
        let err = crate::convert_bytes(html.as_bytes(), "html", &options).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedDocumentError);
    }
}
