//! Small Markdown building blocks shared by the converters.

/// Make cell text safe inside a pipe table: escape backslashes and pipes,
/// turn line breaks into `<br>`.
fn escape_cell(content: &str) -> String {
    content
        .replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
}

fn table_row<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for cell in cells {
        line.push(' ');
        line.push_str(&escape_cell(cell));
        line.push_str(" |");
    }
    line.push('\n');
    line
}

/// Build a pipe table. Rows are padded or truncated to the header width;
/// an empty header yields an empty string.
pub fn build_table(headers: &[&str], rows: &[Vec<&str>]) -> String {
    let width = headers.len();
    if width == 0 {
        return String::new();
    }

    let mut out = table_row(headers.iter().copied());
    out.push('|');
    out.push_str(&"---|".repeat(width));
    out.push('\n');
    for row in rows {
        out.push_str(&table_row(
            (0..width).map(|i| row.get(i).copied().unwrap_or("")),
        ));
    }
    out
}

/// ATX heading with a trailing newline; the level is clamped to 1..=6.
pub fn format_heading(level: u8, text: &str) -> String {
    format!("{} {text}\n", "#".repeat(level.clamp(1, 6) as usize))
}

/// Wrap text in bold/italic markers, keeping surrounding whitespace outside
/// the markers. Whitespace-only text loses its markers entirely.
pub fn wrap_formatting(text: &str, bold: bool, italic: bool) -> String {
    let marker = match (bold, italic) {
        (false, false) => return text.to_string(),
        (true, false) => "**",
        (false, true) => "*",
        (true, true) => "***",
    };

    let core = text.trim();
    if core.is_empty() {
        return String::new();
    }
    let start = text.len() - text.trim_start().len();
    let end = start + core.len();
    format!("{}{marker}{core}{marker}{}", &text[..start], &text[end..])
}

/// One list line. `level` is the zero-based nesting depth; `counter` is the
/// ordinal used for ordered lists.
pub fn format_list_item(level: u8, ordered: bool, counter: usize, text: &str) -> String {
    let indent = "  ".repeat(level as usize);
    if ordered {
        format!("{indent}{counter}. {text}")
    } else {
        format!("{indent}- {text}")
    }
}
