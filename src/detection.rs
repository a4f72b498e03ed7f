use std::io::Cursor;
use std::path::Path;

use crate::converter::Converter;
use crate::converter::code::CodeConverter;

/// Magic bytes signatures for sniffed formats.
const ZIP_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04];
const PDF_MAGIC: &[u8] = b"%PDF";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Detect the document format from a file path and header bytes.
///
/// Priority: magic bytes → file extension → JSON sniff. The result is a
/// format name understood by `convert_bytes`; ZIP containers come back as
/// `"zip"` and need `detect_zip_format` to be told apart.
pub fn detect_format(path: &Path, header_bytes: &[u8]) -> Option<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    if header_bytes.starts_with(ZIP_MAGIC) {
        return Some("zip".to_string());
    }
    if header_bytes.starts_with(PDF_MAGIC) {
        return Some("pdf".to_string());
    }
    // Legacy Office compound files: only spreadsheets are readable.
    if header_bytes.starts_with(OLE_MAGIC) {
        return Some(match extension.as_deref() {
            Some("xls") => "xls".to_string(),
            Some(other) => other.to_string(),
            None => "ole".to_string(),
        });
    }

    if let Some(format) = extension.as_deref().and_then(detect_by_extension) {
        return Some(format);
    }

    // Unknown or missing extension: `{` or `[` up front reads as JSON.
    match header_bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{' | b'[') => Some("json".to_string()),
        _ => None,
    }
}

/// Detect the specific format of a ZIP-based file by inspecting its members.
///
/// Returns "docx", "xlsx" or "pptx" for Office Open XML packages, the
/// OpenDocument kind named by the `mimetype` member, and "zip" for anything
/// else that opens as an archive.
pub fn detect_zip_format(data: &[u8]) -> Option<&'static str> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).ok()?;

    for i in 0..archive.len() {
        if let Ok(file) = archive.by_index_raw(i) {
            let name = file.name();
            if name.starts_with("word/") {
                return Some("docx");
            }
            if name.starts_with("xl/") {
                return Some("xlsx");
            }
            if name.starts_with("ppt/") {
                return Some("pptx");
            }
        }
    }

    if let Ok(mut mimetype) = archive.by_name("mimetype") {
        let mut kind = String::new();
        if std::io::Read::read_to_string(&mut mimetype, &mut kind).is_ok() {
            match kind.trim() {
                "application/vnd.oasis.opendocument.spreadsheet" => return Some("ods"),
                "application/vnd.oasis.opendocument.text" => return Some("odt"),
                "application/vnd.oasis.opendocument.presentation" => return Some("odp"),
                _ => {}
            }
        }
    }

    Some("zip")
}

/// Full resolution used by the library: sniff, then look inside ZIP containers.
pub fn resolve_format(path: &Path, header: &[u8], data: &[u8]) -> Option<String> {
    match detect_format(path, header)?.as_str() {
        // Unreadable containers still go to the archive converter, which reports why.
        "zip" => Some(detect_zip_format(data).unwrap_or("zip").to_string()),
        other => Some(other.to_string()),
    }
}

/// Detect format by file extension alone.
fn detect_by_extension(ext: &str) -> Option<String> {
    let format = match ext {
        "txt" | "text" | "log" | "md" | "markdown" | "rst" | "ini" | "cfg" | "conf" | "toml"
        | "yaml" | "yml" => "txt",
        "html" | "htm" => "html",
        "csv" | "tsv" | "json" | "jsonl" | "ndjson" | "xml" | "ipynb" | "docx" | "pptx"
        | "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" | "odt" | "odp" | "zip" | "pdf" => ext,
        _ if CodeConverter::default().can_convert(ext) => ext,
        _ => return None,
    };
    Some(format.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn detect(name: &str, header: &[u8]) -> Option<String> {
        detect_format(&PathBuf::from(name), header)
    }

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(detect("report.docx", &[]).as_deref(), Some("docx"));
        assert_eq!(detect("data.csv", &[]).as_deref(), Some("csv"));
        assert_eq!(detect("data.tsv", &[]).as_deref(), Some("tsv"));
        assert_eq!(detect("page.HTM", &[]).as_deref(), Some("html"));
        assert_eq!(detect("book.ods", &[]).as_deref(), Some("ods"));
    }

    #[test]
    fn test_detect_text_variants() {
        for ext in ["log", "md", "markdown", "rst", "ini", "cfg", "conf", "toml", "yaml", "yml"] {
            assert_eq!(
                detect(&format!("file.{ext}"), &[]).as_deref(),
                Some("txt"),
                "expected 'txt' for .{ext}"
            );
        }
    }

    #[test]
    fn test_detect_code_keeps_extension() {
        assert_eq!(detect("main.rs", &[]).as_deref(), Some("rs"));
        assert_eq!(detect("app.py", b"import os").as_deref(), Some("py"));
        assert_eq!(detect("style.scss", &[]).as_deref(), Some("scss"));
    }

    #[test]
    fn test_detect_unknown_or_missing_extension() {
        assert_eq!(detect("file.xyz", b"abc"), None);
        assert_eq!(detect("Makefile", b"all:"), None);
    }

    #[test]
    fn test_magic_bytes_override_extension() {
        assert_eq!(detect("data.csv", &[0x50, 0x4B, 0x03, 0x04]).as_deref(), Some("zip"));
        assert_eq!(detect("file.txt", b"%PDF-1.7").as_deref(), Some("pdf"));
    }

    #[test]
    fn test_ole_header_keeps_extension() {
        assert_eq!(detect("old.xls", OLE_MAGIC).as_deref(), Some("xls"));
        assert_eq!(detect("old.doc", OLE_MAGIC).as_deref(), Some("doc"));
    }

    #[test]
    fn test_json_sniff() {
        assert_eq!(detect("data.bin", b"  {\"k\": 1}").as_deref(), Some("json"));
        assert_eq!(detect("data", b"[1, 2]").as_deref(), Some("json"));
        assert_eq!(detect("data.xyz", b"\n{}").as_deref(), Some("json"));
    }

    #[test]
    fn test_known_extension_beats_json_sniff() {
        assert_eq!(detect("Cargo.toml", b"[package]\nname = \"x\"").as_deref(), Some("txt"));
        assert_eq!(detect("setup.ini", b"[section]\nkey=1").as_deref(), Some("txt"));
        assert_eq!(detect("README.md", b"[link](http://x)").as_deref(), Some("txt"));
        assert_eq!(detect("config.yaml", b"{a: 1}").as_deref(), Some("txt"));
        assert_eq!(detect("app.js", b"[1, 2].map(f)").as_deref(), Some("js"));
        assert_eq!(detect("feed.xml", b"[x]").as_deref(), Some("xml"));
    }

    #[test]
    fn test_json_sniff_skips_notebooks_and_lines() {
        assert_eq!(detect("nb.ipynb", b"{\"cells\"").as_deref(), Some("ipynb"));
        assert_eq!(detect("log.jsonl", b"{\"a\":1}").as_deref(), Some("jsonl"));
    }

    #[test]
    fn test_zip_format_by_members() {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let build = |member: &str, body: &str| {
            let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
            zip.start_file(member, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
            zip.finish().unwrap().into_inner()
        };

        assert_eq!(detect_zip_format(&build("word/document.xml", "")), Some("docx"));
        assert_eq!(detect_zip_format(&build("xl/workbook.xml", "")), Some("xlsx"));
        assert_eq!(
            detect_zip_format(&build("mimetype", "application/vnd.oasis.opendocument.spreadsheet")),
            Some("ods")
        );
        assert_eq!(detect_zip_format(&build("ppt/presentation.xml", "")), Some("pptx"));
        assert_eq!(
            detect_zip_format(&build("mimetype", "application/vnd.oasis.opendocument.text")),
            Some("odt")
        );
        assert_eq!(
            detect_zip_format(&build("mimetype", "application/vnd.oasis.opendocument.presentation")),
            Some("odp")
        );
        assert_eq!(detect_zip_format(&build("notes.txt", "hi")), Some("zip"));
        assert_eq!(detect_zip_format(b"not a zip"), None);
    }

    #[test]
    fn test_resolve_format_looks_inside_zip() {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"<w:document/>").unwrap();
        let data = zip.finish().unwrap().into_inner();

        let format = resolve_format(&PathBuf::from("renamed.bin"), &data[..16], &data);
        assert_eq!(format.as_deref(), Some("docx"));
    }
}
