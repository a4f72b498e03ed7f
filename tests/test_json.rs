use docmd::{ConversionOptions, ErrorKind, convert_bytes, convert_file};

#[test]
fn test_json_convert_file_sample() {
    let result = convert_file("tests/fixtures/sample.json", &ConversionOptions::default()).unwrap();
    assert!(result.markdown.starts_with("```json\n{\n"));
    assert!(result.markdown.contains("  \"project\": \"docmd\""));
    assert!(result.markdown.ends_with("\n```\n"));
}

#[test]
fn test_json_broken_fixture() {
    let err = convert_file("tests/fixtures/broken.json", &ConversionOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDocumentError);
}

#[test]
fn test_jsonl_one_block_per_record() {
    let input = b"{\"a\":1}\n\n{\"b\":2}\n";
    let result = convert_bytes(input, "jsonl", &ConversionOptions::default()).unwrap();
    assert_eq!(result.markdown.matches("```json").count(), 2);
    assert!(result.warnings.is_empty());
}
