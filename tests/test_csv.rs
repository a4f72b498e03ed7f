mod common;

use common::normalize;
use docmd::{ConversionOptions, convert_file};

/// sample.csv end-to-end via convert_file; quoted fields keep their quotes.
#[test]
fn test_csv_convert_file_sample() {
    let result = convert_file("tests/fixtures/sample.csv", &ConversionOptions::default()).unwrap();
    let expected = "| Name | City | Note |\n|---|---|---|\n| Alice | Tokyo | likes \"quotes\" |\n| Bob | Seoul | plain |";
    assert_eq!(normalize(&result.markdown), expected);
    assert_eq!(result.title, None);
}

#[test]
fn test_tsv_convert_file_sample() {
    let result = convert_file("tests/fixtures/sample.tsv", &ConversionOptions::default()).unwrap();
    assert!(result.markdown.starts_with("| Name | Score |\n|---|---|\n"));
    assert!(result.markdown.contains("| Bob | 85 |"));
}

#[test]
fn test_csv_convert_bytes_direct() {
    let result = docmd::convert_bytes(b"X,Y\n1,2\n", "csv", &ConversionOptions::default()).unwrap();
    assert!(result.markdown.contains("| X | Y |"));
    assert!(result.markdown.contains("| 1 | 2 |"));
}
