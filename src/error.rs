use serde::Serialize;

/// Errors that can occur during document conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("unsupported format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("input too large: {size} bytes exceeds limit of {limit} bytes")]
    InputTooLarge { size: u64, limit: u64 },

    #[error("failed to read ZIP archive")]
    ZipError(#[from] zip::result::ZipError),

    #[error("failed to parse XML")]
    XmlError(#[from] quick_xml::Error),

    #[error("failed to read spreadsheet")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("invalid UTF-8 content")]
    Utf8Error(#[from] std::str::Utf8Error),

    #[error("malformed document: {reason}")]
    MalformedDocument { reason: String },
}

impl ConvertError {
    /// The category tag reported for this error in the JSON envelope.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormatError,
            ConvertError::InputTooLarge { .. } => ErrorKind::InputTooLargeError,
            ConvertError::ZipError(_) => ErrorKind::ArchiveError,
            ConvertError::XmlError(_) => ErrorKind::XmlError,
            ConvertError::SpreadsheetError(_) => ErrorKind::SpreadsheetError,
            ConvertError::Io(_) => ErrorKind::IoError,
            ConvertError::Utf8Error(_) => ErrorKind::EncodingError,
            ConvertError::MalformedDocument { .. } => ErrorKind::MalformedDocumentError,
        }
    }
}

/// Closed set of failure categories a report can carry.
///
/// The first two are raised by the command-line driver before the library is
/// invoked; the rest come out of a conversion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ArgumentError,
    FileNotFoundError,
    UnsupportedFormatError,
    InputTooLargeError,
    IoError,
    EncodingError,
    ArchiveError,
    XmlError,
    SpreadsheetError,
    MalformedDocumentError,
    ConverterPanic,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ArgumentError => "ArgumentError",
            ErrorKind::FileNotFoundError => "FileNotFoundError",
            ErrorKind::UnsupportedFormatError => "UnsupportedFormatError",
            ErrorKind::InputTooLargeError => "InputTooLargeError",
            ErrorKind::IoError => "IoError",
            ErrorKind::EncodingError => "EncodingError",
            ErrorKind::ArchiveError => "ArchiveError",
            ErrorKind::XmlError => "XmlError",
            ErrorKind::SpreadsheetError => "SpreadsheetError",
            ErrorKind::MalformedDocumentError => "MalformedDocumentError",
            ErrorKind::ConverterPanic => "ConverterPanic",
        }
    }

    /// Whether this kind is detected before any conversion is attempted.
    pub fn is_precondition(self) -> bool {
        matches!(self, ErrorKind::ArgumentError | ErrorKind::FileNotFoundError)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
