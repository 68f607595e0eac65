use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum OtdrError {
    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("invalid wavelength selection: {0}")]
    InvalidWavelengths(String),

    #[error("no template configured for wavelengths {key}")]
    TemplateNotConfigured { key: String },

    #[error("Excel template not found: {path}")]
    TemplateNotFound { path: PathBuf },

    #[error("sheet '{sheet}' not found in the Excel template")]
    SheetNotFound { sheet: String },

    #[error("failed to read Excel template: {0}")]
    TemplateRead(String),

    #[error("failed to write workbook: {0}")]
    WorkbookWrite(String),

    #[error("invalid cell reference '{0}'")]
    InvalidCellRef(String),

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error(
        "the following PDF files exceed the maximum allowed size of {}: {names}",
        size_label(.limit)
    )]
    FileTooLarge { names: String, limit: u64 },

    #[error("error processing {name}: {source}")]
    ReportFailed {
        name: String,
        #[source]
        source: Box<OtdrError>,
    },

    #[error("no PDF files uploaded")]
    NoReports,

    #[error("no data extracted from the uploaded PDFs")]
    EmptyBatch,

    #[error("incorrect password")]
    Unauthorized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

const MIB: u64 = 1024 * 1024;

/// Whole megabytes, rounded up, or plain bytes below one megabyte.
fn size_label(bytes: &u64) -> String {
    let bytes = *bytes;
    if bytes < MIB {
        format!("{bytes} bytes")
    } else {
        format!("{}MB", bytes.div_ceil(MIB))
    }
}

impl OtdrError {
    /// Template or configuration problems. These abort a batch before any
    /// extraction happens and are never the caller's fault.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OtdrError::TemplateNotConfigured { .. }
                | OtdrError::TemplateNotFound { .. }
                | OtdrError::SheetNotFound { .. }
                | OtdrError::TemplateRead(_)
                | OtdrError::InvalidCellRef(_)
                | OtdrError::ConfigLoad { .. }
        )
    }

    /// Problems with what the caller sent.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            OtdrError::InvalidWavelengths(_)
                | OtdrError::FileTooLarge { .. }
                | OtdrError::NoReports
                | OtdrError::EmptyBatch
                | OtdrError::Unauthorized
        )
    }
}
