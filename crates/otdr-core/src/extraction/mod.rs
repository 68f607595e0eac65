pub mod pdf_extract;
pub mod pdftotext;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OtdrError;

/// Text extracted from a single page of a PDF.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub page_number: usize,
    pub text: String,
}

impl PageContent {
    pub fn new(page_number: usize, text: impl Into<String>) -> Self {
        PageContent {
            page_number,
            text: text.into(),
        }
    }

    /// Whether the page has any text worth running the extractor on.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract text content from PDF bytes, returning one PageContent per page.
    /// Pages without text are still returned so callers can report them.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, OtdrError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Selectable extraction backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    #[default]
    Pdftotext,
    PdfExtract,
}

impl Backend {
    pub fn build(self) -> Box<dyn PdfExtractor> {
        match self {
            Backend::Pdftotext => Box::new(pdftotext::PdftotextExtractor::new()),
            Backend::PdfExtract => Box::new(pdf_extract::PdfExtractExtractor::new()),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Pdftotext => write!(f, "pdftotext"),
            Backend::PdfExtract => write!(f, "pdf-extract"),
        }
    }
}

impl FromStr for Backend {
    type Err = OtdrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdftotext" => Ok(Backend::Pdftotext),
            "pdf-extract" | "pdf_extract" => Ok(Backend::PdfExtract),
            other => Err(OtdrError::Extraction(format!(
                "unknown extraction backend '{other}'. Available: pdftotext, pdf-extract"
            ))),
        }
    }
}
