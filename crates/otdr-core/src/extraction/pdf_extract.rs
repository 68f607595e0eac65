use crate::error::OtdrError;
use crate::extraction::{PageContent, PdfExtractor};

/// Pure-Rust extraction backend built on the `pdf-extract` crate.
///
/// Needs no system tools, at the cost of looser line grouping than
/// `pdftotext -layout` on some report generators.
pub struct PdfExtractExtractor;

impl PdfExtractExtractor {
    pub fn new() -> Self {
        PdfExtractExtractor
    }
}

impl Default for PdfExtractExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for PdfExtractExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, OtdrError> {
        let pages = ::pdf_extract::extract_text_from_mem_by_pages(pdf_bytes).map_err(|e| {
            OtdrError::Extraction(format!("failed to extract text from PDF: {e}"))
        })?;

        log::debug!("pdf-extract returned {} page(s)", pages.len());

        Ok(pages
            .into_iter()
            .enumerate()
            .map(|(i, text)| PageContent::new(i + 1, text))
            .collect())
    }

    fn backend_name(&self) -> &str {
        "pdf-extract"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_are_an_extraction_error() {
        let result = PdfExtractExtractor::new().extract_pages(b"not a pdf");
        assert!(matches!(result, Err(OtdrError::Extraction(_))));
    }
}
