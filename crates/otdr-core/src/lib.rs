pub mod batch;
pub mod config;
pub mod error;
pub mod extraction;
pub mod model;
pub mod parsing;
pub mod progress;
pub mod template;

use batch::{BatchOutput, BatchRequest, TableBuild};
use error::OtdrError;
use extraction::PdfExtractor;
use progress::NullProgress;
use template::TemplateSet;

pub use parsing::extract;
pub use template::fill::fill;

/// Main API entry point: turn a batch of OTDR PDF reports into a filled
/// results workbook.
///
/// Reports are processed strictly in the order given. Use
/// [`batch::run_batch`] directly to observe progress.
pub fn process_pdfs(
    request: &BatchRequest,
    templates: &TemplateSet,
    extractor: &dyn PdfExtractor,
) -> Result<BatchOutput, OtdrError> {
    batch::run_batch(request, templates, extractor, &NullProgress)
}

/// Extract the result table only, without touching any template.
pub fn preview_pdfs(
    request: &BatchRequest,
    extractor: &dyn PdfExtractor,
) -> Result<TableBuild, OtdrError> {
    batch::extract_table(request, extractor, &NullProgress)
}
