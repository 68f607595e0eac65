use indicatif::MultiProgress;
use otdr_core::batch::{self, BatchRequest, TableBuild, OUTPUT_FILE_NAME};
use otdr_core::config::AppConfig;
use otdr_core::error::OtdrError;
use otdr_core::model::WavelengthSet;
use otdr_core::progress::ProgressCallback;
use std::path::PathBuf;

use crate::output;
use crate::progress::IndicatifProgress;

pub struct ExtractOptions {
    pub pdfs: Vec<PathBuf>,
    pub wavelengths: WavelengthSet,
    pub out: Option<PathBuf>,
    /// Print the extracted table without filling a template.
    pub preview: bool,
    pub output_format: String,
    pub max_file_size_mb: Option<u64>,
}

pub fn run(
    config: &AppConfig,
    multi: &MultiProgress,
    opts: ExtractOptions,
) -> Result<(), OtdrError> {
    let reports = super::read_reports(&opts.pdfs)?;
    let request = BatchRequest {
        reports,
        wavelengths: opts.wavelengths,
        authorized: true,
        max_file_size: opts.max_file_size_mb.map(megabytes),
    };
    let extractor = config.extractor.build();
    let progress = IndicatifProgress::reports_bar(multi, "Reading reports...");

    let build = if opts.preview {
        let build = batch::extract_table(&request, extractor.as_ref(), &progress)?;
        progress.finish(format!("{} record(s) extracted", build.table.len()));
        build
    } else {
        let templates = config.template_set()?;
        let result = batch::run_batch(&request, &templates, extractor.as_ref(), &progress)?;
        let path = opts.out.unwrap_or_else(|| PathBuf::from(OUTPUT_FILE_NAME));
        std::fs::write(&path, &result.workbook)?;
        eprintln!(
            "Wrote {} record(s) for {} to {}",
            result.table.len(),
            request.wavelengths,
            path.display()
        );
        TableBuild {
            table: result.table,
            skipped_pages: result.skipped_pages,
        }
    };

    match opts.output_format.as_str() {
        "json" => output::json::print(&build)?,
        _ => {
            println!(
                "{}",
                output::table::format_table(&build.table, output::table::PREVIEW_ROWS)
            );
            output::table::print_skipped(&build.skipped_pages);
        }
    }

    Ok(())
}

/// `--max-file-size` in bytes. Absurd values clamp instead of overflowing.
fn megabytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_megabytes() {
        assert_eq!(megabytes(30), 30 * 1024 * 1024);
        assert_eq!(megabytes(u64::MAX), u64::MAX);
    }
}
