use serde::{Deserialize, Serialize};

use crate::error::OtdrError;
use crate::extraction::{PageContent, PdfExtractor};
use crate::model::{Record, ResultTable, WavelengthSet};
use crate::parsing;
use crate::progress::ProgressCallback;
use crate::template::fill::fill;
use crate::template::TemplateSet;

/// Conventional download name for the filled workbook.
pub const OUTPUT_FILE_NAME: &str = "Updated_OTDR_Results.xlsx";

/// MIME type of the filled workbook.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// One uploaded report.
#[derive(Debug, Clone)]
pub struct PdfInput {
    /// Display name, e.g. the uploaded file name.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Text of one report, already split into pages.
#[derive(Debug, Clone)]
pub struct ReportText {
    pub name: String,
    pub pages: Vec<PageContent>,
}

/// A page that produced no text and therefore no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPage {
    pub source: String,
    pub page_number: usize,
}

/// Table built from a set of reports plus the pages left out of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableBuild {
    pub table: ResultTable,
    pub skipped_pages: Vec<SkippedPage>,
}

/// Everything a caller supplies for one batch.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub reports: Vec<PdfInput>,
    pub wavelengths: WavelengthSet,
    /// Set by whoever guards access (password prompt, HTTP header check).
    pub authorized: bool,
    /// Per-report size limit in bytes.
    pub max_file_size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub table: ResultTable,
    pub skipped_pages: Vec<SkippedPage>,
    /// The filled workbook, see [`OUTPUT_FILE_NAME`].
    pub workbook: Vec<u8>,
}

/// Build the result table from report text.
///
/// Reports and their pages are visited in the order given. Every page with
/// text becomes one record, numbered from 1 across the whole batch; pages
/// without text are skipped and do not consume a number.
pub fn build_table(reports: &[ReportText], wavelengths: &WavelengthSet) -> TableBuild {
    let mut table = ResultTable::new(wavelengths.clone());
    let mut skipped_pages = Vec::new();
    let mut sequence: u32 = 1;

    for report in reports {
        let before = table.len();
        for page in &report.pages {
            if !page.has_text() {
                log::warn!(
                    "No text found on page {} of {}. Skipping.",
                    page.page_number,
                    report.name
                );
                skipped_pages.push(SkippedPage {
                    source: report.name.clone(),
                    page_number: page.page_number,
                });
                continue;
            }

            let measurements = parsing::extract(&page.text, wavelengths);
            if measurements.is_empty() {
                log::debug!(
                    "no measurements on page {} of {}",
                    page.page_number,
                    report.name
                );
            }
            table.push(Record::new(report.name.as_str(), sequence, measurements));
            sequence += 1;
        }
        log::info!(
            "{}: {} record(s) from {} page(s)",
            report.name,
            table.len() - before,
            report.pages.len()
        );
    }

    TableBuild {
        table,
        skipped_pages,
    }
}

/// Run text extraction on every report, in order.
pub fn extract_reports(
    reports: &[PdfInput],
    extractor: &dyn PdfExtractor,
    progress: &dyn ProgressCallback,
) -> Result<Vec<ReportText>, OtdrError> {
    let total = reports.len();
    progress.set_total(total as u64);

    let mut out = Vec::with_capacity(total);
    for (i, report) in reports.iter().enumerate() {
        progress.set_message(format!("Processing {} ({}/{})...", report.name, i + 1, total));
        let pages = extractor
            .extract_pages(&report.bytes)
            .map_err(|e| OtdrError::ReportFailed {
                name: report.name.clone(),
                source: Box::new(e),
            })?;
        log::debug!(
            "{}: {} page(s) via {}",
            report.name,
            pages.len(),
            extractor.backend_name()
        );
        out.push(ReportText {
            name: report.name.clone(),
            pages,
        });
        progress.inc(1);
    }

    Ok(out)
}

/// Extract the result table without filling a template, e.g. for a preview.
pub fn extract_table(
    request: &BatchRequest,
    extractor: &dyn PdfExtractor,
    progress: &dyn ProgressCallback,
) -> Result<TableBuild, OtdrError> {
    check_request(request)?;
    extract_checked(request, extractor, progress)
}

/// Process a batch end to end and return the filled workbook.
///
/// The template is resolved and validated before any report is read, so a
/// configuration problem never costs an extraction run. No workbook is
/// returned unless every step succeeds.
pub fn run_batch(
    request: &BatchRequest,
    templates: &TemplateSet,
    extractor: &dyn PdfExtractor,
    progress: &dyn ProgressCallback,
) -> Result<BatchOutput, OtdrError> {
    check_request(request)?;
    let template = templates.load(&request.wavelengths)?;

    let TableBuild {
        table,
        skipped_pages,
    } = extract_checked(request, extractor, progress)?;

    progress.set_message("Populating Excel template...".into());
    let workbook = fill(&template, &table)?;
    progress.finish(format!("{} record(s) written", table.len()));

    Ok(BatchOutput {
        table,
        skipped_pages,
        workbook,
    })
}

fn check_request(request: &BatchRequest) -> Result<(), OtdrError> {
    if !request.authorized {
        return Err(OtdrError::Unauthorized);
    }
    if request.reports.is_empty() {
        return Err(OtdrError::NoReports);
    }
    if let Some(limit) = request.max_file_size {
        let oversized: Vec<&str> = request
            .reports
            .iter()
            .filter(|r| r.bytes.len() as u64 > limit)
            .map(|r| r.name.as_str())
            .collect();
        if !oversized.is_empty() {
            return Err(OtdrError::FileTooLarge {
                names: oversized.join(", "),
                limit,
            });
        }
    }
    Ok(())
}

fn extract_checked(
    request: &BatchRequest,
    extractor: &dyn PdfExtractor,
    progress: &dyn ProgressCallback,
) -> Result<TableBuild, OtdrError> {
    let reports = extract_reports(&request.reports, extractor, progress)?;
    let build = build_table(&reports, &request.wavelengths);
    if build.table.is_empty() {
        return Err(OtdrError::EmptyBatch);
    }
    Ok(build)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, pages: &[&str]) -> ReportText {
        ReportText {
            name: name.to_string(),
            pages: pages
                .iter()
                .enumerate()
                .map(|(i, t)| PageContent::new(i + 1, *t))
                .collect(),
        }
    }

    fn wavelengths() -> WavelengthSet {
        WavelengthSet::from_nm(&[1310, 1550]).unwrap()
    }

    #[test]
    fn test_sequence_continues_across_reports() {
        let reports = vec![
            report(
                "r1.pdf",
                &["Span length (ft): 100", "", "Span length (ft): 200", "x"],
            ),
            report("r2.pdf", &["  ", "Span loss (dB): 0.1 0.2", "y"]),
        ];
        let build = build_table(&reports, &wavelengths());

        let seqs: Vec<u32> = build.table.records.iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
        let sources: Vec<&str> = build
            .table
            .records
            .iter()
            .map(|r| r.source.as_str())
            .collect();
        assert_eq!(sources, vec!["r1.pdf", "r1.pdf", "r1.pdf", "r2.pdf", "r2.pdf"]);
        assert_eq!(
            build.skipped_pages,
            vec![
                SkippedPage {
                    source: "r1.pdf".into(),
                    page_number: 2
                },
                SkippedPage {
                    source: "r2.pdf".into(),
                    page_number: 1
                },
            ]
        );
    }

    #[test]
    fn test_page_without_labels_still_a_row() {
        let build = build_table(&[report("r.pdf", &["Cover page"])], &wavelengths());
        assert_eq!(build.table.len(), 1);
        let record = &build.table.records[0];
        assert_eq!(record.span_length_ft, None);
        assert_eq!(record.span_loss.len(), 2);
    }

    #[test]
    fn test_unauthorized_request_rejected() {
        let request = BatchRequest {
            reports: vec![PdfInput {
                name: "a.pdf".into(),
                bytes: vec![],
            }],
            wavelengths: wavelengths(),
            authorized: false,
            max_file_size: None,
        };
        assert!(matches!(
            check_request(&request),
            Err(OtdrError::Unauthorized)
        ));
    }

    #[test]
    fn test_oversized_files_listed() {
        let request = BatchRequest {
            reports: vec![
                PdfInput {
                    name: "small.pdf".into(),
                    bytes: vec![0; 10],
                },
                PdfInput {
                    name: "big.pdf".into(),
                    bytes: vec![0; 2 * 1024 * 1024],
                },
            ],
            wavelengths: wavelengths(),
            authorized: true,
            max_file_size: Some(1024 * 1024),
        };
        match check_request(&request) {
            Err(OtdrError::FileTooLarge { names, limit }) => {
                assert_eq!(names, "big.pdf");
                assert_eq!(limit, 1024 * 1024);
            }
            other => panic!("expected FileTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_limit_below_one_megabyte_reported_in_bytes() {
        let request = BatchRequest {
            reports: vec![PdfInput {
                name: "a.pdf".into(),
                bytes: vec![0; 600],
            }],
            wavelengths: wavelengths(),
            authorized: true,
            max_file_size: Some(500),
        };
        let err = check_request(&request).unwrap_err();
        assert!(matches!(err, OtdrError::FileTooLarge { limit: 500, .. }));
        assert!(err.to_string().contains("500 bytes"));
        assert!(!err.to_string().contains("0MB"));
    }

    #[test]
    fn test_no_reports_rejected() {
        let request = BatchRequest {
            reports: vec![],
            wavelengths: wavelengths(),
            authorized: true,
            max_file_size: None,
        };
        assert!(matches!(check_request(&request), Err(OtdrError::NoReports)));
    }
}
