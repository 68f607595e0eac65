pub mod extract;
pub mod interactive;
pub mod serve;
pub mod templates;

use otdr_core::batch::PdfInput;
use otdr_core::error::OtdrError;
use std::path::{Path, PathBuf};

/// Read reports from the given paths. A directory contributes its `*.pdf`
/// files in name order; files are taken as given.
pub fn read_reports(paths: &[PathBuf]) -> Result<Vec<PdfInput>, OtdrError> {
    let mut reports = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| is_pdf(p))
                .collect();
            entries.sort();
            if entries.is_empty() {
                log::warn!("no PDF files in {}", path.display());
            }
            for entry in entries {
                reports.push(read_report(&entry)?);
            }
        } else {
            reports.push(read_report(path)?);
        }
    }
    Ok(reports)
}

fn read_report(path: &Path) -> Result<PdfInput, OtdrError> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    log::debug!("read {} ({} bytes)", path.display(), bytes.len());
    Ok(PdfInput { name, bytes })
}

fn is_pdf(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Convert a prompt failure (e.g. no terminal attached) into an IO error.
pub fn prompt_error(e: dialoguer::Error) -> OtdrError {
    OtdrError::Io(std::io::Error::other(e))
}
