//! Guided mode: prompts for password, wavelengths and reports, then writes
//! the filled workbook.

use dialoguer::{Confirm, Input, Password, Select};
use indicatif::MultiProgress;
use otdr_core::batch::{self, BatchRequest, OUTPUT_FILE_NAME};
use otdr_core::config::AppConfig;
use otdr_core::error::OtdrError;
use otdr_core::model::WavelengthSet;
use std::path::PathBuf;

use super::prompt_error;
use crate::output;
use crate::progress::IndicatifProgress;

pub fn run(config: &AppConfig, multi: &MultiProgress) -> Result<(), OtdrError> {
    println!("OTDR Results Extractor");
    println!();

    let authorized = match config.password {
        Some(_) => {
            let supplied = Password::new()
                .with_prompt("Password")
                .interact()
                .map_err(prompt_error)?;
            config.is_authorized(Some(&supplied))
        }
        None => true,
    };
    if !authorized {
        return Err(OtdrError::Unauthorized);
    }

    let presets = WavelengthSet::presets();
    let labels: Vec<String> = presets.iter().map(WavelengthSet::label).collect();
    let idx = Select::new()
        .with_prompt("Select wavelengths")
        .items(&labels)
        .default(0)
        .interact()
        .map_err(prompt_error)?;
    let wavelengths = presets[idx].clone();

    let paths = prompt_paths()?;
    let reports = super::read_reports(&paths)?;
    if reports.is_empty() {
        println!("No PDF files selected.");
        return Ok(());
    }

    if !Confirm::new()
        .with_prompt(format!(
            "Process {} report(s) for {}?",
            reports.len(),
            wavelengths.label()
        ))
        .default(true)
        .interact()
        .map_err(prompt_error)?
    {
        println!("Cancelled.");
        return Ok(());
    }

    let request = BatchRequest {
        reports,
        wavelengths,
        authorized,
        max_file_size: Some(config.interactive.max_file_size),
    };
    let templates = config.template_set()?;
    let extractor = config.extractor.build();
    let progress = IndicatifProgress::reports_bar(multi, "Processing PDFs...");
    let result = batch::run_batch(&request, &templates, extractor.as_ref(), &progress)?;
    drop(progress);

    println!();
    println!("Extracted Data Preview:");
    println!(
        "{}",
        output::table::format_table(&result.table, output::table::PREVIEW_ROWS)
    );
    output::table::print_skipped(&result.skipped_pages);

    let out: String = Input::new()
        .with_prompt("Save workbook as")
        .default(OUTPUT_FILE_NAME.to_string())
        .interact_text()
        .map_err(prompt_error)?;
    std::fs::write(&out, &result.workbook)?;
    println!("Excel file updated successfully: {out}");

    Ok(())
}

/// Ask for report files or folders until an empty answer.
fn prompt_paths() -> Result<Vec<PathBuf>, OtdrError> {
    let mut paths = Vec::new();
    loop {
        let prompt = if paths.is_empty() {
            "PDF file or folder"
        } else {
            "Another PDF file or folder (enter to continue)"
        };
        let answer: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?;
        let answer = answer.trim();
        if answer.is_empty() {
            break;
        }

        let path = PathBuf::from(answer);
        if path.exists() {
            paths.push(path);
        } else {
            println!("  {} does not exist", path.display());
        }
    }
    Ok(paths)
}
