//! HTTP handler functions for the OTDR service.

use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use futures::TryStreamExt;
use otdr_core::batch::{BatchRequest, PdfInput, OUTPUT_FILE_NAME, XLSX_MIME};
use otdr_core::error::OtdrError;
use otdr_core::model::WavelengthSet;
use serde::Serialize;

use crate::{AppState, PASSWORD_HEADER};

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(Health {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /process`
///
/// Multipart form with a `wavelengths` field and one or more `pdfs` files.
/// Answers with the filled workbook as an attachment.
pub async fn process(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: Multipart,
) -> HttpResponse {
    let request = match read_request(&state, &req, payload).await {
        Ok(request) => request,
        Err(resp) => return resp,
    };
    log::info!(
        "processing {} report(s) for {}",
        request.reports.len(),
        request.wavelengths
    );

    let worker = state.clone();
    let result = web::block(move || {
        otdr_core::process_pdfs(&request, &worker.templates, worker.extractor.as_ref())
    })
    .await;

    match result {
        Ok(Ok(output)) => {
            let disposition = ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(OUTPUT_FILE_NAME.to_string())],
            };
            HttpResponse::Ok()
                .content_type(XLSX_MIME)
                .insert_header(disposition)
                .insert_header(("X-Skipped-Pages", output.skipped_pages.len().to_string()))
                .body(output.workbook)
        }
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            log::error!("batch worker failed: {e}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process reports")
        }
    }
}

/// `POST /extract`
///
/// Same form as `/process`, but answers with the extracted table and the
/// skipped pages as JSON. No template is needed.
pub async fn extract(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: Multipart,
) -> HttpResponse {
    let request = match read_request(&state, &req, payload).await {
        Ok(request) => request,
        Err(resp) => return resp,
    };

    let worker = state.clone();
    let result =
        web::block(move || otdr_core::preview_pdfs(&request, worker.extractor.as_ref())).await;

    match result {
        Ok(Ok(build)) => HttpResponse::Ok().json(build),
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            log::error!("extract worker failed: {e}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Failed to extract reports")
        }
    }
}

/// Check the password header, then read the multipart form into a batch
/// request.
async fn read_request(
    state: &AppState,
    req: &HttpRequest,
    payload: Multipart,
) -> Result<BatchRequest, HttpResponse> {
    let supplied = req
        .headers()
        .get(PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok());
    if !state.config.is_authorized(supplied) {
        log::warn!("rejected request from {:?}: bad password", req.peer_addr());
        return Err(error_response(&OtdrError::Unauthorized));
    }

    let limit = state.config.server.max_file_size;
    let form = read_form(payload, limit).await?;
    let wavelengths = form
        .wavelengths
        .ok_or_else(|| {
            OtdrError::InvalidWavelengths("the 'wavelengths' field is required".into())
        })
        .and_then(|s| s.parse::<WavelengthSet>())
        .map_err(|e| error_response(&e))?;

    Ok(BatchRequest {
        reports: form.reports,
        wavelengths,
        authorized: true,
        max_file_size: Some(limit),
    })
}

#[derive(Default)]
struct UploadForm {
    wavelengths: Option<String>,
    reports: Vec<PdfInput>,
}

/// Read every field of the form. A field is abandoned as soon as it grows
/// past `max_file_size` bytes, so oversized uploads are never buffered whole.
async fn read_form(
    mut payload: Multipart,
    max_file_size: u64,
) -> Result<UploadForm, HttpResponse> {
    let mut form = UploadForm::default();

    while let Some(mut field) = payload.try_next().await.map_err(bad_upload)? {
        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_string),
                cd.get_filename().map(str::to_string),
            ),
            None => (None, None),
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(bad_upload)? {
            if (bytes.len() + chunk.len()) as u64 > max_file_size {
                let names = filename
                    .or(name)
                    .unwrap_or_else(|| format!("upload-{}.pdf", form.reports.len() + 1));
                return Err(error_response(&OtdrError::FileTooLarge {
                    names,
                    limit: max_file_size,
                }));
            }
            bytes.extend_from_slice(&chunk);
        }

        match name.as_deref() {
            Some("wavelengths") => {
                form.wavelengths = Some(String::from_utf8_lossy(&bytes).trim().to_string());
            }
            Some("pdfs") => {
                let name =
                    filename.unwrap_or_else(|| format!("upload-{}.pdf", form.reports.len() + 1));
                form.reports.push(PdfInput { name, bytes });
            }
            other => log::debug!("ignoring form field {other:?}"),
        }
    }

    Ok(form)
}

fn bad_upload(e: actix_multipart::MultipartError) -> HttpResponse {
    log::warn!("malformed upload: {e}");
    message(StatusCode::BAD_REQUEST, &format!("Malformed upload: {e}"))
}

pub(crate) fn status_for(e: &OtdrError) -> StatusCode {
    match e {
        OtdrError::Unauthorized => StatusCode::UNAUTHORIZED,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(e: &OtdrError) -> HttpResponse {
    let status = status_for(e);
    if status.is_server_error() {
        log::error!("request failed: {e}");
    } else {
        log::info!("request rejected: {e}");
    }
    message(status, &e.to_string())
}

fn message(status: StatusCode, error: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({ "error": error }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&OtdrError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(&OtdrError::EmptyBatch), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&OtdrError::InvalidWavelengths("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&OtdrError::FileTooLarge {
                names: "a.pdf".into(),
                limit: 30 * 1024 * 1024
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&OtdrError::TemplateNotFound {
                path: PathBuf::from("t.xlsx")
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&OtdrError::ReportFailed {
                name: "a.pdf".into(),
                source: Box::new(OtdrError::PdftotextNotFound),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
