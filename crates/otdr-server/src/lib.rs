//! Actix-Web service for the OTDR results extractor.
//!
//! Accepts OTDR PDF reports as a multipart upload together with a wavelength
//! selection and answers with the filled Excel template, or with a JSON
//! preview of the extracted table.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use otdr_core::config::AppConfig;
use otdr_core::error::OtdrError;
use otdr_core::extraction::pdftotext::PdftotextExtractor;
use otdr_core::extraction::{Backend, PdfExtractor};
use otdr_core::template::TemplateSet;

/// Request header carrying the shared password, when one is configured.
pub const PASSWORD_HEADER: &str = "X-OTDR-Password";

/// Shared application state.
pub struct AppState {
    pub config: AppConfig,
    /// Resolved wavelength key to template file map.
    pub templates: TemplateSet,
    pub extractor: Arc<dyn PdfExtractor>,
}

impl AppState {
    /// Build state from configuration, using the configured extraction
    /// backend.
    pub fn new(config: AppConfig) -> Result<AppState, OtdrError> {
        let extractor: Arc<dyn PdfExtractor> = Arc::from(config.extractor.build());
        AppState::with_extractor(config, extractor)
    }

    pub fn with_extractor(
        config: AppConfig,
        extractor: Arc<dyn PdfExtractor>,
    ) -> Result<AppState, OtdrError> {
        let templates = config.template_set()?;
        Ok(AppState {
            config,
            templates,
            extractor,
        })
    }

    /// Log template files that are missing on disk. Requests needing them
    /// will fail with a configuration error.
    fn report_templates(&self) {
        for (key, path) in self.templates.entries() {
            if path.exists() {
                log::info!("template {key}: {}", path.display());
            } else {
                log::warn!("template {key}: {} does not exist", path.display());
            }
        }
    }
}

/// Register the API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/process", web::post().to(handlers::process))
        .route("/extract", web::post().to(handlers::extract));
}

/// CORS policy admitting only `origins`. A literal `*` admits any origin.
pub fn cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| {
            if origin == "*" {
                cors.allow_any_origin()
            } else {
                cors.allowed_origin(origin)
            }
        })
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_any_header()
        .expose_headers(vec!["content-disposition"])
        .max_age(3600)
}

/// Start the HTTP server and run until it shuts down.
///
/// The caller provides the async runtime (e.g. `#[actix_web::main]`) and
/// initialises logging.
///
/// # Errors
///
/// Fails if the template configuration is invalid, or if the server cannot
/// bind or stops with an I/O error.
pub async fn run_server(config: AppConfig) -> std::io::Result<()> {
    if config.extractor == Backend::Pdftotext && !PdftotextExtractor::is_available() {
        log::warn!("pdftotext not found on PATH; every upload will fail until poppler is installed");
    }

    let state = AppState::new(config).map_err(std::io::Error::other)?;
    state.report_templates();
    if state.config.password.is_some() {
        log::info!("password required via {PASSWORD_HEADER} header");
    }

    let bind_addr = state.config.server.bind_addr.clone();
    let port = state.config.server.port;
    let state = web::Data::new(state);

    log::info!(
        "Starting server on {bind_addr}:{port} (extractor: {})",
        state.extractor.backend_name()
    );

    HttpServer::new(move || {
        App::new()
            .wrap(cors(&state.config.server.allowed_origins))
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
