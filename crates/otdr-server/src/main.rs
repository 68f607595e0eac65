//! Standalone binary for the OTDR service.
//!
//! Reads `otdr.toml` (or the file named by `OTDR_CONFIG`) and the
//! `BIND_ADDR` / `PORT` / `OTDR_PASSWORD` environment overrides.

use otdr_core::config::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = AppConfig::load(None).map_err(std::io::Error::other)?;
    otdr_server::run_server(config).await
}
