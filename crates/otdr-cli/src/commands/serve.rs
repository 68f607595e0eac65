use otdr_core::config::AppConfig;
use otdr_core::error::OtdrError;

/// Run the HTTP service in the foreground until it is stopped.
pub fn run(
    mut config: AppConfig,
    bind_addr: Option<String>,
    port: Option<u16>,
) -> Result<(), OtdrError> {
    if let Some(addr) = bind_addr {
        config.server.bind_addr = addr;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    actix_web::rt::System::new().block_on(otdr_server::run_server(config))?;
    Ok(())
}
