mod clock;
mod config;
mod errors;
mod extractors;
mod logging;
mod middlewares;
mod models;
mod routes;
mod server;
mod services;
mod state;
#[cfg(test)]
mod testing;
mod utils;

use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load()?;
    let (mut logs, _log_task) = logging::LogWriter::new()?;
    logging::registry_logs(
        &mut logs,
        config.logs.level,
        config.logs.parse_dir()?,
        config.logs.enable_file_logging,
    )?;
    let logs = Arc::new(logs);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{addr}");
    server::run_until_done(server::ServerArgs {
        logs,
        config: &config,
    }, listener)
    .await
}
