use std::sync::Arc;

use doodle::prelude::*;

#[tokio::main]
async fn main() -> Result<(), DoodleError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let corpus = ClueCorpus::load(&config.clue_dir, &config.locale)?;
    let telemetry = ServerTelemetry::from_url(config.export_url.as_deref())?;
    if !telemetry.is_enabled() {
        tracing::info!("EXPORT_RESULTS_URL unset, telemetry disabled");
    }

    let server = DoodleServer::builder()
        .config(config)
        .telemetry(telemetry)
        .build(Arc::new(corpus))
        .await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
}
