use clap::Parser;
use img2b64::{Application, Config, config::Args, telemetry};
use tracing::info;

/// Resolves once the process is asked to stop (Ctrl+C, or SIGTERM on unix).
async fn stop_requested() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Interrupted, stopping img2b64"),
                    _ = sigterm.recv() => info!("Terminated, stopping img2b64"),
                }
                return;
            }
            Err(e) => tracing::warn!("SIGTERM handler unavailable ({e}), only Ctrl+C will stop the server"),
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Interrupted, stopping img2b64"),
        Err(e) => {
            tracing::error!("Ctrl+C handler unavailable: {e}");
            std::future::pending::<()>().await;
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration at {} is valid.", args.config);
        return Ok(());
    }

    telemetry::init_telemetry(config.enable_otel_export)?;
    info!(
        config_file = %args.config,
        formats = ?config.formats.supported,
        verify_signature = config.verify_signature,
        "Starting img2b64"
    );

    Application::new(config)?.serve(stop_requested()).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // OTLP export goes through a rustls-backed HTTP client
    if rustls::crypto::aws_lc_rs::default_provider().install_default().is_err() {
        anyhow::bail!("a rustls crypto provider was already installed");
    }

    run(Args::parse()).await
}
