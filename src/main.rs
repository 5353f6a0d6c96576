use std::path::PathBuf;

use clap::Parser;
use eyre::{Result, WrapErr};
use log::{debug, info};

mod cli;

use cli::Cli;

fn setup_logging(to_stderr: bool) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    if to_stderr {
        builder.init();
        return Ok(());
    }

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytscribe.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytscribe")
        .join("logs")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install Ctrl+C handler: {err}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_stderr)?;

    let mut config = ytscribe::config::Config::load(cli.config.as_deref()).wrap_err("loading config")?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }

    if cli.verbose {
        eprintln!(
            "Bind: {}\nLanguage: {}\nTimeout: {}s\nStrategies: {:?}\nData API: {}",
            config.bind,
            config.language,
            config.timeout_secs,
            config.strategies,
            if config.youtube_api_key.is_some() { "enabled" } else { "disabled" },
        );
    }
    debug!("Effective config: bind={} language={}", config.bind, config.language);

    let state = ytscribe::server::AppState::from_config(&config)?;
    let app = ytscribe::server::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .wrap_err_with(|| format!("binding to {}", config.bind))?;
    info!("Listening on http://{}", config.bind);
    eprintln!("Listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("running HTTP server")?;

    Ok(())
}
