use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::info;

mod api;
mod cli;
mod config;
mod db;
mod error;
mod models;
mod scraper;

use api::AppState;
use cli::{Cli, Command, FetchArgs};
use config::Config;
use db::Repository;
use error::{AppError, Result};
use scraper::{NewsApiOrg, Provider, Scraper};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Fetch(args) => fetch(&config, args).await,
        Command::Serve { bind } => serve(&config, bind).await,
    }
}

async fn fetch(config: &Config, args: FetchArgs) -> Result<()> {
    let api_key = args
        .apikey
        .or_else(|| config.newsapi_key.clone())
        .ok_or_else(|| {
            AppError::Config("--apikey is required when newsapi_key is not configured".to_string())
        })?;

    let repository = Repository::new(&config.db_path).await?;
    let scraper = Scraper::new(
        NewsApiOrg::new(api_key),
        repository,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    println!(
        "Starting task for downloading {} news from {}",
        args.count,
        scraper.provider().name()
    );

    let params = vec![("q".to_string(), args.q)];
    let downloaded = scraper.start(args.count, &params, &args.theme).await?;

    info!(
        articles = scraper.store().count_articles().await?,
        sources = scraper.store().count_sources().await?,
        "Stored totals"
    );
    println!("Task completed, downloaded {} news", downloaded);
    Ok(())
}

async fn serve(config: &Config, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.bind_addr.clone());
    let repository = Repository::new(&config.db_path).await?;

    let app = api::create_app(AppState {
        repository,
        page_size: config.api_page_size as u64,
    });

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", bind, e))?;
    info!(%bind, "Serving news API");
    axum::serve(listener, app).await?;
    Ok(())
}
