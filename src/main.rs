mod cli;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

use cli::{Cli, Commands};
use stock_analyzer::app::bootstrap::build_presenter;
use stock_analyzer::app::{ConsoleView, SearchPresenter};
use stock_analyzer::config::{load_config, validate_config, AppConfig};
use stock_analyzer::fetch::FetchResult;
use stock_analyzer::records::{write_dataset, Ticker};

type Presenter = SearchPresenter<ConsoleView>;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    debug!("Resolved configuration: {:?}", config);

    let presenter = Arc::new(
        build_presenter(&config, ConsoleView).context("Failed to set up the price source")?,
    );

    match cli.command {
        Commands::Search {
            ref tickers,
            ref output,
        } => run_search(presenter, tickers, output.as_deref()).await,
        Commands::Interactive => {
            run_interactive(presenter).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path).context("Failed to load configuration")?,
        None => AppConfig::default(),
    };

    if let Some(source) = cli.source {
        config.source = source;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout = Duration::from_millis(timeout_ms);
    }
    if let Some(dataset) = &cli.dataset {
        config.dataset_path = dataset.clone();
    }
    if let Some(base_url) = &cli.base_url {
        config.remote.request.base_url = base_url.trim().to_string();
    }
    if let Some(limit) = cli.concurrency {
        config.concurrency_limit = Some(limit);
    }

    validate_config(&config)?;
    Ok(config)
}

async fn run_search(
    presenter: Arc<Presenter>,
    tickers: &[String],
    output: Option<&Path>,
) -> Result<ExitCode> {
    let symbols = Ticker::parse_list(tickers)?;

    let interrupt = {
        let presenter = Arc::clone(&presenter);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() && presenter.cancel_active() {
                info!("Search interrupted");
            }
        })
    };

    let result = presenter.search(symbols).await;
    interrupt.abort();

    match (result, output) {
        (FetchResult::Rows(rows), Some(path)) => {
            write_dataset(path, &rows)
                .with_context(|| format!("Failed to export rows to {}", path.display()))?;
            println!("Saved {} rows to {}", rows.len(), path.display());
            Ok(ExitCode::SUCCESS)
        }
        (FetchResult::Rows(_), None) => Ok(ExitCode::SUCCESS),
        _ => Ok(ExitCode::FAILURE),
    }
}

async fn run_interactive(presenter: Arc<Presenter>) -> Result<()> {
    cli::show_banner();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut searches: Vec<JoinHandle<FetchResult>> = Vec::new();

    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read user input")?
    {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" => {
                println!("Exiting...");
                break;
            }
            "cancel" => {
                if !presenter.cancel_active() {
                    println!("No search is running.");
                }
                continue;
            }
            _ => {}
        }

        let symbols = match Ticker::parse_list(input.split_whitespace()) {
            Ok(symbols) => symbols,
            Err(err) => {
                eprintln!("{}", err);
                continue;
            }
        };

        searches.retain(|handle| !handle.is_finished());
        let presenter = Arc::clone(&presenter);
        searches.push(tokio::spawn(async move { presenter.search(symbols).await }));
    }

    presenter.cancel_active();
    for search in futures::future::join_all(searches).await {
        if let Err(err) = search {
            debug!("Search task ended abnormally: {}", err);
        }
    }

    Ok(())
}
