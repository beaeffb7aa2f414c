use std::path::PathBuf;

use clap::{Parser, Subcommand};

use stock_analyzer::config::SourceKind;

#[derive(Parser)]
#[command(name = "stock-analyzer")]
#[command(about = "Look up daily stock price rows for one or more tickers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Where price rows come from
    #[arg(short, long, global = true, value_enum)]
    pub source: Option<SourceKind>,

    /// Overall time budget for one search, in milliseconds
    #[arg(short, long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Dataset file read by the local source
    #[arg(short, long, global = true)]
    pub dataset: Option<PathBuf>,

    /// Base URL of the remote price service
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Maximum number of tickers fetched at once
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch rows for the given tickers. Ctrl-C cancels the search.
    Search {
        /// Ticker symbols (e.g., MSFT AAPL)
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Write the rows to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read searches from stdin, one line of tickers at a time
    Interactive,
}

pub fn show_banner() {
    println!("# ------------------------------------------------------------------------ #");
    println!("# Stock Analyzer");
    println!("# Executing date: {}", chrono::Local::now().format("%Y-%m-%d %H:%M"));
    println!("#");
    println!("# --------------------------- COMMAND LIST ------------------------------- #");
    println!("#");
    println!("#   <ticker> [ticker ...]:  Search, replacing any search still running");
    println!("#   cancel:                 Cancel the running search");
    println!("#   exit:                   Exit the program");
    println!("#");
    println!("# ------------------------------------------------------------------------ #");
    println!();
}
