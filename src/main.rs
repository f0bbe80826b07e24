//! rustarxiv - arXiv keyword search
//!
//! Queries arXiv with keyword-derived boolean queries, keeps the papers whose
//! title or abstract mention the keywords, and shows them on the command line
//! or in a web dashboard.
//!
//! ## Usage
//!
//! ### CLI Mode
//! ```bash
//! rustarxiv search --keywords "planning,PDDL" --start-date 2024-01-01 --sort-by submitted
//! ```
//!
//! ### Dashboard Mode
//! ```bash
//! rustarxiv serve --port 8501
//! ```

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rustarxiv::{
    arxiv::SortBy,
    cache::CachedSearcher,
    config::Config,
    dashboard::{self, AppState},
    logging,
    paper::save_csv,
    query::parse_date_stamp,
    search::{SearchParams, Searcher},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

// ============================================================================
// CLI Definition
// ============================================================================

/// arXiv keyword search - CLI and web dashboard
#[derive(Parser)]
#[command(name = "rustarxiv")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Config file (default: $ARXIV_SEARCHER_BASE_DIR/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search arXiv and print a preview of the results
    Search {
        /// Comma-separated keywords for filtering (e.g., "planning,PDDL").
        /// Uses the default planning keywords when omitted.
        #[arg(long, default_value = "")]
        keywords: String,

        /// Start date in YYYY-MM-DD format (or a YYYYMMDDHHMM stamp)
        #[arg(long, default_value = "2024-01-01")]
        start_date: String,

        /// End date in YYYY-MM-DD format (or a YYYYMMDDHHMM stamp); defaults to today
        #[arg(long)]
        end_date: Option<String>,

        /// Sorting method for arXiv results
        #[arg(long, default_value = "relevance", value_parser = ["relevance", "submitted"])]
        sort_by: String,

        /// Number of results to preview
        #[arg(long, default_value = "3")]
        preview: usize,

        /// Write all results to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Run the web dashboard
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8501")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let _guard = logging::init(&config, cli.debug).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Search {
            keywords,
            start_date,
            end_date,
            sort_by,
            preview,
            csv,
        } => run_search(&config, keywords, start_date, end_date, sort_by, preview, csv).await,
        Commands::Serve { port, host } => run_server(&config, host, port).await,
    }
}

// ============================================================================
// Search
// ============================================================================

/// Accept `YYYY-MM-DD` or a 12-digit `YYYYMMDDHHMM` stamp.
fn parse_date_arg(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if value.chars().all(|c| c.is_ascii_digit()) {
        return Ok(parse_date_stamp(value)?.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").with_context(|| format!("Invalid date '{}'", value))
}

async fn run_search(
    config: &Config,
    keywords: String,
    start_date: String,
    end_date: Option<String>,
    sort_by: String,
    preview: usize,
    csv: Option<PathBuf>,
) -> Result<()> {
    let end_date = match end_date {
        Some(ref value) => parse_date_arg(value)?,
        None => Local::now().date_naive(),
    };

    let params = SearchParams {
        keywords,
        start_date: parse_date_arg(&start_date)?,
        end_date,
        sort: sort_by.parse()?,
    };

    let searcher = Searcher::new(config)?;
    let plan = searcher.plan(&params)?;

    println!("Date Range: {} - {}", plan.range.start_stamp(), plan.range.end_stamp());
    println!("Keywords for filtering: {:?}", plan.keywords);
    for query in &plan.queries {
        println!("Query being used: {}", query);
    }

    let outcome = searcher.execute(&plan, params.sort).await;
    if !outcome.is_complete() {
        eprintln!("Warning: {} of {} queries failed", outcome.failed_queries, plan.queries.len());
    }
    let papers = outcome.papers;

    println!("Total papers found: {}", papers.len());
    println!();

    for (i, paper) in papers.iter().take(preview).enumerate() {
        println!("[{}] {} - {}", i + 1, paper.arxiv_id, paper.title);
        println!("Authors: {}", paper.authors_display());
        println!("{}", paper.abstract_text);
        println!();
    }

    if let Some(path) = csv {
        save_csv(&path, &papers).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Saved: {}", path.display());
    }

    Ok(())
}

// ============================================================================
// Dashboard
// ============================================================================

async fn run_server(config: &Config, host: String, port: u16) -> Result<()> {
    info!(host = %host, port = port, "Starting dashboard");

    let state = AppState::new(CachedSearcher::new(config)?);
    let app = dashboard::router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Dashboard running at http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_arg() {
        assert_eq!(parse_date_arg("2024-01-01").unwrap(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(parse_date_arg("202406012359").unwrap(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(parse_date_arg("20240601").is_err());
        assert!(parse_date_arg("01/06/2024").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["rustarxiv", "search"]).unwrap();
        match cli.command {
            Commands::Search {
                keywords,
                start_date,
                end_date,
                sort_by,
                preview,
                csv,
            } => {
                assert_eq!(keywords, "");
                assert_eq!(start_date, "2024-01-01");
                assert!(end_date.is_none());
                assert_eq!(sort_by, "relevance");
                assert_eq!(preview, 3);
                assert!(csv.is_none());
            }
            Commands::Serve { .. } => panic!("expected search"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_sort() {
        assert!(Cli::try_parse_from(["rustarxiv", "search", "--sort-by", "newest"]).is_err());
    }
}
