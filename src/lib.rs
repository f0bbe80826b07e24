//! # rustarxiv
//!
//! arXiv keyword search with relevance filtering, served as a CLI and a web dashboard.
//!
//! ## Modules
//!
//! - [`query`] - Boolean query and date-range clause construction
//! - [`filter`] - Substring relevance filter over title and abstract
//! - [`arxiv`] - arXiv API client and Atom feed parsing
//! - [`search`] - Validation, query planning and result merging
//! - [`cache`] - One-hour memo of search results
//! - [`dashboard`] - axum web dashboard with per-session state
//! - [`config`] - `config.json` loading
//! - [`logging`] - Console and daily log file setup
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use rustarxiv::{arxiv::SortBy, config::Config, search::{SearchParams, Searcher}};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let searcher = Searcher::new(&Config::default())?;
//!     let params = SearchParams {
//!         keywords: "PDDL".to_string(),
//!         start_date: "2024-01-01".parse::<NaiveDate>()?,
//!         end_date: "2024-06-01".parse::<NaiveDate>()?,
//!         sort: SortBy::Submitted,
//!     };
//!     let plan = searcher.plan(&params)?;
//!     let outcome = searcher.execute(&plan, params.sort).await;
//!     println!("Found {} papers", outcome.papers.len());
//!     Ok(())
//! }
//! ```

pub mod arxiv;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod logging;
pub mod paper;
pub mod query;
pub mod search;

pub use error::{Result, SearcherError};
pub use paper::Paper;
