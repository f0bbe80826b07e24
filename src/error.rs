//! Custom error types for rustarxiv.
//!
//! This module defines all error types used throughout the library.
//! All functions return `Result<T, SearcherError>` instead of using `unwrap()`.

use thiserror::Error;

/// Main error type for rustarxiv operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum SearcherError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Atom feed parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// arXiv API returned a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message from API
        message: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Input validation error (date range, date stamps)
    #[error("{0}")]
    Validation(String),
}

/// Result type alias using `SearcherError`
pub type Result<T> = std::result::Result<T, SearcherError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| SearcherError::Parse(msg.to_string()))
    }
}
