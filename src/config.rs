//! Runtime configuration.
//!
//! Settings are read from `config.json` in the base directory. The base
//! directory is taken from `ARXIV_SEARCHER_BASE_DIR` when set, otherwise the
//! current working directory. Every field is optional.

use crate::error::{Result, SearcherError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable overriding the base directory.
pub const BASE_DIR_ENV: &str = "ARXIV_SEARCHER_BASE_DIR";

/// Config file name looked up inside the base directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default values.
pub mod defaults {
    use std::time::Duration;

    /// arXiv export API endpoint.
    pub const API_URL: &str = "https://export.arxiv.org/api/query";

    /// Subject category searched when none is configured.
    pub const CATEGORY: &str = "cs.AI";

    /// Results requested per query.
    pub const MAX_RESULTS: usize = 200;

    /// HTTP request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    /// Memo cache TTL (1 hour).
    pub const CACHE_TTL: Duration = Duration::from_secs(3600);

    /// Memo cache capacity.
    pub const CACHE_MAX_ENTRIES: u64 = 1000;

    /// Log directory, relative to the base directory.
    pub const LOG_DIR: &str = "logs";
}

/// On-disk shape of `config.json`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    log_dir: Option<String>,
    api_url: Option<String>,
    categories: Option<Vec<String>>,
    max_results: Option<usize>,
    request_timeout_secs: Option<u64>,
    must_include_keywords: Option<Vec<String>>,
    cache_ttl_secs: Option<u64>,
    cache_max_entries: Option<u64>,
}

/// Resolved configuration, built once at startup and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory all relative paths resolve against.
    pub base_dir: PathBuf,

    /// Directory receiving the daily log files.
    pub log_dir: PathBuf,

    /// arXiv API endpoint (overridable for mock servers).
    pub api_url: String,

    /// Categories searched, one query each.
    pub categories: Vec<String>,

    /// Maximum results requested per query.
    pub max_results: usize,

    /// HTTP request timeout.
    pub request_timeout: Duration,

    /// Keywords of which at least one must appear, on top of the search keywords.
    pub must_include_keywords: Vec<String>,

    /// Memo cache TTL.
    pub cache_ttl: Duration,

    /// Memo cache capacity.
    pub cache_max_entries: u64,
}

impl Config {
    /// Defaults rooted at `base_dir`.
    #[must_use]
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            log_dir: base_dir.join(defaults::LOG_DIR),
            base_dir,
            api_url: defaults::API_URL.to_string(),
            categories: vec![defaults::CATEGORY.to_string()],
            max_results: defaults::MAX_RESULTS,
            request_timeout: defaults::REQUEST_TIMEOUT,
            must_include_keywords: Vec::new(),
            cache_ttl: defaults::CACHE_TTL,
            cache_max_entries: defaults::CACHE_MAX_ENTRIES,
        }
    }

    /// Configuration pointing at a mock server.
    #[must_use]
    pub fn for_testing(api_url: &str) -> Self {
        let mut config = Self::with_base_dir(std::env::temp_dir());
        config.api_url = api_url.to_string();
        config.request_timeout = Duration::from_secs(5);
        config
    }

    /// Load configuration from the environment.
    ///
    /// `explicit` takes precedence over `{base_dir}/config.json`.
    ///
    /// # Errors
    ///
    /// Returns error if the config file exists but cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let base_dir = match std::env::var_os(BASE_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir()?,
        };
        let path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| base_dir.join(CONFIG_FILE_NAME));
        Self::from_file(base_dir, &path)
    }

    /// Build configuration from `path`, falling back to defaults when it is absent.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn from_file(base_dir: PathBuf, path: &Path) -> Result<Self> {
        let mut config = Self::with_base_dir(base_dir);

        if !path.exists() {
            debug!("Config file not found: {:?}, using defaults", path);
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let file: FileConfig = serde_json::from_str(&content)
            .map_err(|e| SearcherError::Config(format!("{}: {}", path.display(), e)))?;

        if let Some(log_dir) = file.log_dir {
            config.log_dir = config.base_dir.join(log_dir);
        }
        if let Some(api_url) = file.api_url {
            config.api_url = api_url;
        }
        if let Some(categories) = file.categories {
            if categories.is_empty() {
                return Err(SearcherError::Config("categories must not be empty".into()));
            }
            config.categories = categories;
        }
        if let Some(max_results) = file.max_results {
            config.max_results = max_results;
        }
        if let Some(secs) = file.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(keywords) = file.must_include_keywords {
            config.must_include_keywords = keywords;
        }
        if let Some(secs) = file.cache_ttl_secs {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(entries) = file.cache_max_entries {
            config.cache_max_entries = entries;
        }

        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_base_dir(PathBuf::from("."))
    }
}
