//! arXiv query construction.
//!
//! Builds category-scoped boolean queries in the arXiv API search syntax and
//! the `submittedDate` range clause. Everything here is a pure string
//! transform; date validation lives in [`DateRange::new`].

use crate::error::{Result, SearcherError};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::fmt;

/// Keywords used when the caller leaves the keyword field empty.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "automated planning",
    "symbolic planning",
    "neurosymbolic planning",
    "task planning",
    "AI planning",
    "PDDL",
    "constraint-based planning",
    "hierarchical task planning",
    "multi-agent planning",
    "robot planning",
];

/// Date stamp format used by the `submittedDate` clause.
const STAMP_FORMAT: &str = "%Y%m%d%H%M";

/// Boolean operator joining keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOp::And => f.write_str("AND"),
            BoolOp::Or => f.write_str("OR"),
        }
    }
}

/// Quote multi-word phrases; single terms stay bare.
pub fn format_keyword(keyword: &str) -> String {
    if keyword.contains(' ') {
        format!("\"{}\"", keyword)
    } else {
        keyword.to_string()
    }
}

/// Build `cat:{category} AND (k1 OP k2 ...)`.
pub fn build_arxiv_query<S: AsRef<str>>(keywords: &[S], operator: BoolOp, category: &str) -> String {
    let separator = format!(" {} ", operator);
    let condition = keywords
        .iter()
        .map(|kw| format_keyword(kw.as_ref()))
        .collect::<Vec<_>>()
        .join(&separator);
    format!("cat:{} AND ({})", category, condition)
}

/// Category query with the date clause appended.
pub fn full_query<S: AsRef<str>>(
    keywords: &[S],
    operator: BoolOp,
    category: &str,
    range: &DateRange,
) -> String {
    format!("{} AND {}", build_arxiv_query(keywords, operator, category), range.clause())
}

/// Split a comma-separated keyword string, trimming and dropping empties.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|kw| !kw.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keywords and operator for a raw user input.
///
/// Empty input falls back to [`DEFAULT_KEYWORDS`] joined with OR; user
/// keywords are joined with AND.
pub fn resolve_keywords(raw: &str) -> (Vec<String>, BoolOp) {
    let parsed = parse_keywords(raw);
    if parsed.is_empty() {
        let defaults = DEFAULT_KEYWORDS.iter().map(|kw| kw.to_string()).collect();
        (defaults, BoolOp::Or)
    } else {
        (parsed, BoolOp::And)
    }
}

/// Parse a 12-digit `YYYYMMDDHHMM` stamp.
///
/// # Errors
///
/// Returns a validation error for anything that is not exactly 12 digits or
/// not a real calendar instant.
pub fn parse_date_stamp(stamp: &str) -> Result<NaiveDateTime> {
    let stamp_regex = Regex::new(r"^\d{12}$").map_err(|e| SearcherError::Parse(e.to_string()))?;
    if !stamp_regex.is_match(stamp) {
        return Err(SearcherError::Validation(format!(
            "Invalid date stamp '{}': expected 12 digits (YYYYMMDDHHMM)",
            stamp
        )));
    }
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
        .map_err(|e| SearcherError::Validation(format!("Invalid date stamp '{}': {}", stamp, e)))
}

/// Inclusive submission-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Validate and build a range.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `end` is before `start` or if either
    /// boundary stamp fails the 12-digit check.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(SearcherError::Validation(
                "End Date must be greater than or equal to Start Date".to_string(),
            ));
        }
        let range = Self { start, end };
        parse_date_stamp(&range.start_stamp())?;
        parse_date_stamp(&range.end_stamp())?;
        Ok(range)
    }

    /// Start of the first day, `YYYYMMDD0000`.
    pub fn start_stamp(&self) -> String {
        format!("{}0000", self.start.format("%Y%m%d"))
    }

    /// End of the last day, `YYYYMMDD2359`.
    pub fn end_stamp(&self) -> String {
        format!("{}2359", self.end.format("%Y%m%d"))
    }

    /// `submittedDate:[start TO end]`
    pub fn clause(&self) -> String {
        format!("submittedDate:[{} TO {}]", self.start_stamp(), self.end_stamp())
    }
}
