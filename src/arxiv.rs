//! arXiv API Client
//!
//! Issues search requests against the arXiv export API and parses the Atom
//! feed it returns.
//!
//! API Details:
//! - Endpoint: GET /api/query?search_query=...&start=0&max_results=N&sortBy=...&sortOrder=descending
//! - Response: Atom 1.0 XML, one `<entry>` per paper
//! - Malformed queries come back as HTTP 200 with a single error entry

use crate::config::Config;
use crate::error::{OptionExt, Result, SearcherError};
use crate::paper::Paper;
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};
use url::Url;

/// User agent string for requests
const USER_AGENT: &str = "rustarxiv/0.1 (arXiv keyword search)";

/// Marker in the id of the error entry arXiv returns for bad queries
const API_ERROR_MARKER: &str = "/api/errors";

/// Result ordering requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Relevance,
    Submitted,
}

impl SortBy {
    /// Value of the `sortBy` query parameter.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::Submitted => "submittedDate",
        }
    }

    /// Human label used by the dashboard select.
    pub fn label(&self) -> &'static str {
        match self {
            SortBy::Relevance => "Relevance",
            SortBy::Submitted => "Submitted Date",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortBy::Relevance => f.write_str("relevance"),
            SortBy::Submitted => f.write_str("submitted"),
        }
    }
}

impl FromStr for SortBy {
    type Err = SearcherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "relevance" => Ok(SortBy::Relevance),
            "submitted" | "submitted date" | "submitteddate" => Ok(SortBy::Submitted),
            other => Err(SearcherError::Validation(format!(
                "Invalid sort option '{}': expected 'relevance' or 'submitted'",
                other
            ))),
        }
    }
}

/// HTTP client for the arXiv API.
#[derive(Debug, Clone)]
pub struct ArxivClient {
    client: Client,
    api_url: String,
}

impl ArxivClient {
    /// Create a client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    /// Build the request URL for a query.
    pub fn search_url(&self, query: &str, max_results: usize, sort: SortBy) -> Result<Url> {
        let max_results = max_results.to_string();
        Url::parse_with_params(
            &self.api_url,
            &[
                ("search_query", query),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", sort.as_api_str()),
                ("sortOrder", "descending"),
            ],
        )
        .map_err(|e| SearcherError::Config(format!("Invalid API URL '{}': {}", self.api_url, e)))
    }

    /// Run one query and return every entry in the response.
    ///
    /// # Errors
    ///
    /// Network failures, non-success statuses, error feeds and unparseable
    /// responses are returned as errors.
    pub async fn search(&self, query: &str, max_results: usize, sort: SortBy) -> Result<Vec<Paper>> {
        let url = self.search_url(query, max_results, sort)?;
        debug!(url = %url, "Sending arXiv request");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), error = %error_text, "API error");
            return Err(SearcherError::Api {
                code: status.as_u16(),
                message: format!("arXiv API error: {}", status),
            });
        }

        let body = response.text().await?;
        let papers = parse_feed(&body)?;
        info!(query = query, count = papers.len(), "arXiv query complete");
        Ok(papers)
    }
}

/// Regexes for one pass over a feed.
struct FeedPatterns {
    entry: Regex,
    id: Regex,
    title: Regex,
    summary: Regex,
    published: Regex,
    updated: Regex,
    author: Regex,
    pdf: Regex,
    href: Regex,
}

impl FeedPatterns {
    fn new() -> Result<Self> {
        Ok(Self {
            entry: compile(r"(?s)<entry>(.*?)</entry>")?,
            id: tag_regex("id")?,
            title: tag_regex("title")?,
            summary: tag_regex("summary")?,
            published: tag_regex("published")?,
            updated: tag_regex("updated")?,
            author: compile(r"(?s)<author>.*?<name>(.*?)</name>.*?</author>")?,
            pdf: compile(r#"<link[^>]*title="pdf"[^>]*>"#)?,
            href: compile(r#"href="([^"]*)""#)?,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| SearcherError::Parse(e.to_string()))
}

/// Matches the first `<tag>` element, with or without attributes.
fn tag_regex(tag: &str) -> Result<Regex> {
    let tag = regex::escape(tag);
    compile(&format!(r"(?s)<{}(?:\s[^>]*)?>(.*?)</{}>", tag, tag))
}

/// Parse an arXiv Atom feed into papers.
///
/// Malformed entries are logged and skipped; an arXiv error entry fails the
/// whole feed.
pub fn parse_feed(xml: &str) -> Result<Vec<Paper>> {
    if !xml.contains("<feed") {
        return Err(SearcherError::Parse("Response is not an Atom feed".to_string()));
    }

    let patterns = FeedPatterns::new()?;
    let mut papers = Vec::new();

    for caps in patterns.entry.captures_iter(xml) {
        if let Some(paper) = parse_entry(&caps[1], &patterns)? {
            papers.push(paper);
        }
    }

    Ok(papers)
}

/// Parse the body of one `<entry>`.
///
/// Returns `Ok(None)` for an entry that lacks an id, a title or a valid
/// published timestamp, and `Err(Api)` for the error entry arXiv sends back
/// for a rejected query.
fn parse_entry(entry: &str, patterns: &FeedPatterns) -> Result<Option<Paper>> {
    let link = match tag_text(&patterns.id, entry) {
        Some(id) => id,
        None => {
            warn!("Skipping entry without id");
            return Ok(None);
        }
    };

    if link.contains(API_ERROR_MARKER) {
        let message = tag_text(&patterns.summary, entry).unwrap_or_else(|| "unknown error".to_string());
        return Err(SearcherError::Api { code: 400, message });
    }

    let title = match tag_text(&patterns.title, entry) {
        Some(title) if !title.is_empty() => title,
        _ => {
            warn!(link = %link, "Skipping entry without title");
            return Ok(None);
        }
    };

    let arxiv_id = match short_id(&link) {
        Some(id) => id,
        None => {
            warn!(link = %link, "Skipping entry whose id is not an abstract URL");
            return Ok(None);
        }
    };

    let published = match parse_timestamp(tag_text(&patterns.published, entry).as_deref()) {
        Ok(ts) => ts,
        Err(e) => {
            warn!(link = %link, error = %e, "Skipping entry with unusable published date");
            return Ok(None);
        }
    };
    // A bad <updated> falls back to the publication time.
    let updated = tag_text(&patterns.updated, entry)
        .and_then(|ts| parse_timestamp(Some(&ts)).ok())
        .unwrap_or(published);

    let abstract_text = tag_text(&patterns.summary, entry).unwrap_or_default();

    let authors = patterns
        .author
        .captures_iter(entry)
        .map(|c| clean_text(&c[1]))
        .filter(|name| !name.is_empty())
        .collect();

    let pdf_link = patterns
        .pdf
        .find(entry)
        .and_then(|m| patterns.href.captures(m.as_str()))
        .map(|c| decode_entities(&c[1]))
        .unwrap_or_else(|| link.replacen("/abs/", "/pdf/", 1));

    Ok(Some(Paper {
        arxiv_id,
        title,
        authors,
        abstract_text,
        published,
        updated,
        link,
        pdf_link,
    }))
}

/// Text content of a tag match, entity-decoded and whitespace-collapsed.
fn tag_text(re: &Regex, xml: &str) -> Option<String> {
    re.captures(xml).map(|c| clean_text(&c[1]))
}

/// `http://arxiv.org/abs/2401.01234v1` -> `2401.01234v1`
fn short_id(link: &str) -> Option<String> {
    link.split_once("/abs/")
        .map(|(_, id)| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

fn parse_timestamp(value: Option<&str>) -> Result<DateTime<Utc>> {
    let value = value.ok_or_parse("Entry has no published timestamp")?;
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SearcherError::Parse(format!("Invalid timestamp '{}': {}", value, e)))
}

fn clean_text(raw: &str) -> String {
    decode_entities(&raw.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Decode the predefined XML entities.
fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
pub(crate) fn feed_entry(id: &str, title: &str, summary: &str) -> String {
    format!(
        r#"<entry>
    <id>http://arxiv.org/abs/{id}</id>
    <updated>2024-03-06T10:00:00Z</updated>
    <published>2024-03-05T12:00:00Z</published>
    <title>{title}</title>
    <summary>{summary}</summary>
    <author>
      <name>Ada Lovelace</name>
    </author>
    <author>
      <name>Alan Turing</name>
      <arxiv:affiliation xmlns:arxiv="http://arxiv.org/schemas/atom">Bletchley</arxiv:affiliation>
    </author>
    <link href="http://arxiv.org/abs/{id}" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/{id}" rel="related" type="application/pdf"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.AI" scheme="http://arxiv.org/schemas/atom"/>
  </entry>"#
    )
}

#[cfg(test)]
pub(crate) fn feed(entries: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <link href="http://arxiv.org/api/query" rel="self" type="application/atom+xml"/>
  <title type="html">ArXiv Query: search_query=cat:cs.AI</title>
  <id>http://arxiv.org/api/query-id</id>
  <updated>2024-03-07T00:00:00-05:00</updated>
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">{}</opensearch:totalResults>
  {}
</feed>"#,
        entries.len(),
        entries.join("\n  ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_feed_fields() {
        let xml = feed(&[feed_entry(
            "2403.00001v1",
            "Neurosymbolic\n      Planning &amp; Acting",
            "  We combine PDDL\n  with LLMs.  ",
        )]);

        let papers = parse_feed(&xml).unwrap();
        assert_eq!(papers.len(), 1);

        let paper = &papers[0];
        assert_eq!(paper.arxiv_id, "2403.00001v1");
        assert_eq!(paper.title, "Neurosymbolic Planning & Acting");
        assert_eq!(paper.abstract_text, "We combine PDDL with LLMs.");
        assert_eq!(paper.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(paper.link, "http://arxiv.org/abs/2403.00001v1");
        assert_eq!(paper.pdf_link, "http://arxiv.org/pdf/2403.00001v1");
        assert_eq!(paper.published_display(), "05/03/2024");
        assert!(paper.updated > paper.published);
    }

    #[test]
    fn test_feed_title_not_taken_as_entry() {
        let papers = parse_feed(&feed(&[])).unwrap();
        assert!(papers.is_empty());
    }

    #[test]
    fn test_entry_without_id_is_skipped() {
        let broken = "<entry><title>No id</title><published>2024-03-05T12:00:00Z</published></entry>".to_string();
        let xml = feed(&[broken, feed_entry("2403.00002v1", "Kept", "abstract")]);
        let papers = parse_feed(&xml).unwrap();
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].arxiv_id, "2403.00002v1");
    }

    #[test]
    fn test_bad_entry_does_not_drop_feed() {
        let bad_date = feed_entry("2403.00002v1", "Broken date", "abstract")
            .replace("2024-03-05T12:00:00Z", "not-a-date");
        let bad_id = feed_entry("2403.00003v1", "Broken id", "abstract")
            .replace("<id>http://arxiv.org/abs/", "<id>http://example.org/");
        let xml = feed(&[
            feed_entry("2403.00001v1", "First", "abstract"),
            bad_date,
            bad_id,
            feed_entry("2403.00004v1", "Last", "abstract"),
        ]);

        let papers = parse_feed(&xml).unwrap();
        let ids: Vec<&str> = papers.iter().map(|p| p.arxiv_id.as_str()).collect();
        assert_eq!(ids, vec!["2403.00001v1", "2403.00004v1"]);
    }

    #[test]
    fn test_bad_updated_falls_back_to_published() {
        let entry = feed_entry("2403.00001v1", "Title", "abstract").replace("2024-03-06T10:00:00Z", "yesterday");
        let papers = parse_feed(&feed(&[entry])).unwrap();
        assert_eq!(papers[0].updated, papers[0].published);
    }

    #[test]
    fn test_old_style_id_and_pdf_fallback() {
        let entry = r#"<entry>
    <id>http://arxiv.org/abs/hep-th/9901001v1</id>
    <published>1999-01-01T00:00:00Z</published>
    <title>Strings</title>
    <summary>Old paper</summary>
  </entry>"#
            .to_string();
        let papers = parse_feed(&feed(&[entry])).unwrap();
        assert_eq!(papers[0].arxiv_id, "hep-th/9901001v1");
        assert_eq!(papers[0].pdf_link, "http://arxiv.org/pdf/hep-th/9901001v1");
        assert_eq!(papers[0].updated, papers[0].published);
        assert!(papers[0].authors.is_empty());
    }

    #[test]
    fn test_error_feed_is_api_error() {
        let entry = r#"<entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
    <title>Error</title>
    <summary>incorrect id format for 1234</summary>
  </entry>"#
            .to_string();
        match parse_feed(&feed(&[entry])) {
            Err(SearcherError::Api { code, message }) => {
                assert_eq!(code, 400);
                assert_eq!(message, "incorrect id format for 1234");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_not_a_feed() {
        assert!(matches!(parse_feed("<html></html>"), Err(SearcherError::Parse(_))));
    }

    #[test]
    fn test_sort_by_parsing() {
        assert_eq!("relevance".parse::<SortBy>().unwrap(), SortBy::Relevance);
        assert_eq!("Submitted Date".parse::<SortBy>().unwrap(), SortBy::Submitted);
        assert_eq!(SortBy::Submitted.as_api_str(), "submittedDate");
        assert!("newest".parse::<SortBy>().is_err());
    }

    #[test]
    fn test_search_url() {
        let client = ArxivClient::new(&Config::for_testing("http://localhost:9/api/query")).unwrap();
        let url = client.search_url("cat:cs.AI AND (PDDL)", 200, SortBy::Submitted).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("search_query".to_string(), "cat:cs.AI AND (PDDL)".to_string())));
        assert!(pairs.contains(&("max_results".to_string(), "200".to_string())));
        assert!(pairs.contains(&("sortBy".to_string(), "submittedDate".to_string())));
        assert!(pairs.contains(&("sortOrder".to_string(), "descending".to_string())));
    }

    #[tokio::test]
    async fn test_search_against_mock() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/query"))
            .and(query_param("search_query", "cat:cs.AI AND (PDDL)"))
            .and(query_param("sortBy", "relevance"))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed(&[
                feed_entry("2403.00001v1", "PDDL One", "first"),
                feed_entry("2403.00002v1", "PDDL Two", "second"),
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = Config::for_testing(&format!("{}/api/query", mock_server.uri()));
        let client = ArxivClient::new(&config).unwrap();
        let papers = client.search("cat:cs.AI AND (PDDL)", 200, SortBy::Relevance).await.unwrap();

        assert_eq!(papers.len(), 2);
        assert_eq!(papers[1].title, "PDDL Two");
    }

    #[tokio::test]
    async fn test_search_http_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/query"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let config = Config::for_testing(&format!("{}/api/query", mock_server.uri()));
        let client = ArxivClient::new(&config).unwrap();
        let err = client.search("cat:cs.AI AND (x)", 10, SortBy::Relevance).await.unwrap_err();
        assert!(matches!(err, SearcherError::Api { code: 503, .. }));
    }
}
