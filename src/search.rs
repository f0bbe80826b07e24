//! Search orchestration.
//!
//! Validates the date range, resolves keywords, plans one query per
//! configured category, runs the queries one after another and filters the
//! results. A failing query is logged with its text and skipped; results are
//! deduplicated by arXiv id in first-seen order.

use crate::arxiv::{ArxivClient, SortBy};
use crate::config::Config;
use crate::error::Result;
use crate::filter::KeywordFilter;
use crate::paper::Paper;
use crate::query::{full_query, resolve_keywords, DateRange};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Arguments of one search call. Also the memo cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchParams {
    /// Comma-separated keywords; empty means the default keyword list
    #[serde(default)]
    pub keywords: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub sort: SortBy,
}

/// Validated queries and filter for a search.
#[derive(Debug, Clone)]
pub struct SearchPlan {
    pub range: DateRange,
    pub keywords: Vec<String>,
    /// One full query per category
    pub queries: Vec<String>,
    pub filter: KeywordFilter,
}

/// Merged result of a planned search.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub papers: Vec<Paper>,
    /// Queries that returned an error and were skipped
    pub failed_queries: usize,
}

impl SearchOutcome {
    /// True when every query ran.
    pub fn is_complete(&self) -> bool {
        self.failed_queries == 0
    }
}

/// Runs searches against arXiv.
#[derive(Debug, Clone)]
pub struct Searcher {
    client: ArxivClient,
    categories: Vec<String>,
    max_results: usize,
    must_include: Vec<String>,
}

impl Searcher {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: ArxivClient::new(config)?,
            categories: config.categories.clone(),
            max_results: config.max_results,
            must_include: config.must_include_keywords.clone(),
        })
    }

    /// Validate inputs and build the queries. Performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the end date precedes the start date or
    /// the date stamps are malformed.
    pub fn plan(&self, params: &SearchParams) -> Result<SearchPlan> {
        let range = DateRange::new(params.start_date, params.end_date)?;
        let (keywords, operator) = resolve_keywords(&params.keywords);

        let queries = self
            .categories
            .iter()
            .map(|category| full_query(&keywords, operator, category, &range))
            .collect();

        let filter = KeywordFilter::new(self.must_include.clone(), keywords.clone());

        Ok(SearchPlan {
            range,
            keywords,
            queries,
            filter,
        })
    }

    /// Run the planned queries and merge the relevant results.
    ///
    /// A failing query is logged and counted in
    /// [`SearchOutcome::failed_queries`]; the others still contribute.
    pub async fn execute(&self, plan: &SearchPlan, sort: SortBy) -> SearchOutcome {
        info!("Querying arXiv for papers.");
        info!(
            start = %plan.range.start_stamp(),
            end = %plan.range.end_stamp(),
            keywords = ?plan.keywords,
            queries = plan.queries.len(),
            "Starting search"
        );

        let mut seen = HashSet::new();
        let mut papers = Vec::new();
        let mut failed_queries = 0;

        for query in &plan.queries {
            debug!(query = %query, "Running query");

            let results = match self.client.search(query, self.max_results, sort).await {
                Ok(results) => results,
                Err(e) => {
                    warn!(query = %query, error = %e, "Query failed, skipping");
                    failed_queries += 1;
                    continue;
                }
            };

            let fetched = results.len();
            let mut kept = 0;
            for paper in results {
                if !plan.filter.is_relevant(&paper.title, &paper.abstract_text) {
                    continue;
                }
                if seen.insert(paper.arxiv_id.clone()) {
                    kept += 1;
                    papers.push(paper);
                }
            }
            info!(query = %query, fetched = fetched, kept = kept, "Query complete");
        }

        info!(total = papers.len(), failed = failed_queries, "Search complete");
        SearchOutcome { papers, failed_queries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arxiv::{feed, feed_entry};
    use crate::error::SearcherError;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn params(keywords: &str) -> SearchParams {
        SearchParams {
            keywords: keywords.to_string(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 6, 1),
            sort: SortBy::Submitted,
        }
    }

    async fn run(searcher: &Searcher, params: &SearchParams) -> SearchOutcome {
        let plan = searcher.plan(params).unwrap();
        searcher.execute(&plan, params.sort).await
    }

    fn config_for(server: &MockServer, categories: &[&str]) -> Config {
        let mut config = Config::for_testing(&format!("{}/api/query", server.uri()));
        config.categories = categories.iter().map(|c| c.to_string()).collect();
        config
    }

    #[test]
    fn test_plan_single_category() {
        let searcher = Searcher::new(&Config::for_testing("http://localhost:9/api/query")).unwrap();
        let plan = searcher.plan(&params("PDDL")).unwrap();
        assert_eq!(
            plan.queries,
            vec!["cat:cs.AI AND (PDDL) AND submittedDate:[202401010000 TO 202406012359]"]
        );
    }

    #[test]
    fn test_plan_defaults_use_or() {
        let searcher = Searcher::new(&Config::for_testing("http://localhost:9/api/query")).unwrap();
        let plan = searcher.plan(&params("")).unwrap();
        assert!(plan.queries[0].contains(r#""automated planning" OR "symbolic planning""#));
    }

    #[test]
    fn test_invalid_range_rejected_by_plan() {
        let searcher = Searcher::new(&Config::for_testing("http://localhost:9/api/query")).unwrap();
        let mut bad = params("PDDL");
        bad.end_date = date(2023, 12, 31);

        let err = searcher.plan(&bad).unwrap_err();
        assert!(matches!(err, SearcherError::Validation(_)));
    }

    #[tokio::test]
    async fn test_filters_irrelevant_results() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/query"))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed(&[
                feed_entry("2403.00001v1", "Learning PDDL models", "abstract"),
                feed_entry("2403.00002v1", "Vision transformers", "image classification"),
                feed_entry("2403.00003v1", "Untitled", "we generate pddl from text"),
            ])))
            .mount(&mock_server)
            .await;

        let searcher = Searcher::new(&config_for(&mock_server, &["cs.AI"])).unwrap();
        let papers = run(&searcher, &params("PDDL")).await.papers;
        let ids: Vec<&str> = papers.iter().map(|p| p.arxiv_id.as_str()).collect();
        assert_eq!(ids, vec!["2403.00001v1", "2403.00003v1"]);
    }

    #[tokio::test]
    async fn test_duplicate_across_queries_kept_once() {
        let mock_server = MockServer::start().await;
        let shared = feed_entry("2403.00001v1", "PDDL planning for robots", "shared");

        Mock::given(method("GET"))
            .and(query_param(
                "search_query",
                "cat:cs.AI AND (PDDL) AND submittedDate:[202401010000 TO 202406012359]",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed(&[shared.clone()])))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(query_param(
                "search_query",
                "cat:cs.RO AND (PDDL) AND submittedDate:[202401010000 TO 202406012359]",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed(&[
                shared,
                feed_entry("2403.00009v1", "PDDL for manipulators", "robotics only"),
            ])))
            .mount(&mock_server)
            .await;

        let searcher = Searcher::new(&config_for(&mock_server, &["cs.AI", "cs.RO"])).unwrap();
        let papers = run(&searcher, &params("PDDL")).await.papers;
        let ids: Vec<&str> = papers.iter().map(|p| p.arxiv_id.as_str()).collect();
        assert_eq!(ids, vec!["2403.00001v1", "2403.00009v1"]);
    }

    #[tokio::test]
    async fn test_failed_query_is_skipped() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param(
                "search_query",
                "cat:cs.AI AND (PDDL) AND submittedDate:[202401010000 TO 202406012359]",
            ))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(query_param(
                "search_query",
                "cat:cs.RO AND (PDDL) AND submittedDate:[202401010000 TO 202406012359]",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed(&[feed_entry(
                "2403.00009v1",
                "PDDL for manipulators",
                "robotics",
            )])))
            .mount(&mock_server)
            .await;

        let searcher = Searcher::new(&config_for(&mock_server, &["cs.AI", "cs.RO"])).unwrap();
        let outcome = run(&searcher, &params("PDDL")).await;
        assert_eq!(outcome.failed_queries, 1);
        assert!(!outcome.is_complete());
        assert_eq!(outcome.papers.len(), 1);
        assert_eq!(outcome.papers[0].arxiv_id, "2403.00009v1");
    }

    #[tokio::test]
    async fn test_must_include_keywords_applied() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed(&[
                feed_entry("2403.00001v1", "LLM agents for planning", "a"),
                feed_entry("2403.00002v1", "LLM agents for retrieval", "b"),
            ])))
            .mount(&mock_server)
            .await;

        let mut config = config_for(&mock_server, &["cs.AI"]);
        config.must_include_keywords = vec!["planning".to_string()];
        let searcher = Searcher::new(&config).unwrap();

        let outcome = run(&searcher, &params("LLM")).await;
        assert!(outcome.is_complete());
        let papers = outcome.papers;
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].arxiv_id, "2403.00001v1");
    }
}
