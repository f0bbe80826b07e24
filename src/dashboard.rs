//! Web dashboard.
//!
//! Server-rendered search page with a per-browser session: the last search
//! results, whether a search was attempted, the last error and the form
//! values survive page reloads. Sessions live in process memory, are
//! identified by a `session_id` cookie and are dropped after an hour idle.

use crate::arxiv::SortBy;
use crate::cache::CachedSearcher;
use crate::error::{Result, SearcherError};
use crate::paper::Paper;
use crate::query::DEFAULT_KEYWORDS;
use crate::search::SearchParams;
use axum::{
    extract::{Form, State},
    response::{Html, Redirect},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Datelike, Local, NaiveDate};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

/// Cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session_id";

/// Sessions untouched for this long are dropped.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(3600);

/// Upper bound on live sessions.
const MAX_SESSIONS: u64 = 10_000;

/// Form values as last submitted.
#[derive(Debug, Clone, Default)]
pub struct FormValues {
    pub keywords: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort: SortBy,
}

/// Per-session state.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub papers: Arc<Vec<Paper>>,
    pub searched: bool,
    pub error: Option<String>,
    pub form: FormValues,
}

/// In-process session storage with idle expiry.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Cache<String, SessionState>,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(idle_timeout)
            .build();
        Self { sessions }
    }

    /// Snapshot of a session; unknown or expired ids get a fresh state.
    pub fn get(&self, id: &str) -> SessionState {
        self.sessions.get(id).unwrap_or_default()
    }

    /// Apply `f` to a session and store the result, creating it if needed.
    pub fn update<F: FnOnce(&mut SessionState)>(&self, id: &str, f: F) {
        let mut state = self.get(id);
        f(&mut state);
        self.sessions.insert(id.to_string(), state);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_IDLE_TIMEOUT)
    }
}

/// Shared dashboard state.
#[derive(Clone)]
pub struct AppState {
    pub searcher: CachedSearcher,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(searcher: CachedSearcher) -> Self {
        Self {
            searcher,
            sessions: SessionStore::default(),
        }
    }
}

/// Build the dashboard router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/search", post(api_search_handler))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/", get(index_handler))
        .route("/search", post(submit_handler))
        .route("/health", get(health_handler))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Existing session id, or a new one added to the jar.
fn session_id(jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let id = cookie.value().to_string();
        return (jar, id);
    }
    let id = Uuid::new_v4().to_string();
    let mut cookie = Cookie::new(SESSION_COOKIE, id.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    (jar.add(cookie), id)
}

async fn index_handler(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Html<String>) {
    let (jar, id) = session_id(jar);
    let session = state.sessions.get(&id);
    (jar, Html(render_page(&session, Local::now().date_naive())))
}

/// Search form body. Empty date inputs arrive as empty strings.
#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub sort: String,
}

fn parse_form_date(value: &str, field: &str) -> Result<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| SearcherError::Validation(format!("Invalid {} '{}': {}", field, value, e)))
}

/// Turn the submitted form into search parameters.
///
/// A missing start date means January 1 of last year; a missing end date
/// means today.
pub fn form_to_params(form: &SearchForm, today: NaiveDate) -> Result<(FormValues, SearchParams)> {
    let start = parse_form_date(&form.start_date, "start date")?;
    let end = parse_form_date(&form.end_date, "end date")?;
    let sort = if form.sort.trim().is_empty() {
        SortBy::default()
    } else {
        form.sort.parse()?
    };

    let values = FormValues {
        keywords: form.keywords.clone(),
        start_date: start,
        end_date: end,
        sort,
    };

    let start_date = match start {
        Some(date) => date,
        None => NaiveDate::from_ymd_opt(today.year() - 1, 1, 1)
            .ok_or_else(|| SearcherError::Validation("Cannot compute default start date".to_string()))?,
    };

    let params = SearchParams {
        keywords: form.keywords.trim().to_string(),
        start_date,
        end_date: end.unwrap_or(today),
        sort,
    };
    Ok((values, params))
}

async fn submit_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SearchForm>,
) -> (CookieJar, Redirect) {
    let (jar, id) = session_id(jar);
    info!(keywords = %form.keywords, start = %form.start_date, end = %form.end_date, sort = %form.sort, "Dashboard search");

    state.sessions.update(&id, |s| {
        s.searched = false;
        s.error = None;
    });

    let outcome = match form_to_params(&form, Local::now().date_naive()) {
        Ok((values, params)) => {
            state.sessions.update(&id, |s| s.form = values);
            state.searcher.search(&params).await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(papers) => state.sessions.update(&id, |s| {
            s.papers = papers;
            s.searched = true;
        }),
        Err(e) => {
            error!(error = %e, "Dashboard search failed");
            state.sessions.update(&id, |s| s.error = Some(e.to_string()));
        }
    }

    (jar, Redirect::to("/"))
}

/// JSON search response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub status: String,
    pub count: usize,
    pub papers: Vec<Paper>,
}

/// JSON search endpoint
async fn api_search_handler(
    State(state): State<AppState>,
    Json(params): Json<SearchParams>,
) -> Json<SearchResponse> {
    info!(keywords = %params.keywords, sort = %params.sort, "API search request");

    match state.searcher.search(&params).await {
        Ok(papers) => Json(SearchResponse {
            status: "success".to_string(),
            count: papers.len(),
            papers: papers.to_vec(),
        }),
        Err(e) => {
            error!(error = %e, "Search failed");
            Json(SearchResponse {
                status: format!("error: {}", e),
                count: 0,
                papers: vec![],
            })
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 0; color: #1d1d1f; }
.topbar { font-size: 1.3rem; font-weight: 600; padding: 0.8rem 2rem; border-bottom: 1px solid #ddd; }
.container { max-width: 760px; margin: 0 auto; padding: 2rem 1rem; }
h1 { text-align: center; font-weight: 700; font-size: 2rem; letter-spacing: -0.5px; margin: 0 0 0.4rem; }
.page-subtitle { text-align: center; font-size: 0.95rem; opacity: 0.7; margin-bottom: 2rem; }
form label { display: block; font-size: 0.9rem; font-weight: 600; margin-bottom: 0.3rem; }
form input, form select { width: 100%; padding: 0.45rem; border: 1px solid #ccc; border-radius: 8px; box-sizing: border-box; }
.form-row { display: grid; grid-template-columns: 1fr 1fr 1.5fr 1fr; gap: 0.8rem; align-items: end; margin-top: 0.8rem; }
button { background: linear-gradient(135deg, #2563eb 0%, #1d4ed8 100%); color: white; border: none; border-radius: 8px; padding: 0.5rem 0.7rem; font-weight: 600; cursor: pointer; transition: all 0.2s ease; }
button:hover { transform: translateY(-2px); box-shadow: 0 4px 12px rgba(37,99,235,0.4); }
.results-count { font-size: 1.2rem; font-weight: 700; margin: 2rem 0 1.5rem; }
.paper-card { margin-top: 1rem; }
.paper-title { font-size: 1rem; font-weight: 700; margin-bottom: 0.5rem; line-height: 1.4; }
.paper-authors, .paper-metadata { font-size: 0.9rem; }
.metadata-item { margin-right: 1rem; }
details { border: 1px solid #e5e7eb; border-radius: 8px; margin: 0.5rem 0 1rem; }
details summary { padding: 0.3rem 1rem; cursor: pointer; }
details .detail-body { padding: 0 1rem 1rem; }
.paper-abstract { font-size: 1rem; text-align: justify; }
.alert { padding: 0.8rem 1rem; border-radius: 8px; margin-top: 2rem; }
.alert-info { background: #e8f1fd; border: 1px solid #9cc3f5; }
.alert-error { background: #fdecea; border: 1px solid #f5a19c; color: #000; }
"#;

/// Render the full page for a session.
pub fn render_page(session: &SessionState, today: NaiveDate) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>AI4Society-ArXiv Searcher</title>
<style>{style}</style>
</head>
<body>
<div class="topbar">AI4Society</div>
<div class="container">
<h1>ArXiv Paper Search</h1>
<div class="page-subtitle">Discover research papers on Large Language Models and related topics</div>
{form}
{body}
</div>
</body>
</html>"#,
        style = STYLE,
        form = render_form(&session.form, today),
        body = render_results(session),
    )
}

fn render_form(values: &FormValues, today: NaiveDate) -> String {
    let start = values
        .start_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let end = values.end_date.unwrap_or(today).format("%Y-%m-%d").to_string();

    let options: String = [SortBy::Relevance, SortBy::Submitted]
        .iter()
        .map(|sort| {
            let selected = if *sort == values.sort { " selected" } else { "" };
            format!(r#"<option value="{}"{}>{}</option>"#, sort, selected, sort.label())
        })
        .collect();

    format!(
        r#"<form method="POST" action="/search">
<label for="keywords">Search Keywords</label>
<input type="text" id="keywords" name="keywords" value="{keywords}" placeholder="e.g., time-series, forecasting" title="Leave empty to use the default keywords: {defaults}">
<div class="form-row">
<div><label for="start_date">Start Date</label><input type="date" id="start_date" name="start_date" value="{start}"></div>
<div><label for="end_date">End Date</label><input type="date" id="end_date" name="end_date" value="{end}"></div>
<div><label for="sort">Order By</label><select id="sort" name="sort">{options}</select></div>
<div><button type="submit">Search</button></div>
</div>
</form>"#,
        keywords = html_escape(&values.keywords),
        defaults = html_escape(&DEFAULT_KEYWORDS.join(", ")),
        start = start,
        end = end,
        options = options,
    )
}

fn render_results(session: &SessionState) -> String {
    let mut out = String::new();

    if let Some(ref message) = session.error {
        out.push_str(&format!(
            r#"<div class="alert alert-error">{}</div>"#,
            html_escape(message)
        ));
    }

    if !session.searched {
        return out;
    }

    if session.papers.is_empty() {
        out.push_str(
            r#"<div class="alert alert-info">No papers found. Try adjusting your keywords or search period.</div>"#,
        );
        return out;
    }

    out.push_str(&format!(
        r#"<div class="results-count">{} Papers Found</div>"#,
        session.papers.len()
    ));
    for paper in session.papers.iter() {
        out.push_str(&render_paper(paper));
    }
    out
}

fn render_paper(paper: &Paper) -> String {
    format!(
        r#"<div class="paper-card">
<div class="paper-title">{title}</div>
<div class="paper-metadata">
<span class="metadata-item">{date}</span>
<span class="metadata-item"><a href="{link}">View on arXiv</a></span>
</div>
<details>
<summary>View details</summary>
<div class="detail-body">
<div class="paper-authors"><strong>Authors:</strong> {authors}</div>
<p>[<a class="pdf-link" href="{pdf}">PDF</a>]</p>
<div class="paper-abstract"><strong>Abstract</strong><br>{abstract_text}</div>
</div>
</details>
</div>
"#,
        title = html_escape(&paper.title),
        date = paper.published_display(),
        link = html_escape(&paper.link),
        authors = html_escape(&paper.authors_display()),
        pdf = html_escape(&paper.pdf_link),
        abstract_text = html_escape(&paper.abstract_text),
    )
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
