//! Paper record and CSV export.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A single arXiv paper, immutable once parsed from an API entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    /// Short arXiv id including version (e.g. `2401.01234v1`)
    pub arxiv_id: String,
    pub title: String,
    /// Author names in listed order
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Abstract page URL
    pub link: String,
    pub pdf_link: String,
}

impl Paper {
    /// Authors joined for display.
    pub fn authors_display(&self) -> String {
        self.authors.join(", ")
    }

    /// Published date as `dd/mm/YYYY`.
    pub fn published_display(&self) -> String {
        self.published.format("%d/%m/%Y").to_string()
    }
}

/// Flat CSV row; csv cannot serialize nested sequences.
#[derive(Debug, Serialize)]
struct PaperRow<'a> {
    arxiv_id: &'a str,
    title: &'a str,
    authors: String,
    published: String,
    updated: String,
    link: &'a str,
    pdf_link: &'a str,
    #[serde(rename = "abstract")]
    abstract_text: &'a str,
}

impl<'a> From<&'a Paper> for PaperRow<'a> {
    fn from(paper: &'a Paper) -> Self {
        Self {
            arxiv_id: &paper.arxiv_id,
            title: &paper.title,
            authors: paper.authors.join("; "),
            published: paper.published.to_rfc3339(),
            updated: paper.updated.to_rfc3339(),
            link: &paper.link,
            pdf_link: &paper.pdf_link,
            abstract_text: &paper.abstract_text,
        }
    }
}

/// Save papers to a CSV file with a header row.
pub fn save_csv(path: &Path, papers: &[Paper]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_path(path)?;

    for paper in papers {
        wtr.serialize(PaperRow::from(paper))?;
    }

    wtr.flush()?;
    info!(path = %path.display(), count = papers.len(), "Saved CSV");
    Ok(())
}

#[cfg(test)]
pub(crate) fn sample_paper(id: &str, title: &str) -> Paper {
    use chrono::TimeZone;

    let published = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).single().unwrap_or_default();
    Paper {
        arxiv_id: id.to_string(),
        title: title.to_string(),
        authors: vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()],
        abstract_text: format!("Abstract for {}", title),
        published,
        updated: published,
        link: format!("http://arxiv.org/abs/{}", id),
        pdf_link: format!("http://arxiv.org/pdf/{}", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_display_helpers() {
        let paper = sample_paper("2403.00001v1", "Planning with PDDL");
        assert_eq!(paper.published_display(), "05/03/2024");
        assert_eq!(paper.authors_display(), "Ada Lovelace, Alan Turing");
    }

    #[test]
    fn test_save_csv() -> Result<()> {
        let temp = NamedTempFile::new()?;
        let papers = vec![
            sample_paper("2403.00001v1", "Planning with PDDL"),
            sample_paper("2403.00002v2", "Task, Motion, and Planning"),
        ];

        save_csv(temp.path(), &papers)?;

        let mut reader = csv::Reader::from_path(temp.path())?;
        let headers = reader.headers()?.clone();
        assert_eq!(headers.get(0), Some("arxiv_id"));
        let rows: Vec<csv::StringRecord> = reader.records().collect::<std::result::Result<_, _>>()?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get(1), Some("Task, Motion, and Planning"));
        assert_eq!(rows[0].get(2), Some("Ada Lovelace; Alan Turing"));
        Ok(())
    }
}
