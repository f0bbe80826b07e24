//! Keyword relevance filter over title and abstract.

/// True if any keyword (case-insensitive) occurs in `text_lower`.
///
/// `text_lower` must already be lowercased. An empty keyword list never matches.
pub fn matches_any<S: AsRef<str>>(text_lower: &str, keywords: &[S]) -> bool {
    keywords
        .iter()
        .any(|kw| text_lower.contains(&kw.as_ref().to_lowercase()))
}

/// Two-tier keyword filter.
///
/// A paper is relevant when it matches at least one optional keyword and,
/// if `must_include` is non-empty, at least one must-include keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordFilter {
    pub must_include: Vec<String>,
    pub optional: Vec<String>,
}

impl KeywordFilter {
    pub fn new(must_include: Vec<String>, optional: Vec<String>) -> Self {
        Self {
            must_include,
            optional,
        }
    }

    /// Single-set filter: any of `keywords`.
    pub fn any_of(keywords: Vec<String>) -> Self {
        Self::new(Vec::new(), keywords)
    }

    pub fn is_relevant(&self, title: &str, abstract_text: &str) -> bool {
        let text = format!("{} {}", title, abstract_text).to_lowercase();

        if !self.must_include.is_empty() && !matches_any(&text, &self.must_include) {
            return false;
        }
        matches_any(&text, &self.optional)
    }
}
