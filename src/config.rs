/// Search terms longer than this are ignored.
pub const MAX_SEARCH_LENGTH: usize = 10_000;

/// Alias given to the wrapped base query in raw SQL statements.
pub const DEFAULT_SUBQUERY_ALIAS: &str = "scoped";

/// Per-table settings applied while normalizing and executing a grid request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConfig {
    /// Upper bound on the length of global and per-column search terms
    pub max_search_length: usize,
    /// Optional cap on the page length a client may request
    pub max_page_length: Option<u64>,
    /// Alias of the base query subselect (raw SQL backend only)
    pub subquery_alias: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            max_search_length: MAX_SEARCH_LENGTH,
            max_page_length: None,
            subquery_alias: DEFAULT_SUBQUERY_ALIAS.to_string(),
        }
    }
}

impl GridConfig {
    #[must_use]
    pub fn with_max_page_length(mut self, max: u64) -> Self {
        self.max_page_length = Some(max);
        self
    }

    #[must_use]
    pub fn with_max_search_length(mut self, max: usize) -> Self {
        self.max_search_length = max;
        self
    }

    #[must_use]
    pub fn with_subquery_alias(mut self, alias: impl Into<String>) -> Self {
        self.subquery_alias = alias.into();
        self
    }
}
