use log::debug;
use serde::Serialize;

use crate::catalog::{Catalog, CatalogEntry};

/// Maximum number of near matches proposed when nothing resolves
pub const MAX_SUGGESTIONS: usize = 5;

/// Query words must be longer than this to drive suggestions
const MIN_SUGGESTION_WORD_LEN: usize = 3;

/// Outcome of a single resolution request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    pub matched: bool,
    pub entry: Option<CatalogEntry>,
    /// Near matches in catalog order, empty when `matched` is true
    pub suggestions: Vec<CatalogEntry>,
}

impl ResolutionResult {
    fn found(entry: &CatalogEntry) -> Self {
        Self {
            matched: true,
            entry: Some(entry.clone()),
            suggestions: Vec::new(),
        }
    }

    fn not_found(suggestions: Vec<CatalogEntry>) -> Self {
        Self {
            matched: false,
            entry: None,
            suggestions,
        }
    }
}

/// Maps requested titles onto entries of the fixed catalog
#[derive(Debug, Clone)]
pub struct SourceResolver {
    catalog: Catalog,
}

impl SourceResolver {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolve a title to a catalog entry.
    ///
    /// An external id match wins over everything else, then a title match
    /// restricted to `year`, then a plain title match. Title matching is a
    /// case-insensitive containment check in either direction. When nothing
    /// matches, up to five entries sharing a query word longer than three
    /// characters are returned as suggestions.
    pub fn resolve(&self, title: &str, year: Option<i32>, external_id: Option<u64>) -> ResolutionResult {
        if let Some(id) = external_id {
            if let Some(entry) = self.catalog.iter().find(|e| e.external_id == id) {
                debug!("Resolved external id {} to '{}'", id, entry.title);
                return ResolutionResult::found(entry);
            }
        }

        let query = title.trim().to_lowercase();
        if query.is_empty() {
            return ResolutionResult::not_found(Vec::new());
        }

        if let Some(year) = year {
            let hit = self
                .catalog
                .iter()
                .find(|e| e.year == year && titles_overlap(&e.title, &query));
            if let Some(entry) = hit {
                debug!("Resolved '{}' ({}) to '{}'", title, year, entry.title);
                return ResolutionResult::found(entry);
            }
        }

        if let Some(entry) = self.catalog.iter().find(|e| titles_overlap(&e.title, &query)) {
            debug!("Resolved '{}' to '{}'", title, entry.title);
            return ResolutionResult::found(entry);
        }

        let suggestions = self.suggest(&query);
        debug!("No match for '{}', {} suggestion(s)", title, suggestions.len());
        ResolutionResult::not_found(suggestions)
    }

    /// Deterministic last-resort pick: `catalog[id mod len]`.
    ///
    /// This is a placeholder mapping with no semantic meaning. The same id
    /// always yields the same entry, nothing more is promised.
    pub fn resolve_by_id(&self, id: u64) -> &CatalogEntry {
        let index = (id % self.catalog.len() as u64) as usize;
        &self.catalog.entries()[index]
    }

    fn suggest(&self, query: &str) -> Vec<CatalogEntry> {
        let words: Vec<&str> = query
            .split_whitespace()
            .filter(|w| w.chars().count() > MIN_SUGGESTION_WORD_LEN)
            .collect();
        if words.is_empty() {
            return Vec::new();
        }

        self.catalog
            .iter()
            .filter(|e| {
                let candidate = e.title.to_lowercase();
                words.iter().any(|w| candidate.contains(w))
            })
            .take(MAX_SUGGESTIONS)
            .cloned()
            .collect()
    }
}

/// `query` must already be lowercased
fn titles_overlap(candidate: &str, query: &str) -> bool {
    let candidate = candidate.to_lowercase();
    candidate.contains(query) || query.contains(&candidate)
}
