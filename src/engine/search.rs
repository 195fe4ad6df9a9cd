//! Debounced substring search over problems, scripts, and categories.
//!
//! Scoring is intentionally simple: case-insensitive substring matching with
//! a fixed title/content weighting. The index is a flat snapshot rebuilt on
//! demand; rapid keystrokes supersede each other through a cancellation
//! token, so at most one evaluation survives a burst of typing.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use ts_rs::TS;

use crate::db::repos::{categories, problems, scripts};
use crate::db::DbPool;
use crate::error::AppError;

const TITLE_WEIGHT: i32 = 10;
const CONTENT_WEIGHT: i32 = 5;
const MAX_RESULTS: usize = 10;
const MAX_CONTENT_HIGHLIGHTS: usize = 3;
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ResultKind {
    Problem,
    Script,
    Category,
    Scenario,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SearchResult {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ResultKind,
    pub title: String,
    pub content: String,
    pub category: String,
    pub relevance: i32,
    /// The matched title and up to three matching content words, deduplicated.
    pub highlights: Vec<String>,
}

struct SearchDoc {
    id: String,
    kind: ResultKind,
    title: String,
    content: String,
    category: String,
}

/// Flat snapshot of everything searchable.
pub struct SearchIndex {
    docs: Vec<SearchDoc>,
}

impl SearchIndex {
    pub fn empty() -> Self {
        Self { docs: Vec::new() }
    }

    /// Snapshot the current store contents.
    pub fn build(pool: &DbPool) -> Result<Self, AppError> {
        let mut docs = Vec::new();

        let all_categories = categories::get_all(pool)?;
        let category_name = |id: &str| {
            all_categories
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.name.clone())
                .unwrap_or_default()
        };

        for problem in problems::get_all(pool)? {
            docs.push(SearchDoc {
                id: problem.id.clone(),
                kind: ResultKind::Problem,
                title: problem.title.clone(),
                content: problem.search_content(),
                category: category_name(&problem.category_id),
            });
        }
        for script in scripts::get_all(pool)? {
            docs.push(SearchDoc {
                id: script.id.clone(),
                kind: ResultKind::Script,
                title: script.title.clone(),
                content: script.content.clone(),
                category: script.category.clone(),
            });
        }
        for category in all_categories {
            docs.push(SearchDoc {
                id: category.id.clone(),
                kind: ResultKind::Category,
                title: category.name.clone(),
                content: category.description.clone(),
                category: "Category".into(),
            });
        }

        tracing::debug!(docs = docs.len(), "search index built");
        Ok(Self { docs })
    }

    /// Score every document against the query. Pure and synchronous; the
    /// debounce lives in [`SearchService`].
    pub fn evaluate(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();

        let mut results: Vec<SearchResult> = self
            .docs
            .iter()
            .filter_map(|doc| score(doc, &needle))
            .collect();

        // Ties break on title, then id, so equal-relevance output is stable
        results.sort_by(|a, b| {
            b.relevance
                .cmp(&a.relevance)
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(MAX_RESULTS);
        results
    }
}

fn score(doc: &SearchDoc, needle: &str) -> Option<SearchResult> {
    let title_match = doc.title.to_lowercase().contains(needle);
    let content_match = doc.content.to_lowercase().contains(needle);
    if !title_match && !content_match {
        return None;
    }

    let mut relevance = 0;
    let mut highlights = Vec::new();
    if title_match {
        relevance += TITLE_WEIGHT;
        highlights.push(doc.title.clone());
    }
    if content_match {
        relevance += CONTENT_WEIGHT;
        highlights.extend(
            doc.content
                .split_whitespace()
                .filter(|word| word.to_lowercase().contains(needle))
                .take(MAX_CONTENT_HIGHLIGHTS)
                .map(str::to_string),
        );
    }
    let mut seen = std::collections::HashSet::new();
    highlights.retain(|h| seen.insert(h.clone()));

    Some(SearchResult {
        id: doc.id.clone(),
        kind: doc.kind,
        title: doc.title.clone(),
        content: doc.content.clone(),
        category: doc.category.clone(),
        relevance,
        highlights,
    })
}

/// Debounced search front. Each call supersedes the previous one; a
/// superseded call resolves to `Ok(None)` so callers can simply drop it.
pub struct SearchService {
    index: RwLock<SearchIndex>,
    current: Mutex<CancellationToken>,
    debounce: Duration,
}

impl SearchService {
    pub fn new(index: SearchIndex) -> Self {
        Self::with_debounce(index, DEFAULT_DEBOUNCE)
    }

    /// Tests shrink the debounce window; the default matches typing cadence.
    pub fn with_debounce(index: SearchIndex, debounce: Duration) -> Self {
        Self {
            index: RwLock::new(index),
            current: Mutex::new(CancellationToken::new()),
            debounce,
        }
    }

    pub fn from_pool(pool: &DbPool) -> Result<Self, AppError> {
        Ok(Self::new(SearchIndex::build(pool)?))
    }

    /// Swap in a fresh snapshot after content edits.
    pub async fn rebuild(&self, pool: &DbPool) -> Result<(), AppError> {
        let index = SearchIndex::build(pool)?;
        *self.index.write().await = index;
        Ok(())
    }

    /// Run a query after the debounce window. An empty query cancels any
    /// pending evaluation and returns an empty result immediately.
    pub async fn search(&self, query: &str) -> Result<Option<Vec<SearchResult>>, AppError> {
        let token = {
            let mut current = self.current.lock().await;
            current.cancel();
            let token = CancellationToken::new();
            *current = token.clone();
            token
        };

        if query.trim().is_empty() {
            return Ok(Some(Vec::new()));
        }

        tokio::select! {
            _ = token.cancelled() => Ok(None),
            _ = tokio::time::sleep(self.debounce) => {
                let index = self.index.read().await;
                Ok(Some(index.evaluate(query)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_db;
    use std::sync::Arc;

    fn seeded_index() -> SearchIndex {
        let pool = init_test_db().unwrap();
        SearchIndex::build(&pool).unwrap()
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let index = seeded_index();
        assert!(index.evaluate("").is_empty());
        assert!(index.evaluate("   ").is_empty());
    }

    #[test]
    fn test_title_match_outranks_content_match() {
        let index = seeded_index();
        let results = index.evaluate("payment");
        assert!(!results.is_empty());

        // The problem titled "Payment failed during checkout" matches on both
        // title and content, so it carries the combined weight
        let top = &results[0];
        assert_eq!(top.id, "prob-payment");
        assert_eq!(top.relevance, TITLE_WEIGHT + CONTENT_WEIGHT);

        for pair in results.windows(2) {
            assert!(pair[0].relevance >= pair[1].relevance);
        }

        // The cancellation script never mentions payment and stays out
        assert!(results.iter().all(|r| r.id != "script-cancellation"));
    }

    #[test]
    fn test_non_matching_docs_are_discarded() {
        let index = seeded_index();
        let results = index.evaluate("zzzzzz-no-such-term");
        assert!(results.is_empty());
    }

    #[test]
    fn test_highlights_cap_content_words() {
        let index = seeded_index();
        let results = index.evaluate("payment");
        let top = &results[0];

        assert_eq!(top.highlights[0], top.title);
        // Title plus at most three content words
        assert!(top.highlights.len() <= 1 + MAX_CONTENT_HIGHLIGHTS);
    }

    #[test]
    fn test_result_cap() {
        let index = seeded_index();
        // "the" appears all over the seeded corpus
        assert!(index.evaluate("the").len() <= MAX_RESULTS);
    }

    #[tokio::test]
    async fn test_rapid_queries_supersede_earlier_ones() {
        let service = Arc::new(SearchService::with_debounce(
            seeded_index(),
            Duration::from_millis(50),
        ));

        let first = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.search("pay").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = service.search("payment").await.unwrap();

        assert!(first.await.unwrap().unwrap().is_none());
        let results = second.expect("latest query must survive");
        assert!(results.iter().any(|r| r.id == "prob-payment"));
    }

    #[tokio::test]
    async fn test_empty_query_bypasses_debounce() {
        let service = SearchService::with_debounce(seeded_index(), Duration::from_secs(60));
        // Would hang for a minute if the debounce applied
        let results = service.search("").await.unwrap();
        assert!(results.expect("empty query is never superseded").is_empty());
    }

    #[tokio::test]
    async fn test_rebuild_picks_up_new_content() {
        let pool = init_test_db().unwrap();
        let service = SearchService::with_debounce(
            SearchIndex::build(&pool).unwrap(),
            Duration::from_millis(1),
        );

        let before = service.search("voucher-code-issue").await.unwrap().unwrap();
        assert!(before.is_empty());

        let actor = crate::db::repos::Actor::new("user-editor", "Editor User");
        crate::db::repos::scripts::create(
            &pool,
            crate::db::models::CreateScriptInput {
                title: "Voucher-code-issue apology".into(),
                title_ar: "اعتذار عن مشكلة القسيمة".into(),
                content: "We are sorry about the voucher trouble.".into(),
                content_ar: "نعتذر عن مشكلة القسيمة.".into(),
                category: "Customer Side".into(),
                tags: None,
                color: None,
                is_template: None,
                variables: None,
                created_by: "user-editor".into(),
            },
            &actor,
        )
        .unwrap();
        service.rebuild(&pool).await.unwrap();

        let after = service.search("voucher-code-issue").await.unwrap().unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].kind, ResultKind::Script);
    }
}
