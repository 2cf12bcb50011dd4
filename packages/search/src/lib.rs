#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory fuzzy search over the published cafe dataset.
//!
//! [`SearchIndex::build`] indexes `name`, `city`, `country` and `tags` of
//! every record into a RAM-backed Tantivy index. Queries tolerate minor
//! misspellings (see [`query`] for the matching strategies) and return at
//! most [`SearchConfig::max_results`] hits, best first, with ties broken by
//! dataset order.
//!
//! The index is derived data: it is never persisted and is rebuilt from
//! scratch whenever the dataset changes.
//!
//! ```rust,no_run
//! # fn example(records: &[cafeco_cafe_models::CafeRecord]) -> Result<(), cafeco_search::SearchError> {
//! use cafeco_search::{SearchConfig, SearchIndex};
//!
//! let index = SearchIndex::build(records, SearchConfig::default())?;
//! for hit in index.search("roats")? {
//!     println!("{} ({:.2})", hit.record.name, hit.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod query;
pub mod schema;

use std::sync::atomic::{AtomicUsize, Ordering};

use cafeco_cafe_models::CafeRecord;
use tantivy::collector::TopDocs;
use tantivy::schema::Value;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};

use schema::SearchFields;

/// Heap for the single indexing thread. Tantivy's minimum is 15 MB.
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Errors from building or querying the index.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Tantivy error.
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// A document is missing its stored dataset position.
    #[error("Search index document has no position")]
    MissingPosition,
}

/// Relative weight of each searchable field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBoosts {
    pub name: f32,
    pub tags: f32,
    pub city: f32,
    pub country: f32,
}

impl Default for FieldBoosts {
    fn default() -> Self {
        Self {
            name: 3.0,
            tags: 2.0,
            city: 1.5,
            country: 1.0,
        }
    }
}

/// Search behavior settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Trimmed queries shorter than this (in characters) return nothing.
    pub min_query_chars: usize,
    /// Maximum number of hits returned.
    pub max_results: usize,
    /// Maximum edit distance for fuzzy matches, clamped to
    /// [`query::MAX_EDIT_DISTANCE`].
    pub max_edit_distance: u8,
    pub field_boosts: FieldBoosts,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_chars: 3,
            max_results: 5,
            max_edit_distance: 1,
            field_boosts: FieldBoosts::default(),
        }
    }
}

/// One ranked result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit<'a> {
    pub record: &'a CafeRecord,
    pub score: f32,
    /// Index of the record in the dataset.
    pub position: usize,
}

/// A queryable snapshot of the dataset.
pub struct SearchIndex {
    records: Vec<CafeRecord>,
    fields: SearchFields,
    reader: IndexReader,
    config: SearchConfig,
    executed_queries: AtomicUsize,
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("records", &self.records.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SearchIndex {
    /// Indexes `records`, which should be in published dataset order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Tantivy`] if indexing fails.
    pub fn build(records: &[CafeRecord], config: SearchConfig) -> Result<Self, SearchError> {
        let schema = schema::build_schema();
        let index = Index::create_in_ram(schema.clone());
        schema::register_tokenizers(&index);
        let fields = SearchFields::from_schema(&schema);

        let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_HEAP_BYTES)?;
        for (position, record) in records.iter().enumerate() {
            let mut doc = TantivyDocument::default();
            doc.add_text(fields.name, &record.name);
            doc.add_text(fields.city, &record.city);
            doc.add_text(fields.country, &record.country);
            for tag in &record.tags {
                doc.add_text(fields.tags, tag);
            }
            doc.add_u64(fields.position, position as u64);
            writer.add_document(doc)?;
        }
        writer.commit()?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        log::debug!("Indexed {} cafes for search", records.len());

        Ok(Self {
            records: records.to_vec(),
            fields,
            reader,
            config,
            executed_queries: AtomicUsize::new(0),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[must_use]
    pub fn records(&self) -> &[CafeRecord] {
        &self.records
    }

    /// Number of queries that actually reached the index.
    #[must_use]
    pub fn executed_queries(&self) -> usize {
        self.executed_queries.load(Ordering::Relaxed)
    }

    /// Searches the index.
    ///
    /// Queries below [`SearchConfig::min_query_chars`] after trimming, or
    /// with no searchable tokens, return no hits without touching the
    /// index.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the underlying search fails.
    pub fn search(&self, text: &str) -> Result<Vec<SearchHit<'_>>, SearchError> {
        let text = text.trim();
        if text.chars().count() < self.config.min_query_chars || self.config.max_results == 0 {
            return Ok(Vec::new());
        }

        let tokens = query::tokenize(text);
        let Some(query) = query::build_search_query(&tokens, &self.fields, &self.config)? else {
            return Ok(Vec::new());
        };

        let searcher = self.reader.searcher();
        let num_docs = usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX);
        if num_docs == 0 {
            return Ok(Vec::new());
        }

        self.executed_queries.fetch_add(1, Ordering::Relaxed);

        // Collect every match so ties can be ordered by dataset position
        // before truncating.
        let top_docs = searcher.search(&query, &TopDocs::with_limit(num_docs))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let position = doc
                .get_first(self.fields.position)
                .and_then(|v| v.as_u64())
                .and_then(|p| usize::try_from(p).ok())
                .ok_or(SearchError::MissingPosition)?;
            if let Some(record) = self.records.get(position) {
                hits.push(SearchHit {
                    record,
                    score,
                    position,
                });
            }
        }

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.position.cmp(&b.position))
        });
        hits.truncate(self.config.max_results);

        log::debug!("Search {text:?} -> {} hits", hits.len());

        Ok(hits)
    }
}
