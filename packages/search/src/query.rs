//! Query construction for cafe searches.
//!
//! Each query token becomes a `DisjunctionMaxQuery` over every
//! (field, strategy) pair, so a token scores by its single best match.
//! Tokens are OR-ed together with a `BooleanQuery`, so documents that
//! match more tokens score higher.
//!
//! Strategies, strongest first:
//!
//! 1. exact term (BM25-scored)
//! 2. fuzzy term within the configured edit distance, transpositions
//!    costing one edit
//! 3. fuzzy prefix, for partially typed words
//! 4. substring, for fragments inside a longer word
//!
//! Tokens longer than [`MAX_PATTERN_TOKEN_CHARS`] use the exact strategy
//! only, and at most [`MAX_QUERY_TOKENS`] tokens are used.

use tantivy::Term;
use tantivy::query::{
    BooleanQuery, BoostQuery, DisjunctionMaxQuery, FuzzyTermQuery, Occur, Query, RegexQuery,
    TermQuery,
};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::tokenizer::TokenStream;

use crate::schema::{SearchFields, analyzer};
use crate::{FieldBoosts, SearchConfig, SearchError};

/// Boost applied to exact term matches.
const EXACT_BOOST: f32 = 3.0;
/// Boost applied to fuzzy term matches.
const FUZZY_BOOST: f32 = 1.5;
/// Boost applied to fuzzy prefix matches.
const PREFIX_BOOST: f32 = 1.0;
/// Boost applied to substring matches.
const SUBSTRING_BOOST: f32 = 0.5;

/// Tokens shorter than this only match exactly or by prefix.
pub const MIN_FUZZY_TOKEN_CHARS: usize = 3;

/// Largest edit distance the Levenshtein automata support.
pub const MAX_EDIT_DISTANCE: u8 = 2;

/// Tokens longer than this only match exactly. Fuzzy and substring
/// automata grow with token length.
pub const MAX_PATTERN_TOKEN_CHARS: usize = 24;

/// Tokens after this many are ignored.
pub const MAX_QUERY_TOKENS: usize = 8;

/// Runs `text` through the index analyzer. Duplicate tokens are dropped.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let mut analyzer = analyzer();
    let mut stream = analyzer.token_stream(text);
    let mut tokens: Vec<String> = Vec::new();
    while stream.advance() {
        let token = &stream.token().text;
        if !tokens.contains(token) {
            tokens.push(token.clone());
        }
    }
    tokens
}

fn weighted_fields(fields: &SearchFields, boosts: &FieldBoosts) -> [(Field, f32); 4] {
    [
        (fields.name, boosts.name),
        (fields.tags, boosts.tags),
        (fields.city, boosts.city),
        (fields.country, boosts.country),
    ]
}

/// Returns `true` if `token` is short enough for the fuzzy, prefix and
/// substring strategies.
#[must_use]
pub fn uses_patterns(token: &str) -> bool {
    token.chars().count() <= MAX_PATTERN_TOKEN_CHARS
}

fn token_query(
    token: &str,
    fields: &SearchFields,
    config: &SearchConfig,
) -> Result<Box<dyn Query>, SearchError> {
    let distance = config.max_edit_distance.min(MAX_EDIT_DISTANCE);
    let patterns = uses_patterns(token);
    let fuzzy = patterns && distance > 0 && token.chars().count() >= MIN_FUZZY_TOKEN_CHARS;
    let substring = format!(".*{}.*", regex::escape(token));

    let mut disjuncts: Vec<Box<dyn Query>> = Vec::new();

    for (field, field_boost) in weighted_fields(fields, &config.field_boosts) {
        let term = Term::from_field_text(field, token);

        disjuncts.push(Box::new(BoostQuery::new(
            Box::new(TermQuery::new(term.clone(), IndexRecordOption::WithFreqs)),
            EXACT_BOOST * field_boost,
        )));

        if fuzzy {
            disjuncts.push(Box::new(BoostQuery::new(
                Box::new(FuzzyTermQuery::new(term.clone(), distance, true)),
                FUZZY_BOOST * field_boost,
            )));
        }

        if !patterns {
            continue;
        }

        disjuncts.push(Box::new(BoostQuery::new(
            Box::new(FuzzyTermQuery::new_prefix(
                term,
                if fuzzy { distance } else { 0 },
                true,
            )),
            PREFIX_BOOST * field_boost,
        )));

        if token.chars().count() >= MIN_FUZZY_TOKEN_CHARS {
            disjuncts.push(Box::new(BoostQuery::new(
                Box::new(RegexQuery::from_pattern(&substring, field)?),
                SUBSTRING_BOOST * field_boost,
            )));
        }
    }

    Ok(Box::new(DisjunctionMaxQuery::new(disjuncts)))
}

/// Builds the search query for already-analyzed `tokens`.
///
/// Returns `None` when there are no tokens.
///
/// # Errors
///
/// Returns [`SearchError::Tantivy`] if a substring pattern fails to
/// compile.
pub fn build_search_query(
    tokens: &[String],
    fields: &SearchFields,
    config: &SearchConfig,
) -> Result<Option<Box<dyn Query>>, SearchError> {
    if tokens.is_empty() {
        return Ok(None);
    }

    if tokens.len() > MAX_QUERY_TOKENS {
        log::debug!("Ignoring {} query tokens past the limit", tokens.len() - MAX_QUERY_TOKENS);
    }

    let clauses = tokens
        .iter()
        .take(MAX_QUERY_TOKENS)
        .map(|token| Ok((Occur::Should, token_query(token, fields, config)?)))
        .collect::<Result<Vec<(Occur, Box<dyn Query>)>, SearchError>>()?;

    Ok(Some(Box::new(BooleanQuery::new(clauses))))
}
