//! Tantivy schema and text analysis for the cafe search index.
//!
//! Documents are indexed on the searchable text fields only. The record
//! itself stays in the dataset; each document stores just its dataset
//! position so hits can be mapped back.

use tantivy::Index;
use tantivy::schema::{
    Field, IndexRecordOption, NumericOptions, Schema, TextFieldIndexing, TextOptions,
};
use tantivy::tokenizer::{AsciiFoldingFilter, LowerCaser, SimpleTokenizer, TextAnalyzer};

/// Name the cafe analyzer is registered under.
pub const ANALYZER: &str = "cafe_text";

/// Names of all fields in the search schema.
pub struct FieldNames;

impl FieldNames {
    pub const NAME: &'static str = "name";
    pub const CITY: &'static str = "city";
    pub const COUNTRY: &'static str = "country";
    /// Multi-valued, one value per tag.
    pub const TAGS: &'static str = "tags";
    /// Index of the record in the dataset.
    pub const POSITION: &'static str = "position";
}

/// Resolved field handles.
#[derive(Debug, Clone)]
pub struct SearchFields {
    pub name: Field,
    pub city: Field,
    pub country: Field,
    pub tags: Field,
    pub position: Field,
}

impl SearchFields {
    /// Resolves field handles from a schema.
    ///
    /// # Panics
    ///
    /// Panics if the schema was not built by [`build_schema`].
    #[must_use]
    pub fn from_schema(schema: &Schema) -> Self {
        Self {
            name: schema
                .get_field(FieldNames::NAME)
                .expect("schema missing name field"),
            city: schema
                .get_field(FieldNames::CITY)
                .expect("schema missing city field"),
            country: schema
                .get_field(FieldNames::COUNTRY)
                .expect("schema missing country field"),
            tags: schema
                .get_field(FieldNames::TAGS)
                .expect("schema missing tags field"),
            position: schema
                .get_field(FieldNames::POSITION)
                .expect("schema missing position field"),
        }
    }
}

/// Builds the search schema.
///
/// - `name`, `city`, `country`, `tags`: analyzed text, not stored
/// - `position`: u64, stored + fast
#[must_use]
pub fn build_schema() -> Schema {
    let mut builder = Schema::builder();

    let text = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(ANALYZER)
            .set_index_option(IndexRecordOption::WithFreqs),
    );

    builder.add_text_field(FieldNames::NAME, text.clone());
    builder.add_text_field(FieldNames::CITY, text.clone());
    builder.add_text_field(FieldNames::COUNTRY, text.clone());
    builder.add_text_field(FieldNames::TAGS, text);

    builder.add_u64_field(
        FieldNames::POSITION,
        NumericOptions::default().set_stored().set_fast(),
    );

    builder.build()
}

/// Simple tokenizer, lowercased and folded to ASCII, so `"Café"` and
/// `"cafe"` index and query identically.
#[must_use]
pub fn analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build()
}

/// Registers [`analyzer`] on the index under [`ANALYZER`].
pub fn register_tokenizers(index: &Index) {
    index.tokenizers().register(ANALYZER, analyzer());
}
