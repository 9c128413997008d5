//! Tantivy schema definition for item search

use tantivy::schema::{
    IndexRecordOption, Schema, SchemaBuilder, TextFieldIndexing, TextOptions, STORED, STRING,
};

use crate::domain::RegularItem;

/// Field names for the search index
pub mod fields {
    pub const KEY: &str = "key";
    pub const TITLE: &str = "title";
    pub const CREATOR_FIRST_NAME: &str = "creator_first_name";
    pub const CREATOR_LAST_NAME: &str = "creator_last_name";
    pub const DATE: &str = "date";
    pub const CITEKEY: &str = "citekey";
    pub const PUBLICATION_TITLE: &str = "publication_title";
    pub const PROCEEDINGS_TITLE: &str = "proceedings_title";
    pub const JOURNAL_ABBREVIATION: &str = "journal_abbreviation";
    pub const SHORT_TITLE: &str = "short_title";
    pub const SERIES: &str = "series";
    pub const SERIES_TITLE: &str = "series_title";
    pub const PUBLISHER: &str = "publisher";
    pub const UNIVERSITY: &str = "university";
    pub const INSTITUTION: &str = "institution";
    pub const CONFERENCE_NAME: &str = "conference_name";
}

/// A bibliographic field that is searchable
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexedField {
    Title,
    CreatorFirstName,
    CreatorLastName,
    Date,
    Citekey,
    PublicationTitle,
    ProceedingsTitle,
    JournalAbbreviation,
    ShortTitle,
    Series,
    SeriesTitle,
    Publisher,
    University,
    Institution,
    ConferenceName,
}

impl IndexedField {
    pub const ALL: [IndexedField; 15] = [
        IndexedField::Title,
        IndexedField::CreatorFirstName,
        IndexedField::CreatorLastName,
        IndexedField::Date,
        IndexedField::Citekey,
        IndexedField::PublicationTitle,
        IndexedField::ProceedingsTitle,
        IndexedField::JournalAbbreviation,
        IndexedField::ShortTitle,
        IndexedField::Series,
        IndexedField::SeriesTitle,
        IndexedField::Publisher,
        IndexedField::University,
        IndexedField::Institution,
        IndexedField::ConferenceName,
    ];

    /// Name of the field in the tantivy schema
    pub fn schema_name(self) -> &'static str {
        match self {
            IndexedField::Title => fields::TITLE,
            IndexedField::CreatorFirstName => fields::CREATOR_FIRST_NAME,
            IndexedField::CreatorLastName => fields::CREATOR_LAST_NAME,
            IndexedField::Date => fields::DATE,
            IndexedField::Citekey => fields::CITEKEY,
            IndexedField::PublicationTitle => fields::PUBLICATION_TITLE,
            IndexedField::ProceedingsTitle => fields::PROCEEDINGS_TITLE,
            IndexedField::JournalAbbreviation => fields::JOURNAL_ABBREVIATION,
            IndexedField::ShortTitle => fields::SHORT_TITLE,
            IndexedField::Series => fields::SERIES,
            IndexedField::SeriesTitle => fields::SERIES_TITLE,
            IndexedField::Publisher => fields::PUBLISHER,
            IndexedField::University => fields::UNIVERSITY,
            IndexedField::Institution => fields::INSTITUTION,
            IndexedField::ConferenceName => fields::CONFERENCE_NAME,
        }
    }

    /// Name reported in match results, as the item metadata calls it
    pub fn label(self) -> &'static str {
        match self {
            IndexedField::Title => "title",
            IndexedField::CreatorFirstName => "creators.firstName",
            IndexedField::CreatorLastName => "creators.lastName",
            IndexedField::Date => "date",
            IndexedField::Citekey => "citekey",
            IndexedField::PublicationTitle => "publicationTitle",
            IndexedField::ProceedingsTitle => "proceedingsTitle",
            IndexedField::JournalAbbreviation => "journalAbbreviation",
            IndexedField::ShortTitle => "shortTitle",
            IndexedField::Series => "series",
            IndexedField::SeriesTitle => "seriesTitle",
            IndexedField::Publisher => "publisher",
            IndexedField::University => "university",
            IndexedField::Institution => "institution",
            IndexedField::ConferenceName => "conferenceName",
        }
    }

    /// Text values of this field on an item
    pub fn values(self, item: &RegularItem) -> Vec<String> {
        match self {
            IndexedField::CreatorFirstName => item
                .creators
                .iter()
                .filter_map(|c| c.first_name.clone())
                .filter(|s| !s.is_empty())
                .collect(),
            IndexedField::CreatorLastName => item
                .creators
                .iter()
                .filter_map(|c| c.last_name.clone())
                .filter(|s| !s.is_empty())
                .collect(),
            IndexedField::Citekey => item.citekey.iter().cloned().collect(),
            other => item.field_text(other.label()).into_iter().collect(),
        }
    }
}

/// Build the Tantivy schema for regular items
pub fn build_schema() -> Schema {
    let mut schema_builder = SchemaBuilder::new();

    // Stored identity, returned with every hit
    schema_builder.add_text_field(fields::KEY, STRING | STORED);

    let text_options = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer("en_stem")
            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
    );

    for field in IndexedField::ALL {
        schema_builder.add_text_field(field.schema_name(), text_options.clone());
    }

    schema_builder.build()
}

/// Tantivy tokenizer configuration
pub fn configure_tokenizers(index: &tantivy::Index) {
    let tokenizer_manager = index.tokenizers();

    // English stemming tokenizer
    tokenizer_manager.register(
        "en_stem",
        tantivy::tokenizer::TextAnalyzer::builder(tantivy::tokenizer::SimpleTokenizer::default())
            .filter(tantivy::tokenizer::RemoveLongFilter::limit(40))
            .filter(tantivy::tokenizer::LowerCaser)
            .filter(tantivy::tokenizer::Stemmer::new(
                tantivy::tokenizer::Language::English,
            ))
            .build(),
    );
}
