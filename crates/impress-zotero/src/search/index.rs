//! Search index management
//!
//! An in-memory tantivy index over one library's regular items. A query is
//! run once per indexed field, so results say which fields matched and the
//! ranking layer can weight them.

use std::sync::{Mutex, MutexGuard};

use tantivy::{
    collector::TopDocs,
    query::{BooleanQuery, FuzzyTermQuery, Occur, Query, TermQuery},
    schema::{Field, IndexRecordOption, Value},
    tokenizer::TokenStream,
    Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term,
};
use thiserror::Error;

use super::schema::{build_schema, configure_tokenizers, fields, IndexedField};
use crate::domain::{LibraryId, RegularItem};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchIndexError {
    #[error("Index error: {0}")]
    IndexError(String),
    #[error("Query error: {0}")]
    QueryError(String),
}

impl From<tantivy::TantivyError> for SearchIndexError {
    fn from(e: tantivy::TantivyError) -> Self {
        SearchIndexError::IndexError(e.to_string())
    }
}

/// Keys that matched one field, best match first
#[derive(Clone, Debug, PartialEq)]
pub struct FieldMatches {
    pub field: String,
    pub keys: Vec<String>,
}

/// Search index for the regular items of one library
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    library_id: LibraryId,
    key_field: Field,
    text_fields: Vec<(IndexedField, Field)>,
}

impl SearchIndex {
    /// Create an empty in-memory index for `library_id`
    pub fn in_memory(library_id: LibraryId, heap_size: usize) -> Result<Self, SearchIndexError> {
        let schema = build_schema();
        let index = Index::create_in_ram(schema.clone());

        configure_tokenizers(&index);

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        let writer = index.writer(heap_size)?;

        let key_field = schema.get_field(fields::KEY)?;
        let text_fields = IndexedField::ALL
            .iter()
            .map(|f| Ok((*f, schema.get_field(f.schema_name())?)))
            .collect::<Result<Vec<_>, SearchIndexError>>()?;

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(writer),
            library_id,
            key_field,
            text_fields,
        })
    }

    /// Build and commit an index over `items`
    pub fn build<'a>(
        library_id: LibraryId,
        heap_size: usize,
        items: impl IntoIterator<Item = &'a RegularItem>,
    ) -> Result<Self, SearchIndexError> {
        let index = Self::in_memory(library_id, heap_size)?;
        for item in items {
            index.add_item(item)?;
        }
        index.commit()?;
        Ok(index)
    }

    /// Library this index was built for
    pub fn library_id(&self) -> LibraryId {
        self.library_id
    }

    fn writer(&self) -> Result<MutexGuard<'_, IndexWriter>, SearchIndexError> {
        self.writer
            .lock()
            .map_err(|_| SearchIndexError::IndexError("Writer lock poisoned".to_string()))
    }

    fn document(&self, item: &RegularItem) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        doc.add_text(self.key_field, &item.key);
        for (indexed, field) in &self.text_fields {
            for value in indexed.values(item) {
                doc.add_text(*field, &value);
            }
        }
        doc
    }

    /// Stage an item, replacing any earlier document for its key.
    ///
    /// Not visible to searches until [`commit`](Self::commit).
    pub fn add_item(&self, item: &RegularItem) -> Result<(), SearchIndexError> {
        let writer = self.writer()?;
        writer.delete_term(Term::from_field_text(self.key_field, &item.key));
        writer.add_document(self.document(item))?;
        Ok(())
    }

    /// Stage removal of an item's document
    pub fn delete_item(&self, key: &str) -> Result<(), SearchIndexError> {
        let writer = self.writer()?;
        writer.delete_term(Term::from_field_text(self.key_field, key));
        Ok(())
    }

    /// Commit changes and reload reader
    pub fn commit(&self) -> Result<(), SearchIndexError> {
        self.writer()?.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// Number of searchable documents
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    fn query_terms(&self, field: Field, query: &str) -> Result<Vec<Term>, SearchIndexError> {
        let mut analyzer = self.index.tokenizer_for_field(field)?;
        let mut stream = analyzer.token_stream(query);
        let mut terms = Vec::new();
        stream.process(&mut |token| terms.push(Term::from_field_text(field, &token.text)));
        Ok(terms)
    }

    /// Every query token must match, either exactly or as a prefix
    fn field_query(terms: Vec<Term>) -> BooleanQuery {
        let clauses: Vec<(Occur, Box<dyn Query>)> = terms
            .into_iter()
            .map(|term| {
                let exact: Box<dyn Query> =
                    Box::new(TermQuery::new(term.clone(), IndexRecordOption::WithFreqs));
                let prefix: Box<dyn Query> = Box::new(FuzzyTermQuery::new_prefix(term, 0, true));
                let either: Box<dyn Query> =
                    Box::new(BooleanQuery::new(vec![(Occur::Should, exact), (Occur::Should, prefix)]));
                (Occur::Must, either)
            })
            .collect();
        BooleanQuery::new(clauses)
    }

    /// Search each indexed field, keeping at most `limit` keys per field.
    ///
    /// Fields without a match are left out.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<FieldMatches>, SearchIndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let searcher = self.reader.searcher();
        let mut results = Vec::new();

        for (indexed, field) in &self.text_fields {
            let terms = self.query_terms(*field, query)?;
            if terms.is_empty() {
                continue;
            }

            let top_docs = searcher
                .search(&Self::field_query(terms), &TopDocs::with_limit(limit))
                .map_err(|e| SearchIndexError::QueryError(e.to_string()))?;

            let mut keys = Vec::with_capacity(top_docs.len());
            for (_score, doc_address) in top_docs {
                let doc: TantivyDocument = searcher.doc(doc_address)?;
                if let Some(key) = doc.get_first(self.key_field).and_then(|v| v.as_str()) {
                    keys.push(key.to_string());
                }
            }

            if !keys.is_empty() {
                results.push(FieldMatches {
                    field: indexed.label().to_string(),
                    keys,
                });
            }
        }

        Ok(results)
    }
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("library_id", &self.library_id)
            .field("num_docs", &self.num_docs())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Creator, CreatorFieldMode};

    const HEAP: usize = 15_000_000;

    fn article(key: &str, title: &str, last_name: &str, citekey: &str) -> RegularItem {
        let mut item = RegularItem::new(key, 1, "journalArticle")
            .with_field("title", title)
            .with_citekey(citekey);
        item.creators.push(Creator {
            first_name: None,
            last_name: Some(last_name.to_string()),
            field_mode: CreatorFieldMode::FullName,
            creator_type: "author".to_string(),
            order_index: 0,
        });
        item
    }

    fn fields_of(matches: &[FieldMatches]) -> Vec<&str> {
        matches.iter().map(|m| m.field.as_str()).collect()
    }

    #[test]
    fn test_index_and_search() {
        let items = vec![
            article("EINS1905", "On the Electrodynamics of Moving Bodies", "Einstein", "einstein1905"),
            article("BOHR1913", "On the Constitution of Atoms and Molecules", "Bohr", "bohr1913"),
        ];
        let index = SearchIndex::build(1, HEAP, &items).unwrap();
        assert_eq!(index.num_docs(), 2);

        let results = index.search("electrodynamics", 10).unwrap();
        assert_eq!(fields_of(&results), vec!["title"]);
        assert_eq!(results[0].keys, vec!["EINS1905"]);

        let results = index.search("bohr", 10).unwrap();
        assert!(fields_of(&results).contains(&"creators.lastName"));
        assert!(fields_of(&results).contains(&"citekey"));
    }

    #[test]
    fn test_prefix_match() {
        let items = vec![article("EINS1905", "Electrodynamics", "Einstein", "einstein1905")];
        let index = SearchIndex::build(1, HEAP, &items).unwrap();
        let results = index.search("einst", 10).unwrap();
        assert!(results.iter().any(|m| m.keys == vec!["EINS1905"]));
    }

    #[test]
    fn test_staged_changes_visible_after_commit() {
        let index = SearchIndex::in_memory(1, HEAP).unwrap();
        index.add_item(&article("KEY00001", "Quantum Gravity", "Rovelli", "rovelli2004")).unwrap();
        index.add_item(&article("KEY00001", "Loop Quantum Gravity", "Rovelli", "rovelli2004")).unwrap();
        index.add_item(&article("KEY00002", "Spin Networks", "Penrose", "penrose1971")).unwrap();
        assert_eq!(index.num_docs(), 0);

        index.commit().unwrap();
        assert_eq!(index.num_docs(), 2);
        assert_eq!(index.search("loop", 10).unwrap()[0].keys, vec!["KEY00001"]);

        index.delete_item("KEY00001").unwrap();
        assert_eq!(index.search("loop", 10).unwrap().len(), 1);
        index.commit().unwrap();
        assert_eq!(index.num_docs(), 1);
        assert!(index.search("quantum", 10).unwrap().is_empty());
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let items = vec![article("EINS1905", "Electrodynamics", "Einstein", "einstein1905")];
        let index = SearchIndex::build(1, HEAP, &items).unwrap();
        assert!(index.search("   ", 10).unwrap().is_empty());
        assert!(index.search("electrodynamics", 0).unwrap().is_empty());
    }
}
