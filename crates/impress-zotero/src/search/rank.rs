//! Merge per-field matches into one ranked list
//!
//! A key's score sums, over every field it matched, `(distinct keys across
//! all fields) - (position in that field's list)` times the field weight.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::index::FieldMatches;
use crate::domain::RegularItem;

const CREATORS: &str = "creators";

/// Fold creator name fields into one `creators` group
pub fn normalize_field(field: &str) -> &str {
    if field.starts_with(CREATORS) {
        CREATORS
    } else {
        field
    }
}

pub fn field_weight(normalized: &str) -> f64 {
    match normalized {
        "title" => 10.0,
        "citekey" => 8.0,
        CREATORS => 5.0,
        "publicationTitle" | "proceedingsTitle" | "conferenceName" => 2.0,
        "date" | "journalAbbreviation" | "shortTitle" | "series" | "seriesTitle"
        | "publisher" | "university" | "institution" => 1.0,
        other => {
            tracing::warn!("Unknown field in search results: {}", other);
            0.5
        }
    }
}

/// A key with its merged score and the field groups it matched
#[derive(Clone, Debug, PartialEq)]
pub struct RankedKey {
    pub key: String,
    pub score: f64,
    pub fields: BTreeSet<String>,
}

/// Merge field matches, best first; ties keep first-seen order
pub fn rank(matches: &[FieldMatches]) -> Vec<RankedKey> {
    let distinct: BTreeSet<&str> = matches
        .iter()
        .flat_map(|m| m.keys.iter().map(String::as_str))
        .collect();
    let size = distinct.len() as f64;

    let mut order: Vec<RankedKey> = Vec::new();
    let mut slot_of: HashMap<&str, usize> = HashMap::new();

    for field_matches in matches {
        let field = normalize_field(&field_matches.field);
        let weight = field_weight(field);
        for (position, key) in field_matches.keys.iter().enumerate() {
            let score = (size - position as f64) * weight;
            match slot_of.get(key.as_str()) {
                Some(&slot) => {
                    order[slot].score += score;
                    order[slot].fields.insert(field.to_string());
                }
                None => {
                    slot_of.insert(key.as_str(), order.len());
                    order.push(RankedKey {
                        key: key.clone(),
                        score,
                        fields: BTreeSet::from([field.to_string()]),
                    });
                }
            }
        }
    }

    order.sort_by(|a, b| b.score.total_cmp(&a.score));
    order
}

/// A ranked search result
#[derive(Clone, Debug)]
pub struct SearchHit {
    pub item: Arc<RegularItem>,
    /// Merged score; `-1` for unranked listings
    pub score: f64,
    /// Field groups that matched, e.g. `title`, `creators`
    pub fields: Vec<String>,
}

impl SearchHit {
    pub fn unranked(item: Arc<RegularItem>) -> Self {
        Self {
            item,
            score: -1.0,
            fields: Vec::new(),
        }
    }
}
