//! Creator (author, editor, ...) of a regular item

use serde::{Deserialize, Serialize};

/// How the creator's name is stored remotely
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreatorFieldMode {
    /// Separate first and last name
    FullName,
    /// Single-field name (institutions, mononyms), kept in `last_name`
    NameOnly,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub field_mode: CreatorFieldMode,
    /// Role, e.g. "author", "editor"
    pub creator_type: String,
    /// Position in the item's creator list
    pub order_index: usize,
}

impl Creator {
    /// Format as "First Last" for display
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (None, Some(last)) => last.clone(),
            (Some(first), None) => first.clone(),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let full = Creator {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            field_mode: CreatorFieldMode::FullName,
            creator_type: "author".to_string(),
            order_index: 0,
        };
        assert_eq!(full.display_name(), "Ada Lovelace");

        let single = Creator {
            first_name: None,
            last_name: Some("CERN".to_string()),
            field_mode: CreatorFieldMode::NameOnly,
            creator_type: "author".to_string(),
            order_index: 1,
        };
        assert_eq!(single.display_name(), "CERN");
    }
}
