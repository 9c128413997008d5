//! Tag representation

use serde::{Deserialize, Serialize};

/// A tag on an item or annotation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    /// 0 = manual, 1 = automatic
    pub tag_type: i32,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag_type: 0,
        }
    }

    pub fn is_automatic(&self) -> bool {
        self.tag_type == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_new() {
        let tag = Tag::new("to-read");
        assert_eq!(tag.name, "to-read");
        assert!(!tag.is_automatic());
    }
}
