//! Database models

use serde::{Deserialize, Serialize};

/// Storage row as seen by the tagger
///
/// `id` is assigned by the ingestion stage; `tags` is the only column the
/// tagger writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecipe {
    pub id: i64,
    pub tags: Option<String>,
}

impl StoredRecipe {
    /// Row already carries a non-empty tag string
    pub fn is_tagged(&self) -> bool {
        self.tags.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_tagged() {
        let row = |tags: Option<&str>| StoredRecipe {
            id: 1,
            tags: tags.map(str::to_string),
        };

        assert!(!row(None).is_tagged());
        assert!(!row(Some("")).is_tagged());
        assert!(!row(Some("  ")).is_tagged());
        assert!(row(Some("general")).is_tagged());
        assert!(row(Some("dessert, sweet")).is_tagged());
    }
}
