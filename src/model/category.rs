use serde::{Deserialize, Serialize};

/// A user-defined label that outcomes are filed under. The server also returns the owning user's
/// id, which is ignored.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

impl Category {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignores_user_field() {
        let category: Category =
            serde_json::from_str(r#"{"id": 4, "name": "Rent", "user": 12}"#).unwrap();
        assert_eq!(category, Category::new(4, "Rent"));
    }
}
