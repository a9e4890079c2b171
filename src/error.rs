use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Field-level validation messages as returned by the server in a `400` response, e.g.
/// `{"amount": ["Amount must be greater than zero."]}`.
///
/// The map is ordered by field name so that the rendered message is stable.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `message` to the list of messages for `field`.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// The messages reported for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Parses the body of a `400` response. Every value must be either a list of strings or a
    /// single string; anything else means the body is not a field error object and `None` is
    /// returned.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut errors = Self::new();
        for (field, messages) in object {
            match messages {
                serde_json::Value::String(s) => errors.push(field, s),
                serde_json::Value::Array(items) => {
                    // An empty list still records the field.
                    errors.0.entry(field.clone()).or_default();
                    for item in items {
                        errors.push(field, item.as_str()?);
                    }
                }
                _ => return None,
            }
        }
        Some(errors)
    }
}

impl<K, V> FromIterator<(K, V)> for FieldErrors
where
    K: Into<String>,
    V: IntoIterator,
    V::Item: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut errors = Self::new();
        for (field, messages) in iter {
            let field = field.into();
            errors.0.entry(field.clone()).or_default();
            for message in messages {
                errors.push(field.clone(), message);
            }
        }
        errors
    }
}

/// Renders one `field: message, message` line per field.
impl Display for FieldErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let lines: Vec<String> = self
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
            .collect();
        write!(f, "{}", lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_lists() {
        let errors =
            FieldErrors::from_json(&json!({"amount": ["must be positive"], "category": []}))
                .unwrap();
        assert_eq!(errors.get("amount").unwrap(), ["must be positive"]);
        assert_eq!(errors.get("category").unwrap().len(), 0);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_from_json_single_string() {
        let errors = FieldErrors::from_json(&json!({"detail": "Invalid credentials"})).unwrap();
        assert_eq!(errors.get("detail").unwrap(), ["Invalid credentials"]);
    }

    #[test]
    fn test_from_json_rejects_other_shapes() {
        assert!(FieldErrors::from_json(&json!(["a", "b"])).is_none());
        assert!(FieldErrors::from_json(&json!({"amount": 5})).is_none());
        assert!(FieldErrors::from_json(&json!({"amount": [1, 2]})).is_none());
    }

    #[test]
    fn test_display_joins_messages() {
        let errors: FieldErrors = [
            ("name", vec!["This field may not be blank."]),
            ("amount", vec!["must be positive", "too many digits"]),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            errors.to_string(),
            "amount: must be positive, too many digits\nname: This field may not be blank."
        );
    }
}
