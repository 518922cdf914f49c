//! Category domain types and payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lumina_core::CategoryId;

use super::{ValidationError, non_blank};

/// A catalog category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category fields as sent by clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryFields {
    #[serde(default, alias = "nombre")]
    pub name: Option<String>,
    #[serde(default, alias = "descripcion")]
    pub description: Option<String>,
}

impl CategoryFields {
    /// Validate a create payload into `(name, description)`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when `name` is missing or blank.
    pub fn into_new(self) -> Result<(String, String), ValidationError> {
        let name = non_blank(self.name).ok_or_else(|| ValidationError::new("name is required"))?;
        Ok((name, self.description.unwrap_or_default().trim().to_owned()))
    }

    /// Validate an update payload.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when `name` is present but blank.
    pub fn into_changes(self) -> Result<(Option<String>, Option<String>), ValidationError> {
        let name = match self.name {
            Some(name) => Some(
                non_blank(Some(name)).ok_or_else(|| ValidationError::new("name cannot be empty"))?,
            ),
            None => None,
        };
        Ok((name, self.description.map(|d| d.trim().to_owned())))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_name() {
        let fields: CategoryFields = serde_json::from_str(r#"{"descripcion":"Plata"}"#).unwrap();
        assert_eq!(
            fields.into_new().unwrap_err(),
            ValidationError::new("name is required")
        );
    }

    #[test]
    fn test_alias_and_trim() {
        let fields: CategoryFields =
            serde_json::from_str(r#"{"nombre":" Anillos ","descripcion":"Oro"}"#).unwrap();
        assert_eq!(
            fields.into_new().unwrap(),
            ("Anillos".to_string(), "Oro".to_string())
        );
    }
}
