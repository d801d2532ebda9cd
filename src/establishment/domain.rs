//! Core establishment domain types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{Error, database_id::DatabaseId};

/// A validated, non-empty establishment name with surrounding whitespace removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Hash)]
pub struct EstablishmentName(String);

impl EstablishmentName {
    /// Create an establishment name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyEstablishmentName] if `name`
    /// is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyEstablishmentName)
        } else {
            Ok(Self(name.to_owned()))
        }
    }
}

impl AsRef<str> for EstablishmentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for EstablishmentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An establishment the user registered explicitly.
///
/// Transactions are linked to establishments by name, not by ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Establishment {
    /// The ID of the establishment.
    pub id: DatabaseId,
    /// The name as stored.
    pub name: String,
}

/// Form data for establishment creation.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EstablishmentFormData {
    /// The name as typed by the user.
    #[serde(default)]
    pub name: String,
}

/// An establishment as listed to the user: either an explicit record, a
/// name only seen on transactions, or both merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstablishmentRow {
    /// The display name.
    pub name: String,
    /// The number of transactions whose name matches.
    #[serde(rename = "lancamentosCount")]
    pub transaction_count: u32,
    /// The explicit record, `None` when the name only appears on transactions.
    #[serde(rename = "estabelecimentoId")]
    pub establishment_id: Option<DatabaseId>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::Error;

    use super::{EstablishmentName, EstablishmentRow};

    #[test]
    fn name_is_trimmed() {
        let name = EstablishmentName::new("  Padaria Pão Quente ").unwrap();

        assert_eq!(name.as_ref(), "Padaria Pão Quente");
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(
            EstablishmentName::new(" \t "),
            Err(Error::EmptyEstablishmentName)
        );
    }

    #[test]
    fn row_serializes_with_original_field_names() {
        let row = EstablishmentRow {
            name: "Mercado".to_owned(),
            transaction_count: 2,
            establishment_id: None,
        };

        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({"name": "Mercado", "lancamentosCount": 2, "estabelecimentoId": null})
        );
    }
}
