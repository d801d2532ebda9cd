//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::DatabaseId};

/// Whether a category groups expenses or income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryKind {
    /// Money spent, stored as "despesa".
    #[serde(rename = "despesa")]
    Expense,
    /// Money earned, stored as "receita".
    #[serde(rename = "receita")]
    Income,
}

impl CategoryKind {
    /// The name of the kind as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Expense => "despesa",
            CategoryKind::Income => "receita",
        }
    }
}

impl Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for CategoryKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CategoryKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "despesa" => Ok(CategoryKind::Expense),
            "receita" => Ok(CategoryKind::Income),
            other => Err(FromSqlError::Other(
                format!("unknown category kind \"{other}\"").into(),
            )),
        }
    }
}

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is empty or whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user defined group of transactions, e.g. "Mercado" or "Salário".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    pub id: DatabaseId,
    /// The display name of the category.
    pub name: String,
    /// The name of the icon shown next to the category.
    pub icon: Option<String>,
    /// Whether the category is for expenses or income.
    pub kind: CategoryKind,
    /// The monthly budget for the category, if one was set.
    pub budget_amount: Option<f64>,
}

/// The data needed to create a [Category].
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    /// The display name of the category.
    pub name: CategoryName,
    /// The name of the icon shown next to the category.
    pub icon: Option<String>,
    /// Whether the category is for expenses or income.
    pub kind: CategoryKind,
    /// The monthly budget for the category.
    pub budget_amount: Option<f64>,
}

impl NewCategory {
    /// A category of `kind` without an icon or budget.
    pub fn new(name: CategoryName, kind: CategoryKind) -> Self {
        Self {
            name,
            icon: None,
            kind,
            budget_amount: None,
        }
    }

    /// Set the icon for the category.
    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_owned());
        self
    }

    /// Set the monthly budget for the category.
    ///
    /// # Errors
    ///
    /// Returns [Error::NegativeBudget] if `budget_amount` is less than zero.
    pub fn budget_amount(mut self, budget_amount: Option<f64>) -> Result<Self, Error> {
        if let Some(amount) = budget_amount
            && amount < 0.0
        {
            return Err(Error::NegativeBudget(amount));
        }

        self.budget_amount = budget_amount;
        Ok(self)
    }
}
