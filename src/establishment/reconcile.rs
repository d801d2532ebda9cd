//! Merges the names found on transactions with the explicit establishment records.
//!
//! Two names refer to the same establishment when they are equal after
//! trimming and lowercasing, e.g. "Mercado" and "mercado ".

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

use rusqlite::Connection;

use crate::{
    Error, UserId,
    database_id::DatabaseId,
    establishment::{
        Establishment, EstablishmentRow,
        db::{count_transactions_by_name, get_establishments},
    },
};

/// The key that identifies an establishment name, or `None` for blank names.
pub fn normalize_name_key(name: &str) -> Option<String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Compare names the way a pt-BR reader sorts them: ignoring case and accents.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}

fn collation_key(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

#[derive(Debug, Default)]
struct MergedEstablishment {
    /// Trimmed spellings seen on transactions with their counts.
    variants: HashMap<String, u32>,
    record: Option<(DatabaseId, String)>,
}

impl MergedEstablishment {
    fn transaction_count(&self) -> u32 {
        self.variants.values().sum()
    }

    fn display_name(&self) -> String {
        if let Some((_, name)) = &self.record {
            return name.clone();
        }

        most_used_spelling(&self.variants)
    }
}

/// The spelling with the highest count, ties going to the smallest string.
pub(super) fn most_used_spelling(variants: &HashMap<String, u32>) -> String {
    variants
        .iter()
        .max_by(|(name_a, count_a), (name_b, count_b)| {
            count_a.cmp(count_b).then_with(|| name_b.cmp(name_a))
        })
        .map(|(name, _)| name.clone())
        .unwrap_or_default()
}

/// Merge the transaction counts per name with the explicit records.
///
/// Every distinct name key yields one row. Counts of all spellings of a name
/// are summed. The display name is the record's name when there is a record,
/// otherwise the most used spelling, with ties going to the smallest string.
/// Blank names are ignored. Rows are sorted with [compare_names].
pub fn reconcile_establishments(
    name_counts: &[(String, u32)],
    records: &[Establishment],
) -> Vec<EstablishmentRow> {
    let mut merged: BTreeMap<String, MergedEstablishment> = BTreeMap::new();

    for (name, count) in name_counts {
        let Some(key) = normalize_name_key(name) else {
            continue;
        };

        *merged
            .entry(key)
            .or_default()
            .variants
            .entry(name.trim().to_owned())
            .or_insert(0) += count;
    }

    for record in records {
        let Some(key) = normalize_name_key(&record.name) else {
            continue;
        };

        let entry = merged.entry(key).or_default();

        if entry.record.is_none() {
            entry.record = Some((record.id, record.name.trim().to_owned()));
        }
    }

    let mut rows: Vec<EstablishmentRow> = merged
        .into_values()
        .map(|establishment| EstablishmentRow {
            name: establishment.display_name(),
            transaction_count: establishment.transaction_count(),
            establishment_id: establishment.record.as_ref().map(|(id, _)| *id),
        })
        .collect();

    rows.sort_by(|a, b| compare_names(&a.name, &b.name));

    rows
}

/// List the establishments of `user_id`, see [reconcile_establishments].
pub fn fetch_establishments_for_user(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<EstablishmentRow>, Error> {
    let name_counts = count_transactions_by_name(user_id, connection)?;
    let records = get_establishments(user_id, connection)?;

    Ok(reconcile_establishments(&name_counts, &records))
}
