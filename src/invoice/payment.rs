//! Correlates invoice payments with invoices.
//!
//! Paying an invoice records a transaction whose note starts with
//! `AUTO_FATURA:<card id>:<period>`. The latest such payment is when the
//! invoice was paid.

use std::collections::HashMap;

use rusqlite::{Connection, Row};
use time::{Date, OffsetDateTime, macros::format_description};

use crate::{
    Error, UserId,
    invoice::{AUTO_INVOICE_NOTE_LIKE_PATTERN, AUTO_INVOICE_NOTE_PREFIX},
};

/// The card and period an invoice payment note refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaymentMarker {
    /// The card ID as written in the note.
    pub card_id: String,
    /// The period as written in the note.
    pub period: String,
}

/// A transaction that may be an invoice payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRow {
    pub note: Option<String>,
    /// The raw purchase date, which may be missing or malformed.
    pub purchase_date: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Read the invoice payment marker in `note`.
///
/// Returns `None` for notes without the marker prefix, with fewer than three
/// `:` separated segments or with an empty card ID or period.
pub fn parse_payment_marker(note: &str) -> Option<PaymentMarker> {
    if !note.starts_with(AUTO_INVOICE_NOTE_PREFIX) {
        return None;
    }

    let mut segments = note.split(':').skip(1);
    let card_id = segments.next()?;
    let period = segments.next()?;

    if card_id.is_empty() || period.is_empty() {
        return None;
    }

    Some(PaymentMarker {
        card_id: card_id.to_owned(),
        period: period.to_owned(),
    })
}

/// The date an invoice payment happened.
///
/// The purchase date is used when it is a valid date, otherwise the date
/// the transaction was recorded.
fn resolve_payment_date(row: &PaymentRow) -> Date {
    row.purchase_date
        .as_deref()
        .and_then(|raw| raw.get(..10))
        .and_then(|raw| Date::parse(raw, format_description!("[year]-[month]-[day]")).ok())
        .unwrap_or_else(|| row.created_at.date())
}

/// The latest payment date for each invoice referenced by the notes in `rows`.
///
/// Rows without a well formed marker are skipped.
pub fn resolve_payment_dates(
    rows: impl IntoIterator<Item = PaymentRow>,
) -> HashMap<PaymentMarker, Date> {
    let mut payment_dates: HashMap<PaymentMarker, Date> = HashMap::new();

    for row in rows {
        let Some(marker) = row.note.as_deref().and_then(parse_payment_marker) else {
            continue;
        };

        let date = resolve_payment_date(&row);

        payment_dates
            .entry(marker)
            .and_modify(|latest| *latest = (*latest).max(date))
            .or_insert(date);
    }

    payment_dates
}

/// Get the transactions of `user_id` whose note looks like an invoice payment marker.
///
/// The prefix is matched ignoring case, [parse_payment_marker] does the exact check.
pub fn get_payment_rows(user_id: UserId, connection: &Connection) -> Result<Vec<PaymentRow>, Error> {
    connection
        .prepare(
            "SELECT note, purchase_date, created_at FROM \"transaction\"
             WHERE user_id = :user_id AND note LIKE :marker ESCAPE '\\'
             ORDER BY id ASC",
        )?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id,
                ":marker": AUTO_INVOICE_NOTE_LIKE_PATTERN,
            },
            map_row,
        )?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

fn map_row(row: &Row) -> Result<PaymentRow, rusqlite::Error> {
    Ok(PaymentRow {
        note: row.get(0)?,
        purchase_date: row.get(1)?,
        created_at: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::{date, datetime};

    use crate::{Transaction, UserId, create_transaction, db::initialize};

    use super::{
        PaymentMarker, PaymentRow, get_payment_rows, parse_payment_marker, resolve_payment_dates,
    };

    fn marker(card_id: &str, period: &str) -> PaymentMarker {
        PaymentMarker {
            card_id: card_id.to_owned(),
            period: period.to_owned(),
        }
    }

    fn row(note: &str, purchase_date: Option<&str>) -> PaymentRow {
        PaymentRow {
            note: Some(note.to_owned()),
            purchase_date: purchase_date.map(str::to_owned),
            created_at: datetime!(2025 - 04 - 20 12:00 UTC),
        }
    }

    #[test]
    fn parses_marker_with_extra_segments() {
        assert_eq!(
            parse_payment_marker("AUTO_FATURA:12:2025-03:conta corrente"),
            Some(marker("12", "2025-03"))
        );
    }

    #[test]
    fn malformed_markers_are_skipped() {
        for note in [
            "Pagamento de fatura",
            "AUTO_FATURA:12",
            "AUTO_FATURA::2025-03",
            "AUTO_FATURA:12:",
            "auto_fatura:12:2025-03",
            " AUTO_FATURA:12:2025-03",
        ] {
            assert_eq!(parse_payment_marker(note), None, "note {note:?}");
        }
    }

    #[test]
    fn latest_payment_date_wins() {
        let rows = vec![
            row("AUTO_FATURA:1:2025-03", Some("2025-04-05")),
            row("AUTO_FATURA:1:2025-03", Some("2025-04-10")),
            row("AUTO_FATURA:1:2025-03", Some("2025-04-01")),
            row("AUTO_FATURA:2:2025-03", Some("2025-04-02")),
        ];

        let got = resolve_payment_dates(rows);

        assert_eq!(got.len(), 2);
        assert_eq!(got[&marker("1", "2025-03")], date!(2025 - 04 - 10));
        assert_eq!(got[&marker("2", "2025-03")], date!(2025 - 04 - 02));
    }

    #[test]
    fn invalid_purchase_date_falls_back_to_creation_date() {
        let rows = vec![
            row("AUTO_FATURA:1:2025-03", Some("not a date")),
            row("AUTO_FATURA:2:2025-03", None),
        ];

        let got = resolve_payment_dates(rows);

        assert_eq!(got[&marker("1", "2025-03")], date!(2025 - 04 - 20));
        assert_eq!(got[&marker("2", "2025-03")], date!(2025 - 04 - 20));
    }

    #[test]
    fn malformed_rows_do_not_contribute() {
        let rows = vec![row("AUTO_FATURA:1", Some("2025-04-05"))];

        assert!(resolve_payment_dates(rows).is_empty());
    }

    #[test]
    fn payment_rows_match_prefix_ignoring_case() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = UserId::new(1);
        for note in [
            Some("AUTO_FATURA:1:2025-03"),
            Some("auto_fatura:1:2025-03"),
            Some("AUTOXFATURA:1:2025-03"),
            Some("Pagamento"),
            None,
        ] {
            create_transaction(
                user_id,
                Transaction::build(-10.0, date!(2025 - 04 - 05), "Fatura").note(note),
                &conn,
            )
            .unwrap();
        }

        let got = get_payment_rows(user_id, &conn).unwrap();

        let notes: Vec<_> = got.iter().filter_map(|row| row.note.as_deref()).collect();
        assert_eq!(notes, vec!["AUTO_FATURA:1:2025-03", "auto_fatura:1:2025-03"]);
        assert_eq!(got[0].purchase_date.as_deref(), Some("2025-04-05"));
    }
}
