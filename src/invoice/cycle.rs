//! Credit card invoice cycles.
//!
//! A card's invoice for a period covers the purchases made after the previous
//! month's closing day, up to and including this month's closing day.

use time::Date;

use crate::Period;

/// The earliest and latest closing days a card can have.
const CLOSING_DAY_RANGE: (u8, u8) = (1, 31);

/// The purchase dates covered by one invoice, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceWindow {
    /// The first purchase date on the invoice.
    pub start: Date,
    /// The last purchase date on the invoice, i.e. the closing date.
    pub end: Date,
}

/// Interpret a card's closing day as entered by the user.
///
/// Leading digits are read, so "10 (dez)" is day 10. Missing or unreadable
/// values fall back to day 1, everything else is clamped to 1..=31.
pub fn clamp_closing_day(raw: Option<&str>) -> u8 {
    let (min_day, max_day) = CLOSING_DAY_RANGE;

    let Some(raw) = raw.map(str::trim) else {
        return min_day;
    };

    let (is_negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };

    let digits: String = digits.chars().take_while(char::is_ascii_digit).collect();

    if digits.is_empty() || is_negative {
        return min_day;
    }

    // Anything too long to parse is certainly past the end of the month.
    let day = digits.parse::<u32>().unwrap_or(u32::MAX);

    day.clamp(u32::from(min_day), u32::from(max_day)) as u8
}

/// The purchase dates covered by the invoice of `period` for a card that closes on `closing_day`.
///
/// Closing days past the end of a month close on the month's last day, so
/// the window always holds valid calendar dates and `start <= end`.
pub fn resolve_invoice_window(period: Period, closing_day: u8) -> InvoiceWindow {
    let end = period.clamped_date(closing_day);
    let previous_close = period.previous().clamped_date(closing_day);
    let start = previous_close
        .next_day()
        .expect("the day after a closing date in a four digit year exists");

    InvoiceWindow { start, end }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Period;

    use super::{InvoiceWindow, clamp_closing_day, resolve_invoice_window};

    fn period(raw: &str) -> Period {
        raw.parse().unwrap()
    }

    #[test]
    fn closing_day_defaults_to_one() {
        assert_eq!(clamp_closing_day(None), 1);
        assert_eq!(clamp_closing_day(Some("")), 1);
        assert_eq!(clamp_closing_day(Some("abc")), 1);
        assert_eq!(clamp_closing_day(Some("0")), 1);
        assert_eq!(clamp_closing_day(Some("-5")), 1);
    }

    #[test]
    fn closing_day_is_clamped_to_month_days() {
        assert_eq!(clamp_closing_day(Some("45")), 31);
        assert_eq!(clamp_closing_day(Some("99999999999999999999")), 31);
        assert_eq!(clamp_closing_day(Some(" 7 ")), 7);
        assert_eq!(clamp_closing_day(Some("10 (dez)")), 10);
    }

    #[test]
    fn window_for_leap_february_with_late_closing_day() {
        let got = resolve_invoice_window(period("2024-02"), 31);

        assert_eq!(
            got,
            InvoiceWindow {
                start: date!(2024 - 02 - 01),
                end: date!(2024 - 02 - 29),
            }
        );
    }

    #[test]
    fn window_spans_previous_month() {
        let got = resolve_invoice_window(period("2025-03"), 10);

        assert_eq!(got.start, date!(2025 - 02 - 11));
        assert_eq!(got.end, date!(2025 - 03 - 10));
    }

    #[test]
    fn window_after_short_month_starts_on_first_of_month() {
        let got = resolve_invoice_window(period("2025-03"), 30);

        assert_eq!(got.start, date!(2025 - 03 - 01));
        assert_eq!(got.end, date!(2025 - 03 - 30));
    }

    #[test]
    fn window_crosses_year_boundary() {
        let got = resolve_invoice_window(period("2025-01"), 5);

        assert_eq!(got.start, date!(2024 - 12 - 06));
        assert_eq!(got.end, date!(2025 - 01 - 05));
    }

    #[test]
    fn start_never_after_end() {
        for year in [2023, 2024] {
            for month in 1..=12 {
                let period = Period::new(year, month).unwrap();

                for closing_day in 1..=31 {
                    let window = resolve_invoice_window(period, closing_day);

                    assert!(
                        window.start <= window.end,
                        "{period} closing on {closing_day}: {window:?}"
                    );
                    assert_eq!(Period::containing(window.end), period);
                }
            }
        }
    }
}
