//! Calendar year-month periods and parsing of the `periodo` query parameter.
//!
//! Every report is scoped to a [Period]. Requests name it with a `YYYY-MM`
//! token; anything missing or malformed falls back to the current month.

use std::{fmt::Display, ops::RangeInclusive, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use time::{Date, Month};

use crate::{Error, timezone::local_today};

/// The name of the query parameter that selects the period.
pub const PERIOD_QUERY_PARAM: &str = "periodo";

/// A calendar month, written as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    year: i32,
    month: Month,
}

impl Period {
    /// Create a period from a year and a month number (1-12).
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidPeriod] if `month` is not between 1 and 12 or
    /// `year` cannot be written with four digits.
    pub fn new(year: i32, month: u8) -> Result<Self, Error> {
        let invalid = || Error::InvalidPeriod(format!("{year:04}-{month:02}"));

        if !(0..=9999).contains(&year) {
            return Err(invalid());
        }

        let month = Month::try_from(month).map_err(|_| invalid())?;

        Ok(Self { year, month })
    }

    /// The period that contains `date`.
    pub fn containing(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        self.month
    }

    /// The calendar month immediately before this one.
    pub fn previous(&self) -> Self {
        match self.month {
            Month::January => Self {
                year: self.year - 1,
                month: Month::December,
            },
            month => Self {
                year: self.year,
                month: month.previous(),
            },
        }
    }

    /// The calendar month immediately after this one.
    pub fn next(&self) -> Self {
        match self.month {
            Month::December => Self {
                year: self.year + 1,
                month: Month::January,
            },
            month => Self {
                year: self.year,
                month: month.next(),
            },
        }
    }

    /// The number of days in this month.
    pub fn days_in_month(&self) -> u8 {
        last_day_of_month(self.year, self.month)
    }

    /// The date of `day` in this month, clamped to the last day of the month.
    pub fn clamped_date(&self, day: u8) -> Date {
        let day = day.clamp(1, self.days_in_month());

        Date::from_calendar_date(self.year, self.month, day)
            .expect("day is clamped to the days in the month")
    }

    pub fn first_day(&self) -> Date {
        self.clamped_date(1)
    }

    pub fn last_day(&self) -> Date {
        self.clamped_date(self.days_in_month())
    }

    /// All the dates of this month.
    pub fn date_range(&self) -> RangeInclusive<Date> {
        self.first_day()..=self.last_day()
    }

    /// A label for headings, e.g. "março de 2025".
    pub fn label(&self) -> String {
        format!("{} de {}", month_name(self.month), self.year)
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidPeriod(s.to_owned());

        let bytes = s.as_bytes();
        let is_canonical = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);

        if !is_canonical {
            return Err(invalid());
        }

        let year = s[..4].parse::<i32>().map_err(|_| invalid())?;
        let month = s[5..].parse::<u8>().map_err(|_| invalid())?;

        Period::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// The outcome of parsing a `periodo` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodParam {
    /// The period to report on.
    pub period: Period,
    /// Whether the parameter was missing or invalid and the current month was used instead.
    #[serde(skip)]
    pub used_fallback: bool,
}

/// Parse a raw `periodo` parameter, falling back to the month of `today`.
///
/// Missing, empty and malformed values never cause an error; they select
/// the current month and set [PeriodParam::used_fallback].
pub fn parse_period_param(raw: Option<&str>, today: Date) -> PeriodParam {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => match raw.parse() {
            Ok(period) => PeriodParam {
                period,
                used_fallback: false,
            },
            Err(error) => {
                tracing::debug!("falling back to the current month: {error}");
                PeriodParam {
                    period: Period::containing(today),
                    used_fallback: true,
                }
            }
        },
        None => PeriodParam {
            period: Period::containing(today),
            used_fallback: true,
        },
    }
}

/// Get the first value of `key` from URL query pairs.
///
/// Query strings may repeat a key (`?periodo=a&periodo=b`); only the first value is used.
pub fn first_query_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

/// Resolve the period selected by the `periodo` value in URL query `pairs`.
///
/// # Errors
///
/// Returns [Error::InvalidTimezoneError] if `local_timezone` is not a known time zone.
pub fn period_from_query(
    pairs: &[(String, String)],
    local_timezone: &str,
) -> Result<PeriodParam, Error> {
    let today = local_today(local_timezone)?;

    Ok(parse_period_param(
        first_query_value(pairs, PERIOD_QUERY_PARAM),
        today,
    ))
}

/// A JSON report tagged with the period it covers.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodReport<T> {
    /// The period the report covers.
    pub period: Period,
    /// The report fields, inlined next to `period`.
    #[serde(flatten)]
    pub report: T,
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

fn month_name(month: Month) -> &'static str {
    match month {
        Month::January => "janeiro",
        Month::February => "fevereiro",
        Month::March => "março",
        Month::April => "abril",
        Month::May => "maio",
        Month::June => "junho",
        Month::July => "julho",
        Month::August => "agosto",
        Month::September => "setembro",
        Month::October => "outubro",
        Month::November => "novembro",
        Month::December => "dezembro",
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Error;

    use super::{Period, first_query_value, parse_period_param};

    fn period(raw: &str) -> Period {
        raw.parse().expect("valid test period")
    }

    #[test]
    fn parses_canonical_period() {
        let got = parse_period_param(Some("2024-02"), date!(2025 - 06 - 15));

        assert_eq!(got.period, period("2024-02"));
        assert!(!got.used_fallback);
    }

    #[test]
    fn missing_param_falls_back_to_current_month() {
        let today = date!(2025 - 06 - 15);

        let got = parse_period_param(None, today);

        assert_eq!(got.period, period("2025-06"));
        assert!(got.used_fallback);
    }

    #[test]
    fn missing_and_empty_params_agree() {
        let today = date!(2025 - 01 - 31);

        assert_eq!(
            parse_period_param(None, today),
            parse_period_param(Some(""), today)
        );
    }

    #[test]
    fn malformed_params_fall_back_to_current_month() {
        let today = date!(2025 - 06 - 15);

        for raw in ["2024-13", "2024-00", "24-01", "2024-1", "2024/01", "abcd-ef", "2024-01-01"] {
            let got = parse_period_param(Some(raw), today);

            assert_eq!(got.period, period("2025-06"), "input {raw:?}");
            assert!(got.used_fallback, "input {raw:?}");
        }
    }

    #[test]
    fn from_str_rejects_invalid_month() {
        assert_eq!(
            "2024-13".parse::<Period>(),
            Err(Error::InvalidPeriod("2024-13".to_owned()))
        );
    }

    #[test]
    fn display_pads_year_and_month() {
        assert_eq!(Period::new(987, 3).unwrap().to_string(), "0987-03");
    }

    #[test]
    fn previous_of_january_is_december_of_last_year() {
        assert_eq!(period("2025-01").previous(), period("2024-12"));
        assert_eq!(period("2025-07").previous(), period("2025-06"));
    }

    #[test]
    fn next_of_december_is_january_of_next_year() {
        assert_eq!(period("2024-12").next(), period("2025-01"));
    }

    #[test]
    fn date_range_covers_leap_february() {
        let range = period("2024-02").date_range();

        assert_eq!(*range.start(), date!(2024 - 02 - 01));
        assert_eq!(*range.end(), date!(2024 - 02 - 29));
    }

    #[test]
    fn clamped_date_stays_in_month() {
        assert_eq!(period("2023-02").clamped_date(31), date!(2023 - 02 - 28));
        assert_eq!(period("2023-04").clamped_date(0), date!(2023 - 04 - 01));
    }

    #[test]
    fn label_uses_portuguese_month_name() {
        assert_eq!(period("2025-03").label(), "março de 2025");
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&period("2025-03")).unwrap();

        assert_eq!(json, "\"2025-03\"");
        assert_eq!(
            serde_json::from_str::<Period>(&json).unwrap(),
            period("2025-03")
        );
    }

    #[test]
    fn first_query_value_picks_first_of_repeated_keys() {
        let pairs = vec![
            ("periodo".to_owned(), "2024-01".to_owned()),
            ("periodo".to_owned(), "2024-02".to_owned()),
        ];

        assert_eq!(first_query_value(&pairs, "periodo"), Some("2024-01"));
        assert_eq!(first_query_value(&pairs, "outro"), None);
    }
}
