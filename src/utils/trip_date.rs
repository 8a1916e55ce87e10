//! Trip dates as typed on the booking form: `<day> <month> <year>` with
//! Indonesian month abbreviations, e.g. `02 Jun 2026` or `17 Agustus 2026`.

use chrono::NaiveDate;
use thiserror::Error;

/// Three-letter month prefixes, index = month - 1
const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "mei", "jun", "jul", "agu", "sep", "okt", "nov", "des",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TripDateError {
    #[error("expected '<day> <month> <year>', got '{0}'")]
    Format(String),
    #[error("unknown month '{0}'")]
    Month(String),
    #[error("invalid day '{0}'")]
    Day(String),
    #[error("invalid year '{0}'")]
    Year(String),
    #[error("'{0}' is not a calendar date")]
    NotADate(String),
}

/// Zero-based month index for a month word, matched on its first three
/// characters, case-insensitively.
pub fn month_index(word: &str) -> Option<usize> {
    let prefix: String = word.chars().take(3).flat_map(char::to_lowercase).collect();
    if prefix.chars().count() < 3 {
        return None;
    }
    MONTHS.iter().position(|m| *m == prefix)
}

pub fn parse_trip_date(input: &str) -> Result<NaiveDate, TripDateError> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let [day, month, year] = tokens.as_slice() else {
        return Err(TripDateError::Format(input.trim().to_string()));
    };

    let day: u32 = day
        .parse()
        .map_err(|_| TripDateError::Day(day.to_string()))?;
    let month = month_index(month).ok_or_else(|| TripDateError::Month(month.to_string()))?;
    if year.len() != 4 {
        return Err(TripDateError::Year(year.to_string()));
    }
    let year: i32 = year
        .parse()
        .map_err(|_| TripDateError::Year(year.to_string()))?;

    NaiveDate::from_ymd_opt(year, month as u32 + 1, day)
        .ok_or_else(|| TripDateError::NotADate(input.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_short_and_long_month_names() {
        assert_eq!(
            parse_trip_date("02 Jun 2026"),
            Ok(NaiveDate::from_ymd_opt(2026, 6, 2).unwrap())
        );
        assert_eq!(
            parse_trip_date("17 Agustus 2026"),
            Ok(NaiveDate::from_ymd_opt(2026, 8, 17).unwrap())
        );
        assert_eq!(
            parse_trip_date("  31   DES  2026 "),
            Ok(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap())
        );
    }

    #[test]
    fn test_month_index_uses_indonesian_abbreviations() {
        assert_eq!(month_index("mei"), Some(4));
        assert_eq!(month_index("Okt"), Some(9));
        assert_eq!(month_index("may"), None);
        assert_eq!(month_index("ju"), None);
    }

    #[test]
    fn test_iso_dates_are_rejected() {
        assert_eq!(
            parse_trip_date("2026-06-02"),
            Err(TripDateError::Format("2026-06-02".to_string()))
        );
        assert!(parse_trip_date("").is_err());
        assert!(parse_trip_date("02 Jun 2026 extra").is_err());
    }

    #[test]
    fn test_rejects_impossible_dates() {
        assert_eq!(
            parse_trip_date("30 Feb 2026"),
            Err(TripDateError::NotADate("30 Feb 2026".to_string()))
        );
        assert!(matches!(parse_trip_date("xx Jun 2026"), Err(TripDateError::Day(_))));
        assert!(matches!(parse_trip_date("02 Jun 26"), Err(TripDateError::Year(_))));
    }
}
