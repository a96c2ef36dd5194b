use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use regex::Regex;

use crate::formats::Timestamp;

pub const DAY_IN_MILLISECONDS: i64 = 86_400_000;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?[0-9]+(?:\.[0-9]+)?").expect("number pattern is valid")
});

/// Every number embedded in `text`, in order of appearance.
///
/// Returns `None` (never an empty vector) when the text holds no number at all.
pub fn extract_numbers(text: &str) -> Option<Vec<f64>> {
    let numbers = NUMBER_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect::<Vec<_>>();
    if numbers.is_empty() {
        return None;
    }
    Some(numbers)
}

/// Shifts `base` by `day_offset` days using plain millisecond arithmetic.
///
/// Fractional days are truncated to whole milliseconds. Results outside the
/// representable range saturate.
pub fn date_offset(base: NaiveDateTime, day_offset: f64) -> NaiveDateTime {
    let millis = (day_offset * DAY_IN_MILLISECONDS as f64).trunc();
    let delta = TimeDelta::try_milliseconds(millis as i64).unwrap_or(if millis < 0.0 {
        TimeDelta::MIN
    } else {
        TimeDelta::MAX
    });
    base.checked_add_signed(delta).unwrap_or(if millis < 0.0 {
        NaiveDateTime::MIN
    } else {
        NaiveDateTime::MAX
    })
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

pub fn parse_timestamp(timestamp: &Timestamp) -> Option<NaiveDateTime> {
    match timestamp {
        Timestamp::Millis(millis) => from_fractional_millis(*millis),
        Timestamp::Text(text) => parse_timestamp_text(text),
    }
}

fn parse_timestamp_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    text.parse::<i64>().ok().and_then(from_epoch_millis)
}

fn from_fractional_millis(millis: f64) -> Option<NaiveDateTime> {
    if !millis.is_finite() {
        return None;
    }
    from_epoch_millis(millis.trunc() as i64)
}

fn from_epoch_millis(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn extract_numbers_finds_decimal_score() {
        assert_eq!(extract_numbers("score: 8.5"), Some(vec![8.5]));
    }

    #[test]
    fn extract_numbers_returns_none_without_digits() {
        assert_eq!(extract_numbers("no numbers"), None);
        assert_eq!(extract_numbers(""), None);
    }

    #[test]
    fn extract_numbers_keeps_order_and_sign() {
        assert_eq!(
            extract_numbers("最近更新 2023年12月05日, delta -3"),
            Some(vec![2023.0, 12.0, 5.0, -3.0])
        );
        assert_eq!(
            extract_numbers("2023-05-01"),
            Some(vec![2023.0, -5.0, -1.0])
        );
    }

    #[test]
    fn extract_numbers_ignores_non_ascii_digits() {
        assert_eq!(extract_numbers("第١٢话"), None);
    }

    #[test]
    fn date_offset_crosses_month_boundary() {
        assert_eq!(date_offset(ymd(2024, 3, 1), -30.0), ymd(2024, 1, 31));
    }

    #[test]
    fn date_offset_crosses_year_boundary_forward() {
        assert_eq!(date_offset(ymd(2023, 12, 20), 30.0), ymd(2024, 1, 19));
    }

    #[test]
    fn date_offset_truncates_fractional_days() {
        let shifted = date_offset(ymd(2024, 3, 1), 0.5);
        assert_eq!(shifted, ymd(2024, 3, 1) + TimeDelta::hours(12));
    }

    #[test]
    fn date_offset_saturates() {
        assert_eq!(date_offset(ymd(2024, 3, 1), -1e300), NaiveDateTime::MIN);
    }

    #[test]
    fn parse_timestamp_accepts_common_shapes() {
        assert_eq!(
            parse_timestamp(&Timestamp::Text("2023-05-01".to_owned())),
            Some(ymd(2023, 5, 1))
        );
        assert_eq!(
            parse_timestamp(&Timestamp::Text("2023/05/01 12:30:00".to_owned())),
            Some(ymd(2023, 5, 1) + TimeDelta::minutes(750))
        );
        assert_eq!(
            parse_timestamp(&Timestamp::Text("2023-05-01T08:00:00+08:00".to_owned())),
            Some(ymd(2023, 5, 1))
        );
        assert_eq!(
            parse_timestamp(&Timestamp::Millis(1_682_899_200_000.0)),
            Some(ymd(2023, 5, 1))
        );
        assert_eq!(
            parse_timestamp(&Timestamp::Millis(1_682_899_200_000.9)),
            Some(ymd(2023, 5, 1))
        );
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(&Timestamp::Text("yesterday".to_owned())), None);
        assert_eq!(parse_timestamp(&Timestamp::Text("  ".to_owned())), None);
        assert_eq!(parse_timestamp(&Timestamp::Millis(f64::NAN)), None);
    }
}
