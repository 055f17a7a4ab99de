use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

use super::error::{Result, SyncError};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

// japanese domestic numbers: 10 or 11 digits with a leading zero
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0\d{9,10}$").expect("valid phone pattern"));

// layouts tried before falling back to the free-form parser
const DATE_TIME_LAYOUTS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];
const DATE_LAYOUTS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

// remove currency symbol and thousands separators, e.g. "¥1,000" -> "1000"
pub fn clean_amount(amount: &str) -> String {
    amount.replace(['¥', ','], "").trim().to_string()
}

// convert a scan date to epoch milliseconds
// empty text means "now", japanese 年/月/日 glyphs are accepted
pub fn date_to_timestamp(text: &str) -> Result<i64> {
    if text.trim().is_empty() {
        return Ok(Local::now().timestamp_millis());
    }

    let normalized = text
        .replace('年', "-")
        .replace('月', "-")
        .replace('日', " ")
        .split_whitespace()
        .join(" ");

    parse_local(&normalized)
        .map(|date| date.timestamp_millis())
        .ok_or_else(|| SyncError::InvalidDateFormat(text.to_string()))
}

// naive values are read in the local timezone, a bare date means local midnight
fn parse_local(text: &str) -> Option<DateTime<Local>> {
    let naive = DATE_TIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
        .or_else(|| {
            DATE_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(text, layout).ok())
                .map(|date| date.and_time(NaiveTime::default()))
        });

    match naive {
        Some(naive) => Local.from_local_datetime(&naive).earliest(),
        None => dateparser::parse_with(text, &Local, NaiveTime::default())
            .ok()
            .map(|utc| utc.with_timezone(&Local)),
    }
}

pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    if phone.is_empty() {
        return false;
    }
    let digits: String = phone
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect();
    PHONE_RE.is_match(&digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn local(millis: i64) -> DateTime<Local> {
        Local.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn clean_amount_strips_yen_and_commas() {
        assert_eq!(clean_amount("¥1000"), "1000");
        assert_eq!(clean_amount("1,000,000"), "1000000");
        assert_eq!(clean_amount("¥1,234,567"), "1234567");
        assert_eq!(clean_amount("  ¥1,000  "), "1000");
        assert_eq!(clean_amount(""), "");
    }

    #[test]
    fn clean_amount_keeps_everything_else() {
        assert_eq!(clean_amount("¥1,000.50 JPY"), "1000.50 JPY");
        assert_eq!(clean_amount("$12"), "$12");
    }

    #[test]
    fn empty_date_is_now() {
        let before = Local::now().timestamp_millis();
        let stamp = date_to_timestamp("").unwrap();
        let blank = date_to_timestamp("   ").unwrap();
        let after = Local::now().timestamp_millis();

        assert!(before <= stamp && stamp <= after);
        assert!(before <= blank && blank <= after);
    }

    #[test]
    fn iso_date() {
        let date = local(date_to_timestamp("2024-01-15").unwrap());
        assert_eq!((date.year(), date.month(), date.day()), (2024, 1, 15));
        assert_eq!((date.hour(), date.minute()), (0, 0));
    }

    #[test]
    fn japanese_date_matches_iso_date() {
        let japanese = date_to_timestamp("2024年1月15日").unwrap();
        let iso = date_to_timestamp("2024-01-15").unwrap();

        assert_eq!(local(japanese).date_naive(), local(iso).date_naive());
        assert_eq!(japanese, iso);
    }

    #[test]
    fn slash_date_with_time() {
        let date = local(date_to_timestamp("2024/01/15 10:30").unwrap());
        assert_eq!((date.year(), date.month(), date.day()), (2024, 1, 15));
        assert_eq!((date.hour(), date.minute()), (10, 30));
    }

    #[test]
    fn japanese_date_with_time() {
        let date = local(date_to_timestamp("2024年3月5日 09:15:30").unwrap());
        assert_eq!((date.year(), date.month(), date.day()), (2024, 3, 5));
        assert_eq!((date.hour(), date.minute(), date.second()), (9, 15, 30));
    }

    #[test]
    fn rfc3339_goes_through_free_form_parser() {
        let stamp = date_to_timestamp("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(stamp, 1_705_314_600_000);
    }

    #[test]
    fn invalid_date_is_rejected() {
        match date_to_timestamp("invalid-date") {
            Err(SyncError::InvalidDateFormat(text)) => assert_eq!(text, "invalid-date"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("test@example.com"));
        assert!(is_valid_email("user.name@domain.co.jp"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("invalid"));
        assert!(!is_valid_email("invalid@"));
        assert!(!is_valid_email("user@domain"));
        assert!(!is_valid_email("@domain.com"));
        assert!(!is_valid_email("user name@domain.com"));
    }

    #[test]
    fn phone_validation() {
        assert!(is_valid_phone("03-1234-5678"));
        assert!(is_valid_phone("090-1234-5678"));
        assert!(is_valid_phone("09012345678"));
        assert!(is_valid_phone("090 1234 5678"));
        assert!(is_valid_phone("0-9-0-1-2-3-4-5-6-7-8"));

        assert!(!is_valid_phone(""));
        assert!(!is_valid_phone("1234"));
        assert!(!is_valid_phone("12345678901234"));
        assert!(!is_valid_phone("19012345678"));
    }
}
