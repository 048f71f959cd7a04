use chrono::{Local, NaiveDate};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::models::ExpiryCheck;

lazy_static! {
    // Maltese and English expiry labels immediately followed by a date
    // token. Ordered; first match wins.
    static ref LABELED_EXPIRY_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)valida\s+sa\s*:?\s*(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4})").unwrap(),
        Regex::new(r"(?i)valid\s+sa\s*:?\s*(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4})").unwrap(),
        Regex::new(r"(?i)valid\s+till\s*:?\s*(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4})").unwrap(),
        Regex::new(r"(?i)expiry\s*(?:date)?\s*:?\s*(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4})").unwrap(),
        Regex::new(r"(?i)expires?\s*(?:on)?\s*:?\s*(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4})").unwrap(),
    ];

    // A line that talks about validity or expiry, even if OCR mangled the
    // date off to a nearby line.
    static ref EXPIRY_LINE_HINT: Regex =
        Regex::new(r"(?i)valida\s+sa|valid\s+sa|valid\s+till|expir").unwrap();

    // Any date-shaped token.
    static ref DATE_TOKEN: Regex =
        Regex::new(r"\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4}").unwrap();

    // Strictly DD/MM/YYYY-shaped tokens for the last-resort document sweep.
    static ref FULL_DATE_TOKEN: Regex =
        Regex::new(r"\d{2}[/.\-]\d{2}[/.\-]\d{4}").unwrap();
}

/// How many lines below an expiry label are scanned for a stray date token.
const LABEL_LOOKAHEAD_LINES: usize = 2;

/// Two-digit years below this pivot are 20xx, the rest 19xx.
const CENTURY_PIVOT: u32 = 50;

/// Extracts and evaluates the expiry date of a license document from OCR
/// text. Dates follow the Malta day/month/year convention.
pub struct ExpiryExtractor;

impl ExpiryExtractor {
    /// Checks the document text against today's date (local timezone, time
    /// of day ignored). A document with no recognizable date fails open:
    /// `is_expired` stays false so an OCR miss never blocks an upload.
    pub fn check(text: &str) -> ExpiryCheck {
        Self::check_at(text, Local::now().naive_local().date())
    }

    /// Same as [`check`](Self::check) with an explicit "today".
    pub fn check_at(text: &str, today: NaiveDate) -> ExpiryCheck {
        let token = Self::find_date_token(text);

        let token = match token {
            Some(t) => t,
            None => return ExpiryCheck::no_date(),
        };

        match Self::parse_date(&token) {
            Some(date) => ExpiryCheck {
                // Strictly before today: a license expiring today is still
                // valid for the whole day.
                is_expired: date < today,
                expiry_date: Some(date.format("%Y-%m-%d").to_string()),
                has_date: true,
            },
            None => ExpiryCheck::no_date(),
        }
    }

    /// Three-tier search for the expiry date token; first success wins.
    fn find_date_token(text: &str) -> Option<String> {
        // Tier 1: a label with the date right next to it.
        for pattern in LABELED_EXPIRY_PATTERNS.iter() {
            if let Some(captures) = pattern.captures(text) {
                let token = captures.get(1)?.as_str().to_string();
                debug!("expiry date found via labeled pattern: {}", token);
                return Some(token);
            }
        }

        // Tier 2: a label on one line, the date on the same line or within
        // the next couple of lines (OCR often splits them).
        let lines: Vec<&str> = text.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            if !EXPIRY_LINE_HINT.is_match(line) {
                continue;
            }
            for candidate in lines.iter().skip(i).take(LABEL_LOOKAHEAD_LINES + 1) {
                if let Some(m) = DATE_TOKEN.find(candidate) {
                    debug!("expiry date found near label line: {}", m.as_str());
                    return Some(m.as_str().to_string());
                }
            }
        }

        // Tier 3: take the last fully-formed date in the document. Expiry
        // typically appears after the issue date.
        FULL_DATE_TOKEN
            .find_iter(text)
            .last()
            .map(|m| m.as_str().to_string())
    }

    /// Parses a `DD/MM/YYYY`-like token (separators `/`, `.` or `-`, two or
    /// four digit year) as day/month/year.
    fn parse_date(token: &str) -> Option<NaiveDate> {
        let parts: Vec<&str> = token.split(['/', '.', '-']).collect();
        if parts.len() != 3 {
            return None;
        }

        let day = parts[0].parse::<u32>().ok()?;
        let month = parts[1].parse::<u32>().ok()?;
        let mut year = parts[2].parse::<u32>().ok()?;

        if parts[2].len() <= 2 {
            year = if year < CENTURY_PIVOT { 2000 + year } else { 1900 + year };
        }

        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            return None;
        }

        NaiveDate::from_ymd_opt(year as i32, month, day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_valida_sa_future_date() {
        let check = ExpiryExtractor::check_at("Valida sa: 15/06/2025", today());
        assert_eq!(
            check,
            ExpiryCheck {
                is_expired: false,
                expiry_date: Some("2025-06-15".to_string()),
                has_date: true,
            }
        );
    }

    #[test]
    fn test_valida_sa_past_date() {
        let check = ExpiryExtractor::check_at("Valida sa: 15/06/2020", today());
        assert!(check.is_expired);
        assert!(check.has_date);
        assert_eq!(check.expiry_date.as_deref(), Some("2020-06-15"));
    }

    #[test]
    fn test_same_day_expiry_still_valid() {
        let check = ExpiryExtractor::check_at("Valid till 01/03/2024", today());
        assert!(!check.is_expired);
    }

    #[test]
    fn test_no_date_fails_open() {
        let check = ExpiryExtractor::check_at("no date info here", today());
        assert_eq!(check, ExpiryCheck::no_date());
    }

    #[test]
    fn test_alternate_separators() {
        let check = ExpiryExtractor::check_at("Expiry 15.06.2025", today());
        assert_eq!(check.expiry_date.as_deref(), Some("2025-06-15"));

        let check = ExpiryExtractor::check_at("Expires 15-06-2025", today());
        assert_eq!(check.expiry_date.as_deref(), Some("2025-06-15"));
    }

    #[test]
    fn test_two_digit_year_windowing() {
        let check = ExpiryExtractor::check_at("Valid till 15/06/25", today());
        assert_eq!(check.expiry_date.as_deref(), Some("2025-06-15"));

        let check = ExpiryExtractor::check_at("Valid till 15/06/75", today());
        assert_eq!(check.expiry_date.as_deref(), Some("1975-06-15"));
        assert!(check.is_expired);
    }

    #[test]
    fn test_label_and_date_on_separate_lines() {
        let text = "LICENSE\nValida sa\nsome noise\n15/06/2025\nfooter";
        let check = ExpiryExtractor::check_at(text, today());
        assert_eq!(check.expiry_date.as_deref(), Some("2025-06-15"));
    }

    #[test]
    fn test_label_too_far_from_date() {
        // Date is three lines below the label; lookahead stops at two, and
        // the last-resort sweep still picks the token up.
        let text = "Valida sa\na\nb\nc\n15/06/2025";
        let check = ExpiryExtractor::check_at(text, today());
        assert!(check.has_date);
    }

    #[test]
    fn test_last_resort_takes_last_date() {
        // No expiry label anywhere: issue date first, expiry after.
        let text = "Issued 01/01/2020 document 15/06/2025 end";
        let check = ExpiryExtractor::check_at(text, today());
        assert_eq!(check.expiry_date.as_deref(), Some("2025-06-15"));
        assert!(!check.is_expired);
    }

    #[test]
    fn test_invalid_day_rejected() {
        let check = ExpiryExtractor::check_at("Valid till 42/06/2025", today());
        assert!(!check.has_date);
        assert!(!check.is_expired);
    }

    #[test]
    fn test_invalid_month_rejected() {
        let check = ExpiryExtractor::check_at("Valid till 15/13/2025", today());
        assert!(!check.has_date);
    }

    #[test]
    fn test_nonexistent_calendar_date_rejected() {
        let check = ExpiryExtractor::check_at("Valid till 31/02/2025", today());
        assert!(!check.has_date);
    }
}
