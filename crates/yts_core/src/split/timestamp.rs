//! Timestamp parsing.
//!
//! Tracklists write start times in several notations. [`parse_timestamp`]
//! accepts, in this order (first match wins):
//!
//! 1. Bare seconds, optionally suffixed with `s`: `"123"`, `"123s"`
//! 2. Compound durations with `h`, `m`, `s` components in that order:
//!    `"1h30m45s"`, `"30m"`, `"2h5s"`
//! 3. `MM:SS`: `"1:30"`
//! 4. `HH:MM:SS`: `"1:23:45"`
//!
//! Zero is a valid timestamp; failure is always an `Err`, never `0`.

use thiserror::Error;

use crate::models::{ResolvedItem, TimedItem};

/// Error type for timestamp and time-range parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("Empty timestamp")]
    Empty,

    #[error("Unparseable timestamp: '{0}'")]
    Unparseable(String),

    #[error("Timestamp out of range: '{0}'")]
    Overflow(String),

    #[error("Empty time range: end ({end_seconds}s) must be after start ({start_seconds}s)")]
    EmptyRange { start_seconds: u64, end_seconds: u64 },
}

/// Parse a timestamp into whole seconds.
pub fn parse_timestamp(raw: &str) -> Result<u64, TimestampError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(TimestampError::Empty);
    }

    let overflow = || TimestampError::Overflow(text.to_string());

    if let Some(digits) = bare_seconds(text) {
        return parse_digits(digits).ok_or_else(overflow);
    }

    if let Some(total) = compound_duration(text) {
        return total.ok_or_else(overflow);
    }

    let parts: Vec<&str> = text.split(':').collect();
    if parts.iter().all(|p| is_digits(p)) {
        match parts.as_slice() {
            [m, s] => return combine(&[(m, 60), (s, 1)]).ok_or_else(overflow),
            [h, m, s] => {
                return combine(&[(h, 3600), (m, 60), (s, 1)]).ok_or_else(overflow);
            }
            _ => {}
        }
    }

    Err(TimestampError::Unparseable(text.to_string()))
}

/// Resolve an optional raw timestamp; `None` when absent or unparseable.
pub fn resolve_timestamp(raw: Option<&str>) -> Option<u64> {
    let raw = raw?;
    match parse_timestamp(raw) {
        Ok(seconds) => Some(seconds),
        Err(e) => {
            tracing::debug!("Timestamp not resolved: {}", e);
            None
        }
    }
}

/// Resolve every item of a tracklist, keeping order and unresolved items.
pub fn resolve_items(items: &[TimedItem]) -> Vec<ResolvedItem> {
    items
        .iter()
        .map(|item| {
            let seconds = resolve_timestamp(item.raw_timestamp.as_deref());
            ResolvedItem::new(item.clone(), seconds)
        })
        .collect()
}

/// Canonical `HH:MM:SS` (hours keep growing past 99).
pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Short clock form for status lines: `M:SS` or `H:MM:SS`.
pub fn format_clock(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_digits(s: &str) -> Option<u64> {
    s.bytes().try_fold(0u64, |acc, b| {
        acc.checked_mul(10)?.checked_add(u64::from(b - b'0'))
    })
}

/// `"123"` or `"123s"`: returns the digit run.
fn bare_seconds(text: &str) -> Option<&str> {
    let digits = text
        .strip_suffix('s')
        .or_else(|| text.strip_suffix('S'))
        .unwrap_or(text);
    is_digits(digits).then_some(digits)
}

/// `<n>h<n>m<n>s` with each component optional but ordered.
///
/// Returns `None` when the shape does not match, `Some(None)` on overflow.
fn compound_duration(text: &str) -> Option<Option<u64>> {
    let mut components: Vec<(&str, u64)> = Vec::new();
    let mut last_rank = None;
    let mut rest = text;

    while !rest.is_empty() {
        let split = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (digits, tail) = rest.split_at(split);
        if digits.is_empty() {
            return None;
        }

        let mut chars = tail.chars();
        let (rank, factor) = match chars.next().map(|c| c.to_ascii_lowercase()) {
            Some('h') => (0, 3600),
            Some('m') => (1, 60),
            Some('s') => (2, 1),
            _ => return None,
        };
        if last_rank.is_some_and(|last| rank <= last) {
            return None;
        }
        last_rank = Some(rank);
        components.push((digits, factor));
        rest = chars.as_str();
    }

    if components.is_empty() {
        return None;
    }
    Some(combine(&components))
}

fn combine(parts: &[(&str, u64)]) -> Option<u64> {
    parts.iter().try_fold(0u64, |acc, (digits, factor)| {
        let value = parse_digits(digits)?.checked_mul(*factor)?;
        acc.checked_add(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_seconds() {
        assert_eq!(parse_timestamp("123"), Ok(123));
        assert_eq!(parse_timestamp("123s"), Ok(123));
        assert_eq!(parse_timestamp("0"), Ok(0));
        assert_eq!(parse_timestamp(" 45 "), Ok(45));
    }

    #[test]
    fn parses_compound_durations() {
        assert_eq!(parse_timestamp("1h2m3s"), Ok(3723));
        assert_eq!(parse_timestamp("1h30m45s"), Ok(5445));
        assert_eq!(parse_timestamp("30m"), Ok(1800));
        assert_eq!(parse_timestamp("2h5s"), Ok(7205));
        assert_eq!(parse_timestamp("1H2M"), Ok(3720));

        for (h, m, s) in [(0, 0, 0), (3, 59, 59), (10, 0, 7)] {
            let raw = format!("{}h{}m{}s", h, m, s);
            assert_eq!(parse_timestamp(&raw), Ok(h * 3600 + m * 60 + s));
        }
    }

    #[test]
    fn compound_components_must_be_ordered() {
        assert!(parse_timestamp("30s1m").is_err());
        assert!(parse_timestamp("1m1m").is_err());
        assert!(parse_timestamp("1h30").is_err());
        assert!(parse_timestamp("h").is_err());
    }

    #[test]
    fn parses_colon_forms() {
        assert_eq!(parse_timestamp("0:00"), Ok(0));
        assert_eq!(parse_timestamp("1:30"), Ok(90));
        assert_eq!(parse_timestamp("1:23:45"), Ok(5025));
        assert_eq!(parse_timestamp("75:10"), Ok(4510));
    }

    #[test]
    fn rejects_other_shapes() {
        assert_eq!(parse_timestamp(""), Err(TimestampError::Empty));
        assert_eq!(parse_timestamp("   "), Err(TimestampError::Empty));
        assert!(matches!(
            parse_timestamp("abc"),
            Err(TimestampError::Unparseable(_))
        ));
        assert!(parse_timestamp("1:2:3:4").is_err());
        assert!(parse_timestamp("1:").is_err());
        assert!(parse_timestamp("-5").is_err());
        assert!(parse_timestamp("1.5").is_err());
        assert_eq!(resolve_timestamp(None), None);
        assert_eq!(resolve_timestamp(Some("abc")), None);
        assert_eq!(resolve_timestamp(Some("0:00")), Some(0));
    }

    #[test]
    fn overflow_is_an_error() {
        assert!(matches!(
            parse_timestamp("99999999999999999999999"),
            Err(TimestampError::Overflow(_))
        ));
        assert!(matches!(
            parse_timestamp("9999999999999999999h"),
            Err(TimestampError::Overflow(_))
        ));
    }

    #[test]
    fn resolves_items_in_order() {
        let items = vec![
            TimedItem::new(1, "A", None, Some("0:00".to_string())),
            TimedItem::new(2, "B", None, Some("later".to_string())),
            TimedItem::new(3, "C", None, None),
        ];
        let resolved = resolve_items(&items);
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].resolved_seconds, Some(0));
        assert!(!resolved[1].is_resolved());
        assert!(!resolved[2].is_resolved());
    }

    #[test]
    fn formats_clock_values() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(5025), "01:23:45");
        assert_eq!(format_clock(90), "1:30");
        assert_eq!(format_clock(5025), "1:23:45");
    }
}
