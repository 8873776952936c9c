//! Parsing for `expires_in` expressions.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Outcome of parsing an `expires_in` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// No time-based expiry, no burn.
    Never,
    /// Purged on first successful read; no time-based expiry.
    Burn,
    /// Expires at a fixed instant.
    At(DateTime<Utc>),
}

/// Parse an `expires_in` request value. Empty and `"never"` mean no expiry,
/// `"burn"` marks the paste burn-after-read, the literal tokens map to fixed
/// durations, and anything else falls through to the composite duration
/// grammar.
pub fn parse_expires_in(expires_in: &str) -> Result<Expiry, AppError> {
    match expires_in {
        "" | "never" => Ok(Expiry::Never),
        "burn" => Ok(Expiry::Burn),
        other => {
            let duration = fixed_duration(other)
                .or_else(|| parse_duration(other))
                .ok_or(AppError::InvalidExpiresIn)?;
            let duration =
                chrono::Duration::from_std(duration).map_err(|_| AppError::InvalidExpiresIn)?;
            Ok(Expiry::At(Utc::now() + duration))
        }
    }
}

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

fn fixed_duration(token: &str) -> Option<Duration> {
    let secs = match token {
        "10m" => 10 * MINUTE,
        "30m" => 30 * MINUTE,
        "1h" => HOUR,
        "6h" => 6 * HOUR,
        "12h" => 12 * HOUR,
        "1d" => DAY,
        "3d" => 3 * DAY,
        "1w" => 7 * DAY,
        "2w" => 14 * DAY,
        // Approximate: a flat 30 days, not calendar-month arithmetic.
        "1M" => 30 * DAY,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}

/// Parse a composite duration expression such as `90s`, `30m` or `2h30m`.
/// Each component is a number followed by one of `s`, `m`, `h`. Returns
/// `None` for anything malformed, and for zero-length durations (an expiry
/// that is already in the past is never valid).
pub fn parse_duration(s: &str) -> Option<Duration> {
    if s.is_empty() {
        return None;
    }

    let mut total_secs: u64 = 0;
    let mut value: u64 = 0;
    let mut have_digits = false;

    for c in s.chars() {
        if let Some(digit) = c.to_digit(10) {
            value = value.checked_mul(10)?.checked_add(digit as u64)?;
            have_digits = true;
        } else {
            if !have_digits {
                return None;
            }
            let unit = match c {
                's' => 1,
                'm' => MINUTE,
                'h' => HOUR,
                _ => return None,
            };
            total_secs = total_secs.checked_add(value.checked_mul(unit)?)?;
            value = 0;
            have_digits = false;
        }
    }

    // Trailing digits without a unit.
    if have_digits || total_secs == 0 {
        return None;
    }

    Some(Duration::from_secs(total_secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn never_and_empty() {
        assert_eq!(parse_expires_in("").unwrap(), Expiry::Never);
        assert_eq!(parse_expires_in("never").unwrap(), Expiry::Never);
    }

    #[test]
    fn burn() {
        assert_eq!(parse_expires_in("burn").unwrap(), Expiry::Burn);
    }

    #[test]
    fn literal_tokens() {
        let cases: &[(&str, u64)] = &[
            ("10m", 10 * MINUTE),
            ("30m", 30 * MINUTE),
            ("1h", HOUR),
            ("6h", 6 * HOUR),
            ("12h", 12 * HOUR),
            ("1d", DAY),
            ("3d", 3 * DAY),
            ("1w", 7 * DAY),
            ("2w", 14 * DAY),
            ("1M", 30 * DAY),
        ];
        for &(token, secs) in cases {
            let before = Utc::now() + chrono::Duration::seconds(secs as i64 - 2);
            let after = Utc::now() + chrono::Duration::seconds(secs as i64 + 2);
            match parse_expires_in(token).unwrap() {
                Expiry::At(at) => {
                    assert!(at > before && at < after, "{} => {}", token, at);
                }
                other => panic!("{} parsed as {:?}", token, other),
            }
        }
    }

    #[test]
    fn composite_durations() {
        assert_eq!(
            parse_duration("2h30m"),
            Some(Duration::from_secs(2 * HOUR + 30 * MINUTE))
        );
        assert_eq!(parse_duration("90s"), Some(Duration::from_secs(90)));
        assert_eq!(
            parse_duration("1h30m15s"),
            Some(Duration::from_secs(HOUR + 30 * MINUTE + 15))
        );
        assert!(matches!(
            parse_expires_in("2h30m").unwrap(),
            Expiry::At(_)
        ));
    }

    #[test]
    fn rejects_garbage() {
        for input in ["banana", "10x", "h", "10", "1h2", "-5m", "0s", "0m0s", " 1h"] {
            assert!(
                parse_expires_in(input).is_err(),
                "{:?} should be rejected",
                input
            );
        }
    }
}
