//! Feeding report: the durable record and the text-to-count parser.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A recorded feeding report. Created once per accepted message by the
/// store (which assigns the timestamp at insertion); immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedingReport {
    pub people_fed: i64,
    pub recorded_at: DateTime<Utc>,
}

/// Why a message body is not a valid people-fed count.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportParseError {
    /// Trimmed body is not a base-10 integer literal.
    #[error("not a number: {0:?}")]
    NotANumber(String),

    /// Integer parsed but a negative headcount is meaningless.
    #[error("negative count: {value}")]
    NegativeCount { value: i64 },
}

/// Parse a message body into a non-negative people-fed count. The entire
/// trimmed string must be an integer literal — no partial parses, no
/// floats, no units.
pub fn parse_people_fed(text: &str) -> Result<i64, ReportParseError> {
    let trimmed = text.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| ReportParseError::NotANumber(trimmed.to_string()))?;
    if value < 0 {
        return Err(ReportParseError::NegativeCount { value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_integer() {
        assert_eq!(parse_people_fed("12"), Ok(12));
        assert_eq!(parse_people_fed("0"), Ok(0));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(parse_people_fed("  45\n"), Ok(45));
    }

    #[test]
    fn words_are_not_numbers() {
        assert!(matches!(
            parse_people_fed("twelve"),
            Err(ReportParseError::NotANumber(_))
        ));
    }

    #[test]
    fn no_partial_parse() {
        assert!(parse_people_fed("12 people").is_err());
        assert!(parse_people_fed("12.5").is_err());
        assert!(parse_people_fed("").is_err());
    }

    #[test]
    fn negative_count_rejected() {
        assert_eq!(
            parse_people_fed("-3"),
            Err(ReportParseError::NegativeCount { value: -3 })
        );
    }
}
