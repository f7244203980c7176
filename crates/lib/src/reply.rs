//! Reply composition: one human-readable message per terminal pipeline state.

use crate::report::FeedingReport;

/// Terminal state of one pipeline run. Every inbound message ends in
/// exactly one of these; the composer renders exactly one reply per state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Count parsed and committed; carries the stored record.
    Recorded(FeedingReport),

    /// Body was not a valid non-negative integer (or had no usable text).
    InvalidInput,

    /// Sender is not in the authorized set.
    Unauthorized,

    /// The store rejected or never acknowledged the write.
    StorageFailure,
}

/// Render the reply text for a terminal state. Pure function.
pub fn compose(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Recorded(report) => format!(
            "Recorded {} people fed on {}",
            report.people_fed,
            report.recorded_at.format("%Y-%m-%d %H:%M:%S")
        ),
        Outcome::InvalidInput => "Please send a valid number of people fed.".to_string(),
        Outcome::Unauthorized => "You are not authorized to send this information.".to_string(),
        Outcome::StorageFailure => {
            "Could not record your report right now. Please try again later.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn recorded_reply_includes_count_and_timestamp() {
        let report = FeedingReport {
            people_fed: 12,
            recorded_at: chrono::Utc.with_ymd_and_hms(2026, 3, 14, 18, 30, 5).unwrap(),
        };
        assert_eq!(
            compose(&Outcome::Recorded(report)),
            "Recorded 12 people fed on 2026-03-14 18:30:05"
        );
    }

    #[test]
    fn rejection_templates() {
        assert_eq!(
            compose(&Outcome::InvalidInput),
            "Please send a valid number of people fed."
        );
        assert_eq!(
            compose(&Outcome::Unauthorized),
            "You are not authorized to send this information."
        );
    }

    #[test]
    fn storage_failure_is_distinct() {
        let text = compose(&Outcome::StorageFailure);
        assert!(text.contains("Could not record"));
        assert_ne!(text, compose(&Outcome::InvalidInput));
    }
}
