// Error taxonomy shared by the ledger, parser and command operations.

use thiserror::Error;

/// A user-supplied value the core refuses to record.
///
/// Always recoverable: the transport shows the message (with any suggested
/// correction) and the ledger is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("player `{input}` not found{}", suggestion_hint(.suggestions))]
    UnknownPlayer {
        input: String,
        suggestions: Vec<String>,
    },

    #[error("player `{input}` is ambiguous{}", suggestion_hint(.candidates))]
    AmbiguousPlayer {
        input: String,
        candidates: Vec<String>,
    },

    #[error(transparent)]
    TeamOutOfRange(#[from] RangeError),

    #[error("invalid position `{0}` (expected QB, RB, WR, TE, K or D/ST)")]
    InvalidPosition(String),

    #[error("malformed force-pick arguments: {0}")]
    MalformedForcePick(String),
}

/// A numeric setting outside its allowed range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} must be between {min} and {max}, got {value}")]
pub struct RangeError {
    pub field: &'static str,
    pub value: u32,
    pub min: u32,
    pub max: u32,
}

impl RangeError {
    /// Check `value` against an inclusive range.
    pub fn check(field: &'static str, value: u32, min: u32, max: u32) -> Result<u32, RangeError> {
        if (min..=max).contains(&value) {
            Ok(value)
        } else {
            Err(RangeError {
                field,
                value,
                min,
                max,
            })
        }
    }
}

/// Whole-batch failures of a board import.
///
/// Individual unparsable lines are not errors; they are reported as
/// [`crate::draft::parser::ParseSkip`] records alongside the imported picks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error(
        "that paste has {lines} lines; the limit is {limit} per import. \
         Split the board into smaller chunks and import them in order."
    )]
    BatchTooLarge { lines: usize, limit: usize },

    #[error("nothing to import: paste the draft board lines after the command")]
    Empty,
}

fn suggestion_hint(names: &[String]) -> String {
    if names.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_player_lists_suggestions() {
        let err = ValidationError::UnknownPlayer {
            input: "Jamar Chase".into(),
            suggestions: vec!["Ja'Marr Chase".into()],
        };
        assert_eq!(
            err.to_string(),
            "player `Jamar Chase` not found (did you mean: Ja'Marr Chase?)"
        );
    }

    #[test]
    fn unknown_player_without_suggestions() {
        let err = ValidationError::UnknownPlayer {
            input: "Nobody".into(),
            suggestions: vec![],
        };
        assert_eq!(err.to_string(), "player `Nobody` not found");
    }

    #[test]
    fn range_check_inclusive_bounds() {
        assert_eq!(RangeError::check("team", 1, 1, 12), Ok(1));
        assert_eq!(RangeError::check("team", 12, 1, 12), Ok(12));
        let err = RangeError::check("team", 13, 1, 12).unwrap_err();
        assert_eq!(err.to_string(), "team must be between 1 and 12, got 13");
    }

    #[test]
    fn batch_too_large_mentions_limit() {
        let msg = ImportError::BatchTooLarge { lines: 21, limit: 20 }.to_string();
        assert!(msg.contains("21 lines"));
        assert!(msg.contains("limit is 20"));
    }
}
