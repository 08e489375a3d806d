//! Driver errors and parse metrics.
//!
//! Ordinary parse failure is not an error: it is reported as
//! `matched = false` on the [`ParseOutcome`]. The only error the driver
//! surfaces is a matched prefix under strict (non-partial) parsing, which
//! carries the furthest position the parser ever reached and the innermost
//! named reference active at that moment — enough to build a useful
//! message without the engine understanding messages itself.
//!
//! When the `diagnostics` feature is enabled, errors derive
//! [`miette::Diagnostic`] for rich reporting.

use crate::value::Value;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseError {
    /// The root rule matched a prefix of the input and partial mode was
    /// off. `max_pos` is the furthest byte offset reached across all
    /// attempted branches; `max_rule` names the innermost reference that
    /// was active when it was reached.
    #[error("input not fully consumed: parse stopped at byte {max_pos} (in rule `{}`)", .max_rule.unwrap_or("<root>"))]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(code(pegmatite::input_not_consumed))
    )]
    InputNotConsumed {
        max_pos: usize,
        max_rule: Option<&'static str>,
    },
}

/// Counters gathered over a single parse.
#[derive(Debug, Clone, Default)]
pub struct ParseMetrics {
    /// Bytes consumed by the root rule (equals the input length on a full
    /// match).
    pub bytes_consumed: usize,
    /// Furthest byte offset reached across all attempted branches.
    pub max_pos: usize,
    /// Memo-table hits, counting replayed reference results.
    pub memo_hits: usize,
    pub parse_time: std::time::Duration,
}

/// The result of running a rule over an input.
///
/// `matched` is true only for a complete parse (or any match in partial
/// mode); a matched prefix under strict parsing carries its value alongside
/// `matched = false` and an [`ParseError::InputNotConsumed`] error.
#[derive(Debug)]
pub struct ParseOutcome {
    pub value: Option<Value>,
    pub matched: bool,
    pub error: Option<ParseError>,
    pub metrics: ParseMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_not_consumed_display() {
        let err = ParseError::InputNotConsumed {
            max_pos: 3,
            max_rule: Some("num"),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("byte 3"));
        assert!(rendered.contains("`num`"));

        let anonymous = ParseError::InputNotConsumed {
            max_pos: 0,
            max_rule: None,
        };
        assert!(anonymous.to_string().contains("<root>"));
    }

    #[test]
    fn test_metrics_default() {
        let metrics = ParseMetrics::default();
        assert_eq!(metrics.bytes_consumed, 0);
        assert_eq!(metrics.max_pos, 0);
        assert_eq!(metrics.memo_hits, 0);
        assert_eq!(metrics.parse_time, std::time::Duration::ZERO);
    }
}
