//! The parser driver.
//!
//! A [`Parser`] carries only configuration; all per-parse storage lives in
//! an internal state built for each [`Parser::parse`] call and dropped when
//! it returns. One parser (and one rule graph) can therefore run any number
//! of parses.

mod engine;
mod line;
mod state;

use crate::error::{ParseError, ParseMetrics, ParseOutcome};
use crate::grammar::Rule;
use state::State;
use std::time::Instant;

/// Driver configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseConfig {
    /// Emit a `tracing` event for every rule invocation. Affects
    /// performance only.
    pub debug: bool,
    /// Accept a match of a strict prefix of the input instead of reporting
    /// [`ParseError::InputNotConsumed`].
    pub partial: bool,
}

/// Runs rules against input strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    config: ParseConfig,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_config(config: ParseConfig) -> Self {
        Self { config }
    }

    /// Enable or disable rule-level trace output.
    #[must_use]
    pub const fn debug(mut self, on: bool) -> Self {
        self.config.debug = on;
        self
    }

    /// Enable or disable partial mode.
    #[must_use]
    pub const fn partial(mut self, on: bool) -> Self {
        self.config.partial = on;
        self
    }

    /// Matches `rule` against `input`.
    ///
    /// Returns the rule's value and whether it matched. A matched prefix
    /// under strict (non-partial) parsing reports `matched = false`
    /// together with the value and an [`ParseError::InputNotConsumed`]
    /// describing the furthest advance.
    pub fn parse(&self, rule: &Rule, input: &str) -> ParseOutcome {
        self.parse_named(rule, input, "")
    }

    /// Like [`parse`](Self::parse), with a file name that is threaded into
    /// the positions handed to
    /// [`RuleValue::set_position`](crate::RuleValue::set_position).
    pub fn parse_named(&self, rule: &Rule, input: &str, filename: &str) -> ParseOutcome {
        let started = Instant::now();
        let mut state = State::new(input, filename, self.config.debug);

        let result = state.eval(rule);

        let metrics = ParseMetrics {
            bytes_consumed: state.pos,
            max_pos: state.max_pos,
            memo_hits: state.memo_hits,
            parse_time: started.elapsed(),
        };

        if !result.matched {
            return ParseOutcome {
                value: None,
                matched: false,
                error: None,
                metrics,
            };
        }

        if state.pos < state.input_size && !self.config.partial {
            return ParseOutcome {
                value: result.value,
                matched: false,
                error: Some(ParseError::InputNotConsumed {
                    max_pos: state.max_pos,
                    max_rule: state.max_rule,
                }),
                metrics,
            };
        }

        ParseOutcome {
            value: result.value,
            matched: true,
            error: None,
            metrics,
        }
    }
}
