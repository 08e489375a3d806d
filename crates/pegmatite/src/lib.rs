//! # Pegmatite
//!
//! An embeddable Parsing Expression Grammar (PEG) engine. Grammars are
//! built by calling constructors that return opaque [`Rule`] handles — not
//! from a grammar file — and matched over in-memory strings with packrat
//! memoization and support for direct left recursion.
//!
//! ## Overview
//!
//! - **Ordered choice, sequencing, repetition, lookahead**: [`or`],
//!   [`seq`], [`star`], [`plus`], [`many`], [`maybe`], [`check`], [`not`].
//! - **Semantic values**: [`named`] captures sub-values into a scope,
//!   [`action`] and [`apply`] consume the scope, [`transform`] and
//!   [`capture`] work on the matched text.
//! - **Selective memoization**: only references ([`r`], [`memo`]) memoize,
//!   a deliberate memory/time tradeoff; directly left-recursive references
//!   are matched with seed growth.
//! - **Diagnostics**: the driver reports the furthest position reached and
//!   the reference active at that point when a parse consumes only a
//!   prefix.
//!
//! ## Quick start
//!
//! A calculator with left recursion:
//!
//! ```
//! use pegmatite::{Parser, Value, action, eos, named, or, plus, r, range, s, seq, transform};
//!
//! let num = transform(plus(range('0', '9')), |text| {
//!     Some(Value::new(text.parse::<i64>().ok()?))
//! });
//!
//! let expr = r("expr");
//! expr.set(or([
//!     action(
//!         seq([named("i", expr.rule()), s("+"), named("j", num.clone())]),
//!         |values| {
//!             let i = values.get("i")?.downcast_ref::<i64>()?;
//!             let j = values.get("j")?.downcast_ref::<i64>()?;
//!             Some(Value::new(i + j))
//!         },
//!     ),
//!     num,
//! ]));
//! assert!(expr.left_recursive());
//!
//! let parser = Parser::new();
//! let outcome = parser.parse(&seq([expr.rule(), eos()]), "3+4");
//! assert!(outcome.matched);
//! assert_eq!(outcome.value.unwrap().downcast_ref::<i64>(), Some(&7));
//! ```
//!
//! ## Modules
//!
//! - [`grammar`] — rule handles, constructors, references, branches
//! - [`value`] — semantic values, scopes, the record-population protocol
//! - [`parser`] — the driver and its configuration
//! - [`error`] — driver errors and parse metrics

pub mod error;
pub mod grammar;
pub mod parser;
pub mod value;

pub use error::{ParseError, ParseMetrics, ParseOutcome};
pub use grammar::{
    BranchesBuilder, CollectFn, Labels, Ref, Rule, action, any, apply, branches, capture, check,
    check_action, eos, many, maybe, memo, named, not, not_byte, or, plus, prefix_table, print, r,
    range, re, refs, rune, s, scan, scope, seq, set, star, transform,
};
pub use parser::{ParseConfig, Parser};
pub use value::{Field, MatchSpan, Record, RuleValue, Value, Values};
