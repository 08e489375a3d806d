//! Small rule-combining helpers.

use pegmatite::{Rule, seq};

/// Returns a function that suffixes rules with `trailer`. The common use is
/// token-style rules that consume and ignore trailing whitespace:
///
/// ```
/// use pegmatite::{Parser, s};
/// use pegmatite_toolkit::{after, ws};
///
/// let token = after(ws());
/// let if_kw = token(s("if"));
/// assert!(Parser::new().parse(&if_kw, "if  ").matched);
/// ```
pub fn after(trailer: Rule) -> impl Fn(Rule) -> Rule {
    move |rule| seq([rule, trailer.clone()])
}
