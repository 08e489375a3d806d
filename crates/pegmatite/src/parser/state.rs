//! Per-parse state: cursor, scope, memo table, and furthest-advance
//! tracking.
//!
//! A `State` is created per parse, owns everything the parse mutates, and
//! is dropped when the parse ends. Rule graphs never hold state; they can
//! be reused across any number of parses.

use crate::grammar::RuleKey;
use crate::value::{MatchSpan, Value, Values};
use hashbrown::HashMap;

use super::line::{compute_lines, line_at};

/// A memoized reference result.
///
/// Entries are written once per `(position, reference)` pair, except during
/// left-recursive seed growth where the entry is overwritten as long as
/// `end_pos` keeps growing. `used` counts replays.
#[derive(Debug, Clone)]
pub(crate) struct MemoEntry {
    pub(crate) matched: bool,
    pub(crate) value: Option<Value>,
    pub(crate) end_pos: usize,
    pub(crate) used: u32,
}

pub(crate) struct State<'a> {
    pub(crate) input: &'a str,
    pub(crate) input_size: usize,
    pub(crate) pos: usize,

    /// Furthest offset any terminal ever reached, and the innermost named
    /// reference active at that moment.
    pub(crate) max_pos: usize,
    pub(crate) max_rule: Option<&'static str>,
    pub(crate) current_ref: Option<&'static str>,

    pub(crate) values: Values,
    memos: HashMap<usize, HashMap<RuleKey, MemoEntry, ahash::RandomState>, ahash::RandomState>,

    /// Diagnostic labels pushed by branch alternatives.
    pub(crate) labels: Vec<&'static str>,

    newlines: Vec<usize>,
    filename: &'a str,

    pub(crate) debug: bool,
    pub(crate) memo_hits: usize,

    /// Spare collection buffers for bounded repetition, reused within this
    /// parse and dropped with it.
    spare_buffers: Vec<Vec<Option<Value>>>,
}

impl<'a> State<'a> {
    pub(crate) fn new(input: &'a str, filename: &'a str, debug: bool) -> Self {
        Self {
            input,
            input_size: input.len(),
            pos: 0,
            max_pos: 0,
            max_rule: None,
            current_ref: None,
            values: Values::new(),
            memos: HashMap::default(),
            labels: Vec::new(),
            newlines: compute_lines(input),
            filename,
            debug,
            memo_hits: 0,
            spare_buffers: Vec::new(),
        }
    }

    pub(crate) fn mark(&self) -> usize {
        self.pos
    }

    pub(crate) fn restore(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.input_size
    }

    pub(crate) fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub(crate) fn byte_at(&self, pos: usize) -> u8 {
        self.input.as_bytes()[pos]
    }

    /// Consumes `len` bytes and keeps the furthest-advance attribution
    /// current. Only terminal matches advance.
    pub(crate) fn advance(&mut self, len: usize) {
        self.pos += len;
        if self.pos > self.max_pos {
            self.max_pos = self.pos;
            self.max_rule = self.current_ref;
        }
    }

    pub(crate) fn line(&self, pos: usize) -> usize {
        line_at(&self.newlines, pos)
    }

    pub(crate) fn span(&self, start: usize) -> MatchSpan<'a> {
        MatchSpan {
            start,
            end: self.pos,
            line: self.line(start),
            file: self.filename,
        }
    }

    /// Replays a memo entry, counting the hit.
    pub(crate) fn memo_lookup(&mut self, pos: usize, key: RuleKey) -> Option<MemoEntry> {
        let entry = self.memos.get_mut(&pos)?.get_mut(&key)?;
        entry.used += 1;
        self.memo_hits += 1;
        Some(entry.clone())
    }

    /// Inserts or overwrites a memo entry, preserving the use count of an
    /// entry being overwritten (seed growth replaces results in place).
    pub(crate) fn memo_store(
        &mut self,
        pos: usize,
        key: RuleKey,
        matched: bool,
        value: Option<Value>,
        end_pos: usize,
    ) {
        let slot = self.memos.entry(pos).or_default().entry(key);
        slot.and_modify(|entry| {
            entry.matched = matched;
            entry.value = value.clone();
            entry.end_pos = end_pos;
        })
        .or_insert(MemoEntry {
            matched,
            value,
            end_pos,
            used: 0,
        });
    }

    pub(crate) fn take_buffer(&mut self) -> Vec<Option<Value>> {
        self.spare_buffers.pop().unwrap_or_default()
    }

    pub(crate) fn put_buffer(&mut self, mut buffer: Vec<Option<Value>>) {
        buffer.clear();
        self.spare_buffers.push(buffer);
    }

    /// The next rune of input, for trace output.
    pub(crate) fn peek_display(&self) -> &str {
        if self.at_end() {
            "EOF"
        } else {
            let rest = self.rest();
            let len = rest.chars().next().map_or(0, char::len_utf8);
            &rest[..len]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_tracks_furthest() {
        let mut state = State::new("abcdef", "", false);
        state.current_ref = Some("word");
        state.advance(3);
        assert_eq!(state.max_pos, 3);
        assert_eq!(state.max_rule, Some("word"));

        state.restore(0);
        state.current_ref = Some("other");
        state.advance(2);
        assert_eq!(state.max_pos, 3, "max_pos never decreases");
        assert_eq!(state.max_rule, Some("word"));
    }

    #[test]
    fn test_memo_overwrite_keeps_use_count() {
        let mut state = State::new("", "", false);
        state.memo_store(0, 1, false, None, 0);
        assert!(state.memo_lookup(0, 1).is_some());
        state.memo_store(0, 1, true, None, 2);
        let entry = state.memo_lookup(0, 1).unwrap();
        assert!(entry.matched);
        assert_eq!(entry.end_pos, 2);
        assert_eq!(entry.used, 2);
    }

    #[test]
    fn test_buffer_reuse_clears() {
        let mut state = State::new("", "", false);
        let mut buffer = state.take_buffer();
        buffer.push(Some(Value::new(1i64)));
        state.put_buffer(buffer);
        assert!(state.take_buffer().is_empty());
    }
}
