//! End-to-end tests for the rule evaluator, memoization, and driver.

use pegmatite::{
    Field, MatchSpan, ParseError, Parser, Record, Rule, RuleValue, Value, action, any, capture,
    check, check_action, eos, many, maybe, memo, named, not, not_byte, or, plus, prefix_table, r,
    range, re, refs, s, scan, seq, transform,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Default)]
struct IntNode {
    val: i64,
    pos_start: Cell<usize>,
    pos_end: Cell<usize>,
    line: Cell<usize>,
}

impl RuleValue for IntNode {
    fn set_position(&self, span: &MatchSpan<'_>) {
        self.pos_start.set(span.start);
        self.pos_end.set(span.end);
        self.line.set(span.line);
    }
}

impl Record for IntNode {
    const FIELDS: &'static [Field<Self>] = &[Field {
        name: "val",
        assign: |node, value| {
            if let Some(v) = value.downcast_ref::<i64>() {
                node.val = *v;
            }
        },
    }];
}

#[derive(Debug)]
struct PlusNode {
    i: Rc<IntNode>,
    j: Rc<IntNode>,
    pos_start: Cell<usize>,
    pos_end: Cell<usize>,
    line: Cell<usize>,
}

impl RuleValue for PlusNode {
    fn set_position(&self, span: &MatchSpan<'_>) {
        self.pos_start.set(span.start);
        self.pos_end.set(span.end);
        self.line.set(span.line);
    }
}

/// Digits to an `i64` value.
fn int_lit() -> Rule {
    transform(plus(range('0', '9')), |text| {
        Some(Value::new(text.parse::<i64>().ok()?))
    })
}

#[test]
fn test_parses_a_string() {
    let parser = Parser::new();
    let rule = s("foo");

    let outcome = parser.parse(&rule, "foo");
    assert!(outcome.matched);
    assert!(outcome.error.is_none());

    let outcome = parser.parse(&rule, "blah");
    assert!(!outcome.matched);
    assert!(outcome.error.is_none());
}

#[test]
fn test_parses_a_regexp() {
    let parser = Parser::new();
    let rule = re(r"\d+");

    assert!(parser.parse(&rule, "123").matched);
    assert!(!parser.parse(&rule, "blah").matched);
    // Anchored: never searches forward.
    assert!(!parser.parse(&rule, "blah123").matched);
}

#[test]
fn test_ordered_choice() {
    let parser = Parser::new();
    let rule = or([s("foo"), s("blah")]);

    assert!(parser.parse(&rule, "foo").matched);
    assert!(parser.parse(&rule, "blah").matched);
    assert!(!parser.parse(&rule, "quux").matched);
}

#[test]
fn test_sequence() {
    let parser = Parser::new();
    let rule = seq([s("foo"), s(" blah")]);

    assert!(!parser.parse(&rule, "foo").matched);
    assert!(parser.parse(&rule, "foo blah").matched);
}

#[test]
fn test_or_of_sequences() {
    let parser = Parser::new();
    let rule = or([seq([s("foo"), s(" blah")]), seq([s("qux"), s(" wooo")])]);

    assert!(!parser.parse(&rule, "foo").matched);
    assert!(parser.parse(&rule, "foo blah").matched);
    assert!(parser.parse(&rule, "qux wooo").matched);
}

#[test]
fn test_star() {
    let parser = Parser::new();
    let rule = pegmatite::star(s("foo"));

    assert!(parser.parse(&rule, "foo").matched);
    assert!(parser.parse(&rule, "foofoofoo").matched);
    assert!(parser.parse(&rule, "").matched);

    // Star itself matches empty; the driver reports the unconsumed rest.
    let outcome = parser.parse(&rule, "blah");
    assert!(!outcome.matched);
    assert!(matches!(
        outcome.error,
        Some(ParseError::InputNotConsumed { max_pos: 0, .. })
    ));
}

#[test]
fn test_plus() {
    let parser = Parser::new();
    let rule = plus(s("foo"));

    assert!(parser.parse(&rule, "foo").matched);
    assert!(parser.parse(&rule, "foofoofoo").matched);

    let outcome = parser.parse(&rule, "blah");
    assert!(!outcome.matched);
    assert!(outcome.error.is_none());
}

#[test]
fn test_maybe() {
    let parser = Parser::new();
    let rule = maybe(s("foo"));

    assert!(parser.parse(&rule, "foo").matched);

    let outcome = parser.parse(&rule, "blah");
    assert!(!outcome.matched);
    assert!(outcome.error.is_some());
}

#[test]
fn test_check() {
    let parser = Parser::new();
    let rule = seq([check(s("f")), or([s("foo"), s("blah")])]);

    assert!(parser.parse(&rule, "foo").matched);
    assert!(!parser.parse(&rule, "blah").matched);
}

#[test]
fn test_not() {
    let parser = Parser::new();
    let rule = seq([not(s("b")), s("foo")]);

    assert!(parser.parse(&rule, "foo").matched);
    assert!(!parser.parse(&rule, "blah").matched);
}

#[test]
fn test_not_byte() {
    let parser = Parser::new();
    let rule = seq([not_byte(b'b'), s("foo")]);

    assert!(parser.parse(&rule, "foo").matched);
    assert!(!parser.parse(&rule, "bar").matched);
    // Fails at end of input without advancing.
    assert!(!parser.parse(&not_byte(b'b'), "").matched);
}

#[test]
fn test_eos() {
    let parser = Parser::new();
    assert!(parser.parse(&eos(), "").matched);
    assert!(!parser.parse(&seq([s("a"), eos()]), "ab").matched);
    assert!(parser.parse(&seq([s("ab"), eos()]), "ab").matched);
}

#[test]
fn test_any_decodes_code_points() {
    let parser = Parser::new();
    assert!(parser.parse(&seq([any(), eos()]), "é").matched);
    assert!(!parser.parse(&any(), "").matched);
}

#[test]
fn test_scan() {
    let parser = Parser::new();
    // Consume a run of identifier characters by hand.
    let ident = scan(|text| {
        let len = text
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        if len == 0 { None } else { Some(len) }
    });

    assert!(parser.parse(&ident, "abc9").matched);
    assert!(!parser.parse(&ident, " abc").matched);
    assert!(!parser.parse(&ident, "").matched);
}

#[test]
fn test_prefix_table() {
    let parser = Parser::new();
    let rule = prefix_table([('f', s("foo")), ('b', s("bar"))]);

    assert!(parser.parse(&rule, "foo").matched);
    assert!(parser.parse(&rule, "bar").matched);
    assert!(!parser.parse(&rule, "qux").matched);
}

#[test]
fn test_many_bounds() {
    let parser = Parser::new().partial(true);
    let rule = many(s("a"), 2, Some(3), None);

    assert!(!parser.parse(&rule, "a").matched);
    assert!(parser.parse(&rule, "aa").matched);
    assert!(parser.parse(&rule, "aaa").matched);

    let outcome = parser.parse(&rule, "aaaa");
    assert!(outcome.matched);
    assert_eq!(outcome.metrics.bytes_consumed, 3, "stops at the upper bound");
}

#[test]
fn test_many_collects_iteration_values() {
    let parser = Parser::new();
    let one = transform(s("a"), |_| Some(Value::new(1i64)));
    let rule = many(
        one,
        0,
        None,
        Some(Box::new(|values| {
            let total: i64 = values
                .iter()
                .flatten()
                .filter_map(|v| v.downcast_ref::<i64>())
                .sum();
            Some(Value::new(total))
        })),
    );

    let outcome = parser.parse(&rule, "aaaa");
    assert!(outcome.matched);
    assert_eq!(outcome.value.unwrap().downcast_ref::<i64>(), Some(&4));
}

#[test]
fn test_reference() {
    let parser = Parser::new();
    let f1 = r("f1");
    let rule = seq([f1.rule(), s(" done")]);
    f1.set(s("ok"));

    assert!(parser.parse(&rule, "ok done").matched);
}

#[test]
fn test_left_recursive_reference() {
    let parser = Parser::new();
    let num = s("1");
    let f1 = r("f1");
    f1.set(or([seq([f1.rule(), s("+"), num.clone()]), num]));

    assert!(f1.left_recursive());
    assert!(parser.parse(&f1.rule(), "1+1").matched);
}

#[test]
fn test_reference_without_left_recursion_memoizes() {
    let parser = Parser::new();
    let f1 = r("f1");
    f1.set(s("1"));
    let rule = or([seq([f1.rule(), s("+")]), seq([f1.rule(), s("-")])]);

    assert!(!f1.left_recursive());

    let outcome = parser.parse(&rule, "1-");
    assert!(outcome.matched);
    // The second alternative replays the memoized result at position 0.
    assert!(outcome.metrics.memo_hits >= 1);
}

#[test]
fn test_labels_registry() {
    let parser = Parser::new();
    let mut labels = refs();

    let rule = or([
        seq([labels.rule("one"), s("+")]),
        seq([labels.rule("one"), s("-")]),
    ]);
    let one = labels.set("one", s("1"));

    assert!(!one.left_recursive());

    let outcome = parser.parse(&rule, "1-");
    assert!(outcome.matched);
    assert!(outcome.metrics.memo_hits >= 1);
}

#[test]
fn test_action_produces_value() {
    let parser = Parser::new();
    let rule = action(s("1"), |_| Some(Value::new(1i64)));

    let outcome = parser.parse(&rule, "1");
    assert!(outcome.matched);
    assert_eq!(outcome.value.unwrap().downcast_ref::<i64>(), Some(&1));
}

#[test]
fn test_named_values_reach_the_action() {
    let parser = Parser::new();
    let num = int_lit();
    let rule = action(
        seq([named("i", num.clone()), s("+"), named("j", num)]),
        |values| {
            let i = values.get("i")?.downcast_ref::<i64>()?;
            let j = values.get("j")?.downcast_ref::<i64>()?;
            Some(Value::new(i + j))
        },
    );

    let outcome = parser.parse(&rule, "3+4");
    assert!(outcome.matched);
    assert_eq!(outcome.value.unwrap().downcast_ref::<i64>(), Some(&7));
}

#[test]
fn test_check_action() {
    let parser = Parser::new();
    let rule = seq([
        named("prefix", capture(or([s("foo"), s("blah")]))),
        check_action(|values| {
            values
                .get("prefix")
                .and_then(|v| v.downcast_ref::<String>())
                .is_some_and(|text| text.starts_with('f'))
        }),
    ]);

    assert!(parser.parse(&rule, "foo").matched);
    assert!(!parser.parse(&rule, "blah").matched);
}

#[test]
fn test_scope_isolates_names() {
    let parser = Parser::new();
    // The inner action's scope must not leak `x` outward.
    let inner = action(named("x", transform(s("a"), |_| Some(Value::new(1i64)))), |values| {
        values.get("x").cloned()
    });
    let rule = action(seq([inner, s("b")]), |values| {
        Some(Value::new(values.get("x").is_none()))
    });

    let outcome = parser.parse(&rule, "ab");
    assert!(outcome.matched);
    assert_eq!(outcome.value.unwrap().downcast_ref::<bool>(), Some(&true));
}

#[test]
fn test_populates_positions() {
    let parser = Parser::new();
    let num = transform(re(r"\d+"), |text| {
        Some(Value::new(IntNode {
            val: text.parse().ok()?,
            ..Default::default()
        }))
    });

    let calc = action(
        seq([named("i", num.clone()), s("+"), named("j", num)]),
        |values| {
            Some(Value::new(PlusNode {
                i: values.get("i")?.downcast::<IntNode>()?,
                j: values.get("j")?.downcast::<IntNode>()?,
                pos_start: Cell::new(0),
                pos_end: Cell::new(0),
                line: Cell::new(0),
            }))
        },
    );

    let outcome = parser.parse(&calc, "3+4");
    assert!(outcome.matched);
    let node = outcome.value.unwrap().downcast::<PlusNode>().unwrap();

    assert_eq!(node.i.pos_start.get(), 0);
    assert_eq!(node.i.pos_end.get(), 1);
    assert_eq!(node.i.line.get(), 1);

    assert_eq!(node.j.pos_start.get(), 2);
    assert_eq!(node.j.pos_end.get(), 3);
    assert_eq!(node.j.line.get(), 1);

    assert_eq!(node.pos_start.get(), 0);
    assert_eq!(node.pos_end.get(), 3);
    assert_eq!(node.line.get(), 1);
}

#[test]
fn test_positions_report_lines() {
    let parser = Parser::new();
    let node = transform(s("b"), |_| Some(Value::new(IntNode::default())));
    let rule = seq([s("a\n"), node]);

    let outcome = parser.parse(&rule, "a\nb");
    assert!(outcome.matched);
    let node = outcome.value.unwrap().downcast::<IntNode>().unwrap();
    assert_eq!(node.pos_start.get(), 2);
    assert_eq!(node.line.get(), 2);
}

#[derive(Debug, Default)]
struct FileNode {
    file: RefCell<String>,
}

impl RuleValue for FileNode {
    fn set_position(&self, span: &MatchSpan<'_>) {
        *self.file.borrow_mut() = span.file.to_string();
    }
}

#[test]
fn test_parse_named_threads_filename() {
    let parser = Parser::new();
    let rule = transform(s("x"), |_| Some(Value::new(FileNode::default())));

    let outcome = parser.parse_named(&rule, "x", "input.peg");
    assert!(outcome.matched);
    let node = outcome.value.unwrap().downcast::<FileNode>().unwrap();
    assert_eq!(node.file.borrow().as_str(), "input.peg");
}

#[test]
fn test_memoizes_results() {
    let parser = Parser::new();
    let num = transform(plus(range('0', '9')), |text| {
        Some(Value::new(IntNode {
            val: text.parse().ok()?,
            ..Default::default()
        }))
    });

    let i = memo(named("i", num.clone()));
    let j = memo(named("j", num));

    let calc = action(
        or([
            seq([i.clone(), s("-"), j.clone()]),
            seq([i, s("+"), j]),
        ]),
        |values| {
            Some(Value::new(PlusNode {
                i: values.get("i")?.downcast::<IntNode>()?,
                j: values.get("j")?.downcast::<IntNode>()?,
                pos_start: Cell::new(0),
                pos_end: Cell::new(0),
                line: Cell::new(0),
            }))
        },
    );

    let outcome = parser.parse(&calc, "3+4");
    assert!(outcome.matched);
    assert!(outcome.metrics.memo_hits >= 1);
}

#[test]
fn test_tracks_furthest_advance() {
    let parser = Parser::new();
    let digits = plus(range('0', '9'));

    let calc = or([
        seq([digits.clone(), s("-"), digits.clone()]),
        seq([digits.clone(), s("+"), digits.clone()]),
        seq([digits, s("*"), s("2")]),
    ]);

    let outcome = parser.parse(&calc, "3*4");
    assert!(!outcome.matched);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.metrics.max_pos, 2);
}

#[test]
fn test_ordered_choice_prefix_bias() {
    // "foo" shadows "foobar": the second alternative is unreachable.
    let rule = or([s("foo"), s("foobar")]);

    let strict = Parser::new();
    let outcome = strict.parse(&rule, "foobar");
    assert!(!outcome.matched);
    assert!(matches!(
        outcome.error,
        Some(ParseError::InputNotConsumed { max_pos: 3, .. })
    ));

    let partial = Parser::new().partial(true);
    let outcome = partial.parse(&rule, "foobar");
    assert!(outcome.matched);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.metrics.bytes_consumed, 3);
}

#[test]
fn test_input_not_consumed_names_the_deepest_rule() {
    let parser = Parser::new();
    let word = r("word");
    word.set(plus(range('a', 'z')));

    let outcome = parser.parse(&word.rule(), "abc123");
    assert!(!outcome.matched);
    assert_eq!(
        outcome.error,
        Some(ParseError::InputNotConsumed {
            max_pos: 3,
            max_rule: Some("word"),
        })
    );
}

#[test]
fn test_simple_calculator() {
    let num = int_lit();
    let x = r("x");
    x.set(or([
        action(
            seq([named("i", x.rule()), s("+"), named("j", num.clone())]),
            |values| {
                let i = values.get("i")?.downcast_ref::<i64>()?;
                let j = values.get("j")?.downcast_ref::<i64>()?;
                Some(Value::new(i + j))
            },
        ),
        num,
    ]));

    assert!(x.left_recursive());

    let parser = Parser::new();
    let root = seq([x.rule(), eos()]);

    let outcome = parser.parse(&root, "3");
    assert!(outcome.matched);
    assert_eq!(outcome.value.unwrap().downcast_ref::<i64>(), Some(&3));

    let outcome = parser.parse(&root, "3+4");
    assert!(outcome.matched);
    assert_eq!(outcome.value.unwrap().downcast_ref::<i64>(), Some(&7));

    let outcome = parser.parse(&root, "1+2+3+4");
    assert!(outcome.matched);
    assert_eq!(outcome.value.unwrap().downcast_ref::<i64>(), Some(&10));
}

#[test]
fn test_apply_populates_a_record() {
    let parser = Parser::new();
    let num_lit = int_lit();
    let num = pegmatite::apply::<IntNode>(named("val", num_lit));

    let i = memo(named("i", num.clone()));
    let j = memo(named("j", num));

    let calc = action(
        or([
            seq([i.clone(), s("-"), j.clone()]),
            seq([i, s("+"), j]),
        ]),
        |values| {
            Some(Value::new(PlusNode {
                i: values.get("i")?.downcast::<IntNode>()?,
                j: values.get("j")?.downcast::<IntNode>()?,
                pos_start: Cell::new(0),
                pos_end: Cell::new(0),
                line: Cell::new(0),
            }))
        },
    );

    let outcome = parser.parse(&calc, "3+4");
    assert!(outcome.matched);
    let node = outcome.value.unwrap().downcast::<PlusNode>().unwrap();
    assert_eq!(node.i.val, 3);
    assert_eq!(node.j.val, 4);
}

#[test]
#[should_panic(expected = "before being bound")]
fn test_unbound_reference_panics() {
    let parser = Parser::new();
    let dangling = r("dangling");
    parser.parse(&dangling.rule(), "x");
}
