//! Quoted-string grammars.
//!
//! Single-, double-, and triple-quoted strings. Double-quoted forms decode
//! the usual escape sequences (`\n`, `\t`, ..., `\xHH`, `\uHHHH`,
//! `\UHHHHHHHH`, and three-digit octal); single-quoted forms only unescape
//! `\'` and keep everything else verbatim.
//!
//! The body is assembled from two segment kinds: a `scan` fast path that
//! consumes runs of ordinary characters in one step, and the escape rules,
//! dispatched through a `prefix_table` on the character after the
//! backslash.

use pegmatite::{
    Rule, RuleValue, Value, any, capture, many, not, or, prefix_table, range, s, scan, seq,
    transform,
};

/// The decoded contents of a string literal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringValue {
    pub value: String,
}

impl RuleValue for StringValue {}

fn hex_digit() -> Rule {
    or([range('0', '9'), range('a', 'f'), range('A', 'F')])
}

/// A literal that decodes to a fixed character.
fn em(input: &'static str, out: char) -> Rule {
    transform(s(input), move |_| Some(Value::new(out)))
}

fn escaped() -> Rule {
    let hex_pair = transform(seq([hex_digit(), hex_digit()]), |text| {
        let code = u8::from_str_radix(text, 16).ok()?;
        Some(Value::new(code as char))
    });
    let unicode4 = transform(many(hex_digit(), 4, Some(4), None), |text| {
        char::from_u32(u32::from_str_radix(text, 16).ok()?).map(Value::new)
    });
    let unicode8 = transform(many(hex_digit(), 8, Some(8), None), |text| {
        char::from_u32(u32::from_str_radix(text, 16).ok()?).map(Value::new)
    });
    let octal_digit = range('0', '7');
    let octal = transform(
        seq([octal_digit.clone(), octal_digit.clone(), octal_digit]),
        |text| char::from_u32(u32::from_str_radix(text, 8).ok()?).map(Value::new),
    );

    seq([
        s("\\"),
        or([
            prefix_table([
                ('a', em("a", '\x07')),
                ('b', em("b", '\x08')),
                ('\\', em("\\", '\\')),
                ('n', em("n", '\n')),
                ('t', em("t", '\t')),
                ('f', em("f", '\x0c')),
                ('v', em("v", '\x0b')),
                ('r', em("r", '\r')),
                ('x', seq([s("x"), hex_pair])),
                ('u', seq([s("u"), unicode4])),
                ('U', seq([s("U"), unicode8])),
            ]),
            octal,
        ]),
    ])
}

fn single_escape() -> Rule {
    or([em("\\'", '\''), capture(seq([s("\\"), any()]))])
}

fn quoted(quote: &'static str, escape: Rule) -> Rule {
    // Consumes ordinary characters up to the next backslash or closing
    // quote in one scan.
    let normal = capture(scan(move |text: &str| {
        for (i, &b) in text.as_bytes().iter().enumerate() {
            if b == b'\\' || (b == quote.as_bytes()[0] && text[i..].starts_with(quote)) {
                return if i == 0 { None } else { Some(i) };
            }
        }
        Some(text.len())
    }));

    let segment = or([escape, normal]);

    let body = many(
        seq([not(s(quote)), segment]),
        0,
        None,
        Some(Box::new(|segments: &[Option<Value>]| {
            let mut out = String::new();
            for value in segments.iter().flatten() {
                if let Some(text) = value.downcast_ref::<String>() {
                    out.push_str(text);
                } else if let Some(c) = value.downcast_ref::<char>() {
                    out.push(*c);
                }
            }
            Some(Value::new(StringValue { value: out }))
        })),
    );

    seq([s(quote), body, s(quote)])
}

/// `"..."` with full escape decoding.
pub fn double_quoted() -> Rule {
    quoted("\"", escaped())
}

/// `"""..."""` with full escape decoding.
pub fn triple_double_quoted() -> Rule {
    quoted("\"\"\"", escaped())
}

/// `'...'` where only `\'` unescapes.
pub fn single_quoted() -> Rule {
    quoted("'", single_escape())
}

/// `'''...'''` where only `\'` unescapes.
pub fn triple_single_quoted() -> Rule {
    quoted("'''", single_escape())
}

/// Any of the quoted forms. Triple quotes are tried before their
/// single-character counterparts so that `''' ... '''` is not read as an
/// empty `'...'` string.
pub fn string() -> Rule {
    or([
        triple_single_quoted(),
        single_quoted(),
        triple_double_quoted(),
        double_quoted(),
    ])
}
