//! A four-function calculator with operator precedence, built from two
//! left-recursive branch levels.
//!
//! Run with:
//!
//! ```sh
//! cargo run --example calculator -- '1+2*3'
//! ```

use pegmatite::{
    Parser, Rule, Value, action, branches, eos, named, plus, range, seq, set, transform,
};

fn number() -> Rule {
    transform(plus(range('0', '9')), |text| {
        Some(Value::new(text.parse::<f64>().ok()?))
    })
}

fn value_of(values: &pegmatite::Values, name: &str) -> Option<f64> {
    values.get(name)?.downcast_ref::<f64>().copied()
}

fn grammar() -> Rule {
    let num = number();

    let num_for_term = num.clone();
    let term = branches("term", move |bb, this| {
        bb.add(
            "binary",
            action(
                seq([
                    named("lhs", this.clone()),
                    named("op", pegmatite::capture(set(['*', '/']))),
                    named("rhs", num_for_term.clone()),
                ]),
                |values| {
                    let lhs = value_of(values, "lhs")?;
                    let rhs = value_of(values, "rhs")?;
                    let result = match values.get("op")?.downcast_ref::<String>()?.as_str() {
                        "*" => lhs * rhs,
                        _ => lhs / rhs,
                    };
                    Some(Value::new(result))
                },
            ),
        );
        bb.add("num", num_for_term.clone());
    });

    let term_for_expr = term.clone();
    let expr = branches("expr", move |bb, this| {
        bb.add(
            "binary",
            action(
                seq([
                    named("lhs", this.clone()),
                    named("op", pegmatite::capture(set(['+', '-']))),
                    named("rhs", term_for_expr.clone()),
                ]),
                |values| {
                    let lhs = value_of(values, "lhs")?;
                    let rhs = value_of(values, "rhs")?;
                    let result = match values.get("op")?.downcast_ref::<String>()?.as_str() {
                        "+" => lhs + rhs,
                        _ => lhs - rhs,
                    };
                    Some(Value::new(result))
                },
            ),
        );
        bb.add("term", term_for_expr.clone());
    });

    seq([expr, eos()])
}

fn main() {
    let input = std::env::args().nth(1).unwrap_or_else(|| "1+2*3".to_string());

    let parser = Parser::new();
    let outcome = parser.parse(&grammar(), &input);

    if !outcome.matched {
        match outcome.error {
            Some(err) => eprintln!("{input}: {err}"),
            None => eprintln!("{input}: no parse"),
        }
        std::process::exit(1);
    }

    let result = outcome
        .value
        .and_then(|v| v.downcast_ref::<f64>().copied())
        .expect("calculator actions always produce a number");
    println!("{result}");
}
