//! Number grammars: signed and unsigned integers in bases 2, 8, 10, and
//! 16, decimal and hexadecimal floats, and scientific notation, all
//! allowing `_` digit separators after the first digit.
//!
//! Rules produce a [`NumberValue`] carrying the matched digits and shape;
//! conversion to machine types happens on demand through
//! [`NumberValue::as_int`] and [`NumberValue::as_f64`].

use pegmatite::{
    Labels, Rule, RuleValue, Value, Values, action, capture, maybe, named, or, range, refs, s,
    seq, set, star, transform,
};
use thiserror::Error;

/// A parsed number, kept symbolic.
///
/// `digits` holds the integral digits as matched (separators included),
/// `post_decimal` any digits after the decimal point, and `power` the
/// exponent part: base 10 for scientific notation, base 2 for hexadecimal
/// floats (where `p` scales by powers of two).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberValue {
    pub base: u32,
    pub digits: String,
    pub negative: bool,
    pub post_decimal: String,
    pub power: Option<Box<NumberValue>>,
}

impl RuleValue for NumberValue {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error("digit {digit:?} out of range for base {base}")]
    DigitRange { digit: char, base: u32 },
    #[error("number does not fit the requested width")]
    Overflow,
}

/// Digits of `text` (skipping `_`) as an unsigned magnitude.
fn digits_value(text: &str, base: u32) -> Result<u128, NumberError> {
    let mut acc: u128 = 0;
    for digit in text.chars() {
        if digit == '_' {
            continue;
        }
        let d = digit
            .to_digit(base)
            .ok_or(NumberError::DigitRange { digit, base })?;
        acc = acc
            .checked_mul(u128::from(base))
            .and_then(|acc| acc.checked_add(u128::from(d)))
            .ok_or(NumberError::Overflow)?;
    }
    Ok(acc)
}

fn digit_count(text: &str) -> usize {
    text.chars().filter(|c| *c != '_').count()
}

impl NumberValue {
    /// The integral digits as an `i64`. Fractional and exponent parts are
    /// ignored.
    pub fn as_int(&self) -> Result<i64, NumberError> {
        let magnitude = digits_value(&self.digits, self.base)?;
        let signed = i64::try_from(magnitude).map_err(|_| NumberError::Overflow)?;
        Ok(if self.negative { -signed } else { signed })
    }

    /// The full value — sign, fraction, and exponent — as an `f64`.
    ///
    /// The mantissa is assembled exactly in integer arithmetic and scaled
    /// with a single multiplication or division, so values whose mantissa
    /// and scale are representable convert exactly.
    pub fn as_f64(&self) -> Result<f64, NumberError> {
        let frac_len = i32::try_from(digit_count(&self.post_decimal))
            .map_err(|_| NumberError::Overflow)?;

        let mut mantissa = digits_value(&self.digits, self.base)?;
        if frac_len > 0 {
            let frac = digits_value(&self.post_decimal, self.base)?;
            for _ in 0..frac_len {
                mantissa = mantissa
                    .checked_mul(u128::from(self.base))
                    .ok_or(NumberError::Overflow)?;
            }
            mantissa = mantissa.checked_add(frac).ok_or(NumberError::Overflow)?;
        }

        // The fraction shifts the exponent down: by one digit in the
        // digits' own base, or by four bits per hex digit under a binary
        // exponent.
        let (exp_base, exponent) = match &self.power {
            Some(power) => {
                let magnitude = i32::try_from(digits_value(&power.digits, power.base)?)
                    .map_err(|_| NumberError::Overflow)?;
                let signed = if power.negative { -magnitude } else { magnitude };
                if power.base == 2 && self.base == 16 {
                    (2u32, signed - 4 * frac_len)
                } else {
                    (power.base, signed - frac_len)
                }
            }
            None => (self.base, -frac_len),
        };

        let mantissa = mantissa as f64;
        let value = if exponent >= 0 {
            mantissa * f64::from(exp_base).powi(exponent)
        } else {
            mantissa / f64::from(exp_base).powi(-exponent)
        };
        Ok(if self.negative { -value } else { value })
    }
}

fn number_value(base: u32, digits: &str) -> Option<Value> {
    Some(Value::new(NumberValue {
        base,
        digits: digits.to_string(),
        ..Default::default()
    }))
}

/// A run of `rule` digits with `_` separators allowed after the first.
fn xset(rule: Rule) -> Rule {
    seq([rule.clone(), star(or([s("_"), rule]))])
}

fn hex_digit() -> Rule {
    or([range('0', '9'), range('a', 'f'), range('A', 'F')])
}

fn sign() -> Rule {
    transform(set(['-', '+']), |text| Some(Value::new(text == "-")))
}

fn set_sign(values: &Values) -> Option<Value> {
    let mut num = values.get("num")?.downcast_ref::<NumberValue>()?.clone();
    if let Some(negative) = values.get("sign").and_then(|v| v.downcast_ref::<bool>()) {
        num.negative = *negative;
    }
    Some(Value::new(num))
}

/// The number rule set. Every rule is a named, memoized reference.
pub struct Numbers {
    /// Hexadecimal integer, e.g. `0x1d`.
    pub hex_int: Rule,
    /// Binary integer, e.g. `0b1101`.
    pub binary_int: Rule,
    /// Octal integer, e.g. `0o644` or `0644`.
    pub octal_int: Rule,
    /// Decimal integer, e.g. `42`.
    pub decimal_int: Rule,
    /// Any unsigned integer form.
    pub unsigned_int: Rule,
    /// Any integer form with an optional sign.
    pub int: Rule,
    /// Unsigned decimal float, e.g. `1.42`.
    pub unsigned_float: Rule,
    /// Unsigned hexadecimal float, e.g. `0x123.fffp5`.
    pub unsigned_hex_float: Rule,
    /// Any float form with an optional sign.
    pub float: Rule,
    /// Scientific notation, e.g. `1e16` or `-3.14e8`.
    pub sci_num: Rule,
    /// Any number form.
    pub number: Rule,
}

impl Numbers {
    pub fn new() -> Self {
        let mut labels: Labels = refs();

        let hex_int = labels
            .set(
                "hex-int",
                seq([
                    s("0x"),
                    transform(xset(hex_digit()), |t| number_value(16, t)),
                ]),
            )
            .rule();

        let binary_int = labels
            .set(
                "binary-int",
                seq([
                    s("0b"),
                    transform(xset(range('0', '1')), |t| number_value(2, t)),
                ]),
            )
            .rule();

        let octal_int = labels
            .set(
                "octal-int",
                or([
                    seq([
                        s("0o"),
                        transform(xset(range('0', '7')), |t| number_value(8, t)),
                    ]),
                    seq([
                        s("0"),
                        transform(xset(range('0', '7')), |t| number_value(8, t)),
                    ]),
                ]),
            )
            .rule();

        let decimal_int = labels
            .set(
                "decimal-int",
                transform(xset(range('0', '9')), |t| number_value(10, t)),
            )
            .rule();

        let unsigned_int = labels
            .set(
                "unsigned-int",
                or([
                    hex_int.clone(),
                    binary_int.clone(),
                    octal_int.clone(),
                    decimal_int.clone(),
                ]),
            )
            .rule();

        let int = labels
            .set(
                "int",
                action(
                    seq([
                        maybe(named("sign", sign())),
                        named("num", unsigned_int.clone()),
                    ]),
                    set_sign,
                ),
            )
            .rule();

        let unsigned_float = labels
            .set(
                "unsigned-float",
                action(
                    seq([
                        named("lhs", decimal_int.clone()),
                        s("."),
                        named("rhs", decimal_int.clone()),
                    ]),
                    |values| {
                        let mut lhs =
                            values.get("lhs")?.downcast_ref::<NumberValue>()?.clone();
                        let rhs = values.get("rhs")?.downcast_ref::<NumberValue>()?;
                        lhs.post_decimal = rhs.digits.clone();
                        Some(Value::new(lhs))
                    },
                ),
            )
            .rule();

        let unsigned_hex_float = labels
            .set(
                "unsigned-hex-float",
                action(
                    seq([
                        named("lhs", hex_int.clone()),
                        s("."),
                        named("rhs", capture(star(hex_digit()))),
                        set(['p', 'P']),
                        named("sign", maybe(sign())),
                        named("power", decimal_int.clone()),
                    ]),
                    |values| {
                        let mut lhs =
                            values.get("lhs")?.downcast_ref::<NumberValue>()?.clone();
                        let rhs = values.get("rhs")?.downcast_ref::<String>()?.clone();
                        let mut power =
                            values.get("power")?.downcast_ref::<NumberValue>()?.clone();
                        if let Some(negative) =
                            values.get("sign").and_then(|v| v.downcast_ref::<bool>())
                        {
                            power.negative = *negative;
                        }
                        power.base = 2;
                        lhs.post_decimal = rhs;
                        lhs.power = Some(Box::new(power));
                        Some(Value::new(lhs))
                    },
                ),
            )
            .rule();

        let float = labels
            .set(
                "float",
                action(
                    seq([
                        named("sign", maybe(sign())),
                        named(
                            "num",
                            or([unsigned_float.clone(), unsigned_hex_float.clone()]),
                        ),
                    ]),
                    set_sign,
                ),
            )
            .rule();

        let sci_num = labels
            .set(
                "sci",
                action(
                    seq([
                        named("num", or([float.clone(), unsigned_int.clone()])),
                        set(['e', 'E']),
                        maybe(named("sign", sign())),
                        named("power", decimal_int.clone()),
                    ]),
                    |values| {
                        let mut num =
                            values.get("num")?.downcast_ref::<NumberValue>()?.clone();
                        let mut power =
                            values.get("power")?.downcast_ref::<NumberValue>()?.clone();
                        if let Some(negative) =
                            values.get("sign").and_then(|v| v.downcast_ref::<bool>())
                        {
                            power.negative = *negative;
                        }
                        num.power = Some(Box::new(power));
                        Some(Value::new(num))
                    },
                ),
            )
            .rule();

        let number = labels
            .set("number", or([sci_num.clone(), float.clone(), int.clone()]))
            .rule();

        Self {
            hex_int,
            binary_int,
            octal_int,
            decimal_int,
            unsigned_int,
            int,
            unsigned_float,
            unsigned_hex_float,
            float,
            sci_num,
            number,
        }
    }
}

impl Default for Numbers {
    fn default() -> Self {
        Self::new()
    }
}

/// The catch-all number rule; shorthand for `Numbers::new().number`.
pub fn number() -> Rule {
    Numbers::new().number
}
