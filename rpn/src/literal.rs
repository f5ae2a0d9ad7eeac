//! Numeric and datetime literals
//!
//! - commas are ignored: `1,000,000`
//! - `0x1f` is hexadecimal, `01011b` binary, `0755` octal
//! - a leading `\` turns the prefixes off: `\0755` is read in the input radix
//! - `-` or `:` past the first character marks a datetime: `2024-03-01`,
//!   `2024-03-01T08:30:00`
//! - anything else is read in the input radix; radix 10 also takes
//!   decimals, ratios (`1/3`) and exponents (`6.02e23`)

use rpn_core::{DateTimeValue, Number, RpnError, Value};

pub fn parse_literal(term: &str, radix: u32) -> Result<Value, RpnError> {
    let text: String = term.chars().filter(|&c| c != ',').collect();
    if text.is_empty() {
        return Err(RpnError::Parse("empty term".to_string()));
    }

    if let Some(plain) = text.strip_prefix('\\') {
        return parse_in_radix(plain, radix);
    }

    if text.chars().skip(1).any(|c| c == '-' || c == ':') {
        match DateTimeValue::parse(&text) {
            Ok(datetime) => return Ok(Value::DateTime(datetime)),
            // `1e-5` carries a dash too
            Err(e) if radix != 10 => return Err(e),
            Err(_) => {}
        }
    }

    let (negative, magnitude) = match text.strip_prefix('-') {
        Some(rest) if !rest.is_empty() => (true, rest),
        _ => (false, text.as_str()),
    };
    let signed = |n: Number| Value::Scalar(if negative { n.neg() } else { n });

    if let Some(hex) = magnitude.strip_prefix("0x").or_else(|| magnitude.strip_prefix("0X")) {
        return Ok(signed(Number::from_str_radix(hex, 16)?));
    }
    if let Some(bits) = magnitude.strip_suffix(['b', 'B']) {
        if bits.starts_with('0') && bits.chars().all(|c| c == '0' || c == '1') {
            return Ok(signed(Number::from_str_radix(bits, 2)?));
        }
    }
    if magnitude.len() > 1 && magnitude.starts_with('0') && magnitude.chars().all(|c| c.is_ascii_digit()) {
        return Ok(signed(Number::from_str_radix(&magnitude[1..], 8)?));
    }

    parse_in_radix(&text, radix)
}

fn parse_in_radix(text: &str, radix: u32) -> Result<Value, RpnError> {
    let number = if radix == 10 {
        Number::from_str(text)?
    } else {
        Number::from_str_radix(text, radix)?
    };
    Ok(Value::Scalar(number))
}
