// Licensed under the Apache-2.0 license.

//! Verilog-style integer literals used by constants and field defaults.

use crate::error::{CompileError, CompileResult};
use crate::util::bits_for_value;
use serde::Serialize;
use winnow::ascii::digit1;
use winnow::combinator::{alt, opt, preceded};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

/// A sized or unsized integer, similar to Verilog integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Integer {
    /// Width in bits, if the literal was sized.
    pub width: Option<u32>,
    /// The integer value.
    pub value: u64,
}

impl Integer {
    pub fn sized(width: u32, value: u64) -> Self {
        Integer {
            width: Some(width),
            value,
        }
    }

    pub fn unsized_value(value: u64) -> Self {
        Integer { width: None, value }
    }

    /// Whether the value can be stored in a field of `width` bits.
    pub fn fits(&self, width: u32) -> bool {
        bits_for_value(self.value) <= width
    }
}

impl std::fmt::Display for Integer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.width {
            Some(w) => write!(f, "{w}'d{}", self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

impl std::str::FromStr for Integer {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_literal(s)
    }
}

/// Raw pieces of a literal before conversion: size, base and digits.
type LiteralParts<'s> = (Option<&'s str>, Option<char>, &'s str);

fn based_literal<'s>(input: &mut &'s str) -> ModalResult<LiteralParts<'s>> {
    (
        opt(digit1),
        preceded(
            ("'", opt(one_of(['s', 'S']))),
            one_of(['b', 'B', 'o', 'O', 'd', 'D', 'h', 'H']),
        ),
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .map(|(size, base, digits)| (size, Some(base), digits))
        .parse_next(input)
}

fn decimal_literal<'s>(input: &mut &'s str) -> ModalResult<LiteralParts<'s>> {
    take_while(1.., |c: char| c.is_ascii_digit() || c == '_')
        .map(|digits| (None, None, digits))
        .parse_next(input)
}

fn literal_parts<'s>(input: &mut &'s str) -> ModalResult<LiteralParts<'s>> {
    alt((based_literal, decimal_literal)).parse_next(input)
}

/// Parses a literal such as `42`, `2'd0`, `8'hFF` or `4'b10_01`.
pub fn parse_literal(text: &str) -> CompileResult<Integer> {
    let invalid = |reason: String| CompileError::InvalidLiteral {
        text: text.to_string(),
        reason,
    };

    let (size, base, digits) = literal_parts
        .parse(text.trim())
        .map_err(|e| invalid(e.to_string()))?;

    let radix = match base.map(|b| b.to_ascii_lowercase()) {
        Some('b') => 2,
        Some('o') => 8,
        Some('h') => 16,
        _ => 10,
    };
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err(invalid("no digits".to_string()));
    }
    let value = u64::from_str_radix(&cleaned, radix)
        .map_err(|e| invalid(format!("bad base-{radix} digits: {e}")))?;

    let width = match size {
        Some(size) => {
            let width: u32 = size
                .parse()
                .map_err(|_| invalid("size out of range".to_string()))?;
            if width == 0 {
                return Err(invalid("size must be positive".to_string()));
            }
            if bits_for_value(value) > width {
                return Err(invalid(format!("value {value} needs more than {width} bits")));
            }
            Some(width)
        }
        None => None,
    };

    Ok(Integer { width, value })
}
