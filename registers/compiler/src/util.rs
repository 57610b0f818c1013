// Licensed under the Apache-2.0 license

//! Identifier checks and number formatting shared by the compiler stages.
//!
//! Names that end up in generated hardware must be legal SystemVerilog
//! identifiers, so the checks here follow the downstream generator's rules
//! rather than Rust's.

/// Checks that `name` can be used as an identifier by the downstream
/// generator.
///
/// Returns the reason for rejection on failure.
///
/// # Examples
/// ```
/// use manjuu_csr::util::check_identifier;
/// assert!(check_identifier("left_edge").is_ok());
/// assert!(check_identifier("0edge").is_err());
/// assert!(check_identifier("wire").is_err());
/// ```
pub fn check_identifier(name: &str) -> Result<(), &'static str> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err("name is empty");
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err("must start with a letter or underscore");
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("may only contain letters, digits and underscores");
    }
    if is_reserved(name) {
        return Err("is a reserved keyword");
    }
    Ok(())
}

/// SystemVerilog keywords that would clash in generated port and struct
/// member names.
fn is_reserved(s: &str) -> bool {
    matches!(
        s,
        "always"
            | "always_comb"
            | "always_ff"
            | "assign"
            | "begin"
            | "bit"
            | "byte"
            | "case"
            | "default"
            | "else"
            | "end"
            | "endcase"
            | "endmodule"
            | "enum"
            | "for"
            | "function"
            | "if"
            | "inout"
            | "input"
            | "int"
            | "integer"
            | "localparam"
            | "logic"
            | "module"
            | "output"
            | "packed"
            | "parameter"
            | "reg"
            | "signed"
            | "struct"
            | "typedef"
            | "union"
            | "unsigned"
            | "wire"
    )
}

/// Number of bits needed to encode every value in `0..count`.
///
/// Always at least one bit.
pub fn bits_for_count(count: usize) -> u32 {
    if count <= 2 {
        1
    } else {
        usize::BITS - (count - 1).leading_zeros()
    }
}

/// Number of bits needed to represent `value`. Zero needs one bit.
pub fn bits_for_value(value: u64) -> u32 {
    (u64::BITS - value.leading_zeros()).max(1)
}

/// Formats an integer as a hex constant with underscores for readability.
///
/// Values <= 9 are formatted as decimal; larger values use hex with
/// underscore separators every 4 digits.
///
/// # Examples
/// ```
/// use manjuu_csr::util::hex_const;
/// assert_eq!(hex_const(5), "5");
/// assert_eq!(hex_const(0x1234), "0x1234");
/// assert_eq!(hex_const(0x12345678), "0x1234_5678");
/// ```
pub fn hex_const(val: u64) -> String {
    if val > 9 {
        let mut x = String::new();
        for (i, c) in format!("{val:x}").chars().rev().enumerate() {
            if i % 4 == 0 && i != 0 {
                x.push('_');
            }
            x.push(c);
        }
        "0x".to_string() + &x.chars().rev().collect::<String>()
    } else {
        format!("{val}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_identifier() {
        assert!(check_identifier("x0").is_ok());
        assert!(check_identifier("_tmp").is_ok());
        assert!(check_identifier("trigger_valid").is_ok());
        assert_eq!(check_identifier(""), Err("name is empty"));
        assert!(check_identifier("9lives").is_err());
        assert!(check_identifier("edge-0").is_err());
        assert!(check_identifier("x y").is_err());
        assert!(check_identifier("logic").is_err());
        // Keywords are case-sensitive in SystemVerilog
        assert!(check_identifier("Logic").is_ok());
    }

    #[test]
    fn test_bits_for_count() {
        assert_eq!(bits_for_count(0), 1);
        assert_eq!(bits_for_count(1), 1);
        assert_eq!(bits_for_count(2), 1);
        assert_eq!(bits_for_count(3), 2);
        assert_eq!(bits_for_count(4), 2);
        assert_eq!(bits_for_count(5), 3);
        assert_eq!(bits_for_count(256), 8);
        assert_eq!(bits_for_count(257), 9);
    }

    #[test]
    fn test_bits_for_value() {
        assert_eq!(bits_for_value(0), 1);
        assert_eq!(bits_for_value(1), 1);
        assert_eq!(bits_for_value(2), 2);
        assert_eq!(bits_for_value(0xff), 8);
        assert_eq!(bits_for_value(u64::MAX), 64);
    }

    #[test]
    fn test_hex_const() {
        assert_eq!(hex_const(0), "0");
        assert_eq!(hex_const(9), "9");
        assert_eq!(hex_const(10), "0xa");
        assert_eq!(hex_const(0x1234), "0x1234");
        assert_eq!(hex_const(0x12345678), "0x1234_5678");
    }
}
