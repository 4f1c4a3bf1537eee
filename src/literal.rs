use crate::error::AsmError;

/// Parse a numeric or character token into an integer.
///
/// Recognized forms, first match wins:
///   - `"x"`   the byte value of the first character inside the quotes
///   - `0x1f`  hexadecimal
///   - `1fh`   hexadecimal
///   - bare tokens containing a hex letter, or of even length with a leading
///     `0` (`0a`, `00`, `0100`), are read as hexadecimal
///   - anything else is decimal
///
/// The bare-hex rule is ambiguous on purpose: `10` is ten, `010` is ten,
/// but `0010` is sixteen. Existing sources depend on it.
pub fn parse_literal(token: &str) -> Result<i64, AsmError> {
    let t = token.trim();
    let invalid = || AsmError::InvalidLiteral(t.to_string());

    if let Some(rest) = t.strip_prefix('"') {
        let inner = rest.find('"').map(|end| &rest[..end]).ok_or_else(invalid)?;
        return inner.bytes().next().map(i64::from).ok_or_else(invalid);
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return parse_radix(hex, 16).ok_or_else(invalid);
    }
    if let Some(hex) = t.strip_suffix('h').or_else(|| t.strip_suffix('H')) {
        return parse_radix(hex, 16).ok_or_else(invalid);
    }
    if looks_like_hex(t) {
        return parse_radix(t, 16).ok_or_else(invalid);
    }
    parse_radix(t, 10).ok_or_else(invalid)
}

fn looks_like_hex(t: &str) -> bool {
    t.chars().any(|c| matches!(c.to_ascii_lowercase(), 'a'..='f'))
        || (t.len() % 2 == 0 && t.starts_with('0'))
}

fn parse_radix(digits: &str, radix: u32) -> Option<i64> {
    // from_str_radix accepts a lone sign; require at least one digit
    let unsigned = digits.strip_prefix('-').unwrap_or(digits);
    if unsigned.is_empty() || unsigned.starts_with('+') {
        return None;
    }
    i64::from_str_radix(digits, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_hex_forms() {
        assert_eq!(parse_literal("0x1234").unwrap(), 0x1234);
        assert_eq!(parse_literal("1234h").unwrap(), 0x1234);
        assert_eq!(parse_literal("0ffh").unwrap(), 0xff);
    }

    #[test]
    fn bare_hex_heuristic() {
        assert_eq!(parse_literal("ff").unwrap(), 0xff);
        assert_eq!(parse_literal("0a").unwrap(), 0x0a);
        assert_eq!(parse_literal("0010").unwrap(), 0x10);
        assert_eq!(parse_literal("00").unwrap(), 0);
        // odd length or no leading zero stays decimal
        assert_eq!(parse_literal("10").unwrap(), 10);
        assert_eq!(parse_literal("010").unwrap(), 10);
        assert_eq!(parse_literal("0").unwrap(), 0);
        assert_eq!(parse_literal("30000").unwrap(), 30000);
    }

    #[test]
    fn quoted_char_uses_first_byte() {
        assert_eq!(parse_literal("\"A\"").unwrap(), 65);
        assert_eq!(parse_literal("\"hi\"").unwrap(), i64::from(b'h'));
        assert_eq!(parse_literal("\";\"").unwrap(), i64::from(b';'));
    }

    #[test]
    fn negative_decimal() {
        assert_eq!(parse_literal("-2").unwrap(), -2);
    }

    #[test]
    fn malformed_literals() {
        for bad in ["", "12z", "0x", "h", "zz", "\"\"", "\"a", "-", "1.5", "+5"] {
            assert_eq!(
                parse_literal(bad),
                Err(AsmError::InvalidLiteral(bad.to_string())),
                "{bad:?} should not parse"
            );
        }
    }
}
