//! IEEE 488.2 definite-length block-data helpers.
//!
//! Grounded on `examples/original_source/scpidev/utils.py`:
//! `create_block_data_string` (encoding) and `str2int` (radix-prefixed
//! integer decoding).

use thiserror::Error;

/// Errors decoding a `#B`/`#Q`/`#H`-prefixed integer literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RadixDecodeError {
    #[error("{0:?} has no '#' radix prefix")]
    MissingPrefix(String),

    #[error("{0:?} has an unrecognized radix prefix")]
    UnknownRadix(String),

    #[error("{0:?} has no digits after the radix prefix")]
    EmptyDigits(String),

    #[error("{digits:?} is not a valid base-{radix} integer")]
    InvalidDigits { digits: String, radix: u32 },
}

/// Encode `payload` as an IEEE 488.2 definite-length block:
/// `#<n><len><payload>` where `len` is the decimal byte length of `payload`
/// and `n` is the number of decimal digits in `len`.
///
/// ```
/// assert_eq!(scpi_device::grammar::block::encode("abcdefghijk"), "#211abcdefghijk");
/// ```
pub fn encode(payload: &str) -> String {
    let len = payload.len();
    let len_digits = len.to_string();
    format!("#{}{}{}", len_digits.len(), len_digits, payload)
}

/// Decode a `#B`/`#b` (binary), `#Q`/`#q` (octal) or `#H`/`#h` (hex)
/// radix-prefixed integer literal into an `i64`.
pub fn decode_radix_int(input: &str) -> Result<i64, RadixDecodeError> {
    let mut chars = input.chars();
    match chars.next() {
        Some('#') => {}
        _ => return Err(RadixDecodeError::MissingPrefix(input.to_string())),
    }

    let radix_char = chars
        .next()
        .ok_or_else(|| RadixDecodeError::MissingPrefix(input.to_string()))?;
    let radix = match radix_char {
        'B' | 'b' => 2,
        'Q' | 'q' => 8,
        'H' | 'h' => 16,
        _ => return Err(RadixDecodeError::UnknownRadix(input.to_string())),
    };

    let digits = chars.as_str();
    if digits.is_empty() {
        return Err(RadixDecodeError::EmptyDigits(input.to_string()));
    }

    i64::from_str_radix(digits, radix).map_err(|_| RadixDecodeError::InvalidDigits {
        digits: digits.to_string(),
        radix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_matches_reference_example() {
        assert_eq!(encode("abcdefghijk"), "#211abcdefghijk");
    }

    #[test]
    fn encode_empty_payload() {
        assert_eq!(encode(""), "#10");
    }

    #[test]
    fn decode_each_radix() {
        assert_eq!(decode_radix_int("#B1010").unwrap(), 10);
        assert_eq!(decode_radix_int("#Q17").unwrap(), 15);
        assert_eq!(decode_radix_int("#HFF").unwrap(), 255);
        assert_eq!(decode_radix_int("#h1f").unwrap(), 31);
    }

    #[test]
    fn decode_rejects_malformed_input() {
        assert!(decode_radix_int("1010").is_err());
        assert!(decode_radix_int("#Z10").is_err());
        assert!(decode_radix_int("#H").is_err());
        assert!(decode_radix_int("#HZZ").is_err());
    }
}
