//! Monetary amounts and the strict fixed-point grammar used to parse them.

use thiserror::Error;

/// Amount in base units (10^-8 of a coin).
pub type Amount = u64;

pub const COIN: Amount = 100_000_000;

/// No amount larger than this is valid.
pub const MAX_MONEY: Amount = 5_200_000_000 * COIN;

/// Largest mantissa the fixed-point parser accepts (18 significant digits).
const UPPER_BOUND: i64 = 1_000_000_000_000_000_000 - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount string too long")]
    TooLong,
    #[error("amount string contains invalid character")]
    InvalidCharacter,
    #[error("leading decimal point not allowed")]
    LeadingDecimalPoint,
    #[error("too many decimal points")]
    MultipleDecimalPoints,
    #[error("not a fixed-point number with at most 8 decimals")]
    NotFixedPoint,
    #[error("value outside of valid money range")]
    OutOfRange,
}

pub fn money_range(value: Amount) -> bool {
    value <= MAX_MONEY
}

/// Renders an amount as `coins.fraction` with all 8 decimals.
pub fn format_money(value: Amount) -> String {
    format!("{}.{:08}", value / COIN, value % COIN)
}

fn process_mantissa_digit(ch: u8, mantissa: &mut i64, mantissa_tzeros: &mut i64) -> bool {
    if ch == b'0' {
        *mantissa_tzeros += 1;
    } else {
        for _ in 0..=*mantissa_tzeros {
            if *mantissa > UPPER_BOUND / 10 {
                return false;
            }
            *mantissa *= 10;
        }
        *mantissa += i64::from(ch - b'0');
        *mantissa_tzeros = 0;
    }
    true
}

/// Parses `val` as a fixed-point number with `decimals` fractional digits.
///
/// The grammar is deliberately narrow: an optional `-`, then either a single
/// `0` or a digit run that does not start with `0`, then an optional `.`
/// followed by at least one digit, then an optional exponent. Fractional
/// digits beyond `decimals` are only accepted when they are zeros. Values at
/// or above `10^(18 - decimals)` are rejected.
pub fn parse_fixed_point(val: &str, decimals: i64) -> Option<i64> {
    let bytes = val.as_bytes();
    let end = bytes.len();
    let mut ptr = 0usize;
    let mut mantissa: i64 = 0;
    let mut exponent: i64 = 0;
    let mut mantissa_tzeros: i64 = 0;
    let mut mantissa_sign = false;
    let mut exponent_sign = false;
    let mut point_ofs: i64 = 0;

    let is_digit = |p: usize| p < end && bytes[p].is_ascii_digit();

    if ptr < end && bytes[ptr] == b'-' {
        mantissa_sign = true;
        ptr += 1;
    }
    if ptr >= end {
        return None;
    }
    if bytes[ptr] == b'0' {
        // a single leading zero
        ptr += 1;
    } else if is_digit(ptr) {
        while is_digit(ptr) {
            if !process_mantissa_digit(bytes[ptr], &mut mantissa, &mut mantissa_tzeros) {
                return None;
            }
            ptr += 1;
        }
    } else {
        return None;
    }

    if ptr < end && bytes[ptr] == b'.' {
        ptr += 1;
        if !is_digit(ptr) {
            return None;
        }
        while is_digit(ptr) {
            if !process_mantissa_digit(bytes[ptr], &mut mantissa, &mut mantissa_tzeros) {
                return None;
            }
            ptr += 1;
            point_ofs += 1;
        }
    }

    if ptr < end && (bytes[ptr] == b'e' || bytes[ptr] == b'E') {
        ptr += 1;
        if ptr < end && bytes[ptr] == b'+' {
            ptr += 1;
        } else if ptr < end && bytes[ptr] == b'-' {
            exponent_sign = true;
            ptr += 1;
        }
        if !is_digit(ptr) {
            return None;
        }
        while is_digit(ptr) {
            if exponent > UPPER_BOUND / 10 {
                return None;
            }
            exponent = exponent * 10 + i64::from(bytes[ptr] - b'0');
            ptr += 1;
        }
    }

    // trailing garbage
    if ptr != end {
        return None;
    }

    if exponent_sign {
        exponent = -exponent;
    }
    exponent = exponent - point_ofs + mantissa_tzeros + decimals;
    if mantissa_sign {
        mantissa = -mantissa;
    }

    if !(0..18).contains(&exponent) {
        return None;
    }
    for _ in 0..exponent {
        if mantissa > UPPER_BOUND / 10 || mantissa < -(UPPER_BOUND / 10) {
            return None;
        }
        mantissa *= 10;
    }
    if mantissa > UPPER_BOUND || mantissa < -UPPER_BOUND {
        return None;
    }
    Some(mantissa)
}
