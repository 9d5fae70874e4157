//! Fixed-point amount conversion
//!
//! Display amounts carry 7 fractional digits. Parsing is exact decimal
//! arithmetic; no floating point is involved in either direction.
//!
//! `to_stroops` truncates digits beyond the 7th, so decimal -> stroops is lossy
//! at sub-stroop precision. `to_display` is exact, which makes
//! `to_stroops(&to_display(x)) == x` hold for every non-negative `x`.

use thiserror::Error;
use xhedge_core::constants::{DECIMALS, STROOPS_PER_UNIT};
use xhedge_core::{Stroops, TxError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Amount must not be negative")]
    Negative,

    #[error("Amount is not a finite number: {0}")]
    NotFinite(String),

    #[error("Amount is not a decimal number: {0}")]
    Malformed(String),

    #[error("Amount is too large")]
    Overflow,
}

impl From<AmountError> for TxError {
    fn from(e: AmountError) -> Self {
        TxError::InvalidAmount {
            message: e.to_string(),
        }
    }
}

/// Parse a decimal string into stroops, truncating toward zero.
pub fn to_stroops(input: &str) -> Result<Stroops, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(AmountError::Negative);
    }
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let lowered = unsigned.to_ascii_lowercase();
    if matches!(lowered.as_str(), "inf" | "infinity" | "nan") {
        return Err(AmountError::NotFinite(trimmed.to_string()));
    }

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty())
        || !all_digits(int_part)
        || !all_digits(frac_part)
    {
        return Err(AmountError::Malformed(trimmed.to_string()));
    }

    let whole = parse_digits(int_part)?
        .checked_mul(STROOPS_PER_UNIT)
        .ok_or(AmountError::Overflow)?;

    // Keep exactly DECIMALS digits: drop the rest, right-pad the short ones
    let kept: String = frac_part
        .chars()
        .chain(std::iter::repeat('0'))
        .take(DECIMALS as usize)
        .collect();
    let fraction = parse_digits(&kept)?;

    whole.checked_add(fraction).ok_or(AmountError::Overflow)
}

/// Format stroops with exactly 7 fractional digits.
pub fn to_display(stroops: Stroops) -> String {
    let sign = if stroops < 0 { "-" } else { "" };
    let abs = stroops.unsigned_abs();
    let scale = STROOPS_PER_UNIT as u128;
    format!(
        "{}{}.{:0width$}",
        sign,
        abs / scale,
        abs % scale,
        width = DECIMALS as usize
    )
}

fn parse_digits(digits: &str) -> Result<Stroops, AmountError> {
    digits.bytes().try_fold(0i128, |acc, b| {
        acc.checked_mul(10)
            .and_then(|v| v.checked_add((b - b'0') as i128))
            .ok_or(AmountError::Overflow)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_stroops_basic() {
        assert_eq!(to_stroops("100.5").unwrap(), 1_005_000_000);
        assert_eq!(to_stroops("12.5").unwrap(), 125_000_000);
        assert_eq!(to_stroops("1").unwrap(), 10_000_000);
        assert_eq!(to_stroops("0.0000001").unwrap(), 1);
        assert_eq!(to_stroops(".5").unwrap(), 5_000_000);
        assert_eq!(to_stroops("5.").unwrap(), 50_000_000);
        assert_eq!(to_stroops(" +2 ").unwrap(), 20_000_000);
        assert_eq!(to_stroops("0").unwrap(), 0);
    }

    #[test]
    fn test_to_stroops_truncates_sub_stroop_digits() {
        assert_eq!(to_stroops("0.00000019").unwrap(), 1);
        assert_eq!(to_stroops("1.99999999999").unwrap(), 19_999_999);
    }

    #[test]
    fn test_to_stroops_is_exact_where_floats_drift() {
        // 0.1 + 0.2 style inputs that parseFloat * 1e7 gets wrong
        assert_eq!(to_stroops("0.3").unwrap(), 3_000_000);
        assert_eq!(to_stroops("1.1").unwrap(), 11_000_000);
        assert_eq!(to_stroops("4.35").unwrap(), 43_500_000);
    }

    #[test]
    fn test_to_stroops_rejects() {
        assert_eq!(to_stroops(""), Err(AmountError::Empty));
        assert_eq!(to_stroops("   "), Err(AmountError::Empty));
        assert_eq!(to_stroops("-5"), Err(AmountError::Negative));
        assert!(matches!(to_stroops("NaN"), Err(AmountError::NotFinite(_))));
        assert!(matches!(to_stroops("inf"), Err(AmountError::NotFinite(_))));
        assert!(matches!(to_stroops("1e5"), Err(AmountError::Malformed(_))));
        assert!(matches!(to_stroops("1.2.3"), Err(AmountError::Malformed(_))));
        assert!(matches!(to_stroops("."), Err(AmountError::Malformed(_))));
        assert!(matches!(to_stroops("12,5"), Err(AmountError::Malformed(_))));
        assert_eq!(
            to_stroops("999999999999999999999999999999999999999"),
            Err(AmountError::Overflow)
        );
    }

    #[test]
    fn test_to_display() {
        assert_eq!(to_display(0), "0.0000000");
        assert_eq!(to_display(1), "0.0000001");
        assert_eq!(to_display(1_005_000_000), "100.5000000");
        assert_eq!(to_display(10_000_000_000), "1000.0000000");
        assert_eq!(to_display(-15_000_000), "-1.5000000");
    }

    #[test]
    fn test_display_round_trip() {
        for x in [0i128, 1, 9, 10_000_000, 123_456_789, 1_005_000_000, i64::MAX as i128] {
            assert_eq!(to_stroops(&to_display(x)).unwrap(), x);
        }
    }
}
