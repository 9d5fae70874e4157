//! Vault share math
//!
//! Pure integer functions. No async, no RPC.
//!
//! The share price formula:
//!   price = (total_assets * 10^7) / total_shares
//!
//! Conversions mirror the contract: 1:1 while the vault is empty, pro-rata
//! with floor division afterwards.

use soroban_tx::to_display;
use xhedge_core::constants::STROOPS_PER_UNIT;
use xhedge_core::Stroops;

/// Share price in stroops of asset per whole share, floored.
///
/// Returns `STROOPS_PER_UNIT` (1.0) when there are no shares. Computed as
/// `q * 10^7 + r * 10^7 / shares` so the intermediate product stays small.
pub fn share_price_stroops(total_assets: Stroops, total_shares: Stroops) -> Stroops {
    if total_shares <= 0 {
        return STROOPS_PER_UNIT;
    }
    let whole = total_assets.div_euclid(total_shares);
    let rem = total_assets.rem_euclid(total_shares);
    let frac = rem
        .checked_mul(STROOPS_PER_UNIT)
        .map(|v| v / total_shares)
        // rem < total_shares, so this only triggers for astronomically large supplies
        .unwrap_or_else(|| rem / (total_shares / STROOPS_PER_UNIT).max(1));
    whole
        .saturating_mul(STROOPS_PER_UNIT)
        .saturating_add(frac)
}

/// Share price with exactly 7 fractional digits
pub fn share_price(total_assets: Stroops, total_shares: Stroops) -> String {
    to_display(share_price_stroops(total_assets, total_shares))
}

/// Shares minted for depositing `amount`. `None` on negative input or overflow.
pub fn convert_to_shares(
    amount: Stroops,
    total_assets: Stroops,
    total_shares: Stroops,
) -> Option<Stroops> {
    if amount < 0 {
        return None;
    }
    if total_shares == 0 || total_assets == 0 {
        return Some(amount);
    }
    amount.checked_mul(total_shares)?.checked_div(total_assets)
}

/// Assets redeemable for `shares`. `None` on negative input or overflow.
pub fn convert_to_assets(
    shares: Stroops,
    total_assets: Stroops,
    total_shares: Stroops,
) -> Option<Stroops> {
    if shares < 0 {
        return None;
    }
    if total_shares == 0 {
        return Some(shares);
    }
    shares.checked_mul(total_assets)?.checked_div(total_shares)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_price_bootstrap() {
        assert_eq!(share_price(0, 0), "1.0000000");
        assert_eq!(share_price(5_000_000_000, 0), "1.0000000");
        assert_eq!(share_price(123, -1), "1.0000000");
    }

    #[test]
    fn test_share_price_basic() {
        assert_eq!(share_price(10_000_000_000, 10_000_000_000), "1.0000000");
        assert_eq!(share_price(15_000_000_000, 10_000_000_000), "1.5000000");
        assert_eq!(share_price(1, 3), "0.3333333");
        // 10 / 3 = 3.3333333 (floored)
        assert_eq!(share_price(100_000_000, 30_000_000), "3.3333333");
    }

    #[test]
    fn test_share_price_matches_direct_formula() {
        for (assets, shares) in [
            (10_000_000_000i128, 7_000_000_000i128),
            (999_999_999, 1_000_000_001),
            (123_456_789_012, 98_765_432),
            (1, 1),
        ] {
            let direct = assets * STROOPS_PER_UNIT / shares;
            assert_eq!(share_price_stroops(assets, shares), direct);
        }
    }

    #[test]
    fn test_share_price_monotonic_in_assets() {
        let shares = 3_333_333_333;
        let mut last = share_price_stroops(0, shares);
        for assets in (0..20_000_000_000i128).step_by(777_777_777) {
            let price = share_price_stroops(assets, shares);
            assert!(price >= last);
            last = price;
        }
    }

    #[test]
    fn test_share_price_large_values() {
        // would overflow i128 if multiplied by 10^7 first
        let assets = i128::MAX / 2;
        let price = share_price_stroops(assets, assets);
        assert_eq!(price, STROOPS_PER_UNIT);
    }

    #[test]
    fn test_conversions_bootstrap_one_to_one() {
        assert_eq!(convert_to_shares(1_000, 0, 0), Some(1_000));
        assert_eq!(convert_to_assets(1_000, 0, 0), Some(1_000));
    }

    #[test]
    fn test_conversions_pro_rata() {
        // vault has grown 50%: 15 assets back 10 shares
        let (assets, shares) = (15_000_000_000, 10_000_000_000);
        assert_eq!(convert_to_shares(1_500_000_000, assets, shares), Some(1_000_000_000));
        assert_eq!(convert_to_assets(1_000_000_000, assets, shares), Some(1_500_000_000));
        // floor division never hands out more than deposited
        assert_eq!(convert_to_shares(1, assets, shares), Some(0));
    }

    #[test]
    fn test_conversions_reject_negative_and_overflow() {
        assert_eq!(convert_to_shares(-1, 10, 10), None);
        assert_eq!(convert_to_assets(-1, 10, 10), None);
        assert_eq!(convert_to_assets(i128::MAX, 2, 1), None);
    }
}
