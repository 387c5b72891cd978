//! Money helpers
//!
//! All monetary amounts are `rust_decimal::Decimal` in the ledger and on
//! the wire; conversion to integer minor units happens only here, at the
//! boundary feeding the payment gateway.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// One cent: the tolerance for order total reconciliation
pub const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert a currency amount to integer minor units (`round(amount * 100)`,
/// midpoint away from zero). Returns `None` if the amount overflows i64.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Whether an order total matches the sum of its line item totals,
/// within one cent.
pub fn reconciles(total: Decimal, items_sum: Decimal) -> bool {
    (total - items_sum).abs() <= CENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(dec("20")), Some(2000));
        assert_eq!(to_minor_units(dec("19.99")), Some(1999));
        assert_eq!(to_minor_units(dec("0.01")), Some(1));
        assert_eq!(to_minor_units(dec("0")), Some(0));
    }

    #[test]
    fn test_to_minor_units_rounds_midpoint_away_from_zero() {
        assert_eq!(to_minor_units(dec("10.005")), Some(1001));
        assert_eq!(to_minor_units(dec("10.004")), Some(1000));
    }

    #[test]
    fn test_reconciles_exact() {
        assert!(reconciles(dec("50.00"), dec("50.00")));
        assert!(reconciles(dec("20"), dec("20.00")));
    }

    #[test]
    fn test_reconciles_within_one_cent() {
        assert!(reconciles(dec("50.00"), dec("49.99")));
        assert!(reconciles(dec("50.00"), dec("50.01")));
        assert!(!reconciles(dec("50.00"), dec("49.98")));
        assert!(!reconciles(dec("50.00"), dec("45.00")));
    }
}
