use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary value to cents, halves away from zero.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Largest value a DECIMAL(14,2) amount column holds.
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

/// True when the value carries no more than two decimal places.
pub fn is_whole_cents(value: Decimal) -> bool {
    round_cents(value) == value
}

pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_cents(dec!(10.005)), dec!(10.01));
        assert_eq!(round_cents(dec!(-10.005)), dec!(-10.01));
        assert_eq!(round_cents(dec!(10.004)), dec!(10.00));
    }

    #[test]
    fn whole_cents_detection() {
        assert!(is_whole_cents(dec!(10.50)));
        assert!(is_whole_cents(dec!(10.500)));
        assert!(!is_whole_cents(dec!(0.005)));
        assert_eq!(max_amount(), dec!(999999999999.99));
    }

    #[test]
    fn clamps_negative_to_zero() {
        assert_eq!(non_negative(dec!(-0.01)), Decimal::ZERO);
        assert_eq!(non_negative(dec!(3.50)), dec!(3.50));
    }
}
