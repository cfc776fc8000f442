use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::money::{is_whole_cents, max_amount, non_negative, round_cents};
use super::{DomainError, DomainResult};

/// Settlement state of a vendor bill or customer invoice. Never stored; always
/// derived from amounts and dates.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Partial,
    Overdue,
    Paid,
}

pub fn outstanding(amount: Decimal, paid_amount: Decimal) -> Decimal {
    non_negative(amount - paid_amount)
}

pub fn derive_status(
    amount: Decimal,
    paid_amount: Decimal,
    due_date: NaiveDate,
    as_of: NaiveDate,
) -> DocumentStatus {
    if paid_amount >= amount {
        DocumentStatus::Paid
    } else if due_date < as_of {
        DocumentStatus::Overdue
    } else if paid_amount > Decimal::ZERO {
        DocumentStatus::Partial
    } else {
        DocumentStatus::Pending
    }
}

/// Applies a payment and returns the new paid amount.
pub fn apply_payment(
    amount: Decimal,
    paid_amount: Decimal,
    payment: Decimal,
) -> DomainResult<Decimal> {
    let payment = round_cents(payment);
    if payment <= Decimal::ZERO {
        return Err(DomainError::NonPositivePayment);
    }

    let open = outstanding(amount, paid_amount);
    if payment > open {
        return Err(DomainError::PaymentExceedsOutstanding {
            payment,
            outstanding: open,
        });
    }

    Ok(paid_amount + payment)
}

/// Checks the fields shared by bills and invoices before they are stored.
pub fn validate_document(
    amount: Decimal,
    issue_date: NaiveDate,
    due_date: NaiveDate,
) -> DomainResult<()> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::Invalid(
            "amount must be greater than zero".to_string(),
        ));
    }
    if !is_whole_cents(amount) || amount > max_amount() {
        return Err(DomainError::Invalid(format!(
            "amount must be whole cents no greater than {}",
            max_amount()
        )));
    }
    if due_date < issue_date {
        return Err(DomainError::Invalid(
            "due_date cannot be before issue_date".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fully_paid_bill_is_paid_and_rejects_more() {
        let today = date(2026, 3, 1);
        let status = derive_status(dec!(1500), dec!(1500), date(2026, 2, 1), today);
        assert_eq!(status, DocumentStatus::Paid);

        let err = apply_payment(dec!(1500), dec!(1500), dec!(0.01)).unwrap_err();
        assert_eq!(
            err,
            DomainError::PaymentExceedsOutstanding {
                payment: dec!(0.01),
                outstanding: dec!(0),
            }
        );
    }

    #[test]
    fn rejects_non_positive_payment() {
        assert_eq!(
            apply_payment(dec!(100), dec!(0), dec!(0)),
            Err(DomainError::NonPositivePayment)
        );
        assert_eq!(
            apply_payment(dec!(100), dec!(0), dec!(-5)),
            Err(DomainError::NonPositivePayment)
        );
    }

    #[test]
    fn payment_up_to_outstanding_is_accepted() {
        let paid = apply_payment(dec!(100), dec!(40), dec!(60)).unwrap();
        assert_eq!(paid, dec!(100));
        assert_eq!(outstanding(dec!(100), paid), Decimal::ZERO);

        assert!(apply_payment(dec!(100), dec!(40), dec!(60.01)).is_err());
    }

    #[test]
    fn outstanding_never_goes_negative() {
        assert_eq!(outstanding(dec!(100), dec!(120)), Decimal::ZERO);
    }

    #[test]
    fn status_from_dates_and_amounts() {
        let today = date(2026, 3, 10);
        let future = date(2026, 4, 1);
        let past = date(2026, 3, 1);

        assert_eq!(
            derive_status(dec!(100), dec!(0), future, today),
            DocumentStatus::Pending
        );
        assert_eq!(
            derive_status(dec!(100), dec!(10), future, today),
            DocumentStatus::Partial
        );
        assert_eq!(
            derive_status(dec!(100), dec!(10), past, today),
            DocumentStatus::Overdue
        );
        // due today is not yet overdue
        assert_eq!(
            derive_status(dec!(100), dec!(0), today, today),
            DocumentStatus::Pending
        );
    }

    #[test]
    fn document_validation() {
        assert!(validate_document(dec!(10), date(2026, 1, 1), date(2026, 1, 31)).is_ok());
        assert!(validate_document(dec!(0), date(2026, 1, 1), date(2026, 1, 31)).is_err());
        assert!(validate_document(dec!(10), date(2026, 2, 1), date(2026, 1, 31)).is_err());
        assert!(validate_document(dec!(10.005), date(2026, 1, 1), date(2026, 1, 31)).is_err());
        assert!(validate_document(dec!(1000000000000), date(2026, 1, 1), date(2026, 1, 31)).is_err());
    }
}
