pub mod aging;
pub mod export;
pub mod inventory;
pub mod ledger;
pub mod money;
pub mod payment;
pub mod payroll;
pub mod shipment;

use derive_more::Display;
use rust_decimal::Decimal;

/// Business rule violations raised by the pure domain layer.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum DomainError {
    #[display(fmt = "{} is required", _0)]
    MissingField(&'static str),

    #[display(fmt = "{}", _0)]
    Invalid(String),

    #[display(fmt = "payment amount must be greater than zero")]
    NonPositivePayment,

    #[display(
        fmt = "payment of {} exceeds outstanding balance of {}",
        payment,
        outstanding
    )]
    PaymentExceedsOutstanding {
        payment: Decimal,
        outstanding: Decimal,
    },

    #[display(
        fmt = "journal entry is unbalanced: debits {} != credits {}",
        debits,
        credits
    )]
    UnbalancedEntry { debits: Decimal, credits: Decimal },

    #[display(fmt = "{} cannot move from {} to {}", entity, from, to)]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
}

impl std::error::Error for DomainError {}

pub type DomainResult<T> = Result<T, DomainError>;

/// Rejects blank strings for fields a record cannot be saved without.
pub fn require(field: &'static str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        Err(DomainError::MissingField(field))
    } else {
        Ok(())
    }
}
