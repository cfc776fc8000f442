use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::money::{max_amount, round_cents};
use super::{DomainError, DomainResult};

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
pub enum PayrollStatus {
    Draft,
    Processed,
    Paid,
}

impl PayrollStatus {
    pub fn next(self) -> Option<PayrollStatus> {
        match self {
            PayrollStatus::Draft => Some(PayrollStatus::Processed),
            PayrollStatus::Processed => Some(PayrollStatus::Paid),
            PayrollStatus::Paid => None,
        }
    }

    /// Only the single next step is allowed; nothing moves backward.
    pub fn can_advance_to(self, target: PayrollStatus) -> bool {
        self.next() == Some(target)
    }

    pub fn advance_to(self, target: PayrollStatus) -> DomainResult<PayrollStatus> {
        if self.can_advance_to(target) {
            Ok(target)
        } else {
            Err(DomainError::InvalidTransition {
                entity: "payroll entry",
                from: self.to_string(),
                to: target.to_string(),
            })
        }
    }

    pub fn is_editable(self) -> bool {
        self == PayrollStatus::Draft
    }
}

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
pub enum PayType {
    Hourly,
    Salary,
}

/// Compensation terms copied from the employee record at payroll time.
#[derive(Debug, Clone)]
pub struct Compensation {
    pub pay_type: PayType,
    pub hourly_rate: Decimal,
    pub annual_salary: Decimal,
    /// percent of gross, 0..=100
    pub withholding_pct: Decimal,
    /// flat amount per pay period
    pub benefit_deduction: Decimal,
}

impl Compensation {
    pub fn validate(&self) -> DomainResult<()> {
        if self.withholding_pct < Decimal::ZERO || self.withholding_pct > Decimal::ONE_HUNDRED {
            return Err(DomainError::Invalid(
                "withholding_pct must be between 0 and 100".to_string(),
            ));
        }
        if self.hourly_rate < Decimal::ZERO
            || self.annual_salary < Decimal::ZERO
            || self.benefit_deduction < Decimal::ZERO
        {
            return Err(DomainError::Invalid(
                "compensation amounts cannot be negative".to_string(),
            ));
        }
        match self.pay_type {
            PayType::Hourly if self.hourly_rate.is_zero() => Err(DomainError::Invalid(
                "hourly employees need an hourly_rate".to_string(),
            )),
            PayType::Salary if self.annual_salary.is_zero() => Err(DomainError::Invalid(
                "salaried employees need an annual_salary".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PayPolicy {
    pub periods_per_year: u32,
    pub overtime_multiplier: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PayBreakdown {
    pub gross_pay: Decimal,
    pub withholding: Decimal,
    pub benefits: Decimal,
    pub deductions: Decimal,
    pub net_pay: Decimal,
}

/// Largest value the DECIMAL(8,2) hours columns hold.
pub fn max_hours() -> Decimal {
    Decimal::new(99_999_999, 2)
}

fn overflow() -> DomainError {
    DomainError::Invalid("pay amount is out of range".to_string())
}

pub fn compute_pay(
    comp: &Compensation,
    hours: Decimal,
    overtime_hours: Decimal,
    policy: PayPolicy,
) -> DomainResult<PayBreakdown> {
    if hours < Decimal::ZERO || overtime_hours < Decimal::ZERO {
        return Err(DomainError::Invalid("hours cannot be negative".to_string()));
    }
    if hours > max_hours() || overtime_hours > max_hours() {
        return Err(DomainError::Invalid(format!(
            "hours cannot exceed {}",
            max_hours()
        )));
    }
    if policy.periods_per_year == 0 {
        return Err(DomainError::Invalid(
            "pay periods per year must be positive".to_string(),
        ));
    }

    let gross_pay = round_cents(match comp.pay_type {
        PayType::Hourly => {
            let regular = comp.hourly_rate.checked_mul(hours).ok_or_else(overflow)?;
            let overtime = comp
                .hourly_rate
                .checked_mul(policy.overtime_multiplier)
                .and_then(|rate| rate.checked_mul(overtime_hours))
                .ok_or_else(overflow)?;
            regular.checked_add(overtime).ok_or_else(overflow)?
        }
        PayType::Salary => comp.annual_salary / Decimal::from(policy.periods_per_year),
    });
    if gross_pay > max_amount() {
        return Err(overflow());
    }

    let withholding = round_cents(
        gross_pay
            .checked_mul(comp.withholding_pct)
            .ok_or_else(overflow)?
            / Decimal::ONE_HUNDRED,
    );
    let deductions = withholding
        .checked_add(comp.benefit_deduction)
        .ok_or_else(overflow)?
        .min(gross_pay);
    let benefits = deductions - withholding;

    Ok(PayBreakdown {
        gross_pay,
        withholding,
        benefits,
        deductions,
        net_pay: gross_pay - deductions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn policy() -> PayPolicy {
        PayPolicy {
            periods_per_year: 26,
            overtime_multiplier: dec!(1.5),
        }
    }

    fn hourly(rate: Decimal) -> Compensation {
        Compensation {
            pay_type: PayType::Hourly,
            hourly_rate: rate,
            annual_salary: Decimal::ZERO,
            withholding_pct: dec!(20),
            benefit_deduction: dec!(50),
        }
    }

    #[test]
    fn status_only_moves_forward() {
        use PayrollStatus::*;
        assert!(Draft.can_advance_to(Processed));
        assert!(Processed.can_advance_to(Paid));
        assert!(!Draft.can_advance_to(Paid));
        assert!(!Processed.can_advance_to(Draft));
        assert!(!Paid.can_advance_to(Processed));
        assert!(!Paid.can_advance_to(Draft));
        assert!(!Draft.can_advance_to(Draft));
        assert_eq!(Paid.next(), None);
    }

    #[test]
    fn backward_transition_is_an_error() {
        let err = PayrollStatus::Paid
            .advance_to(PayrollStatus::Draft)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "payroll entry cannot move from paid to draft"
        );
    }

    #[test]
    fn hourly_pay_with_overtime() {
        let pay = compute_pay(&hourly(dec!(20)), dec!(40), dec!(5), policy()).unwrap();
        assert_eq!(pay.gross_pay, dec!(950.00));
        assert_eq!(pay.withholding, dec!(190.00));
        assert_eq!(pay.deductions, dec!(240.00));
        assert_eq!(pay.net_pay, dec!(710.00));
    }

    #[test]
    fn salary_splits_across_periods() {
        let comp = Compensation {
            pay_type: PayType::Salary,
            hourly_rate: Decimal::ZERO,
            annual_salary: dec!(52000),
            withholding_pct: dec!(10),
            benefit_deduction: Decimal::ZERO,
        };
        let pay = compute_pay(&comp, dec!(80), dec!(0), policy()).unwrap();
        assert_eq!(pay.gross_pay, dec!(2000));
        assert_eq!(pay.net_pay, dec!(1800));
    }

    #[test]
    fn deductions_never_exceed_gross() {
        let mut comp = hourly(dec!(10));
        comp.benefit_deduction = dec!(500);
        let pay = compute_pay(&comp, dec!(10), dec!(0), policy()).unwrap();
        assert_eq!(pay.deductions, pay.gross_pay);
        assert_eq!(pay.net_pay, Decimal::ZERO);
    }

    #[test]
    fn compensation_validation() {
        let mut comp = hourly(dec!(15));
        assert!(comp.validate().is_ok());
        comp.withholding_pct = dec!(101);
        assert!(comp.validate().is_err());
        comp.withholding_pct = dec!(10);
        comp.hourly_rate = Decimal::ZERO;
        assert!(comp.validate().is_err());
    }

    #[test]
    fn oversized_hours_are_rejected_not_panicking() {
        let err = compute_pay(
            &hourly(dec!(999999999999.99)),
            dec!(100000000000000000),
            dec!(0),
            policy(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "hours cannot exceed 999999.99");
        assert!(compute_pay(&hourly(dec!(15)), dec!(0), dec!(1000000), policy()).is_err());
    }

    #[test]
    fn gross_beyond_amount_column_is_rejected() {
        let err = compute_pay(
            &hourly(dec!(999999999999.99)),
            dec!(999999.99),
            dec!(999999.99),
            policy(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::Invalid("pay amount is out of range".to_string()));
    }

    #[test]
    fn negative_hours_rejected() {
        assert!(compute_pay(&hourly(dec!(15)), dec!(-1), dec!(0), policy()).is_err());
    }
}
