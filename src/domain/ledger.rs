//! Chart-of-accounts arithmetic: normal balances, journal validation,
//! running balances and balance reconciliation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::money::{is_whole_cents, max_amount};
use super::{DomainError, DomainResult};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalSide {
    Debit,
    Credit,
}

impl AccountType {
    pub const ALL: [AccountType; 5] = [
        AccountType::Asset,
        AccountType::Liability,
        AccountType::Equity,
        AccountType::Revenue,
        AccountType::Expense,
    ];

    pub fn normal_side(self) -> NormalSide {
        match self {
            AccountType::Asset | AccountType::Expense => NormalSide::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                NormalSide::Credit
            }
        }
    }

    /// How a posting changes the balance of an account of this type.
    pub fn balance_delta(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self.normal_side() {
            NormalSide::Debit => debit - credit,
            NormalSide::Credit => credit - debit,
        }
    }
}

/// One side of a journal entry before it is posted.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EntryLine {
    #[schema(example = 12)]
    pub account_id: u64,
    #[serde(default)]
    #[schema(example = "250.00")]
    pub debit: Decimal,
    #[serde(default)]
    #[schema(example = "0")]
    pub credit: Decimal,
}

/// Returns the (debit, credit) totals of a valid entry.
pub fn validate_entry(lines: &[EntryLine]) -> DomainResult<(Decimal, Decimal)> {
    if lines.len() < 2 {
        return Err(DomainError::Invalid(
            "journal entry needs at least two lines".to_string(),
        ));
    }

    let mut debits = Decimal::ZERO;
    let mut credits = Decimal::ZERO;
    for (i, line) in lines.iter().enumerate() {
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(DomainError::Invalid(format!(
                "line {}: amounts cannot be negative",
                i + 1
            )));
        }
        if !is_whole_cents(line.debit) || !is_whole_cents(line.credit) {
            return Err(DomainError::Invalid(format!(
                "line {}: amounts cannot have fractions of a cent",
                i + 1
            )));
        }
        if line.debit > max_amount() || line.credit > max_amount() {
            return Err(DomainError::Invalid(format!(
                "line {}: amount exceeds {}",
                i + 1,
                max_amount()
            )));
        }
        let one_sided = (line.debit > Decimal::ZERO) != (line.credit > Decimal::ZERO);
        if !one_sided {
            return Err(DomainError::Invalid(format!(
                "line {}: exactly one of debit or credit must be set",
                i + 1
            )));
        }
        debits += line.debit;
        credits += line.credit;
    }

    if debits != credits {
        return Err(DomainError::UnbalancedEntry { debits, credits });
    }
    Ok((debits, credits))
}

/// Posted activity on a single account.
#[derive(Debug, Clone)]
pub struct Posting {
    pub line_id: u64,
    pub entry_id: u64,
    pub entry_date: NaiveDate,
    pub memo: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LedgerRow {
    pub line_id: u64,
    pub entry_id: u64,
    pub entry_date: NaiveDate,
    pub memo: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
    pub balance: Decimal,
}

/// Orders postings by date then line id and carries the balance forward.
pub fn running_balance(
    opening: Decimal,
    account_type: AccountType,
    mut postings: Vec<Posting>,
) -> Vec<LedgerRow> {
    postings.sort_by(|a, b| {
        a.entry_date
            .cmp(&b.entry_date)
            .then(a.line_id.cmp(&b.line_id))
    });

    let mut balance = opening;
    postings
        .into_iter()
        .map(|p| {
            balance += account_type.balance_delta(p.debit, p.credit);
            LedgerRow {
                line_id: p.line_id,
                entry_id: p.entry_id,
                entry_date: p.entry_date,
                memo: p.memo,
                debit: p.debit,
                credit: p.credit,
                balance,
            }
        })
        .collect()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceReconciliation {
    pub stored_balance: Decimal,
    pub computed_balance: Decimal,
    /// stored minus computed
    pub drift: Decimal,
    pub in_balance: bool,
}

pub fn reconcile(
    opening: Decimal,
    stored_balance: Decimal,
    account_type: AccountType,
    postings: &[Posting],
) -> BalanceReconciliation {
    let computed_balance = postings.iter().fold(opening, |acc, p| {
        acc + account_type.balance_delta(p.debit, p.credit)
    });
    let drift = stored_balance - computed_balance;
    BalanceReconciliation {
        stored_balance,
        computed_balance,
        drift,
        in_balance: drift.is_zero(),
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TypeTotal {
    pub account_type: AccountType,
    pub accounts: u32,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LedgerSummary {
    pub totals: Vec<TypeTotal>,
    pub net_income: Decimal,
    /// assets - (liabilities + equity + net income); zero when the books balance
    pub imbalance: Decimal,
    /// Deactivated accounts still carry balances and are included in the totals
    pub inactive_accounts: u32,
}

pub fn summarize(balances: impl IntoIterator<Item = (AccountType, Decimal)>) -> LedgerSummary {
    let mut totals: Vec<TypeTotal> = AccountType::ALL
        .iter()
        .map(|&account_type| TypeTotal {
            account_type,
            accounts: 0,
            balance: Decimal::ZERO,
        })
        .collect();

    for (account_type, balance) in balances {
        if let Some(t) = totals.iter_mut().find(|t| t.account_type == account_type) {
            t.accounts += 1;
            t.balance += balance;
        }
    }

    let total = |ty: AccountType| {
        totals
            .iter()
            .find(|t| t.account_type == ty)
            .map(|t| t.balance)
            .unwrap_or_default()
    };
    let net_income = total(AccountType::Revenue) - total(AccountType::Expense);
    let imbalance = total(AccountType::Asset)
        - (total(AccountType::Liability) + total(AccountType::Equity) + net_income);

    LedgerSummary {
        totals,
        net_income,
        imbalance,
        inactive_accounts: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(account_id: u64, debit: Decimal, credit: Decimal) -> EntryLine {
        EntryLine {
            account_id,
            debit,
            credit,
        }
    }

    fn posting(line_id: u64, day: u32, debit: Decimal, credit: Decimal) -> Posting {
        Posting {
            line_id,
            entry_id: line_id,
            entry_date: NaiveDate::from_ymd_opt(2026, 5, day).unwrap(),
            memo: None,
            debit,
            credit,
        }
    }

    #[test]
    fn normal_sides() {
        assert_eq!(AccountType::Asset.normal_side(), NormalSide::Debit);
        assert_eq!(AccountType::Expense.normal_side(), NormalSide::Debit);
        assert_eq!(AccountType::Revenue.normal_side(), NormalSide::Credit);
        assert_eq!(
            AccountType::Liability.balance_delta(dec!(0), dec!(75)),
            dec!(75)
        );
        assert_eq!(AccountType::Asset.balance_delta(dec!(0), dec!(75)), dec!(-75));
    }

    #[test]
    fn balanced_entry_is_accepted() {
        let totals = validate_entry(&[
            line(1, dec!(100), dec!(0)),
            line(2, dec!(0), dec!(60)),
            line(3, dec!(0), dec!(40)),
        ])
        .unwrap();
        assert_eq!(totals, (dec!(100), dec!(100)));
    }

    #[test]
    fn unbalanced_entry_is_rejected() {
        let err =
            validate_entry(&[line(1, dec!(100), dec!(0)), line(2, dec!(0), dec!(99))]).unwrap_err();
        assert_eq!(
            err,
            DomainError::UnbalancedEntry {
                debits: dec!(100),
                credits: dec!(99)
            }
        );
    }

    #[test]
    fn line_must_be_one_sided() {
        assert!(validate_entry(&[line(1, dec!(5), dec!(5)), line(2, dec!(0), dec!(0))]).is_err());
        assert!(validate_entry(&[line(1, dec!(5), dec!(0))]).is_err());
        assert!(validate_entry(&[line(1, dec!(-5), dec!(0)), line(2, dec!(0), dec!(-5))]).is_err());
    }

    #[test]
    fn sub_cent_lines_that_would_round_unbalanced_are_rejected() {
        let err = validate_entry(&[
            line(1, dec!(0.005), dec!(0)),
            line(2, dec!(0.005), dec!(0)),
            line(3, dec!(0), dec!(0.01)),
        ])
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 1: amounts cannot have fractions of a cent"
        );
    }

    #[test]
    fn sub_cent_lines_that_would_store_as_zero_are_rejected() {
        assert!(validate_entry(&[line(1, dec!(0.001), dec!(0)), line(2, dec!(0), dec!(0.001))]).is_err());
        assert!(validate_entry(&[line(1, dec!(0.010), dec!(0)), line(2, dec!(0), dec!(0.01))]).is_ok());
    }

    #[test]
    fn running_balance_sorts_by_date() {
        let rows = running_balance(
            dec!(1000),
            AccountType::Asset,
            vec![
                posting(3, 20, dec!(0), dec!(300)),
                posting(1, 2, dec!(500), dec!(0)),
                posting(2, 2, dec!(0), dec!(200)),
            ],
        );
        let balances: Vec<_> = rows.iter().map(|r| r.balance).collect();
        assert_eq!(balances, vec![dec!(1500), dec!(1300), dec!(1000)]);
        assert_eq!(rows[0].line_id, 1);
    }

    #[test]
    fn reconcile_reports_drift() {
        let postings = vec![posting(1, 1, dec!(0), dec!(250))];
        let rec = reconcile(dec!(0), dec!(300), AccountType::Revenue, &postings);
        assert_eq!(rec.computed_balance, dec!(250));
        assert_eq!(rec.drift, dec!(50));
        assert!(!rec.in_balance);

        let rec = reconcile(dec!(0), dec!(250), AccountType::Revenue, &postings);
        assert!(rec.in_balance);
    }

    #[test]
    fn summary_checks_accounting_equation() {
        let summary = summarize(vec![
            (AccountType::Asset, dec!(1500)),
            (AccountType::Asset, dec!(500)),
            (AccountType::Liability, dec!(400)),
            (AccountType::Equity, dec!(1000)),
            (AccountType::Revenue, dec!(900)),
            (AccountType::Expense, dec!(300)),
        ]);
        assert_eq!(summary.net_income, dec!(600));
        assert_eq!(summary.imbalance, Decimal::ZERO);
        let assets = summary
            .totals
            .iter()
            .find(|t| t.account_type == AccountType::Asset)
            .unwrap();
        assert_eq!(assets.accounts, 2);
        assert_eq!(assets.balance, dec!(2000));
    }
}
