use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ledger::Posting;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct JournalEntry {
    pub id: u64,
    pub warehouse_id: u64,
    pub entry_date: NaiveDate,
    pub memo: Option<String>,
    pub reference: Option<String>,
}

/// A journal line joined with its entry header.
#[derive(Debug, sqlx::FromRow)]
pub struct PostingRow {
    pub line_id: u64,
    pub entry_id: u64,
    pub entry_date: NaiveDate,
    pub memo: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl From<PostingRow> for Posting {
    fn from(row: PostingRow) -> Self {
        Posting {
            line_id: row.line_id,
            entry_id: row.entry_id,
            entry_date: row.entry_date,
            memo: row.memo,
            debit: row.debit,
            credit: row.credit,
        }
    }
}
