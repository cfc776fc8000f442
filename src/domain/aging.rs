use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::payment::outstanding;

/// Classification of an outstanding balance by days past due.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, strum::Display,
)]
pub enum AgingBucket {
    #[serde(rename = "current")]
    #[strum(serialize = "current")]
    Current,
    #[serde(rename = "1-30")]
    #[strum(serialize = "1-30")]
    Days1To30,
    #[serde(rename = "31-60")]
    #[strum(serialize = "31-60")]
    Days31To60,
    #[serde(rename = "61-90")]
    #[strum(serialize = "61-90")]
    Days61To90,
    #[serde(rename = "90+")]
    #[strum(serialize = "90+")]
    Over90,
}

impl AgingBucket {
    pub const ALL: [AgingBucket; 5] = [
        AgingBucket::Current,
        AgingBucket::Days1To30,
        AgingBucket::Days31To60,
        AgingBucket::Days61To90,
        AgingBucket::Over90,
    ];
}

/// Days elapsed since `due_date`; zero or negative means not yet overdue.
pub fn days_overdue(due_date: NaiveDate, as_of: NaiveDate) -> i64 {
    (as_of - due_date).num_days()
}

pub fn classify(due_date: NaiveDate, as_of: NaiveDate) -> AgingBucket {
    match days_overdue(due_date, as_of) {
        i64::MIN..=0 => AgingBucket::Current,
        1..=30 => AgingBucket::Days1To30,
        31..=60 => AgingBucket::Days31To60,
        61..=90 => AgingBucket::Days61To90,
        _ => AgingBucket::Over90,
    }
}

/// A receivable or payable document as seen by the aging report.
#[derive(Debug, Clone)]
pub struct AgingInput {
    pub id: u64,
    pub counterparty: String,
    pub document_number: String,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub due_date: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgingLine {
    pub id: u64,
    pub counterparty: String,
    pub document_number: String,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub bucket: AgingBucket,
    pub outstanding: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BucketTotal {
    pub bucket: AgingBucket,
    pub count: u32,
    pub outstanding: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgingReport {
    pub as_of: NaiveDate,
    pub buckets: Vec<BucketTotal>,
    pub total_outstanding: Decimal,
    pub items: Vec<AgingLine>,
}

impl AgingReport {
    /// Settled documents are left out; every remaining one lands in exactly one bucket.
    pub fn build(inputs: impl IntoIterator<Item = AgingInput>, as_of: NaiveDate) -> Self {
        let mut buckets: Vec<BucketTotal> = AgingBucket::ALL
            .iter()
            .map(|&bucket| BucketTotal {
                bucket,
                count: 0,
                outstanding: Decimal::ZERO,
            })
            .collect();
        let mut items = Vec::new();
        let mut total_outstanding = Decimal::ZERO;

        for input in inputs {
            let open = outstanding(input.amount, input.paid_amount);
            if open.is_zero() {
                continue;
            }

            let bucket = classify(input.due_date, as_of);
            if let Some(slot) = buckets.iter_mut().find(|b| b.bucket == bucket) {
                slot.count += 1;
                slot.outstanding += open;
            }
            total_outstanding += open;

            items.push(AgingLine {
                id: input.id,
                counterparty: input.counterparty,
                document_number: input.document_number,
                due_date: input.due_date,
                days_overdue: days_overdue(input.due_date, as_of).max(0),
                bucket,
                outstanding: open,
            });
        }

        items.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue).then(a.id.cmp(&b.id)));

        Self {
            as_of,
            buckets,
            total_outstanding,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bucket_boundaries() {
        let as_of = date(2026, 6, 30);
        let due = |days: i64| as_of - chrono::Duration::days(days);

        assert_eq!(classify(due(-5), as_of), AgingBucket::Current);
        assert_eq!(classify(due(0), as_of), AgingBucket::Current);
        assert_eq!(classify(due(1), as_of), AgingBucket::Days1To30);
        assert_eq!(classify(due(30), as_of), AgingBucket::Days1To30);
        assert_eq!(classify(due(31), as_of), AgingBucket::Days31To60);
        assert_eq!(classify(due(60), as_of), AgingBucket::Days31To60);
        assert_eq!(classify(due(61), as_of), AgingBucket::Days61To90);
        assert_eq!(classify(due(90), as_of), AgingBucket::Days61To90);
        assert_eq!(classify(due(91), as_of), AgingBucket::Over90);
        assert_eq!(classify(due(400), as_of), AgingBucket::Over90);
    }

    #[test]
    fn every_day_maps_to_exactly_one_bucket() {
        let as_of = date(2026, 6, 30);
        for days in -10..200 {
            let due = as_of - chrono::Duration::days(days);
            let hits = AgingBucket::ALL
                .iter()
                .filter(|&&b| classify(due, as_of) == b)
                .count();
            assert_eq!(hits, 1, "days overdue {days}");
        }
    }

    #[test]
    fn report_skips_settled_and_sums_buckets() {
        let as_of = date(2026, 6, 30);
        let doc = |id, amount, paid, due| AgingInput {
            id,
            counterparty: format!("Customer {id}"),
            document_number: format!("INV-{id}"),
            amount,
            paid_amount: paid,
            due_date: due,
        };

        let report = AgingReport::build(
            vec![
                doc(1, dec!(100.00), dec!(0), date(2026, 7, 15)),
                doc(2, dec!(250.00), dec!(50.00), date(2026, 6, 10)),
                doc(3, dec!(80.00), dec!(80.00), date(2026, 1, 1)),
                doc(4, dec!(40.00), dec!(0), date(2026, 1, 1)),
            ],
            as_of,
        );

        assert_eq!(report.items.len(), 3);
        assert_eq!(report.total_outstanding, dec!(340.00));
        let total_of = |bucket| {
            report
                .buckets
                .iter()
                .find(|b| b.bucket == bucket)
                .map(|b| b.outstanding)
                .unwrap()
        };
        assert_eq!(total_of(AgingBucket::Current), dec!(100.00));
        assert_eq!(total_of(AgingBucket::Days1To30), dec!(200.00));
        assert_eq!(total_of(AgingBucket::Over90), dec!(40.00));
        assert_eq!(report.items[0].id, 4);
    }

    #[test]
    fn bucket_labels() {
        assert_eq!(AgingBucket::Over90.to_string(), "90+");
        assert_eq!(
            serde_json::to_string(&AgingBucket::Days31To60).unwrap(),
            "\"31-60\""
        );
    }
}
