use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::payroll::PayrollStatus;

/// One line of the payroll history download. Field order is the column order.
#[derive(Debug, Serialize)]
pub struct PayrollCsvRow {
    pub employee_code: String,
    pub employee_name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub hours: Decimal,
    pub overtime_hours: Decimal,
    pub gross_pay: Decimal,
    pub deductions: Decimal,
    pub net_pay: Decimal,
    pub status: PayrollStatus,
}

pub fn payroll_csv(rows: &[PayrollCsvRow]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if rows.is_empty() {
        writer.write_record([
            "employee_code",
            "employee_name",
            "period_start",
            "period_end",
            "hours",
            "overtime_hours",
            "gross_pay",
            "deductions",
            "net_pay",
            "status",
        ])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("{}", e))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str = "employee_code,employee_name,period_start,period_end,hours,overtime_hours,gross_pay,deductions,net_pay,status";

    #[test]
    fn writes_header_and_rows() {
        let rows = vec![PayrollCsvRow {
            employee_code: "EMP-7".to_string(),
            employee_name: "Doe, Jane".to_string(),
            period_start: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2026, 1, 14).unwrap(),
            hours: dec!(80),
            overtime_hours: dec!(2.5),
            gross_pay: dec!(1675.00),
            deductions: dec!(335.00),
            net_pay: dec!(1340.00),
            status: PayrollStatus::Paid,
        }];

        let csv = payroll_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(HEADER));
        assert_eq!(
            lines.next(),
            Some("EMP-7,\"Doe, Jane\",2026-01-01,2026-01-14,80,2.5,1675.00,335.00,1340.00,paid")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_history_still_has_header() {
        let csv = payroll_csv(&[]).unwrap();
        assert_eq!(csv.trim_end(), HEADER);
    }
}
