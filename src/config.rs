use anyhow::{Context, Result};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

use crate::domain::payroll::PayPolicy;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub db_max_connections: u32,

    // Rate limiting
    pub rate_api_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,

    // Business rules
    pub pay_periods_per_year: u32,
    pub overtime_multiplier: Decimal,
    pub expiry_warning_days: i64,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{} must be set", key))
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has invalid value {:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_or(key, env::var(key).ok(), default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let config = Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            db_max_connections: var_or("DB_MAX_CONNECTIONS", 10)?,

            rate_api_per_min: var_or("RATE_API_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            pay_periods_per_year: var_or("PAY_PERIODS_PER_YEAR", 26)?, // biweekly
            overtime_multiplier: var_or("OVERTIME_MULTIPLIER", Decimal::new(15, 1))?,
            expiry_warning_days: var_or("EXPIRY_WARNING_DAYS", 30)?,
        };

        if config.pay_periods_per_year == 0 {
            anyhow::bail!("PAY_PERIODS_PER_YEAR must be greater than zero");
        }
        Ok(config)
    }

    pub fn pay_policy(&self) -> PayPolicy {
        PayPolicy {
            periods_per_year: self.pay_periods_per_year,
            overtime_multiplier: self.overtime_multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn missing_value_uses_default() {
        assert_eq!(parse_or("X", None, 26u32).unwrap(), 26);
    }

    #[test]
    fn parses_present_value() {
        assert_eq!(
            parse_or("X", Some(" 12 ".to_string()), 26u32).unwrap(),
            12
        );
        assert_eq!(
            parse_or("X", Some("2".to_string()), dec!(1.5)).unwrap(),
            dec!(2)
        );
    }

    #[test]
    fn malformed_value_is_an_error() {
        let err = parse_or("RATE_API_PER_MIN", Some("lots".to_string()), 1u32).unwrap_err();
        assert!(err.to_string().contains("RATE_API_PER_MIN"));
    }
}
