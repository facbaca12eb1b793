//! CLI command implementations

pub mod accounts;
pub mod categories;
pub mod import;
pub mod logs;
pub mod summary;
pub mod transactions;

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use fintrack_core::domain::money::checked_to_minor_units;
use fintrack_core::services::{LogEvent, LoggingService};
use fintrack_core::FintrackContext;

/// Environment variable overriding the data directory
pub const DIR_ENV: &str = "FINTRACK_DIR";

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize; it must never block a command.
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Data directory from FINTRACK_DIR, or ~/.fintrack
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".fintrack"))
        .ok_or_else(|| anyhow!("Could not find home directory; set {}", DIR_ENV))
}

/// Open the context, creating the data directory on first use
pub fn get_context() -> Result<FintrackContext> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    FintrackContext::new(&data_dir).context("Failed to initialize fintrack context")
}

/// Parse a `yyyy-MM-dd` argument
pub fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected yyyy-MM-dd", s))
}

/// Parse a decimal amount argument into minor units
pub fn parse_amount_arg(s: &str) -> Result<i64> {
    let amount = Decimal::from_str(s.trim())
        .with_context(|| format!("Invalid amount '{}'", s))?;
    checked_to_minor_units(amount).ok_or_else(|| anyhow!("Amount '{}' is out of range", s))
}

/// Split ID-or-name arguments into parsed IDs and the names left to resolve
pub fn split_ids(args: &[String]) -> (Vec<Uuid>, Vec<&str>) {
    let mut ids = Vec::new();
    let mut names = Vec::new();
    for arg in args {
        match Uuid::parse_str(arg.trim()) {
            Ok(id) => ids.push(id),
            Err(_) => names.push(arg.as_str()),
        }
    }
    (ids, names)
}

/// Ask for confirmation unless `yes` is set
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_arg() {
        assert_eq!(parse_amount_arg("4.50").unwrap(), 4500);
        assert_eq!(parse_amount_arg(" -12 ").unwrap(), -12000);
        assert!(parse_amount_arg("abc").is_err());
        assert!(parse_amount_arg("99999999999999999999").is_err());
    }

    #[test]
    fn test_parse_date_arg() {
        assert_eq!(
            parse_date_arg("2024-01-05").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert!(parse_date_arg("05/01/2024").is_err());
    }

    #[test]
    fn test_split_ids() {
        let id = Uuid::new_v4();
        let args = vec![id.to_string(), "Checking".to_string()];
        let (ids, names) = split_ids(&args);
        assert_eq!(ids, vec![id]);
        assert_eq!(names, vec!["Checking"]);
    }
}
