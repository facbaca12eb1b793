//! Transaction domain model

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days covered by a transaction listing when no range is given
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// A single financial transaction belonging to an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    /// Signed amount in minor units (thousandths)
    pub amount: i64,
    pub payee: String,
    pub notes: Option<String>,
    pub date: NaiveDate,
    pub account_id: Uuid,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Values for creating or replacing a transaction (everything but the ID)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub amount: i64,
    pub payee: String,
    pub notes: Option<String>,
    pub date: NaiveDate,
    pub account_id: Uuid,
    pub category_id: Option<Uuid>,
}

impl NewTransaction {
    pub fn new(account_id: Uuid, date: NaiveDate, payee: impl Into<String>, amount: i64) -> Self {
        Self {
            amount,
            payee: payee.into(),
            notes: None,
            date,
            account_id,
            category_id: None,
        }
    }

    /// Assign a fresh ID, producing the row to insert
    pub fn into_transaction(self) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            amount: self.amount,
            payee: self.payee,
            notes: self.notes,
            date: self.date,
            account_id: self.account_id,
            category_id: self.category_id,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.payee.trim().is_empty() {
            return Err("payee cannot be empty");
        }
        Ok(())
    }
}

/// Transaction joined with its account and category names, for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: Uuid,
    pub amount: i64,
    pub payee: String,
    pub notes: Option<String>,
    pub date: NaiveDate,
    pub account_id: Uuid,
    pub account: String,
    pub category_id: Option<Uuid>,
    pub category: Option<String>,
}

/// Filter for transaction listings and summaries
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub account_id: Option<Uuid>,
}

impl TransactionFilter {
    /// Resolve the inclusive date range, defaulting to the last 30 days ending `today`
    pub fn resolve_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let to = self.to.unwrap_or(today);
        let from = self
            .from
            .unwrap_or_else(|| to - Duration::days(DEFAULT_WINDOW_DAYS));
        (from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_range_is_last_30_days() {
        let filter = TransactionFilter::default();
        let (from, to) = filter.resolve_range(date(2024, 3, 31));
        assert_eq!(to, date(2024, 3, 31));
        assert_eq!(from, date(2024, 3, 1));
    }

    #[test]
    fn test_explicit_range_wins() {
        let filter = TransactionFilter {
            from: Some(date(2023, 1, 1)),
            to: Some(date(2023, 12, 31)),
            account_id: None,
        };
        assert_eq!(
            filter.resolve_range(date(2024, 6, 1)),
            (date(2023, 1, 1), date(2023, 12, 31))
        );
    }

    #[test]
    fn test_new_transaction_requires_payee() {
        let tx = NewTransaction::new(Uuid::new_v4(), date(2024, 1, 5), " ", 4500);
        assert!(tx.validate().is_err());
    }
}
