//! Transaction service - user-scoped transaction management

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use uuid::Uuid;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::{NewTransaction, Transaction, TransactionFilter, TransactionView};

pub struct TransactionService {
    repository: Arc<DuckDbRepository>,
    user_id: String,
}

impl TransactionService {
    pub fn new(repository: Arc<DuckDbRepository>, user_id: impl Into<String>) -> Self {
        Self {
            repository,
            user_id: user_id.into(),
        }
    }

    /// Transactions matching `filter`, newest first
    ///
    /// Without explicit dates the last 30 days up to today are listed.
    pub fn list(&self, filter: &TransactionFilter) -> Result<Vec<TransactionView>> {
        self.list_as_of(filter, Local::now().date_naive())
    }

    /// Same as `list`, with "today" supplied by the caller
    pub fn list_as_of(
        &self,
        filter: &TransactionFilter,
        today: NaiveDate,
    ) -> Result<Vec<TransactionView>> {
        let (from, to) = checked_range(filter, today)?;
        self.repository
            .list_transactions(&self.user_id, from, to, filter.account_id)
    }

    pub fn get(&self, id: Uuid) -> Result<Transaction> {
        self.repository.get_transaction(&self.user_id, id)
    }

    pub fn create(&self, values: &NewTransaction) -> Result<Transaction> {
        values.validate().map_err(Error::validation)?;
        self.repository.insert_transaction(&self.user_id, values)
    }

    pub fn update(&self, id: Uuid, values: &NewTransaction) -> Result<Transaction> {
        values.validate().map_err(Error::validation)?;
        self.repository.update_transaction(&self.user_id, id, values)
    }

    pub fn delete(&self, id: Uuid) -> Result<()> {
        self.repository.delete_transaction(&self.user_id, id)
    }

    /// Insert all rows or none
    pub fn bulk_create(&self, rows: &[NewTransaction]) -> Result<Vec<Transaction>> {
        for (i, row) in rows.iter().enumerate() {
            row.validate()
                .map_err(|e| Error::validation(format!("Row {}: {}", i + 1, e)))?;
        }
        self.repository.bulk_insert_transactions(&self.user_id, rows)
    }

    /// Delete the listed transactions the user owns; returns the IDs deleted
    pub fn bulk_delete(&self, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        self.repository.bulk_delete_transactions(&self.user_id, ids)
    }
}

/// Resolve the filter's range and reject an inverted one
pub(crate) fn checked_range(
    filter: &TransactionFilter,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    let (from, to) = filter.resolve_range(today);
    if from > to {
        return Err(Error::validation(format!(
            "Start date {} is after end date {}",
            from, to
        )));
    }
    Ok((from, to))
}
