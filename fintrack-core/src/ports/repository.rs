//! Persistence ports used by the import flow

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{Account, NewTransaction, Transaction};

/// Bulk transaction persistence
///
/// The import session only needs to hand over a whole batch at once, so
/// this is the one persistence operation it depends on.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Insert every row or none of them
    ///
    /// Fails with `NotFound` if any row references an account that does not
    /// belong to `user_id`.
    async fn bulk_create_transactions(
        &self,
        user_id: &str,
        rows: &[NewTransaction],
    ) -> Result<Vec<Transaction>>;
}

/// Account lookup and creation for the account selector
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Accounts owned by `user_id`
    async fn list_accounts(&self, user_id: &str) -> Result<Vec<Account>>;

    /// Create an account owned by `user_id`
    async fn create_account(&self, user_id: &str, name: &str) -> Result<Account>;
}
