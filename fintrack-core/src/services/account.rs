//! Account service - user-scoped account management

use std::sync::Arc;

use uuid::Uuid;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::{validate_name, Account};

pub struct AccountService {
    repository: Arc<DuckDbRepository>,
    user_id: String,
}

impl AccountService {
    pub fn new(repository: Arc<DuckDbRepository>, user_id: impl Into<String>) -> Self {
        Self {
            repository,
            user_id: user_id.into(),
        }
    }

    /// Accounts owned by the current user, ordered by name
    pub fn list(&self) -> Result<Vec<Account>> {
        self.repository.list_accounts(&self.user_id)
    }

    pub fn get(&self, id: Uuid) -> Result<Account> {
        self.repository.get_account(&self.user_id, id)
    }

    pub fn create(&self, name: &str) -> Result<Account> {
        let account = Account::new(&self.user_id, name.trim());
        account.validate().map_err(Error::validation)?;
        self.repository.insert_account(&account)?;
        Ok(account)
    }

    pub fn rename(&self, id: Uuid, name: &str) -> Result<Account> {
        let name = name.trim();
        validate_name(name).map_err(Error::validation)?;
        self.repository.rename_account(&self.user_id, id, name)
    }

    /// Delete an account together with its transactions
    pub fn delete(&self, id: Uuid) -> Result<()> {
        self.repository.delete_account(&self.user_id, id)
    }

    /// Delete every listed account the user owns; returns the IDs deleted
    pub fn bulk_delete(&self, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        self.repository.bulk_delete_accounts(&self.user_id, ids)
    }

    /// Look an account up by ID or by case-insensitive name
    pub fn resolve(&self, id_or_name: &str) -> Result<Account> {
        if let Ok(id) = Uuid::parse_str(id_or_name.trim()) {
            return self.get(id);
        }

        let wanted = id_or_name.trim().to_lowercase();
        let mut matches: Vec<Account> = self
            .list()?
            .into_iter()
            .filter(|a| a.name.to_lowercase() == wanted)
            .collect();

        match matches.len() {
            0 => Err(Error::not_found(format!("Account '{}'", id_or_name))),
            1 => Ok(matches.remove(0)),
            n => Err(Error::validation(format!(
                "{} accounts are named '{}'; use the account ID",
                n, id_or_name
            ))),
        }
    }
}
