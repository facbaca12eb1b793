//! Fintrack Core - personal finance tracking with CSV import
//!
//! This crate follows a hexagonal layout:
//!
//! - **domain**: entities (Account, Category, Transaction) and import types
//! - **ports**: traits the import session depends on (TransactionStore, ConfirmationGate)
//! - **services**: business logic (column mapping, import session, CRUD, summaries)
//! - **adapters**: concrete implementations (DuckDB, fixed-answer confirmation)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use adapters::duckdb::DuckDbRepository;
use config::Config;
use ports::ConfirmationGate;
use services::*;

pub use domain::result::{Error, Result};
pub use domain::{
    Account, Category, ColumnAssignment, DateFormats, FieldKey, NewTransaction, RawTable,
    Transaction, TransactionFilter, TransactionView,
};

/// Database file inside the data directory
pub const DB_FILENAME: &str = "fintrack.duckdb";

/// Main context for Fintrack operations
///
/// Holds the configuration, the repository and every service, all scoped
/// to the configured user.
pub struct FintrackContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub account_service: AccountService,
    pub category_service: CategoryService,
    pub transaction_service: TransactionService,
    pub summary_service: SummaryService,
}

impl FintrackContext {
    /// Open the database in `data_dir` and apply pending migrations
    pub fn new(data_dir: &Path) -> anyhow::Result<Self> {
        let config = Config::load(data_dir)?;
        Self::with_config(data_dir, config)
    }

    pub fn with_config(data_dir: &Path, config: Config) -> anyhow::Result<Self> {
        let repository = Arc::new(DuckDbRepository::new(&data_dir.join(DB_FILENAME))?);
        repository.ensure_schema()?;

        let user_id = config.user_id.clone();
        Ok(Self {
            account_service: AccountService::new(Arc::clone(&repository), &user_id),
            category_service: CategoryService::new(Arc::clone(&repository), &user_id),
            transaction_service: TransactionService::new(Arc::clone(&repository), &user_id),
            summary_service: SummaryService::new(Arc::clone(&repository), &user_id),
            config,
            repository,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    /// New import session storing into this context's database
    pub fn import_session(&self, gate: Arc<dyn ConfirmationGate>) -> ImportSession {
        ImportSession::new(self.user_id(), self.repository.clone(), gate)
            .with_date_formats(self.config.date_formats.clone())
    }
}
