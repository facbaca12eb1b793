//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod account;
mod category;
pub mod column_mapper;
pub mod import_session;
pub mod logging;
pub mod migration;
mod summary;
mod transaction;

pub use account::AccountService;
pub use category::CategoryService;
pub use import_session::{ImportSession, ReviewView, SessionView, SubmitOutcome};
pub use logging::{LogEntry, LogEvent, LogStats, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use summary::{
    build_summary, daily_totals, spending_by_category, CategorySpend, DailyTotals, Summary,
    SummaryService, TOP_CATEGORIES, UNCATEGORIZED,
};
pub use transaction::TransactionService;
