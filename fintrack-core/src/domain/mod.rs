//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O beyond reading an upload into a table.

mod account;
mod category;
pub mod import;
pub mod money;
pub mod result;
mod transaction;

pub use account::Account;
pub(crate) use account::validate_name;
pub use category::Category;
pub use import::{
    ColumnAssignment, DateFormats, FieldKey, ImportRow, MappedRecord, RawTable,
    DATE_INPUT_FORMAT, DATE_OUTPUT_FORMAT,
};
pub use transaction::{NewTransaction, Transaction, TransactionFilter, TransactionView};
