//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The import
//! session depends only on these traits, not on concrete implementations.

mod confirmation;
mod repository;

pub use confirmation::ConfirmationGate;
pub use repository::{AccountDirectory, TransactionStore};
