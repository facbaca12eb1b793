//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the transaction store and account directory
//! - Fixed-answer confirmation for non-interactive runs

pub mod confirm;
pub mod duckdb;
