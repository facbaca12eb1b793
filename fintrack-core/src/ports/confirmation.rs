//! Confirmation port - a yes/no gate before destructive or bulk actions

use async_trait::async_trait;

/// Single-shot yes/no prompt
///
/// Implementations resolve exactly once per call and impose no timeout.
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn confirm(&self, title: &str, message: &str) -> bool;
}
