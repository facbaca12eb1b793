//! Non-interactive confirmation gates

use async_trait::async_trait;

use crate::ports::ConfirmationGate;

/// Answers every prompt with a fixed value (`--yes`, scripted runs)
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl FixedAnswer {
    pub fn yes() -> Self {
        Self(true)
    }

    pub fn no() -> Self {
        Self(false)
    }
}

#[async_trait]
impl ConfirmationGate for FixedAnswer {
    async fn confirm(&self, _title: &str, _message: &str) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_answers() {
        assert!(FixedAnswer::yes().confirm("t", "m").await);
        assert!(!FixedAnswer::no().confirm("t", "m").await);
    }
}
