//! Interactive retry decision. The dialoguer prompt blocks, so it runs on
//! the blocking pool under a timeout; no answer within the window counts as
//! a decline.

use std::time::Duration;

use async_trait::async_trait;
use dialoguer::Confirm;
use veridex_core::RetryDecider;

/// Asks the operator on the terminal.
pub struct PromptDecider {
    pub timeout: Duration,
}

#[async_trait]
impl RetryDecider for PromptDecider {
    async fn confirm_retry(&self, failed_suites: &[String]) -> bool {
        let prompt = format!(
            "Suite gate failed for {}. Rescan unmatched artifacts against them anyway?",
            failed_suites.join(", ")
        );
        let ask = tokio::task::spawn_blocking(move || {
            Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
                .unwrap_or(false)
        });
        match tokio::time::timeout(self.timeout, ask).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "retry prompt failed, declining");
                false
            }
            Err(_) => {
                tracing::warn!("retry prompt timed out, declining");
                false
            }
        }
    }
}

/// Non-interactive decision, for `--assume-yes`.
pub struct FixedDecider {
    pub answer: bool,
}

#[async_trait]
impl RetryDecider for FixedDecider {
    async fn confirm_retry(&self, _failed_suites: &[String]) -> bool {
        self.answer
    }
}
