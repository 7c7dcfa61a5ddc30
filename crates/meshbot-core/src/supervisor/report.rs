//! Aggregate results of best-effort supervisor operations.

use meshbot_types::channel::ChannelId;
use serde::Serialize;

use crate::bot::DispatchOutcome;

/// One bot that failed during a batch operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub name: String,
    pub error: String,
}

/// Result of `start_all` / `stop_all`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<BatchFailure>,
    /// Bots already in the target state.
    pub skipped: Vec<String>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Dispatch outcome for one recipient of a routed message.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipientOutcome {
    pub bot: String,
    pub outcome: DispatchOutcome,
}

/// Result of routing one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteReport {
    pub channel: ChannelId,
    pub recipients: Vec<RecipientOutcome>,
}

impl RouteReport {
    pub fn recipient_names(&self) -> Vec<&str> {
        self.recipients.iter().map(|r| r.bot.as_str()).collect()
    }

    /// Recipients whose handler ran successfully.
    pub fn handled(&self) -> usize {
        self.recipients
            .iter()
            .filter(|r| matches!(r.outcome, DispatchOutcome::Handled { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.recipients
            .iter()
            .filter(|r| matches!(r.outcome, DispatchOutcome::Failed { .. }))
            .count()
    }
}
