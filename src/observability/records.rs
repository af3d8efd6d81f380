//! Structured decision records.
//!
//! Each record is a `tracing` event with an `entry_type` tag and a JSON
//! `value`. Records about one action share a severity: `ERROR` when the
//! action failed, `INFO` otherwise.

use serde_json::Value;
use tracing::Level;

use crate::{
    backup::{ActionParams, ActionResponse, BackupAction, BackupError},
    events::Notification,
};

/// The notification being handled.
pub const LAMBDA_EVENT: &str = "LAMBDA_EVENT";
/// A response from the backup service.
pub const AWS_RESPONSE: &str = "AWS_RESPONSE";
/// A failed call.
pub const EXCEPTION: &str = "EXCEPTION";

/// What became of one action.
#[derive(Debug, Clone, Copy)]
pub enum ActionOutcome<'a> {
    /// Not attempted; the recovery point was incomplete.
    Declined,
    /// The service answered.
    Responded(&'a ActionResponse),
    /// The call failed.
    Failed(&'a BackupError),
}

impl ActionOutcome<'_> {
    /// Severity for every record about this outcome.
    pub fn level(&self) -> Level {
        match self {
            Self::Declined => Level::INFO,
            Self::Responded(response) if response.is_success() => Level::INFO,
            Self::Responded(_) | Self::Failed(_) => Level::ERROR,
        }
    }
}

/// Emit one record.
pub fn log_entry(entry_type: &str, value: &Value, level: Level) {
    if level == Level::ERROR {
        tracing::error!(entry_type, value = %value);
    } else if level == Level::WARN {
        tracing::warn!(entry_type, value = %value);
    } else if level == Level::DEBUG || level == Level::TRACE {
        tracing::debug!(entry_type, value = %value);
    } else {
        tracing::info!(entry_type, value = %value);
    }
}

/// Log the notification, the parameters, and the outcome of an action.
pub fn log_action(
    notification: &Notification,
    action: BackupAction,
    params: &ActionParams,
    outcome: ActionOutcome<'_>,
) {
    let level = outcome.level();

    log_entry(LAMBDA_EVENT, &notification.to_value(), level);
    log_entry(&action.log_key(), &params.to_value(), level);

    match outcome {
        ActionOutcome::Declined => {}
        ActionOutcome::Responded(response) => {
            log_entry(AWS_RESPONSE, &response.to_value(), level);
        }
        ActionOutcome::Failed(error) => {
            log_entry(EXCEPTION, &Value::String(error.to_string()), level);
        }
    }
}
