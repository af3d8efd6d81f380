//! Entry points for the two backup notifications.
//!
//! - A completed backup job starts a copy of the new recovery point into the
//!   destination vault.
//! - A completed copy job shortens the retention of the original it was
//!   copied from, so that only the copy outlives the configured minimum.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::{
    backup::{
        ActionExecutor, ActionParams, ActionParamsBase, ActionResponse, BackupAction,
        BackupClient, BackupError, param,
    },
    config::BackupConfig,
    events::{Notification, RecoveryPoint, RecoveryPointKind},
    lifecycle::compute_lifecycle_update_on,
};

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("expected a notification about {expected} recovery point, got {actual}")]
    UnexpectedRecoveryPoint {
        expected: RecoveryPointKind,
        actual: RecoveryPointKind,
    },

    #[error(transparent)]
    Action(#[from] BackupError),
}

pub type HandlerResult<T> = Result<T, HandlerError>;

/// Handles backup and copy job notifications for one source vault.
#[derive(Clone)]
pub struct BackupEventHandler {
    executor: ActionExecutor,
    new_delete_after_days: i64,
}

impl BackupEventHandler {
    pub fn new(client: Arc<dyn BackupClient>, config: &BackupConfig) -> Self {
        Self {
            executor: ActionExecutor::new(client, ActionParamsBase::from_config(config)),
            new_delete_after_days: config.new_delete_after_days,
        }
    }

    /// Handler backed by AWS Backup, sharing the process-wide SDK client.
    #[cfg(feature = "aws-sdk")]
    pub async fn from_config(config: &BackupConfig) -> Self {
        let client = crate::backup::AwsBackupClient::shared(config).await;
        Self::new(Arc::new(client), config)
    }

    /// Start copying the recovery point a backup job just created.
    ///
    /// The backup job id is the idempotency token, so a redelivered
    /// notification does not start a second copy. Returns `None` when the
    /// notification lacks the job id or recovery point ARN.
    pub async fn copy(&self, notification: &Notification) -> HandlerResult<Option<ActionResponse>> {
        let recovery_point = expect_kind(notification, RecoveryPointKind::Original)?;

        let extra = ActionParams::new()
            .with(param::RECOVERY_POINT_ARN, recovery_point.arn())
            .with(param::IDEMPOTENCY_TOKEN, recovery_point.from_job_id());

        let response = self
            .executor
            .invoke(
                notification,
                &recovery_point,
                BackupAction::StartCopyJob,
                &extra,
                true,
            )
            .await?;

        Ok(response)
    }

    /// Shorten the retention of the original a copy job was made from.
    ///
    /// Returns the update response, or `None` when the current schedule
    /// already deletes the original no later than the computed day.
    pub async fn update_lifecycle(
        &self,
        notification: &Notification,
    ) -> HandlerResult<Option<ActionResponse>> {
        self.update_lifecycle_on(notification, Utc::now().date_naive())
            .await
    }

    /// [`Self::update_lifecycle`] with ages counted up to `today` (UTC).
    pub async fn update_lifecycle_on(
        &self,
        notification: &Notification,
        today: NaiveDate,
    ) -> HandlerResult<Option<ActionResponse>> {
        let recovery_point = expect_kind(notification, RecoveryPointKind::Copy)?;
        let original_arn = recovery_point.from_backup_arn();

        let described = self
            .executor
            .invoke(
                notification,
                &recovery_point,
                BackupAction::DescribeRecoveryPoint,
                &ActionParams::new().with(param::RECOVERY_POINT_ARN, original_arn),
                false,
            )
            .await?;

        let Some(description) = described
            .as_ref()
            .filter(|response| response.is_success())
            .and_then(ActionResponse::recovery_point)
        else {
            return Ok(None);
        };

        let Some(update) =
            compute_lifecycle_update_on(description, today, self.new_delete_after_days)
        else {
            tracing::info!(
                recovery_point_arn = original_arn,
                "Existing lifecycle already deletes the original in time"
            );
            return Ok(None);
        };

        let lifecycle = serde_json::to_value(&update.lifecycle).map_err(|e| {
            BackupError::InvalidParameter {
                action: BackupAction::UpdateRecoveryPointLifecycle,
                parameter: param::LIFECYCLE.to_string(),
                message: e.to_string(),
            }
        })?;

        let extra = ActionParams::new()
            .with(param::LIFECYCLE, lifecycle)
            .with(param::RECOVERY_POINT_ARN, original_arn);

        let response = self
            .executor
            .invoke(
                notification,
                &recovery_point,
                BackupAction::UpdateRecoveryPointLifecycle,
                &extra,
                false,
            )
            .await?;

        Ok(response)
    }
}

fn expect_kind(
    notification: &Notification,
    expected: RecoveryPointKind,
) -> HandlerResult<RecoveryPoint> {
    let recovery_point = RecoveryPoint::from_notification(notification);
    let actual = recovery_point.kind();
    if actual != expected {
        return Err(HandlerError::UnexpectedRecoveryPoint { expected, actual });
    }
    Ok(recovery_point)
}
