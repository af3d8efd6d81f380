//! AWS Backup actions invoked on behalf of a notification.
//!
//! Each action has a fixed parameter set, named the way the AWS Backup API
//! names them. Parameters are assembled as a map so that configured base
//! parameters can be merged with per-notification ones, then converted into a
//! typed request before anything is sent.
//!
//! Backends:
//! - AWS Backup via the AWS SDK for Rust - requires `aws-sdk` feature
//! - In-memory (for testing)

#[cfg(feature = "aws-sdk")]
mod aws;
mod executor;
mod memory;
mod params;

use std::fmt;

use async_trait::async_trait;
#[cfg(feature = "aws-sdk")]
pub use aws::{AwsBackupClient, shared_client};
use chrono::{DateTime, Utc};
pub use executor::ActionExecutor;
pub use memory::{MemoryBackupClient, RecordedCall};
pub use params::{ActionParams, ActionParamsBase, param};
use serde::Serialize;
use thiserror::Error;

use crate::lifecycle::{Lifecycle, RecoveryPointDescription};

/// The AWS Backup operations this crate performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupAction {
    StartCopyJob,
    DescribeRecoveryPoint,
    UpdateRecoveryPointLifecycle,
}

impl BackupAction {
    pub const ALL: [BackupAction; 3] = [
        Self::StartCopyJob,
        Self::DescribeRecoveryPoint,
        Self::UpdateRecoveryPointLifecycle,
    ];

    /// SDK method name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartCopyJob => "start_copy_job",
            Self::DescribeRecoveryPoint => "describe_recovery_point",
            Self::UpdateRecoveryPointLifecycle => "update_recovery_point_lifecycle",
        }
    }

    /// Log entry type for this action's parameters.
    pub fn log_key(&self) -> String {
        format!("{}_KWARGS", self.name().to_uppercase())
    }
}

impl fmt::Display for BackupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum BackupError {
    /// The call reached the SDK and failed (network, permissions, throttling,
    /// or a service-side rejection).
    #[error("{action} failed: {message}")]
    Service {
        action: BackupAction,
        message: String,
    },

    #[error("{action} requires parameter {parameter}")]
    MissingParameter {
        action: BackupAction,
        parameter: &'static str,
    },

    #[error("{action} parameter {parameter} is invalid: {message}")]
    InvalidParameter {
        action: BackupAction,
        parameter: String,
        message: String,
    },

    #[error("{action} returned an unusable response: {message}")]
    MalformedResponse {
        action: BackupAction,
        message: String,
    },
}

impl BackupError {
    pub fn action(&self) -> BackupAction {
        match self {
            Self::Service { action, .. }
            | Self::MissingParameter { action, .. }
            | Self::InvalidParameter { action, .. }
            | Self::MalformedResponse { action, .. } => *action,
        }
    }
}

pub type BackupResult<T> = Result<T, BackupError>;

/// HTTP status reported for a call the service accepted.
pub const HTTP_OK: u16 = 200;

/// Transport-level outcome of a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseMetadata {
    #[serde(rename = "HTTPStatusCode")]
    pub http_status_code: u16,

    #[serde(rename = "RequestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Result of a `start_copy_job` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CopyJobStarted {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_job_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
}

/// Result of an `update_recovery_point_lifecycle` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleUpdated {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_vault_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_point_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<Lifecycle>,
}

/// Typed body of a response, one variant per action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActionOutput {
    CopyJobStarted(CopyJobStarted),
    RecoveryPoint(RecoveryPointDescription),
    LifecycleUpdated(LifecycleUpdated),
}

/// A response from the backup service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResponse {
    #[serde(rename = "ResponseMetadata")]
    pub response_metadata: ResponseMetadata,

    #[serde(flatten)]
    pub output: ActionOutput,
}

impl ActionResponse {
    /// An accepted call.
    pub fn ok(output: ActionOutput, request_id: Option<String>) -> Self {
        Self {
            response_metadata: ResponseMetadata {
                http_status_code: HTTP_OK,
                request_id,
            },
            output,
        }
    }

    /// True if the service accepted the call.
    ///
    /// Acceptance is not completion: a copy job may run for hours after
    /// `start_copy_job` succeeds.
    pub fn is_success(&self) -> bool {
        self.response_metadata.http_status_code == HTTP_OK
    }

    /// The description, for a `describe_recovery_point` response.
    pub fn recovery_point(&self) -> Option<&RecoveryPointDescription> {
        match &self.output {
            ActionOutput::RecoveryPoint(description) => Some(description),
            _ => None,
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Parameters for `start_copy_job`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartCopyJobRequest {
    pub recovery_point_arn: String,
    pub source_backup_vault_name: String,
    pub destination_backup_vault_arn: String,
    pub iam_role_arn: String,
    pub idempotency_token: Option<String>,
}

/// Parameters for `describe_recovery_point`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeRecoveryPointRequest {
    pub backup_vault_name: String,
    pub recovery_point_arn: String,
}

/// Parameters for `update_recovery_point_lifecycle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRecoveryPointLifecycleRequest {
    pub backup_vault_name: String,
    pub recovery_point_arn: String,
    pub lifecycle: Option<Lifecycle>,
}

/// A fully typed request for one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    StartCopyJob(StartCopyJobRequest),
    DescribeRecoveryPoint(DescribeRecoveryPointRequest),
    UpdateRecoveryPointLifecycle(UpdateRecoveryPointLifecycleRequest),
}

impl ActionRequest {
    /// Build the typed request for `action` from named parameters.
    ///
    /// Parameters the action does not accept are rejected, as are required
    /// parameters that are missing or not strings.
    pub fn from_params(action: BackupAction, params: &ActionParams) -> BackupResult<Self> {
        match action {
            BackupAction::StartCopyJob => {
                params.ensure_only(
                    action,
                    &[
                        param::RECOVERY_POINT_ARN,
                        param::SOURCE_BACKUP_VAULT_NAME,
                        param::DESTINATION_BACKUP_VAULT_ARN,
                        param::IAM_ROLE_ARN,
                        param::IDEMPOTENCY_TOKEN,
                    ],
                )?;
                Ok(Self::StartCopyJob(StartCopyJobRequest {
                    recovery_point_arn: params.required_str(action, param::RECOVERY_POINT_ARN)?,
                    source_backup_vault_name: params
                        .required_str(action, param::SOURCE_BACKUP_VAULT_NAME)?,
                    destination_backup_vault_arn: params
                        .required_str(action, param::DESTINATION_BACKUP_VAULT_ARN)?,
                    iam_role_arn: params.required_str(action, param::IAM_ROLE_ARN)?,
                    idempotency_token: params.optional_str(action, param::IDEMPOTENCY_TOKEN)?,
                }))
            }
            BackupAction::DescribeRecoveryPoint => {
                params.ensure_only(action, &[param::BACKUP_VAULT_NAME, param::RECOVERY_POINT_ARN])?;
                Ok(Self::DescribeRecoveryPoint(DescribeRecoveryPointRequest {
                    backup_vault_name: params.required_str(action, param::BACKUP_VAULT_NAME)?,
                    recovery_point_arn: params.required_str(action, param::RECOVERY_POINT_ARN)?,
                }))
            }
            BackupAction::UpdateRecoveryPointLifecycle => {
                params.ensure_only(
                    action,
                    &[
                        param::BACKUP_VAULT_NAME,
                        param::RECOVERY_POINT_ARN,
                        param::LIFECYCLE,
                    ],
                )?;
                Ok(Self::UpdateRecoveryPointLifecycle(
                    UpdateRecoveryPointLifecycleRequest {
                        backup_vault_name: params.required_str(action, param::BACKUP_VAULT_NAME)?,
                        recovery_point_arn: params
                            .required_str(action, param::RECOVERY_POINT_ARN)?,
                        lifecycle: params.optional_lifecycle(action)?,
                    },
                ))
            }
        }
    }
}

/// A backend able to perform the supported AWS Backup actions.
#[async_trait]
pub trait BackupClient: Send + Sync {
    async fn start_copy_job(&self, request: StartCopyJobRequest) -> BackupResult<ActionResponse>;

    async fn describe_recovery_point(
        &self,
        request: DescribeRecoveryPointRequest,
    ) -> BackupResult<ActionResponse>;

    async fn update_recovery_point_lifecycle(
        &self,
        request: UpdateRecoveryPointLifecycleRequest,
    ) -> BackupResult<ActionResponse>;

    /// Perform `action` with named parameters.
    async fn call(&self, action: BackupAction, params: &ActionParams) -> BackupResult<ActionResponse> {
        match ActionRequest::from_params(action, params)? {
            ActionRequest::StartCopyJob(request) => self.start_copy_job(request).await,
            ActionRequest::DescribeRecoveryPoint(request) => {
                self.describe_recovery_point(request).await
            }
            ActionRequest::UpdateRecoveryPointLifecycle(request) => {
                self.update_recovery_point_lifecycle(request).await
            }
        }
    }
}
