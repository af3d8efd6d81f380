//! AWS Backup implementation.
//!
//! Uses the AWS SDK for Rust with the standard credential chain (environment,
//! execution role, instance profile, etc.) and the standard retry mode.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, retry::RetryConfig};
use aws_sdk_backup::{Client, operation::RequestId, types};
use aws_smithy_types::error::display::DisplayErrorContext;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

use super::{
    ActionOutput, ActionResponse, BackupAction, BackupClient, BackupError, BackupResult,
    CopyJobStarted, DescribeRecoveryPointRequest, LifecycleUpdated, StartCopyJobRequest,
    UpdateRecoveryPointLifecycleRequest,
};
use crate::{
    config::BackupConfig,
    lifecycle::{Lifecycle, RecoveryPointDescription, StorageClass},
};

/// One SDK client per process, reused across invocations of a warm runtime.
static BACKUP_CLIENT: OnceCell<Client> = OnceCell::const_new();

/// The process-wide SDK client, built on first use.
///
/// The region and endpoint of the first caller win.
pub async fn shared_client(config: &BackupConfig) -> &'static Client {
    BACKUP_CLIENT
        .get_or_init(|| async { build_client(config).await })
        .await
}

async fn build_client(config: &BackupConfig) -> Client {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).retry_config(RetryConfig::standard());

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }

    let sdk_config = loader.load().await;

    let mut backup_config = aws_sdk_backup::config::Builder::from(&sdk_config);

    if let Some(endpoint_url) = &config.endpoint_url {
        backup_config = backup_config.endpoint_url(endpoint_url);
    }

    Client::from_conf(backup_config.build())
}

/// AWS Backup client.
#[derive(Clone)]
pub struct AwsBackupClient {
    client: Client,
}

impl AwsBackupClient {
    /// Wrap the process-wide SDK client.
    pub async fn shared(config: &BackupConfig) -> Self {
        Self::from_client(shared_client(config).await.clone())
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn service_error<E>(action: BackupAction, err: E) -> BackupError
where
    E: std::error::Error,
{
    BackupError::Service {
        action,
        message: DisplayErrorContext(err).to_string(),
    }
}

fn to_chrono(value: &aws_smithy_types::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

fn lifecycle_from_sdk(lifecycle: &types::Lifecycle) -> Lifecycle {
    Lifecycle {
        move_to_cold_storage_after_days: lifecycle.move_to_cold_storage_after_days(),
        delete_after_days: lifecycle.delete_after_days(),
        opt_in_to_archive: lifecycle.opt_in_to_archive_for_supported_resources(),
    }
}

fn lifecycle_to_sdk(lifecycle: &Lifecycle) -> types::Lifecycle {
    types::Lifecycle::builder()
        .set_move_to_cold_storage_after_days(lifecycle.move_to_cold_storage_after_days)
        .set_delete_after_days(lifecycle.delete_after_days)
        .set_opt_in_to_archive_for_supported_resources(lifecycle.opt_in_to_archive)
        .build()
}

#[async_trait]
impl BackupClient for AwsBackupClient {
    async fn start_copy_job(&self, request: StartCopyJobRequest) -> BackupResult<ActionResponse> {
        let action = BackupAction::StartCopyJob;

        let output = self
            .client
            .start_copy_job()
            .recovery_point_arn(request.recovery_point_arn)
            .source_backup_vault_name(request.source_backup_vault_name)
            .destination_backup_vault_arn(request.destination_backup_vault_arn)
            .iam_role_arn(request.iam_role_arn)
            .set_idempotency_token(request.idempotency_token)
            .send()
            .await
            .map_err(|err| service_error(action, err))?;

        Ok(ActionResponse::ok(
            ActionOutput::CopyJobStarted(CopyJobStarted {
                copy_job_id: output.copy_job_id().map(str::to_string),
                creation_date: output.creation_date().and_then(to_chrono),
            }),
            output.request_id().map(str::to_string),
        ))
    }

    async fn describe_recovery_point(
        &self,
        request: DescribeRecoveryPointRequest,
    ) -> BackupResult<ActionResponse> {
        let action = BackupAction::DescribeRecoveryPoint;

        let output = self
            .client
            .describe_recovery_point()
            .backup_vault_name(request.backup_vault_name)
            .recovery_point_arn(request.recovery_point_arn)
            .send()
            .await
            .map_err(|err| service_error(action, err))?;

        let creation_date = output
            .creation_date()
            .and_then(to_chrono)
            .ok_or_else(|| BackupError::MalformedResponse {
                action,
                message: "CreationDate is missing or out of range".to_string(),
            })?;

        let description = RecoveryPointDescription {
            recovery_point_arn: output.recovery_point_arn().map(str::to_string),
            creation_date,
            storage_class: output
                .storage_class()
                .map(|storage_class| StorageClass::from_service(storage_class.as_str())),
            lifecycle: output.lifecycle().map(lifecycle_from_sdk),
        };

        Ok(ActionResponse::ok(
            ActionOutput::RecoveryPoint(description),
            output.request_id().map(str::to_string),
        ))
    }

    async fn update_recovery_point_lifecycle(
        &self,
        request: UpdateRecoveryPointLifecycleRequest,
    ) -> BackupResult<ActionResponse> {
        let action = BackupAction::UpdateRecoveryPointLifecycle;

        let output = self
            .client
            .update_recovery_point_lifecycle()
            .backup_vault_name(request.backup_vault_name)
            .recovery_point_arn(request.recovery_point_arn)
            .set_lifecycle(request.lifecycle.as_ref().map(lifecycle_to_sdk))
            .send()
            .await
            .map_err(|err| service_error(action, err))?;

        Ok(ActionResponse::ok(
            ActionOutput::LifecycleUpdated(LifecycleUpdated {
                backup_vault_arn: output.backup_vault_arn().map(str::to_string),
                recovery_point_arn: output.recovery_point_arn().map(str::to_string),
                lifecycle: output.lifecycle().map(lifecycle_from_sdk),
            }),
            output.request_id().map(str::to_string),
        ))
    }
}
