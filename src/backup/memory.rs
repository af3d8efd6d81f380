use std::sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::{
    ActionOutput, ActionResponse, BackupAction, BackupClient, BackupError, BackupResult,
    CopyJobStarted, DescribeRecoveryPointRequest, LifecycleUpdated, StartCopyJobRequest,
    UpdateRecoveryPointLifecycleRequest,
};
use crate::lifecycle::RecoveryPointDescription;

/// One request received by [`MemoryBackupClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    StartCopyJob(StartCopyJobRequest),
    DescribeRecoveryPoint(DescribeRecoveryPointRequest),
    UpdateRecoveryPointLifecycle(UpdateRecoveryPointLifecycleRequest),
}

impl RecordedCall {
    pub fn action(&self) -> BackupAction {
        match self {
            Self::StartCopyJob(_) => BackupAction::StartCopyJob,
            Self::DescribeRecoveryPoint(_) => BackupAction::DescribeRecoveryPoint,
            Self::UpdateRecoveryPointLifecycle(_) => BackupAction::UpdateRecoveryPointLifecycle,
        }
    }
}

/// In-memory backup service (for testing only)
///
/// Holds recovery points by ARN, honors idempotency tokens on copy jobs, and
/// records every request in order. Individual actions can be made to fail.
#[derive(Default)]
pub struct MemoryBackupClient {
    recovery_points: DashMap<String, RecoveryPointDescription>,
    copy_jobs_by_token: DashMap<String, String>,
    failures: DashMap<BackupAction, String>,
    calls: Mutex<Vec<RecordedCall>>,
    next_copy_job: AtomicU64,
}

impl MemoryBackupClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a recovery point under its `recovery_point_arn`.
    pub fn insert_recovery_point(&self, arn: impl Into<String>, description: RecoveryPointDescription) {
        self.recovery_points.insert(arn.into(), description);
    }

    pub fn recovery_point(&self, arn: &str) -> Option<RecoveryPointDescription> {
        self.recovery_points.get(arn).map(|entry| entry.value().clone())
    }

    /// Make every later call of `action` fail with `message`.
    pub fn fail(&self, action: BackupAction, message: impl Into<String>) {
        self.failures.insert(action, message.into());
    }

    /// Requests received so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, action: BackupAction, call: RecordedCall) -> BackupResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        match self.failures.get(&action) {
            Some(message) => Err(BackupError::Service {
                action,
                message: message.value().clone(),
            }),
            None => Ok(()),
        }
    }

    fn request_id(&self) -> Option<String> {
        Some(format!("memory-{}", self.calls().len()))
    }
}

#[async_trait]
impl BackupClient for MemoryBackupClient {
    async fn start_copy_job(&self, request: StartCopyJobRequest) -> BackupResult<ActionResponse> {
        let action = BackupAction::StartCopyJob;
        self.record(action, RecordedCall::StartCopyJob(request.clone()))?;

        let new_job_id = || {
            let n = self.next_copy_job.fetch_add(1, Ordering::SeqCst) + 1;
            format!("copy-job-{n}")
        };
        let copy_job_id = match &request.idempotency_token {
            Some(token) => self
                .copy_jobs_by_token
                .entry(token.clone())
                .or_insert_with(new_job_id)
                .value()
                .clone(),
            None => new_job_id(),
        };

        Ok(ActionResponse::ok(
            ActionOutput::CopyJobStarted(CopyJobStarted {
                copy_job_id: Some(copy_job_id),
                creation_date: Some(Utc::now()),
            }),
            self.request_id(),
        ))
    }

    async fn describe_recovery_point(
        &self,
        request: DescribeRecoveryPointRequest,
    ) -> BackupResult<ActionResponse> {
        let action = BackupAction::DescribeRecoveryPoint;
        self.record(action, RecordedCall::DescribeRecoveryPoint(request.clone()))?;

        let description = self
            .recovery_point(&request.recovery_point_arn)
            .ok_or_else(|| BackupError::Service {
                action,
                message: format!(
                    "ResourceNotFoundException: recovery point {} not found in vault {}",
                    request.recovery_point_arn, request.backup_vault_name
                ),
            })?;

        Ok(ActionResponse::ok(
            ActionOutput::RecoveryPoint(description),
            self.request_id(),
        ))
    }

    async fn update_recovery_point_lifecycle(
        &self,
        request: UpdateRecoveryPointLifecycleRequest,
    ) -> BackupResult<ActionResponse> {
        let action = BackupAction::UpdateRecoveryPointLifecycle;
        self.record(
            action,
            RecordedCall::UpdateRecoveryPointLifecycle(request.clone()),
        )?;

        let mut entry = self
            .recovery_points
            .get_mut(&request.recovery_point_arn)
            .ok_or_else(|| BackupError::Service {
                action,
                message: format!(
                    "ResourceNotFoundException: recovery point {} not found",
                    request.recovery_point_arn
                ),
            })?;
        entry.lifecycle = request.lifecycle.clone();
        drop(entry);

        Ok(ActionResponse::ok(
            ActionOutput::LifecycleUpdated(LifecycleUpdated {
                backup_vault_arn: None,
                recovery_point_arn: Some(request.recovery_point_arn),
                lifecycle: request.lifecycle,
            }),
            self.request_id(),
        ))
    }
}
