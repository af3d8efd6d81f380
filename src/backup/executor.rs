use std::sync::Arc;

use super::{ActionParams, ActionParamsBase, ActionResponse, BackupAction, BackupClient, BackupResult};
use crate::{
    events::{Notification, RecoveryPoint},
    observability::{ActionOutcome, log_action},
};

/// Performs backup actions for one notification's recovery point and logs
/// each outcome.
#[derive(Clone)]
pub struct ActionExecutor {
    client: Arc<dyn BackupClient>,
    base: ActionParamsBase,
}

impl ActionExecutor {
    pub fn new(client: Arc<dyn BackupClient>, base: ActionParamsBase) -> Self {
        Self { client, base }
    }

    pub fn base(&self) -> &ActionParamsBase {
        &self.base
    }

    /// Invoke `action` with the configured base parameters and `extra` laid
    /// over them.
    ///
    /// With `require_valid`, an incomplete recovery point is declined: the
    /// would-be parameters are logged and `Ok(None)` is returned without
    /// calling the service. A failed call is logged and then returned as the
    /// error.
    pub async fn invoke(
        &self,
        notification: &Notification,
        recovery_point: &RecoveryPoint,
        action: BackupAction,
        extra: &ActionParams,
        require_valid: bool,
    ) -> BackupResult<Option<ActionResponse>> {
        let params = self.base.merge(action, extra);

        if require_valid && !recovery_point.is_valid() {
            tracing::info!(
                action = %action,
                kind = %recovery_point.kind(),
                "Recovery point incomplete, action declined"
            );
            log_action(notification, action, &params, ActionOutcome::Declined);
            return Ok(None);
        }

        match self.client.call(action, &params).await {
            Ok(response) => {
                log_action(
                    notification,
                    action,
                    &params,
                    ActionOutcome::Responded(&response),
                );
                Ok(Some(response))
            }
            Err(e) => {
                log_action(notification, action, &params, ActionOutcome::Failed(&e));
                Err(e)
            }
        }
    }
}
