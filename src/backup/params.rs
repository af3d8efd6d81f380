use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{BackupAction, BackupError, BackupResult};
use crate::{config::BackupConfig, lifecycle::Lifecycle};

/// Parameter names, as the AWS Backup API spells them.
pub mod param {
    pub const BACKUP_VAULT_NAME: &str = "BackupVaultName";
    pub const DESTINATION_BACKUP_VAULT_ARN: &str = "DestinationBackupVaultArn";
    pub const IAM_ROLE_ARN: &str = "IamRoleArn";
    pub const IDEMPOTENCY_TOKEN: &str = "IdempotencyToken";
    pub const LIFECYCLE: &str = "Lifecycle";
    pub const RECOVERY_POINT_ARN: &str = "RecoveryPointArn";
    pub const SOURCE_BACKUP_VAULT_NAME: &str = "SourceBackupVaultName";
}

/// Named parameters for one action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionParams(Map<String, Value>);

impl ActionParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A copy of `self` with `extra` laid over it. `extra` wins on collision;
    /// `self` is left untouched.
    pub fn merged(&self, extra: &ActionParams) -> ActionParams {
        let mut merged = self.clone();
        merged
            .0
            .extend(extra.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub(super) fn ensure_only(&self, action: BackupAction, allowed: &[&str]) -> BackupResult<()> {
        match self.0.keys().find(|key| !allowed.contains(&key.as_str())) {
            Some(key) => Err(BackupError::InvalidParameter {
                action,
                parameter: key.clone(),
                message: "unknown parameter".to_string(),
            }),
            None => Ok(()),
        }
    }

    pub(super) fn required_str(
        &self,
        action: BackupAction,
        parameter: &'static str,
    ) -> BackupResult<String> {
        self.optional_str(action, parameter)?
            .ok_or(BackupError::MissingParameter { action, parameter })
    }

    pub(super) fn optional_str(
        &self,
        action: BackupAction,
        parameter: &'static str,
    ) -> BackupResult<Option<String>> {
        match self.0.get(parameter) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(BackupError::InvalidParameter {
                action,
                parameter: parameter.to_string(),
                message: format!("expected a string, got {other}"),
            }),
        }
    }

    pub(super) fn optional_lifecycle(&self, action: BackupAction) -> BackupResult<Option<Lifecycle>> {
        match self.0.get(param::LIFECYCLE) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                BackupError::InvalidParameter {
                    action,
                    parameter: param::LIFECYCLE.to_string(),
                    message: e.to_string(),
                }
            }),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ActionParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Configured parameters every call of an action starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionParamsBase {
    default: ActionParams,
    by_action: HashMap<BackupAction, ActionParams>,
}

impl ActionParamsBase {
    /// `default` applies to any action without its own entry.
    pub fn new(default: ActionParams) -> Self {
        Self {
            default,
            by_action: HashMap::new(),
        }
    }

    pub fn with_action(mut self, action: BackupAction, params: ActionParams) -> Self {
        self.by_action.insert(action, params);
        self
    }

    /// Base parameters from deployment configuration.
    ///
    /// Copies name the source vault and destination explicitly; every other
    /// action only needs the source vault.
    pub fn from_config(config: &BackupConfig) -> Self {
        let default = ActionParams::new().with(param::BACKUP_VAULT_NAME, config.vault_name.clone());
        let copy = ActionParams::new()
            .with(param::IAM_ROLE_ARN, config.copy_role_arn.clone())
            .with(param::SOURCE_BACKUP_VAULT_NAME, config.vault_name.clone())
            .with(
                param::DESTINATION_BACKUP_VAULT_ARN,
                config.destination_vault_arn.clone(),
            );
        Self::new(default).with_action(BackupAction::StartCopyJob, copy)
    }

    pub fn for_action(&self, action: BackupAction) -> &ActionParams {
        self.by_action.get(&action).unwrap_or(&self.default)
    }

    /// Base parameters for `action` with `extra` laid over them.
    pub fn merge(&self, action: BackupAction, extra: &ActionParams) -> ActionParams {
        self.for_action(action).merged(extra)
    }
}
