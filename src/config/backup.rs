//! AWS Backup vault and retention configuration.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Environment variable naming the source vault.
pub const BACKUP_VAULT_NAME_VAR: &str = "BACKUP_VAULT_NAME";
/// Environment variable naming the role AWS Backup assumes to copy.
pub const COPY_ROLE_ARN_VAR: &str = "COPY_ROLE_ARN";
/// Environment variable naming the destination vault.
pub const DESTINATION_BACKUP_VAULT_ARN_VAR: &str = "DESTINATION_BACKUP_VAULT_ARN";
/// Environment variable holding the minimum retention after copying.
pub const NEW_DELETE_AFTER_DAYS_VAR: &str = "NEW_DELETE_AFTER_DAYS";

/// Where recovery points come from and go to, and how long originals are
/// kept once copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackupConfig {
    /// Source vault. Every action addresses this vault; copies read from it.
    pub vault_name: String,

    /// IAM role AWS Backup assumes for copy jobs.
    pub copy_role_arn: String,

    /// Destination vault, in another account or region.
    pub destination_vault_arn: String,

    /// Minimum days an original is kept, counted from its creation, once a
    /// copy has completed.
    pub new_delete_after_days: i64,

    /// AWS region. Falls back to the SDK's default chain.
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint URL (for testing against an emulator).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl BackupConfig {
    /// Read the deployment environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let delete_days = required_var(NEW_DELETE_AFTER_DAYS_VAR)?;
        let new_delete_after_days =
            delete_days
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    name: NEW_DELETE_AFTER_DAYS_VAR.to_string(),
                    value: delete_days.clone(),
                })?;

        Ok(Self {
            vault_name: required_var(BACKUP_VAULT_NAME_VAR)?,
            copy_role_arn: required_var(COPY_ROLE_ARN_VAR)?,
            destination_vault_arn: required_var(DESTINATION_BACKUP_VAULT_ARN_VAR)?,
            new_delete_after_days,
            region: None,
            endpoint_url: None,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("backup.vault_name", &self.vault_name),
            ("backup.copy_role_arn", &self.copy_role_arn),
            ("backup.destination_vault_arn", &self.destination_vault_arn),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }

        if self.new_delete_after_days < 0 {
            return Err(ConfigError::Validation(format!(
                "backup.new_delete_after_days must not be negative, got {}",
                self.new_delete_after_days
            )));
        }

        Ok(())
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::EnvVarNotFound(name.to_string()))
}
