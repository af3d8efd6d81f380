//! Configuration for the backup event handlers.
//!
//! Deployed handlers read the plain environment variables set by the stack
//! ([`BackupEventsConfig::from_env`]). For local runs, a TOML file with
//! `${VAR_NAME}` interpolation can be used instead.
//!
//! # Example
//!
//! ```toml
//! [backup]
//! vault_name = "Default"
//! copy_role_arn = "arn:aws:iam::111111111111:role/BackupCopy"
//! destination_vault_arn = "${DESTINATION_BACKUP_VAULT_ARN}"
//! new_delete_after_days = 7
//!
//! [observability.logging]
//! format = "json"
//! ```

mod backup;
mod observability;

use std::path::Path;

pub use backup::*;
pub use observability::*;
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackupEventsConfig {
    /// Vaults, role and retention default.
    pub backup: BackupConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl BackupEventsConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: BackupEventsConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from the deployment environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            backup: BackupConfig::from_env()?,
            observability: ObservabilityConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.backup.validate()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Environment variable {name} is not an integer: {value:?}")]
    InvalidNumber { name: String, value: String },

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Expand environment variables in the format `${VAR_NAME}`.
/// Skips commented lines (lines where content before the variable is a comment).
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| ConfigError::Validation(e.to_string()))?;
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');

        let mut line_result = String::with_capacity(line.len());
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let Some(whole) = cap.get(0) else {
                continue;
            };

            if let Some(pos) = comment_pos
                && whole.start() >= pos
            {
                continue;
            }

            line_result.push_str(&line[last_end..whole.start()]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            line_result.push_str(&value);

            last_end = whole.end();
        }

        line_result.push_str(&line[last_end..]);
        result.push_str(&line_result);
        result.push('\n');
    }

    // Remove trailing newline if input didn't have one
    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const MINIMAL: &str = r#"
        [backup]
        vault_name = "Default"
        copy_role_arn = "arn:aws:iam::111111111111:role/BackupCopy"
        destination_vault_arn = "arn:aws:backup:us-west-2:222222222222:backup-vault:Copies"
        new_delete_after_days = 7
    "#;

    #[test]
    fn test_minimal_config() {
        let config = BackupEventsConfig::from_str(MINIMAL).unwrap();
        assert_eq!(config.backup.vault_name, "Default");
        assert_eq!(config.backup.new_delete_after_days, 7);
        assert!(config.backup.region.is_none());
        assert_eq!(config.observability.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_env_var_expansion() {
        temp_env::with_var("TEST_VAULT_ARN", Some("arn:expanded"), || {
            let result = expand_env_vars("key = \"${TEST_VAULT_ARN}\"").unwrap();
            assert_eq!(result, "key = \"arn:expanded\"");
        });
    }

    #[test]
    fn test_env_var_in_comment_ignored() {
        let result = expand_env_vars("# role = \"${NONEXISTENT_VAR}\"").unwrap();
        assert_eq!(result, "# role = \"${NONEXISTENT_VAR}\"");
    }

    #[test]
    fn test_env_var_after_comment_ignored() {
        let result = expand_env_vars("key = \"value\" # ${NONEXISTENT_VAR}").unwrap();
        assert_eq!(result, "key = \"value\" # ${NONEXISTENT_VAR}");
    }

    #[test]
    fn test_missing_env_var_is_error() {
        temp_env::with_var_unset("BACKUP_EVENTS_MISSING", || {
            let err = expand_env_vars("key = \"${BACKUP_EVENTS_MISSING}\"").unwrap_err();
            assert!(matches!(err, ConfigError::EnvVarNotFound(name) if name == "BACKUP_EVENTS_MISSING"));
        });
    }

    #[test]
    fn test_config_with_expanded_variable() {
        temp_env::with_var("TEST_COPY_ROLE", Some("arn:aws:iam::1:role/Copy"), || {
            let config = BackupEventsConfig::from_str(
                r#"
                [backup]
                vault_name = "Default"
                copy_role_arn = "${TEST_COPY_ROLE}"
                destination_vault_arn = "arn:vault"
                new_delete_after_days = 0

                [observability.logging]
                format = "compact"
                level = "debug"
            "#,
            )
            .unwrap();
            assert_eq!(config.backup.copy_role_arn, "arn:aws:iam::1:role/Copy");
            assert_eq!(config.observability.logging.format, LogFormat::Compact);
        });
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = BackupEventsConfig::from_str(&format!("{MINIMAL}\n        retries = 3\n"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_empty_vault_rejected() {
        let err = BackupEventsConfig::from_str(&MINIMAL.replace("\"Default\"", "\"\""))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = BackupEventsConfig::from_file(file.path()).unwrap();
        assert_eq!(config.backup.vault_name, "Default");
    }

    #[test]
    fn test_from_missing_file() {
        let err = BackupEventsConfig::from_file("/nonexistent/backup-events.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                ("BACKUP_VAULT_NAME", Some("Default")),
                ("COPY_ROLE_ARN", Some("arn:role")),
                ("DESTINATION_BACKUP_VAULT_ARN", Some("arn:vault")),
                ("NEW_DELETE_AFTER_DAYS", Some("7")),
            ],
            || {
                let config = BackupEventsConfig::from_env().unwrap();
                assert_eq!(config.backup.vault_name, "Default");
                assert_eq!(config.backup.copy_role_arn, "arn:role");
                assert_eq!(config.backup.destination_vault_arn, "arn:vault");
                assert_eq!(config.backup.new_delete_after_days, 7);
            },
        );
    }
}
