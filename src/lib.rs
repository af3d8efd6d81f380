//! Cross-account copies of AWS Backup recovery points.
//!
//! Two notifications drive everything:
//!
//! - **Backup job completed**: start a copy job from the source vault into
//!   the destination vault ([`BackupEventHandler::copy`]).
//! - **Copy job completed**: shorten the retention of the original so that
//!   it is deleted as early as is safe ([`BackupEventHandler::update_lifecycle`]).

pub mod backup;
pub mod config;
pub mod events;
pub mod handlers;
pub mod lifecycle;
pub mod observability;

pub use backup::{ActionResponse, BackupAction, BackupClient, BackupError};
pub use config::{BackupConfig, BackupEventsConfig, ConfigError};
pub use events::{Notification, RecoveryPoint};
pub use handlers::{BackupEventHandler, HandlerError};
pub use lifecycle::{LifecycleUpdate, compute_lifecycle_update};
