//! Inbound AWS Backup completion notifications.
//!
//! Two notification shapes reach this crate, both already filtered upstream
//! to the `COMPLETED` state:
//!
//! ```text
//! Backup Job State Change   detail.backupJobId                    resources[0] = recovery point
//! Copy Job State Change     detail.copyJobId,                     resources[0] = source (original)
//!                           detail.destinationRecoveryPointArn
//! ```
//!
//! [`RecoveryPoint::from_notification`] classifies a [`Notification`] into the
//! original recovery point or the copy it produced.

mod notification;
mod recovery_point;

pub use notification::{COPY_EVENT_PREFIX, Notification, NotificationDetail};
pub use recovery_point::{OriginalRecoveryPoint, RecoveryPoint, RecoveryPointCopy, RecoveryPointKind};
