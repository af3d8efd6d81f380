use std::fmt;

use super::Notification;

/// Which job produced the recovery point a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPointKind {
    /// Created by a backup job; the original.
    Original,
    /// Created by a copy job in the destination vault.
    Copy,
}

impl RecoveryPointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Copy => "copy",
        }
    }
}

impl fmt::Display for RecoveryPointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recovery point created by a backup job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalRecoveryPoint {
    /// `detail.backupJobId`
    pub from_job_id: String,
    /// `resources[0]`
    pub arn: String,
}

/// A recovery point created by a copy job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryPointCopy {
    /// `detail.copyJobId`
    pub from_job_id: String,
    /// `resources[0]`, the original that was copied
    pub from_backup_arn: String,
    /// `detail.destinationRecoveryPointArn`
    pub arn: String,
}

/// A recovery point named by a completion notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryPoint {
    Original(OriginalRecoveryPoint),
    Copy(RecoveryPointCopy),
}

impl RecoveryPoint {
    /// Classify a notification.
    ///
    /// Copy job notifications become [`RecoveryPoint::Copy`]; anything else is
    /// treated as a backup job notification. Missing fields become empty
    /// strings and are caught by [`RecoveryPoint::is_valid`].
    pub fn from_notification(notification: &Notification) -> Self {
        let detail = &notification.detail;
        if notification.is_copy_event() {
            Self::Copy(RecoveryPointCopy {
                from_job_id: detail.copy_job_id.clone().unwrap_or_default(),
                from_backup_arn: notification.first_resource().to_string(),
                arn: detail
                    .destination_recovery_point_arn
                    .clone()
                    .unwrap_or_default(),
            })
        } else {
            Self::Original(OriginalRecoveryPoint {
                from_job_id: detail.backup_job_id.clone().unwrap_or_default(),
                arn: notification.first_resource().to_string(),
            })
        }
    }

    pub fn kind(&self) -> RecoveryPointKind {
        match self {
            Self::Original(_) => RecoveryPointKind::Original,
            Self::Copy(_) => RecoveryPointKind::Copy,
        }
    }

    /// Identifier of the job that created this recovery point.
    pub fn from_job_id(&self) -> &str {
        match self {
            Self::Original(point) => &point.from_job_id,
            Self::Copy(point) => &point.from_job_id,
        }
    }

    /// The original this recovery point was copied from. Empty for originals.
    pub fn from_backup_arn(&self) -> &str {
        match self {
            Self::Original(_) => "",
            Self::Copy(point) => &point.from_backup_arn,
        }
    }

    /// This recovery point's own identifier.
    pub fn arn(&self) -> &str {
        match self {
            Self::Original(point) => &point.arn,
            Self::Copy(point) => &point.arn,
        }
    }

    /// Cursory check that every required identifier is non-empty.
    ///
    /// The backup service performs the real validation when an action is
    /// invoked.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Original(point) => !point.from_job_id.is_empty() && !point.arn.is_empty(),
            Self::Copy(point) => {
                !point.from_job_id.is_empty()
                    && !point.from_backup_arn.is_empty()
                    && !point.arn.is_empty()
            }
        }
    }
}
