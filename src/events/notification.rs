use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `detail-type` prefix shared by every copy job notification.
pub const COPY_EVENT_PREFIX: &str = "Copy ";

/// An EventBridge notification emitted by AWS Backup.
///
/// Only the fields this crate reads are typed; everything else is kept in
/// `extra` so the full event can be logged as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "detail-type", default)]
    pub detail_type: String,

    #[serde(default)]
    pub detail: NotificationDetail,

    #[serde(default)]
    pub resources: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `detail` map of a job state change notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_job_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_job_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_recovery_point_arn: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notification {
    /// True for copy job notifications.
    pub fn is_copy_event(&self) -> bool {
        self.detail_type.starts_with(COPY_EVENT_PREFIX)
    }

    /// First resource identifier, or an empty string when there is none.
    pub fn first_resource(&self) -> &str {
        self.resources.first().map(String::as_str).unwrap_or("")
    }

    /// The notification as a JSON value, for logging.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
