//! Retention policy for an original recovery point once its copy exists.
//!
//! AWS Backup measures lifecycle transitions in whole days from the creation
//! date, but `CreationDate` carries a time of day and deletion runs at a
//! random point in the 8 hours after the day boundary. Every comparison here
//! therefore works on UTC calendar dates and keeps a one-day margin: the new
//! `DeleteAfterDays` is one more than the largest lower bound, and it replaces
//! an existing value only when strictly smaller.
//!
//! Lower bounds on the new `DeleteAfterDays`:
//!
//! | Bound | Reason |
//! |---|---|
//! | age in days | cannot schedule deletion in the past |
//! | 1 | minimum the service accepts |
//! | configured default | minimum retention after copying |
//! | cold threshold + 90 | already in (or entering) cold storage |
//! | age + 90 | in cold storage without a recorded transition |
//!
//! Upper bound: the existing `DeleteAfterDays`, so deletion is never delayed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Minimum number of days a recovery point must stay in cold storage.
pub const COLD_STORAGE_MINIMUM_DAYS: i64 = 90;

/// `MoveToColdStorageAfterDays` value that cancels a pending transition.
pub const CANCEL_COLD_STORAGE: i64 = -1;

/// Scheduled transitions for one recovery point, as AWS Backup names them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Lifecycle {
    /// Only honored when `opt_in_to_archive` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_to_cold_storage_after_days: Option<i64>,

    /// Absent means never delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_after_days: Option<i64>,

    #[serde(
        rename = "OptInToArchiveForSupportedResources",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub opt_in_to_archive: Option<bool>,
}

impl Lifecycle {
    /// Cold-storage threshold in effect, if the archive opt-in is active.
    pub fn cold_storage_after_days(&self) -> Option<i64> {
        if self.opt_in_to_archive.unwrap_or(false) {
            self.move_to_cold_storage_after_days
        } else {
            None
        }
    }
}

/// Current storage tier of a recovery point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StorageClass {
    Warm,
    Cold,
    Deleted,
    /// A value this crate does not know about.
    #[serde(other)]
    Unknown,
}

impl StorageClass {
    /// Parse the service's string form. Unrecognized values map to `Unknown`.
    pub fn from_service(value: &str) -> Self {
        match value {
            "WARM" => Self::Warm,
            "COLD" => Self::Cold,
            "DELETED" => Self::Deleted,
            _ => Self::Unknown,
        }
    }
}

/// Snapshot of a recovery point returned by `describe_recovery_point`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecoveryPointDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_point_arn: Option<String>,

    pub creation_date: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<StorageClass>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<Lifecycle>,
}

impl RecoveryPointDescription {
    /// Whole calendar days between creation and `today`, both in UTC.
    pub fn days_old(&self, today: NaiveDate) -> i64 {
        (today - self.creation_date.date_naive()).num_days()
    }
}

/// A replacement lifecycle to send with `update_recovery_point_lifecycle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleUpdate {
    pub lifecycle: Lifecycle,
}

/// Compute the lifecycle that schedules deletion of an original recovery
/// point as early as is safe, as of today (UTC).
pub fn compute_lifecycle_update(
    description: &RecoveryPointDescription,
    new_delete_after_days: i64,
) -> Option<LifecycleUpdate> {
    compute_lifecycle_update_on(description, Utc::now().date_naive(), new_delete_after_days)
}

/// Compute the lifecycle update as of a given UTC date.
///
/// Returns `None` when the existing schedule already deletes the recovery
/// point no later than the computed day; callers must then skip the update.
pub fn compute_lifecycle_update_on(
    description: &RecoveryPointDescription,
    today: NaiveDate,
    new_delete_after_days: i64,
) -> Option<LifecycleUpdate> {
    let mut lifecycle = description.lifecycle.clone().unwrap_or_default();
    let days_old = description.days_old(today);

    let mut minima = vec![days_old, 1, new_delete_after_days];
    let mut maximum = lifecycle.delete_after_days;

    match (description.storage_class, lifecycle.cold_storage_after_days()) {
        (Some(StorageClass::Deleted), _) => {
            maximum = Some(0);
        }
        (storage_class, Some(cold_storage_after_days)) => {
            if storage_class == Some(StorageClass::Warm) && days_old < cold_storage_after_days {
                // Not in cold storage and not moving there today
                lifecycle.opt_in_to_archive = Some(false);
                lifecycle.move_to_cold_storage_after_days = Some(CANCEL_COLD_STORAGE);
            } else {
                minima.push(cold_storage_after_days + COLD_STORAGE_MINIMUM_DAYS);
            }
        }
        (Some(StorageClass::Cold), None) => {
            // Cold without a scheduled transition: may have arrived as late as today.
            // Not observed from the service so far.
            minima.push(days_old + COLD_STORAGE_MINIMUM_DAYS);
        }
        _ => {}
    }

    let delete_after_days = minima.into_iter().fold(i64::MIN, i64::max) + 1;

    if maximum.is_none_or(|maximum| delete_after_days < maximum) {
        lifecycle.delete_after_days = Some(delete_after_days);
        Some(LifecycleUpdate { lifecycle })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveTime, TimeZone};
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    /// Created `days` calendar days before `today()`, late in the day.
    fn created_days_ago(days: i64) -> DateTime<Utc> {
        let date = today() - Duration::days(days);
        Utc.from_utc_datetime(&date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap()))
    }

    fn description(
        days: i64,
        storage_class: StorageClass,
        lifecycle: Option<Lifecycle>,
    ) -> RecoveryPointDescription {
        RecoveryPointDescription {
            recovery_point_arn: Some("arn:original".to_string()),
            creation_date: created_days_ago(days),
            storage_class: Some(storage_class),
            lifecycle,
        }
    }

    fn delete_after(update: Option<LifecycleUpdate>) -> Option<i64> {
        update.and_then(|u| u.lifecycle.delete_after_days)
    }

    #[rstest]
    #[case::young_default_wins(3, 7, 8)]
    #[case::age_wins(10, 7, 11)]
    #[case::same_day(0, 0, 2)]
    #[case::zero_default(5, 0, 6)]
    #[case::large_default(1, 35, 36)]
    fn test_warm_without_lifecycle(#[case] days: i64, #[case] default: i64, #[case] expected: i64) {
        let desc = description(days, StorageClass::Warm, None);
        let update = compute_lifecycle_update_on(&desc, today(), default);
        assert_eq!(delete_after(update), Some(expected));
        assert_eq!(expected, days.max(1).max(default) + 1);
    }

    #[test]
    fn test_time_of_day_is_ignored() {
        // One minute after midnight today versus just before midnight yesterday
        let mut desc = description(1, StorageClass::Warm, None);
        assert_eq!(desc.days_old(today()), 1);
        desc.creation_date = Utc.from_utc_datetime(&today().and_hms_opt(0, 1, 0).unwrap());
        assert_eq!(desc.days_old(today()), 0);
    }

    #[test]
    fn test_future_creation_date_uses_minimum() {
        let desc = description(-2, StorageClass::Warm, None);
        let update = compute_lifecycle_update_on(&desc, today(), 0);
        assert_eq!(delete_after(update), Some(2));
    }

    #[rstest]
    #[case::equal(11)]
    #[case::shorter(5)]
    #[case::already_due(1)]
    fn test_never_lengthens_retention(#[case] existing: i64) {
        let desc = description(
            10,
            StorageClass::Warm,
            Some(Lifecycle {
                delete_after_days: Some(existing),
                ..Default::default()
            }),
        );
        assert_eq!(compute_lifecycle_update_on(&desc, today(), 7), None);
    }

    #[test]
    fn test_shortens_existing_retention() {
        let desc = description(
            10,
            StorageClass::Warm,
            Some(Lifecycle {
                delete_after_days: Some(35),
                ..Default::default()
            }),
        );
        let update = compute_lifecycle_update_on(&desc, today(), 7).unwrap();
        assert_eq!(
            update.lifecycle,
            Lifecycle {
                delete_after_days: Some(11),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_one_day_shorter_is_applied() {
        let desc = description(
            10,
            StorageClass::Warm,
            Some(Lifecycle {
                delete_after_days: Some(12),
                ..Default::default()
            }),
        );
        assert_eq!(
            delete_after(compute_lifecycle_update_on(&desc, today(), 7)),
            Some(11)
        );
    }

    #[rstest]
    #[case::no_lifecycle(None)]
    #[case::long_lifecycle(Some(Lifecycle { delete_after_days: Some(365), ..Default::default() }))]
    #[case::cold_scheduled(Some(Lifecycle {
        move_to_cold_storage_after_days: Some(30),
        delete_after_days: Some(365),
        opt_in_to_archive: Some(true),
    }))]
    fn test_deleted_is_never_updated(#[case] lifecycle: Option<Lifecycle>) {
        for days in [0, 1, 10, 400] {
            let desc = description(days, StorageClass::Deleted, lifecycle.clone());
            assert_eq!(compute_lifecycle_update_on(&desc, today(), 0), None);
        }
    }

    #[test]
    fn test_warm_before_cold_transition_cancels_it() {
        let desc = description(
            10,
            StorageClass::Warm,
            Some(Lifecycle {
                move_to_cold_storage_after_days: Some(30),
                delete_after_days: Some(365),
                opt_in_to_archive: Some(true),
            }),
        );
        let update = compute_lifecycle_update_on(&desc, today(), 7).unwrap();
        assert_eq!(
            update.lifecycle,
            Lifecycle {
                move_to_cold_storage_after_days: Some(CANCEL_COLD_STORAGE),
                delete_after_days: Some(11),
                opt_in_to_archive: Some(false),
            }
        );
    }

    #[test]
    fn test_cold_cancellation_needs_shorter_deletion() {
        // Cancelling the transition is only sent along with a shorter deletion
        let desc = description(
            10,
            StorageClass::Warm,
            Some(Lifecycle {
                move_to_cold_storage_after_days: Some(30),
                delete_after_days: Some(11),
                opt_in_to_archive: Some(true),
            }),
        );
        assert_eq!(compute_lifecycle_update_on(&desc, today(), 7), None);
    }

    #[test]
    fn test_warm_transitioning_today_keeps_cold_minimum() {
        let desc = description(
            30,
            StorageClass::Warm,
            Some(Lifecycle {
                move_to_cold_storage_after_days: Some(30),
                delete_after_days: Some(365),
                opt_in_to_archive: Some(true),
            }),
        );
        let update = compute_lifecycle_update_on(&desc, today(), 7).unwrap();
        assert_eq!(
            update.lifecycle,
            Lifecycle {
                move_to_cold_storage_after_days: Some(30),
                delete_after_days: Some(30 + COLD_STORAGE_MINIMUM_DAYS + 1),
                opt_in_to_archive: Some(true),
            }
        );
    }

    #[test]
    fn test_already_cold_keeps_cold_minimum() {
        let desc = description(
            40,
            StorageClass::Cold,
            Some(Lifecycle {
                move_to_cold_storage_after_days: Some(30),
                delete_after_days: Some(365),
                opt_in_to_archive: Some(true),
            }),
        );
        let update = compute_lifecycle_update_on(&desc, today(), 7);
        assert_eq!(delete_after(update), Some(121));
    }

    #[test]
    fn test_cold_minimum_never_exceeds_existing_deletion() {
        let desc = description(
            40,
            StorageClass::Cold,
            Some(Lifecycle {
                move_to_cold_storage_after_days: Some(30),
                delete_after_days: Some(120),
                opt_in_to_archive: Some(true),
            }),
        );
        assert_eq!(compute_lifecycle_update_on(&desc, today(), 7), None);
    }

    #[test]
    fn test_cold_without_opt_in_assumes_transition_today() {
        let desc = description(40, StorageClass::Cold, None);
        let update = compute_lifecycle_update_on(&desc, today(), 7);
        assert_eq!(delete_after(update), Some(40 + 90 + 1));
    }

    #[test]
    fn test_threshold_without_opt_in_is_ignored() {
        let desc = description(
            10,
            StorageClass::Warm,
            Some(Lifecycle {
                move_to_cold_storage_after_days: Some(30),
                delete_after_days: None,
                opt_in_to_archive: Some(false),
            }),
        );
        let update = compute_lifecycle_update_on(&desc, today(), 7).unwrap();
        assert_eq!(
            update.lifecycle,
            Lifecycle {
                move_to_cold_storage_after_days: Some(30),
                delete_after_days: Some(11),
                opt_in_to_archive: Some(false),
            }
        );
    }

    #[test]
    fn test_unknown_storage_class_with_opt_in_keeps_cold_minimum() {
        let desc = description(
            10,
            StorageClass::Unknown,
            Some(Lifecycle {
                move_to_cold_storage_after_days: Some(30),
                delete_after_days: None,
                opt_in_to_archive: Some(true),
            }),
        );
        let update = compute_lifecycle_update_on(&desc, today(), 7);
        assert_eq!(delete_after(update), Some(121));
    }

    #[test]
    fn test_result_respects_every_bound() {
        let lifecycles = [
            None,
            Some(Lifecycle {
                delete_after_days: Some(50),
                ..Default::default()
            }),
            Some(Lifecycle {
                move_to_cold_storage_after_days: Some(20),
                delete_after_days: Some(200),
                opt_in_to_archive: Some(true),
            }),
        ];
        let classes = [StorageClass::Warm, StorageClass::Cold, StorageClass::Deleted];

        for lifecycle in &lifecycles {
            for class in classes {
                for days in [0, 1, 7, 19, 20, 21, 100] {
                    for default in [0, 7, 30] {
                        let desc = description(days, class, lifecycle.clone());
                        let Some(update) = compute_lifecycle_update_on(&desc, today(), default)
                        else {
                            continue;
                        };
                        let new = update.lifecycle.delete_after_days.unwrap();
                        assert!(new > days && new > default && new > 1);
                        if let Some(existing) = lifecycle.as_ref().and_then(|l| l.delete_after_days)
                        {
                            assert!(new < existing);
                        }
                        assert_ne!(class, StorageClass::Deleted);
                    }
                }
            }
        }
    }

    #[test]
    fn test_description_deserializes_service_names() {
        let desc: RecoveryPointDescription = serde_json::from_value(json!({
            "RecoveryPointArn": "arn:original",
            "CreationDate": "2024-06-05T12:30:00Z",
            "StorageClass": "WARM",
            "Lifecycle": {
                "MoveToColdStorageAfterDays": 30,
                "DeleteAfterDays": 365,
                "OptInToArchiveForSupportedResources": true
            }
        }))
        .unwrap();

        assert_eq!(desc.days_old(today()), 10);
        assert_eq!(desc.storage_class, Some(StorageClass::Warm));
        assert_eq!(
            desc.lifecycle.unwrap().cold_storage_after_days(),
            Some(30)
        );
    }

    #[test]
    fn test_update_serializes_service_names() {
        let update = LifecycleUpdate {
            lifecycle: Lifecycle {
                move_to_cold_storage_after_days: Some(-1),
                delete_after_days: Some(11),
                opt_in_to_archive: Some(false),
            },
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({
                "Lifecycle": {
                    "MoveToColdStorageAfterDays": -1,
                    "DeleteAfterDays": 11,
                    "OptInToArchiveForSupportedResources": false
                }
            })
        );
    }

    #[rstest]
    #[case("WARM", StorageClass::Warm)]
    #[case("COLD", StorageClass::Cold)]
    #[case("DELETED", StorageClass::Deleted)]
    #[case("GLACIER", StorageClass::Unknown)]
    fn test_storage_class_from_service(#[case] value: &str, #[case] expected: StorageClass) {
        assert_eq!(StorageClass::from_service(value), expected);
        let parsed: StorageClass = serde_json::from_value(json!(value)).unwrap();
        assert_eq!(parsed, expected);
    }
}
