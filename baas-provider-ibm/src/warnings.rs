//! Advisory checks on a policy document
//!
//! The API decides which schedule fields it honours, so these checks never
//! reject a policy. They point out fields the server will ignore.

use crate::models::{ProtectionPolicy, Schedule};

const CDP_UNITS: &[&str] = &["Minutes", "Hours"];

/// Describe fields of `policy` that the API is expected to ignore
pub fn policy_warnings(policy: &ProtectionPolicy) -> Vec<String> {
    let mut warnings = Vec::new();
    let backup = &policy.backup_policy;
    let regular = &backup.regular;

    let mut schedules: Vec<(String, &Schedule)> = Vec::new();
    if let Some(incremental) = &regular.incremental {
        schedules.push((
            "backup_policy.regular.incremental.schedule".to_string(),
            &incremental.schedule,
        ));
    }
    if let Some(schedule) = regular.full.as_ref().and_then(|f| f.schedule.as_ref()) {
        schedules.push(("backup_policy.regular.full.schedule".to_string(), schedule));
    }
    for (i, full) in regular.full_backups.iter().flatten().enumerate() {
        schedules.push((
            format!("backup_policy.regular.full_backups[{}].schedule", i),
            &full.schedule,
        ));
    }
    if let Some(log) = &backup.log {
        schedules.push(("backup_policy.log.schedule".to_string(), &log.schedule));
    }
    if let Some(bmr) = &backup.bmr {
        schedules.push(("backup_policy.bmr.schedule".to_string(), &bmr.schedule));
    }
    if let Some(snapshot) = &backup.storage_array_snapshot {
        schedules.push((
            "backup_policy.storage_array_snapshot.schedule".to_string(),
            &snapshot.schedule,
        ));
    }

    for (path, schedule) in &schedules {
        warnings.extend(schedule_warnings(path, schedule));
    }

    if regular.full.is_some() && regular.full_backups.is_some() {
        warnings.push(
            "backup_policy.regular: both full and full_backups are set; the API uses only one"
                .to_string(),
        );
    }

    if let Some(cdp) = &backup.cdp
        && !CDP_UNITS.contains(&cdp.retention.unit.as_str())
    {
        warnings.push(format!(
            "backup_policy.cdp.retention: unit {} is not one of Minutes, Hours",
            cdp.retention.unit
        ));
    }

    warnings
}

fn schedule_warnings(path: &str, schedule: &Schedule) -> Vec<String> {
    let expected = schedule.expected_sub_schedule();
    let mut warnings: Vec<String> = schedule
        .populated()
        .into_iter()
        .filter(|name| Some(*name) != expected)
        .map(|name| format!("{}: {} is ignored for unit {}", path, name, schedule.unit))
        .collect();

    if let Some(expected) = expected
        && !schedule.populated().contains(&expected)
    {
        warnings.push(format!(
            "{}: unit {} has no {}",
            path, schedule.unit, expected
        ));
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::policy::{
        CdpBackupPolicy, CdpRetention, FullBackupPolicy, FullScheduleAndRetention,
        IncrementalBackupPolicy,
    };
    use crate::models::{Frequency, Retention};

    fn policy_with(schedule: Schedule) -> ProtectionPolicy {
        let mut policy = ProtectionPolicy {
            name: "p".to_string(),
            ..Default::default()
        };
        policy.backup_policy.regular.incremental = Some(IncrementalBackupPolicy { schedule });
        policy
    }

    #[test]
    fn matching_schedule_has_no_warnings() {
        let schedule = Schedule {
            day_schedule: Some(Frequency { frequency: 1 }),
            ..Schedule::with_unit("Days")
        };
        assert!(policy_warnings(&policy_with(schedule)).is_empty());
    }

    #[test]
    fn extra_and_missing_sub_schedules_are_reported() {
        let schedule = Schedule {
            hour_schedule: Some(Frequency { frequency: 4 }),
            ..Schedule::with_unit("Days")
        };
        assert_eq!(
            policy_warnings(&policy_with(schedule)),
            vec![
                "backup_policy.regular.incremental.schedule: hour_schedule is ignored for unit Days",
                "backup_policy.regular.incremental.schedule: unit Days has no day_schedule",
            ]
        );
    }

    #[test]
    fn full_and_full_backups_together() {
        let mut policy = policy_with(Schedule {
            minute_schedule: Some(Frequency { frequency: 30 }),
            ..Schedule::with_unit("Minutes")
        });
        policy.backup_policy.regular.full = Some(FullBackupPolicy { schedule: None });
        policy.backup_policy.regular.full_backups = Some(vec![FullScheduleAndRetention {
            schedule: Schedule::with_unit("ProtectOnce"),
            retention: Retention {
                unit: "Weeks".to_string(),
                duration: 1,
                data_lock_config: None,
            },
        }]);

        let warnings = policy_warnings(&policy);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("both full and full_backups"));
    }

    #[test]
    fn cdp_retention_unit_is_checked() {
        let mut policy = ProtectionPolicy::default();
        policy.backup_policy.cdp = Some(CdpBackupPolicy {
            retention: CdpRetention {
                unit: "Days".to_string(),
                duration: 1,
                data_lock_config: None,
            },
        });
        assert_eq!(
            policy_warnings(&policy),
            vec!["backup_policy.cdp.retention: unit Days is not one of Minutes, Hours"]
        );
    }
}
