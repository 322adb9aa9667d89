//! Protection group run, as returned by the runs listing
//!
//! Runs are read-only: every field is optional and mapped only when the
//! server sent it.

use baas_core::attr_model;

use super::common::{DataLockConstraints, Tiers};

attr_model! {
    pub struct ProtectionGroupRun {
        pub id: Option<String>,
        pub protection_group_instance_id: Option<i64>,
        pub protection_group_id: Option<String>,
        pub is_replication_run: Option<bool>,
        pub origin_cluster_identifier: Option<ClusterIdentifier>,
        pub origin_protection_group_id: Option<String>,
        pub protection_group_name: Option<String>,
        pub is_local_snapshots_deleted: Option<bool>,
        pub objects: Option<Vec<ObjectRunResult>>,
        pub local_backup_info: Option<BackupRunSummary>,
        pub original_backup_info: Option<BackupRunSummary>,
        pub replication_info: Option<ReplicationRunSummary>,
        pub archival_info: Option<ArchivalRunSummary>,
        pub cloud_spin_info: Option<CloudSpinRunSummary>,
        pub on_legal_hold: Option<bool>,
        pub permissions: Option<Vec<Tenant>>,
        pub is_cloud_archival_direct: Option<bool>,
        pub has_local_snapshot: Option<bool>,
        pub environment: Option<String>,
        pub externally_triggered_backup_tag: Option<String>,
    }
}

attr_model! {
    pub struct ClusterIdentifier {
        pub cluster_id: Option<i64>,
        pub cluster_incarnation_id: Option<i64>,
        pub cluster_name: Option<String>,
    }
}

attr_model! {
    pub struct Tenant {
        pub id: Option<String>,
        pub name: Option<String>,
    }
}

attr_model! {
    /// Result of a run for a single protected object
    pub struct ObjectRunResult {
        pub object: Option<ObjectSummary>,
        pub local_snapshot_info: Option<BackupRunInfo>,
        pub original_backup_info: Option<BackupRunInfo>,
        pub replication_info: Option<ReplicationRunSummary>,
        pub archival_info: Option<ArchivalRunSummary>,
        pub cloud_spin_info: Option<CloudSpinRunSummary>,
        pub on_legal_hold: Option<bool>,
    }
}

attr_model! {
    pub struct ObjectSummary {
        pub id: Option<i64>,
        pub name: Option<String>,
        pub source_id: Option<i64>,
        pub source_name: Option<String>,
        pub environment: Option<String>,
        pub object_hash: Option<String>,
        pub object_type: Option<String>,
        pub logical_size_bytes: Option<i64>,
        pub uuid: Option<String>,
        pub global_id: Option<String>,
        pub protection_type: Option<String>,
        pub os_type: Option<String>,
    }
}

attr_model! {
    pub struct BackupRunInfo {
        pub snapshot_info: Option<SnapshotInfo>,
        pub failed_attempts: Option<Vec<BackupAttempt>>,
    }
}

attr_model! {
    pub struct BackupDataStats {
        pub logical_size_bytes: Option<i64>,
        pub bytes_written: Option<i64>,
        pub bytes_read: Option<i64>,
    }
}

attr_model! {
    pub struct SnapshotInfo {
        pub snapshot_id: Option<String>,
        pub status: Option<String>,
        pub status_message: Option<String>,
        pub start_time_usecs: Option<i64>,
        pub end_time_usecs: Option<i64>,
        pub admitted_time_usecs: Option<i64>,
        pub permit_grant_time_usecs: Option<i64>,
        pub queue_duration_usecs: Option<i64>,
        pub snapshot_creation_time_usecs: Option<i64>,
        pub stats: Option<BackupDataStats>,
        pub progress_task_id: Option<String>,
        pub indexing_task_id: Option<String>,
        pub stats_task_id: Option<String>,
        pub warnings: Option<Vec<String>>,
        pub is_manually_deleted: Option<bool>,
        pub expiry_time_usecs: Option<i64>,
        pub total_file_count: Option<i64>,
        pub backup_file_count: Option<i64>,
        pub data_lock_constraints: Option<DataLockConstraints>,
    }
}

attr_model! {
    pub struct BackupAttempt {
        pub start_time_usecs: Option<i64>,
        pub end_time_usecs: Option<i64>,
        pub admitted_time_usecs: Option<i64>,
        pub permit_grant_time_usecs: Option<i64>,
        pub queue_duration_usecs: Option<i64>,
        pub snapshot_creation_time_usecs: Option<i64>,
        pub status: Option<String>,
        pub stats: Option<BackupDataStats>,
        pub progress_task_id: Option<String>,
        pub message: Option<String>,
    }
}

attr_model! {
    pub struct ReplicationRunSummary {
        pub replication_target_results: Option<Vec<ReplicationTargetResult>>,
    }
}

attr_model! {
    pub struct ReplicationDataStats {
        pub logical_size_bytes: Option<i64>,
        pub logical_bytes_transferred: Option<i64>,
        pub physical_bytes_transferred: Option<i64>,
    }
}

attr_model! {
    pub struct ReplicationTargetResult {
        pub cluster_id: Option<i64>,
        pub cluster_incarnation_id: Option<i64>,
        pub cluster_name: Option<String>,
        pub start_time_usecs: Option<i64>,
        pub end_time_usecs: Option<i64>,
        pub queued_time_usecs: Option<i64>,
        pub status: Option<String>,
        pub message: Option<String>,
        pub percentage_completed: Option<i64>,
        pub stats: Option<ReplicationDataStats>,
        pub is_manually_deleted: Option<bool>,
        pub expiry_time_usecs: Option<i64>,
        pub replication_task_id: Option<String>,
        pub entries_changed: Option<i64>,
        pub is_in_bound: Option<bool>,
        pub data_lock_constraints: Option<DataLockConstraints>,
        pub on_legal_hold: Option<bool>,
        pub multi_object_replication: Option<bool>,
    }
}

attr_model! {
    pub struct ArchivalRunSummary {
        pub archival_target_results: Option<Vec<ArchivalTargetResult>>,
    }
}

attr_model! {
    /// Tier settings as reported on a run, with the tier currently in use
    pub struct ArchivalTierSettings {
        pub cloud_platform: Option<String>,
        pub aws_tiering: Option<Tiers>,
        pub azure_tiering: Option<Tiers>,
        pub google_tiering: Option<Tiers>,
        pub oracle_tiering: Option<Tiers>,
        pub current_tier_type: Option<String>,
    }
}

attr_model! {
    pub struct ArchivalDataStats {
        pub logical_size_bytes: Option<i64>,
        pub bytes_read: Option<i64>,
        pub logical_bytes_transferred: Option<i64>,
        pub physical_bytes_transferred: Option<i64>,
        pub avg_logical_transfer_rate_bps: Option<f64>,
        pub file_walk_done: Option<bool>,
        pub total_file_count: Option<i64>,
        pub backup_file_count: Option<i64>,
    }
}

attr_model! {
    pub struct WormProperties {
        pub is_archive_worm_compliant: Option<bool>,
        pub worm_non_compliance_reason: Option<String>,
        pub worm_expiry_time_usecs: Option<i64>,
    }
}

attr_model! {
    pub struct ArchivalTargetResult {
        pub target_id: Option<i64>,
        pub archival_task_id: Option<String>,
        pub target_name: Option<String>,
        pub target_type: Option<String>,
        pub usage_type: Option<String>,
        pub ownership_context: Option<String>,
        pub tier_settings: Option<ArchivalTierSettings>,
        pub run_type: Option<String>,
        pub is_sla_violated: Option<bool>,
        pub snapshot_id: Option<String>,
        pub start_time_usecs: Option<i64>,
        pub end_time_usecs: Option<i64>,
        pub queued_time_usecs: Option<i64>,
        pub is_incremental: Option<bool>,
        pub is_forever_incremental: Option<bool>,
        pub is_cad_archive: Option<bool>,
        pub status: Option<String>,
        pub message: Option<String>,
        pub progress_task_id: Option<String>,
        pub stats_task_id: Option<String>,
        pub indexing_task_id: Option<String>,
        pub successful_objects_count: Option<i64>,
        pub failed_objects_count: Option<i64>,
        pub cancelled_objects_count: Option<i64>,
        pub successful_app_objects_count: Option<i64>,
        pub failed_app_objects_count: Option<i64>,
        pub cancelled_app_objects_count: Option<i64>,
        pub stats: Option<ArchivalDataStats>,
        pub is_manually_deleted: Option<bool>,
        pub expiry_time_usecs: Option<i64>,
        pub data_lock_constraints: Option<DataLockConstraints>,
        pub on_legal_hold: Option<bool>,
        pub worm_properties: Option<WormProperties>,
    }
}

attr_model! {
    pub struct CloudSpinRunSummary {
        pub cloud_spin_target_results: Option<Vec<CloudSpinTargetResult>>,
    }
}

attr_model! {
    pub struct CloudSpinDataStats {
        pub physical_bytes_transferred: Option<i64>,
    }
}

attr_model! {
    pub struct CloudSpinTargetResult {
        pub id: Option<i64>,
        pub name: Option<String>,
        pub start_time_usecs: Option<i64>,
        pub end_time_usecs: Option<i64>,
        pub status: Option<String>,
        pub message: Option<String>,
        pub stats: Option<CloudSpinDataStats>,
        pub is_manually_deleted: Option<bool>,
        pub expiry_time_usecs: Option<i64>,
        pub cloudspin_task_id: Option<String>,
        pub progress_task_id: Option<String>,
        pub data_lock_constraints: Option<DataLockConstraints>,
        pub on_legal_hold: Option<bool>,
    }
}

attr_model! {
    /// Aggregate of a run at one location (local or original cluster)
    pub struct BackupRunSummary {
        pub run_type: Option<String>,
        pub is_sla_violated: Option<bool>,
        pub start_time_usecs: Option<i64>,
        pub end_time_usecs: Option<i64>,
        pub status: Option<String>,
        pub messages: Option<Vec<String>>,
        pub successful_objects_count: Option<i64>,
        pub skipped_objects_count: Option<i64>,
        pub failed_objects_count: Option<i64>,
        pub cancelled_objects_count: Option<i64>,
        pub successful_app_objects_count: Option<i64>,
        pub failed_app_objects_count: Option<i64>,
        pub cancelled_app_objects_count: Option<i64>,
        pub local_snapshot_stats: Option<BackupDataStats>,
        pub indexing_task_id: Option<String>,
        pub progress_task_id: Option<String>,
        pub stats_task_id: Option<String>,
        pub data_lock: Option<String>,
        pub local_task_id: Option<String>,
        pub data_lock_constraints: Option<DataLockConstraints>,
    }
}

/// One page of the runs listing
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionGroupRunsResponse {
    #[serde(default)]
    pub runs: Vec<ProtectionGroupRun>,
    pub total_runs: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use baas_core::attrs::AttrBlock;
    use baas_core::resource::Value;
    use serde_json::json;

    fn run_json() -> serde_json::Value {
        json!({
            "id": "4:1700000000:1",
            "protectionGroupId": "g1",
            "protectionGroupName": "vm-group",
            "isReplicationRun": false,
            "environment": "kVMware",
            "localBackupInfo": {
                "runType": "kIncremental",
                "status": "Succeeded",
                "startTimeUsecs": 1700000000000000i64,
                "endTimeUsecs": 1700000360000000i64,
                "successfulObjectsCount": 3,
                "messages": ["done"],
                "dataLockConstraints": {"mode": "Compliance", "expiryTimeUsecs": 1800000000000000i64}
            },
            "archivalInfo": {
                "archivalTargetResults": [{
                    "targetId": 9,
                    "targetName": "cos-vault",
                    "tierSettings": {"cloudPlatform": "AWS", "currentTierType": "kAmazonS3Standard"},
                    "stats": {"avgLogicalTransferRateBps": 1048576.5, "fileWalkDone": true},
                    "wormProperties": {"isArchiveWormCompliant": true}
                }]
            },
            "objects": [{
                "object": {"id": 12, "name": "vm-a", "environment": "kVMware"},
                "localSnapshotInfo": {
                    "snapshotInfo": {
                        "status": "kSuccessful",
                        "stats": {"logicalSizeBytes": 1024, "bytesWritten": 512},
                        "warnings": ["slow datastore"]
                    },
                    "failedAttempts": [{"status": "kFailed", "message": "timeout"}]
                }
            }]
        })
    }

    #[test]
    fn run_round_trip_through_attributes() {
        let run: ProtectionGroupRun = serde_json::from_value(run_json()).unwrap();
        let attrs = run.to_attrs();
        assert_eq!(ProtectionGroupRun::from_attrs(&attrs).unwrap(), run);
        assert_eq!(serde_json::to_value(&run).unwrap(), run_json());
    }

    #[test]
    fn only_present_run_fields_are_mapped() {
        let run: ProtectionGroupRun = serde_json::from_value(run_json()).unwrap();
        let attrs = run.to_attrs();

        assert!(!attrs.contains_key("replication_info"));
        assert!(!attrs.contains_key("origin_cluster_identifier"));
        let local = attrs["local_backup_info"].as_map().unwrap();
        assert_eq!(local.get("successful_objects_count"), Some(&Value::Int(3)));
        assert!(!local.contains_key("failed_objects_count"));

        let archival = match &attrs["archival_info"].as_map().unwrap()["archival_target_results"] {
            Value::List(items) => items[0].as_map().unwrap().clone(),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(
            archival["stats"].as_map().unwrap().get("avg_logical_transfer_rate_bps"),
            Some(&Value::Float(1048576.5))
        );
    }

    #[test]
    fn runs_response_tolerates_missing_list() {
        let page: ProtectionGroupRunsResponse = serde_json::from_value(json!({})).unwrap();
        assert!(page.runs.is_empty());
        assert_eq!(page.total_runs, None);
    }
}
