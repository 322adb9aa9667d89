//! Protection policy document

use baas_core::attr_model;

use super::common::{
    DataLockConfig, Retention, RunTimeout, Schedule, TargetSchedule, TierSettings,
};

attr_model! {
    /// A named, reusable backup schedule and retention ruleset.
    ///
    /// The same document is sent on create and update (full PUT) and read
    /// back on get; the last five fields are computed by the server.
    pub struct ProtectionPolicy {
        pub id: Option<String>,
        pub name: String,
        pub backup_policy: BackupPolicy,
        pub description: Option<String>,
        pub blackout_window: Option<Vec<BlackoutWindow>>,
        pub extended_retention: Option<Vec<ExtendedRetentionPolicy>>,
        pub remote_target_policy: Option<TargetsConfiguration>,
        pub cascaded_targets_config: Option<Vec<CascadedTargetConfiguration>>,
        pub retry_options: Option<RetryOptions>,
        /// Administrative or Compliance
        pub data_lock: Option<String>,
        pub version: Option<i64>,
        #[serde(rename = "isCBSEnabled")]
        pub is_cbs_enabled: Option<bool>,
        pub last_modification_time_usecs: Option<i64>,
        pub template_id: Option<String>,
        pub is_usable: Option<bool>,
        pub is_replicated: Option<bool>,
        pub num_protection_groups: Option<i64>,
        pub num_protected_objects: Option<i64>,
    }
}

impl ProtectionPolicy {
    /// Attributes the server computes and never accepts in a request
    pub const COMPUTED: &'static [&'static str] = &[
        "id",
        "is_usable",
        "is_replicated",
        "num_protection_groups",
        "num_protected_objects",
    ];

    /// The document to send on create or update
    pub fn into_request(mut self) -> Self {
        self.id = None;
        self.is_usable = None;
        self.is_replicated = None;
        self.num_protection_groups = None;
        self.num_protected_objects = None;
        self
    }
}

attr_model! {
    pub struct BackupPolicy {
        pub regular: RegularBackupPolicy,
        pub log: Option<LogBackupPolicy>,
        pub bmr: Option<BmrBackupPolicy>,
        pub cdp: Option<CdpBackupPolicy>,
        pub storage_array_snapshot: Option<StorageArraySnapshotBackupPolicy>,
        pub run_timeouts: Option<Vec<RunTimeout>>,
    }
}

attr_model! {
    pub struct RegularBackupPolicy {
        pub incremental: Option<IncrementalBackupPolicy>,
        /// Use either `full` or `full_backups`
        pub full: Option<FullBackupPolicy>,
        pub full_backups: Option<Vec<FullScheduleAndRetention>>,
        pub retention: Option<Retention>,
        pub primary_backup_target: Option<PrimaryBackupTarget>,
    }
}

attr_model! {
    pub struct IncrementalBackupPolicy {
        pub schedule: Schedule,
    }
}

attr_model! {
    pub struct FullBackupPolicy {
        pub schedule: Option<Schedule>,
    }
}

attr_model! {
    pub struct FullScheduleAndRetention {
        pub schedule: Schedule,
        pub retention: Retention,
    }
}

attr_model! {
    pub struct PrimaryBackupTarget {
        /// Local or Archival
        pub target_type: Option<String>,
        pub archival_target_settings: Option<PrimaryArchivalTarget>,
        pub use_default_backup_target: Option<bool>,
    }
}

attr_model! {
    pub struct PrimaryArchivalTarget {
        pub target_id: i64,
        pub target_name: Option<String>,
        pub tier_settings: Option<TierSettings>,
    }
}

attr_model! {
    pub struct LogBackupPolicy {
        /// Minutes or Hours
        pub schedule: Schedule,
        pub retention: Retention,
    }
}

attr_model! {
    pub struct BmrBackupPolicy {
        pub schedule: Schedule,
        pub retention: Retention,
    }
}

attr_model! {
    pub struct CdpBackupPolicy {
        pub retention: CdpRetention,
    }
}

attr_model! {
    /// CDP retention, measured in minutes or hours
    pub struct CdpRetention {
        pub unit: String,
        pub duration: i64,
        pub data_lock_config: Option<DataLockConfig>,
    }
}

attr_model! {
    pub struct StorageArraySnapshotBackupPolicy {
        pub schedule: Schedule,
        pub retention: Retention,
    }
}

attr_model! {
    pub struct TimeOfDay {
        pub hour: i64,
        pub minute: i64,
        pub time_zone: Option<String>,
    }
}

attr_model! {
    /// A time window during which no new runs start
    pub struct BlackoutWindow {
        pub day: String,
        pub start_time: TimeOfDay,
        pub end_time: TimeOfDay,
        pub config_id: Option<String>,
    }
}

attr_model! {
    pub struct ExtendedRetentionPolicy {
        pub schedule: TargetSchedule,
        pub retention: Retention,
        pub run_type: Option<String>,
        pub config_id: Option<String>,
    }
}

attr_model! {
    pub struct TargetsConfiguration {
        pub replication_targets: Option<Vec<ReplicationTargetConfiguration>>,
        pub archival_targets: Option<Vec<ArchivalTargetConfiguration>>,
        pub cloud_spin_targets: Option<Vec<CloudSpinTargetConfiguration>>,
        pub onprem_deploy_targets: Option<Vec<OnpremDeployTargetConfiguration>>,
        pub rpaas_targets: Option<Vec<RpaasTargetConfiguration>>,
    }
}

attr_model! {
    pub struct LogRetention {
        pub unit: String,
        pub duration: i64,
        pub data_lock_config: Option<DataLockConfig>,
    }
}

attr_model! {
    pub struct RemoteTargetConfig {
        pub cluster_id: i64,
        pub cluster_name: Option<String>,
    }
}

attr_model! {
    pub struct ReplicationTargetConfiguration {
        pub schedule: TargetSchedule,
        pub retention: Retention,
        pub copy_on_run_success: Option<bool>,
        pub config_id: Option<String>,
        pub backup_run_type: Option<String>,
        pub run_timeouts: Option<Vec<RunTimeout>>,
        pub log_retention: Option<LogRetention>,
        /// RemoteCluster or AWS
        pub target_type: String,
        pub remote_target_config: Option<RemoteTargetConfig>,
    }
}

attr_model! {
    pub struct ArchivalTargetConfiguration {
        pub schedule: TargetSchedule,
        pub retention: Retention,
        pub copy_on_run_success: Option<bool>,
        pub config_id: Option<String>,
        pub backup_run_type: Option<String>,
        pub run_timeouts: Option<Vec<RunTimeout>>,
        pub log_retention: Option<LogRetention>,
        pub target_id: i64,
        pub target_name: Option<String>,
        pub target_type: Option<String>,
        pub tier_settings: Option<TierSettings>,
        pub extended_retention: Option<Vec<ExtendedRetentionPolicy>>,
    }
}

attr_model! {
    pub struct CloudSpinTarget {
        pub id: Option<i64>,
        pub name: Option<String>,
    }
}

attr_model! {
    pub struct CloudSpinTargetConfiguration {
        pub schedule: TargetSchedule,
        pub retention: Retention,
        pub copy_on_run_success: Option<bool>,
        pub config_id: Option<String>,
        pub backup_run_type: Option<String>,
        pub run_timeouts: Option<Vec<RunTimeout>>,
        pub log_retention: Option<LogRetention>,
        pub target: Option<CloudSpinTarget>,
    }
}

attr_model! {
    pub struct RestoreVMwareParams {
        pub target_vm_folder_id: Option<i64>,
        pub target_data_store_id: Option<i64>,
        pub enable_copy_recovery: Option<bool>,
        pub resource_pool_id: Option<i64>,
        pub datastore_ids: Option<Vec<i64>>,
        pub overwrite_existing_vm: Option<bool>,
        pub power_off_and_rename_existing_vm: Option<bool>,
        pub attempt_differential_restore: Option<bool>,
        pub is_on_prem_deploy: Option<bool>,
    }
}

attr_model! {
    pub struct OnpremDeployParams {
        pub id: Option<i64>,
        pub restore_v_mware_params: Option<RestoreVMwareParams>,
    }
}

attr_model! {
    pub struct OnpremDeployTargetConfiguration {
        pub schedule: TargetSchedule,
        pub retention: Retention,
        pub copy_on_run_success: Option<bool>,
        pub config_id: Option<String>,
        pub backup_run_type: Option<String>,
        pub run_timeouts: Option<Vec<RunTimeout>>,
        pub log_retention: Option<LogRetention>,
        pub params: Option<OnpremDeployParams>,
    }
}

attr_model! {
    pub struct RpaasTargetConfiguration {
        pub schedule: TargetSchedule,
        pub retention: Retention,
        pub copy_on_run_success: Option<bool>,
        pub config_id: Option<String>,
        pub backup_run_type: Option<String>,
        pub run_timeouts: Option<Vec<RunTimeout>>,
        pub log_retention: Option<LogRetention>,
        pub target_id: i64,
        pub target_name: Option<String>,
        /// Tagged or StorageClass
        pub target_type: Option<String>,
    }
}

attr_model! {
    /// A chained hop: the replica cluster copies on to further targets
    pub struct CascadedTargetConfiguration {
        pub source_cluster_id: i64,
        pub remote_targets: TargetsConfiguration,
    }
}

attr_model! {
    pub struct RetryOptions {
        pub retries: Option<i64>,
        pub retry_interval_mins: Option<i64>,
    }
}

/// Page of policies returned by the list endpoint
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionPoliciesResponse {
    #[serde(default)]
    pub policies: Vec<ProtectionPolicy>,
}
