//! Typed request and response models of the Backup & Recovery API

pub mod common;
pub mod policy;
pub mod query;
pub mod run;

pub use common::{
    DataLockConfig, DataLockConstraints, Frequency, Granularity, Retention, RunTimeout, Schedule,
    TargetSchedule, TierSettings,
};
pub use policy::{BackupPolicy, ProtectionPoliciesResponse, ProtectionPolicy};
pub use query::{PoliciesQuery, RunsQuery};
pub use run::{ProtectionGroupRun, ProtectionGroupRunsResponse};
