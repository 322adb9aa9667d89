//! Resource and data source types offered by the IBM provider

use baas_core::provider::ResourceType;
use baas_core::schema::ResourceSchema;

use crate::schemas;

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                ($schema)()
            }
        }
    };
}

define_resource_type!(
    ProtectionPolicyType,
    schemas::PROTECTION_POLICY,
    schemas::protection_policy
);
define_resource_type!(
    ProtectionGroupRunsType,
    schemas::PROTECTION_GROUP_RUNS,
    schemas::protection_group_runs
);
define_resource_type!(
    ProtectionPoliciesType,
    schemas::PROTECTION_POLICIES,
    schemas::protection_policies
);

/// Managed resource types
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![Box::new(ProtectionPolicyType)]
}

/// Read-only data source types
pub fn data_source_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(ProtectionGroupRunsType),
        Box::new(ProtectionPoliciesType),
    ]
}
