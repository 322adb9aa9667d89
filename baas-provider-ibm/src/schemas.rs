//! Attribute schemas of the IBM Backup & Recovery resource types
//!
//! The schemas are derived from the models, then tightened where the API
//! only accepts a fixed set of values.

use baas_core::attrs::AttrBlock;
use baas_core::schema::{AttributeType, BlockSchema, ResourceSchema, types};

use crate::models::{PoliciesQuery, ProtectionPolicy, RunsQuery};

pub const PROTECTION_POLICY: &str = "protection_policy";
pub const PROTECTION_GROUP_RUNS: &str = "protection_group_runs";
pub const PROTECTION_POLICIES: &str = "protection_policies";

/// Accepted values of `data_lock` and of every `data_lock_config.mode`
pub const DATA_LOCK_MODES: &[&str] = &["Administrative", "Compliance"];

pub fn protection_policy() -> ResourceSchema {
    let mut block = ProtectionPolicy::block_schema();
    restrict_data_lock_modes(&mut block);

    ResourceSchema::from_block(PROTECTION_POLICY, block)
        .with_description("Backup & Recovery protection policy")
        .with_attribute_type("data_lock", types::one_of(DATA_LOCK_MODES))
}

pub fn protection_group_runs() -> ResourceSchema {
    ResourceSchema::from_block(PROTECTION_GROUP_RUNS, RunsQuery::block_schema())
        .with_description("Runs of a protection group")
        .with_attribute_type("num_runs", types::positive_int())
}

pub fn protection_policies() -> ResourceSchema {
    ResourceSchema::from_block(PROTECTION_POLICIES, PoliciesQuery::block_schema())
        .with_description("Protection policies visible to the tenant")
}

/// Restrict `mode` of every `data_lock_config` block, at any depth
fn restrict_data_lock_modes(block: &mut BlockSchema) {
    for (name, attr) in block.attributes.iter_mut() {
        let Some(inner) = nested_block(&mut attr.attr_type) else {
            continue;
        };
        if name == "data_lock_config"
            && let Some(mode) = inner.attributes.get_mut("mode")
        {
            mode.attr_type = types::one_of(DATA_LOCK_MODES);
        }
        restrict_data_lock_modes(inner);
    }
}

fn nested_block(attr_type: &mut AttributeType) -> Option<&mut BlockSchema> {
    match attr_type {
        AttributeType::Block(block) => Some(block),
        AttributeType::List(inner) => nested_block(inner),
        _ => None,
    }
}
