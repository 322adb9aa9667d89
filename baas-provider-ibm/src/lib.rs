//! Baas IBM Cloud Backup & Recovery Provider
//!
//! ## Module Structure
//!
//! - `client` - REST client of the Backup & Recovery API
//! - `models` - Typed request and response documents
//! - `schemas` - Attribute schemas and local validation
//! - `resources` - Resource and data source type definitions
//! - `provider` - IbmBackupProvider implementation
//! - `warnings` - Advisory checks on policy documents

pub mod client;
pub mod models;
pub mod provider;
pub mod resources;
pub mod schemas;
pub mod warnings;

// Re-export main types
pub use client::{Auth, BackupRecoveryClient, ClientConfig, ClientError, DEFAULT_IAM_URL};
pub use provider::{IbmBackupProvider, policy_from_attributes};
pub use warnings::policy_warnings;

use baas_core::provider::{BoxFuture, Provider, ProviderError, ProviderResult, ResourceType};
use baas_core::resource::{Resource, ResourceId, State};

fn unknown_resource_type(id: &ResourceId) -> ProviderError {
    ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
        .for_resource(id.clone())
}

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for IbmBackupProvider {
    fn name(&self) -> &'static str {
        "ibm"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resources::resource_types()
    }

    fn data_source_types(&self) -> Vec<Box<dyn ResourceType>> {
        resources::data_source_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move {
            match id.resource_type.as_str() {
                schemas::PROTECTION_POLICY => self.read_policy(&id, identifier.as_deref()).await,
                _ => Err(unknown_resource_type(&id)),
            }
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            match resource.id.resource_type.as_str() {
                schemas::PROTECTION_POLICY => self.create_policy(&resource).await,
                _ => Err(unknown_resource_type(&resource.id)),
            }
        })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let to = to.clone();
        Box::pin(async move {
            match id.resource_type.as_str() {
                schemas::PROTECTION_POLICY => self.update_policy(&id, &identifier, &to).await,
                _ => Err(unknown_resource_type(&id)),
            }
        })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            match id.resource_type.as_str() {
                schemas::PROTECTION_POLICY => self.delete_policy(&id, &identifier).await,
                _ => Err(unknown_resource_type(&id)),
            }
        })
    }

    fn read_data_source(&self, query: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let query = query.clone();
        Box::pin(async move {
            match query.id.resource_type.as_str() {
                schemas::PROTECTION_GROUP_RUNS => self.read_runs(&query).await,
                schemas::PROTECTION_POLICIES => self.read_policies(&query).await,
                _ => Err(ProviderError::new(format!(
                    "Unknown data source: {}",
                    query.id.resource_type
                ))
                .for_resource(query.id.clone())),
            }
        })
    }
}
