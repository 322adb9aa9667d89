//! State file structures recording which server object backs each name

use std::collections::HashMap;

use baas_core::resource::{
    ResourceId, State, Value, attributes_to_json_object, json_object_to_attributes,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The state file persisted by a backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// State file format version
    pub version: u32,
    /// Monotonically increasing number for each state modification
    pub serial: u64,
    /// Unique identifier for this state lineage
    pub lineage: String,
    /// Version of baas that last modified this state
    pub baas_version: String,
    /// Resources known to exist on the server
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    /// Current state file format version
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            baas_version: env!("CARGO_PKG_VERSION").to_string(),
            resources: Vec::new(),
        }
    }

    /// Increment serial and stamp the current version before a write
    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.baas_version = env!("CARGO_PKG_VERSION").to_string();
    }

    pub fn find_resource(&self, id: &ResourceId) -> Option<&ResourceState> {
        self.resources
            .iter()
            .find(|r| r.resource_type == id.resource_type && r.name == id.name)
    }

    /// Server identifier stored for `id`, if any
    pub fn identifier_of(&self, id: &ResourceId) -> Option<&str> {
        self.find_resource(id)
            .and_then(|r| r.identifier.as_deref())
    }

    /// Add or replace the entry with the same type and name
    pub fn upsert_resource(&mut self, resource: ResourceState) {
        match self
            .resources
            .iter_mut()
            .find(|r| r.resource_type == resource.resource_type && r.name == resource.name)
        {
            Some(existing) => *existing = resource,
            None => self.resources.push(resource),
        }
    }

    pub fn remove_resource(&mut self, id: &ResourceId) -> Option<ResourceState> {
        let pos = self
            .resources
            .iter()
            .position(|r| r.resource_type == id.resource_type && r.name == id.name)?;
        Some(self.resources.remove(pos))
    }

    /// Record the outcome of a read, create or update.
    ///
    /// A state that no longer exists drops the entry, so the stored
    /// identifier is cleared. Returns whether the state file changed.
    pub fn apply_read(&mut self, provider: &str, state: &State) -> bool {
        if state.exists {
            let mut entry = ResourceState::from_state(provider, state);
            if let Some(existing) = self.find_resource(&state.id)
                && existing.identifier == entry.identifier
                && existing.attributes == entry.attributes
            {
                return false;
            }
            entry.read_at = Some(Utc::now());
            self.upsert_resource(entry);
            true
        } else {
            self.remove_resource(&state.id).is_some()
        }
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Stored state of a single resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource type (e.g., "protection_policy")
    pub resource_type: String,
    /// Name chosen by the user
    pub name: String,
    /// Provider name (e.g., "ibm")
    pub provider: String,
    /// Server-side identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Attributes as last read from the server
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// When the attributes were read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

impl ResourceState {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            provider: provider.into(),
            identifier: None,
            attributes: serde_json::Map::new(),
            read_at: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Snapshot an existing provider state
    pub fn from_state(provider: &str, state: &State) -> Self {
        Self {
            resource_type: state.id.resource_type.clone(),
            name: state.id.name.clone(),
            provider: provider.to_string(),
            identifier: state.identifier.clone(),
            attributes: attributes_to_json_object(&state.attributes),
            read_at: None,
        }
    }

    pub fn id(&self) -> ResourceId {
        ResourceId::new(&self.resource_type, &self.name)
    }

    /// The stored attributes as a provider state
    pub fn to_state(&self) -> State {
        let attributes: HashMap<String, Value> = json_object_to_attributes(&self.attributes);
        let state = State::existing(self.id(), attributes);
        match &self.identifier {
            Some(identifier) => state.with_identifier(identifier),
            None => state,
        }
    }
}
