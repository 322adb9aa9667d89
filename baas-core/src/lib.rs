//! baas Core
//!
//! Resource model, attribute schemas and the mapping layer shared by the
//! Backup & Recovery provider and the `baas` command line tool.

// Lets `attr_model!` name this crate by path from inside its own tests.
extern crate self as baas_core;

pub mod attrs;
pub mod differ;
pub mod provider;
pub mod resource;
pub mod schema;
