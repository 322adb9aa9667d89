//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type so that user
//! configuration can be validated before any API call is made.

use std::collections::HashMap;
use std::fmt;

use crate::attrs::join_path;
use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Floating point number
    Float,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Nested block with its own attributes
    Block(BlockSchema),
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Float, Value::Float(_) | Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Block(block), Value::Map(map)) => {
                let mut errors = Vec::new();
                block.collect_errors(map, "", &mut errors);
                match errors.into_iter().next() {
                    Some(e) => Err(e),
                    None => Ok(()),
                }
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name().to_string(),
            }),
        }
    }

    /// Validate `value` at `path`, recording every error instead of the first
    fn collect_errors(&self, value: &Value, path: &str, errors: &mut Vec<TypeError>) {
        match (self, value) {
            (AttributeType::Block(block), Value::Map(map)) => {
                block.collect_errors(map, path, errors);
            }
            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.collect_errors(item, &format!("{}[{}]", path, i), errors);
                }
            }
            _ => {
                if let Err(e) = self.validate(value) {
                    errors.push(TypeError::AtPath {
                        path: path.to_string(),
                        inner: Box::new(e),
                    });
                }
            }
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Float => "Float".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Block(_) => "Block".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("{path}: {inner}")]
    AtPath { path: String, inner: Box<TypeError> },
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
        }
    }

    /// Schema for a model field of type `T`.
    ///
    /// `Option<T>` fields are optional; everything else is required.
    pub fn from_field<T: crate::attrs::AttrSchema>(name: impl Into<String>) -> Self {
        let mut schema = Self::new(name, T::attr_type());
        schema.required = T::required();
        schema
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Attributes of a nested block
#[derive(Debug, Clone, Default)]
pub struct BlockSchema {
    pub attributes: HashMap<String, AttributeSchema>,
}

impl BlockSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    /// Find the schema of a nested attribute by dotted path.
    ///
    /// Lists of blocks are traversed transparently, so
    /// `remote_target_policy.archival_targets.retention` addresses the
    /// retention of every archival target.
    pub fn find_mut(&mut self, path: &str) -> Option<&mut AttributeSchema> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let attr = self.attributes.get_mut(head)?;
        match rest {
            None => Some(attr),
            Some(rest) => attr.attr_type.block_mut()?.find_mut(rest),
        }
    }

    fn collect_errors(
        &self,
        attributes: &HashMap<String, Value>,
        parent: &str,
        errors: &mut Vec<TypeError>,
    ) {
        for (name, schema) in &self.attributes {
            if schema.required && !attributes.contains_key(name) {
                errors.push(TypeError::MissingRequired {
                    name: join_path(parent, name),
                });
            }
        }

        for (name, value) in attributes {
            let path = join_path(parent, name);
            match self.attributes.get(name) {
                Some(schema) => schema.attr_type.collect_errors(value, &path, errors),
                None => errors.push(TypeError::UnknownAttribute { name: path }),
            }
        }
    }
}

impl AttributeType {
    /// The block schema behind a block or a list of blocks
    fn block_mut(&mut self) -> Option<&mut BlockSchema> {
        match self {
            AttributeType::Block(block) => Some(block),
            AttributeType::List(inner) => inner.block_mut(),
            _ => None,
        }
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    /// Build a resource schema from the block schema of a model
    pub fn from_block(resource_type: impl Into<String>, block: BlockSchema) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: block.attributes,
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Replace the type of a (possibly nested) attribute.
    ///
    /// Unknown paths are left untouched.
    pub fn with_attribute_type(mut self, path: &str, attr_type: AttributeType) -> Self {
        if let Some(attr) = self.find_mut(path) {
            attr.attr_type = attr_type;
        }
        self
    }

    /// Find the schema of a nested attribute by dotted path
    pub fn find_mut(&mut self, path: &str) -> Option<&mut AttributeSchema> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let attr = self.attributes.get_mut(head)?;
        match rest {
            None => Some(attr),
            Some(rest) => attr.attr_type.block_mut()?.find_mut(rest),
        }
    }

    /// Validate resource attributes, including nested blocks
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let block = BlockSchema {
            attributes: self.attributes.clone(),
        };
        let mut errors = Vec::new();
        block.collect_errors(attributes, "", &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            errors.sort_by_key(|e| e.to_string());
            Err(errors)
        }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| {
                if let Value::Int(n) = value {
                    if *n > 0 {
                        Ok(())
                    } else {
                        Err("Value must be positive".to_string())
                    }
                } else {
                    Err("Expected integer".to_string())
                }
            },
        }
    }

    /// Enum type from a static list of variants
    pub fn one_of(variants: &[&str]) -> AttributeType {
        AttributeType::Enum(variants.iter().map(|v| v.to_string()).collect())
    }
}
