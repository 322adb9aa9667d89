//! Attrs - Mapping between attribute maps and typed API models
//!
//! User configuration and stored state are nested attribute maps
//! (`HashMap<String, Value>`). Request and response bodies are typed structs.
//! This module converts between the two by walking the struct and copying
//! each field that is present:
//!
//! - optional fields are `Option<T>` and are only written when `Some`
//! - optional blocks are nested `Value::Map`s, absent when `None`
//! - required fields must be present when reading a map
//!
//! Models are declared with [`attr_model!`](crate::attr_model), which derives
//! the camelCase serde representation used on the wire together with the
//! snake_case attribute representation used everywhere else.

use std::collections::HashMap;

use crate::resource::Value;
use crate::schema::{AttributeType, BlockSchema};

/// Nested attribute map
pub type Attributes = HashMap<String, Value>;

/// Error raised when an attribute map does not have the expected shape
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MappingError {
    #[error("Required attribute '{path}' is missing")]
    MissingRequired { path: String },

    #[error("Attribute '{path}': expected {expected}, got {got}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        got: &'static str,
    },
}

impl MappingError {
    /// Dotted path of the offending attribute
    pub fn path(&self) -> &str {
        match self {
            MappingError::MissingRequired { path } | MappingError::TypeMismatch { path, .. } => {
                path
            }
        }
    }
}

/// Join a parent path and a key with a dot
pub fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn mismatch(path: &str, expected: &'static str, got: &Value) -> MappingError {
    MappingError::TypeMismatch {
        path: path.to_string(),
        expected,
        got: got.type_name(),
    }
}

/// A type that has a single-value attribute representation
pub trait AttrValue: Sized {
    fn to_value(&self) -> Value;
    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError>;
}

/// A type that maps to a whole attribute map (a block)
pub trait AttrBlock: Sized {
    /// Schema of the block, derived from the model's fields
    fn block_schema() -> BlockSchema;

    fn to_attrs(&self) -> Attributes;

    fn from_attrs_at(attrs: &Attributes, path: &str) -> Result<Self, MappingError>;

    fn from_attrs(attrs: &Attributes) -> Result<Self, MappingError> {
        Self::from_attrs_at(attrs, "")
    }
}

/// A struct field: knows whether it must be present and how to be copied
pub trait AttrField: Sized {
    /// True when the field carries no value and must be left out
    fn is_absent(&self) -> bool {
        false
    }

    fn write_attr(&self, key: &str, attrs: &mut Attributes);

    fn read_attr(attrs: &Attributes, key: &str, parent: &str) -> Result<Self, MappingError>;
}

/// A type with a known attribute schema
pub trait AttrSchema {
    fn attr_type() -> AttributeType;

    fn required() -> bool {
        true
    }
}

/// Read a field that must be present
pub fn read_required<T: AttrValue>(
    attrs: &Attributes,
    key: &str,
    parent: &str,
) -> Result<T, MappingError> {
    let path = join_path(parent, key);
    match attrs.get(key) {
        Some(value) => T::from_value(value, &path),
        None => Err(MappingError::MissingRequired { path }),
    }
}

/// Read a field that may be absent.
///
/// An empty string counts as absent.
pub fn read_optional<T: AttrValue>(
    attrs: &Attributes,
    key: &str,
    parent: &str,
) -> Result<Option<T>, MappingError> {
    match attrs.get(key) {
        None => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(value) => T::from_value(value, &join_path(parent, key)).map(Some),
    }
}

// =============================================================================
// Scalar and collection implementations
// =============================================================================

impl AttrValue for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(mismatch(path, "String", other)),
        }
    }
}

impl AttrValue for i64 {
    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        match value {
            Value::Int(n) => Ok(*n),
            other => Err(mismatch(path, "Int", other)),
        }
    }
}

impl AttrValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(n) => Ok(*n as f64),
            other => Err(mismatch(path, "Float", other)),
        }
    }
}

impl AttrValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch(path, "Bool", other)),
        }
    }
}

impl<T: AttrValue> AttrValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(AttrValue::to_value).collect())
    }

    fn from_value(value: &Value, path: &str) -> Result<Self, MappingError> {
        match value {
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| T::from_value(item, &format!("{}[{}]", path, i)))
                .collect(),
            other => Err(mismatch(path, "List", other)),
        }
    }
}

impl AttrSchema for String {
    fn attr_type() -> AttributeType {
        AttributeType::String
    }
}

impl AttrSchema for i64 {
    fn attr_type() -> AttributeType {
        AttributeType::Int
    }
}

impl AttrSchema for f64 {
    fn attr_type() -> AttributeType {
        AttributeType::Float
    }
}

impl AttrSchema for bool {
    fn attr_type() -> AttributeType {
        AttributeType::Bool
    }
}

impl<T: AttrSchema> AttrSchema for Vec<T> {
    fn attr_type() -> AttributeType {
        AttributeType::List(Box::new(T::attr_type()))
    }
}

impl<T: AttrSchema> AttrSchema for Option<T> {
    fn attr_type() -> AttributeType {
        T::attr_type()
    }

    fn required() -> bool {
        false
    }
}

macro_rules! required_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl AttrField for $ty {
                fn write_attr(&self, key: &str, attrs: &mut Attributes) {
                    attrs.insert(key.to_string(), self.to_value());
                }

                fn read_attr(
                    attrs: &Attributes,
                    key: &str,
                    parent: &str,
                ) -> Result<Self, MappingError> {
                    read_required(attrs, key, parent)
                }
            }
        )*
    };
}

required_field!(String, i64, f64, bool);

impl<T: AttrValue> AttrField for Vec<T> {
    fn write_attr(&self, key: &str, attrs: &mut Attributes) {
        attrs.insert(key.to_string(), self.to_value());
    }

    fn read_attr(attrs: &Attributes, key: &str, parent: &str) -> Result<Self, MappingError> {
        read_required(attrs, key, parent)
    }
}

impl<T: AttrValue> AttrField for Option<T> {
    fn is_absent(&self) -> bool {
        self.is_none()
    }

    fn write_attr(&self, key: &str, attrs: &mut Attributes) {
        if let Some(value) = self {
            attrs.insert(key.to_string(), value.to_value());
        }
    }

    fn read_attr(attrs: &Attributes, key: &str, parent: &str) -> Result<Self, MappingError> {
        read_optional(attrs, key, parent)
    }
}

/// Read a block value (used by [`attr_model!`](crate::attr_model))
pub fn block_from_value<T: AttrBlock>(value: &Value, path: &str) -> Result<T, MappingError> {
    match value {
        Value::Map(map) => T::from_attrs_at(map, path),
        other => Err(mismatch(path, "Block", other)),
    }
}

/// Declare an API model.
///
/// Generates the struct with serde derives (camelCase wire names, absent
/// optional fields skipped) and the [`AttrBlock`], [`AttrValue`],
/// [`AttrSchema`] and [`AttrField`] implementations that map it to a
/// snake_case attribute map.
/// Field attributes such as `#[serde(rename = "isCBSEnabled")]` pass through.
#[macro_export]
macro_rules! attr_model {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                pub $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            $(
                $(#[$fmeta])*
                #[serde(default, skip_serializing_if = "baas_core::attrs::AttrField::is_absent")]
                pub $field: $ty,
            )*
        }

        impl $crate::attrs::AttrBlock for $name {
            fn block_schema() -> $crate::schema::BlockSchema {
                $crate::schema::BlockSchema::new()
                    $(
                        .attribute($crate::schema::AttributeSchema::from_field::<$ty>(stringify!($field)))
                    )*
            }

            fn to_attrs(&self) -> $crate::attrs::Attributes {
                #[allow(unused_mut)]
                let mut attrs = $crate::attrs::Attributes::new();
                $(
                    $crate::attrs::AttrField::write_attr(&self.$field, stringify!($field), &mut attrs);
                )*
                attrs
            }

            #[allow(unused_variables)]
            fn from_attrs_at(
                attrs: &$crate::attrs::Attributes,
                path: &str,
            ) -> Result<Self, $crate::attrs::MappingError> {
                Ok(Self {
                    $(
                        $field: $crate::attrs::AttrField::read_attr(attrs, stringify!($field), path)?,
                    )*
                })
            }
        }

        impl $crate::attrs::AttrValue for $name {
            fn to_value(&self) -> $crate::resource::Value {
                $crate::resource::Value::Map($crate::attrs::AttrBlock::to_attrs(self))
            }

            fn from_value(
                value: &$crate::resource::Value,
                path: &str,
            ) -> Result<Self, $crate::attrs::MappingError> {
                $crate::attrs::block_from_value(value, path)
            }
        }

        impl $crate::attrs::AttrSchema for $name {
            fn attr_type() -> $crate::schema::AttributeType {
                $crate::schema::AttributeType::Block(
                    <$name as $crate::attrs::AttrBlock>::block_schema(),
                )
            }
        }

        impl $crate::attrs::AttrField for $name {
            fn write_attr(&self, key: &str, attrs: &mut $crate::attrs::Attributes) {
                attrs.insert(key.to_string(), $crate::attrs::AttrValue::to_value(self));
            }

            fn read_attr(
                attrs: &$crate::attrs::Attributes,
                key: &str,
                parent: &str,
            ) -> Result<Self, $crate::attrs::MappingError> {
                $crate::attrs::read_required(attrs, key, parent)
            }
        }
    };
}
