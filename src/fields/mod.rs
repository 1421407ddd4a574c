//! Schema fields
//!
//! A schema tree is made of fields. Composite schemas (see
//! [`crate::serializers`]) hold named child fields, repeating elements
//! ([`ListField`]) hold one child, and the [`RecursiveField`] placeholder
//! stands in for a schema that is only looked up the first time it is used.
//!
//! Every node implements [`Field`], the contract the composites rely on.

mod base;
mod binding;
mod list;
mod recursive;
mod scalars;

pub use base::{set_value, EmptyCheck, FieldBase, BASE_OPTIONS};
pub use binding::{Attachment, NodeId, Parent, ParentKind};
pub use list::{LengthBounds, ListField};
pub use recursive::RecursiveField;
pub use scalars::{BooleanField, CharField, IntegerField};

pub(crate) use base::base_builders;
pub(crate) use list::{represent_items, validate_items};

use std::fmt;

use serde_json::Value;

use crate::error::Result;

/// Input data of a composite: field name to raw value
pub type Data = serde_json::Map<String, Value>;

/// A field's entry in input data
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// The input has no entry for the field
    Missing,
    /// The raw input value, possibly null
    Present(Value),
}

/// Behaviour every schema node exposes to the composite that owns it
///
/// The five behaviours (`get_value`, `get_initial`, `run_validation`,
/// `get_attribute`, `to_representation`) and the six identity accessors are
/// the surface a [`RecursiveField`] forwards to the schema it resolves to.
/// `node_id`, `bind`, `boxed_clone`, `check`, `type_name` and
/// `as_recursive` describe the node itself and are never forwarded.
pub trait Field: fmt::Debug + Send + Sync {
    /// Base options and binding state
    fn base(&self) -> Result<&FieldBase>;

    /// Identity of this node
    fn node_id(&self) -> NodeId;

    /// Record where this node sits: its name and the owning container
    fn bind(&mut self, field_name: &str, parent: &Parent);

    /// Extract this field's entry from input data
    fn get_value(&self, data: &Data) -> Result<Extracted>;

    /// Value shown for an empty form
    fn get_initial(&self) -> Result<Value>;

    /// Validate and convert an input entry; `None` leaves the field out
    fn run_validation(&self, data: Extracted) -> Result<Option<Value>>;

    /// Read this field's value off a source object; `None` leaves it out
    fn get_attribute(&self, instance: &Value) -> Result<Option<Value>>;

    /// Convert a source value to its output representation
    fn to_representation(&self, value: &Value) -> Result<Value>;

    /// A freshly constructed, unbound copy with the same options
    fn boxed_clone(&self) -> Box<dyn Field>;

    /// Check the declared options for contradictions
    fn check(&self) -> Result<()> {
        self.base()?.check()
    }

    /// Name of the concrete field type
    fn type_name(&self) -> &'static str;

    /// The node as a recursive placeholder, if it is one
    fn as_recursive(&self) -> Option<&RecursiveField> {
        None
    }

    /// Name the field is bound under
    fn field_name(&self) -> Result<Option<&str>> {
        Ok(self.base()?.field_name())
    }

    /// Source path
    fn source(&self) -> Result<Option<&str>> {
        Ok(self.base()?.source())
    }

    /// Whether the field is output only
    fn read_only(&self) -> Result<bool> {
        Ok(self.base()?.is_read_only())
    }

    /// Whether the field is input only
    fn write_only(&self) -> Result<bool> {
        Ok(self.base()?.is_write_only())
    }

    /// Default value
    fn default_value(&self) -> Result<Option<&Value>> {
        Ok(self.base()?.default_value())
    }

    /// Source path segments
    fn source_attrs(&self) -> Result<&[String]> {
        Ok(self.base()?.source_attrs())
    }
}

impl Clone for Box<dyn Field> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// Short name of a JSON value's type, used in error messages
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
