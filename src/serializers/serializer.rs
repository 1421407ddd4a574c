//! Composite schema instances

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use super::SerializerClass;
use crate::error::{Error, ErrorDetail, Result};
use crate::fields::{
    base_builders, json_type, set_value, Data, EmptyCheck, Extracted, Field, FieldBase, NodeId,
    Parent, BASE_OPTIONS,
};
use crate::limits::Limits;
use crate::options::Options;
use crate::registry::Registry;

/// An instance of a [`SerializerClass`]
///
/// Construction copies every prototype field of the class and binds the
/// copies to this instance. At the root, [`validate`](Self::validate) and
/// [`serialize`](Self::serialize) process whole documents; nested inside
/// another composite the instance acts as an ordinary field.
#[derive(Debug)]
pub struct Serializer {
    class: Arc<SerializerClass>,
    base: FieldBase,
    fields: IndexMap<String, Box<dyn Field>>,
    handle: Parent,
    limits: Limits,
}

impl Serializer {
    /// Options accepted by a single instance
    pub const OPTIONS: &'static [&'static str] = &["many"];

    /// Create an instance with default options
    pub fn new(class: Arc<SerializerClass>) -> Self {
        Self::assemble(class, FieldBase::new(), Limits::default())
    }

    /// Create an instance from keyword options
    pub fn from_options(class: Arc<SerializerClass>, options: &Options) -> Result<Self> {
        options.ensure_only(&[BASE_OPTIONS, Self::OPTIONS].concat(), class.name())?;
        let base = FieldBase::from_options(options)?;
        Ok(Self::assemble(class, base, Limits::default()))
    }

    fn assemble(class: Arc<SerializerClass>, base: FieldBase, limits: Limits) -> Self {
        let handle = Parent::composite(base.id(), class.clone());
        let fields = class
            .fields()
            .map(|(name, prototype)| {
                let mut field = prototype.boxed_clone();
                field.bind(name, &handle);
                (name.to_string(), field)
            })
            .collect();
        Self {
            class,
            base,
            fields,
            handle,
            limits,
        }
    }

    base_builders!();

    /// Make a registry available for resolving references below this instance
    pub fn with_registry(self, registry: Arc<Registry>) -> Self {
        self.handle.set_registry(registry);
        self
    }

    /// Set the limits applied by [`validate`](Self::validate) and
    /// [`serialize`](Self::serialize)
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// The class this instance was built from
    pub fn class(&self) -> &Arc<SerializerClass> {
        &self.class
    }

    /// Handle the fields are bound to
    pub fn as_parent(&self) -> &Parent {
        &self.handle
    }

    /// Bound fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &dyn Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field.as_ref()))
    }

    /// Bound field by name
    pub fn field(&self, name: &str) -> Option<&dyn Field> {
        self.fields.get(name).map(|field| field.as_ref())
    }

    /// Validate a whole input document
    pub fn validate(&self, data: &Value) -> Result<Value> {
        self.limits.check_value(data)?;
        tracing::debug!(serializer = %self.class.qualified_name(), "validating document");
        self.run_validation(Extracted::Present(data.clone()))
            .map(|value| value.unwrap_or(Value::Null))
    }

    /// Whether `data` validates; errors other than validation failures
    /// propagate
    pub fn is_valid(&self, data: &Value) -> Result<bool> {
        match self.validate(data) {
            Ok(_) => Ok(true),
            Err(Error::Validation(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }

    /// Produce the output representation of a source object
    pub fn serialize(&self, instance: &Value) -> Result<Value> {
        self.limits.check_value(instance)?;
        tracing::debug!(serializer = %self.class.qualified_name(), "serializing instance");
        self.to_representation(instance)
    }

    pub(crate) fn unbound_copy(&self) -> Self {
        Self::assemble(self.class.clone(), self.base.clone(), self.limits.clone())
    }

    fn to_internal_value(&self, value: Value) -> Result<Value> {
        let data = match value {
            Value::Object(data) => data,
            other => {
                return Err(Error::invalid(format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    json_type(&other)
                )))
            }
        };

        let mut validated = Data::new();
        let mut errors = IndexMap::new();
        for (name, field) in &self.fields {
            if field.read_only()? && field.default_value()?.is_none() {
                continue;
            }
            let primitive = field.get_value(&data)?;
            match field.run_validation(primitive) {
                Ok(Some(value)) => set_value(&mut validated, field.source_attrs()?, value),
                Ok(None) => {}
                Err(Error::Validation(detail)) => {
                    errors.insert(name.clone(), detail);
                }
                Err(other) => return Err(other),
            }
        }
        if !errors.is_empty() {
            return Err(Error::Validation(ErrorDetail::Fields(errors)));
        }
        Ok(Value::Object(validated))
    }
}

impl Field for Serializer {
    fn base(&self) -> Result<&FieldBase> {
        Ok(&self.base)
    }

    fn node_id(&self) -> NodeId {
        self.base.id()
    }

    fn bind(&mut self, field_name: &str, parent: &Parent) {
        self.base.bind(field_name);
        self.handle.attach(field_name, parent);
    }

    fn get_value(&self, data: &Data) -> Result<Extracted> {
        Ok(self.base.get_value(data))
    }

    /// A root instance lists the initial values of its writable fields; a
    /// nested one has no initial value of its own.
    fn get_initial(&self) -> Result<Value> {
        if let Some(initial) = self.base.initial() {
            return Ok(initial.clone());
        }
        if self.handle.attachment().is_some() {
            return Ok(Value::Null);
        }
        let mut initial = Data::new();
        for (name, field) in &self.fields {
            if !field.read_only()? {
                initial.insert(name.clone(), field.get_initial()?);
            }
        }
        Ok(Value::Object(initial))
    }

    fn run_validation(&self, data: Extracted) -> Result<Option<Value>> {
        match self.base.validate_empty_values(data)? {
            EmptyCheck::Done(value) => Ok(value),
            EmptyCheck::Proceed(value) => self.to_internal_value(value).map(Some),
        }
    }

    fn get_attribute(&self, instance: &Value) -> Result<Option<Value>> {
        self.base.get_attribute(instance)
    }

    fn to_representation(&self, instance: &Value) -> Result<Value> {
        let mut output = Data::new();
        for (name, field) in &self.fields {
            if field.write_only()? {
                continue;
            }
            match field.get_attribute(instance)? {
                None => {}
                Some(Value::Null) => {
                    output.insert(name.clone(), Value::Null);
                }
                Some(attribute) => {
                    output.insert(name.clone(), field.to_representation(&attribute)?);
                }
            }
        }
        Ok(Value::Object(output))
    }

    fn boxed_clone(&self) -> Box<dyn Field> {
        Box::new(self.unbound_copy())
    }

    fn type_name(&self) -> &'static str {
        "Serializer"
    }
}
