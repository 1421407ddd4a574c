//! Stored-model descriptions
//!
//! A [`Model`] lists the stored fields of a record type. A serializer class
//! can generate its fields from a model (see
//! [`SerializerClassBuilder::model`](crate::serializers::SerializerClassBuilder::model)),
//! with explicitly declared fields taking precedence.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::fields::{BooleanField, CharField, Field, IntegerField};

/// Kind of a stored field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelField {
    /// Text column with a maximum length
    Char {
        /// Maximum number of characters
        max_length: usize,
    },
    /// Integer column
    Integer,
    /// Boolean column
    Boolean,
    /// Reference to another record, stored as its key in `<name>_id`
    ForeignKey {
        /// Referenced model (`self` for the same model)
        to: String,
        /// Whether the reference may be empty
        #[serde(default)]
        null: bool,
    },
}

/// A stored record type
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Model {
    name: String,
    #[serde(default)]
    fields: IndexMap<String, ModelField>,
}

impl Model {
    /// Create a model with no fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a stored field
    pub fn field(mut self, name: impl Into<String>, field: ModelField) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored field by name
    pub fn get(&self, name: &str) -> Option<&ModelField> {
        self.fields.get(name)
    }

    /// Build the serializer field for a stored field
    pub fn build_field(&self, name: &str) -> Result<Box<dyn Field>> {
        let field: Box<dyn Field> = match self.get(name) {
            Some(ModelField::Char { max_length }) => {
                Box::new(CharField::new().with_max_length(*max_length))
            }
            Some(ModelField::Integer) => Box::new(IntegerField::new()),
            Some(ModelField::Boolean) => Box::new(BooleanField::new().with_required(false)),
            Some(ModelField::ForeignKey { null, .. }) => {
                let key = IntegerField::new().with_source(format!("{}_id", name));
                if *null {
                    Box::new(key.with_allow_null(true).with_required(false))
                } else {
                    Box::new(key)
                }
            }
            None => {
                return Err(Error::Declaration(format!(
                    "model {} has no field '{}'",
                    self.name, name
                )))
            }
        };
        Ok(field)
    }
}
