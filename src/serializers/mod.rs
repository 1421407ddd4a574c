//! Composite schemas
//!
//! A [`SerializerClass`] is a named composite type declared in a module, with
//! an ordered set of prototype fields. Instantiating the class yields a
//! [`Serializer`], which copies and binds every prototype; with `many: true`
//! it yields a [`ListSerializer`] repeating one such instance.

mod list;
mod serializer;

pub use list::ListSerializer;
pub use serializer::Serializer;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::fields::Field;
use crate::models::Model;
use crate::names::{is_valid_identifier, is_valid_reference, qualify};
use crate::options::Options;

/// A declared composite schema type
pub struct SerializerClass {
    name: String,
    module: String,
    fields: IndexMap<String, Box<dyn Field>>,
}

impl SerializerClass {
    /// Start declaring a class
    pub fn builder(name: impl Into<String>) -> SerializerClassBuilder {
        SerializerClassBuilder::new(name)
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module (namespace) the class is declared in
    pub fn module(&self) -> &str {
        &self.module
    }

    /// `module.Name`
    pub fn qualified_name(&self) -> String {
        qualify(&self.module, &self.name)
    }

    /// Prototype fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &dyn Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field.as_ref()))
    }

    /// Prototype field by name
    pub fn field(&self, name: &str) -> Option<&dyn Field> {
        self.fields.get(name).map(|field| field.as_ref())
    }

    /// Construct an instance from keyword options
    ///
    /// `many: true` produces a [`ListSerializer`].
    pub fn instantiate(self: &Arc<Self>, options: &Options) -> Result<Box<dyn Field>> {
        if options.get_bool("many")?.unwrap_or(false) {
            Ok(Box::new(ListSerializer::from_options(self.clone(), options)?))
        } else {
            Ok(Box::new(Serializer::from_options(self.clone(), options)?))
        }
    }
}

impl fmt::Debug for SerializerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerClass")
            .field("name", &self.qualified_name())
            .field(
                "fields",
                &self
                    .fields
                    .iter()
                    .map(|(name, field)| (name.as_str(), field.type_name()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for serializer classes
pub struct SerializerClassBuilder {
    name: String,
    module: String,
    fields: IndexMap<String, Box<dyn Field>>,
    model: Option<(Model, Vec<String>)>,
    errors: Vec<Error>,
}

impl SerializerClassBuilder {
    /// Create a builder for a class named `name` in the root module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: String::new(),
            fields: IndexMap::new(),
            model: None,
            errors: Vec::new(),
        }
    }

    /// Set the declaring module
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// Declare a field
    pub fn field(self, name: impl Into<String>, field: impl Field + 'static) -> Self {
        self.boxed_field(name, Box::new(field))
    }

    /// Declare an already boxed field
    pub fn boxed_field(mut self, name: impl Into<String>, field: Box<dyn Field>) -> Self {
        let name = name.into();
        if self.fields.insert(name.clone(), field).is_some() {
            self.errors
                .push(Error::Declaration(format!("field '{}' is declared twice", name)));
        }
        self
    }

    /// Declare a field built by a fallible constructor
    ///
    /// A construction error is reported by [`build`](Self::build).
    pub fn try_field<F: Field + 'static>(self, name: impl Into<String>, field: Result<F>) -> Self {
        match field {
            Ok(field) => self.field(name, field),
            Err(err) => {
                let mut builder = self;
                builder.errors.push(err);
                builder
            }
        }
    }

    /// Generate fields for the named model fields not declared explicitly
    ///
    /// The field list also fixes the order of the class's fields.
    pub fn model(mut self, model: &Model, fields: &[&str]) -> Self {
        self.model = Some((
            model.clone(),
            fields.iter().map(|name| name.to_string()).collect(),
        ));
        self
    }

    /// Validate the declaration and build the class
    pub fn build(self) -> Result<SerializerClass> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        if !is_valid_identifier(&self.name) {
            return Err(Error::Declaration(format!(
                "'{}' is not a valid class name",
                self.name
            )));
        }
        if !self.module.is_empty() && !is_valid_reference(&self.module) {
            return Err(Error::Declaration(format!(
                "'{}' is not a valid module path",
                self.module
            )));
        }

        let fields = match self.model {
            Some((model, names)) => merge_model_fields(&self.name, self.fields, &model, &names)?,
            None => self.fields,
        };
        for (name, field) in &fields {
            if !is_valid_identifier(name) {
                return Err(Error::Declaration(format!(
                    "'{}' is not a valid field name",
                    name
                )));
            }
            field.check().map_err(|err| {
                Error::Declaration(format!("{}.{}: {}", self.name, name, err))
            })?;
        }

        Ok(SerializerClass {
            name: self.name,
            module: self.module,
            fields,
        })
    }
}

fn merge_model_fields(
    class: &str,
    mut declared: IndexMap<String, Box<dyn Field>>,
    model: &Model,
    names: &[String],
) -> Result<IndexMap<String, Box<dyn Field>>> {
    let mut fields = IndexMap::new();
    for name in names {
        let field = match declared.shift_remove(name) {
            Some(field) => field,
            None => model.build_field(name)?,
        };
        fields.insert(name.clone(), field);
    }
    if let Some(name) = declared.keys().next() {
        return Err(Error::Declaration(format!(
            "field '{}' is declared on {} but not included in its model fields",
            name, class
        )));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{CharField, IntegerField, RecursiveField};
    use crate::models::ModelField;

    #[test]
    fn test_builder_keeps_order() {
        let class = SerializerClass::builder("PingSerializer")
            .module("app")
            .field("ping_id", IntegerField::new())
            .field("pong", RecursiveField::to("PongSerializer").with_required(false))
            .build()
            .unwrap();
        assert_eq!(class.qualified_name(), "app.PingSerializer");
        let names: Vec<_> = class.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["ping_id", "pong"]);
        assert_eq!(class.field("pong").unwrap().type_name(), "RecursiveField");
    }

    #[test]
    fn test_builder_rejects_bad_declarations() {
        let err = SerializerClass::builder("Bad Name").build().unwrap_err();
        assert!(matches!(err, Error::Declaration(_)));

        let err = SerializerClass::builder("Dup")
            .field("a", CharField::new())
            .field("a", CharField::new())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("declared twice"));

        let err = SerializerClass::builder("Opts")
            .try_field("a", CharField::from_options(&Options::new().with("bogus", 1)))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Options(_)));

        let err = SerializerClass::builder("Contradiction")
            .field("a", RecursiveField::new().with_required(true).with_option("default", 1))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Contradiction.a"));
    }

    #[test]
    fn test_model_fields_merge_with_declared() {
        let model = Model::new("RecursiveModel")
            .field("name", ModelField::Char { max_length: 255 })
            .field(
                "parent",
                ModelField::ForeignKey {
                    to: "self".to_string(),
                    null: true,
                },
            );
        let class = SerializerClass::builder("RecursiveModelSerializer")
            .field("parent", RecursiveField::new().with_allow_null(true))
            .model(&model, &["name", "parent"])
            .build()
            .unwrap();
        let kinds: Vec<_> = class
            .fields()
            .map(|(name, field)| (name, field.type_name()))
            .collect();
        assert_eq!(kinds, vec![("name", "CharField"), ("parent", "RecursiveField")]);

        let err = SerializerClass::builder("Extra")
            .field("other", CharField::new())
            .model(&model, &["name"])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Declaration(_)));
    }

    #[test]
    fn test_instantiate_many() {
        let class = Arc::new(
            SerializerClass::builder("Node")
                .field("name", CharField::new())
                .build()
                .unwrap(),
        );
        let one = class.instantiate(&Options::new()).unwrap();
        assert_eq!(one.type_name(), "Serializer");
        let many = class.instantiate(&Options::new().with("many", true)).unwrap();
        assert_eq!(many.type_name(), "ListSerializer");
        assert!(class
            .instantiate(&Options::new().with("max_value", 1))
            .is_err());
    }
}
