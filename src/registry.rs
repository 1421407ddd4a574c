//! Schema type registry
//!
//! The registry maps a module path and a name to a schema type: either a
//! declared [`SerializerClass`] or a field constructor. Recursive fields look
//! their target up here, with a bare name searched in the module of the
//! composite that owns the placeholder.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, LookupError, Result};
use crate::fields::{BooleanField, CharField, Field, IntegerField};
use crate::names::{is_valid_identifier, qualify, split_reference};
use crate::options::Options;
use crate::serializers::{Serializer, SerializerClass};

/// Module under which the builtin fields are registered
pub const BUILTIN_MODULE: &str = "recursive_schema.fields";

/// Constructor for a field type from keyword options
pub type FieldConstructor = fn(&Options) -> Result<Box<dyn Field>>;

/// A constructible schema type
#[derive(Clone)]
pub enum SchemaType {
    /// A composite schema class
    Serializer(Arc<SerializerClass>),
    /// A field type
    Field(FieldConstructor),
}

impl SchemaType {
    /// Construct an unbound instance with the given options
    pub fn instantiate(&self, options: &Options) -> Result<Box<dyn Field>> {
        match self {
            SchemaType::Serializer(class) => class.instantiate(options),
            SchemaType::Field(construct) => construct(options),
        }
    }
}

impl fmt::Debug for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaType::Serializer(class) => {
                write!(f, "Serializer({})", class.qualified_name())
            }
            SchemaType::Field(_) => write!(f, "Field(..)"),
        }
    }
}

/// Module path to name to schema type
#[derive(Debug, Clone)]
pub struct Registry {
    modules: IndexMap<String, IndexMap<String, SchemaType>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry holding the builtin field types
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.insert(BUILTIN_MODULE, "CharField", SchemaType::Field(CharField::construct));
        registry.insert(
            BUILTIN_MODULE,
            "IntegerField",
            SchemaType::Field(IntegerField::construct),
        );
        registry.insert(
            BUILTIN_MODULE,
            "BooleanField",
            SchemaType::Field(BooleanField::construct),
        );
        registry
    }

    /// Create a registry with nothing registered
    pub fn empty() -> Self {
        Self {
            modules: IndexMap::new(),
        }
    }

    fn insert(&mut self, module: &str, name: &str, schema: SchemaType) -> bool {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(name.to_string(), schema)
            .is_some()
    }

    /// Register a class under its declared module
    pub fn register(&mut self, class: SerializerClass) -> Result<Arc<SerializerClass>> {
        let class = Arc::new(class);
        if self.get(class.module(), class.name()).is_some() {
            return Err(Error::Declaration(format!(
                "'{}' is already registered",
                class.qualified_name()
            )));
        }
        self.insert(class.module(), class.name(), SchemaType::Serializer(class.clone()));
        tracing::debug!(class = %class.qualified_name(), "registered serializer class");
        Ok(class)
    }

    /// Register a field constructor, replacing any earlier one of that name
    pub fn register_field(
        &mut self,
        module: &str,
        name: &str,
        construct: FieldConstructor,
    ) -> Result<()> {
        if !is_valid_identifier(name) {
            return Err(Error::Declaration(format!("'{}' is not a valid field type name", name)));
        }
        if self.insert(module, name, SchemaType::Field(construct)) {
            tracing::warn!(field = %qualify(module, name), "replaced field constructor");
        }
        Ok(())
    }

    /// Schema type by module and name
    pub fn get(&self, module: &str, name: &str) -> Option<&SchemaType> {
        self.modules.get(module)?.get(name)
    }

    /// Look up a reference
    ///
    /// A bare name is searched in `default_module`; a dotted path names its
    /// own module.
    pub fn lookup(
        &self,
        reference: &str,
        default_module: &str,
    ) -> std::result::Result<&SchemaType, LookupError> {
        let (module, name) = split_reference(reference)?;
        let module = module.unwrap_or(default_module);
        let types = self
            .modules
            .get(module)
            .ok_or_else(|| LookupError::UnknownModule(module.to_string()))?;
        types.get(name).ok_or_else(|| LookupError::UnknownName {
            module: module.to_string(),
            name: name.to_string(),
        })
    }

    /// Class by reference; a bare name is looked up in the root module
    pub fn class(&self, reference: &str) -> Result<Arc<SerializerClass>> {
        let not_found = |source| Error::SchemaNotFound {
            reference: reference.to_string(),
            source,
        };
        match self.lookup(reference, "").map_err(not_found)? {
            SchemaType::Serializer(class) => Ok(class.clone()),
            SchemaType::Field(_) => Err(Error::Declaration(format!(
                "'{}' is a field type, not a serializer class",
                reference
            ))),
        }
    }

    /// Registered classes in registration order
    pub fn classes(&self) -> impl Iterator<Item = &Arc<SerializerClass>> {
        self.modules.values().flat_map(|types| {
            types.values().filter_map(|schema| match schema {
                SchemaType::Serializer(class) => Some(class),
                SchemaType::Field(_) => None,
            })
        })
    }

    /// Root instance of a registered class with this registry attached
    pub fn serializer(self: &Arc<Self>, reference: &str) -> Result<Serializer> {
        Ok(Serializer::new(self.class(reference)?).with_registry(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::RecursiveField;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register(
                SerializerClass::builder("PongSerializer")
                    .module("app")
                    .field("pong_id", IntegerField::new())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_builtins_are_registered() {
        let registry = Registry::new();
        assert!(registry.get(BUILTIN_MODULE, "CharField").is_some());
        assert!(registry.get(BUILTIN_MODULE, "ListField").is_none());
        assert_eq!(registry.classes().count(), 0);
        assert!(Registry::empty().get(BUILTIN_MODULE, "CharField").is_none());
    }

    #[test]
    fn test_lookup() {
        let registry = registry();
        assert!(matches!(
            registry.lookup("PongSerializer", "app"),
            Ok(SchemaType::Serializer(_))
        ));
        assert!(matches!(
            registry.lookup("recursive_schema.fields.IntegerField", "app"),
            Ok(SchemaType::Field(_))
        ));
        assert_eq!(
            registry.lookup("PongSerializer", "other").unwrap_err(),
            LookupError::UnknownModule("other".to_string())
        );
        assert_eq!(
            registry.lookup("app.Missing", "").unwrap_err(),
            LookupError::UnknownName {
                module: "app".to_string(),
                name: "Missing".to_string()
            }
        );
        assert!(matches!(
            registry.lookup("app..Bad", ""),
            Err(LookupError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = registry();
        let err = registry
            .register(SerializerClass::builder("PongSerializer").module("app").build().unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::Declaration(_)));
    }

    #[test]
    fn test_class_and_serializer() {
        let registry = Arc::new(registry());
        assert_eq!(registry.class("app.PongSerializer").unwrap().name(), "PongSerializer");
        assert!(matches!(
            registry.class("recursive_schema.fields.CharField"),
            Err(Error::Declaration(_))
        ));
        assert!(matches!(
            registry.class("PongSerializer"),
            Err(Error::SchemaNotFound { .. })
        ));

        let serializer = registry.serializer("app.PongSerializer").unwrap();
        assert!(serializer.as_parent().registry().is_some());
    }

    #[test]
    fn test_register_custom_field() {
        fn slug(options: &Options) -> Result<Box<dyn Field>> {
            Ok(Box::new(CharField::from_options(options)?.with_max_length(50)))
        }
        let mut registry = Registry::new();
        registry.register_field("app.fields", "SlugField", slug).unwrap();
        let schema = registry.lookup("app.fields.SlugField", "").unwrap();
        assert_eq!(schema.instantiate(&Options::new()).unwrap().type_name(), "CharField");

        let field = RecursiveField::to("app.fields.SlugField");
        assert_eq!(field.reference(), Some("app.fields.SlugField"));
    }
}
