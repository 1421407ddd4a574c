//! Declaration loading
//!
//! Serializer classes can be declared in JSON documents and loaded into a
//! [`Registry`]:
//!
//! ```json
//! {
//!   "module": "app",
//!   "serializers": {
//!     "NodeSerializer": {
//!       "fields": {
//!         "name": {"type": "CharField", "max_length": 25},
//!         "children": {"type": "ListField", "child": {"type": "RecursiveField"}}
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! A field's `type` is `RecursiveField` (target in `to`), `ListField` (element
//! declaration in `child`), a registered field type or a serializer class
//! declared earlier, embedded directly. Every other key is a construction
//! option.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::fields::{Field, ListField, RecursiveField};
use crate::limits::Limits;
use crate::models::Model;
use crate::options::Options;
use crate::registry::{Registry, BUILTIN_MODULE};
use crate::names::split_reference;
use crate::serializers::SerializerClass;

/// A declaration document
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declarations {
    /// Module the classes are declared in
    #[serde(default)]
    pub module: String,
    /// Classes in declaration order
    #[serde(default)]
    pub serializers: IndexMap<String, SerializerDecl>,
}

/// Declaration of one serializer class
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerializerDecl {
    /// Explicitly declared fields
    #[serde(default)]
    pub fields: IndexMap<String, FieldDecl>,
    /// Model to generate further fields from
    #[serde(default)]
    pub model: Option<Model>,
    /// Model fields to include, in order
    #[serde(default)]
    pub model_fields: Vec<String>,
}

/// Declaration of one field
#[derive(Debug, Deserialize)]
pub struct FieldDecl {
    /// Field type or class reference
    #[serde(rename = "type")]
    pub kind: String,
    /// Target of a recursive field
    #[serde(default)]
    pub to: Option<String>,
    /// Element of a list field
    #[serde(default)]
    pub child: Option<Box<FieldDecl>>,
    /// Construction options
    #[serde(flatten)]
    pub options: Options,
}

/// Loads declaration documents into a registry
#[derive(Debug, Clone, Default)]
pub struct Loader {
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Load declarations from a file
    pub fn load_file(
        &self,
        registry: &mut Registry,
        path: impl AsRef<Path>,
    ) -> Result<Vec<Arc<SerializerClass>>> {
        let path = path.as_ref();
        let size = fs::metadata(path)?.len();
        self.limits
            .check_document_size(usize::try_from(size).unwrap_or(usize::MAX))?;
        let content = fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading declarations");
        self.load_str(registry, &content)
    }

    /// Load declarations from a JSON string
    ///
    /// Classes are registered in document order, so a class can embed any
    /// class declared before it; later classes are reached through
    /// `RecursiveField`. A document that fails to load leaves `registry`
    /// unchanged.
    pub fn load_str(
        &self,
        registry: &mut Registry,
        source: &str,
    ) -> Result<Vec<Arc<SerializerClass>>> {
        self.limits.check_document_size(source.len())?;
        let declarations: Declarations = serde_json::from_str(source)?;

        let mut staged = registry.clone();
        let mut loaded = Vec::with_capacity(declarations.serializers.len());
        for (name, decl) in declarations.serializers {
            let mut builder = SerializerClass::builder(name.as_str()).module(&declarations.module);
            for (field_name, field) in decl.fields {
                let field = build_field(&staged, &declarations.module, field).map_err(|err| {
                    Error::Declaration(format!("{}.{}: {}", name, field_name, err))
                })?;
                builder = builder.boxed_field(field_name, field);
            }
            if let Some(model) = &decl.model {
                let names: Vec<&str> = decl.model_fields.iter().map(String::as_str).collect();
                builder = builder.model(model, &names);
            }
            loaded.push(staged.register(builder.build()?)?);
        }
        *registry = staged;
        tracing::debug!(module = %declarations.module, classes = loaded.len(), "loaded declarations");
        Ok(loaded)
    }
}

fn build_field(registry: &Registry, module: &str, decl: FieldDecl) -> Result<Box<dyn Field>> {
    if decl.kind != "RecursiveField" && decl.to.is_some() {
        return Err(Error::Declaration(format!(
            "'to' is only accepted by RecursiveField, not {}",
            decl.kind
        )));
    }
    if decl.kind != "ListField" && decl.child.is_some() {
        return Err(Error::Declaration(format!(
            "'child' is only accepted by ListField, not {}",
            decl.kind
        )));
    }

    match decl.kind.as_str() {
        "RecursiveField" => Ok(Box::new(RecursiveField::with_options(decl.to, decl.options)?)),
        "ListField" => {
            let child = decl
                .child
                .ok_or_else(|| Error::Declaration("ListField requires a 'child'".to_string()))?;
            let child = build_field(registry, module, *child)?;
            Ok(Box::new(ListField::with_options(child, &decl.options)?))
        }
        kind => {
            let schema = match registry.lookup(kind, module) {
                Ok(schema) => schema,
                Err(err) => match split_reference(kind) {
                    Ok((None, name)) => registry
                        .get(BUILTIN_MODULE, name)
                        .ok_or_else(|| Error::SchemaNotFound {
                            reference: kind.to_string(),
                            source: err,
                        })?,
                    _ => {
                        return Err(Error::SchemaNotFound {
                            reference: kind.to_string(),
                            source: err,
                        })
                    }
                },
            };
            schema.instantiate(&decl.options)
        }
    }
}
