//! # recursive-schema
//!
//! Recursive schemas for validating and serializing JSON-shaped data.
//!
//! A composite schema ([`SerializerClass`]) cannot contain itself at
//! declaration time. Recursive shapes declare a [`RecursiveField`] instead: a
//! placeholder that waits until it is attached to a tree, looks up the schema
//! it stands for on first use, constructs it with the options it was declared
//! with and forwards to it from then on.
//!
//! ## Features
//!
//! - Self-referencing schemas (linked lists, trees through [`ListField`])
//! - References to other schemas by bare name or dotted module path
//! - Many-valued, nullable and optional recursive fields
//! - Per-field validation errors collected into an [`ErrorDetail`] tree
//! - Model-backed schema classes ([`models`])
//! - JSON declaration documents ([`loaders`])
//! - Limits on data depth and document size
//!
//! ## Example
//!
//! ```rust,ignore
//! use recursive_schema::{CharField, RecursiveField, Serializer, SerializerClass};
//! use std::sync::Arc;
//!
//! let link = Arc::new(
//!     SerializerClass::builder("LinkSerializer")
//!         .field("name", CharField::new().with_max_length(25))
//!         .field("next", RecursiveField::new().with_allow_null(true))
//!         .build()?,
//! );
//!
//! let data = serde_json::json!({"name": "first", "next": {"name": "second", "next": null}});
//! let validated = Serializer::new(link).validate(&data)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;
pub mod names;
pub mod options;

// Schema tree
pub mod fields;
pub mod serializers;

// Resolution context
pub mod registry;
pub mod models;

// Declarations
pub mod loaders;

// Re-exports for convenience
pub use error::{Error, ErrorDetail, LookupError, Result};
pub use fields::{
    BooleanField, CharField, Extracted, Field, IntegerField, ListField, RecursiveField,
};
pub use limits::Limits;
pub use loaders::Loader;
pub use models::{Model, ModelField};
pub use options::Options;
pub use registry::{Registry, SchemaType};
pub use serializers::{ListSerializer, Serializer, SerializerClass};

/// Version of the recursive-schema library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
