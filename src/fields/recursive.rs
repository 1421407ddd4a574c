//! Recursive placeholder field
//!
//! A composite schema cannot contain an instance of itself at declaration
//! time, so recursive shapes (trees, linked lists, mutually referencing
//! schemas) declare a [`RecursiveField`] instead. The placeholder only records
//! where it is attached. The first time the owning composite actually uses it,
//! the placeholder works out which schema it stands for, constructs that
//! schema with the options it was declared with, binds it into the same
//! position and from then on forwards to it.
//!
//! ```rust,ignore
//! // A linked list: the base case is `next == null`.
//! SerializerClass::builder("LinkSerializer")
//!     .field("name", CharField::new().with_max_length(25))
//!     .field("next", RecursiveField::new().with_option("allow_null", true))
//!     .build()?;
//!
//! // A tree: the base case is an empty list of children.
//! SerializerClass::builder("NodeSerializer")
//!     .field("name", CharField::new())
//!     .field("children", ListField::new(RecursiveField::new()))
//!     .build()?;
//! ```

use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde_json::Value;

use super::base::{FieldBase, BASE_OPTIONS};
use super::{Attachment, Data, Extracted, Field, NodeId, Parent, ParentKind};
use crate::error::{Error, LookupError, Result};
use crate::options::Options;
use crate::registry::SchemaType;
use crate::serializers::SerializerClass;

/// Placeholder for a schema resolved lazily from its position in the tree
///
/// The reference is either absent (the enclosing composite itself), a bare
/// name (a schema declared in the enclosing composite's module) or a dotted
/// path (`module.path.Name`).
#[derive(Debug)]
pub struct RecursiveField {
    id: NodeId,
    reference: Option<String>,
    options: Options,
    base: FieldBase,
    invalid_options: Option<String>,
    attachment: Option<Attachment>,
    resolved: OnceCell<Box<dyn Field>>,
}

impl Default for RecursiveField {
    fn default() -> Self {
        Self::new()
    }
}

impl RecursiveField {
    /// Placeholder for the enclosing composite schema
    pub fn new() -> Self {
        Self::unchecked(None, Options::new())
    }

    /// Placeholder for the schema named by `reference`
    pub fn to(reference: impl Into<String>) -> Self {
        Self::unchecked(Some(reference.into()), Options::new())
    }

    /// Placeholder with construction options for the resolved schema
    ///
    /// Options the base field understands are applied to the placeholder
    /// itself as well; all of them are handed unchanged to the resolved
    /// schema's constructor.
    pub fn with_options(reference: Option<String>, options: Options) -> Result<Self> {
        let base = FieldBase::from_options(&options.filtered(BASE_OPTIONS))?;
        Ok(Self {
            id: NodeId::next(),
            reference,
            options,
            base,
            invalid_options: None,
            attachment: None,
            resolved: OnceCell::new(),
        })
    }

    /// Placeholder whose option errors surface on use rather than here
    fn unchecked(reference: Option<String>, options: Options) -> Self {
        let (base, invalid_options) =
            match FieldBase::from_options(&options.filtered(BASE_OPTIONS)) {
                Ok(base) => (base, None),
                Err(Error::Options(message)) => (FieldBase::new(), Some(message)),
                Err(other) => (FieldBase::new(), Some(other.to_string())),
            };
        Self {
            id: NodeId::next(),
            reference,
            options,
            base,
            invalid_options,
            attachment: None,
            resolved: OnceCell::new(),
        }
    }

    /// Add a construction option
    ///
    /// Contradictory base options are reported by [`Field::check`], and by
    /// the identity accessors while the placeholder is unattached.
    pub fn with_option(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut options = self.options;
        options.insert(key, value);
        Self::unchecked(self.reference, options)
    }

    /// Accept null in place of the resolved schema's value
    pub fn with_allow_null(self, allow_null: bool) -> Self {
        self.with_option("allow_null", allow_null)
    }

    /// Set whether input must contain the field
    pub fn with_required(self, required: bool) -> Self {
        self.with_option("required", required)
    }

    /// Resolve to a repeating form of the target schema
    pub fn with_many(self, many: bool) -> Self {
        self.with_option("many", many)
    }

    /// The target reference, if any
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Construction options captured at declaration
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Whether the placeholder has been bound into a tree
    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Whether the target schema has been constructed
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// The resolved schema if resolution already happened
    pub fn peek(&self) -> Option<&dyn Field> {
        self.resolved.get().map(|field| field.as_ref())
    }

    /// The resolved schema, resolving it on first use
    ///
    /// A failed resolution is not cached.
    pub fn resolved(&self) -> Result<&dyn Field> {
        self.resolved
            .get_or_try_init(|| self.resolve())
            .map(|field| field.as_ref())
    }

    fn resolve(&self) -> Result<Box<dyn Field>> {
        let attachment = self.attachment.as_ref().ok_or(Error::NotAttached)?;
        let owner = self.owning_class(attachment)?;

        let target = match &self.reference {
            None => SchemaType::Serializer(owner.clone()),
            Some(reference) => self.lookup(reference, &owner, &attachment.parent)?,
        };

        let mut instance = target.instantiate(&self.options)?;
        instance.bind(&attachment.field_name, &attachment.parent);
        tracing::debug!(
            field_name = %attachment.field_name,
            owner = %owner.qualified_name(),
            target = instance.type_name(),
            "resolved recursive field"
        );
        Ok(instance)
    }

    /// Class of the composite this placeholder ultimately belongs to
    ///
    /// A repeating element binds its child before the element itself is
    /// bound, so when the owner is a repeating element wrapping this node the
    /// search continues from the wrapper's own position, through any number
    /// of nested wrappers.
    fn owning_class(&self, attachment: &Attachment) -> Result<Arc<SerializerClass>> {
        let mut node = self.id;
        let mut owner = attachment.parent.clone();
        loop {
            let next = match owner.kind() {
                ParentKind::Composite(class) => return Ok(class.clone()),
                ParentKind::Sequence { child } if *child == node => owner
                    .attachment()
                    .ok_or(Error::NotAttached)?
                    .parent
                    .clone(),
                ParentKind::Sequence { .. } => {
                    return Err(Error::NotComposite(owner.describe()))
                }
            };
            node = owner.node_id();
            owner = next;
        }
    }

    fn lookup(
        &self,
        reference: &str,
        owner: &SerializerClass,
        parent: &Parent,
    ) -> Result<SchemaType> {
        let not_found = |source| Error::SchemaNotFound {
            reference: reference.to_string(),
            source,
        };
        let registry = parent.registry().ok_or_else(|| not_found(LookupError::NoRegistry))?;
        registry
            .lookup(reference, owner.module())
            .cloned()
            .map_err(not_found)
    }
}

impl Field for RecursiveField {
    /// Forwards to the resolved schema; an unattached placeholder answers
    /// with its own base options.
    fn base(&self) -> Result<&FieldBase> {
        match self.resolved() {
            Ok(field) => field.base(),
            Err(Error::NotAttached) => match &self.invalid_options {
                Some(message) => Err(Error::Options(message.clone())),
                None => Ok(&self.base),
            },
            Err(other) => Err(other),
        }
    }

    fn node_id(&self) -> NodeId {
        self.id
    }

    fn bind(&mut self, field_name: &str, parent: &Parent) {
        if self.attachment.is_some() {
            tracing::warn!(field_name, "recursive field is already attached");
            return;
        }
        tracing::trace!(field_name, parent = %parent.describe(), "attached recursive field");
        self.base.bind(field_name);
        self.attachment = Some(Attachment {
            field_name: field_name.to_string(),
            parent: parent.clone(),
        });
    }

    fn get_value(&self, data: &Data) -> Result<Extracted> {
        self.resolved()?.get_value(data)
    }

    fn get_initial(&self) -> Result<Value> {
        self.resolved()?.get_initial()
    }

    fn run_validation(&self, data: Extracted) -> Result<Option<Value>> {
        self.resolved()?.run_validation(data)
    }

    fn get_attribute(&self, instance: &Value) -> Result<Option<Value>> {
        self.resolved()?.get_attribute(instance)
    }

    fn to_representation(&self, value: &Value) -> Result<Value> {
        self.resolved()?.to_representation(value)
    }

    fn boxed_clone(&self) -> Box<dyn Field> {
        Box::new(Self::unchecked(self.reference.clone(), self.options.clone()))
    }

    fn check(&self) -> Result<()> {
        FieldBase::from_options(&self.options.filtered(BASE_OPTIONS)).map(|_| ())
    }

    fn type_name(&self) -> &'static str {
        "RecursiveField"
    }

    fn as_recursive(&self) -> Option<&RecursiveField> {
        Some(self)
    }
}
