//! Repeating-element field

use std::collections::BTreeMap;

use serde_json::Value;

use super::base::{base_builders, EmptyCheck, FieldBase, BASE_OPTIONS};
use super::{json_type, Data, Extracted, Field, NodeId, Parent};
use crate::error::{Error, ErrorDetail, Result};
use crate::options::Options;

/// Length constraints shared by the repeating fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    /// Whether an empty list is accepted
    pub allow_empty: bool,
    /// Fewest accepted elements
    pub min_length: Option<usize>,
    /// Most accepted elements
    pub max_length: Option<usize>,
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self {
            allow_empty: true,
            min_length: None,
            max_length: None,
        }
    }
}

impl LengthBounds {
    /// Option keywords that configure the bounds
    pub const OPTIONS: &'static [&'static str] = &["allow_empty", "min_length", "max_length"];

    /// Read the bounds from keyword options
    pub fn from_options(options: &Options) -> Result<Self> {
        Ok(Self {
            allow_empty: options.get_bool("allow_empty")?.unwrap_or(true),
            min_length: options.get_usize("min_length")?,
            max_length: options.get_usize("max_length")?,
        })
    }

    fn check(&self, len: usize) -> Result<()> {
        if len == 0 && !self.allow_empty {
            return Err(Error::invalid("This list may not be empty."));
        }
        if let Some(min) = self.min_length {
            if len < min {
                return Err(Error::invalid(format!(
                    "Ensure this field has at least {} elements.",
                    min
                )));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(Error::invalid(format!(
                    "Ensure this field has no more than {} elements.",
                    max
                )));
            }
        }
        Ok(())
    }
}

/// A homogeneous list whose elements are described by one child field
///
/// The child is bound to the list as soon as the list is constructed, with an
/// empty field name. The list's own position is only known once the list is
/// bound into a composite, which its [`Parent`] handle records for the child.
#[derive(Debug)]
pub struct ListField {
    base: FieldBase,
    child: Box<dyn Field>,
    handle: Parent,
    bounds: LengthBounds,
}

impl ListField {
    /// Create a list of `child` elements
    pub fn new(child: impl Field + 'static) -> Self {
        Self::from_parts(FieldBase::new(), Box::new(child), LengthBounds::default())
    }

    /// Create a list from a boxed child and keyword options
    pub fn with_options(child: Box<dyn Field>, options: &Options) -> Result<Self> {
        options.ensure_only(&[BASE_OPTIONS, LengthBounds::OPTIONS].concat(), "ListField")?;
        Ok(Self::from_parts(
            FieldBase::from_options(options)?,
            child,
            LengthBounds::from_options(options)?,
        ))
    }

    fn from_parts(base: FieldBase, mut child: Box<dyn Field>, bounds: LengthBounds) -> Self {
        let handle = Parent::sequence(base.id(), child.node_id());
        child.bind("", &handle);
        Self {
            base,
            child,
            handle,
            bounds,
        }
    }

    base_builders!();

    /// Reject empty lists
    pub fn with_allow_empty(mut self, allow_empty: bool) -> Self {
        self.bounds.allow_empty = allow_empty;
        self
    }

    /// Set the maximum number of elements
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.bounds.max_length = Some(max_length);
        self
    }

    /// Set the minimum number of elements
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.bounds.min_length = Some(min_length);
        self
    }

    /// The element field
    pub fn child(&self) -> &dyn Field {
        self.child.as_ref()
    }

    /// Handle the child is bound to
    pub fn as_parent(&self) -> &Parent {
        &self.handle
    }
}

/// Validate a list input element by element
///
/// Element failures are collected by position into one error.
pub(crate) fn validate_items(
    child: &dyn Field,
    value: Value,
    bounds: &LengthBounds,
) -> Result<Value> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(Error::invalid(format!(
                "Expected a list of items but got type \"{}\".",
                json_type(&other)
            )))
        }
    };
    bounds.check(items.len())?;

    let mut validated = Vec::with_capacity(items.len());
    let mut errors = BTreeMap::new();
    for (index, item) in items.into_iter().enumerate() {
        match child.run_validation(Extracted::Present(item)) {
            Ok(value) => validated.push(value.unwrap_or(Value::Null)),
            Err(Error::Validation(detail)) => {
                errors.insert(index, detail);
            }
            Err(other) => return Err(other),
        }
    }
    if !errors.is_empty() {
        return Err(Error::Validation(ErrorDetail::Items(errors)));
    }
    Ok(Value::Array(validated))
}

/// Represent each element with `child`, keeping nulls
pub(crate) fn represent_items(child: &dyn Field, value: &Value) -> Result<Value> {
    let items = value.as_array().ok_or_else(|| {
        Error::invalid(format!("Expected a list, got {}.", json_type(value)))
    })?;
    items
        .iter()
        .map(|item| match item {
            Value::Null => Ok(Value::Null),
            item => child.to_representation(item),
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

impl Field for ListField {
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

    fn get_initial(&self) -> Result<Value> {
        Ok(self
            .base
            .initial()
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new())))
    }

    fn run_validation(&self, data: Extracted) -> Result<Option<Value>> {
        match self.base.validate_empty_values(data)? {
            EmptyCheck::Done(value) => Ok(value),
            EmptyCheck::Proceed(value) => {
                validate_items(self.child.as_ref(), value, &self.bounds).map(Some)
            }
        }
    }

    fn get_attribute(&self, instance: &Value) -> Result<Option<Value>> {
        self.base.get_attribute(instance)
    }

    fn to_representation(&self, value: &Value) -> Result<Value> {
        represent_items(self.child.as_ref(), value)
    }

    fn boxed_clone(&self) -> Box<dyn Field> {
        Box::new(Self::from_parts(
            self.base.clone(),
            self.child.boxed_clone(),
            self.bounds,
        ))
    }

    fn check(&self) -> Result<()> {
        self.base.check()?;
        self.child.check()
    }

    fn type_name(&self) -> &'static str {
        "ListField"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{CharField, IntegerField, ParentKind};
    use serde_json::json;

    #[test]
    fn test_child_is_bound_to_list() {
        let list = ListField::new(CharField::new());
        match list.as_parent().kind() {
            ParentKind::Sequence { child } => assert_eq!(*child, list.child().node_id()),
            ParentKind::Composite(_) => panic!("list handle must be a sequence"),
        }
        assert_eq!(list.child().field_name().unwrap(), Some(""));
        assert!(list.as_parent().attachment().is_none());
    }

    #[test]
    fn test_validates_each_item() {
        let list = ListField::new(IntegerField::new());
        assert_eq!(
            list.run_validation(Extracted::Present(json!([1, "2"]))).unwrap(),
            Some(json!([1, 2]))
        );

        let err = list
            .run_validation(Extracted::Present(json!([1, "x", 3, "y"])))
            .unwrap_err();
        let paths: Vec<_> = err.detail().unwrap().paths().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["1", "3"]);
    }

    #[test]
    fn test_rejects_non_lists() {
        let list = ListField::new(CharField::new());
        let err = list.run_validation(Extracted::Present(json!("abc"))).unwrap_err();
        assert_eq!(
            err.detail().unwrap().messages_at(""),
            vec!["Expected a list of items but got type \"str\"."]
        );
    }

    #[test]
    fn test_length_options() {
        let list = ListField::with_options(
            Box::new(CharField::new()),
            &Options::new().with("allow_empty", false).with("max_length", 2),
        )
        .unwrap();
        assert!(list.run_validation(Extracted::Present(json!([]))).is_err());
        assert!(list.run_validation(Extracted::Present(json!(["a", "b", "c"]))).is_err());
        assert!(list.run_validation(Extracted::Present(json!(["a"]))).is_ok());
    }

    #[test]
    fn test_representation_keeps_nulls() {
        let list = ListField::new(IntegerField::new());
        assert_eq!(list.to_representation(&json!([1, null, "3"])).unwrap(), json!([1, null, 3]));
        assert_eq!(list.get_initial().unwrap(), json!([]));
    }

    #[test]
    fn test_clone_rebinds_new_child() {
        let list = ListField::new(CharField::new());
        let copy = list.boxed_clone();
        assert_ne!(copy.node_id(), list.node_id());
    }
}
