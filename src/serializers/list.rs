//! Repeating composite schemas

use std::sync::Arc;

use serde_json::Value;

use super::{Serializer, SerializerClass};
use crate::error::Result;
use crate::fields::{
    represent_items, validate_items, Data, EmptyCheck, Extracted, Field, FieldBase,
    LengthBounds, NodeId, Parent, BASE_OPTIONS,
};
use crate::options::Options;

/// A list of instances of one serializer class
///
/// Produced when a class is instantiated with `many: true`. The list takes the
/// base options and length bounds; the child instance takes every other
/// option, along with the base options, so `allow_null` also admits null
/// elements.
#[derive(Debug)]
pub struct ListSerializer {
    base: FieldBase,
    child: Serializer,
    handle: Parent,
    bounds: LengthBounds,
}

impl ListSerializer {
    /// Create a list of `class` instances from keyword options
    pub fn from_options(class: Arc<SerializerClass>, options: &Options) -> Result<Self> {
        options.ensure_only(
            &[BASE_OPTIONS, LengthBounds::OPTIONS, Serializer::OPTIONS].concat(),
            class.name(),
        )?;
        let base = FieldBase::from_options(options)?;
        let bounds = LengthBounds::from_options(options)?;
        let child = Serializer::from_options(class, &options.without(LengthBounds::OPTIONS))?;
        Ok(Self::from_parts(base, child, bounds))
    }

    fn from_parts(base: FieldBase, mut child: Serializer, bounds: LengthBounds) -> Self {
        let handle = Parent::sequence(base.id(), child.node_id());
        child.bind("", &handle);
        Self {
            base,
            child,
            handle,
            bounds,
        }
    }

    /// The repeated instance
    pub fn child(&self) -> &Serializer {
        &self.child
    }
}

impl Field for ListSerializer {
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
            EmptyCheck::Proceed(value) => validate_items(&self.child, value, &self.bounds).map(Some),
        }
    }

    fn get_attribute(&self, instance: &Value) -> Result<Option<Value>> {
        self.base.get_attribute(instance)
    }

    fn to_representation(&self, value: &Value) -> Result<Value> {
        represent_items(&self.child, value)
    }

    fn boxed_clone(&self) -> Box<dyn Field> {
        let child = self.child.unbound_copy();
        Box::new(Self::from_parts(self.base.clone(), child, self.bounds))
    }

    fn type_name(&self) -> &'static str {
        "ListSerializer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{CharField, RecursiveField};
    use serde_json::json;

    fn many_null_class() -> Arc<SerializerClass> {
        Arc::new(
            SerializerClass::builder("ManyNullSerializer")
                .field("name", CharField::new())
                .field(
                    "children",
                    RecursiveField::new()
                        .with_required(false)
                        .with_allow_null(true)
                        .with_many(true),
                )
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_options_split_between_list_and_child() {
        let list = ListSerializer::from_options(
            many_null_class(),
            &Options::new()
                .with("many", true)
                .with("allow_null", true)
                .with("allow_empty", false),
        )
        .unwrap();
        assert!(list.base().unwrap().allows_null());
        assert!(list.child().base().unwrap().allows_null());
        assert!(!list.bounds.allow_empty);
        assert_eq!(list.child().field_name().unwrap(), Some(""));
    }

    #[test]
    fn test_validates_each_instance() {
        let list = ListSerializer::from_options(many_null_class(), &Options::new()).unwrap();
        let data = json!([{"name": "child1"}, {"name": "child2"}]);
        assert_eq!(
            list.run_validation(Extracted::Present(data.clone())).unwrap(),
            Some(data)
        );

        let err = list
            .run_validation(Extracted::Present(json!([{"name": "ok"}, {}])))
            .unwrap_err();
        assert_eq!(
            err.detail().unwrap().messages_at("1.name"),
            vec!["This field is required."]
        );
    }

    #[test]
    fn test_rejects_unknown_option() {
        assert!(ListSerializer::from_options(
            many_null_class(),
            &Options::new().with("max_value", 3)
        )
        .is_err());
    }

    #[test]
    fn test_representation() {
        let list = ListSerializer::from_options(many_null_class(), &Options::new()).unwrap();
        let value = json!([{"name": "a", "children": []}, null]);
        assert_eq!(list.to_representation(&value).unwrap(), value);
    }
}
