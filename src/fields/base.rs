//! Base field options and shared field behaviour
//!
//! [`FieldBase`] holds the framework-level options every field accepts and
//! implements the behaviour concrete fields share: empty-value handling,
//! reading a value out of input data and reading an attribute off a source
//! object.

use serde_json::Value;

use super::{Data, Extracted, NodeId};
use crate::error::{Error, Result};
use crate::options::Options;

/// Option keywords understood by every field
pub const BASE_OPTIONS: &[&str] = &[
    "read_only",
    "write_only",
    "required",
    "default",
    "initial",
    "source",
    "label",
    "help_text",
    "allow_null",
];

/// Outcome of the empty-value check that precedes conversion
#[derive(Debug, Clone, PartialEq)]
pub enum EmptyCheck {
    /// Validation is finished; `None` means the field is left out
    Done(Option<Value>),
    /// The value still has to be converted
    Proceed(Value),
}

/// Framework-level options and binding state of a field
///
/// Cloning yields a new, unbound node with the same options.
#[derive(Debug)]
pub struct FieldBase {
    id: NodeId,
    read_only: bool,
    write_only: bool,
    required: Option<bool>,
    allow_null: bool,
    default: Option<Value>,
    initial: Option<Value>,
    source: Option<String>,
    label: Option<String>,
    help_text: Option<String>,
    field_name: Option<String>,
    source_attrs: Vec<String>,
}

impl Default for FieldBase {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for FieldBase {
    fn clone(&self) -> Self {
        Self {
            id: NodeId::next(),
            read_only: self.read_only,
            write_only: self.write_only,
            required: self.required,
            allow_null: self.allow_null,
            default: self.default.clone(),
            initial: self.initial.clone(),
            source: self.source.clone(),
            label: self.label.clone(),
            help_text: self.help_text.clone(),
            field_name: None,
            source_attrs: Vec::new(),
        }
    }
}

impl FieldBase {
    /// Create a base with default options
    pub fn new() -> Self {
        Self {
            id: NodeId::next(),
            read_only: false,
            write_only: false,
            required: None,
            allow_null: false,
            default: None,
            initial: None,
            source: None,
            label: None,
            help_text: None,
            field_name: None,
            source_attrs: Vec::new(),
        }
    }

    /// Build a base from options, ignoring keywords it does not understand
    pub fn from_options(options: &Options) -> Result<Self> {
        let mut base = Self::new();
        if let Some(v) = options.get_bool("read_only")? {
            base.read_only = v;
        }
        if let Some(v) = options.get_bool("write_only")? {
            base.write_only = v;
        }
        base.required = options.get_bool("required")?;
        if let Some(v) = options.get_bool("allow_null")? {
            base.allow_null = v;
        }
        base.default = options.get("default").cloned();
        base.initial = options.get("initial").cloned();
        base.source = options.get_str("source")?;
        base.label = options.get_str("label")?;
        base.help_text = options.get_str("help_text")?;
        base.check()?;
        Ok(base)
    }

    /// Check that the options do not contradict each other
    pub fn check(&self) -> Result<()> {
        if self.read_only && self.write_only {
            return Err(Error::Options(
                "a field may not be both read_only and write_only".to_string(),
            ));
        }
        if self.read_only && self.required == Some(true) {
            return Err(Error::Options(
                "a field may not be both read_only and required".to_string(),
            ));
        }
        if self.required == Some(true) && self.default.is_some() {
            return Err(Error::Options(
                "a field may not be required and have a default".to_string(),
            ));
        }
        Ok(())
    }

    /// Node identity
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Whether the field is only used for output
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether the field is only used for input
    pub fn is_write_only(&self) -> bool {
        self.write_only
    }

    /// Whether input must contain the field
    ///
    /// Unless set explicitly, a field is required when it is writable and
    /// has no default.
    pub fn is_required(&self) -> bool {
        self.required
            .unwrap_or(!self.read_only && self.default.is_none())
    }

    /// Whether null is an accepted value
    pub fn allows_null(&self) -> bool {
        self.allow_null
    }

    /// Default used when input or source omit the field
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Initial value for empty forms
    pub fn initial(&self) -> Option<&Value> {
        self.initial.as_ref()
    }

    /// Label, defaulting to a humanized field name once bound
    pub fn label(&self) -> Option<String> {
        self.label.clone().or_else(|| {
            self.field_name.as_deref().filter(|n| !n.is_empty()).map(humanize)
        })
    }

    /// Help text
    pub fn help_text(&self) -> Option<&str> {
        self.help_text.as_deref()
    }

    /// Name the field is bound under
    pub fn field_name(&self) -> Option<&str> {
        self.field_name.as_deref()
    }

    /// Source path; defaults to the field name once bound
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref().or(self.field_name.as_deref())
    }

    /// Source path split into segments; empty for `*`
    pub fn source_attrs(&self) -> &[String] {
        &self.source_attrs
    }

    /// Set read-only
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Set write-only
    pub fn set_write_only(&mut self, write_only: bool) {
        self.write_only = write_only;
    }

    /// Set whether the field is required
    pub fn set_required(&mut self, required: bool) {
        self.required = Some(required);
    }

    /// Set whether null is accepted
    pub fn set_allow_null(&mut self, allow_null: bool) {
        self.allow_null = allow_null;
    }

    /// Set the default value
    pub fn set_default(&mut self, default: Value) {
        self.default = Some(default);
    }

    /// Set the initial value
    pub fn set_initial(&mut self, initial: Value) {
        self.initial = Some(initial);
    }

    /// Set the source path
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    /// Set the label
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// Set the help text
    pub fn set_help_text(&mut self, help_text: impl Into<String>) {
        self.help_text = Some(help_text.into());
    }

    /// Record the field name and derive the source path
    pub fn bind(&mut self, field_name: &str) {
        self.field_name = Some(field_name.to_string());
        let source = self.source.clone().unwrap_or_else(|| field_name.to_string());
        self.source_attrs = if source == "*" {
            Vec::new()
        } else {
            source.split('.').map(str::to_string).collect()
        };
    }

    /// Extract this field's entry from input data
    pub fn get_value(&self, data: &Data) -> Extracted {
        self.field_name
            .as_deref()
            .and_then(|name| data.get(name))
            .map_or(Extracted::Missing, |v| Extracted::Present(v.clone()))
    }

    /// Handle missing and null input before conversion
    pub fn validate_empty_values(&self, data: Extracted) -> Result<EmptyCheck> {
        if self.read_only {
            return Ok(EmptyCheck::Done(self.default.clone()));
        }
        match data {
            Extracted::Missing => {
                if self.is_required() {
                    Err(Error::invalid("This field is required."))
                } else {
                    Ok(EmptyCheck::Done(self.default.clone()))
                }
            }
            Extracted::Present(Value::Null) => {
                if self.allow_null {
                    Ok(EmptyCheck::Done(Some(Value::Null)))
                } else {
                    Err(Error::invalid("This field may not be null."))
                }
            }
            Extracted::Present(value) => Ok(EmptyCheck::Proceed(value)),
        }
    }

    /// Read this field's attribute off a source object
    ///
    /// `Ok(None)` means the field is left out of the output.
    pub fn get_attribute(&self, instance: &Value) -> Result<Option<Value>> {
        if let Some(value) = lookup(instance, &self.source_attrs) {
            return Ok(Some(value.clone()));
        }
        if let Some(default) = &self.default {
            return Ok(Some(default.clone()));
        }
        if !self.is_required() {
            return Ok(None);
        }
        if self.allow_null {
            return Ok(Some(Value::Null));
        }
        Err(Error::MissingAttribute {
            field: self.field_name.clone().unwrap_or_default(),
            path: self.source_attrs.join("."),
        })
    }
}

fn lookup<'a>(instance: &'a Value, attrs: &[String]) -> Option<&'a Value> {
    attrs
        .iter()
        .try_fold(instance, |current, attr| current.as_object()?.get(attr))
}

fn humanize(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Write `value` into `target` at the nested path `keys`
///
/// An empty path merges an object value into `target`.
pub fn set_value(target: &mut Data, keys: &[String], value: Value) {
    match keys.split_first() {
        None => {
            if let Value::Object(map) = value {
                target.extend(map);
            }
        }
        Some((last, [])) => {
            target.insert(last.clone(), value);
        }
        Some((head, rest)) => {
            let entry = target
                .entry(head.clone())
                .or_insert_with(|| Value::Object(Data::new()));
            if !entry.is_object() {
                *entry = Value::Object(Data::new());
            }
            if let Value::Object(inner) = entry {
                set_value(inner, rest, value);
            }
        }
    }
}

/// Builder methods for the base options, shared by the concrete fields
macro_rules! base_builders {
    () => {
        /// Mark the field read-only
        pub fn with_read_only(mut self, read_only: bool) -> Self {
            self.base.set_read_only(read_only);
            self
        }

        /// Mark the field write-only
        pub fn with_write_only(mut self, write_only: bool) -> Self {
            self.base.set_write_only(write_only);
            self
        }

        /// Set whether input must contain the field
        pub fn with_required(mut self, required: bool) -> Self {
            self.base.set_required(required);
            self
        }

        /// Set whether null is accepted
        pub fn with_allow_null(mut self, allow_null: bool) -> Self {
            self.base.set_allow_null(allow_null);
            self
        }

        /// Set the default value
        pub fn with_default(mut self, default: impl Into<serde_json::Value>) -> Self {
            self.base.set_default(default.into());
            self
        }

        /// Set the source path
        pub fn with_source(mut self, source: impl Into<String>) -> Self {
            self.base.set_source(source);
            self
        }

        /// Set the label
        pub fn with_label(mut self, label: impl Into<String>) -> Self {
            self.base.set_label(label);
            self
        }
    };
}

pub(crate) use base_builders;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> Data {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_from_options_ignores_foreign_keywords() {
        let options = Options::new()
            .with("allow_null", true)
            .with("max_length", 5)
            .with("many", true);
        let base = FieldBase::from_options(&options).unwrap();
        assert!(base.allows_null());
        assert!(base.is_required());
    }

    #[test]
    fn test_required_defaults() {
        assert!(FieldBase::new().is_required());

        let base = FieldBase::from_options(&Options::new().with("default", "x")).unwrap();
        assert!(!base.is_required());
        assert_eq!(base.default_value(), Some(&json!("x")));

        let base = FieldBase::from_options(&Options::new().with("read_only", true)).unwrap();
        assert!(!base.is_required());
    }

    #[test]
    fn test_contradictory_options() {
        let both = Options::new().with("read_only", true).with("required", true);
        assert!(matches!(FieldBase::from_options(&both), Err(Error::Options(_))));

        let both = Options::new().with("required", true).with("default", 1);
        assert!(FieldBase::from_options(&both).is_err());

        let both = Options::new().with("read_only", true).with("write_only", true);
        assert!(FieldBase::from_options(&both).is_err());

        let wrong_type = Options::new().with("required", "yes");
        assert!(FieldBase::from_options(&wrong_type).is_err());
    }

    #[test]
    fn test_bind_derives_source() {
        let mut base = FieldBase::new();
        base.bind("first_name");
        assert_eq!(base.field_name(), Some("first_name"));
        assert_eq!(base.source(), Some("first_name"));
        assert_eq!(base.source_attrs(), ["first_name".to_string()]);
        assert_eq!(base.label().as_deref(), Some("First name"));

        let mut base = FieldBase::new();
        base.set_source("owner.name");
        base.bind("owner_name");
        assert_eq!(base.source_attrs(), ["owner".to_string(), "name".to_string()]);

        let mut base = FieldBase::new();
        base.set_source("*");
        base.bind("everything");
        assert!(base.source_attrs().is_empty());
    }

    #[test]
    fn test_clone_is_unbound() {
        let mut base = FieldBase::new();
        base.set_allow_null(true);
        base.bind("next");

        let copy = base.clone();
        assert_ne!(copy.id(), base.id());
        assert!(copy.allows_null());
        assert_eq!(copy.field_name(), None);
        assert!(copy.source_attrs().is_empty());
    }

    #[test]
    fn test_validate_empty_values() {
        let base = FieldBase::new();
        let err = base.validate_empty_values(Extracted::Missing).unwrap_err();
        assert_eq!(err.detail().unwrap().messages_at(""), vec!["This field is required."]);
        let err = base
            .validate_empty_values(Extracted::Present(Value::Null))
            .unwrap_err();
        assert_eq!(err.detail().unwrap().messages_at(""), vec!["This field may not be null."]);
        assert_eq!(
            base.validate_empty_values(Extracted::Present(json!("x"))).unwrap(),
            EmptyCheck::Proceed(json!("x"))
        );

        let mut optional = FieldBase::new();
        optional.set_required(false);
        optional.set_allow_null(true);
        assert_eq!(
            optional.validate_empty_values(Extracted::Missing).unwrap(),
            EmptyCheck::Done(None)
        );
        assert_eq!(
            optional.validate_empty_values(Extracted::Present(Value::Null)).unwrap(),
            EmptyCheck::Done(Some(Value::Null))
        );
    }

    #[test]
    fn test_get_value_and_attribute() {
        let mut base = FieldBase::new();
        base.bind("name");
        let input = data(json!({"name": "root"}));
        assert_eq!(base.get_value(&input), Extracted::Present(json!("root")));
        assert_eq!(base.get_value(&Data::new()), Extracted::Missing);

        assert_eq!(base.get_attribute(&json!({"name": "x"})).unwrap(), Some(json!("x")));
        assert!(matches!(
            base.get_attribute(&json!({})),
            Err(Error::MissingAttribute { .. })
        ));

        let mut optional = FieldBase::new();
        optional.set_required(false);
        optional.bind("children");
        assert_eq!(optional.get_attribute(&json!({})).unwrap(), None);

        let mut nullable = FieldBase::new();
        nullable.set_allow_null(true);
        nullable.bind("next");
        assert_eq!(nullable.get_attribute(&json!({})).unwrap(), Some(Value::Null));

        let mut omitted = FieldBase::new();
        omitted.set_allow_null(true);
        omitted.set_required(false);
        omitted.bind("children");
        assert_eq!(omitted.get_attribute(&json!({})).unwrap(), None);
    }

    #[test]
    fn test_set_value_nested() {
        let mut target = Data::new();
        set_value(&mut target, &["a".to_string(), "b".to_string()], json!(1));
        set_value(&mut target, &["c".to_string()], json!(2));
        set_value(&mut target, &[], json!({"d": 3}));
        assert_eq!(Value::Object(target), json!({"a": {"b": 1}, "c": 2, "d": 3}));
    }
}
