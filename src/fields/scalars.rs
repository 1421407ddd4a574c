//! Terminal scalar fields

use serde_json::Value;

use super::base::{base_builders, EmptyCheck, FieldBase, BASE_OPTIONS};
use super::{json_type, Data, Extracted, Field, NodeId, Parent};
use crate::error::{Error, Result};
use crate::options::Options;

/// Implements [`Field`] for a scalar type providing `to_internal_value`,
/// `represent` and `blank_initial`.
macro_rules! scalar_field {
    ($ty:ident) => {
        impl Field for $ty {
            fn base(&self) -> Result<&FieldBase> {
                Ok(&self.base)
            }

            fn node_id(&self) -> NodeId {
                self.base.id()
            }

            fn bind(&mut self, field_name: &str, _parent: &Parent) {
                self.base.bind(field_name);
            }

            fn get_value(&self, data: &Data) -> Result<Extracted> {
                Ok(self.base.get_value(data))
            }

            fn get_initial(&self) -> Result<Value> {
                Ok(self
                    .base
                    .initial()
                    .cloned()
                    .unwrap_or_else(|| self.blank_initial()))
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

            fn to_representation(&self, value: &Value) -> Result<Value> {
                self.represent(value)
            }

            fn boxed_clone(&self) -> Box<dyn Field> {
                Box::new(self.clone())
            }

            fn type_name(&self) -> &'static str {
                stringify!($ty)
            }
        }
    };
}

/// Text field
#[derive(Debug, Clone)]
pub struct CharField {
    base: FieldBase,
    max_length: Option<usize>,
    min_length: Option<usize>,
    allow_blank: bool,
    trim_whitespace: bool,
}

impl Default for CharField {
    fn default() -> Self {
        Self::new()
    }
}

impl CharField {
    /// Options accepted besides the base options
    pub const OPTIONS: &'static [&'static str] =
        &["max_length", "min_length", "allow_blank", "trim_whitespace"];

    /// Create a text field with default options
    pub fn new() -> Self {
        Self {
            base: FieldBase::new(),
            max_length: None,
            min_length: None,
            allow_blank: false,
            trim_whitespace: true,
        }
    }

    /// Build from keyword options
    pub fn from_options(options: &Options) -> Result<Self> {
        options.ensure_only(&[BASE_OPTIONS, Self::OPTIONS].concat(), "CharField")?;
        Ok(Self {
            base: FieldBase::from_options(options)?,
            max_length: options.get_usize("max_length")?,
            min_length: options.get_usize("min_length")?,
            allow_blank: options.get_bool("allow_blank")?.unwrap_or(false),
            trim_whitespace: options.get_bool("trim_whitespace")?.unwrap_or(true),
        })
    }

    /// Registry constructor
    pub fn construct(options: &Options) -> Result<Box<dyn Field>> {
        Ok(Box::new(Self::from_options(options)?))
    }

    base_builders!();

    /// Set the maximum number of characters
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Set the minimum number of characters
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    /// Accept the empty string
    pub fn with_allow_blank(mut self, allow_blank: bool) -> Self {
        self.allow_blank = allow_blank;
        self
    }

    /// Maximum number of characters
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    fn to_internal_value(&self, value: Value) -> Result<Value> {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => return Err(Error::invalid("Not a valid string.")),
        };
        let text = if self.trim_whitespace {
            text.trim().to_string()
        } else {
            text
        };

        if text.is_empty() {
            return if self.allow_blank {
                Ok(Value::String(text))
            } else {
                Err(Error::invalid("This field may not be blank."))
            };
        }

        let length = text.chars().count();
        if let Some(max) = self.max_length {
            if length > max {
                return Err(Error::invalid(format!(
                    "Ensure this field has no more than {} characters.",
                    max
                )));
            }
        }
        if let Some(min) = self.min_length {
            if length < min {
                return Err(Error::invalid(format!(
                    "Ensure this field has at least {} characters.",
                    min
                )));
            }
        }
        Ok(Value::String(text))
    }

    fn represent(&self, value: &Value) -> Result<Value> {
        Ok(match value {
            Value::String(_) => value.clone(),
            other => Value::String(other.to_string()),
        })
    }

    fn blank_initial(&self) -> Value {
        Value::String(String::new())
    }
}

scalar_field!(CharField);

/// Integer field
#[derive(Debug, Clone, Default)]
pub struct IntegerField {
    base: FieldBase,
    max_value: Option<i64>,
    min_value: Option<i64>,
}

impl IntegerField {
    /// Options accepted besides the base options
    pub const OPTIONS: &'static [&'static str] = &["max_value", "min_value"];

    /// Create an integer field with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from keyword options
    pub fn from_options(options: &Options) -> Result<Self> {
        options.ensure_only(&[BASE_OPTIONS, Self::OPTIONS].concat(), "IntegerField")?;
        Ok(Self {
            base: FieldBase::from_options(options)?,
            max_value: options.get_i64("max_value")?,
            min_value: options.get_i64("min_value")?,
        })
    }

    /// Registry constructor
    pub fn construct(options: &Options) -> Result<Box<dyn Field>> {
        Ok(Box::new(Self::from_options(options)?))
    }

    base_builders!();

    /// Set the largest accepted value
    pub fn with_max_value(mut self, max_value: i64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    /// Set the smallest accepted value
    pub fn with_min_value(mut self, min_value: i64) -> Self {
        self.min_value = Some(min_value);
        self
    }

    fn to_internal_value(&self, value: Value) -> Result<Value> {
        let number = parse_integer(&value)
            .ok_or_else(|| Error::invalid("A valid integer is required."))?;
        if let Some(max) = self.max_value {
            if number > max {
                return Err(Error::invalid(format!(
                    "Ensure this value is less than or equal to {}.",
                    max
                )));
            }
        }
        if let Some(min) = self.min_value {
            if number < min {
                return Err(Error::invalid(format!(
                    "Ensure this value is greater than or equal to {}.",
                    min
                )));
            }
        }
        Ok(Value::from(number))
    }

    fn represent(&self, value: &Value) -> Result<Value> {
        parse_integer(value).map(Value::from).ok_or_else(|| {
            Error::invalid(format!("Expected an integer, got {}.", json_type(value)))
        })
    }

    fn blank_initial(&self) -> Value {
        Value::Null
    }
}

scalar_field!(IntegerField);

fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let trimmed = s.trim();
            let digits = match trimmed.split_once('.') {
                Some((whole, fraction)) if fraction.chars().all(|c| c == '0') => whole,
                Some(_) => return None,
                None => trimmed,
            };
            digits.parse().ok()
        }
        _ => None,
    }
}

/// Boolean field
#[derive(Debug, Clone, Default)]
pub struct BooleanField {
    base: FieldBase,
}

const TRUE_VALUES: &[&str] = &["t", "y", "yes", "true", "on", "1"];
const FALSE_VALUES: &[&str] = &["f", "n", "no", "false", "off", "0"];

impl BooleanField {
    /// Create a boolean field with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from keyword options
    pub fn from_options(options: &Options) -> Result<Self> {
        options.ensure_only(BASE_OPTIONS, "BooleanField")?;
        Ok(Self {
            base: FieldBase::from_options(options)?,
        })
    }

    /// Registry constructor
    pub fn construct(options: &Options) -> Result<Box<dyn Field>> {
        Ok(Box::new(Self::from_options(options)?))
    }

    base_builders!();

    fn to_internal_value(&self, value: Value) -> Result<Value> {
        parse_bool(&value)
            .map(Value::Bool)
            .ok_or_else(|| Error::invalid("Must be a valid boolean."))
    }

    fn represent(&self, value: &Value) -> Result<Value> {
        parse_bool(value).map(Value::Bool).ok_or_else(|| {
            Error::invalid(format!("Expected a boolean, got {}.", json_type(value)))
        })
    }

    fn blank_initial(&self) -> Value {
        Value::Bool(false)
    }
}

scalar_field!(BooleanField);

fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => {
            let lowered = s.to_lowercase();
            if TRUE_VALUES.contains(&lowered.as_str()) {
                Some(true)
            } else if FALSE_VALUES.contains(&lowered.as_str()) {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}
