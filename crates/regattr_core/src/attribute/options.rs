//! Attribute option declaration and validation.
//!
//! # Responsibility
//! - Hold the recognized configuration keys for one attribute.
//! - Parse declarative JSON option objects, rejecting unknown keys.
//!
//! # Invariants
//! - Only keys listed in `recognized_options()` can be set.
//! - A JSON `null` for any key is the same as leaving the key out.

use crate::accessor::Transform;
use crate::error::{AccessError, ConfigurationError};
use crate::model::ModelInstance;
use crate::value::{OptionMap, Value};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

pub const OPTION_DEFAULT: &str = "default";
pub const OPTION_DISPLAYABLE: &str = "displayable";
pub const OPTION_EDITABLE: &str = "editable";
pub const OPTION_FORM: &str = "form";
pub const OPTION_DATASTREAM: &str = "datastream";
pub const OPTION_VALIDATES: &str = "validates";
pub const OPTION_MULTIPLE: &str = "multiple";
pub const OPTION_WRITER: &str = "writer";
pub const OPTION_READER: &str = "reader";
pub const OPTION_LABEL: &str = "label";
pub const OPTION_HINT: &str = "hint";

const RECOGNIZED_OPTIONS: &[&str] = &[
    OPTION_DEFAULT,
    OPTION_DISPLAYABLE,
    OPTION_EDITABLE,
    OPTION_FORM,
    OPTION_DATASTREAM,
    OPTION_VALIDATES,
    OPTION_MULTIPLE,
    OPTION_WRITER,
    OPTION_READER,
    OPTION_LABEL,
    OPTION_HINT,
];

/// Returns every option key an attribute declaration may use.
pub fn recognized_options() -> &'static [&'static str] {
    RECOGNIZED_OPTIONS
}

/// Structured persistence target: a named store plus an optional location
/// inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatastreamDescriptor {
    #[serde(alias = "to")]
    pub target: String,
    #[serde(default, alias = "at", skip_serializing_if = "Option::is_none")]
    pub location: Option<Vec<String>>,
    #[serde(default)]
    pub unique: bool,
}

/// Where a delegated attribute persists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceTarget {
    /// Bare store identifier, e.g. `"properties"`.
    Named(String),
    Descriptor(DatastreamDescriptor),
}

/// Computed default, evaluated against the instance being initialized.
pub type DefaultFn = Rc<dyn Fn(&ModelInstance) -> Value>;

/// Default value specification.
#[derive(Clone)]
pub enum DefaultValue {
    /// Cloned for every instance.
    Literal(Value),
    Computed(DefaultFn),
}

impl Debug for DefaultValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "DefaultValue::Literal({value})"),
            Self::Computed(_) => f.write_str("DefaultValue::Computed(..)"),
        }
    }
}

/// Options for one attribute declaration.
///
/// Built either through the typed builder methods or from a JSON object via
/// [`AttributeOptions::from_json`]. Closures (computed defaults, callable
/// transforms) are only reachable through the builder.
#[derive(Debug, Clone, Default)]
pub struct AttributeOptions {
    pub(crate) default: Option<DefaultValue>,
    pub(crate) displayable: Option<bool>,
    pub(crate) editable: Option<bool>,
    pub(crate) form: Option<OptionMap>,
    pub(crate) datastream: Option<PersistenceTarget>,
    pub(crate) validates: Option<Value>,
    pub(crate) multiple: Option<bool>,
    pub(crate) writer: Option<Transform>,
    pub(crate) reader: Option<Transform>,
    pub(crate) label: Option<String>,
    pub(crate) hint: Option<String>,
}

impl AttributeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a declarative options object.
    ///
    /// # Errors
    /// - `OptionsNotAnObject` when `value` is not a JSON object (`null` is
    ///   accepted as "no options").
    /// - `UnknownOption` for the first key outside `recognized_options()`.
    /// - `InvalidOption` / `InvalidDescriptor` for values of the wrong shape.
    pub fn from_json(value: Value) -> Result<Self, ConfigurationError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(entries) => entries
                .into_iter()
                .try_fold(Self::default(), |options, (key, value)| options.set(&key, value)),
            _ => Err(ConfigurationError::OptionsNotAnObject),
        }
    }

    /// Sets one option by key.
    pub fn set(mut self, key: &str, value: Value) -> Result<Self, ConfigurationError> {
        match key {
            OPTION_DEFAULT => {
                self.default = (!value.is_null()).then_some(DefaultValue::Literal(value));
            }
            OPTION_DISPLAYABLE => self.displayable = optional_bool(OPTION_DISPLAYABLE, value)?,
            OPTION_EDITABLE => self.editable = optional_bool(OPTION_EDITABLE, value)?,
            OPTION_MULTIPLE => self.multiple = optional_bool(OPTION_MULTIPLE, value)?,
            OPTION_FORM => {
                self.form = match value {
                    Value::Null => None,
                    Value::Object(entries) => Some(entries),
                    _ => {
                        return Err(ConfigurationError::InvalidOption {
                            key: OPTION_FORM,
                            expected: "an object",
                        })
                    }
                };
            }
            OPTION_DATASTREAM => self.datastream = parse_datastream(value)?,
            OPTION_VALIDATES => {
                self.validates = match value {
                    Value::Null | Value::Bool(false) => None,
                    other => Some(other),
                };
            }
            OPTION_WRITER => self.writer = optional_method(OPTION_WRITER, value)?,
            OPTION_READER => self.reader = optional_method(OPTION_READER, value)?,
            OPTION_LABEL => self.label = optional_string(OPTION_LABEL, value)?,
            OPTION_HINT => self.hint = optional_string(OPTION_HINT, value)?,
            other => return Err(ConfigurationError::UnknownOption(other.to_string())),
        }
        Ok(self)
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(DefaultValue::Literal(value));
        self
    }

    /// Computed default; runs once per instance with the instance as context.
    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&ModelInstance) -> Value + 'static,
    {
        self.default = Some(DefaultValue::Computed(Rc::new(f)));
        self
    }

    pub fn displayable(mut self, displayable: bool) -> Self {
        self.displayable = Some(displayable);
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = Some(editable);
        self
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = Some(multiple);
        self
    }

    pub fn form(mut self, form: OptionMap) -> Self {
        self.form = Some(form);
        self
    }

    /// Delegates the attribute to the named store.
    pub fn datastream(mut self, target: impl Into<String>) -> Self {
        self.datastream = Some(PersistenceTarget::Named(target.into()));
        self
    }

    pub fn datastream_descriptor(mut self, descriptor: DatastreamDescriptor) -> Self {
        self.datastream = Some(PersistenceTarget::Descriptor(descriptor));
        self
    }

    pub fn validates(mut self, rules: Value) -> Self {
        self.validates = Some(rules);
        self
    }

    pub fn writer(mut self, transform: Transform) -> Self {
        self.writer = Some(transform);
        self
    }

    pub fn writer_fn<F>(self, f: F) -> Self
    where
        F: Fn(&ModelInstance, Value) -> Result<Value, AccessError> + 'static,
    {
        self.writer(Transform::callable(f))
    }

    pub fn reader(mut self, transform: Transform) -> Self {
        self.reader = Some(transform);
        self
    }

    pub fn reader_fn<F>(self, f: F) -> Self
    where
        F: Fn(&ModelInstance, Value) -> Result<Value, AccessError> + 'static,
    {
        self.reader(Transform::callable(f))
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Conversion accepted by attribute declaration entry points.
pub trait IntoAttributeOptions {
    fn into_attribute_options(self) -> Result<AttributeOptions, ConfigurationError>;
}

impl IntoAttributeOptions for AttributeOptions {
    fn into_attribute_options(self) -> Result<AttributeOptions, ConfigurationError> {
        Ok(self)
    }
}

impl IntoAttributeOptions for Value {
    fn into_attribute_options(self) -> Result<AttributeOptions, ConfigurationError> {
        AttributeOptions::from_json(self)
    }
}

impl IntoAttributeOptions for OptionMap {
    fn into_attribute_options(self) -> Result<AttributeOptions, ConfigurationError> {
        AttributeOptions::from_json(Value::Object(self))
    }
}

fn optional_bool(key: &'static str, value: Value) -> Result<Option<bool>, ConfigurationError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(flag) => Ok(Some(flag)),
        _ => Err(ConfigurationError::InvalidOption {
            key,
            expected: "a boolean",
        }),
    }
}

fn optional_string(key: &'static str, value: Value) -> Result<Option<String>, ConfigurationError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        _ => Err(ConfigurationError::InvalidOption {
            key,
            expected: "a string",
        }),
    }
}

fn optional_method(key: &'static str, value: Value) -> Result<Option<Transform>, ConfigurationError> {
    match value {
        Value::Null => Ok(None),
        Value::String(name) if !name.trim().is_empty() => {
            Ok(Some(Transform::Method(name.trim().to_string())))
        }
        _ => Err(ConfigurationError::InvalidOption {
            key,
            expected: "a method name",
        }),
    }
}

fn parse_datastream(value: Value) -> Result<Option<PersistenceTarget>, ConfigurationError> {
    match value {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::String(target) => {
            let target = target.trim();
            if target.is_empty() {
                return Err(ConfigurationError::InvalidDescriptor(
                    "datastream name must not be blank".to_string(),
                ));
            }
            Ok(Some(PersistenceTarget::Named(target.to_string())))
        }
        Value::Object(_) => {
            let descriptor: DatastreamDescriptor = serde_json::from_value(value)
                .map_err(|err| ConfigurationError::InvalidDescriptor(err.to_string()))?;
            if descriptor.target.trim().is_empty() {
                return Err(ConfigurationError::InvalidDescriptor(
                    "datastream target must not be blank".to_string(),
                ));
            }
            Ok(Some(PersistenceTarget::Descriptor(descriptor)))
        }
        _ => Err(ConfigurationError::InvalidOption {
            key: OPTION_DATASTREAM,
            expected: "a store name or descriptor object",
        }),
    }
}
