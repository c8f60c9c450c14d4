//! Attribute definitions.
//!
//! # Responsibility
//! - Hold one named field's validated configuration.
//! - Derive visibility/multiplicity predicates, labels, defaults and form
//!   input options from it.
//! - Expose configuration slices to validation, storage and delegation
//!   collaborators only when they apply.
//!
//! # Invariants
//! - An `Attribute` has no mutators; it may be shared between the registries
//!   of a type and its derived types.
//! - Exactly one of `with_accession_options` / `with_delegation_options`
//!   fires for a given attribute.
//! - `with_validation_options` is independent of the storage kind.

pub mod options;

use crate::accessor::{Accessor, Transform};
use crate::capability::LabelLookup;
use crate::error::ConfigurationError;
use crate::inflect::humanize;
use crate::model::ModelInstance;
use crate::value::{compact_values, deep_merge, OptionMap, Value};
use serde::Serialize;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

pub use options::{
    recognized_options, AttributeOptions, DatastreamDescriptor, DefaultFn, DefaultValue,
    IntoAttributeOptions, PersistenceTarget,
};

/// Form option key selecting the input renderer.
pub const FORM_AS: &str = "as";
/// Form option key for nested HTML attributes of the input.
pub const FORM_INPUT_HTML: &str = "input_html";
/// Renderer used for attributes holding several values.
pub const MULTI_VALUE_INPUT: &str = "multi_value";

/// Declaring model type as seen by its attributes.
#[derive(Clone)]
pub struct AttributeContext {
    model: String,
    labels: Rc<dyn LabelLookup>,
}

impl AttributeContext {
    pub fn new(model: impl Into<String>, labels: Rc<dyn LabelLookup>) -> Self {
        Self {
            model: model.into(),
            labels,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn labels(&self) -> &Rc<dyn LabelLookup> {
        &self.labels
    }
}

impl Debug for AttributeContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeContext")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// How an attribute's value is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKind {
    /// Stored directly on the instance.
    Virtual,
    /// Stored in a named backing store.
    Delegated(PersistenceTarget),
}

/// Options handed to the persistence-delegation capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegationOptions {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Vec<String>>,
    /// `true` for single-valued attributes.
    pub unique: bool,
}

impl DelegationOptions {
    /// Resolves delegation options for `target`.
    ///
    /// Multiplicity always wins over a `unique` flag carried by a descriptor.
    pub fn resolve(target: &PersistenceTarget, multiple: bool) -> Self {
        match target {
            PersistenceTarget::Named(name) => Self {
                target: name.clone(),
                location: None,
                unique: !multiple,
            },
            PersistenceTarget::Descriptor(descriptor) => Self {
                target: descriptor.target.clone(),
                location: descriptor.location.clone(),
                unique: !multiple,
            },
        }
    }
}

/// One registered attribute definition.
#[derive(Clone)]
pub struct Attribute {
    context: AttributeContext,
    name: String,
    storage: StorageKind,
    multiple: bool,
    displayable: bool,
    editable: bool,
    default: Option<DefaultValue>,
    validates: Option<Value>,
    form: OptionMap,
    writer: Option<Transform>,
    reader: Option<Transform>,
    label: Option<String>,
    hint: Option<String>,
}

impl Attribute {
    /// Builds an attribute definition for `name` in `context`.
    ///
    /// # Errors
    /// - `ConfigurationError::BlankName` when `name` is blank.
    /// - Any option parsing error from `options`.
    pub fn new(
        context: AttributeContext,
        name: &str,
        options: impl IntoAttributeOptions,
    ) -> Result<Self, ConfigurationError> {
        if name.trim().is_empty() {
            return Err(ConfigurationError::BlankName);
        }
        let options = options.into_attribute_options()?;

        Ok(Self {
            context,
            name: name.to_string(),
            storage: match options.datastream {
                Some(target) => StorageKind::Delegated(target),
                None => StorageKind::Virtual,
            },
            multiple: options.multiple.unwrap_or(false),
            displayable: options.displayable.unwrap_or(true),
            editable: options.editable.unwrap_or(true),
            default: options.default,
            validates: options.validates,
            form: options.form.unwrap_or_default(),
            writer: options.writer,
            reader: options.reader,
            label: options.label,
            hint: options.hint,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &AttributeContext {
        &self.context
    }

    pub fn storage(&self) -> &StorageKind {
        &self.storage
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.storage, StorageKind::Virtual)
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn is_displayable(&self) -> bool {
        self.displayable
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn validation_rules(&self) -> Option<&Value> {
        self.validates.as_ref()
    }

    /// Human label resolved through the declaring type's label lookup.
    ///
    /// The fallback is the explicit `label` option, else the humanized name.
    pub fn label(&self) -> String {
        let fallback = self
            .label
            .clone()
            .unwrap_or_else(|| humanize(&self.name));
        self.context
            .labels
            .human_attribute_name(&self.context.model, &self.name, &fallback)
    }

    /// Calls `f(name, rules)` when validation rules were declared.
    pub fn with_validation_options<R>(&self, f: impl FnOnce(&str, &Value) -> R) -> Option<R> {
        self.validates.as_ref().map(|rules| f(&self.name, rules))
    }

    /// Calls `f(name, {})` when the attribute is virtual.
    pub fn with_accession_options<R>(&self, f: impl FnOnce(&str, &OptionMap) -> R) -> Option<R> {
        match self.storage {
            StorageKind::Virtual => Some(f(&self.name, &OptionMap::new())),
            StorageKind::Delegated(_) => None,
        }
    }

    /// Calls `f(name, delegation_options)` when the attribute is delegated.
    pub fn with_delegation_options<R>(
        &self,
        f: impl FnOnce(&str, &DelegationOptions) -> R,
    ) -> Option<R> {
        self.delegation_options()
            .map(|options| f(&self.name, &options))
    }

    pub fn delegation_options(&self) -> Option<DelegationOptions> {
        match &self.storage {
            StorageKind::Virtual => None,
            StorageKind::Delegated(target) => {
                Some(DelegationOptions::resolve(target, self.multiple))
            }
        }
    }

    /// Builds form-builder options for this attribute.
    ///
    /// Starts from the declared `form` map, fills `hint`/`label` when unset,
    /// switches multi-valued attributes to the multi-value renderer, then
    /// deep-merges `overrides` (overrides win on every leaf).
    pub fn options_for_input(&self, overrides: &OptionMap) -> OptionMap {
        let mut input = self.form.clone();
        if let Some(hint) = &self.hint {
            input
                .entry("hint")
                .or_insert_with(|| Value::String(hint.clone()));
        }
        if let Some(label) = &self.label {
            input
                .entry("label")
                .or_insert_with(|| Value::String(label.clone()));
        }
        if self.multiple {
            input.insert(
                FORM_AS.to_string(),
                Value::String(MULTI_VALUE_INPUT.to_string()),
            );
            let html = input
                .entry(FORM_INPUT_HTML)
                .or_insert_with(|| Value::Object(OptionMap::new()));
            if !html.is_object() {
                *html = Value::Object(OptionMap::new());
            }
            if let Value::Object(html) = html {
                html.insert("multiple".to_string(), Value::String("multiple".to_string()));
            }
        }
        deep_merge(input, overrides)
    }

    /// Resolves the default value for `instance`.
    ///
    /// Computed defaults run on every call. Literal defaults are cloned, so
    /// instances never share one mutable default. Absent defaults are `null`.
    pub fn default_value(&self, instance: &ModelInstance) -> Value {
        match &self.default {
            Some(DefaultValue::Computed(f)) => f(instance),
            Some(DefaultValue::Literal(value)) => value.clone(),
            None => Value::Null,
        }
    }

    /// Writer transform applied around the installed write accessor.
    ///
    /// An explicit `writer` wins; otherwise multi-valued attributes compact
    /// incoming values (flatten, drop blanks).
    pub fn writer_transform(&self) -> Option<Transform> {
        match (&self.writer, self.multiple) {
            (Some(writer), _) => Some(writer.clone()),
            (None, true) => Some(Transform::callable(|_, value| Ok(compact_values(value)))),
            (None, false) => None,
        }
    }

    pub fn reader_transform(&self) -> Option<Transform> {
        self.reader.clone()
    }

    /// Wraps `accessor` with this attribute's writer transform, if any.
    pub fn wrap_writer(&self, accessor: Accessor) -> Accessor {
        match self.writer_transform() {
            Some(transform) => accessor.wrap_writer(transform),
            None => accessor,
        }
    }

    /// Wraps `accessor` with this attribute's reader transform, if any.
    pub fn wrap_reader(&self, accessor: Accessor) -> Accessor {
        match self.reader_transform() {
            Some(transform) => accessor.wrap_reader(transform),
            None => accessor,
        }
    }
}

impl Debug for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("model", &self.context.model)
            .field("name", &self.name)
            .field("storage", &self.storage)
            .field("multiple", &self.multiple)
            .field("displayable", &self.displayable)
            .field("editable", &self.editable)
            .field("default", &self.default)
            .field("validates", &self.validates)
            .field("form", &self.form)
            .field("writer", &self.writer)
            .field("reader", &self.reader)
            .field("label", &self.label)
            .field("hint", &self.hint)
            .finish()
    }
}
