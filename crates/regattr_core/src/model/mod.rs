//! Declarative model types.
//!
//! # Responsibility
//! - Own each model type's attribute registry and accessor table.
//! - Turn `attribute(name, options)` declarations into registered
//!   definitions plus wired validation, storage and transforms.
//! - Build instances and apply registered defaults.
//!
//! # Invariants
//! - A derived type shares its parent's registry contents until its own
//!   registry is first touched; from then on the two are independent.
//! - Declarations on a derived type never change its ancestors.
//! - A failed declaration leaves the registry, accessor table and
//!   validation rules untouched.
//! - Defaults are applied once per instance, never to persisted instances.
//!
//! # See also
//! - `registry::AttributeRegistry` for ordering and fallback rules.

mod instance;

pub use instance::ModelInstance;

use crate::accessor::{Accessor, Transform, TransformFn};
use crate::attribute::{
    Attribute, AttributeContext, DelegationOptions, IntoAttributeOptions, StorageKind,
};
use crate::capability::{Capabilities, Errors, LabelLookup};
use crate::error::{AccessError, ConfigurationError};
use crate::registry::AttributeRegistry;
use crate::value::{OptionMap, Value};
use indexmap::IndexMap;
use log::{debug, info, warn};
use once_cell::unsync::OnceCell;
use std::cell::{Cell, Ref, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// When registered defaults are written during instance construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultPolicy {
    /// Skip attributes already assigned while the instance was initialized.
    #[default]
    WhenUnset,
    /// Write every non-null default, replacing values assigned during
    /// initialization.
    Overwrite,
}

/// Type descriptor for one kind of model.
pub struct ModelType {
    name: String,
    parent: Option<Rc<ModelType>>,
    registry: OnceCell<RefCell<AttributeRegistry>>,
    capabilities: RefCell<Capabilities>,
    accessors: RefCell<IndexMap<String, Accessor>>,
    methods: RefCell<IndexMap<String, TransformFn>>,
    default_policy: Cell<DefaultPolicy>,
}

impl ModelType {
    /// Creates a root model type with the reference capabilities.
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Self::with_capabilities(name, Capabilities::default())
    }

    pub fn with_capabilities(name: impl Into<String>, capabilities: Capabilities) -> Rc<Self> {
        Rc::new(Self::build_type(name.into(), None, capabilities, DefaultPolicy::default()))
    }

    /// Creates a type derived from `parent`.
    ///
    /// The derived type starts with reference capabilities but keeps the
    /// parent's label lookup and default policy.
    pub fn derive(parent: &Rc<ModelType>, name: impl Into<String>) -> Rc<Self> {
        let capabilities = Capabilities::default().with_shared_labels(parent.labels());
        Self::derive_with(parent, name, capabilities)
    }

    pub fn derive_with(
        parent: &Rc<ModelType>,
        name: impl Into<String>,
        capabilities: Capabilities,
    ) -> Rc<Self> {
        Rc::new(Self::build_type(
            name.into(),
            Some(Rc::clone(parent)),
            capabilities,
            parent.default_policy(),
        ))
    }

    fn build_type(
        name: String,
        parent: Option<Rc<ModelType>>,
        capabilities: Capabilities,
        default_policy: DefaultPolicy,
    ) -> Self {
        Self {
            name,
            parent,
            registry: OnceCell::new(),
            capabilities: RefCell::new(capabilities),
            accessors: RefCell::new(IndexMap::new()),
            methods: RefCell::new(IndexMap::new()),
            default_policy: Cell::new(default_policy),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Rc<ModelType>> {
        self.parent.as_ref()
    }

    /// Whether `self` is `other` or derives from it.
    pub fn is_kind_of(&self, other: &ModelType) -> bool {
        std::ptr::eq(self, other)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.is_kind_of(other))
    }

    pub fn labels(&self) -> Rc<dyn LabelLookup> {
        Rc::clone(&self.capabilities.borrow().labels)
    }

    pub fn default_policy(&self) -> DefaultPolicy {
        self.default_policy.get()
    }

    pub fn set_default_policy(&self, policy: DefaultPolicy) {
        self.default_policy.set(policy);
    }

    /// This type's registry, created (or copied from the parent) on first
    /// access.
    pub fn registry(&self) -> Ref<'_, AttributeRegistry> {
        self.registry_cell().borrow()
    }

    fn registry_cell(&self) -> &RefCell<AttributeRegistry> {
        self.registry.get_or_init(|| {
            let context = AttributeContext::new(self.name.clone(), self.labels());
            let registry = match &self.parent {
                Some(parent) => parent.registry().copy_to(context),
                None => AttributeRegistry::new(context),
            };
            debug!(
                "event=registry_created module=model model={} inherited={}",
                self.name,
                self.parent.is_some()
            );
            RefCell::new(registry)
        })
    }

    /// Declares an attribute on this type.
    ///
    /// Registers the definition, then wires in order: virtual or delegated
    /// storage, the writer wrap, the reader wrap and finally validation
    /// rules. The accessor is committed only after every step succeeded.
    ///
    /// # Errors
    /// - `ConfigurationError` from option parsing or from any capability;
    ///   nothing is registered or installed in that case.
    pub fn attribute(
        &self,
        name: &str,
        options: impl IntoAttributeOptions,
    ) -> Result<Rc<Attribute>, ConfigurationError> {
        let mut installed = None;
        let result = {
            let mut registry = self.registry_cell().borrow_mut();
            let mut capabilities = self.capabilities.borrow_mut();
            registry.register(name, options, |attribute| {
                installed = Some(wire_attribute(attribute, &mut capabilities)?);
                Ok(())
            })
        };

        match result {
            Ok(attribute) => {
                if let Some(accessor) = installed {
                    self.accessors
                        .borrow_mut()
                        .insert(attribute.name().to_string(), accessor);
                }
                info!(
                    "event=attribute_declared module=model status=ok model={} attribute={} virtual={} multiple={}",
                    self.name,
                    attribute.name(),
                    attribute.is_virtual(),
                    attribute.is_multiple()
                );
                Ok(attribute)
            }
            Err(err) => {
                warn!(
                    "event=attribute_declared module=model status=error model={} attribute={} error={}",
                    self.name, name, err
                );
                Err(err)
            }
        }
    }

    /// Declares every `name -> options` entry of a JSON object, in order.
    ///
    /// Stops at the first failing declaration; earlier ones stay registered.
    pub fn attributes_from_json(&self, schema: Value) -> Result<Vec<Rc<Attribute>>, ConfigurationError> {
        let Value::Object(entries) = schema else {
            return Err(ConfigurationError::OptionsNotAnObject);
        };
        entries
            .into_iter()
            .map(|(name, options)| self.attribute(&name, options))
            .collect()
    }

    /// Defines an instance method usable as a `Transform::Method` target.
    pub fn define_method<F>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(&ModelInstance, Value) -> Result<Value, AccessError> + 'static,
    {
        self.methods.borrow_mut().insert(name.into(), Rc::new(f));
    }

    /// Resolves an instance method on this type or its ancestors.
    pub fn method(&self, name: &str) -> Option<TransformFn> {
        if let Some(method) = self.methods.borrow().get(name) {
            return Some(Rc::clone(method));
        }
        self.parent.as_ref().and_then(|parent| parent.method(name))
    }

    /// Resolves the accessor for `name` on this type or its ancestors.
    pub fn accessor(&self, name: &str) -> Option<Accessor> {
        if let Some(accessor) = self.accessors.borrow().get(name) {
            return Some(accessor.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.accessor(name))
    }

    /// Layers another writer transform over the accessor for `name`.
    pub fn wrap_writer(&self, name: &str, transform: Transform) -> Result<(), AccessError> {
        let accessor = self.require_accessor(name)?;
        self.accessors
            .borrow_mut()
            .insert(name.to_string(), accessor.wrap_writer(transform));
        Ok(())
    }

    /// Layers another reader transform over the accessor for `name`.
    pub fn wrap_reader(&self, name: &str, transform: Transform) -> Result<(), AccessError> {
        let accessor = self.require_accessor(name)?;
        self.accessors
            .borrow_mut()
            .insert(name.to_string(), accessor.wrap_reader(transform));
        Ok(())
    }

    fn require_accessor(&self, name: &str) -> Result<Accessor, AccessError> {
        self.accessor(name).ok_or_else(|| AccessError::UnknownAttribute {
            model: self.name.clone(),
            attribute: name.to_string(),
        })
    }

    pub fn registered_attribute_names(&self) -> Vec<String> {
        self.registry().names().map(str::to_string).collect()
    }

    pub fn editable_attributes(&self) -> Vec<Rc<Attribute>> {
        self.registry().editable_attributes().to_vec()
    }

    pub fn displayable_attributes(&self) -> Vec<Rc<Attribute>> {
        self.registry().displayable_attributes().to_vec()
    }

    pub fn terms_for_editing(&self) -> Vec<String> {
        names_of(self.registry().editable_attributes())
    }

    pub fn terms_for_display(&self) -> Vec<String> {
        names_of(self.registry().displayable_attributes())
    }

    /// Defaults evaluated against a blank, not yet defaulted instance.
    pub fn attribute_defaults(self: &Rc<Self>) -> IndexMap<String, Value> {
        let blank = ModelInstance::blank(Rc::clone(self));
        self.registry().attribute_defaults(&blank)
    }

    pub fn input_options_for(&self, name: &str, overrides: &OptionMap) -> OptionMap {
        self.registry().input_options_for(name, overrides)
    }

    pub fn label_for(&self, name: &str) -> String {
        self.registry().label_for(name)
    }

    /// Builds an instance with no explicit assignments.
    pub fn new_instance(self: &Rc<Self>) -> Result<ModelInstance, AccessError> {
        self.build_with(|_| Ok(()))
    }

    /// Builds an instance, assigning `assignments` through the accessors
    /// before defaults are applied.
    pub fn build<I, K>(self: &Rc<Self>, assignments: I) -> Result<ModelInstance, AccessError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        self.build_with(|instance| {
            assignments
                .into_iter()
                .try_for_each(|(name, value)| instance.write(name.as_ref(), value))
        })
    }

    /// Rebuilds a persisted instance from stored values; defaults are not
    /// applied.
    pub fn load<I, K>(self: &Rc<Self>, assignments: I) -> Result<ModelInstance, AccessError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        self.build_with(|instance| {
            instance.mark_persisted();
            assignments
                .into_iter()
                .try_for_each(|(name, value)| instance.write(name.as_ref(), value))
        })
    }

    /// Builds an instance, running `init` as the base initializer and then
    /// applying registered defaults.
    ///
    /// # Errors
    /// - Errors from `init`.
    /// - The first error raised while writing a default; defaults written
    ///   before it are not rolled back.
    pub fn build_with<F>(self: &Rc<Self>, init: F) -> Result<ModelInstance, AccessError>
    where
        F: FnOnce(&mut ModelInstance) -> Result<(), AccessError>,
    {
        let mut instance = ModelInstance::blank(Rc::clone(self));
        init(&mut instance)?;
        self.apply_defaults(&mut instance)?;
        Ok(instance)
    }

    fn apply_defaults(&self, instance: &mut ModelInstance) -> Result<(), AccessError> {
        let defaults = self.registry().attribute_defaults(instance);
        let policy = self.default_policy();
        let mut applied = 0usize;
        for (name, value) in defaults {
            if value.is_null() || instance.is_persisted() {
                continue;
            }
            if policy == DefaultPolicy::WhenUnset && instance.was_assigned(&name) {
                continue;
            }
            instance.write(&name, value)?;
            applied += 1;
        }
        debug!(
            "event=defaults_applied module=model model={} policy={:?} applied={}",
            self.name, policy, applied
        );
        Ok(())
    }

    /// Runs ancestor validations first, then this type's.
    pub fn validate(&self, instance: &ModelInstance, errors: &mut Errors) {
        if let Some(parent) = &self.parent {
            parent.validate(instance, errors);
        }
        self.capabilities
            .borrow()
            .validations
            .validate(instance, errors);
    }
}

impl Debug for ModelType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelType")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|parent| parent.name()))
            .field("default_policy", &self.default_policy.get())
            .finish_non_exhaustive()
    }
}

fn wire_attribute(
    attribute: &Attribute,
    capabilities: &mut Capabilities,
) -> Result<Accessor, ConfigurationError> {
    let accessor = match attribute.storage() {
        StorageKind::Virtual => capabilities
            .virtual_storage
            .install_virtual_accessor(attribute.name(), &OptionMap::new()),
        StorageKind::Delegated(target) => {
            let options = DelegationOptions::resolve(target, attribute.is_multiple());
            capabilities
                .delegation
                .install_delegated_accessor(attribute.name(), &options)?
        }
    };
    let accessor = attribute.wrap_reader(attribute.wrap_writer(accessor));

    // Last fallible step: rules are stored only once storage is in place.
    attribute
        .with_validation_options(|name, rules| {
            capabilities.validations.register_validation(name, rules)
        })
        .transpose()?;

    Ok(accessor)
}

fn names_of(attributes: &[Rc<Attribute>]) -> Vec<String> {
    attributes
        .iter()
        .map(|attribute| attribute.name().to_string())
        .collect()
}
