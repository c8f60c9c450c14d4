//! Ordered attribute registry for one model type.
//!
//! # Responsibility
//! - Store attribute definitions by name in declaration order.
//! - Answer classification queries (editable, displayable), defaults,
//!   input options and labels.
//! - Produce independent copies for derived model types.
//!
//! # Invariants
//! - Query results follow declaration order. Re-registering a name replaces
//!   the definition in its original position.
//! - A failed registration leaves the registry exactly as it was.
//! - Classification caches are rebuilt after every registration.
//! - Copies share `Attribute` definitions; definitions are immutable, so
//!   sharing cannot leak changes across a type hierarchy.
//! - Labels resolve against the type that declared the attribute, so an
//!   inherited attribute keeps its parent's label.

use crate::attribute::{Attribute, AttributeContext, IntoAttributeOptions};
use crate::error::ConfigurationError;
use crate::inflect::titleize;
use crate::model::ModelInstance;
use crate::value::{OptionMap, Value};
use indexmap::IndexMap;
use log::debug;
use once_cell::unsync::OnceCell;
use std::rc::Rc;

/// Attribute definitions registered on one model type.
#[derive(Debug)]
pub struct AttributeRegistry {
    context: AttributeContext,
    entries: IndexMap<String, Rc<Attribute>>,
    editable: OnceCell<Vec<Rc<Attribute>>>,
    displayable: OnceCell<Vec<Rc<Attribute>>>,
}

impl AttributeRegistry {
    pub fn new(context: AttributeContext) -> Self {
        Self::with_entries(context, IndexMap::new())
    }

    fn with_entries(context: AttributeContext, entries: IndexMap<String, Rc<Attribute>>) -> Self {
        Self {
            context,
            entries,
            editable: OnceCell::new(),
            displayable: OnceCell::new(),
        }
    }

    pub fn context(&self) -> &AttributeContext {
        &self.context
    }

    /// Registers an attribute without extra wiring.
    pub fn define(
        &mut self,
        name: &str,
        options: impl IntoAttributeOptions,
    ) -> Result<Rc<Attribute>, ConfigurationError> {
        self.register(name, options, |_| Ok(()))
    }

    /// Builds and stores an attribute, then runs `configurator` on it.
    ///
    /// # Errors
    /// - Option errors from `Attribute::new`.
    /// - Any error returned by `configurator`; the previous definition for
    ///   `name` (if any) is restored in place.
    pub fn register<F>(
        &mut self,
        name: &str,
        options: impl IntoAttributeOptions,
        configurator: F,
    ) -> Result<Rc<Attribute>, ConfigurationError>
    where
        F: FnOnce(&Attribute) -> Result<(), ConfigurationError>,
    {
        let attribute = Rc::new(Attribute::new(self.context.clone(), name, options)?);
        let key = attribute.name().to_string();
        let previous = self.entries.insert(key.clone(), Rc::clone(&attribute));
        self.invalidate_caches();

        if let Err(err) = configurator(attribute.as_ref()) {
            match previous {
                Some(previous) => {
                    self.entries.insert(key, previous);
                }
                None => {
                    self.entries.shift_remove(&key);
                }
            }
            self.invalidate_caches();
            return Err(err);
        }

        debug!(
            "event=attribute_registered module=registry model={} attribute={} replaced={}",
            self.context.model_name(),
            key,
            previous.is_some()
        );
        Ok(attribute)
    }

    pub fn get(&self, name: &str) -> Option<&Rc<Attribute>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<Attribute>> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn editable_attributes(&self) -> &[Rc<Attribute>] {
        self.editable
            .get_or_init(|| self.select(|attribute| attribute.is_editable()))
    }

    pub fn displayable_attributes(&self) -> &[Rc<Attribute>] {
        self.displayable
            .get_or_init(|| self.select(|attribute| attribute.is_displayable()))
    }

    /// Resolves every attribute's default against `instance`, in order.
    ///
    /// Attributes without a default map to `null`.
    pub fn attribute_defaults(&self, instance: &ModelInstance) -> IndexMap<String, Value> {
        self.entries
            .iter()
            .map(|(name, attribute)| (name.clone(), attribute.default_value(instance)))
            .collect()
    }

    /// Input options for `name`; `overrides` unchanged for unknown names.
    pub fn input_options_for(&self, name: &str, overrides: &OptionMap) -> OptionMap {
        match self.entries.get(name) {
            Some(attribute) => attribute.options_for_input(overrides),
            None => overrides.clone(),
        }
    }

    /// Label for `name`; the titleized name for unknown names.
    pub fn label_for(&self, name: &str) -> String {
        match self.entries.get(name) {
            Some(attribute) => attribute.label(),
            None => titleize(name),
        }
    }

    /// Copies the entry map for a derived model type.
    pub fn copy_to(&self, context: AttributeContext) -> Self {
        debug!(
            "event=registry_copied module=registry from={} to={} attributes={}",
            self.context.model_name(),
            context.model_name(),
            self.entries.len()
        );
        Self::with_entries(context, self.entries.clone())
    }

    fn select(&self, predicate: impl Fn(&Attribute) -> bool) -> Vec<Rc<Attribute>> {
        self.entries
            .values()
            .filter(|attribute| predicate(attribute))
            .cloned()
            .collect()
    }

    fn invalidate_caches(&mut self) {
        self.editable.take();
        self.displayable.take();
    }
}
