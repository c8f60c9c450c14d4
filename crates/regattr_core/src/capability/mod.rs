//! Collaborator capabilities consumed by attribute declaration.
//!
//! # Responsibility
//! - Define the contracts used to talk to validation, storage, persistence
//!   delegation and label lookup.
//! - Bundle one implementation of each per model type.
//!
//! # Invariants
//! - Capabilities are only invoked at declaration time, except
//!   `ValidationCapability::validate` and the accessors they return.
//!
//! # See also
//! - `model::ModelType::attribute` for the wiring order.

pub mod datastream;
pub mod labels;
pub mod storage;
pub mod validation;

use crate::accessor::Accessor;
use crate::attribute::DelegationOptions;
use crate::error::ConfigurationError;
use crate::model::ModelInstance;
use crate::value::{OptionMap, Value};
use std::rc::Rc;

pub use datastream::{DatastreamDelegation, SimpleDatastream};
pub use labels::{HumanizedLabels, LabelCatalog};
pub use storage::InstanceFields;
pub use validation::{Errors, RuleValidations};

/// Validation framework contract.
pub trait ValidationCapability {
    /// Registers `rules` for the field `name`. Called once per attribute
    /// carrying validation rules.
    fn register_validation(&mut self, name: &str, rules: &Value) -> Result<(), ConfigurationError>;

    /// Runs every registered rule against `instance`.
    fn validate(&self, instance: &ModelInstance, errors: &mut Errors);
}

/// Plain instance-field storage for virtual attributes.
pub trait VirtualStorage {
    fn install_virtual_accessor(&mut self, name: &str, options: &OptionMap) -> Accessor;
}

/// Delegates attribute access to a named backing store.
pub trait PersistenceDelegation {
    /// Returns a get/set pair reading and writing the store location
    /// described by `options`, honoring `unique`.
    fn install_delegated_accessor(
        &mut self,
        name: &str,
        options: &DelegationOptions,
    ) -> Result<Accessor, ConfigurationError>;
}

/// Localized label lookup of a model type.
pub trait LabelLookup {
    fn human_attribute_name(&self, model: &str, attribute: &str, fallback: &str) -> String;
}

/// Capability bundle owned by one model type.
pub struct Capabilities {
    pub validations: Box<dyn ValidationCapability>,
    pub virtual_storage: Box<dyn VirtualStorage>,
    pub delegation: Box<dyn PersistenceDelegation>,
    pub labels: Rc<dyn LabelLookup>,
}

impl Capabilities {
    pub fn with_validations(mut self, validations: impl ValidationCapability + 'static) -> Self {
        self.validations = Box::new(validations);
        self
    }

    pub fn with_virtual_storage(mut self, storage: impl VirtualStorage + 'static) -> Self {
        self.virtual_storage = Box::new(storage);
        self
    }

    pub fn with_delegation(mut self, delegation: impl PersistenceDelegation + 'static) -> Self {
        self.delegation = Box::new(delegation);
        self
    }

    pub fn with_labels(self, labels: impl LabelLookup + 'static) -> Self {
        self.with_shared_labels(Rc::new(labels))
    }

    pub fn with_shared_labels(mut self, labels: Rc<dyn LabelLookup>) -> Self {
        self.labels = labels;
        self
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            validations: Box::new(RuleValidations::new()),
            virtual_storage: Box::new(InstanceFields),
            delegation: Box::new(DatastreamDelegation::new()),
            labels: Rc::new(HumanizedLabels),
        }
    }
}
