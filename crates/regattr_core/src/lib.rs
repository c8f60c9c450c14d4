//! Declarative attribute registration for model types.
//!
//! A model type declares its attributes once with `ModelType::attribute`;
//! each declaration is recorded in the type's ordered registry and wired to
//! validation, storage and read/write transforms through the type's
//! capabilities. Forms and views then query the registry for editable and
//! displayable attributes, defaults, input options and labels.

pub mod accessor;
pub mod attribute;
pub mod capability;
pub mod error;
pub mod inflect;
pub mod logging;
pub mod model;
pub mod registry;
pub mod value;

pub use accessor::{Accessor, Transform};
pub use attribute::{
    Attribute, AttributeContext, AttributeOptions, DatastreamDescriptor, DelegationOptions,
    IntoAttributeOptions, PersistenceTarget, StorageKind,
};
pub use capability::{
    Capabilities, DatastreamDelegation, Errors, HumanizedLabels, InstanceFields, LabelCatalog,
    LabelLookup, PersistenceDelegation, RuleValidations, SimpleDatastream, ValidationCapability,
    VirtualStorage,
};
pub use error::{AccessError, ConfigurationError};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::{DefaultPolicy, ModelInstance, ModelType};
pub use registry::AttributeRegistry;
pub use value::{OptionMap, Value};

/// Returns the crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
