//! In-memory datastreams and the delegation capability backed by them.
//!
//! # Responsibility
//! - Keep delegated attribute values in named, per-instance stores.
//! - Translate `unique` into single-value vs. collection accessors.
//!
//! # Invariants
//! - A datastream field always holds a list; single-valued attributes read
//!   its first entry.
//! - Stores are created on first write; reads of a missing store see an
//!   empty field.

use super::PersistenceDelegation;
use crate::accessor::Accessor;
use crate::attribute::DelegationOptions;
use crate::error::ConfigurationError;
use crate::model::ModelInstance;
use crate::value::Value;
use indexmap::IndexMap;
use log::debug;
use std::collections::BTreeSet;

/// Field-name to value-list store attached to one instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleDatastream {
    fields: IndexMap<String, Vec<Value>>,
    changed: bool,
}

impl SimpleDatastream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns stored values for `field` (empty when never written).
    pub fn values(&self, field: &str) -> &[Value] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_values(&mut self, field: &str, values: Vec<Value>) {
        self.fields.insert(field.to_string(), values);
        self.changed = true;
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Whether any field was written since creation.
    pub fn is_changed(&self) -> bool {
        self.changed
    }
}

/// Delegation capability storing values in the instance's datastreams.
#[derive(Debug, Clone, Default)]
pub struct DatastreamDelegation {
    declared: Option<BTreeSet<String>>,
}

impl DatastreamDelegation {
    /// Accepts any datastream name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts only the listed datastream names.
    pub fn restricted<I, S>(datastreams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            declared: Some(datastreams.into_iter().map(Into::into).collect()),
        }
    }
}

impl PersistenceDelegation for DatastreamDelegation {
    fn install_delegated_accessor(
        &mut self,
        name: &str,
        options: &DelegationOptions,
    ) -> Result<Accessor, ConfigurationError> {
        let target = options.target.trim().to_string();
        if target.is_empty() {
            return Err(ConfigurationError::InvalidDescriptor(
                "datastream target must not be blank".to_string(),
            ));
        }
        if let Some(declared) = &self.declared {
            if !declared.contains(&target) {
                return Err(ConfigurationError::InvalidDescriptor(format!(
                    "datastream `{target}` is not declared"
                )));
            }
        }

        let field = match &options.location {
            Some(path) if !path.is_empty() => path.join("/"),
            _ => name.to_string(),
        };
        debug!(
            "event=delegated_accessor_installed module=datastream attribute={} target={} field={} unique={}",
            name, target, field, options.unique
        );

        let unique = options.unique;
        let (read_target, read_field) = (target.clone(), field.clone());
        Ok(Accessor::new(
            move |instance: &ModelInstance| {
                let values = instance
                    .datastream(&read_target)
                    .map(|stream| stream.values(&read_field))
                    .unwrap_or(&[]);
                Ok(if unique {
                    values.first().cloned().unwrap_or(Value::Null)
                } else {
                    Value::Array(values.to_vec())
                })
            },
            move |instance: &mut ModelInstance, value| {
                let values = match value {
                    Value::Null => Vec::new(),
                    Value::Array(items) if !unique => items,
                    other => vec![other],
                };
                instance.datastream_mut(&target).set_values(&field, values);
                Ok(())
            },
        ))
    }
}
