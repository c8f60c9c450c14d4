//! Virtual attribute storage on the instance itself.

use super::VirtualStorage;
use crate::accessor::Accessor;
use crate::model::ModelInstance;
use crate::value::{OptionMap, Value};
use log::debug;

/// Stores virtual attributes in the instance's field map.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceFields;

impl VirtualStorage for InstanceFields {
    fn install_virtual_accessor(&mut self, name: &str, _options: &OptionMap) -> Accessor {
        debug!("event=virtual_accessor_installed module=storage attribute={name}");
        let read_key = name.to_string();
        let write_key = name.to_string();
        Accessor::new(
            move |instance: &ModelInstance| {
                Ok(instance.field(&read_key).cloned().unwrap_or(Value::Null))
            },
            move |instance: &mut ModelInstance, value| {
                instance.set_field(&write_key, value);
                Ok(())
            },
        )
    }
}
