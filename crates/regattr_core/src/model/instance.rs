use super::ModelType;
use crate::attribute::Attribute;
use crate::capability::{Errors, SimpleDatastream};
use crate::error::AccessError;
use crate::value::{OptionMap, Value};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::rc::Rc;

/// One instance of a model type.
///
/// Declared attributes are accessed by name through `read`/`write`, which
/// run the installed accessor pipeline. `field`/`set_field` and the
/// datastream methods are the raw stores the pipelines end in.
#[derive(Debug)]
pub struct ModelInstance {
    model: Rc<ModelType>,
    fields: IndexMap<String, Value>,
    datastreams: IndexMap<String, SimpleDatastream>,
    assigned: BTreeSet<String>,
    persisted: bool,
}

impl ModelInstance {
    /// Instance with empty stores and no defaults applied.
    pub(crate) fn blank(model: Rc<ModelType>) -> Self {
        Self {
            model,
            fields: IndexMap::new(),
            datastreams: IndexMap::new(),
            assigned: BTreeSet::new(),
            persisted: false,
        }
    }

    pub fn model(&self) -> &Rc<ModelType> {
        &self.model
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    /// Reads a declared attribute through its reader pipeline.
    pub fn read(&self, name: &str) -> Result<Value, AccessError> {
        let accessor = self.model.accessor(name).ok_or_else(|| self.unknown(name))?;
        accessor.read(self)
    }

    /// Writes a declared attribute through its writer pipeline.
    ///
    /// The attribute counts as assigned only when the write succeeds.
    pub fn write(&mut self, name: &str, value: Value) -> Result<(), AccessError> {
        let accessor = self.model.accessor(name).ok_or_else(|| self.unknown(name))?;
        accessor.write(self, value)?;
        self.assigned.insert(name.to_string());
        Ok(())
    }

    /// Whether `name` has been written through `write`.
    pub fn was_assigned(&self, name: &str) -> bool {
        self.assigned.contains(name)
    }

    pub fn datastream(&self, name: &str) -> Option<&SimpleDatastream> {
        self.datastreams.get(name)
    }

    /// Returns the named datastream, creating it when missing.
    pub fn datastream_mut(&mut self, name: &str) -> &mut SimpleDatastream {
        self.datastreams.entry(name.to_string()).or_default()
    }

    pub fn datastream_names(&self) -> impl Iterator<Item = &str> {
        self.datastreams.keys().map(String::as_str)
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    /// Invokes an instance method defined on the model type or an ancestor.
    pub fn call_method(&self, name: &str, value: Value) -> Result<Value, AccessError> {
        let method = self
            .model
            .method(name)
            .ok_or_else(|| AccessError::UndefinedMethod {
                model: self.model.name().to_string(),
                method: name.to_string(),
            })?;
        method(self, value)
    }

    pub fn validate(&self) -> Errors {
        let mut errors = Errors::new();
        self.model.validate(self, &mut errors);
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    pub fn editable_attributes(&self) -> Vec<Rc<Attribute>> {
        self.model.editable_attributes()
    }

    pub fn displayable_attributes(&self) -> Vec<Rc<Attribute>> {
        self.model.displayable_attributes()
    }

    pub fn terms_for_editing(&self) -> Vec<String> {
        self.model.terms_for_editing()
    }

    pub fn terms_for_display(&self) -> Vec<String> {
        self.model.terms_for_display()
    }

    /// Defaults evaluated against this instance.
    pub fn attribute_defaults(&self) -> IndexMap<String, Value> {
        self.model.registry().attribute_defaults(self)
    }

    pub fn input_options_for(&self, name: &str, overrides: &OptionMap) -> OptionMap {
        self.model.input_options_for(name, overrides)
    }

    pub fn label_for(&self, name: &str) -> String {
        self.model.label_for(name)
    }

    fn unknown(&self, name: &str) -> AccessError {
        AccessError::UnknownAttribute {
            model: self.model.name().to_string(),
            attribute: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::attribute::AttributeOptions;
    use crate::error::AccessError;
    use crate::model::{DefaultPolicy, ModelType};
    use serde_json::json;

    #[test]
    fn unknown_attribute_access_fails() {
        let model = ModelType::new("Work");
        let mut instance = model.new_instance().expect("instance");

        assert!(matches!(
            instance.read("title"),
            Err(AccessError::UnknownAttribute { .. })
        ));
        assert!(matches!(
            instance.write("title", json!("x")),
            Err(AccessError::UnknownAttribute { .. })
        ));
        assert!(!instance.was_assigned("title"));
    }

    #[test]
    fn explicit_assignment_wins_over_default() {
        let model = ModelType::new("Work");
        model
            .attribute("status", AttributeOptions::new().default_value(json!("draft")))
            .expect("status");

        let built = model
            .build([("status", json!("final"))])
            .expect("instance");
        assert_eq!(built.read("status").expect("read"), json!("final"));

        let fresh = model.new_instance().expect("instance");
        assert_eq!(fresh.read("status").expect("read"), json!("draft"));
        assert!(fresh.was_assigned("status"));
    }

    #[test]
    fn overwrite_policy_replaces_assignments() {
        let model = ModelType::new("Work");
        model.set_default_policy(DefaultPolicy::Overwrite);
        model
            .attribute("status", AttributeOptions::new().default_value(json!("draft")))
            .expect("status");

        let built = model
            .build([("status", json!("final"))])
            .expect("instance");
        assert_eq!(built.read("status").expect("read"), json!("draft"));
    }

    #[test]
    fn persisted_instances_skip_defaults() {
        let model = ModelType::new("Work");
        model
            .attribute("status", AttributeOptions::new().default_value(json!("draft")))
            .expect("status");

        let loaded = model.load(Vec::<(&str, _)>::new()).expect("instance");
        assert!(loaded.is_persisted());
        assert_eq!(loaded.read("status").expect("read"), json!(null));

        let stored = model
            .load([("status", json!("published"))])
            .expect("instance");
        assert_eq!(stored.read("status").expect("read"), json!("published"));
    }

    #[test]
    fn method_calls_resolve_through_ancestors() {
        let base = ModelType::new("Base");
        base.define_method("shout", |_, value| {
            Ok(json!(value.as_str().unwrap_or_default().to_uppercase()))
        });
        let child = ModelType::derive(&base, "Child");
        let instance = child.new_instance().expect("instance");

        assert_eq!(
            instance.call_method("shout", json!("hi")).expect("call"),
            json!("HI")
        );
        assert_eq!(
            instance.call_method("whisper", json!("hi")),
            Err(AccessError::UndefinedMethod {
                model: "Child".to_string(),
                method: "whisper".to_string(),
            })
        );
    }
}
