//! Rule-based validation capability.
//!
//! # Responsibility
//! - Accept per-field rule objects at declaration time.
//! - Evaluate them against instances and collect per-field messages.
//!
//! # Invariants
//! - A rule object is parsed completely before anything is stored, so a
//!   rejected declaration leaves no partial rules behind.
//! - Values are read through the instance's public accessors, including
//!   reader transforms.

use super::ValidationCapability;
use crate::error::ConfigurationError;
use crate::inflect::humanize;
use crate::model::ModelInstance;
use crate::value::{is_blank, Value};
use indexmap::IndexMap;
use log::debug;

pub const RULE_PRESENCE: &str = "presence";
pub const RULE_LENGTH: &str = "length";

pub const MESSAGE_BLANK: &str = "can't be blank";

/// One parsed validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Presence,
    Length {
        minimum: Option<usize>,
        maximum: Option<usize>,
    },
}

/// Validation messages keyed by field name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Errors {
    messages: IndexMap<String, Vec<String>>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.messages
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Messages for one field (empty when valid).
    pub fn get(&self, field: &str) -> &[String] {
        self.messages.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Total number of messages across all fields.
    pub fn len(&self) -> usize {
        self.messages.values().map(Vec::len).sum()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    /// `"<Field> <message>"` strings using humanized field names.
    pub fn full_messages(&self) -> Vec<String> {
        self.messages
            .iter()
            .flat_map(|(field, messages)| {
                let label = humanize(field);
                messages
                    .iter()
                    .map(move |message| format!("{label} {message}"))
            })
            .collect()
    }
}

/// Validation capability supporting `presence` and `length` rules.
#[derive(Debug, Clone, Default)]
pub struct RuleValidations {
    rules: Vec<(String, Rule)>,
}

impl RuleValidations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered `(field, rule)` pairs in declaration order.
    pub fn rules(&self) -> &[(String, Rule)] {
        &self.rules
    }
}

impl ValidationCapability for RuleValidations {
    fn register_validation(&mut self, name: &str, rules: &Value) -> Result<(), ConfigurationError> {
        let parsed = parse_rules(name, rules)?;
        debug!(
            "event=validation_registered module=validation attribute={} rules={}",
            name,
            parsed.len()
        );
        self.rules
            .extend(parsed.into_iter().map(|rule| (name.to_string(), rule)));
        Ok(())
    }

    fn validate(&self, instance: &ModelInstance, errors: &mut Errors) {
        for (field, rule) in &self.rules {
            let value = match instance.read(field) {
                Ok(value) => value,
                Err(err) => {
                    errors.add(field, format!("could not be read ({err})"));
                    continue;
                }
            };
            match rule {
                Rule::Presence => {
                    if is_blank(&value) {
                        errors.add(field, MESSAGE_BLANK);
                    }
                }
                Rule::Length { minimum, maximum } => {
                    let length = value_length(&value);
                    if let Some(minimum) = minimum.filter(|minimum| length < *minimum) {
                        errors.add(
                            field,
                            format!("is too short (minimum is {minimum} characters)"),
                        );
                    }
                    if let Some(maximum) = maximum.filter(|maximum| length > *maximum) {
                        errors.add(
                            field,
                            format!("is too long (maximum is {maximum} characters)"),
                        );
                    }
                }
            }
        }
    }
}

fn value_length(value: &Value) -> usize {
    match value {
        Value::Null => 0,
        Value::String(text) => text.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(entries) => entries.len(),
        other => other.to_string().chars().count(),
    }
}

fn parse_rules(name: &str, rules: &Value) -> Result<Vec<Rule>, ConfigurationError> {
    let unsupported = |rule: &str| ConfigurationError::UnsupportedValidation {
        attribute: name.to_string(),
        rule: rule.to_string(),
    };
    let entries = rules.as_object().ok_or_else(|| unsupported("<non-object>"))?;

    let mut parsed = Vec::with_capacity(entries.len());
    for (key, options) in entries {
        match (key.as_str(), options) {
            (RULE_PRESENCE, Value::Bool(true)) => parsed.push(Rule::Presence),
            (RULE_PRESENCE, Value::Bool(false)) => {}
            (RULE_LENGTH, Value::Object(bounds)) => {
                let bound = |key: &str| -> Result<Option<usize>, ConfigurationError> {
                    match bounds.get(key) {
                        None | Some(Value::Null) => Ok(None),
                        Some(value) => value
                            .as_u64()
                            .and_then(|bound| usize::try_from(bound).ok())
                            .map(Some)
                            .ok_or_else(|| unsupported(&format!("{RULE_LENGTH}.{key}"))),
                    }
                };
                let (mut minimum, mut maximum) = (bound("minimum")?, bound("maximum")?);
                if let Some(exact) = bound("is")? {
                    minimum = Some(exact);
                    maximum = Some(exact);
                }
                parsed.push(Rule::Length { minimum, maximum });
            }
            (other, _) => return Err(unsupported(other)),
        }
    }
    Ok(parsed)
}
