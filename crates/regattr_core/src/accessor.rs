//! Accessor pipelines.
//!
//! # Responsibility
//! - Represent one attribute's read/write pair as composable closures.
//! - Layer reader/writer transforms around an installed accessor.
//!
//! # Invariants
//! - Wrapping never replaces the previous accessor; it becomes the innermost
//!   step of the new one.
//! - Writer transforms run before the wrapped write; reader transforms run
//!   after the wrapped read.
//! - Errors from any step propagate unchanged.

use crate::error::AccessError;
use crate::model::ModelInstance;
use crate::value::Value;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Read step over an instance.
pub type ReadFn = Rc<dyn Fn(&ModelInstance) -> Result<Value, AccessError>>;
/// Write step over an instance.
pub type WriteFn = Rc<dyn Fn(&mut ModelInstance, Value) -> Result<(), AccessError>>;
/// Value transform evaluated with the instance as context.
pub type TransformFn = Rc<dyn Fn(&ModelInstance, Value) -> Result<Value, AccessError>>;

/// Reader or writer transform.
#[derive(Clone)]
pub enum Transform {
    /// Closure invoked with the instance and the value.
    Callable(TransformFn),
    /// Name of an instance method defined on the model type.
    Method(String),
}

impl Transform {
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&ModelInstance, Value) -> Result<Value, AccessError> + 'static,
    {
        Self::Callable(Rc::new(f))
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self::Method(name.into())
    }

    /// Applies the transform to `value`.
    ///
    /// # Errors
    /// - `AccessError::UndefinedMethod` when a method reference does not
    ///   resolve on the instance's model type.
    /// - Any error returned by the transform itself.
    pub fn apply(&self, instance: &ModelInstance, value: Value) -> Result<Value, AccessError> {
        match self {
            Self::Callable(f) => f(instance, value),
            Self::Method(name) => instance.call_method(name, value),
        }
    }
}

impl Debug for Transform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Callable(_) => f.write_str("Transform::Callable(..)"),
            Self::Method(name) => write!(f, "Transform::Method({name:?})"),
        }
    }
}

/// Read/write pair installed for one attribute name.
#[derive(Clone)]
pub struct Accessor {
    read: ReadFn,
    write: WriteFn,
}

impl Accessor {
    pub fn new<R, W>(read: R, write: W) -> Self
    where
        R: Fn(&ModelInstance) -> Result<Value, AccessError> + 'static,
        W: Fn(&mut ModelInstance, Value) -> Result<(), AccessError> + 'static,
    {
        Self {
            read: Rc::new(read),
            write: Rc::new(write),
        }
    }

    pub fn read(&self, instance: &ModelInstance) -> Result<Value, AccessError> {
        (self.read)(instance)
    }

    pub fn write(&self, instance: &mut ModelInstance, value: Value) -> Result<(), AccessError> {
        (self.write)(instance, value)
    }

    /// Returns an accessor whose write passes values through `transform`
    /// before handing the result to this accessor's write.
    pub fn wrap_writer(self, transform: Transform) -> Self {
        let inner = self.write;
        Self {
            read: self.read,
            write: Rc::new(move |instance, value| {
                let transformed = transform.apply(instance, value)?;
                inner(instance, transformed)
            }),
        }
    }

    /// Returns an accessor whose read passes this accessor's result through
    /// `transform`.
    pub fn wrap_reader(self, transform: Transform) -> Self {
        let inner = self.read;
        Self {
            read: Rc::new(move |instance| {
                let raw = inner(instance)?;
                transform.apply(instance, raw)
            }),
            write: self.write,
        }
    }
}

impl Debug for Accessor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Accessor(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::{Accessor, Transform};
    use crate::error::AccessError;
    use crate::model::{ModelInstance, ModelType};
    use crate::value::Value;
    use serde_json::json;

    fn scratch_accessor() -> Accessor {
        Accessor::new(
            |instance: &ModelInstance| Ok(instance.field("scratch").cloned().unwrap_or(Value::Null)),
            |instance: &mut ModelInstance, value| {
                instance.set_field("scratch", value);
                Ok(())
            },
        )
    }

    fn suffix(tag: &'static str) -> Transform {
        Transform::callable(move |_, value| {
            let text = value.as_str().unwrap_or_default();
            Ok(json!(format!("{text}{tag}")))
        })
    }

    #[test]
    fn writer_wraps_compose_outermost_first() {
        let model = ModelType::new("Probe");
        let mut instance = model.new_instance().expect("instance");
        let accessor = scratch_accessor()
            .wrap_writer(suffix("-inner"))
            .wrap_writer(suffix("-outer"));

        accessor
            .write(&mut instance, json!("v"))
            .expect("write should succeed");
        assert_eq!(instance.field("scratch"), Some(&json!("v-outer-inner")));
    }

    #[test]
    fn reader_wraps_compose_innermost_first() {
        let model = ModelType::new("Probe");
        let mut instance = model.new_instance().expect("instance");
        instance.set_field("scratch", json!("v"));
        let accessor = scratch_accessor()
            .wrap_reader(suffix("-inner"))
            .wrap_reader(suffix("-outer"));

        assert_eq!(
            accessor.read(&instance).expect("read should succeed"),
            json!("v-inner-outer")
        );
    }

    #[test]
    fn transform_errors_abort_the_write() {
        let model = ModelType::new("Probe");
        let mut instance = model.new_instance().expect("instance");
        let accessor = scratch_accessor().wrap_writer(Transform::callable(|_, _| {
            Err(AccessError::transform("scratch", "rejected"))
        }));

        let err = accessor
            .write(&mut instance, json!("v"))
            .expect_err("failing transform must propagate");
        assert_eq!(err, AccessError::transform("scratch", "rejected"));
        assert_eq!(instance.field("scratch"), None);
    }

    #[test]
    fn unresolved_method_reference_is_reported() {
        let model = ModelType::new("Probe");
        let instance = model.new_instance().expect("instance");

        let err = Transform::method("missing")
            .apply(&instance, json!(1))
            .expect_err("unknown method must fail");
        assert!(matches!(err, AccessError::UndefinedMethod { .. }));
    }
}
