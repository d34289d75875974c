use std::collections::HashMap;

use crate::{
    context::ExecutionContext,
    types::{DynError, Injectable, TypeDescriptor, TypeInfo, Value},
};

/// Converts values to the type a recipe asks for
///
/// Receives the running context, so building other components during a conversion is still
/// subject to circular dependency detection.
pub trait ConversionService: Send + Sync {
    fn convert(
        &self,
        value: Value,
        target: &TypeDescriptor,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<Value, DynError>;
}

/// Resolves type names to descriptors
pub trait ClassResolver: Send + Sync {
    /// Returns None if the type is not known
    fn load_class(&self, class_name: &str) -> Option<TypeDescriptor>;
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum ConversionError {
    #[error("Cannot convert a value of type '{from}' to '{to}'")]
    Incompatible {
        from: TypeDescriptor,
        to: TypeDescriptor,
    },
}

/// Converter which only accepts values that already have the requested type
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughConverter;
impl ConversionService for PassthroughConverter {
    fn convert(
        &self,
        value: Value,
        target: &TypeDescriptor,
        _: &mut ExecutionContext<'_>,
    ) -> Result<Value, DynError> {
        if value.is_instance_of(target) {
            return Ok(value);
        }
        Err(Box::new(ConversionError::Incompatible {
            from: value.descriptor(),
            to: target.clone(),
        }))
    }
}

/// Class resolver backed by a table of known types
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry knowing the names of the plain value types
    pub fn with_builtins() -> Self {
        Self::new()
            .register("any", TypeDescriptor::Any)
            .register("null", TypeDescriptor::Null)
            .register("bool", TypeDescriptor::Bool)
            .register("int", TypeDescriptor::Int)
            .register("string", TypeDescriptor::Str)
    }

    pub fn register(mut self, class_name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.types.insert(class_name.into(), descriptor);
        self
    }

    /// Registers `T` under `class_name`
    pub fn register_type<T: Injectable>(self, class_name: impl Into<String>) -> Self {
        self.register(class_name, TypeDescriptor::Object(TypeInfo::of::<T>()))
    }
}

impl ClassResolver for TypeRegistry {
    fn load_class(&self, class_name: &str) -> Option<TypeDescriptor> {
        if let Some(element) = class_name
            .strip_prefix("list<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return self
                .load_class(element)
                .map(|element| TypeDescriptor::List(Box::new(element)));
        }
        self.types.get(class_name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::repository::Repository;

    #[test]
    fn registry_resolves_builtins_lists_and_registered_types() {
        struct Service;
        let registry = TypeRegistry::with_builtins().register_type::<Service>("app.Service");

        assert_eq!(registry.load_class("int"), Some(TypeDescriptor::Int));
        assert_eq!(
            registry.load_class("list<string>"),
            Some(TypeDescriptor::List(Box::new(TypeDescriptor::Str)))
        );
        assert_eq!(
            registry.load_class("app.Service"),
            Some(TypeDescriptor::object::<Service>())
        );
        assert_eq!(registry.load_class("list<app.Missing>"), None);
        assert_eq!(registry.load_class("app.Missing"), None);
    }

    #[test]
    fn passthrough_rejects_mismatched_values() {
        let mut repository = Repository::new();
        let mut ctx = ExecutionContext::new(
            &mut repository,
            Arc::new(PassthroughConverter),
            Arc::new(TypeRegistry::new()),
        );

        let converted = PassthroughConverter.convert(Value::Int(3), &TypeDescriptor::Any, &mut ctx);
        let rejected = PassthroughConverter.convert(Value::Int(3), &TypeDescriptor::Str, &mut ctx);

        assert_eq!(converted.unwrap(), Value::Int(3));
        assert_eq!(
            rejected.unwrap_err().to_string(),
            "Cannot convert a value of type 'int' to 'string'"
        );
    }
}
