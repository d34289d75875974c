use crate::{
    context::ExecutionContext,
    errors::RecipeError,
    recipe::{Recipe, RecipeRef},
    repository::Repository,
    types::Value,
};

/// Produces a literal value, optionally converted to a named type
#[derive(Debug, Clone)]
pub struct ValueRecipe {
    name: Option<String>,
    value: Value,
    type_name: Option<String>,
}

impl ValueRecipe {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
            type_name: None,
        }
    }

    pub fn anonymous(value: impl Into<Value>) -> Self {
        Self {
            name: None,
            value: value.into(),
            type_name: None,
        }
    }

    /// Converts the value to the type registered as `type_name` when created
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }
}

impl Recipe for ValueRecipe {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn nested_recipes(&self, _: &Repository) -> Result<Vec<RecipeRef>, RecipeError> {
        Ok(Vec::new())
    }

    fn internal_create(&self, ctx: &mut ExecutionContext<'_>) -> Result<Value, RecipeError> {
        match &self.type_name {
            Some(type_name) => {
                let target = ctx.load_class(type_name)?;
                ctx.convert(self.value.clone(), &target)
            }
            None => Ok(self.value.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        recipe::RecipeExt,
        services::{ConversionService, TypeRegistry},
        types::{DynError, TypeDescriptor},
    };

    /// Parses strings into integers
    struct ParseInts;
    impl ConversionService for ParseInts {
        fn convert(
            &self,
            value: Value,
            target: &TypeDescriptor,
            _: &mut ExecutionContext<'_>,
        ) -> Result<Value, DynError> {
            match (value, target) {
                (Value::Str(text), TypeDescriptor::Int) => Ok(Value::Int(text.parse()?)),
                (value, target) => Err(format!("can't convert {value} to {target}").into()),
            }
        }
    }

    fn create(recipe: ValueRecipe) -> Result<Value, RecipeError> {
        let recipe: RecipeRef = Arc::new(recipe);
        let mut repository = Repository::new();
        let mut ctx = ExecutionContext::new(
            &mut repository,
            Arc::new(ParseInts),
            Arc::new(TypeRegistry::with_builtins()),
        );
        recipe.create(&mut ctx)
    }

    #[test]
    fn typed_values_go_through_the_converter() {
        assert_eq!(
            create(ValueRecipe::anonymous("42").with_type("int")).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            create(ValueRecipe::anonymous("42").with_type("string")).unwrap(),
            Value::from("42")
        );
        assert!(matches!(
            create(ValueRecipe::anonymous("forty-two").with_type("int")),
            Err(RecipeError::Conversion(_))
        ));
    }

    #[test]
    fn unknown_type_is_class_not_found() {
        assert!(matches!(
            create(ValueRecipe::anonymous("42").with_type("decimal")),
            Err(RecipeError::ClassNotFound(name)) if name == "decimal"
        ));
    }
}
