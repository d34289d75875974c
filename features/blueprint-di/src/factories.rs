use std::marker::PhantomData;

use crate::{
    context::ExecutionContext,
    errors::RecipeError,
    recipe::{Recipe, RecipeRef},
    repository::Repository,
    types::{Injectable, Instance, TypeInfo, Value},
};

/// A Factory providing instances of a given type
pub trait InstanceFactory: Send + Sync {
    type Provides: Injectable;

    /// Returns the typeinfo about the factory's provided type
    fn supplies() -> TypeInfo {
        TypeInfo::of::<Self::Provides>()
    }

    /// Returns the recipes the factory builds while constructing
    fn dependencies(&self) -> Vec<RecipeRef> {
        Vec::new()
    }

    /// Constructs a new instance of the factory's provided type
    ///
    /// Dependencies are resolved through `ctx`. Returning [RecipeError::Other] marks the
    /// factory itself as the cause, every other error is passed on unchanged.
    fn construct(&self, ctx: &mut ExecutionContext<'_>) -> Result<Self::Provides, RecipeError>;
}

/// Factory built from a closure, see [FactoryRecipe::from_fn]
pub struct FnFactory<T, F> {
    dependencies: Vec<RecipeRef>,
    construct: F,
    _provides: PhantomData<fn() -> T>,
}
impl<T, F> InstanceFactory for FnFactory<T, F>
where
    T: Injectable,
    F: Fn(&mut ExecutionContext<'_>) -> Result<T, RecipeError> + Send + Sync,
{
    type Provides = T;

    fn dependencies(&self) -> Vec<RecipeRef> {
        self.dependencies.clone()
    }

    fn construct(&self, ctx: &mut ExecutionContext<'_>) -> Result<T, RecipeError> {
        (self.construct)(ctx)
    }
}

/// Recipe producing the instance of an [InstanceFactory]
pub struct FactoryRecipe<F> {
    name: Option<String>,
    factory: F,
}

impl<F: InstanceFactory> FactoryRecipe<F> {
    pub fn new(name: impl Into<String>, factory: F) -> Self {
        Self {
            name: Some(name.into()),
            factory,
        }
    }

    pub fn anonymous(factory: F) -> Self {
        Self {
            name: None,
            factory,
        }
    }
}

impl<T, Fun> FactoryRecipe<FnFactory<T, Fun>>
where
    T: Injectable,
    Fun: Fn(&mut ExecutionContext<'_>) -> Result<T, RecipeError> + Send + Sync,
{
    /// Named recipe calling `construct`, `dependencies` are the recipes it will build
    pub fn from_fn(name: impl Into<String>, dependencies: Vec<RecipeRef>, construct: Fun) -> Self {
        Self::new(
            name,
            FnFactory {
                dependencies,
                construct,
                _provides: PhantomData,
            },
        )
    }
}

impl<F: InstanceFactory> Recipe for FactoryRecipe<F> {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn nested_recipes(&self, _: &Repository) -> Result<Vec<RecipeRef>, RecipeError> {
        Ok(self.factory.dependencies())
    }

    fn internal_create(&self, ctx: &mut ExecutionContext<'_>) -> Result<Value, RecipeError> {
        match self.factory.construct(ctx) {
            Ok(product) => {
                tracing::debug!("Constructed instance of {}", F::supplies().type_name);
                Ok(Value::Object(Instance::new(product)))
            }
            Err(RecipeError::Other(error)) => Err(RecipeError::FactoryFailed {
                product: F::supplies().type_name,
                error,
            }),
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        recipe::RecipeExt,
        recipes::ValueRecipe,
        services::{PassthroughConverter, TypeRegistry},
    };

    #[derive(Debug)]
    struct Greeter {
        greeting: String,
    }

    struct GreeterFactory {
        greeting: RecipeRef,
    }
    impl InstanceFactory for GreeterFactory {
        type Provides = Greeter;

        fn dependencies(&self) -> Vec<RecipeRef> {
            vec![self.greeting.clone()]
        }

        fn construct(&self, ctx: &mut ExecutionContext<'_>) -> Result<Greeter, RecipeError> {
            let greeting = self.greeting.create(ctx)?;
            let greeting = greeting
                .as_str()
                .ok_or_else(|| RecipeError::Other("greeting must be a string".into()))?;
            Ok(Greeter {
                greeting: greeting.to_owned(),
            })
        }
    }

    fn context(repository: &mut Repository) -> ExecutionContext<'_> {
        ExecutionContext::new(
            repository,
            Arc::new(PassthroughConverter),
            Arc::new(TypeRegistry::with_builtins()),
        )
    }

    #[test]
    fn factory_product_is_registered_as_instance() {
        let greeting: RecipeRef = Arc::new(ValueRecipe::new("greeting", "hello"));
        let recipe: RecipeRef = Arc::new(FactoryRecipe::new(
            "greeter",
            GreeterFactory {
                greeting: greeting.clone(),
            },
        ));
        let mut repository = Repository::new();
        repository.add_recipe(greeting).unwrap();
        repository.add_recipe(recipe.clone()).unwrap();
        assert_eq!(recipe.nested_recipes(&repository).unwrap().len(), 1);
        let mut ctx = context(&mut repository);

        let greeter = recipe.create(&mut ctx).unwrap().downcast::<Greeter>().unwrap();

        assert_eq!(greeter.greeting, "hello");
        let registered = ctx.get_created_object("greeter").unwrap();
        assert!(Arc::ptr_eq(&registered.downcast::<Greeter>().unwrap(), &greeter));
    }

    #[test]
    fn factory_errors_name_the_product() {
        let greeting: RecipeRef = Arc::new(ValueRecipe::anonymous(5_i64));
        let recipe: RecipeRef = Arc::new(FactoryRecipe::anonymous(GreeterFactory { greeting }));
        let mut repository = Repository::new();
        let mut ctx = context(&mut repository);

        match recipe.create(&mut ctx) {
            Err(RecipeError::FactoryFailed { product, .. }) => {
                assert!(product.ends_with("Greeter"));
            }
            other => panic!("expected factory failure, got {other:?}"),
        }
    }

    #[test]
    fn structural_errors_pass_through_closures() {
        let recipe: RecipeRef = Arc::new(FactoryRecipe::from_fn(
            "needs-missing",
            Vec::new(),
            |ctx| -> Result<u32, RecipeError> {
                ctx.get_or_create("missing")?;
                Ok(1)
            },
        ));
        let mut repository = Repository::new();
        let mut ctx = context(&mut repository);

        assert!(matches!(
            recipe.create(&mut ctx),
            Err(RecipeError::NoSuchComponent(name)) if name == "missing"
        ));
    }
}
