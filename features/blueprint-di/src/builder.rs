use std::sync::Arc;

use crate::{
    container::BlueprintContainer,
    dependency_graph::DependencyGraph,
    errors::InitError,
    recipe::{Recipe, RecipeRef},
    repository::Repository,
    services::{ClassResolver, ConversionService, PassthroughConverter, TypeRegistry},
    types::{Injectable, Instance, Value},
};

/// Collects everything a [BlueprintContainer] is made of
///
/// The configuration loader registers its recipes here. Nothing is built until the container
/// is asked for an object.
pub struct ContainerBuilder {
    /// Registered recipes in registration order
    pub(crate) recipes: Vec<RecipeRef>,
    /// Registered already created objects
    pub(crate) objects: Vec<(String, Value)>,
    converter: Arc<dyn ConversionService>,
    class_resolver: Arc<dyn ClassResolver>,
    validate: bool,
}
impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        ContainerBuilder {
            recipes: Vec::new(),
            objects: Vec::new(),
            converter: Arc::new(PassthroughConverter),
            class_resolver: Arc::new(TypeRegistry::with_builtins()),
            validate: true,
        }
    }
}
impl ContainerBuilder {
    pub fn add_recipe<R: Recipe + 'static>(self, recipe: R) -> Self {
        self.add_recipe_ref(Arc::new(recipe))
    }

    pub fn add_recipe_ref(mut self, recipe: RecipeRef) -> Self {
        self.recipes.push(recipe);
        self
    }

    /// Registers an existing object, it counts as created right away
    pub fn add_instance<T: Injectable>(self, name: impl Into<String>, instance: T) -> Self {
        self.add_value(name, Instance::new(instance))
    }

    pub fn add_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.objects.push((name.into(), value.into()));
        self
    }

    pub fn with_converter<C: ConversionService + 'static>(mut self, converter: C) -> Self {
        self.converter = Arc::new(converter);
        self
    }

    pub fn with_class_resolver<R: ClassResolver + 'static>(mut self, class_resolver: R) -> Self {
        self.class_resolver = Arc::new(class_resolver);
        self
    }

    /// Whether [ContainerBuilder::build] checks the dependency graph, enabled by default
    ///
    /// Wiring which breaks its cycles with partial objects has to disable this.
    pub fn validate_on_build(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn build(self) -> Result<BlueprintContainer, InitError> {
        let ContainerBuilder {
            recipes,
            objects,
            converter,
            class_resolver,
            validate,
        } = self;

        tracing::debug!(
            "Building container with {} recipes and {} objects",
            recipes.len(),
            objects.len()
        );

        let mut repository = Repository::new();
        for (name, value) in objects {
            repository.add_object(&name, value, false)?;
        }
        for recipe in recipes {
            repository.add_recipe(recipe)?;
        }

        if validate {
            DependencyGraph::new(&repository).check()?;
        }

        Ok(BlueprintContainer::new(repository, converter, class_resolver))
    }
}
