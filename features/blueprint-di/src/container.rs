use std::{any::type_name, fmt::Debug, sync::Arc};

use crate::{
    builder::ContainerBuilder,
    context::ExecutionContext,
    dependency_graph::DependencyGraph,
    errors::RecipeError,
    recipe::RecipeRef,
    repository::Repository,
    services::{ClassResolver, ConversionService},
    types::{Injectable, Value},
};

/// Container owning the repository and the collaborators used to build it
///
/// Every top-level request runs in its own [ExecutionContext]; the repository and everything
/// created so far are kept between requests. There is no internal locking, wrap the container
/// in a `Mutex` to share it between threads.
pub struct BlueprintContainer {
    repository: Repository,
    converter: Arc<dyn ConversionService>,
    class_resolver: Arc<dyn ClassResolver>,
}
impl Debug for BlueprintContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("BlueprintContainer");
        for name in self.repository.names() {
            map.field(name, &self.repository.state_label(name).unwrap_or("unknown"));
        }
        map.finish()
    }
}

impl BlueprintContainer {
    pub(crate) fn new(
        repository: Repository,
        converter: Arc<dyn ConversionService>,
        class_resolver: Arc<dyn ClassResolver>,
    ) -> Self {
        Self {
            repository,
            converter,
            class_resolver,
        }
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Starts a new top-level build
    pub fn execution_context(&mut self) -> ExecutionContext<'_> {
        ExecutionContext::new(
            &mut self.repository,
            self.converter.clone(),
            self.class_resolver.clone(),
        )
    }

    /// Returns the object registered under `name`, building it if required
    pub fn create(&mut self, name: &str) -> Result<Value, RecipeError> {
        tracing::debug!("Requested '{name}'");
        self.execution_context().get_or_create(name)
    }

    /// Builds every registered recipe in registration order
    ///
    /// Stops at the first failure, everything built up to that point stays created.
    pub fn create_all(&mut self) -> Result<Vec<(String, Value)>, RecipeError> {
        let names: Vec<String> = self
            .repository
            .recipes()
            .filter_map(|recipe| recipe.name().map(str::to_owned))
            .collect();

        let mut ctx = self.execution_context();
        let mut created = Vec::with_capacity(names.len());
        for name in names {
            let value = ctx.get_or_create(&name)?;
            created.push((name, value));
        }

        tracing::debug!("Created {} components", created.len());
        Ok(created)
    }

    /// Attempts to get the created object registered under `name` as `T`
    pub fn require<T: Injectable>(&self, name: &str) -> Result<Arc<T>, RecipeError> {
        let value = self
            .repository
            .get_created_object(name)
            .ok_or_else(|| RecipeError::NoSuchComponent(name.to_owned()))?;

        match &value {
            Value::Object(instance) => {
                instance
                    .downcast()
                    .map_err(|actual_type| RecipeError::DowncastFailed {
                        required_type: type_name::<T>(),
                        actual_type,
                    })
            }
            _ => Err(RecipeError::DowncastFailed {
                required_type: type_name::<T>(),
                actual_type: "plain value",
            }),
        }
    }

    pub fn get_created_object(&self, name: &str) -> Option<Value> {
        self.repository.get_created_object(name)
    }

    /// Recipes whose objects are created, in creation order
    pub fn created_recipes(&self) -> Vec<RecipeRef> {
        self.repository.get_created_recipes()
    }

    /// Dependency graph of the current repository
    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::new(&self.repository)
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        factories::FactoryRecipe,
        recipes::{RefRecipe, ValueRecipe},
    };

    struct Database {
        url: String,
    }

    fn container() -> BlueprintContainer {
        let url: RecipeRef = Arc::new(ValueRecipe::new("url", "postgres://localhost"));
        BlueprintContainer::builder()
            .add_recipe_ref(url.clone())
            .add_recipe(FactoryRecipe::from_fn(
                "database",
                vec![url.clone()],
                move |ctx| -> Result<Database, RecipeError> {
                    let url = ctx.create(&url)?;
                    Ok(Database {
                        url: url.as_str().unwrap_or_default().to_owned(),
                    })
                },
            ))
            .add_recipe(RefRecipe::new("db", "database"))
            .build()
            .unwrap()
    }

    #[test]
    fn require_downcasts_created_objects() {
        let mut container = container();
        container.create("db").unwrap();

        let database = container.require::<Database>("database").unwrap();
        assert_eq!(database.url, "postgres://localhost");
        let aliased = container.require::<Database>("db").unwrap();
        assert!(Arc::ptr_eq(&database, &aliased));

        assert!(matches!(
            container.require::<String>("database"),
            Err(RecipeError::DowncastFailed { .. })
        ));
        assert!(matches!(
            container.require::<Database>("url"),
            Err(RecipeError::DowncastFailed { actual_type: "plain value", .. })
        ));
    }

    #[test]
    fn require_only_sees_created_objects() {
        let container = container();

        assert!(matches!(
            container.require::<Database>("database"),
            Err(RecipeError::NoSuchComponent(_))
        ));
    }

    #[test]
    fn create_all_builds_in_registration_order() {
        let mut container = container();

        let created = container.create_all().unwrap();

        let names: Vec<_> = created.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["url", "database", "db"]);
        let order: Vec<_> = container
            .created_recipes()
            .iter()
            .filter_map(|recipe| recipe.name().map(str::to_owned))
            .collect();
        assert_eq!(order, vec!["url", "database", "db"]);
        assert_eq!(format!("{container:?}").matches("created").count(), 3);
    }
}
