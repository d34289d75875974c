use crate::{
    context::ExecutionContext,
    errors::RecipeError,
    recipe::{Recipe, RecipeRef},
    repository::{Repository, RepositoryObject},
    types::Value,
};

/// Injects the name of another component as a string
///
/// The referenced component still has to exist and build successfully, so a broken
/// reference fails during wiring and not later when someone uses the name.
#[derive(Debug, Clone, Default)]
pub struct ReferenceNameRecipe {
    name: Option<String>,
    reference_name: Option<String>,
}

impl ReferenceNameRecipe {
    /// Anonymous recipe referencing `reference_name`
    pub fn new(reference_name: impl Into<String>) -> Self {
        Self {
            name: None,
            reference_name: Some(reference_name.into()),
        }
    }

    /// Registers the produced name under `name`
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn reference_name(&self) -> Option<&str> {
        self.reference_name.as_deref()
    }

    fn checked_reference_name(&self) -> Result<&str, RecipeError> {
        self.reference_name
            .as_deref()
            .ok_or_else(|| RecipeError::definition("Reference name has not been set"))
    }

    fn reference(&self, repository: &Repository) -> Result<RepositoryObject, RecipeError> {
        let reference_name = self.checked_reference_name()?;
        repository
            .get_object(reference_name)
            .ok_or_else(|| RecipeError::NoSuchComponent(reference_name.to_owned()))
    }
}

impl Recipe for ReferenceNameRecipe {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn nested_recipes(&self, repository: &Repository) -> Result<Vec<RecipeRef>, RecipeError> {
        Ok(match self.reference(repository)? {
            RepositoryObject::Recipe(recipe) => vec![recipe],
            RepositoryObject::Object(_) => Vec::new(),
        })
    }

    fn internal_create(&self, ctx: &mut ExecutionContext<'_>) -> Result<Value, RecipeError> {
        let reference_name = self.checked_reference_name()?;
        if !ctx.contains_object(reference_name) {
            return Err(RecipeError::NoSuchComponent(reference_name.to_owned()));
        }

        // Only built to prove it can be, the value itself is not needed
        ctx.get_or_create(reference_name)?;

        Ok(Value::from(reference_name))
    }
}
