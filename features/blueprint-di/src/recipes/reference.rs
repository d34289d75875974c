use crate::{
    context::ExecutionContext,
    errors::RecipeError,
    recipe::{Recipe, RecipeRef},
    repository::{Repository, RepositoryObject},
    types::Value,
};

/// Produces the object registered under another name
#[derive(Debug, Clone)]
pub struct RefRecipe {
    name: Option<String>,
    target: String,
}

impl RefRecipe {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            target: target.into(),
        }
    }

    pub fn anonymous(target: impl Into<String>) -> Self {
        Self {
            name: None,
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Recipe for RefRecipe {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn nested_recipes(&self, repository: &Repository) -> Result<Vec<RecipeRef>, RecipeError> {
        match repository.get_object(&self.target) {
            Some(RepositoryObject::Recipe(recipe)) => Ok(vec![recipe]),
            Some(RepositoryObject::Object(_)) => Ok(Vec::new()),
            None => Err(RecipeError::NoSuchComponent(self.target.clone())),
        }
    }

    fn internal_create(&self, ctx: &mut ExecutionContext<'_>) -> Result<Value, RecipeError> {
        ctx.get_or_create(&self.target)
    }
}
