use crate::{
    context::ExecutionContext,
    errors::RecipeError,
    recipe::{Recipe, RecipeExt, RecipeRef},
    repository::Repository,
    types::Value,
};

/// Produces a list by creating every item in order
#[derive(Clone)]
pub struct ListRecipe {
    name: Option<String>,
    items: Vec<RecipeRef>,
}

impl ListRecipe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            items: Vec::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            name: None,
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: RecipeRef) -> Self {
        self.items.push(item);
        self
    }
}

impl Recipe for ListRecipe {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn nested_recipes(&self, _: &Repository) -> Result<Vec<RecipeRef>, RecipeError> {
        Ok(self.items.clone())
    }

    fn internal_create(&self, ctx: &mut ExecutionContext<'_>) -> Result<Value, RecipeError> {
        self.items
            .iter()
            .map(|item| item.create(ctx))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }
}
