use std::sync::Arc;

use crate::{
    context::ExecutionContext,
    errors::RecipeError,
    repository::{Repository, RepositoryObject},
    types::Value,
};

/// Shared handle to a recipe
///
/// The allocation is the recipe's identity: the build stack compares handles, not names.
pub type RecipeRef = Arc<dyn Recipe>;

/// A declarative builder for one object
pub trait Recipe: Send + Sync {
    /// Name the produced object is registered under, None for inline recipes
    fn name(&self) -> Option<&str>;

    /// Returns the direct dependencies of this recipe
    ///
    /// Must not construct anything, this is used to walk the graph ahead of time.
    fn nested_recipes(&self, repository: &Repository) -> Result<Vec<RecipeRef>, RecipeError>;

    /// Builds the object
    ///
    /// Dependencies are built through [RecipeExt::create] or [ExecutionContext::get_or_create]
    /// using the given context.
    fn internal_create(&self, ctx: &mut ExecutionContext<'_>) -> Result<Value, RecipeError>;
}

/// The build protocol shared by every recipe
pub trait RecipeExt {
    /// Returns the registered object for this recipe, building it first if required
    ///
    /// Named recipes are built at most once per repository. The recipe is on the build stack
    /// while it runs, and is removed again on every exit path.
    fn create(&self, ctx: &mut ExecutionContext<'_>) -> Result<Value, RecipeError>;
}

impl RecipeExt for RecipeRef {
    fn create(&self, ctx: &mut ExecutionContext<'_>) -> Result<Value, RecipeError> {
        let name = self.name();

        if let Some(name) = name {
            // Partial objects count as well, that is how cycles get broken
            if let Some(RepositoryObject::Object(existing)) = ctx.get_object(name) {
                tracing::trace!("Reusing registered object for '{name}'");
                return Ok(existing);
            }
        }

        let mut frame = ctx.enter(self.clone())?;
        tracing::debug!(
            depth = frame.depth(),
            "Creating '{}'",
            display_name(self.as_ref())
        );

        let value = match self.internal_create(&mut *frame) {
            Ok(value) => value,
            Err(error) => {
                if let Some(name) = name {
                    frame.discard_partial(name);
                }
                return Err(error);
            }
        };

        if let Some(name) = name {
            // The recipe may have finalized its own name already
            if let Some(registered) = frame.get_created_object(name) {
                return Ok(registered);
            }
            frame.add_object(name, value.clone())?;
        }

        Ok(value)
    }
}

/// Name used for logging and error reporting
pub(crate) fn display_name(recipe: &dyn Recipe) -> String {
    recipe
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| "<anonymous>".to_owned())
}
