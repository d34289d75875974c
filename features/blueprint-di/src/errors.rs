use thiserror::Error;

use crate::{dependency_graph::DependencyGraphErrors, types::DynError};

/// Errors raised while creating recipes
#[derive(Error, Debug)]
pub enum RecipeError {
    /// A recipe was pushed while it was already on the build stack
    #[error("Circular dependency detected on '{recipe}' through {}", .path.join(" -> "))]
    CircularDependency {
        /// Recipe closing the cycle
        recipe: String,
        /// Build stack at the time of the failure, ending with `recipe`
        path: Vec<String>,
    },
    /// Wiring defect which does not depend on runtime state
    #[error("Invalid component definition: {0}")]
    ComponentDefinition(String),
    /// A referenced component is not registered
    #[error("No component registered with name '{0}'")]
    NoSuchComponent(String),
    /// The class resolver did not know the requested type
    #[error("Class '{0}' could not be resolved")]
    ClassNotFound(String),
    /// The conversion service failed
    #[error("Conversion failed: {0}")]
    Conversion(DynError),
    /// A component exists but is of another type
    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },
    /// A factory failed to build its product
    #[error("Factory for '{product}' failed - error: {error:?}")]
    FactoryFailed {
        product: &'static str,
        error: DynError,
    },
    /// Generic error raised by user recipes
    #[error("Error during creation: {0}")]
    Other(DynError),
}

impl RecipeError {
    pub fn definition(message: impl Into<String>) -> Self {
        Self::ComponentDefinition(message.into())
    }
}

/// Errors when accessing a [crate::context::ContextSlot]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("Execution context has not been set")]
    NotSet,
}

/// Errors while building a container
#[derive(Error, Debug)]
pub enum InitError {
    /// A recipe or instance could not be registered
    #[error(transparent)]
    Definition(#[from] RecipeError),

    /// There are issues with the dependency graph
    #[error(transparent)]
    DependencyGraphError(#[from] DependencyGraphErrors),
}
