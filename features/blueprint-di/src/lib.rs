//! Blueprint DI builds named objects lazily from declarative recipes.
//!
//! The crate is split into a few parts:
//! 1. Recipes: builders for one object each, declaring which other recipes they depend on
//! 2. Repository: every name, either still a recipe, a partially wired object or a created object
//! 3. ExecutionContext: the build stack of one top-level request, detecting circular dependencies
//! 4. BlueprintContainer: owns the repository and runs top-level requests
//!
//! # Examples
//!
//! ```rust
//! use blueprint_di::{
//!     BlueprintContainer, RecipeError, RefRecipe, ReferenceNameRecipe, Value, ValueRecipe,
//! };
//!
//! let mut container = BlueprintContainer::builder()
//!     .add_recipe(ValueRecipe::new("port", "8080").with_type("string"))
//!     .add_recipe(RefRecipe::new("listen-port", "port"))
//!     .add_recipe(ReferenceNameRecipe::new("port").named("port-name"))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(container.create("listen-port").unwrap(), Value::from("8080"));
//! assert_eq!(container.create("port-name").unwrap(), Value::from("port"));
//! assert!(matches!(
//!     container.create("missing"),
//!     Err(RecipeError::NoSuchComponent(_))
//! ));
//! ```
//!
//! Circular dependencies are reported instead of recursing forever:
//!
//! ```rust
//! use blueprint_di::{BlueprintContainer, RecipeError, RefRecipe};
//!
//! let mut container = BlueprintContainer::builder()
//!     .add_recipe(RefRecipe::new("a", "b"))
//!     .add_recipe(RefRecipe::new("b", "a"))
//!     .validate_on_build(false)
//!     .build()
//!     .unwrap();
//!
//! assert!(matches!(
//!     container.create("a"),
//!     Err(RecipeError::CircularDependency { .. })
//! ));
//! ```

pub mod builder;
pub mod container;
pub mod context;
pub mod dependency_graph;
pub mod errors;
pub mod factories;
pub mod recipe;
pub mod recipes;
pub mod repository;
pub mod services;
pub mod types;

pub use builder::ContainerBuilder;
pub use container::BlueprintContainer;
pub use context::{ContextScope, ContextSlot, ExecutionContext};
pub use dependency_graph::{DependencyGraph, DependencyGraphError, DependencyGraphErrors};
pub use errors::{ContextError, InitError, RecipeError};
pub use factories::{FactoryRecipe, FnFactory, InstanceFactory};
pub use recipe::{Recipe, RecipeExt, RecipeRef};
pub use recipes::{ListRecipe, RefRecipe, ReferenceNameRecipe, ValueRecipe};
pub use repository::{Repository, RepositoryObject};
pub use services::{ClassResolver, ConversionError, ConversionService, PassthroughConverter, TypeRegistry};
pub use types::{DynError, Injectable, Instance, TypeDescriptor, TypeInfo, Value};
