use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::{
    errors::RecipeError,
    recipe::{display_name, RecipeRef},
    repository::Repository,
};

/// Recipes are identified by their allocation, the same way the build stack does it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RecipeId(usize);
impl RecipeId {
    fn of(recipe: &RecipeRef) -> Self {
        RecipeId(std::sync::Arc::as_ptr(recipe) as *const () as usize)
    }
}

/// Graph of every recipe reachable from a repository
///
/// Built from [crate::recipe::Recipe::nested_recipes] without creating anything.
/// Used to find circular dependencies ahead of time and to visualize the wiring.
pub struct DependencyGraph {
    nodes: Vec<DependencyGraphEntry>,
    index: HashMap<RecipeId, usize>,
    /// Problems found while collecting the nested recipes
    problems: Vec<DependencyGraphError>,
}

struct DependencyGraphEntry {
    label: String,
    dependencies: Vec<RecipeId>,
}

impl DependencyGraph {
    pub fn new(repository: &Repository) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            problems: Vec::new(),
        };

        for recipe in repository.recipes() {
            graph.add(repository, recipe);
        }

        graph
    }

    fn add(&mut self, repository: &Repository, recipe: &RecipeRef) {
        let id = RecipeId::of(recipe);
        if self.index.contains_key(&id) {
            return;
        }

        let label = display_name(recipe.as_ref());
        self.index.insert(id, self.nodes.len());
        let position = self.nodes.len();
        self.nodes.push(DependencyGraphEntry {
            label: label.clone(),
            dependencies: Vec::new(),
        });

        let nested = match recipe.nested_recipes(repository) {
            Ok(nested) => nested,
            Err(RecipeError::NoSuchComponent(dependency)) => {
                self.problems.push(DependencyGraphError::MissingDependency {
                    dependency,
                    required_by: label,
                });
                return;
            }
            Err(error) => {
                self.problems.push(DependencyGraphError::Definition {
                    recipe: label,
                    message: error.to_string(),
                });
                return;
            }
        };

        self.nodes[position].dependencies = nested.iter().map(RecipeId::of).collect();
        for dependency in &nested {
            self.add(repository, dependency);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Names of the direct dependencies of the first recipe labeled `name`
    pub fn dependencies_of(&self, name: &str) -> Option<Vec<&str>> {
        let entry = self.nodes.iter().find(|entry| entry.label == name)?;
        Some(
            entry
                .dependencies
                .iter()
                .filter_map(|id| self.index.get(id))
                .map(|position| self.nodes[*position].label.as_str())
                .collect(),
        )
    }

    /// Validate the graph
    ///
    /// Returns a list of all issues
    pub fn check(&self) -> Result<(), DependencyGraphErrors> {
        let mut checked = HashSet::new();
        let mut errors = self.problems.clone();
        for position in 0..self.nodes.len() {
            let mut dependency_chain = Vec::new();
            check_recurse(
                self,
                &mut checked,
                &mut errors,
                &mut dependency_chain,
                position,
            );
        }

        if !errors.is_empty() {
            return Err(DependencyGraphErrors { errors });
        }

        return Ok(());

        fn check_recurse(
            graph: &DependencyGraph,
            checked: &mut HashSet<usize>,
            errors: &mut Vec<DependencyGraphError>,
            dependency_chain: &mut Vec<usize>,
            position: usize,
        ) {
            // Circular Dependency Check
            if let Some(start) = dependency_chain.iter().position(|p| *p == position) {
                let mut chain: Vec<String> = dependency_chain[start..]
                    .iter()
                    .map(|p| graph.nodes[*p].label.clone())
                    .collect();
                let from = chain.last().cloned().unwrap_or_default();
                let to = graph.nodes[position].label.clone();
                chain.push(to.clone()); // Add current so chain is complete

                errors.push(DependencyGraphError::CircularDependency { from, to, chain });
                return;
            }

            // Skip other checks if already checked
            if !checked.insert(position) {
                return;
            };

            dependency_chain.push(position);

            for dependency in &graph.nodes[position].dependencies {
                if let Some(next) = graph.index.get(dependency) {
                    check_recurse(graph, checked, errors, dependency_chain, *next);
                }
            }

            dependency_chain.pop();
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyGraphError {
    #[error("'{required_by}' needs '{dependency}' but it is missing")]
    MissingDependency {
        dependency: String,
        required_by: String,
    },
    #[error("'{recipe}' is not defined correctly: {message}")]
    Definition { recipe: String, message: String },
    #[error("A Circular Dependency exists between '{from}' and '{to}' through {chain:?} - Consider registering a partial object")]
    CircularDependency {
        from: String,
        to: String,
        chain: Vec<String>,
    },
}
impl std::fmt::Display for DependencyGraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

#[derive(Error, Debug, Clone)]
pub struct DependencyGraphErrors {
    pub errors: Vec<DependencyGraphError>,
}
