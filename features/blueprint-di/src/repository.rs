use std::{
    collections::HashMap,
    fmt::{self, Debug},
};

use crate::{
    errors::RecipeError,
    recipe::{display_name, RecipeRef},
    types::Value,
};

/// What the repository knows about a name
#[derive(Clone)]
pub enum RepositoryObject {
    /// Not built yet, the recipe which will build it
    Recipe(RecipeRef),
    /// A realized object, either finished or partially wired
    Object(Value),
}
impl Debug for RepositoryObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryObject::Recipe(recipe) => f
                .debug_tuple("Recipe")
                .field(&display_name(recipe.as_ref()))
                .finish(),
            RepositoryObject::Object(value) => f.debug_tuple("Object").field(value).finish(),
        }
    }
}

enum EntryState {
    Unresolved,
    Partial(Value),
    Created(Value),
}

struct Entry {
    recipe: Option<RecipeRef>,
    state: EntryState,
}

/// Arena of named entries shared by every build of a container
///
/// Each name moves from unresolved through an optional partial state to created.
/// A failed build discards its partial object, so the name is unresolved again and can be
/// retried. Registering an object over a recipe entry counts as that recipe's creation.
#[derive(Default)]
pub struct Repository {
    entries: HashMap<String, Entry>,
    /// Names in the order they were first registered
    registration_order: Vec<String>,
    /// Names in the order they reached the created state
    creation_order: Vec<String>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers a named recipe
    ///
    /// Fails if the recipe has no name or the name is already taken.
    pub fn add_recipe(&mut self, recipe: RecipeRef) -> Result<(), RecipeError> {
        let Some(name) = recipe.name().map(str::to_owned) else {
            return Err(RecipeError::definition(
                "Anonymous recipes can not be registered",
            ));
        };

        if self.entries.contains_key(&name) {
            tracing::error!("Tried to register '{name}' twice");
            return Err(RecipeError::definition(format!(
                "Name '{name}' is already registered"
            )));
        }

        tracing::trace!("Registered recipe for '{name}'");
        self.registration_order.push(name.clone());
        self.entries.insert(
            name,
            Entry {
                recipe: Some(recipe),
                state: EntryState::Unresolved,
            },
        );
        Ok(())
    }

    /// Whether anything, recipe or object, is registered under `name`
    pub fn contains_object(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The object registered under `name`, or the recipe that will build it
    ///
    /// Partial objects are returned as objects.
    pub fn get_object(&self, name: &str) -> Option<RepositoryObject> {
        let entry = self.entries.get(name)?;
        match &entry.state {
            EntryState::Created(value) | EntryState::Partial(value) => {
                Some(RepositoryObject::Object(value.clone()))
            }
            EntryState::Unresolved => entry.recipe.clone().map(RepositoryObject::Recipe),
        }
    }

    /// Registers an object under `name`
    ///
    /// A partial object stays invisible to the created-object queries until the same name is
    /// registered again without the partial flag. Registering over an already created object
    /// is a definition conflict.
    pub fn add_object(
        &mut self,
        name: &str,
        value: Value,
        partial: bool,
    ) -> Result<(), RecipeError> {
        if !self.entries.contains_key(name) {
            self.registration_order.push(name.to_owned());
        }
        let entry = self.entries.entry(name.to_owned()).or_insert(Entry {
            recipe: None,
            state: EntryState::Unresolved,
        });

        if let EntryState::Created(existing) = &entry.state {
            tracing::error!("Tried to register '{name}' over the created object {existing}");
            return Err(RecipeError::definition(format!(
                "Name '{name}' is already registered to instance {existing}"
            )));
        }

        if partial {
            tracing::trace!("Registered partial object for '{name}'");
            entry.state = EntryState::Partial(value);
        } else {
            tracing::debug!("Registered created object for '{name}'");
            entry.state = EntryState::Created(value);
            self.creation_order.push(name.to_owned());
        }
        Ok(())
    }

    /// Drops a partial object left behind by a failed build
    ///
    /// A recipe entry goes back to unresolved. A partial object registered without a recipe
    /// is removed. Created entries are never touched. Returns whether anything was discarded.
    pub fn discard_partial(&mut self, name: &str) -> bool {
        let Some(entry) = self.entries.get_mut(name) else {
            return false;
        };
        if !matches!(entry.state, EntryState::Partial(_)) {
            return false;
        }

        tracing::debug!("Discarding partial object for '{name}'");
        if entry.recipe.is_some() {
            entry.state = EntryState::Unresolved;
        } else {
            self.entries.remove(name);
            self.registration_order.retain(|registered| registered != name);
        }
        true
    }

    pub fn contains_created_object(&self, name: &str) -> bool {
        matches!(
            self.entries.get(name),
            Some(Entry {
                state: EntryState::Created(_),
                ..
            })
        )
    }

    pub fn get_created_object(&self, name: &str) -> Option<Value> {
        match &self.entries.get(name)?.state {
            EntryState::Created(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Recipes whose object has been created, in creation order
    ///
    /// Objects registered without a recipe are not included. An object registered over a
    /// recipe entry lists that recipe, even though the recipe itself never ran.
    pub fn get_created_recipes(&self) -> Vec<RecipeRef> {
        self.creation_order
            .iter()
            .filter_map(|name| self.entries.get(name)?.recipe.clone())
            .collect()
    }

    /// The recipe registered under `name`, regardless of its state
    pub fn recipe(&self, name: &str) -> Option<RecipeRef> {
        self.entries.get(name)?.recipe.clone()
    }

    /// All registered recipes in registration order
    pub fn recipes(&self) -> impl Iterator<Item = &RecipeRef> + '_ {
        self.registration_order
            .iter()
            .filter_map(|name| self.entries.get(name)?.recipe.as_ref())
    }

    /// All registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.registration_order.iter().map(String::as_str)
    }

    pub(crate) fn state_label(&self, name: &str) -> Option<&'static str> {
        Some(match self.entries.get(name)?.state {
            EntryState::Unresolved => "unresolved",
            EntryState::Partial(_) => "partial",
            EntryState::Created(_) => "created",
        })
    }
}

impl Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_struct("Repository");
        for name in self.names() {
            map.field(name, &self.state_label(name).unwrap_or("unknown"));
        }
        map.finish()
    }
}
