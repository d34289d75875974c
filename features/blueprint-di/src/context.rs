use std::{
    marker::PhantomData,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use crate::{
    errors::{ContextError, RecipeError},
    recipe::{display_name, RecipeExt, RecipeRef},
    repository::{Repository, RepositoryObject},
    services::{ClassResolver, ConversionService},
    types::{TypeDescriptor, Value},
};

/// State of a single top-level build
///
/// Holds the stack of recipes currently being built, which is used to detect circular
/// dependencies, and gives recipes access to the repository and the collaborators.
/// The context is handed through every call by `&mut`, so only one thread can use it at a time.
pub struct ExecutionContext<'r> {
    stack: Vec<RecipeRef>,
    repository: &'r mut Repository,
    converter: Arc<dyn ConversionService>,
    class_resolver: Arc<dyn ClassResolver>,
}

impl<'r> ExecutionContext<'r> {
    pub fn new(
        repository: &'r mut Repository,
        converter: Arc<dyn ConversionService>,
        class_resolver: Arc<dyn ClassResolver>,
    ) -> Self {
        Self {
            stack: Vec::new(),
            repository,
            converter,
            class_resolver,
        }
    }

    /// Adds a recipe to the top of the build stack
    ///
    /// Fails without touching the stack if the same recipe is already being built.
    pub fn push(&mut self, recipe: RecipeRef) -> Result<(), RecipeError> {
        if self
            .stack
            .iter()
            .any(|on_stack| Arc::ptr_eq(on_stack, &recipe))
        {
            let name = display_name(recipe.as_ref());
            let mut path = self.build_path();
            path.push(name.clone());

            tracing::debug!("Circular dependency on '{name}' through {}", path.join(" -> "));
            return Err(RecipeError::CircularDependency { recipe: name, path });
        }

        tracing::trace!(depth = self.stack.len(), "Pushing '{}'", display_name(recipe.as_ref()));
        self.stack.push(recipe);
        Ok(())
    }

    /// Removes the top recipe from the build stack
    ///
    /// # Panics
    /// If the stack is empty, every pop must be paired with a push
    pub fn pop(&mut self) -> RecipeRef {
        let recipe = self
            .stack
            .pop()
            .expect("pop called on an empty build stack");
        tracing::trace!(depth = self.stack.len(), "Popped '{}'", display_name(recipe.as_ref()));
        recipe
    }

    /// Number of recipes currently being built
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Names of the recipes currently being built, outermost first
    pub fn build_path(&self) -> Vec<String> {
        self.stack
            .iter()
            .map(|recipe| display_name(recipe.as_ref()))
            .collect()
    }

    /// Pushes `recipe` and returns a frame which pops it again once dropped
    pub(crate) fn enter(&mut self, recipe: RecipeRef) -> Result<StackFrame<'_, 'r>, RecipeError> {
        self.push(recipe.clone())?;
        Ok(StackFrame { ctx: self, recipe })
    }

    /// Creates `recipe` in this context
    pub fn create(&mut self, recipe: &RecipeRef) -> Result<Value, RecipeError> {
        recipe.create(self)
    }

    /// Returns the object registered under `name`, building its recipe if required
    pub fn get_or_create(&mut self, name: &str) -> Result<Value, RecipeError> {
        match self.get_object(name) {
            Some(RepositoryObject::Object(value)) => Ok(value),
            Some(RepositoryObject::Recipe(recipe)) => recipe.create(self),
            None => Err(RecipeError::NoSuchComponent(name.to_owned())),
        }
    }

    pub fn repository(&self) -> &Repository {
        &*self.repository
    }

    pub fn contains_object(&self, name: &str) -> bool {
        self.repository.contains_object(name)
    }

    pub fn get_object(&self, name: &str) -> Option<RepositoryObject> {
        self.repository.get_object(name)
    }

    /// Registers a finished object
    pub fn add_object(&mut self, name: &str, value: Value) -> Result<(), RecipeError> {
        self.repository.add_object(name, value, false)
    }

    /// Registers an object, `partial` objects are not yet visible as created
    pub fn register_object(
        &mut self,
        name: &str,
        value: Value,
        partial: bool,
    ) -> Result<(), RecipeError> {
        self.repository.add_object(name, value, partial)
    }

    pub(crate) fn discard_partial(&mut self, name: &str) -> bool {
        self.repository.discard_partial(name)
    }

    pub fn contains_created_object(&self, name: &str) -> bool {
        self.repository.contains_created_object(name)
    }

    pub fn get_created_object(&self, name: &str) -> Option<Value> {
        self.repository.get_created_object(name)
    }

    pub fn get_created_recipes(&self) -> Vec<RecipeRef> {
        self.repository.get_created_recipes()
    }

    /// Converts `value` using the conversion service
    ///
    /// The service receives this context, so anything it builds is part of the same build.
    pub fn convert(&mut self, value: Value, target: &TypeDescriptor) -> Result<Value, RecipeError> {
        if value.is_instance_of(target) {
            return Ok(value);
        }
        let converter = self.converter.clone();
        converter
            .convert(value, target, self)
            .map_err(RecipeError::Conversion)
    }

    /// Resolves a type by name using the class resolver
    pub fn load_class(&self, class_name: &str) -> Result<TypeDescriptor, RecipeError> {
        self.class_resolver
            .load_class(class_name)
            .ok_or_else(|| RecipeError::ClassNotFound(class_name.to_owned()))
    }
}

/// A recipe on the build stack
///
/// Dropping the frame pops the recipe, so the stack is cleaned up on every exit path.
pub(crate) struct StackFrame<'c, 'r> {
    ctx: &'c mut ExecutionContext<'r>,
    recipe: RecipeRef,
}
impl<'r> Deref for StackFrame<'_, 'r> {
    type Target = ExecutionContext<'r>;

    fn deref(&self) -> &Self::Target {
        &*self.ctx
    }
}
impl<'r> DerefMut for StackFrame<'_, 'r> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.ctx
    }
}
impl Drop for StackFrame<'_, '_> {
    fn drop(&mut self) {
        // Don't panic here, we might already be unwinding
        match self.ctx.stack.pop() {
            Some(popped) if Arc::ptr_eq(&popped, &self.recipe) => {}
            Some(popped) => tracing::error!(
                "Build stack is corrupt: expected '{}' to be popped but was '{}'",
                display_name(self.recipe.as_ref()),
                display_name(popped.as_ref())
            ),
            None => tracing::error!(
                "Build stack is corrupt: '{}' was removed by someone else",
                display_name(self.recipe.as_ref())
            ),
        }
    }
}

/// Explicit association of an [ExecutionContext] with the current thread
///
/// The slot is not `Send`, a context installed here stays on the thread owning the slot.
pub struct ContextSlot<'r> {
    current: Option<ExecutionContext<'r>>,
    _not_send: PhantomData<*const ()>,
}
impl Default for ContextSlot<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> ContextSlot<'r> {
    pub fn new() -> Self {
        Self {
            current: None,
            _not_send: PhantomData,
        }
    }

    pub fn is_context_set(&self) -> bool {
        self.current.is_some()
    }

    /// The installed context
    pub fn context(&mut self) -> Result<&mut ExecutionContext<'r>, ContextError> {
        self.current.as_mut().ok_or(ContextError::NotSet)
    }

    /// Installs `context` and returns the previously installed one
    ///
    /// The caller is responsible for restoring the previous context, see [ContextSlot::enter]
    /// for a version which does that automatically.
    pub fn set_context(
        &mut self,
        context: Option<ExecutionContext<'r>>,
    ) -> Option<ExecutionContext<'r>> {
        std::mem::replace(&mut self.current, context)
    }

    /// Installs `context` until the returned scope is dropped or exited
    pub fn enter(&mut self, context: ExecutionContext<'r>) -> ContextScope<'_, 'r> {
        let previous = self.set_context(Some(context));
        ContextScope {
            slot: self,
            previous: Some(previous),
        }
    }
}

/// A context installed in a [ContextSlot]
///
/// Restores the previously installed context when dropped.
pub struct ContextScope<'s, 'r> {
    slot: &'s mut ContextSlot<'r>,
    previous: Option<Option<ExecutionContext<'r>>>,
}

impl<'r> ContextScope<'_, 'r> {
    pub fn context(&mut self) -> &mut ExecutionContext<'r> {
        self.slot
            .current
            .as_mut()
            .expect("scope always holds its context")
    }

    /// Restores the previous context and returns the one installed by this scope
    pub fn exit(mut self) -> Option<ExecutionContext<'r>> {
        let previous = self.previous.take().flatten();
        self.slot.set_context(previous)
    }
}
impl Drop for ContextScope<'_, '_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.slot.current = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        recipes::{RefRecipe, ValueRecipe},
        services::{PassthroughConverter, TypeRegistry},
    };

    fn context(repository: &mut Repository) -> ExecutionContext<'_> {
        ExecutionContext::new(
            repository,
            Arc::new(PassthroughConverter),
            Arc::new(TypeRegistry::with_builtins()),
        )
    }

    fn recipe(name: &str) -> RecipeRef {
        Arc::new(ValueRecipe::new(name, name))
    }

    #[test]
    fn pop_returns_pushed_recipes_in_reverse_order() {
        let mut repository = Repository::new();
        let mut ctx = context(&mut repository);
        let recipes = vec![recipe("a"), recipe("b"), recipe("c")];

        for recipe in &recipes {
            ctx.push(recipe.clone()).unwrap();
        }
        assert_eq!(ctx.build_path(), vec!["a", "b", "c"]);

        for expected in recipes.iter().rev() {
            assert!(Arc::ptr_eq(&ctx.pop(), expected));
        }
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn pushing_a_recipe_twice_fails_and_keeps_the_stack() {
        let mut repository = Repository::new();
        let mut ctx = context(&mut repository);
        let a = recipe("a");
        let b = recipe("b");
        ctx.push(a.clone()).unwrap();
        ctx.push(b.clone()).unwrap();

        let result = ctx.push(a.clone());

        match result {
            Err(RecipeError::CircularDependency { recipe, path }) => {
                assert_eq!(recipe, "a");
                assert_eq!(path, vec!["a", "b", "a"]);
            }
            other => panic!("expected circular dependency, got {other:?}"),
        }
        assert_eq!(ctx.build_path(), vec!["a", "b"]);
        assert!(Arc::ptr_eq(&ctx.pop(), &b));
        assert!(Arc::ptr_eq(&ctx.pop(), &a));
    }

    #[test]
    fn identity_not_name_decides_reentry() {
        let mut repository = Repository::new();
        let mut ctx = context(&mut repository);

        ctx.push(recipe("same")).unwrap();
        ctx.push(recipe("same")).unwrap();

        assert_eq!(ctx.depth(), 2);
    }

    #[test]
    #[should_panic(expected = "empty build stack")]
    fn pop_on_empty_stack_panics() {
        let mut repository = Repository::new();
        let mut ctx = context(&mut repository);
        ctx.pop();
    }

    #[test]
    fn get_or_create_builds_and_reports_missing() {
        let mut repository = Repository::new();
        repository.add_recipe(recipe("a")).unwrap();
        let mut ctx = context(&mut repository);

        assert_eq!(ctx.get_or_create("a").unwrap(), Value::from("a"));
        assert!(ctx.contains_created_object("a"));
        assert!(matches!(
            ctx.get_or_create("missing"),
            Err(RecipeError::NoSuchComponent(name)) if name == "missing"
        ));
    }

    #[test]
    fn load_class_reports_unknown_types() {
        let mut repository = Repository::new();
        let ctx = context(&mut repository);

        assert_eq!(ctx.load_class("int").unwrap(), TypeDescriptor::Int);
        assert!(matches!(
            ctx.load_class("com.example.Missing"),
            Err(RecipeError::ClassNotFound(name)) if name == "com.example.Missing"
        ));
    }

    struct BuildingConverter {
        source: RecipeRef,
    }
    impl ConversionService for BuildingConverter {
        fn convert(
            &self,
            _: Value,
            _: &TypeDescriptor,
            ctx: &mut ExecutionContext<'_>,
        ) -> Result<Value, crate::types::DynError> {
            Ok(self.source.create(ctx)?)
        }
    }

    #[test]
    fn conversion_runs_in_the_same_context() {
        // The converter builds "a" again while "a" is converting its own value
        let a: RecipeRef = Arc::new(ValueRecipe::new("a", "raw").with_type("int"));
        let mut repository = Repository::new();
        repository.add_recipe(a.clone()).unwrap();
        let mut ctx = ExecutionContext::new(
            &mut repository,
            Arc::new(BuildingConverter { source: a.clone() }),
            Arc::new(TypeRegistry::with_builtins()),
        );

        let result = a.create(&mut ctx);

        match result {
            Err(RecipeError::Conversion(error)) => {
                assert!(error.to_string().contains("Circular dependency"));
            }
            other => panic!("expected conversion failure, got {other:?}"),
        }
        assert_eq!(ctx.depth(), 0);
        assert!(!ctx.contains_created_object("a"));
    }

    #[test]
    fn slot_set_context_returns_previous() {
        let mut first_repository = Repository::new();
        let mut second_repository = Repository::new();
        second_repository.add_object("marker", Value::Bool(true), false).unwrap();
        let mut slot = ContextSlot::new();

        assert!(!slot.is_context_set());
        assert_eq!(slot.context().err(), Some(ContextError::NotSet));

        assert!(slot.set_context(Some(context(&mut first_repository))).is_none());
        let previous = slot.set_context(Some(context(&mut second_repository)));

        assert!(previous.is_some());
        assert!(slot.context().unwrap().contains_object("marker"));

        let restored = slot.set_context(previous);
        assert!(restored.unwrap().contains_object("marker"));
        assert!(!slot.context().unwrap().contains_object("marker"));
    }

    #[test]
    fn slot_scope_restores_previous_context() {
        let mut outer_repository = Repository::new();
        let mut inner_repository = Repository::new();
        inner_repository
            .add_recipe(Arc::new(RefRecipe::new("alias", "target")))
            .unwrap();
        inner_repository.add_recipe(recipe("target")).unwrap();
        let mut slot = ContextSlot::new();
        slot.set_context(Some(context(&mut outer_repository)));

        {
            let mut scope = slot.enter(context(&mut inner_repository));
            let value = scope.context().get_or_create("alias").unwrap();
            assert_eq!(value, Value::from("target"));
        }

        assert!(slot.is_context_set());
        assert!(!slot.context().unwrap().contains_object("alias"));
    }

    #[test]
    fn slot_scope_exit_hands_back_context() {
        let mut repository = Repository::new();
        let mut slot = ContextSlot::new();

        let scope = slot.enter(context(&mut repository));
        let exited = scope.exit();

        assert!(exited.is_some());
        assert!(!slot.is_context_set());
    }
}
