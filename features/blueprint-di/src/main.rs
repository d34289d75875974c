use std::sync::Arc;

use blueprint_di::{
    BlueprintContainer, ContextSlot, DynError, FactoryRecipe, ListRecipe, RecipeError, RecipeRef,
    RefRecipe, ReferenceNameRecipe, Value, ValueRecipe,
};

fn main() -> Result<(), DynError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let greeting: RecipeRef = Arc::new(ValueRecipe::new("greeting", "hello"));
    let mut container = BlueprintContainer::builder()
        .add_recipe_ref(greeting.clone())
        .add_recipe(FactoryRecipe::from_fn(
            "greeter",
            vec![greeting.clone()],
            move |ctx| -> Result<Greeter, RecipeError> {
                let greeting = ctx.create(&greeting)?;
                Ok(Greeter {
                    greeting: greeting.as_str().unwrap_or_default().to_owned(),
                })
            },
        ))
        .add_recipe(ReferenceNameRecipe::new("greeter").named("greeter-name"))
        .add_recipe(
            ListRecipe::new("ports")
                .with_item(Arc::new(ValueRecipe::anonymous(8080_i64)))
                .with_item(Arc::new(ValueRecipe::anonymous(8081_i64))),
        )
        .add_recipe(RefRecipe::new("ping", "pong"))
        .add_recipe(RefRecipe::new("pong", "ping"))
        .validate_on_build(false)
        .build()?;

    if let Err(errors) = container.graph().check() {
        println!("{errors}");
    }

    println!("{:?}", container.create("greeter-name")?);
    let greeter = container.require::<Greeter>("greeter")?;
    println!("{greeter:?}");

    let ports: Vec<i64> = container
        .create("ports")?
        .as_list()
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_int)
        .collect();
    println!("ports {ports:?}");

    {
        let mut slot = ContextSlot::new();
        let mut scope = slot.enter(container.execution_context());
        match scope.context().get_or_create("ping") {
            Err(error) => println!("{error}"),
            Ok(value) => println!("unexpected {value}"),
        }
    }

    println!("{container:?}");
    Ok(())
}

#[derive(Debug)]
struct Greeter {
    greeting: String,
}
