pub mod list;
pub mod reference;
pub mod reference_name;
pub mod value;

pub use list::ListRecipe;
pub use reference::RefRecipe;
pub use reference_name::ReferenceNameRecipe;
pub use value::ValueRecipe;
