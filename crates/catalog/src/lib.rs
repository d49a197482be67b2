pub mod dish;
pub mod filter;
pub mod repository;

pub use dish::{CatalogError, Dish, DishIngredient};
pub use filter::{exclude_dishes, exclude_ingredients};
pub use repository::{DishRepository, InMemoryDishRepository};
