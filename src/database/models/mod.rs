pub mod label;
pub mod recipe;
pub mod token;
pub mod user;

pub use label::{Label, LabelKind};
pub use recipe::{NewRecipe, Recipe, RecipeFilter};
pub use token::NewToken;
pub use user::{NewUser, User, UserChanges, UserProfile};

use std::cmp::Ordering;

/// Listing order shared by every owned resource: name descending, then id
/// descending so equal names come back in the same order on every call.
/// Compares bytes, matching the `COLLATE "C"` ordering used in Postgres.
pub fn by_name_desc(a_name: &str, a_id: i64, b_name: &str, b_id: i64) -> Ordering {
    b_name.cmp(a_name).then_with(|| b_id.cmp(&a_id))
}
