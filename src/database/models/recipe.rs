use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::label::LabelKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub ingredients: Vec<i64>,
    pub tags: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub name: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub ingredients: Vec<i64>,
    pub tags: Vec<i64>,
}

impl NewRecipe {
    pub fn labels(&self, kind: LabelKind) -> &[i64] {
        match kind {
            LabelKind::Ingredient => &self.ingredients,
            LabelKind::Tag => &self.tags,
        }
    }
}

/// Recipe list filter; an empty list means "no constraint"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub ingredients: Vec<i64>,
    pub tags: Vec<i64>,
}

impl RecipeFilter {
    /// A recipe matches when it references any requested ingredient and any
    /// requested tag
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let any = |wanted: &[i64], have: &[i64]| wanted.is_empty() || wanted.iter().any(|id| have.contains(id));
        any(&self.ingredients, &recipe.ingredients) && any(&self.tags, &recipe.tags)
    }
}
