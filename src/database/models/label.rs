use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Ingredient or tag: the name-only owned resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Label {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Ingredient,
    Tag,
}

impl LabelKind {
    pub fn table(self) -> &'static str {
        match self {
            LabelKind::Ingredient => "ingredients",
            LabelKind::Tag => "tags",
        }
    }

    /// Join table linking recipes to this kind
    pub fn link_table(self) -> &'static str {
        match self {
            LabelKind::Ingredient => "recipe_ingredients",
            LabelKind::Tag => "recipe_tags",
        }
    }

    pub fn link_column(self) -> &'static str {
        match self {
            LabelKind::Ingredient => "ingredient_id",
            LabelKind::Tag => "tag_id",
        }
    }

    /// Field name used in recipe payloads and validation errors
    pub fn field(self) -> &'static str {
        self.table()
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelKind::Ingredient => write!(f, "ingredient"),
            LabelKind::Tag => write!(f, "tag"),
        }
    }
}
