use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::auth::Caller;
use crate::database::models::{Label, LabelKind, NewRecipe, NewToken, NewUser, Recipe, RecipeFilter, User, UserChanges};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email '{0}' is already registered")]
    DuplicateEmail(String),

    /// A recipe referenced an ingredient or tag the caller does not own
    #[error("{kind} {id} does not exist")]
    UnknownReference { kind: LabelKind, id: i64 },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    /// Errors that mean the backend could not be reached rather than that the
    /// statement failed
    pub fn is_unavailable(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Sqlx(err) => matches!(
                err,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            _ => false,
        }
    }
}

/// Persistence boundary for the API.
///
/// Every owned-resource method takes the resolved [`Caller`]; there is no way
/// to name another user's rows through this trait.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round trip used by the health endpoint
    async fn ping(&self) -> Result<(), StoreError>;

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn update_user(&self, caller: &Caller, changes: UserChanges) -> Result<User, StoreError>;

    async fn insert_token(&self, token: NewToken) -> Result<(), StoreError>;
    /// Look up the user bound to a token digest, ignoring tokens expired at `now`
    async fn user_for_token(&self, digest: &str, now: DateTime<Utc>) -> Result<Option<User>, StoreError>;
    /// Delete the token the caller authenticated with
    async fn revoke_token(&self, caller: &Caller) -> Result<bool, StoreError>;

    async fn list_labels(&self, caller: &Caller, kind: LabelKind, assigned_only: bool) -> Result<Vec<Label>, StoreError>;
    async fn create_label(&self, caller: &Caller, kind: LabelKind, name: &str) -> Result<Label, StoreError>;

    async fn list_recipes(&self, caller: &Caller, filter: &RecipeFilter) -> Result<Vec<Recipe>, StoreError>;
    /// Persist a recipe and its links atomically; every referenced id must be
    /// owned by the caller
    async fn create_recipe(&self, caller: &Caller, recipe: NewRecipe) -> Result<Recipe, StoreError>;
}
