use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::Caller;
use crate::database::models::{Label, LabelKind, NewRecipe, NewToken, NewUser, Recipe, RecipeFilter, User, UserChanges};
use crate::database::store::{Store, StoreError};

const USER_COLUMNS: &str = "id, email, name, password_hash, is_active, created_at";

#[derive(Debug, FromRow)]
struct RecipeRow {
    id: i64,
    name: String,
    time_minutes: i32,
    price: Decimal,
    link: Option<String>,
}

impl RecipeRow {
    fn into_recipe(self, ingredients: Vec<i64>, tags: Vec<i64>) -> Recipe {
        Recipe {
            id: self.id,
            name: self.name,
            time_minutes: self.time_minutes,
            price: self.price,
            link: self.link,
            ingredients,
            tags,
        }
    }
}

/// Postgres-backed store. Owned tables carry an `owner_id` column and every
/// query below filters on it.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Link rows for a set of recipes, grouped by recipe id
    async fn load_links(&self, kind: LabelKind, recipe_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>, StoreError> {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT recipe_id, {col} FROM {table} WHERE recipe_id = ANY($1) ORDER BY recipe_id, {col}",
            col = kind.link_column(),
            table = kind.link_table(),
        );
        let rows: Vec<(i64, i64)> = sqlx::query_as(&sql).bind(recipe_ids).fetch_all(&self.pool).await?;

        let mut links: HashMap<i64, Vec<i64>> = HashMap::new();
        for (recipe_id, label_id) in rows {
            links.entry(recipe_id).or_default().push(label_id);
        }
        Ok(links)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, email, name, password_hash) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::DuplicateEmail(user.email.clone())
                } else {
                    e.into()
                }
            })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, caller: &Caller, changes: UserChanges) -> Result<User, StoreError> {
        let sql = format!(
            "UPDATE users SET name = COALESCE($2, name), password_hash = COALESCE($3, password_hash) \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(caller.id())
            .bind(changes.name)
            .bind(changes.password_hash)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::Unavailable(format!("user {} vanished", caller.id())))
    }

    async fn insert_token(&self, token: NewToken) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO auth_tokens (token_hash, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&token.digest)
            .bind(token.user_id)
            .bind(token.expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn user_for_token(&self, digest: &str, now: DateTime<Utc>) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT u.id, u.email, u.name, u.password_hash, u.is_active, u.created_at
             FROM auth_tokens t
             JOIN users u ON u.id = t.user_id
             WHERE t.token_hash = $1
             AND (t.expires_at IS NULL OR t.expires_at > $2)",
        )
        .bind(digest)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn revoke_token(&self, caller: &Caller) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE token_hash = $1 AND user_id = $2")
            .bind(caller.token_digest())
            .bind(caller.id())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_labels(&self, caller: &Caller, kind: LabelKind, assigned_only: bool) -> Result<Vec<Label>, StoreError> {
        let sql = format!(
            "SELECT l.id, l.name FROM {table} l
             WHERE l.owner_id = $1
             AND (NOT $2 OR EXISTS (SELECT 1 FROM {link} r WHERE r.{col} = l.id))
             ORDER BY l.name COLLATE \"C\" DESC, l.id DESC",
            table = kind.table(),
            link = kind.link_table(),
            col = kind.link_column(),
        );
        let labels = sqlx::query_as::<_, Label>(&sql)
            .bind(caller.id())
            .bind(assigned_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(labels)
    }

    async fn create_label(&self, caller: &Caller, kind: LabelKind, name: &str) -> Result<Label, StoreError> {
        let sql = format!(
            "INSERT INTO {} (owner_id, name) VALUES ($1, $2) RETURNING id, name",
            kind.table()
        );
        let label = sqlx::query_as::<_, Label>(&sql)
            .bind(caller.id())
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(label)
    }

    async fn list_recipes(&self, caller: &Caller, filter: &RecipeFilter) -> Result<Vec<Recipe>, StoreError> {
        let rows = sqlx::query_as::<_, RecipeRow>(
            "SELECT id, name, time_minutes, price, link FROM recipes
             WHERE owner_id = $1
             AND (cardinality($2::bigint[]) = 0
                  OR id IN (SELECT recipe_id FROM recipe_ingredients WHERE ingredient_id = ANY($2)))
             AND (cardinality($3::bigint[]) = 0
                  OR id IN (SELECT recipe_id FROM recipe_tags WHERE tag_id = ANY($3)))
             ORDER BY name COLLATE \"C\" DESC, id DESC",
        )
        .bind(caller.id())
        .bind(filter.ingredients.as_slice())
        .bind(filter.tags.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut ingredients = self.load_links(LabelKind::Ingredient, &ids).await?;
        let mut tags = self.load_links(LabelKind::Tag, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                row.into_recipe(
                    ingredients.remove(&id).unwrap_or_default(),
                    tags.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn create_recipe(&self, caller: &Caller, recipe: NewRecipe) -> Result<Recipe, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Every referenced id must belong to the caller; dropping `tx` rolls back
        for kind in [LabelKind::Ingredient, LabelKind::Tag] {
            let wanted = recipe.labels(kind);
            if wanted.is_empty() {
                continue;
            }
            let sql = format!("SELECT id FROM {} WHERE owner_id = $1 AND id = ANY($2)", kind.table());
            let owned: Vec<i64> = sqlx::query_scalar(&sql)
                .bind(caller.id())
                .bind(wanted)
                .fetch_all(&mut *tx)
                .await?;
            if let Some(&id) = wanted.iter().find(|id| !owned.contains(id)) {
                return Err(StoreError::UnknownReference { kind, id });
            }
        }

        let row = sqlx::query_as::<_, RecipeRow>(
            "INSERT INTO recipes (owner_id, name, time_minutes, price, link)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, time_minutes, price, link",
        )
        .bind(caller.id())
        .bind(&recipe.name)
        .bind(recipe.time_minutes)
        .bind(recipe.price)
        .bind(&recipe.link)
        .fetch_one(&mut *tx)
        .await?;

        for kind in [LabelKind::Ingredient, LabelKind::Tag] {
            let ids = recipe.labels(kind);
            if ids.is_empty() {
                continue;
            }
            let sql = format!(
                "INSERT INTO {} (recipe_id, {}) SELECT $1, UNNEST($2::bigint[])",
                kind.link_table(),
                kind.link_column()
            );
            sqlx::query(&sql).bind(row.id).bind(ids).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        tracing::debug!("Created recipe {} for user {}", row.id, caller.id());

        Ok(row.into_recipe(recipe.ingredients, recipe.tags))
    }
}
