//! In-process store used in development and tests.
//!
//! All tables sit behind one `RwLock`; every write takes the write lock for
//! the whole operation so creates are atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::Caller;
use crate::database::models::{
    by_name_desc, Label, LabelKind, NewRecipe, NewToken, NewUser, Recipe, RecipeFilter, User, UserChanges,
};
use crate::database::store::{Store, StoreError};

#[derive(Debug, Clone)]
struct TokenRow {
    user_id: Uuid,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct Owned<T> {
    owner: Uuid,
    row: T,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    emails: HashMap<String, Uuid>,
    tokens: HashMap<String, TokenRow>,
    ingredients: BTreeMap<i64, Owned<Label>>,
    tags: BTreeMap<i64, Owned<Label>>,
    recipes: BTreeMap<i64, Owned<Recipe>>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn labels(&self, kind: LabelKind) -> &BTreeMap<i64, Owned<Label>> {
        match kind {
            LabelKind::Ingredient => &self.ingredients,
            LabelKind::Tag => &self.tags,
        }
    }

    fn labels_mut(&mut self, kind: LabelKind) -> &mut BTreeMap<i64, Owned<Label>> {
        match kind {
            LabelKind::Ingredient => &mut self.ingredients,
            LabelKind::Tag => &mut self.tags,
        }
    }

    fn owns_label(&self, owner: Uuid, kind: LabelKind, id: i64) -> bool {
        self.labels(kind).get(&id).map_or(false, |label| label.owner == owner)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.emails.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.emails.insert(created.email.clone(), created.id);
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .emails
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn update_user(&self, caller: &Caller, changes: UserChanges) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&caller.id())
            .ok_or_else(|| StoreError::Unavailable(format!("user {} vanished", caller.id())))?;

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        Ok(user.clone())
    }

    async fn insert_token(&self, token: NewToken) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.tokens.insert(
            token.digest,
            TokenRow {
                user_id: token.user_id,
                expires_at: token.expires_at,
            },
        );
        Ok(())
    }

    async fn user_for_token(&self, digest: &str, now: DateTime<Utc>) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tokens
            .get(digest)
            .filter(|token| token.expires_at.map_or(true, |expires_at| expires_at > now))
            .and_then(|token| tables.users.get(&token.user_id))
            .cloned())
    }

    async fn revoke_token(&self, caller: &Caller) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .tokens
            .get(caller.token_digest())
            .map_or(false, |token| token.user_id == caller.id());
        if owned {
            tables.tokens.remove(caller.token_digest());
        }
        Ok(owned)
    }

    async fn list_labels(&self, caller: &Caller, kind: LabelKind, assigned_only: bool) -> Result<Vec<Label>, StoreError> {
        let tables = self.tables.read().await;
        let owner = caller.id();

        let mut labels: Vec<Label> = tables
            .labels(kind)
            .values()
            .filter(|label| label.owner == owner)
            .filter(|label| {
                !assigned_only
                    || tables.recipes.values().any(|recipe| {
                        recipe.owner == owner
                            && match kind {
                                LabelKind::Ingredient => recipe.row.ingredients.contains(&label.row.id),
                                LabelKind::Tag => recipe.row.tags.contains(&label.row.id),
                            }
                    })
            })
            .map(|label| label.row.clone())
            .collect();

        labels.sort_by(|a, b| by_name_desc(&a.name, a.id, &b.name, b.id));
        Ok(labels)
    }

    async fn create_label(&self, caller: &Caller, kind: LabelKind, name: &str) -> Result<Label, StoreError> {
        let mut tables = self.tables.write().await;
        let label = Label {
            id: tables.next_id(),
            name: name.to_string(),
        };
        tables.labels_mut(kind).insert(
            label.id,
            Owned {
                owner: caller.id(),
                row: label.clone(),
            },
        );
        Ok(label)
    }

    async fn list_recipes(&self, caller: &Caller, filter: &RecipeFilter) -> Result<Vec<Recipe>, StoreError> {
        let tables = self.tables.read().await;
        let mut recipes: Vec<Recipe> = tables
            .recipes
            .values()
            .filter(|recipe| recipe.owner == caller.id() && filter.matches(&recipe.row))
            .map(|recipe| recipe.row.clone())
            .collect();

        recipes.sort_by(|a, b| by_name_desc(&a.name, a.id, &b.name, b.id));
        Ok(recipes)
    }

    async fn create_recipe(&self, caller: &Caller, recipe: NewRecipe) -> Result<Recipe, StoreError> {
        let mut tables = self.tables.write().await;

        for kind in [LabelKind::Ingredient, LabelKind::Tag] {
            if let Some(&id) = recipe.labels(kind).iter().find(|&&id| !tables.owns_label(caller.id(), kind, id)) {
                return Err(StoreError::UnknownReference { kind, id });
            }
        }

        let created = Recipe {
            id: tables.next_id(),
            name: recipe.name,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            ingredients: recipe.ingredients,
            tags: recipe.tags,
        };
        tables.recipes.insert(
            created.id,
            Owned {
                owner: caller.id(),
                row: created.clone(),
            },
        );
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    async fn signup(store: &MemoryStore, email: &str) -> Caller {
        let user = store
            .create_user(NewUser {
                email: email.to_string(),
                name: String::new(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        Caller::new(user, format!("digest-{}", email))
    }

    fn recipe(name: &str, ingredients: Vec<i64>, tags: Vec<i64>) -> NewRecipe {
        NewRecipe {
            name: name.to_string(),
            time_minutes: 10,
            price: Decimal::new(500, 2),
            link: None,
            ingredients,
            tags,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        signup(&store, "test@user.com").await;
        let err = store
            .create_user(NewUser {
                email: "test@user.com".to_string(),
                name: String::new(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn labels_are_scoped_and_ordered() {
        let store = MemoryStore::new();
        let a = signup(&store, "a@user.com").await;
        let b = signup(&store, "b@user.com").await;

        store.create_label(&a, LabelKind::Ingredient, "Kale").await.unwrap();
        store.create_label(&a, LabelKind::Ingredient, "Salt").await.unwrap();
        store.create_label(&b, LabelKind::Ingredient, "Fruity").await.unwrap();
        store.create_label(&a, LabelKind::Tag, "Vegan").await.unwrap();

        let names: Vec<String> = store
            .list_labels(&a, LabelKind::Ingredient, false)
            .await
            .unwrap()
            .into_iter()
            .map(|label| label.name)
            .collect();
        assert_eq!(names, vec!["Salt", "Kale"]);

        let theirs = store.list_labels(&b, LabelKind::Ingredient, false).await.unwrap();
        assert_eq!(theirs.len(), 1);
        assert_eq!(theirs[0].name, "Fruity");
        assert!(store.list_labels(&b, LabelKind::Tag, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn assigned_only_keeps_referenced_labels() {
        let store = MemoryStore::new();
        let a = signup(&store, "a@user.com").await;
        let eggs = store.create_label(&a, LabelKind::Ingredient, "Eggs").await.unwrap();
        store.create_label(&a, LabelKind::Ingredient, "Flour").await.unwrap();
        store.create_recipe(&a, recipe("Omelette", vec![eggs.id], vec![])).await.unwrap();

        let assigned = store.list_labels(&a, LabelKind::Ingredient, true).await.unwrap();
        assert_eq!(assigned, vec![eggs]);
    }

    #[tokio::test]
    async fn recipe_with_foreign_ingredient_is_not_persisted() {
        let store = MemoryStore::new();
        let a = signup(&store, "a@user.com").await;
        let b = signup(&store, "b@user.com").await;
        let theirs = store.create_label(&b, LabelKind::Ingredient, "Saffron").await.unwrap();

        let err = store
            .create_recipe(&a, recipe("Paella", vec![theirs.id], vec![]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnknownReference { kind: LabelKind::Ingredient, id } if id == theirs.id
        ));
        assert!(store.list_recipes(&a, &RecipeFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recipe_filter_matches_any_listed_id() {
        let store = MemoryStore::new();
        let a = signup(&store, "a@user.com").await;
        let vegan = store.create_label(&a, LabelKind::Tag, "Vegan").await.unwrap();
        let tofu = store.create_label(&a, LabelKind::Ingredient, "Tofu").await.unwrap();
        store.create_recipe(&a, recipe("Stir fry", vec![tofu.id], vec![vegan.id])).await.unwrap();
        store.create_recipe(&a, recipe("Steak", vec![], vec![])).await.unwrap();

        let by_tag = store
            .list_recipes(&a, &RecipeFilter { ingredients: vec![], tags: vec![vegan.id] })
            .await
            .unwrap();
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].name, "Stir fry");

        let all = store.list_recipes(&a, &RecipeFilter::default()).await.unwrap();
        let names: Vec<&str> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Stir fry", "Steak"]);
    }

    #[tokio::test]
    async fn expired_and_revoked_tokens_do_not_resolve() {
        let store = MemoryStore::new();
        let a = signup(&store, "a@user.com").await;
        let now = Utc::now();

        store
            .insert_token(NewToken {
                digest: "old".to_string(),
                user_id: a.id(),
                expires_at: Some(now - chrono::Duration::minutes(1)),
            })
            .await
            .unwrap();
        assert!(store.user_for_token("old", now).await.unwrap().is_none());

        store
            .insert_token(NewToken {
                digest: a.token_digest().to_string(),
                user_id: a.id(),
                expires_at: None,
            })
            .await
            .unwrap();
        assert!(store.user_for_token(a.token_digest(), now).await.unwrap().is_some());
        assert!(store.revoke_token(&a).await.unwrap());
        assert!(store.user_for_token(a.token_digest(), now).await.unwrap().is_none());
        assert!(!store.revoke_token(&a).await.unwrap());
    }
}
