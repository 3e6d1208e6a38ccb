// Runs against the database in DATABASE_URL; every test returns early when it is unset.
// Each test signs up users with fresh emails so runs can share one database.
mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{TestServer, PASSWORD};

const RECIPES: &str = "/api/recipe/recipes";
const INGREDIENTS: &str = "/api/recipe/ingredients";
const TAGS: &str = "/api/recipe/tags";

fn fresh_email() -> String {
    format!("cook-{}@example.com", Uuid::new_v4().simple())
}

#[tokio::test]
async fn labels_are_scoped_and_ordered_by_bytes() -> Result<()> {
    let Some(server) = TestServer::spawn_postgres().await? else {
        return Ok(());
    };
    let user = server.user(&fresh_email()).await?;
    let other = server.user(&fresh_email()).await?;

    for name in ["Kale", "Salt", "apple"] {
        user.create_label(INGREDIENTS, name).await?;
    }
    other.create_label(INGREDIENTS, "Fruity").await?;

    assert_eq!(user.names(INGREDIENTS).await?, vec!["apple", "Salt", "Kale"]);
    assert_eq!(other.names(INGREDIENTS).await?, vec!["Fruity"]);
    Ok(())
}

#[tokio::test]
async fn assigned_only_returns_linked_labels_once() -> Result<()> {
    let Some(server) = TestServer::spawn_postgres().await? else {
        return Ok(());
    };
    let user = server.user(&fresh_email()).await?;

    let eggs = user.create_label(INGREDIENTS, "Eggs").await?;
    user.create_label(INGREDIENTS, "Cheese").await?;
    let brunch = user.create_label(TAGS, "Brunch").await?;
    user.create_label(TAGS, "Dinner").await?;
    for name in ["Eggs benedict", "Coriander eggs on toast"] {
        let (status, _) = user
            .post(RECIPES, json!({ "name": name, "ingredients": [eggs], "tags": [brunch] }))
            .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    assert_eq!(user.names(&format!("{}?assigned_only=1", INGREDIENTS)).await?, vec!["Eggs"]);
    assert_eq!(user.names(&format!("{}?assigned_only=1", TAGS)).await?, vec!["Brunch"]);
    assert_eq!(user.names(&format!("{}?assigned_only=0", TAGS)).await?, vec!["Dinner", "Brunch"]);
    Ok(())
}

#[tokio::test]
async fn recipe_round_trips_money_and_links() -> Result<()> {
    let Some(server) = TestServer::spawn_postgres().await? else {
        return Ok(());
    };
    let user = server.user(&fresh_email()).await?;

    let prawns = user.create_label(INGREDIENTS, "Prawns").await?;
    let ginger = user.create_label(INGREDIENTS, "Ginger").await?;
    let spicy = user.create_label(TAGS, "Spicy").await?;

    let (status, body) = user
        .post(
            RECIPES,
            json!({
                "name": "Red curry",
                "time_minutes": 25,
                "price": "5.5",
                "link": "https://example.com/curry",
                "ingredients": [ginger, prawns, ginger],
                "tags": [spicy],
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["price"], "5.50");

    let mut expected = vec![prawns, ginger];
    expected.sort();
    let (_, listed) = user.get(RECIPES).await?;
    assert_eq!(listed["data"][0], body["data"]);
    assert_eq!(listed["data"][0]["ingredients"], json!(expected));
    assert_eq!(listed["data"][0]["tags"], json!([spicy]));
    Ok(())
}

#[tokio::test]
async fn recipe_filters_match_any_listed_id() -> Result<()> {
    let Some(server) = TestServer::spawn_postgres().await? else {
        return Ok(());
    };
    let user = server.user(&fresh_email()).await?;
    let other = server.user(&fresh_email()).await?;

    let vegan = user.create_label(TAGS, "Vegan").await?;
    let vegetarian = user.create_label(TAGS, "Vegetarian").await?;
    let feta = user.create_label(INGREDIENTS, "Feta cheese").await?;
    let chicken = user.create_label(INGREDIENTS, "Chicken").await?;

    for body in [
        json!({ "name": "Thai vegetable curry", "tags": [vegan] }),
        json!({ "name": "Aubergine with tahini", "tags": [vegetarian], "ingredients": [feta] }),
        json!({ "name": "Fish and chips", "ingredients": [chicken] }),
    ] {
        let (status, _) = user.post(RECIPES, body).await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let by_tags = user.names(&format!("{}?tags={},{}", RECIPES, vegan, vegetarian)).await?;
    assert_eq!(by_tags, vec!["Thai vegetable curry", "Aubergine with tahini"]);

    let both = user.names(&format!("{}?ingredients={},{}&tags={}", RECIPES, feta, chicken, vegetarian)).await?;
    assert_eq!(both, vec!["Aubergine with tahini"]);

    assert!(other.names(&format!("{}?tags={}", RECIPES, vegan)).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn foreign_label_rolls_back_recipe() -> Result<()> {
    let Some(server) = TestServer::spawn_postgres().await? else {
        return Ok(());
    };
    let user = server.user(&fresh_email()).await?;
    let other = server.user(&fresh_email()).await?;

    let mine = user.create_label(TAGS, "Weeknight").await?;
    let theirs = other.create_label(TAGS, "Secret").await?;

    let (status, body) = user
        .post(RECIPES, json!({ "name": "Paella", "tags": [mine, theirs] }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["field_errors"]["tags"],
        format!("Invalid id \"{}\" - object does not exist.", theirs)
    );

    assert!(user.names(RECIPES).await?.is_empty());
    assert!(user.names(&format!("{}?assigned_only=1", TAGS)).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn duplicate_email_and_token_lifecycle() -> Result<()> {
    let Some(server) = TestServer::spawn_postgres().await? else {
        return Ok(());
    };
    let email = fresh_email();
    let user = server.user(&email).await?;

    let (status, body) = server
        .post("/api/user/create", json!({ "email": email, "password": PASSWORD }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["email"].is_string());

    let (status, body) = user.patch("/api/user/me", json!({ "name": "Renamed" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Renamed");

    let second = server.as_token(&server.login(&email).await?);
    let (status, _) = user.delete("/api/user/token").await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = user.get("/api/user/me").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = second.get("/api/user/me").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
