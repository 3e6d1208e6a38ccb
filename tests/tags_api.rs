mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::TestServer;

const TAGS: &str = "/api/recipe/tags";

#[tokio::test]
async fn login_required() -> Result<()> {
    let server = TestServer::spawn().await?;

    let (status, body) = server.get(TAGS).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn list_is_limited_to_caller_and_ordered_by_name_desc() -> Result<()> {
    let server = TestServer::spawn().await?;
    let user = server.user("test@example.com").await?;
    let other = server.user("other@example.com").await?;

    user.create_label(TAGS, "Vegan").await?;
    user.create_label(TAGS, "Dessert").await?;
    other.create_label(TAGS, "Comfort Food").await?;

    assert_eq!(user.names(TAGS).await?, vec!["Vegan", "Dessert"]);
    assert_eq!(other.names(TAGS).await?, vec!["Comfort Food"]);
    Ok(())
}

#[tokio::test]
async fn create_tag() -> Result<()> {
    let server = TestServer::spawn().await?;
    let user = server.user("test@example.com").await?;

    let (status, body) = user.post(TAGS, json!({ "name": "  Breakfast " })).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Breakfast");
    Ok(())
}

#[tokio::test]
async fn invalid_tag_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    let user = server.user("test@example.com").await?;

    let (status, body) = user.post(TAGS, json!({ "name": "   " })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["name"], "This field may not be blank.");

    let (status, _) = user.post(TAGS, json!({ "name": "x".repeat(256) })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(user.names(TAGS).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_invalid_json() -> Result<()> {
    let server = TestServer::spawn().await?;
    let user = server.user("test@example.com").await?;

    let res = server
        .client()
        .post(server.url(TAGS))
        .header("Authorization", format!("Token {}", user.token))
        .header("Content-Type", "application/json")
        .body("{\"name\": ")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn assigned_only_tags() -> Result<()> {
    let server = TestServer::spawn().await?;
    let user = server.user("test@example.com").await?;

    let breakfast = user.create_label(TAGS, "Breakfast").await?;
    user.create_label(TAGS, "Lunch").await?;
    let (status, _) = user
        .post("/api/recipe/recipes", json!({ "name": "Porridge", "tags": [breakfast] }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(user.names(&format!("{}?assigned_only=1", TAGS)).await?, vec!["Breakfast"]);
    Ok(())
}
