mod common;

use anyhow::Result;
use reqwest::StatusCode;

use common::TestServer;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = TestServer::spawn().await?;

    let (status, body) = server.get("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let server = TestServer::spawn().await?;

    let (status, body) = server.get("/").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["endpoints"]["recipes"].is_string());
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client().get(server.url("/api/nope")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
