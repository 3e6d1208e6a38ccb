#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use recipe_api::app::{app, AppState};
use recipe_api::config::AppConfig;
use recipe_api::config::StoreBackend;
use recipe_api::database::{DatabaseManager, MemoryStore, Store};

pub const PASSWORD: &str = "testpass123";

/// A server running inside the test's runtime with its own empty memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(AppConfig::development()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Result<Self> {
        Self::spawn_with_store(config, Arc::new(MemoryStore::new())).await
    }

    /// Server backed by the Postgres database named in `DATABASE_URL`, or
    /// `None` when the variable is unset
    pub async fn spawn_postgres() -> Result<Option<Self>> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping Postgres test");
            return Ok(None);
        };

        let mut config = AppConfig::development();
        config.database.backend = StoreBackend::Postgres;
        config.database.url = Some(url);
        config.database.max_connections = 4;
        let store = DatabaseManager::open_store(&config.database)
            .await
            .context("failed to open Postgres store")?;
        Ok(Some(Self::spawn_with_store(config, store).await?))
    }

    pub async fn spawn_with_store(config: AppConfig, store: Arc<dyn Store>) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", base_url))?;
        let router = app(AppState::new(store, config));
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { port, base_url, client })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        read(self.client.get(self.url(path)).send().await?).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        read(self.client.post(self.url(path)).json(&body).send().await?).await
    }

    pub async fn signup(&self, email: &str) -> Result<()> {
        let (status, body) = self
            .post("/api/user/create", json!({ "email": email, "password": PASSWORD, "name": "Test User" }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "signup failed: {} {}", status, body);
        Ok(())
    }

    pub async fn login(&self, email: &str) -> Result<String> {
        let (status, body) = self
            .post("/api/user/token", json!({ "email": email, "password": PASSWORD }))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("token missing from response")
    }

    /// Sign up and log in a fresh user
    pub async fn user(&self, email: &str) -> Result<TestUser> {
        self.signup(email).await?;
        let token = self.login(email).await?;
        Ok(self.as_token(&token))
    }

    pub fn as_token(&self, token: &str) -> TestUser {
        TestUser {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            token: token.to_string(),
        }
    }
}

/// Requests authenticated with one user's token
pub struct TestUser {
    base_url: String,
    client: reqwest::Client,
    pub token: String,
}

impl TestUser {
    fn authed(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Token {}", self.token))
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        read(self.authed(reqwest::Method::GET, path).send().await?).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        read(self.authed(reqwest::Method::POST, path).json(&body).send().await?).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        read(self.authed(reqwest::Method::PATCH, path).json(&body).send().await?).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        read(self.authed(reqwest::Method::DELETE, path).send().await?).await
    }

    /// Create an ingredient or tag and return its id
    pub async fn create_label(&self, path: &str, name: &str) -> Result<i64> {
        let (status, body) = self.post(path, json!({ "name": name })).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create failed: {} {}", status, body);
        body["data"]["id"].as_i64().context("id missing from response")
    }

    pub async fn names(&self, path: &str) -> Result<Vec<String>> {
        let (status, body) = self.get(path).await?;
        anyhow::ensure!(status == StatusCode::OK, "list failed: {} {}", status, body);
        Ok(body["data"]
            .as_array()
            .context("list response is not an array")?
            .iter()
            .filter_map(|row| row["name"].as_str().map(str::to_string))
            .collect())
    }
}

async fn read(response: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = response.status();
    let bytes = response.bytes().await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).context("response is not JSON")?
    };
    Ok((status, body))
}
