use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Thin JSON client for the recipe API; unwraps the response envelope
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.send::<()>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn patch<B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        self.send::<()>(Method::DELETE, path, None).await
    }

    async fn send<B: Serialize>(&self, method: Method, path: &str, body: Option<&B>) -> anyhow::Result<Value> {
        let mut request = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Token {}", token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let envelope: Value = response.json().await?;
        if status.is_success() {
            return Ok(envelope.get("data").cloned().unwrap_or(Value::Null));
        }
        Err(anyhow::anyhow!(describe_error(status, &envelope)))
    }
}

/// Render an error envelope as one line, including per-field messages
pub fn describe_error(status: StatusCode, envelope: &Value) -> String {
    let message = envelope
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("request failed");
    let mut line = format!("{} ({})", message, status.as_u16());

    if let Some(fields) = envelope.get("field_errors").and_then(Value::as_object) {
        let details: Vec<String> = fields
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg.as_str().unwrap_or_default()))
            .collect();
        line.push_str(&format!(" - {}", details.join("; ")));
    }
    line
}
