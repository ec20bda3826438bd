//! HTTP implementation of the resource gateway
//!
//! Authenticates once (register, then basic-auth login for a bearer token)
//! and then shares a single pooled `reqwest::Client` across all callers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use crate::common::config::{ApiConfig, Credentials, Endpoints};
use crate::common::{Error, Result};

use super::{ObjectRecord, ResourceGateway};

/// Authenticated control-plane client
///
/// Cloning is cheap and clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    endpoints: Endpoints,
}

impl HttpGateway {
    /// Authenticate against the API and return a ready-to-use gateway
    pub async fn connect(api: &ApiConfig, credentials: &Credentials) -> Result<Self> {
        let base_url = api.base_url.trim_end_matches('/').to_string();
        let timeout = Duration::from_secs(api.timeout_secs);

        let anonymous = build_client(timeout, None)?;
        let token = authenticate(&anonymous, &base_url, &api.endpoints, credentials).await?;
        tracing::info!("Authentication successful");

        Ok(Self {
            client: build_client(timeout, Some(&token))?,
            base_url,
            endpoints: api.endpoints.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// GET a collection endpoint and return its `results`
    async fn list(&self, path: &str) -> Vec<ObjectRecord> {
        let url = self.url(path);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%url, error = %e, "List request failed");
                return Vec::new();
            }
        };

        if response.status() != StatusCode::OK {
            tracing::warn!(%url, status = %response.status(), "List request returned error status");
            return Vec::new();
        }

        match response.json::<Value>().await {
            Ok(body) => parse_collection(body),
            Err(e) => {
                tracing::warn!(%url, error = %e, "List response was not valid JSON");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ResourceGateway for HttpGateway {
    async fn list_tenants(&self) -> Vec<ObjectRecord> {
        self.list(&self.endpoints.tenants).await
    }

    async fn list_virtual_services(&self) -> Vec<ObjectRecord> {
        self.list(&self.endpoints.virtual_services).await
    }

    async fn list_service_engines(&self) -> Vec<ObjectRecord> {
        self.list(&self.endpoints.service_engines).await
    }

    async fn find_virtual_service_by_name(&self, name: &str) -> Option<ObjectRecord> {
        self.list_virtual_services()
            .await
            .into_iter()
            .find(|vs| vs.name() == Some(name))
    }

    async fn update_virtual_service(&self, uuid: &str, payload: &Value) -> Option<ObjectRecord> {
        let url = format!("{}/{}", self.url(&self.endpoints.virtual_services), uuid);
        let response = match self.client.put(&url).json(payload).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%url, error = %e, "Update request failed");
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            tracing::warn!(%url, status = %response.status(), "Update request returned error status");
            return None;
        }

        match response.json::<Value>().await {
            Ok(body) => ObjectRecord::from_value(body),
            Err(e) => {
                tracing::warn!(%url, error = %e, "Update response was not valid JSON");
                None
            }
        }
    }
}

fn build_client(timeout: Duration, token: Option<&str>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| Error::Authentication(format!("Unusable token: {}", e)))?;
        headers.insert(AUTHORIZATION, value);
    }

    Ok(Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()?)
}

/// Register (best effort) and log in, returning the bearer token
async fn authenticate(
    client: &Client,
    base_url: &str,
    endpoints: &Endpoints,
    credentials: &Credentials,
) -> Result<String> {
    let register_url = join_url(base_url, &endpoints.register);
    let body = json!({
        "username": credentials.username,
        "password": credentials.password,
    });
    // The account usually exists already; any outcome here is fine.
    match client.post(&register_url).json(&body).send().await {
        Ok(response) => tracing::debug!(status = %response.status(), "Registration attempt completed"),
        Err(e) => tracing::debug!(error = %e, "Registration attempt failed"),
    }

    let login_url = join_url(base_url, &endpoints.login);
    let response = client
        .post(&login_url)
        .basic_auth(&credentials.username, Some(&credentials.password))
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(Error::Authentication(format!(
            "Login returned status {}",
            status
        )));
    }

    let body: Value = response.json().await?;
    extract_token(&body)
        .ok_or_else(|| Error::Authentication("Login response contained no token".to_string()))
}

fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Pull the object records out of a `{"results": [...]}` body
fn parse_collection(body: Value) -> Vec<ObjectRecord> {
    match body {
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(ObjectRecord::from_value)
                .collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn extract_token(body: &Value) -> Option<String> {
    body.get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
