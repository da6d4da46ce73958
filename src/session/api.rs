//! Outbound HTTP seams used by the session: the bearer-token holder every
//! API call goes through, and the token refresh endpoint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use std::time::Duration;

use crate::error::AuthApiError;

/// Receives token changes from the session. Implementations must not
/// dispatch actions; they are called from inside the middleware chain.
pub trait AuthTokenSink: Send + Sync {
    fn set_auth_token(&self, token: &str);
    fn clear_auth_token(&self);
}

// HTTP client that attaches the current bearer token to requests
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match self.token.read().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

impl AuthTokenSink for ApiClient {
    fn set_auth_token(&self, token: &str) {
        *self.token.write() = Some(token.to_string());
    }

    fn clear_auth_token(&self) {
        *self.token.write() = None;
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn refresh(&self, token: &str) -> Result<TokenGrant, AuthApiError>;
}

// Talks to the backend's refresh endpoint
pub struct HttpAuthApi {
    client: reqwest::Client,
    refresh_url: String,
}

impl HttpAuthApi {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            refresh_url: format!("{}/api/auth/refresh", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn refresh(&self, token: &str) -> Result<TokenGrant, AuthApiError> {
        let res = self
            .client
            .post(&self.refresh_url)
            .bearer_auth(token)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(AuthApiError::Rejected(res.status().as_u16()));
        }
        Ok(res.json::<TokenGrant>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_sink_round_trip() {
        let api = ApiClient::new(reqwest::Client::new(), "http://localhost:3000/");
        assert_eq!(api.token(), None);

        api.set_auth_token("abc");
        assert_eq!(api.token().as_deref(), Some("abc"));

        api.clear_auth_token();
        assert_eq!(api.token(), None);
    }

    #[test]
    fn requests_carry_bearer_token() {
        let api = ApiClient::new(reqwest::Client::new(), "http://localhost:3000/");
        api.set_auth_token("abc");

        let req = api
            .request(reqwest::Method::GET, "/api/documents")
            .build()
            .unwrap();
        assert_eq!(req.url().as_str(), "http://localhost:3000/api/documents");
        assert_eq!(req.headers()["authorization"], "Bearer abc");
    }

    #[test]
    fn grant_uses_camel_case() {
        let grant: TokenGrant = serde_json::from_str(
            r#"{"token": "t2", "expiresAt": "2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(grant.token, "t2");
    }
}
