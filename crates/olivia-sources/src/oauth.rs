//! PISTE OAuth2 client-credentials token provider

use olivia_core::SourceError;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

use crate::http::{snippet, transport_error};
use crate::settings::obfuscate;

const DEFAULT_EXPIRES_IN: u64 = 3600;
/// Longest lifetime trusted from a token response
const MAX_EXPIRES_IN: u64 = 86_400;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Client credentials for one provider
#[derive(Clone)]
pub struct OAuthCredentials {
    pub token_url: Url,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &obfuscate(&self.client_id))
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// Fetches and caches a bearer token until shortly before it expires
pub struct TokenProvider {
    name: String,
    client: Client,
    credentials: OAuthCredentials,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(name: impl Into<String>, client: Client, credentials: OAuthCredentials) -> Self {
        Self {
            name: name.into(),
            client,
            credentials,
            cached: RwLock::new(None),
        }
    }

    /// Current bearer token, fetching a new one when none is cached or it is about to expire
    pub async fn token(&self) -> Result<String, SourceError> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
                return Ok(token.access_token.clone());
            }
        }

        let mut cached = self.cached.write().await;
        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.access_token.clone());
        }

        let fresh = self.fetch().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    /// Drop the cached token, e.g. after the provider rejected it
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    async fn fetch(&self) -> Result<CachedToken, SourceError> {
        debug!(
            service = %self.name,
            client_id = %obfuscate(&self.credentials.client_id),
            "Requesting OAuth token"
        );

        let mut form = vec![("grant_type", "client_credentials")];
        if let Some(scope) = self.credentials.scope.as_deref() {
            form.push(("scope", scope));
        }

        let response = self
            .client
            .post(self.credentials.token_url.clone())
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = format!(
                "OAuth error for '{}' (HTTP {}): {}",
                self.name,
                status.as_u16(),
                snippet(&body)
            );
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    SourceError::Unauthorized(detail)
                }
                _ if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
                    SourceError::Unavailable(detail)
                }
                _ => SourceError::Malformed(detail),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(format!("invalid OAuth response: {}", e)))?;
        if token.access_token.is_empty() {
            return Err(SourceError::Malformed("OAuth response without access_token".into()));
        }

        let lifetime = token_lifetime(token.expires_in);
        let margin = REFRESH_MARGIN.min(lifetime / 2);
        info!(service = %self.name, expires_in_secs = lifetime.as_secs(), "OAuth token obtained");

        let now = Instant::now();
        Ok(CachedToken {
            access_token: token.access_token,
            refresh_at: now.checked_add(lifetime - margin).unwrap_or(now),
        })
    }
}

/// Provider-announced lifetime, capped so a hostile value cannot overflow the clock
fn token_lifetime(expires_in: Option<u64>) -> Duration {
    Duration::from_secs(expires_in.unwrap_or(DEFAULT_EXPIRES_IN).min(MAX_EXPIRES_IN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> TokenProvider {
        let credentials = OAuthCredentials {
            token_url: Url::parse(&format!("{}/api/oauth/token", server.uri())).unwrap(),
            client_id: "client-identifier".into(),
            client_secret: "secret".into(),
            scope: Some("openid".into()),
        };
        TokenProvider::new("judilibre", Client::new(), credentials)
    }

    #[tokio::test]
    async fn test_token_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/oauth/token"))
            .and(header_exists("authorization"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-1",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(&server);
        assert_eq!(provider.token().await.unwrap(), "tok-1");
        assert_eq!(provider.token().await.unwrap(), "tok-1");
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok",
                "expires_in": 3600
            })))
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider(&server);
        provider.token().await.unwrap();
        provider.invalidate().await;
        provider.token().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .mount(&server)
            .await;

        let err = provider(&server).token().await.unwrap_err();
        assert!(matches!(err, SourceError::Unauthorized(_)));
        assert!(!err.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = provider(&server).token().await.unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_huge_expires_in_is_capped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "t",
                "expires_in": u64::MAX
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(&server);
        assert_eq!(provider.token().await.unwrap(), "t");
        assert_eq!(provider.token().await.unwrap(), "t");
    }

    #[test]
    fn test_token_lifetime_bounds() {
        assert_eq!(token_lifetime(None), Duration::from_secs(DEFAULT_EXPIRES_IN));
        assert_eq!(token_lifetime(Some(120)), Duration::from_secs(120));
        assert_eq!(token_lifetime(Some(u64::MAX)), Duration::from_secs(MAX_EXPIRES_IN));
    }
}
