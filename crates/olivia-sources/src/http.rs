//! HTTP plumbing shared by the live adapters
//!
//! One [`ApiClient`] per adapter owns its connection pool, its credentials
//! and its retry policy. Only `Unavailable` failures are retried.

use olivia_core::{SourceError, SourceId};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::oauth::{OAuthCredentials, TokenProvider};
use crate::settings::SourceSettings;

/// User agent sent to every provider
pub const USER_AGENT: &str = concat!("OLIVIA/", env!("CARGO_PKG_VERSION"));

/// Bounded retries with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// How requests authenticate against the provider
pub enum Auth {
    None,
    /// Static key sent in a header (Judilibre uses `KeyId`)
    ApiKey { header: &'static str, key: String },
    /// Bearer token from the PISTE OAuth endpoint
    OAuth(Arc<TokenProvider>),
}

impl Auth {
    async fn apply(&self, request: RequestBuilder) -> Result<RequestBuilder, SourceError> {
        Ok(match self {
            Self::None => request,
            Self::ApiKey { header, key } => request.header(*header, key),
            Self::OAuth(provider) => request.bearer_auth(provider.token().await?),
        })
    }

    async fn on_rejected(&self) {
        if let Self::OAuth(provider) = self {
            provider.invalidate().await;
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ApiKey { .. } => "api_key",
            Self::OAuth(_) => "oauth",
        }
    }
}

struct Failure {
    error: SourceError,
    retry_after: Option<Duration>,
}

impl From<SourceError> for Failure {
    fn from(error: SourceError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

/// HTTP client bound to one provider
pub struct ApiClient {
    source: SourceId,
    client: Client,
    base_url: Url,
    auth: Auth,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(source: SourceId, client: Client, base_url: Url, auth: Auth) -> Self {
        Self {
            source,
            client,
            base_url,
            auth,
            retry: RetryPolicy::default(),
        }
    }

    /// Client for a configured source.
    ///
    /// An API key wins over OAuth credentials when the provider accepts one
    /// (`api_key_header` is set); otherwise OAuth is used when configured.
    pub fn from_settings(
        source: SourceId,
        settings: &SourceSettings,
        api_key_header: Option<&'static str>,
    ) -> olivia_core::Result<Self> {
        let base_url = settings.resolved_base_url(&source)?;
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| olivia_core::Error::config(format!("failed to build HTTP client: {}", e)))?;

        let auth = match (api_key_header, settings.api_key.as_deref()) {
            (Some(header), Some(key)) if settings.has_api_key() => Auth::ApiKey {
                header,
                key: key.trim().to_string(),
            },
            _ if settings.has_oauth_credentials() => {
                let credentials = OAuthCredentials {
                    token_url: settings.resolved_token_url(&source)?,
                    client_id: settings.client_id.clone().unwrap_or_default(),
                    client_secret: settings.client_secret.clone().unwrap_or_default(),
                    scope: settings.scope.clone(),
                };
                Auth::OAuth(Arc::new(TokenProvider::new(
                    source.to_string(),
                    client.clone(),
                    credentials,
                )))
            }
            _ => Auth::None,
        };

        Ok(Self::new(source, client, base_url, auth)
            .with_retry_policy(RetryPolicy::new(settings.max_retries)))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// `{base_url}/{path}` keeping every segment of the base path
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<Value>, SourceError> {
        let url = self.endpoint(path);
        self.send_json(|client| client.get(&url).query(query)).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Option<Value>, SourceError> {
        let url = self.endpoint(path);
        self.send_json(|client| client.post(&url).json(body)).await
    }

    /// Send with retries; `Ok(None)` means the provider answered 404 or an empty body
    pub async fn send_json<F>(&self, build: F) -> Result<Option<Value>, SourceError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut last_error = SourceError::Unavailable("no attempt made".into());
        let mut retry_after = None;

        for attempt in 0..=self.retry.max_retries {
            if attempt > 0 {
                let delay = retry_after
                    .unwrap_or_else(|| self.retry.backoff(attempt))
                    .min(self.retry.max_delay);
                warn!(
                    source = %self.source,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %last_error,
                    "Retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }

            match self.attempt(&build).await {
                Ok(value) => return Ok(value),
                Err(failure) if failure.error.is_retryable() => {
                    last_error = failure.error;
                    retry_after = failure.retry_after;
                }
                Err(failure) => {
                    if matches!(failure.error, SourceError::Unauthorized(_)) {
                        self.auth.on_rejected().await;
                    }
                    return Err(failure.error);
                }
            }
        }

        Err(last_error)
    }

    async fn attempt<F>(&self, build: &F) -> Result<Option<Value>, Failure>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let request = self.auth.apply(build(&self.client)).await?;
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(source = %self.source, status = status.as_u16(), "Provider responded");

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status.is_success() {
            return read_json(response).await.map_err(Failure::from);
        }

        let retry_after = retry_after(&response);
        let body = response.text().await.unwrap_or_default();
        Err(Failure {
            error: error_for_status(status, &body),
            retry_after,
        })
    }
}

async fn read_json(response: Response) -> Result<Option<Value>, SourceError> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| SourceError::Malformed(format!("response is not valid JSON: {}", e)))
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Map a non-success, non-404 HTTP status to a source error
pub fn error_for_status(status: StatusCode, body: &str) -> SourceError {
    let detail = format!("HTTP {}: {}", status.as_u16(), snippet(body));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SourceError::Unauthorized(detail),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            SourceError::Unavailable(detail)
        }
        s if s.is_server_error() => SourceError::Unavailable(detail),
        _ => SourceError::Malformed(detail),
    }
}

/// Map a transport-level failure to a source error
pub fn transport_error(err: reqwest::Error) -> SourceError {
    if err.is_decode() {
        SourceError::Malformed(format!("undecodable response: {}", err))
    } else if err.is_timeout() {
        SourceError::Unavailable(format!("request timed out: {}", err))
    } else {
        SourceError::Unavailable(format!("request failed: {}", err))
    }
}

/// First 250 characters of a provider message
pub fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<no detail>".to_string();
    }
    let mut chars = trimmed.chars();
    let head: String = chars.by_ref().take(247).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    fn client(server: &MockServer, auth: Auth) -> ApiClient {
        ApiClient::new(
            SourceId::new("test"),
            Client::new(),
            Url::parse(&format!("{}/api/v1", server.uri())).unwrap(),
            auth,
        )
        .with_retry_policy(fast_retry(2))
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(350));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, ""),
            SourceError::Unauthorized(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::FORBIDDEN, ""),
            SourceError::Unauthorized(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::SERVICE_UNAVAILABLE, ""),
            SourceError::Unavailable(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, ""),
            SourceError::Unavailable(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::BAD_REQUEST, ""),
            SourceError::Malformed(_)
        ));
    }

    #[test]
    fn test_snippet_truncates() {
        let long = "x".repeat(400);
        assert_eq!(snippet(&long).chars().count(), 248);
        assert_eq!(snippet("  "), "<no detail>");
    }

    #[tokio::test]
    async fn test_endpoint_keeps_base_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/search"))
            .and(query_param("query", "blessure"))
            .and(header("KeyId", "k-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
            .mount(&server)
            .await;

        let api = client(
            &server,
            Auth::ApiKey {
                header: "KeyId",
                key: "k-1".into(),
            },
        );
        let value = api
            .get_json("/search", &[("query", "blessure".to_string())])
            .await
            .unwrap();
        assert_eq!(value, Some(serde_json::json!({"results": []})));
    }

    #[tokio::test]
    async fn test_retries_on_503_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let value = client(&server, Auth::None).get_json("search", &[]).await.unwrap();
        assert_eq!(value, Some(serde_json::json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(&server, Auth::None).get_json("search", &[]).await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, Auth::None).get_json("search", &[]).await.unwrap_err();
        assert!(matches!(err, SourceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_not_found_is_empty_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let value = client(&server, Auth::None).get_json("lieux", &[]).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed_and_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, Auth::None).get_json("search", &[]).await.unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }
}
