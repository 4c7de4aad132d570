// GitHub API HTTP client.
// Handles authentication headers, URL construction and response classification.

use std::time::Duration;

use reqwest::{
    Client, Response, StatusCode, Url,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};

use crate::config::RemoteTarget;
use crate::error::{Result, TemplateError};

use super::types::RateLimit;

pub const GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CLIENT_ID: &str = concat!("tiered-templates/", env!("CARGO_PKG_VERSION"));

/// GitHub contents API client.
///
/// Holds no repository state; every request receives its [`RemoteTarget`], so the
/// same client keeps working across reconfiguration. Requests are never retried.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: Url,
}

impl GitHubClient {
    /// Create a client for api.github.com with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_base_url(GITHUB_API_BASE, DEFAULT_TIMEOUT)
    }

    /// Create a client for a GitHub-compatible API at `base_url`.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            TemplateError::InvalidConfig(format!("invalid API base URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TemplateError::InvalidConfig(format!(
                "API base URL '{}' cannot be a base",
                base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_ID));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(TemplateError::Http)?;

        Ok(Self { client, base_url })
    }

    /// URL of `/repos/<owner>/<name>/contents/<path>?ref=<branch>`.
    pub fn contents_url(&self, target: &RemoteTarget, path: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend([
                    "repos",
                    target.repository.owner.as_str(),
                    target.repository.name.as_str(),
                    "contents",
                ])
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url.query_pairs_mut().append_pair("ref", &target.branch);
        url
    }

    /// GET a contents path, attaching the credential when present.
    pub async fn get_contents(&self, target: &RemoteTarget, path: &str) -> Result<Response> {
        let url = self.contents_url(target, path);
        let mut request = self.client.get(url);
        if let Some(credential) = &target.credential {
            let value = HeaderValue::from_str(&format!("token {}", credential.expose()))
                .map_err(|_| {
                    TemplateError::InvalidConfig("credential contains invalid characters".into())
                })?;
            request = request.header(AUTHORIZATION, value);
        }

        let response = request.send().await?;
        check_response(response).await
    }
}

/// Check response status and convert failures into remote errors.
async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let code = Some(status.as_u16());
    let message = match status {
        StatusCode::UNAUTHORIZED => {
            "authentication failed: invalid or expired token".to_string()
        }
        StatusCode::NOT_FOUND => format!("resource not found: {}", response.url()),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
            if RateLimit::from_headers(response.headers()).is_exhausted() =>
        {
            let rate_limit = RateLimit::from_headers(response.headers());
            let reset_at = chrono::DateTime::from_timestamp(rate_limit.reset as i64, 0)
                .map(|dt| dt.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            format!("rate limit exceeded, resets at {}", reset_at)
        }
        status => format!(
            "HTTP {}: {}",
            status,
            response.text().await.unwrap_or_default()
        ),
    };

    Err(TemplateError::Remote {
        status: code,
        message,
    })
}
