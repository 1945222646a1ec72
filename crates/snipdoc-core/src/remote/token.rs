//! OAuth access-token sources for Google APIs.
//!
//! Acquiring the first grant (the browser consent flow) happens outside this
//! service; these sources only use what that flow left behind.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;

use super::{RemoteError, RemoteFuture};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Supplies bearer tokens for API requests.
pub trait TokenSource: Send + Sync {
    fn access_token<'a>(
        &'a self,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> RemoteFuture<'a, String>;
}

/// A fixed, pre-issued access token.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenSource for StaticToken {
    fn access_token<'a>(
        &'a self,
        _client: &'a reqwest::Client,
        _timeout: Duration,
    ) -> RemoteFuture<'a, String> {
        Box::pin(async move { Ok(self.0.clone()) })
    }
}

/// Authorized-user credentials as written by Google's client libraries.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedUser {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_uri: Option<String>,
}

impl AuthorizedUser {
    pub fn load(path: &Path) -> Result<Self, RemoteError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RemoteError::Auth(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| RemoteError::Auth(format!("invalid {}: {}", path.display(), e)))
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<u64>,
}

struct CachedToken {
    token: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        match self.expires_at {
            Some(at) => Instant::now() + EXPIRY_MARGIN < at,
            None => true,
        }
    }
}

/// Tokens backed by an authorized-user `token.json`.
///
/// With a refresh token and client credentials, access tokens are minted at
/// `token_uri` and cached until shortly before they expire. Otherwise the
/// stored `token` is used as-is.
pub struct AuthorizedUserFile {
    path: PathBuf,
    cached: Mutex<Option<CachedToken>>,
}

impl AuthorizedUserFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: Mutex::new(None),
        }
    }

    async fn refresh(
        &self,
        user: &AuthorizedUser,
        client: &reqwest::Client,
        timeout: Duration,
    ) -> Result<Option<CachedToken>, RemoteError> {
        let (Some(refresh_token), Some(client_id), Some(client_secret)) = (
            user.refresh_token.as_deref(),
            user.client_id.as_deref(),
            user.client_secret.as_deref(),
        ) else {
            return Ok(None);
        };
        let token_uri = user.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);

        let resp = client
            .post(token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .timeout(timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Auth(format!(
                "token refresh failed (HTTP {}): {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let data: RefreshResponse = resp
            .json()
            .await
            .map_err(|e| RemoteError::Auth(format!("malformed token response: {}", e)))?;
        tracing::debug!(expires_in = ?data.expires_in, "refreshed Google access token");
        Ok(Some(CachedToken {
            token: data.access_token,
            expires_at: data
                .expires_in
                .map(|secs| Instant::now() + Duration::from_secs(secs)),
        }))
    }
}

impl TokenSource for AuthorizedUserFile {
    fn access_token<'a>(
        &'a self,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> RemoteFuture<'a, String> {
        Box::pin(async move {
            let mut cached = self.cached.lock().await;
            if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
                return Ok(token.token.clone());
            }

            let user = AuthorizedUser::load(&self.path)?;
            let fresh = match self.refresh(&user, client, timeout).await? {
                Some(token) => token,
                None => match user.token {
                    Some(token) if !token.is_empty() => CachedToken {
                        token,
                        expires_at: None,
                    },
                    _ => {
                        return Err(RemoteError::Auth(format!(
                            "{} has neither an access token nor refresh credentials; \
                             complete the OAuth consent flow first",
                            self.path.display()
                        )));
                    }
                },
            };

            let token = fresh.token.clone();
            *cached = Some(fresh);
            Ok(token)
        })
    }
}
