use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use super::token::{AuthorizedUserFile, StaticToken, TokenSource};
use super::{RemoteDocuments, RemoteError, RemoteFuture};
use crate::Config;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const GOOGLE_DOC_MIME: &str = "application/vnd.google-apps.document";

/// Google Drive backend: stores text as a native Google Docs document.
pub struct GoogleDrive {
    client: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    timeout: Duration,
    base_url: String,
}

#[derive(Deserialize)]
struct CreatedFile {
    id: String,
}

impl GoogleDrive {
    pub fn new(tokens: Arc<dyn TokenSource>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokens,
            timeout,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Build from configuration. A configured access token takes precedence
    /// over a token file; returns `None` when neither is set.
    pub fn from_config(config: &Config) -> Option<Self> {
        let tokens: Arc<dyn TokenSource> = match (
            &config.google_access_token,
            &config.google_token_file,
        ) {
            (Some(token), _) => Arc::new(StaticToken::new(token.clone())),
            (None, Some(path)) => Arc::new(AuthorizedUserFile::new(path.clone())),
            (None, None) => return None,
        };
        Some(Self::new(tokens, config.google_timeout()))
    }

    /// Point requests at a different API host (e.g., a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn bearer(&self) -> Result<String, RemoteError> {
        self.tokens.access_token(&self.client, self.timeout).await
    }
}

/// Turn a non-success Drive response body into an error, preferring the
/// API's own `error.message`.
fn api_error(status: u16, body: &str) -> RemoteError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string());
    RemoteError::Api { status, message }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(api_error(status.as_u16(), &body))
}

impl RemoteDocuments for GoogleDrive {
    fn name(&self) -> &str {
        "Google Drive"
    }

    fn authenticate(&self) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            self.bearer().await?;
            Ok(())
        })
    }

    fn create_document<'a>(&'a self, title: &'a str) -> RemoteFuture<'a, String> {
        Box::pin(async move {
            let token = self.bearer().await?;
            let url = format!("{}/drive/v3/files?fields=id", self.base_url);

            let resp = self
                .client
                .post(&url)
                .bearer_auth(token)
                .json(&serde_json::json!({
                    "name": title,
                    "mimeType": GOOGLE_DOC_MIME,
                }))
                .timeout(self.timeout)
                .send()
                .await?;
            let created: CreatedFile = check(resp)
                .await?
                .json()
                .await
                .map_err(|e| RemoteError::Response(e.to_string()))?;

            tracing::debug!(id = %created.id, title, "created Google document");
            Ok(created.id)
        })
    }

    fn update_document_content<'a>(
        &'a self,
        id: &'a str,
        text: &'a str,
    ) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let token = self.bearer().await?;
            let url = format!(
                "{}/upload/drive/v3/files/{}?uploadType=media",
                self.base_url,
                urlencoding::encode(id)
            );

            let resp = self
                .client
                .patch(&url)
                .bearer_auth(token)
                .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(text.to_string())
                .timeout(self.timeout)
                .send()
                .await?;
            check(resp).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{save_remote, test_server};
    use std::path::PathBuf;

    #[test]
    fn api_error_prefers_google_message() {
        let body = r#"{"error": {"code": 403, "message": "The user has not granted the app access."}}"#;
        match api_error(403, body) {
            RemoteError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "The user has not granted the app access.");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn api_error_falls_back_to_body() {
        match api_error(502, " Bad Gateway \n") {
            RemoteError::Api { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn from_config_requires_credentials() {
        assert!(GoogleDrive::from_config(&Config::default()).is_none());

        let config = Config {
            google_token_file: Some(PathBuf::from("token.json")),
            ..Config::default()
        };
        let drive = GoogleDrive::from_config(&config).unwrap();
        assert_eq!(drive.name(), "Google Drive");
        assert_eq!(drive.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn save_sends_create_then_media_upload() {
        let (base_url, log) = test_server::serve(vec![
            (200, r#"{"id": "1AbC-xyz"}"#),
            (200, r#"{"id": "1AbC-xyz"}"#),
        ])
        .await;
        let drive = GoogleDrive::new(Arc::new(StaticToken::new("ya29.t")), Duration::from_secs(5))
            .with_base_url(base_url);

        let id = save_remote(&drive, "Clip", "hello\nworld").await.unwrap();
        assert_eq!(id, "1AbC-xyz");

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);

        let create = &log[0];
        assert_eq!(create.request_line, "POST /drive/v3/files?fields=id HTTP/1.1");
        assert_eq!(create.header("authorization"), Some("Bearer ya29.t"));
        let metadata: serde_json::Value = serde_json::from_str(&create.body).unwrap();
        assert_eq!(metadata["name"], "Clip");
        assert_eq!(metadata["mimeType"], GOOGLE_DOC_MIME);

        let upload = &log[1];
        assert_eq!(
            upload.request_line,
            "PATCH /upload/drive/v3/files/1AbC-xyz?uploadType=media HTTP/1.1"
        );
        assert_eq!(
            upload.header("content-type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(upload.body, "hello\nworld");
    }

    #[tokio::test]
    async fn error_status_becomes_api_error() {
        let (base_url, _log) = test_server::serve(vec![(
            403,
            r#"{"error": {"code": 403, "message": "The caller does not have permission"}}"#,
        )])
        .await;
        let drive = GoogleDrive::new(Arc::new(StaticToken::new("t")), Duration::from_secs(5))
            .with_base_url(base_url);

        match drive.create_document("Clip").await {
            Err(RemoteError::Api { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "The caller does not have permission");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_id_in_create_response_is_reported() {
        let (base_url, _log) = test_server::serve(vec![(200, r#"{"kind": "drive#file"}"#)]).await;
        let drive = GoogleDrive::new(Arc::new(StaticToken::new("t")), Duration::from_secs(5))
            .with_base_url(base_url);

        let err = drive.create_document("Clip").await.unwrap_err();
        assert!(matches!(err, RemoteError::Response(_)));
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let drive = GoogleDrive::new(Arc::new(StaticToken::new("t")), Duration::from_secs(1))
            .with_base_url("http://localhost:9999/");
        assert_eq!(drive.base_url, "http://localhost:9999");
    }
}
