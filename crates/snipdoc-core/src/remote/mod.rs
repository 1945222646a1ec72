//! Remote document-hosting backends.

pub mod google_drive;
pub mod token;

#[cfg(test)]
pub(crate) mod test_server;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub use google_drive::GoogleDrive;
pub use token::{AuthorizedUserFile, StaticToken, TokenSource};

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("unexpected API response: {0}")]
    Response(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Boxed future returned by remote backends.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteError>> + Send + 'a>>;

/// A service that can host a text document.
pub trait RemoteDocuments: Send + Sync {
    /// Human-readable backend name (e.g., "Google Drive").
    fn name(&self) -> &str;

    /// Make sure usable credentials are available.
    fn authenticate(&self) -> RemoteFuture<'_, ()>;

    /// Create an empty document titled `title`, returning its remote id.
    fn create_document<'a>(&'a self, title: &'a str) -> RemoteFuture<'a, String>;

    /// Replace the content of document `id` with `text`.
    fn update_document_content<'a>(&'a self, id: &'a str, text: &'a str)
    -> RemoteFuture<'a, ()>;
}

/// Authenticate, create a document and upload `text` into it.
pub async fn save_remote(
    remote: &dyn RemoteDocuments,
    title: &str,
    text: &str,
) -> Result<String, RemoteError> {
    remote.authenticate().await?;
    let id = remote.create_document(title).await?;
    remote.update_document_content(&id, text).await?;
    tracing::info!(backend = remote.name(), %id, title, "saved text remotely");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        fail_update: bool,
    }

    impl RemoteDocuments for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn authenticate(&self) -> RemoteFuture<'_, ()> {
            Box::pin(async move {
                self.calls.lock().unwrap().push("auth".into());
                Ok(())
            })
        }

        fn create_document<'a>(&'a self, title: &'a str) -> RemoteFuture<'a, String> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(format!("create {title}"));
                Ok("doc-1".to_string())
            })
        }

        fn update_document_content<'a>(
            &'a self,
            id: &'a str,
            text: &'a str,
        ) -> RemoteFuture<'a, ()> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(format!("update {id} {text}"));
                if self.fail_update {
                    return Err(RemoteError::Api {
                        status: 403,
                        message: "insufficient permissions".into(),
                    });
                }
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn save_runs_calls_in_order() {
        let remote = Recorder::default();
        let id = save_remote(&remote, "Title", "body").await.unwrap();
        assert_eq!(id, "doc-1");
        assert_eq!(
            *remote.calls.lock().unwrap(),
            vec!["auth", "create Title", "update doc-1 body"]
        );
    }

    #[tokio::test]
    async fn update_failure_surfaces() {
        let remote = Recorder {
            fail_update: true,
            ..Default::default()
        };
        let err = save_remote(&remote, "Title", "body").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "API error (HTTP 403): insufficient permissions"
        );
    }
}
