//! Byte retrieval from remote locations: HTTP with retries, or plain files.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};

use depot_util::errors::{DepotError, DepotResult};

use crate::remote::{Location, RemoteRepository};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Fetches raw bytes for a repository-relative path.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `Ok(None)` means this location does not have `path`.
    async fn get(&self, remote: &RemoteRepository, path: &str) -> DepotResult<Option<Vec<u8>>>;
}

/// Serves `http(s)` locations with `reqwest` and directory locations from disk.
#[derive(Debug, Clone)]
pub struct DefaultTransport {
    client: Client,
}

impl DefaultTransport {
    pub fn new() -> DepotResult<Self> {
        Ok(Self {
            client: build_client()?,
        })
    }
}

#[async_trait]
impl Transport for DefaultTransport {
    async fn get(&self, remote: &RemoteRepository, path: &str) -> DepotResult<Option<Vec<u8>>> {
        match &remote.location {
            Location::Directory(dir) => {
                let file = dir.join(path);
                match tokio::fs::read(&file).await {
                    Ok(bytes) => Ok(Some(bytes)),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(DepotError::Io(e).into()),
                }
            }
            Location::Http(base) => {
                let url = format!("{base}/{path}");
                download_bytes(&self.client, remote, &url).await
            }
        }
    }
}

/// Build a shared reqwest client for downloads.
pub fn build_client() -> DepotResult<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("depot/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            DepotError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            }
            .into()
        })
}

/// Apply authentication to a request if the repository has credentials.
fn apply_auth(request: RequestBuilder, remote: &RemoteRepository) -> RequestBuilder {
    match (&remote.username, &remote.password) {
        (Some(user), Some(pass)) => request.basic_auth(user, Some(pass)),
        (Some(user), None) => request.basic_auth(user, None::<&str>),
        (None, Some(token)) => request.bearer_auth(token),
        (None, None) => request,
    }
}

/// Download raw bytes from a URL, with authentication and retries.
///
/// Returns `Ok(None)` for 404 (not in this repository).
async fn download_bytes(
    client: &Client,
    remote: &RemoteRepository,
    url: &str,
) -> DepotResult<Option<Vec<u8>>> {
    let mut last_err = String::new();

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            tokio::time::sleep(RETRY_DELAY * attempt).await;
        }

        let req = apply_auth(client.get(url), remote);

        match req.send().await {
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if status.is_server_error() {
                    last_err = format!("HTTP {status} from {url}");
                    continue;
                }
                if !status.is_success() {
                    return Err(DepotError::Network {
                        message: format!("HTTP {status} fetching {url}"),
                    }
                    .into());
                }

                let bytes = resp.bytes().await.map_err(|e| DepotError::Network {
                    message: format!("Failed to read response from {url}: {e}"),
                })?;
                return Ok(Some(bytes.to_vec()));
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                tracing::debug!("attempt {} for {url} failed: {e}", attempt + 1);
                last_err = format!("{e}");
                continue;
            }
            Err(e) => {
                return Err(DepotError::Network {
                    message: format!("Request to {url} failed: {e}"),
                }
                .into());
            }
        }
    }

    Err(DepotError::Network {
        message: format!("Failed after {MAX_RETRIES} retries for {url}: {last_err}"),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[tokio::test]
    async fn directory_location_reads_files_and_reports_missing() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("g/a/1.0")).unwrap();
        std::fs::write(tmp.path().join("g/a/1.0/a-1.0.pom"), b"<project/>").unwrap();

        let remote = RemoteRepository::new("local", &tmp.path().display().to_string(), Path::new("/"));
        let transport = DefaultTransport::new().unwrap();

        let found = transport.get(&remote, "g/a/1.0/a-1.0.pom").await.unwrap();
        assert_eq!(found.as_deref(), Some(&b"<project/>"[..]));
        let missing = transport.get(&remote, "g/a/2.0/a-2.0.pom").await.unwrap();
        assert!(missing.is_none());
    }
}
