use std::path::PathBuf;

use chrono::Utc;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::{debug, info};

use crate::snapshot::Snapshot;

pub const DEFAULT_RESOURCE_PATH: &str = "data/latest.json";
pub const CACHE_BUST_PARAM: &str = "cb";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("HTTP {status}")]
    Fetch { status: u16 },

    #[error("invalid snapshot URL: {url}")]
    InvalidUrl { url: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed snapshot JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read snapshot file: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub fn status(&self) -> Option<u16> {
        match self {
            LoadError::Fetch { status } => Some(*status),
            _ => None,
        }
    }
}

/// Fetches the snapshot over HTTP. One request per call: no retry, no timeout.
#[derive(Clone, Debug)]
pub struct SnapshotLoader {
    client: Client,
    base: Url,
    resource: String,
}

impl SnapshotLoader {
    pub fn new(base_url: &str, resource: Option<&str>) -> Result<Self, LoadError> {
        let mut base = Url::parse(base_url.trim()).map_err(|_| LoadError::InvalidUrl {
            url: base_url.to_string(),
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let resource = resource
            .map(|r| r.trim().trim_start_matches('/').to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_RESOURCE_PATH.to_string());
        Ok(Self {
            client: Client::new(),
            base,
            resource,
        })
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn resource_url(&self, now_millis: i64) -> Result<Url, LoadError> {
        let mut url = self
            .base
            .join(&self.resource)
            .map_err(|_| LoadError::InvalidUrl {
                url: format!("{}{}", self.base, self.resource),
            })?;
        url.query_pairs_mut()
            .append_pair(CACHE_BUST_PARAM, &now_millis.to_string());
        Ok(url)
    }

    pub async fn load(&self) -> Result<Snapshot, LoadError> {
        let url = self.resource_url(Utc::now().timestamp_millis())?;
        debug!(%url, "fetching snapshot");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| LoadError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Fetch {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| LoadError::Transport {
                url: url.to_string(),
                source,
            })?;
        let snapshot = parse_snapshot(&body)?;
        info!(rows = snapshot.rows.len(), %url, "snapshot loaded");
        Ok(snapshot)
    }
}

pub fn parse_snapshot(body: &str) -> Result<Snapshot, LoadError> {
    let snapshot = Snapshot::from_json(body).map_err(|source| LoadError::Parse { source })?;
    if let Some(source) = snapshot.source.as_ref() {
        debug!(
            bfi84u = source.bfi84u.as_deref().unwrap_or(""),
            dates = source.twt93u_by_date.len(),
            "snapshot sources"
        );
    }
    Ok(snapshot)
}

/// Where a page session gets its snapshot from.
#[derive(Clone, Debug)]
pub enum SnapshotSource {
    Remote(SnapshotLoader),
    File(PathBuf),
}

impl SnapshotSource {
    pub fn describe(&self) -> String {
        match self {
            SnapshotSource::Remote(loader) => loader.base().to_string(),
            SnapshotSource::File(path) => path.display().to_string(),
        }
    }

    pub async fn load(&self) -> Result<Snapshot, LoadError> {
        match self {
            SnapshotSource::Remote(loader) => loader.load().await,
            SnapshotSource::File(path) => {
                let body = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| LoadError::Io {
                        path: path.display().to_string(),
                        source,
                    })?;
                parse_snapshot(&body)
            }
        }
    }
}
