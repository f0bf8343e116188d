//! MythTV services API client
//!
//! Built once per process and shared as `Arc<CatalogClient>`. The storage
//! group map is fetched at connect time; the recording list is fetched on
//! first use. Neither is refetched until [`CatalogClient::refresh`].

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

use super::types::{
    BoolResponse, ChannelInfo, ChannelInfoResponse, RecordedListResponse, RecordingDescriptor,
    StorageGroupDirsResponse,
};
use crate::error::{OrphanError, Result};
use m2v_common::Settings;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Storage group holding catalog-managed videos
pub const VIDEOS_GROUP: &str = "Videos";

/// Any failure of a single remote call
#[derive(Debug, Clone, Error)]
pub enum ApiFailure {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {0}: {1}")]
    Status(u16, String),

    #[error("Undecodable response: {0}")]
    Decode(String),

    /// Body carried a top-level `Exception`
    #[error("Remote fault: {0}")]
    Remote(String),
}

type StorageMap = HashMap<(String, String), PathBuf>;

/// Client for the backend's catalog
pub struct CatalogClient {
    http_client: reqwest::Client,
    base_url: String,
    backend_host: String,
    storage_groups: RwLock<StorageMap>,
    recordings: RwLock<Option<Vec<RecordingDescriptor>>>,
}

impl CatalogClient {
    /// Connect to the configured backend and load its storage group map
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| OrphanError::Transport(e.to_string()))?;

        let client = Self {
            http_client,
            base_url: format!("http://{}:{}", settings.mythbackend, settings.api_port),
            backend_host: settings.mythbackend.clone(),
            storage_groups: RwLock::new(HashMap::new()),
            recordings: RwLock::new(None),
        };

        let groups = client.fetch_storage_groups().await?;
        tracing::info!(
            backend = %client.base_url,
            storage_groups = groups.len(),
            "Connected to MythTV backend"
        );
        *client.storage_groups.write().await = groups;

        Ok(client)
    }

    /// Host identifier of the backend
    pub fn backend_host(&self) -> &str {
        &self.backend_host
    }

    /// Directory of a storage group on a host, if the backend defines one
    pub async fn storage_directory(&self, group: &str, host: &str) -> Option<PathBuf> {
        self.storage_groups
            .read()
            .await
            .get(&(group.to_string(), host.to_string()))
            .cloned()
    }

    /// Look up a channel by its id
    ///
    /// A remote fault means the backend does not know the channel and maps
    /// to [`OrphanError::Lookup`]; anything else is a transport failure.
    pub async fn channel_info(&self, channel_id: &str) -> Result<ChannelInfo> {
        let response: ChannelInfoResponse = self
            .call("Channel", "GetChannelInfo", &[("ChanID", channel_id)])
            .await
            .map_err(|failure| match failure {
                ApiFailure::Remote(msg) => {
                    OrphanError::Lookup(format!("channel {}: {}", channel_id, msg))
                }
                other => OrphanError::Transport(other.to_string()),
            })?;
        Ok(response.channel)
    }

    /// Recordings known to the backend (fetched once, then cached)
    pub async fn recording_list(&self) -> Result<Vec<RecordingDescriptor>> {
        self.load_recordings().await?;
        Ok(self.recordings.read().await.clone().unwrap_or_default())
    }

    /// True if some known recording has exactly this filename
    pub async fn is_cataloged(&self, filename: &str) -> Result<bool> {
        self.load_recordings().await?;
        let guard = self.recordings.read().await;
        Ok(guard
            .as_ref()
            .map(|programs| programs.iter().any(|p| p.file_name == filename))
            .unwrap_or(false))
    }

    async fn load_recordings(&self) -> Result<()> {
        if self.recordings.read().await.is_some() {
            return Ok(());
        }

        let mut slot = self.recordings.write().await;
        if slot.is_some() {
            return Ok(());
        }

        let response: RecordedListResponse = self
            .call("Dvr", "GetRecordedList", &[])
            .await
            .map_err(|e| OrphanError::Transport(e.to_string()))?;
        tracing::debug!(recordings = response.list.programs.len(), "Fetched recorded list");

        *slot = Some(response.list.programs);
        Ok(())
    }

    /// Ask the backend to add a file to its video catalog
    ///
    /// `filespec` is relative to the host's Videos storage group. Never
    /// errors; every failure is logged and reported as `false`.
    pub async fn register(&self, filespec: &str, host: &str) -> bool {
        let result: std::result::Result<BoolResponse, ApiFailure> = self
            .call("Video", "AddVideo", &[("FileName", filespec), ("HostName", host)])
            .await;

        match result {
            Ok(ack) => {
                if !ack.value {
                    tracing::warn!(filespec = %filespec, host = %host, "Backend declined AddVideo");
                }
                ack.value
            }
            Err(e) => {
                tracing::warn!(filespec = %filespec, host = %host, error = %e, "AddVideo failed");
                false
            }
        }
    }

    /// Refetch the storage group map and drop the cached recording list
    pub async fn refresh(&self) -> Result<()> {
        let groups = self.fetch_storage_groups().await?;
        *self.storage_groups.write().await = groups;
        *self.recordings.write().await = None;
        tracing::debug!("Catalog caches refreshed");
        Ok(())
    }

    async fn fetch_storage_groups(&self) -> Result<StorageMap> {
        let response: StorageGroupDirsResponse = self
            .call("Myth", "GetStorageGroupDirs", &[])
            .await
            .map_err(|e| OrphanError::Transport(e.to_string()))?;

        Ok(response
            .list
            .dirs
            .into_iter()
            .map(|d| ((d.group_name, d.host_name), PathBuf::from(d.dir_name)))
            .collect())
    }

    /// Issue one RPC: GET without params, form POST with them
    async fn call<T: DeserializeOwned>(
        &self,
        service: &str,
        call: &str,
        params: &[(&str, &str)],
    ) -> std::result::Result<T, ApiFailure> {
        let url = format!("{}/{}/{}", self.base_url, service, call);
        tracing::debug!(url = %url, params = params.len(), "Calling MythTV API");

        let request = if params.is_empty() {
            self.http_client.get(&url)
        } else {
            self.http_client.post(&url).form(params)
        };

        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ApiFailure::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiFailure::Network(e.to_string()))?;

        // A fault body may arrive with any status
        let body: Option<serde_json::Value> = serde_json::from_str(&text).ok();
        if let Some(fault) = body.as_ref().and_then(|b| b.get("Exception")) {
            return Err(ApiFailure::Remote(fault.to_string()));
        }

        if !status.is_success() {
            return Err(ApiFailure::Status(status.as_u16(), text));
        }

        let body = body.ok_or_else(|| ApiFailure::Decode(format!("{}/{}: not JSON", service, call)))?;
        serde_json::from_value(body).map_err(|e| ApiFailure::Decode(e.to_string()))
    }
}
