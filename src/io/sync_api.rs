use std::time::Duration;

use indexmap::IndexMap;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::{RESOURCE_TYPES, Snapshot};
use crate::ops::plan::Command;

/// Cursor value that requests the full data set
pub const FULL_SYNC: &str = "*";

/// Pause before re-requesting everything after an incremental response
const REFRESH_PAUSE: Duration = Duration::from_secs(1);

/// Error type for sync API calls
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("could not reach the sync API: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sync API error ({status}): {body}")]
    Status { status: StatusCode, body: String },
    #[error("could not decode sync response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct SyncRequest<'a> {
    sync_token: &'a str,
    resource_types: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    commands: Option<&'a [Command]>,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    sync_token: String,
    /// Per-command result keyed by command uuid: `"ok"` or an error object
    #[serde(default)]
    sync_status: IndexMap<String, serde_json::Value>,
}

/// Blocking client for the Todoist sync endpoint
pub struct SyncClient {
    client: Client,
    api_key: String,
    api_url: String,
    batch_size: usize,
}

impl SyncClient {
    pub fn new(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        SyncClient {
            client: Client::new(),
            api_key: api_key.into(),
            api_url: api_url.into(),
            batch_size: 100,
        }
    }

    /// Maximum commands per write request (at least one)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Fetch data changed since `sync_token`.
    ///
    /// Returns `None` when nothing changed. When something did change, the
    /// complete data set is returned, never just the delta.
    pub fn read_changes(&self, sync_token: &str) -> Result<Option<Snapshot>, SyncError> {
        let snapshot: Snapshot = self.post(&SyncRequest {
            sync_token,
            resource_types: &RESOURCE_TYPES,
            commands: None,
        })?;

        if snapshot.is_unchanged() {
            info!("no changes since last sync");
            return Ok(None);
        }
        if !snapshot.full_sync {
            std::thread::sleep(REFRESH_PAUSE);
            return self.read_all().map(Some);
        }
        info!("changes found, refreshing all data");
        Ok(Some(snapshot))
    }

    /// Fetch the full data set regardless of the cursor
    pub fn read_all(&self) -> Result<Snapshot, SyncError> {
        info!("requesting full sync");
        self.post(&SyncRequest {
            sync_token: FULL_SYNC,
            resource_types: &RESOURCE_TYPES,
            commands: None,
        })
    }

    /// Send `commands` in batches, advancing the cursor with each response.
    /// Returns the cursor after the last batch.
    pub fn write_changes(&self, sync_token: &str, commands: &[Command]) -> Result<String, SyncError> {
        let mut token = sync_token.to_string();
        for batch in commands.chunks(self.batch_size) {
            let response: WriteResponse = self.post(&SyncRequest {
                sync_token: &token,
                resource_types: &RESOURCE_TYPES,
                commands: Some(batch),
            })?;
            let failed = failed_commands(&response.sync_status);
            for (uuid, status) in &failed {
                warn!(%uuid, %status, "command rejected");
            }
            info!(sent = batch.len(), failed = failed.len(), "wrote batch");
            token = response.sync_token;
        }
        Ok(token)
    }

    fn post<T: DeserializeOwned>(&self, request: &SyncRequest<'_>) -> Result<T, SyncError> {
        let resp = self
            .client
            .post(&self.api_url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_else(|_| "unknown error".to_string());
            return Err(SyncError::Status { status, body });
        }
        let text = resp.text()?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Entries of a `sync_status` map that are not `"ok"`
fn failed_commands(
    sync_status: &IndexMap<String, serde_json::Value>,
) -> Vec<(&str, &serde_json::Value)> {
    sync_status
        .iter()
        .filter(|(_, status)| status.as_str() != Some("ok"))
        .map(|(uuid, status)| (uuid.as_str(), status))
        .collect()
}
