//! Fetch/update access to the inventory server.

use async_trait::async_trait;
use cw_core::config::InventoryConfig;
use cw_core::{AssetId, Error, Result};
use reqwest::Client;

use crate::envelope;
use crate::record::MediaAssetRecord;

/// Outcome of a metadata update the server answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    Success,
    Rejected(String),
}

/// The two inventory operations the cue-trim pipeline depends on.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// Fetch the full record for `id`.
    ///
    /// Unreachable server, non-success status and malformed replies all
    /// surface as [`Error::Fetch`].
    async fn fetch(&self, id: &AssetId) -> Result<MediaAssetRecord>;

    /// Replace the server's copy of `record`.
    ///
    /// A reply with a non-success status is `Ok(UpdateResult::Rejected)`;
    /// transport and parse failures are errors.
    async fn update(&self, record: &MediaAssetRecord) -> Result<UpdateResult>;
}

/// [`InventoryApi`] over HTTP POST of XML envelopes.
pub struct HttpInventoryClient {
    client: Client,
    endpoint: String,
    client_id: String,
}

impl HttpInventoryClient {
    pub fn new(config: &InventoryConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            endpoint: format!(
                "{}{}",
                config.base_url.trim_end_matches('/'),
                config.api_path
            ),
            client_id: config.client_id.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST an envelope and parse the reply.
    async fn post(&self, body: String) -> Result<envelope::Reply> {
        tracing::debug!("POST {}: {}", self.endpoint, body);

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("request to {} failed: {e}", self.endpoint)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("failed to read reply body: {e}")))?;

        if !status.is_success() {
            return Err(Error::Http(format!("server answered {status}: {}", text.trim())));
        }

        tracing::debug!("reply: {}", text);
        envelope::parse_reply(&text)
    }
}

#[async_trait]
impl InventoryApi for HttpInventoryClient {
    async fn fetch(&self, id: &AssetId) -> Result<MediaAssetRecord> {
        let reply = self
            .post(envelope::fetch_request(&self.client_id, id))
            .await
            .map_err(|e| Error::fetch(id, e.to_string()))?;

        if !reply.is_success() {
            return Err(Error::fetch(id, reply.reason()));
        }

        let record = reply
            .asset
            .ok_or_else(|| Error::fetch(id, "reply has no <asset>"))?;

        if record.id != *id {
            return Err(Error::fetch(
                id,
                format!("server returned a different asset ({})", record.id),
            ));
        }

        Ok(record)
    }

    async fn update(&self, record: &MediaAssetRecord) -> Result<UpdateResult> {
        let reply = self
            .post(envelope::update_request(&self.client_id, record))
            .await?;

        if reply.is_success() {
            Ok(UpdateResult::Success)
        } else {
            Ok(UpdateResult::Rejected(reply.reason()))
        }
    }
}
