//! Pushing recomputed markers back to the inventory server.

use std::sync::Arc;

use cw_core::{AssetId, Error, TimerMarkerSet};
use cw_inventory::{InventoryApi, MediaAssetRecord, UpdateResult};

pub struct MetadataUpdater {
    api: Arc<dyn InventoryApi>,
}

impl MetadataUpdater {
    pub fn new(api: Arc<dyn InventoryApi>) -> Self {
        Self { api }
    }

    /// Send `original` back with `adjusted` written into its raw metadata.
    ///
    /// The server replaces the whole record on update, so every other field
    /// goes back exactly as it was fetched.
    ///
    /// # Errors
    ///
    /// Transport and parse failures are errors. A server that answers with a
    /// non-success status yields `Ok(UpdateResult::Rejected(..))`.
    pub async fn push(
        &self,
        asset_id: &AssetId,
        original: &MediaAssetRecord,
        adjusted: &TimerMarkerSet,
    ) -> cw_core::Result<UpdateResult> {
        if &original.id != asset_id {
            return Err(Error::Validation(format!(
                "record {} does not belong to {}",
                original.id, asset_id
            )));
        }

        let record = original.with_markers(adjusted);
        tracing::debug!("{}: pushing markers {}", asset_id, adjusted);

        let result = self.api.update(&record).await?;
        if let UpdateResult::Rejected(reason) = &result {
            tracing::warn!("{}: update rejected: {}", asset_id, reason);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cw_core::MarkerName;
    use std::sync::Mutex;

    struct Recorder {
        reply: UpdateResult,
        sent: Mutex<Vec<MediaAssetRecord>>,
    }

    #[async_trait]
    impl InventoryApi for Recorder {
        async fn fetch(&self, id: &AssetId) -> cw_core::Result<MediaAssetRecord> {
            Err(Error::fetch(id, "not used"))
        }

        async fn update(&self, record: &MediaAssetRecord) -> cw_core::Result<UpdateResult> {
            self.sent.lock().unwrap().push(record.clone());
            Ok(self.reply.clone())
        }
    }

    fn original() -> MediaAssetRecord {
        let mut record = MediaAssetRecord::new("MUS/12".parse().unwrap());
        record.title = "Morning Drive".into();
        record.artist = "The Cartwrights".into();
        record.length_ms = 180_000;
        record.raw_metadata = concat!(
            r#"<timer millis="500">Start</timer>"#,
            r#"<timer millis="2000">Intro</timer>"#,
            r#"<timer millis="30000">EOM</timer>"#,
            r#"<note>keep me</note>"#,
        )
        .into();
        record
    }

    fn adjusted() -> TimerMarkerSet {
        [
            (MarkerName::Start, 0),
            (MarkerName::Intro, 1500),
            (MarkerName::Eom, 29500),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn sends_full_record_with_new_markers() {
        let api = Arc::new(Recorder {
            reply: UpdateResult::Success,
            sent: Mutex::new(Vec::new()),
        });
        let updater = MetadataUpdater::new(api.clone());
        let original = original();

        let result = updater.push(&original.id, &original, &adjusted()).await.unwrap();
        assert_eq!(result, UpdateResult::Success);

        let sent = api.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let record = &sent[0];
        assert_eq!(record.title, "Morning Drive");
        assert_eq!(record.artist, "The Cartwrights");
        assert_eq!(record.length_ms, 180_000);
        assert_eq!(record.markers(), adjusted());
        assert!(record.raw_metadata.contains("<note>keep me</note>"));
    }

    #[tokio::test]
    async fn rejection_is_not_an_error() {
        let api = Arc::new(Recorder {
            reply: UpdateResult::Rejected("Asset locked".into()),
            sent: Mutex::new(Vec::new()),
        });
        let updater = MetadataUpdater::new(api);
        let original = original();
        let result = updater.push(&original.id, &original, &adjusted()).await.unwrap();
        assert_eq!(result, UpdateResult::Rejected("Asset locked".into()));
    }

    #[tokio::test]
    async fn mismatched_id_is_refused() {
        let api = Arc::new(Recorder {
            reply: UpdateResult::Success,
            sent: Mutex::new(Vec::new()),
        });
        let updater = MetadataUpdater::new(api.clone());
        let other: AssetId = "NWS/1".parse().unwrap();
        let err = updater.push(&other, &original(), &adjusted()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(api.sent.lock().unwrap().is_empty());
    }
}
