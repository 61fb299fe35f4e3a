//! The asset record exchanged with the inventory server.

use cw_core::{AssetId, TimerMarkerSet};
use serde::{Deserialize, Serialize};

use crate::codec;

/// Day-of-week scheduling restriction attached to an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowHours {
    /// Day label as the server spells it (`Mon`, `Tue`, ...).
    pub day: String,
    /// Opaque hour mask or range.
    pub hours: String,
}

/// How `<rawMetadata>` carried its fragment on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawMetadataForm {
    /// Escaped text content.
    #[default]
    Text,
    /// Inline child elements.
    Markup,
}

/// Full asset record.
///
/// The server treats an update as a whole-record replacement, so every field
/// it sent must be sent back. Descriptive values are kept as the server's own
/// strings, and unrecognized child elements of `<asset>` are retained verbatim
/// in [`extra`](Self::extra).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAssetRecord {
    pub id: AssetId,
    pub title: String,
    pub artist: String,
    /// Location path as recorded by the server.
    pub location: String,
    pub gain: String,
    pub speed: String,
    pub asset_type: String,
    /// Audio length in milliseconds.
    pub length_ms: u64,
    pub dow_hours: Vec<DowHours>,
    /// Raw metadata fragment holding the `<timer>` elements.
    pub raw_metadata: String,
    /// Form the fragment arrived in; updates send it back the same way.
    #[serde(default)]
    pub raw_metadata_form: RawMetadataForm,
    /// Unrecognized `<asset>` children, serialized XML.
    #[serde(default)]
    pub extra: Vec<String>,
}

impl MediaAssetRecord {
    /// A record with only identity set; mostly useful in tests and fixtures.
    pub fn new(id: AssetId) -> Self {
        Self {
            id,
            title: String::new(),
            artist: String::new(),
            location: String::new(),
            gain: String::new(),
            speed: String::new(),
            asset_type: String::new(),
            length_ms: 0,
            dow_hours: Vec::new(),
            raw_metadata: String::new(),
            raw_metadata_form: RawMetadataForm::Text,
            extra: Vec::new(),
        }
    }

    /// Markers embedded in the raw metadata.
    pub fn markers(&self) -> TimerMarkerSet {
        codec::decode(&self.raw_metadata)
    }

    /// A complete copy of this record with `markers` written into its raw
    /// metadata. Markers not in `markers` keep their current values.
    pub fn with_markers(&self, markers: &TimerMarkerSet) -> Self {
        Self {
            raw_metadata: codec::encode(markers, &self.raw_metadata),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_core::MarkerName;

    #[test]
    fn with_markers_keeps_every_other_field() {
        let mut record = MediaAssetRecord::new("MUS/12".parse().unwrap());
        record.title = "Jingle".into();
        record.length_ms = 31000;
        record.dow_hours.push(DowHours {
            day: "Mon".into(),
            hours: "06-10".into(),
        });
        record.extra.push("<vendorFlag>1</vendorFlag>".into());
        record.raw_metadata =
            r#"<m><timer millis="500">Start</timer><timer millis="30000">EOM</timer></m>"#.into();

        let adjusted = TimerMarkerSet::new().with(MarkerName::Start, 0);
        let updated = record.with_markers(&adjusted);

        assert_eq!(updated.markers().get(MarkerName::Start), Some(0));
        assert_eq!(updated.markers().get(MarkerName::Eom), Some(30000));
        assert_eq!(
            MediaAssetRecord {
                raw_metadata: record.raw_metadata.clone(),
                ..updated
            },
            record
        );
    }
}
