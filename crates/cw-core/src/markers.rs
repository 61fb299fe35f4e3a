//! Timer marker vocabulary and marker sets.
//!
//! A marker is a named millisecond offset into an asset's audio. Only the six
//! names in [`MarkerName`] are interpreted; anything else in the vendor
//! metadata is carried through untouched by the codec.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Recognized timer marker names, in audio order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MarkerName {
    Start,
    Intro,
    HookStart,
    HookEnd,
    #[serde(rename = "EOM")]
    Eom,
    End,
}

impl MarkerName {
    /// Every recognized marker.
    pub const ALL: [MarkerName; 6] = [
        MarkerName::Start,
        MarkerName::Intro,
        MarkerName::HookStart,
        MarkerName::HookEnd,
        MarkerName::Eom,
        MarkerName::End,
    ];

    /// Name as it appears inside a `<timer>` element.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Intro => "Intro",
            Self::HookStart => "HookStart",
            Self::HookEnd => "HookEnd",
            Self::Eom => "EOM",
            Self::End => "End",
        }
    }
}

impl fmt::Display for MarkerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkerName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarkerName::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("unknown timer marker: {s}")))
    }
}

/// Marker name to millisecond offset. Absent names are simply not present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerMarkerSet(BTreeMap<MarkerName, i64>);

impl TimerMarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored offset, or `None` if the marker is absent.
    pub fn get(&self, name: MarkerName) -> Option<i64> {
        self.0.get(&name).copied()
    }

    /// The stored offset, treating an absent marker as 0.
    pub fn offset(&self, name: MarkerName) -> i64 {
        self.get(name).unwrap_or(0)
    }

    /// The cue point (`Start`), 0 when unset.
    pub fn cue_point(&self) -> i64 {
        self.offset(MarkerName::Start)
    }

    pub fn set(&mut self, name: MarkerName, millis: i64) {
        self.0.insert(name, millis);
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: MarkerName, millis: i64) -> Self {
        self.set(name, millis);
        self
    }

    pub fn contains(&self, name: MarkerName) -> bool {
        self.0.contains_key(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MarkerName, i64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(MarkerName, i64)> for TimerMarkerSet {
    fn from_iter<I: IntoIterator<Item = (MarkerName, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for TimerMarkerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, millis)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}:{millis}")?;
        }
        f.write_str("}")
    }
}
