//! Timer marker codec.
//!
//! The server embeds markers in an asset's raw metadata as
//! `<timer millis="N">Name</timer>` elements. [`decode`] pulls the six
//! recognized markers out of a fragment; [`encode`] writes a marker set back
//! into a fragment, touching nothing but the `millis` attribute of the
//! elements it owns.
//!
//! For a given name, the owning element is the first `<timer>` with that name
//! and an integer `millis` attribute. Later duplicates, unknown names and all
//! surrounding content are preserved byte for byte.

use std::collections::HashSet;
use std::sync::LazyLock;

use cw_core::{MarkerName, TimerMarkerSet};
use regex::{Captures, Regex};

static TIMER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<timer\b(?P<attrs>[^>]*)>(?P<name>[^<]*)</timer\s*>")
        .expect("timer pattern is valid")
});

static MILLIS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<lead>^|\s)millis\s*=\s*(?:"\s*(?P<dq>-?\d+)\s*"|'\s*(?P<sq>-?\d+)\s*')"#)
        .expect("millis pattern is valid")
});

static TRAILING_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</[A-Za-z_][\w.:-]*\s*>\s*$").expect("closing tag pattern is valid")
});

/// One `<timer>` element that decode would accept.
struct TimerSlot {
    name: MarkerName,
    millis: i64,
    /// Byte range of the attribute text inside the fragment.
    attrs: std::ops::Range<usize>,
}

/// Walk the fragment and yield the owning element for each recognized name,
/// in document order.
fn owning_slots(fragment: &str) -> Vec<TimerSlot> {
    let mut seen = HashSet::new();
    let mut slots = Vec::new();

    for caps in TIMER_RE.captures_iter(fragment) {
        let (Some(attrs), Some(name)) = (caps.name("attrs"), caps.name("name")) else {
            continue;
        };
        let Ok(name) = name.as_str().trim().parse::<MarkerName>() else {
            continue;
        };
        if seen.contains(&name) {
            continue;
        }
        let Some(millis) = parse_millis(attrs.as_str()) else {
            continue;
        };
        seen.insert(name);
        slots.push(TimerSlot {
            name,
            millis,
            attrs: attrs.range(),
        });
    }

    slots
}

fn parse_millis(attrs: &str) -> Option<i64> {
    let caps = MILLIS_RE.captures(attrs)?;
    caps.name("dq")
        .or_else(|| caps.name("sq"))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extract the recognized markers from a raw metadata fragment.
///
/// Names with no usable element are absent from the result.
pub fn decode(fragment: &str) -> TimerMarkerSet {
    owning_slots(fragment)
        .into_iter()
        .map(|slot| (slot.name, slot.millis))
        .collect()
}

/// Write `markers` into `base`, returning the new fragment.
///
/// Markers present in `markers` overwrite the `millis` of their owning
/// element; markers with no owning element are appended after the last
/// `<timer>` (or before the fragment's closing tag when there is none).
/// Markers absent from `markers` keep whatever `base` says.
pub fn encode(markers: &TimerMarkerSet, base: &str) -> String {
    let slots = owning_slots(base);
    let mut out = String::with_capacity(base.len() + 64);
    let mut cursor = 0;

    for slot in &slots {
        let Some(millis) = markers.get(slot.name) else {
            continue;
        };
        let attrs = &base[slot.attrs.clone()];
        out.push_str(&base[cursor..slot.attrs.start]);
        out.push_str(&MILLIS_RE.replace(attrs, |caps: &Captures| {
            format!("{}millis=\"{millis}\"", &caps["lead"])
        }));
        cursor = slot.attrs.end;
    }

    let owned: HashSet<MarkerName> = slots.iter().map(|s| s.name).collect();
    let appended: String = markers
        .iter()
        .filter(|(name, _)| !owned.contains(name))
        .map(|(name, millis)| format!("<timer millis=\"{millis}\">{name}</timer>"))
        .collect();

    if appended.is_empty() {
        out.push_str(&base[cursor..]);
        return out;
    }

    let insert_at = TIMER_RE
        .find_iter(base)
        .last()
        .map(|m| m.end())
        .or_else(|| TRAILING_CLOSE_RE.find(base).map(|m| m.start()))
        .unwrap_or(base.len())
        .max(cursor);

    out.push_str(&base[cursor..insert_at]);
    out.push_str(&appended);
    out.push_str(&base[insert_at..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAGMENT: &str = r#"<metadata><title>Morning Show</title><timer millis="500">Start</timer><timer millis="2000">Intro</timer><timer millis="12000">Outro</timer><timer millis="30000">EOM</timer><timer millis="31000">End</timer></metadata>"#;

    fn full_set() -> TimerMarkerSet {
        TimerMarkerSet::new()
            .with(MarkerName::Start, 0)
            .with(MarkerName::Intro, 1500)
            .with(MarkerName::HookStart, 4000)
            .with(MarkerName::HookEnd, 9000)
            .with(MarkerName::Eom, 29500)
            .with(MarkerName::End, 31000)
    }

    #[test]
    fn decode_recognized_markers() {
        let markers = decode(FRAGMENT);
        assert_eq!(markers.get(MarkerName::Start), Some(500));
        assert_eq!(markers.get(MarkerName::Intro), Some(2000));
        assert_eq!(markers.get(MarkerName::Eom), Some(30000));
        assert_eq!(markers.get(MarkerName::End), Some(31000));
        assert_eq!(markers.get(MarkerName::HookStart), None);
        assert_eq!(markers.len(), 4);
    }

    #[test]
    fn decode_takes_first_occurrence() {
        let frag = r#"<timer millis="100">Start</timer><timer millis="900">Start</timer>"#;
        assert_eq!(decode(frag).get(MarkerName::Start), Some(100));
    }

    #[test]
    fn decode_tolerates_layout_variations() {
        let frag = "<timer id='3' millis = '750' >  Intro \n</timer>";
        assert_eq!(decode(frag).get(MarkerName::Intro), Some(750));
    }

    #[test]
    fn decode_skips_elements_without_integer_millis() {
        let frag = r#"<timer millis="soon">EOM</timer><timer millis="4000">EOM</timer>"#;
        assert_eq!(decode(frag).get(MarkerName::Eom), Some(4000));
    }

    #[test]
    fn decode_empty_fragment() {
        assert!(decode("").is_empty());
        assert!(decode("<metadata/>").is_empty());
    }

    #[test]
    fn encode_replaces_only_named_markers() {
        let markers = TimerMarkerSet::new().with(MarkerName::Start, 0);
        let out = encode(&markers, FRAGMENT);
        assert_eq!(out, FRAGMENT.replace(r#""500">Start"#, r#""0">Start"#));
    }

    #[test]
    fn encode_preserves_unknown_markers_and_other_fields() {
        let out = encode(&full_set(), FRAGMENT);
        assert!(out.contains(r#"<timer millis="12000">Outro</timer>"#));
        assert!(out.starts_with("<metadata><title>Morning Show</title>"));
        assert!(out.ends_with("</metadata>"));
    }

    #[test]
    fn encode_appends_missing_markers_after_last_timer() {
        let out = encode(&full_set(), FRAGMENT);
        assert!(out.contains(
            r#"<timer millis="31000">End</timer><timer millis="4000">HookStart</timer><timer millis="9000">HookEnd</timer></metadata>"#
        ));
    }

    #[test]
    fn encode_into_fragment_without_timers() {
        let markers = TimerMarkerSet::new().with(MarkerName::Start, 250);
        let out = encode(&markers, "<metadata><title>x</title></metadata>");
        assert_eq!(
            out,
            r#"<metadata><title>x</title><timer millis="250">Start</timer></metadata>"#
        );
        assert_eq!(encode(&markers, ""), r#"<timer millis="250">Start</timer>"#);
    }

    #[test]
    fn encode_keeps_other_attributes() {
        let frag = r#"<timer id="7" millis='500' kind="cue">Start</timer>"#;
        let markers = TimerMarkerSet::new().with(MarkerName::Start, 0);
        assert_eq!(
            encode(&markers, frag),
            r#"<timer id="7" millis="0" kind="cue">Start</timer>"#
        );
    }

    #[test]
    fn prefixed_attribute_is_not_millis() {
        let frag = r#"<timer data-millis="3" millis="500">Start</timer>"#;
        assert_eq!(decode(frag).get(MarkerName::Start), Some(500));

        let markers = TimerMarkerSet::new().with(MarkerName::Start, 0);
        assert_eq!(
            encode(&markers, frag),
            r#"<timer data-millis="3" millis="0">Start</timer>"#
        );
        assert!(decode(r#"<timer data-millis="3">Start</timer>"#).is_empty());
    }

    #[test]
    fn decode_encode_roundtrip_law() {
        let markers = full_set();
        for base in [FRAGMENT, "", "<metadata/>", "<m><timer millis=\"1\">End</timer></m>"] {
            assert_eq!(decode(&encode(&markers, base)), markers, "base: {base}");
        }
    }

    #[test]
    fn negative_offsets_survive_roundtrip() {
        let markers = TimerMarkerSet::new().with(MarkerName::Eom, -250);
        assert_eq!(decode(&encode(&markers, FRAGMENT)).get(MarkerName::Eom), Some(-250));
    }
}
