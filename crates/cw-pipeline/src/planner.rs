//! Cue-point trim planning.
//!
//! When an asset's `Start` marker is positive, the audio before it is dead air.
//! Removing it shifts the zero point, so the markers measured from the old
//! zero have to move by the same amount.

use cw_core::config::NegativeMarkerPolicy;
use cw_core::{Error, MarkerName, TimerMarkerSet};

/// Outcome of planning one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrimDecision {
    /// No cue point is set; the asset is left alone.
    NoTrimNeeded,
    /// Trim `cue_offset_ms` from the audio and store `adjusted`.
    Trim {
        cue_offset_ms: i64,
        adjusted: TimerMarkerSet,
    },
}

impl TrimDecision {
    pub fn needs_trim(&self) -> bool {
        matches!(self, TrimDecision::Trim { .. })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CueTrimPlanner {
    negative_markers: NegativeMarkerPolicy,
}

impl CueTrimPlanner {
    pub fn new(negative_markers: NegativeMarkerPolicy) -> Self {
        Self { negative_markers }
    }

    /// Compute the trim for `markers`.
    ///
    /// With a cue point `C > 0`: `Start` becomes 0, a non-zero `Intro` and
    /// `EOM` move back by `C`, and every other marker is kept. An `Intro` of 0
    /// means "no intro" and stays 0. Absent markers count as 0.
    ///
    /// # Errors
    ///
    /// Under [`NegativeMarkerPolicy::Reject`], returns
    /// [`Error::NegativeMarker`] for the first shifted marker that falls
    /// before the new start.
    pub fn plan(&self, markers: &TimerMarkerSet) -> cw_core::Result<TrimDecision> {
        let cue = markers.cue_point();
        if cue <= 0 {
            return Ok(TrimDecision::NoTrimNeeded);
        }

        let intro = markers.offset(MarkerName::Intro);
        let shifted_intro = if intro == 0 { 0 } else { intro - cue };
        let shifted_eom = markers.offset(MarkerName::Eom) - cue;

        let adjusted = markers
            .clone()
            .with(MarkerName::Start, 0)
            .with(MarkerName::Intro, shifted_intro)
            .with(MarkerName::Eom, shifted_eom);

        for marker in [MarkerName::Intro, MarkerName::Eom] {
            let value = adjusted.offset(marker);
            if value >= 0 {
                continue;
            }
            match self.negative_markers {
                NegativeMarkerPolicy::Passthrough => {
                    tracing::warn!(
                        "{} lies before the cue point; writing {} ms",
                        marker,
                        value
                    );
                }
                NegativeMarkerPolicy::Reject => {
                    return Err(Error::NegativeMarker { marker, value });
                }
            }
        }

        Ok(TrimDecision::Trim {
            cue_offset_ms: cue,
            adjusted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(MarkerName, i64)]) -> TimerMarkerSet {
        pairs.iter().copied().collect()
    }

    fn trim(markers: &TimerMarkerSet) -> (i64, TimerMarkerSet) {
        match CueTrimPlanner::default().plan(markers).unwrap() {
            TrimDecision::Trim {
                cue_offset_ms,
                adjusted,
            } => (cue_offset_ms, adjusted),
            TrimDecision::NoTrimNeeded => panic!("expected a trim for {markers}"),
        }
    }

    #[test]
    fn shifts_intro_and_eom_by_cue() {
        let (cue, adjusted) = trim(&set(&[
            (MarkerName::Start, 500),
            (MarkerName::Intro, 2000),
            (MarkerName::Eom, 30000),
        ]));
        assert_eq!(cue, 500);
        assert_eq!(
            adjusted,
            set(&[
                (MarkerName::Start, 0),
                (MarkerName::Intro, 1500),
                (MarkerName::Eom, 29500),
            ])
        );
    }

    #[test]
    fn zero_start_needs_no_trim() {
        let planner = CueTrimPlanner::default();
        assert_eq!(
            planner.plan(&set(&[(MarkerName::Start, 0)])).unwrap(),
            TrimDecision::NoTrimNeeded
        );
        assert_eq!(
            planner.plan(&TimerMarkerSet::new()).unwrap(),
            TrimDecision::NoTrimNeeded
        );
        assert_eq!(
            planner
                .plan(&set(&[(MarkerName::Start, -40), (MarkerName::Eom, 9000)]))
                .unwrap(),
            TrimDecision::NoTrimNeeded
        );
    }

    #[test]
    fn zero_intro_stays_zero() {
        let (_, adjusted) = trim(&set(&[
            (MarkerName::Start, 1000),
            (MarkerName::Intro, 0),
            (MarkerName::Eom, 5000),
        ]));
        assert_eq!(
            adjusted,
            set(&[
                (MarkerName::Start, 0),
                (MarkerName::Intro, 0),
                (MarkerName::Eom, 4000),
            ])
        );
    }

    #[test]
    fn other_markers_unchanged() {
        let (_, adjusted) = trim(&set(&[
            (MarkerName::Start, 250),
            (MarkerName::HookStart, 12000),
            (MarkerName::HookEnd, 18000),
            (MarkerName::End, 61000),
            (MarkerName::Eom, 60000),
        ]));
        assert_eq!(adjusted.get(MarkerName::HookStart), Some(12000));
        assert_eq!(adjusted.get(MarkerName::HookEnd), Some(18000));
        assert_eq!(adjusted.get(MarkerName::End), Some(61000));
        assert_eq!(adjusted.get(MarkerName::Eom), Some(59750));
    }

    #[test]
    fn shift_holds_across_cue_values() {
        for cue in [1, 7, 500, 999, 1000, 45_000] {
            for intro in [0, 1, cue, cue + 1, 120_000] {
                let eom = 180_000;
                let (offset, adjusted) = trim(&set(&[
                    (MarkerName::Start, cue),
                    (MarkerName::Intro, intro),
                    (MarkerName::Eom, eom),
                ]));
                assert_eq!(offset, cue);
                assert_eq!(adjusted.offset(MarkerName::Start), 0);
                let expected_intro = if intro == 0 { 0 } else { intro - cue };
                assert_eq!(adjusted.offset(MarkerName::Intro), expected_intro);
                assert_eq!(adjusted.offset(MarkerName::Eom), eom - cue);
            }
        }
    }

    #[test]
    fn negative_results_pass_through_by_default() {
        let (_, adjusted) = trim(&set(&[
            (MarkerName::Start, 3000),
            (MarkerName::Intro, 1000),
            (MarkerName::Eom, 2500),
        ]));
        assert_eq!(adjusted.get(MarkerName::Intro), Some(-2000));
        assert_eq!(adjusted.get(MarkerName::Eom), Some(-500));
    }

    #[test]
    fn reject_policy_refuses_negative_results() {
        let planner = CueTrimPlanner::new(NegativeMarkerPolicy::Reject);
        let err = planner
            .plan(&set(&[
                (MarkerName::Start, 3000),
                (MarkerName::Intro, 1000),
                (MarkerName::Eom, 9000),
            ]))
            .unwrap_err();
        match err {
            Error::NegativeMarker { marker, value } => {
                assert_eq!(marker, MarkerName::Intro);
                assert_eq!(value, -2000);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Non-negative results are unaffected by the policy.
        assert!(planner
            .plan(&set(&[(MarkerName::Start, 100), (MarkerName::Eom, 9000)]))
            .unwrap()
            .needs_trim());
    }

    #[test]
    fn missing_eom_counts_as_zero() {
        let (_, adjusted) = trim(&set(&[(MarkerName::Start, 400)]));
        assert_eq!(adjusted.get(MarkerName::Eom), Some(-400));
        assert!(CueTrimPlanner::new(NegativeMarkerPolicy::Reject)
            .plan(&set(&[(MarkerName::Start, 400)]))
            .is_err());
    }
}
