// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Continuity checks between consecutive segments of one curve
//!
//! Violations are reported with their magnitude and never corrected; the
//! stored segment order stays authoritative.

use crate::classifier::PatternKind;
use crate::model::{CurveRole, Segment};
use crate::sampler::{plan_state, profile_state};
use serde::{Deserialize, Serialize};

/// Analytic start and end of a resolved segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentEnds {
    /// Plan x/y or distance/elevation
    pub start: [f64; 2],
    pub end: [f64; 2],
    pub end_distance_along: f64,
}

impl SegmentEnds {
    /// Ends of a horizontal segment
    pub fn plan(segment: &Segment) -> Option<Self> {
        let (start, _, _) = plan_state(segment, 0.0)?;
        let (end, _, _) = plan_state(segment, segment.length)?;
        Some(Self {
            start: [start.x, start.y],
            end: [end.x, end.y],
            end_distance_along: segment.end_distance_along(),
        })
    }

    /// Ends of a vertical segment
    pub fn profile(segment: &Segment, pattern: Option<PatternKind>) -> Option<Self> {
        let start = profile_state(segment, 0.0, pattern)?;
        let end = profile_state(segment, segment.length, pattern)?;
        Some(Self {
            start: [start.distance_along, start.elevation],
            end: [end.distance_along, end.elevation],
            end_distance_along: end.distance_along,
        })
    }
}

/// Which quantity failed to match at a joint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuityCheck {
    /// Start distance-along differs from the previous end
    Distance,
    /// Start point (plan position or elevation) differs from the previous end
    Position,
}

/// A joint between two stored-adjacent segments that does not meet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuityViolation {
    pub role: CurveRole,
    /// Index of the later segment of the pair
    pub index: usize,
    pub check: ContinuityCheck,
    /// Signed mismatch for distance, magnitude for plan position
    pub gap: f64,
}

/// Check every pair of stored-adjacent resolved segments.
///
/// `ends[i]` belongs to `segments[i]`; pairs where either side has no ends
/// are skipped.
pub fn check_continuity(
    segments: &[Segment],
    ends: &[Option<SegmentEnds>],
    role: CurveRole,
    tolerance: f64,
) -> Vec<ContinuityViolation> {
    let mut violations = Vec::new();

    for i in 1..segments.len().min(ends.len()) {
        let (Some(previous), Some(current)) = (ends[i - 1], ends[i]) else {
            continue;
        };
        let segment = &segments[i];

        let distance_gap = segment.start_distance_along - previous.end_distance_along;
        if distance_gap.abs() > tolerance {
            violations.push(ContinuityViolation {
                role,
                index: segment.index,
                check: ContinuityCheck::Distance,
                gap: distance_gap,
            });
        }

        let position_gap = match role {
            CurveRole::Horizontal => (current.start[0] - previous.end[0])
                .hypot(current.start[1] - previous.end[1]),
            CurveRole::Vertical => current.start[1] - previous.end[1],
        };
        if position_gap.abs() > tolerance {
            violations.push(ContinuityViolation {
                role,
                index: segment.index,
                check: ContinuityCheck::Position,
                gap: position_gap,
            });
        }
    }

    for violation in &violations {
        tracing::warn!(
            role = %violation.role,
            index = violation.index,
            check = ?violation.check,
            gap = violation.gap,
            "Segment continuity violated"
        );
    }

    violations
}
