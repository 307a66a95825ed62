// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pattern Classifier - vertical polynomial authoring conventions
//!
//! Two exporters encode the same parabolic vertical curve differently:
//!
//! - **CIVIL3D** (redundant placement): `c0` is the absolute start elevation
//!   and `c1` the start gradient, repeating what the placement already says.
//! - **IMX** (essential placement): the placement carries elevation and
//!   gradient, so `c0` and `c1` are zero and only `c2` remains.
//!
//! Anything else is UNKNOWN with a reason; a segment is never guessed into
//! either pattern.

use crate::config::PatternThresholds;
use crate::model::{CurveKind, Segment};
use serde::{Deserialize, Serialize};

/// Authoring convention of a vertical polynomial segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    #[serde(rename = "CIVIL3D")]
    Civil3d,
    #[serde(rename = "IMX")]
    Imx,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Civil3d => "CIVIL3D",
            PatternKind::Imx => "IMX",
            PatternKind::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification result for one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternLabel {
    pub kind: PatternKind,
    pub reason: String,
    /// `[c0, c1, c2]`, absent coefficients as 0
    pub coefficients_used: [f64; 3],
}

impl PatternLabel {
    fn new(kind: PatternKind, reason: String, coefficients_used: [f64; 3]) -> Self {
        Self {
            kind,
            reason,
            coefficients_used,
        }
    }
}

/// Classify a vertical segment; non-polynomial segments are UNKNOWN
pub fn classify(segment: &Segment, thresholds: &PatternThresholds) -> PatternLabel {
    match &segment.kind {
        CurveKind::Polynomial { coefficients_y, .. } => {
            classify_coefficients(coefficients_y, thresholds)
        }
        other => PatternLabel::new(
            PatternKind::Unknown,
            format!("{} segment has no polynomial coefficients", other.label()),
            [0.0; 3],
        ),
    }
}

/// Classify an elevation polynomial, constant term first
pub fn classify_coefficients(coefficients: &[f64], thresholds: &PatternThresholds) -> PatternLabel {
    let coefficient = |i: usize| coefficients.get(i).copied().unwrap_or(0.0);
    let used = [coefficient(0), coefficient(1), coefficient(2)];
    let [c0, c1, c2] = used;

    let mut absent = Vec::new();
    for (i, name) in ["c0", "c1", "c2"].iter().enumerate() {
        if coefficients.len() <= i {
            absent.push(*name);
        }
    }
    let note = if absent.is_empty() {
        String::new()
    } else {
        format!(" ({} absent, read as 0)", absent.join(", "))
    };

    if c0.abs() > thresholds.civil3d_c0_limit {
        return PatternLabel::new(
            PatternKind::Civil3d,
            format!(
                "|c0| = {} exceeds {}: absolute start elevation{}",
                c0.abs(),
                thresholds.civil3d_c0_limit,
                note
            ),
            used,
        );
    }
    if c1.abs() > thresholds.civil3d_c1_limit {
        return PatternLabel::new(
            PatternKind::Civil3d,
            format!(
                "|c1| = {} exceeds {}: start gradient in polynomial{}",
                c1.abs(),
                thresholds.civil3d_c1_limit,
                note
            ),
            used,
        );
    }

    let zero = |c: f64| c.abs() <= thresholds.zero_tolerance;
    let reason = match (zero(c0) && zero(c1), zero(c2)) {
        (true, false) => {
            return PatternLabel::new(
                PatternKind::Imx,
                format!("c0 and c1 are zero, c2 = {}: placement-relative parabola{}", c2, note),
                used,
            )
        }
        (true, true) if coefficients.len() <= 2 => {
            format!("c2 absent and c0, c1 are zero{}", note)
        }
        (true, true) => format!("all coefficients are zero{}", note),
        (false, _) => format!(
            "c0 = {}, c1 = {} are below the CIVIL3D limits but not zero{}",
            c0, c1, note
        ),
    };

    PatternLabel::new(PatternKind::Unknown, reason, used)
}
