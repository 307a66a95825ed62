// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alignment reports
//!
//! Output records of the aggregator: summary metrics, the two segment
//! tables and the sampled point sequences. Built fresh per request.

use crate::classifier::{PatternKind, PatternLabel};
use crate::continuity::ContinuityViolation;
use crate::model::{Alignment, CurveKind, PlanPoint, ProfilePoint, Segment, SpacePoint};
use serde::{Deserialize, Serialize};

/// Vertical segment with its classification and gradient details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalSegment {
    #[serde(flatten)]
    pub segment: Segment,
    /// Present for polynomial segments only
    pub pattern: Option<PatternLabel>,
    pub start_elevation: Option<f64>,
    pub end_elevation: Option<f64>,
    pub start_gradient: Option<f64>,
    pub end_gradient: Option<f64>,
}

impl VerticalSegment {
    pub fn pattern_kind(&self) -> Option<PatternKind> {
        self.pattern.as_ref().map(|label| label.kind)
    }

    /// Details column of the vertical table
    pub fn details(&self) -> String {
        let gradients = match (self.start_gradient, self.end_gradient) {
            (Some(start), Some(end)) => format!("{:.2}%→{:.2}%", start * 100.0, end * 100.0),
            _ => String::new(),
        };
        match &self.segment.kind {
            CurveKind::Line => format!("{:.2}%", self.start_gradient.unwrap_or(0.0) * 100.0),
            CurveKind::Polynomial { .. } => match &self.pattern {
                Some(label) => format!("{}, {}", label.kind, gradients),
                None => gradients,
            },
            CurveKind::Circle { radius } => format!("R={:.1}m, {}", radius, gradients),
            CurveKind::Clothoid { constant } => format!("A={:.1}, {}", constant, gradients),
            CurveKind::Unknown => gap_details(&self.segment),
        }
    }
}

fn gap_details(segment: &Segment) -> String {
    segment
        .gap
        .as_ref()
        .map(|gap| gap.to_string())
        .unwrap_or_default()
}

/// Details column of the base table
pub fn base_details(segment: &Segment) -> String {
    match &segment.kind {
        CurveKind::Line => String::new(),
        CurveKind::Circle { radius } => format!("R={:.1}m", radius),
        CurveKind::Clothoid { constant } => format!("A={:.1}", constant),
        CurveKind::Polynomial { coefficients_y, .. } => {
            format!("{} coefficients", coefficients_y.len())
        }
        CurveKind::Unknown => gap_details(segment),
    }
}

/// Row of the base curve table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRow {
    pub seg: usize,
    #[serde(rename = "type")]
    pub segment_type: String,
    pub length: String,
    pub details: String,
}

/// Row of the vertical profile table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerticalRow {
    pub seg: usize,
    #[serde(rename = "type")]
    pub segment_type: String,
    pub distance: String,
    pub length: String,
    pub elevation: String,
    pub details: String,
}

/// Pattern seen across all polynomial segments of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DetectedPattern {
    #[serde(rename = "CIVIL3D")]
    Civil3d,
    Imx,
    /// Both CIVIL3D and IMX segments
    Mixed,
    /// Polynomials present, none classified
    Unknown,
    /// No polynomial segments
    None,
}

impl DetectedPattern {
    pub fn from_counts(civil3d: usize, imx: usize, unknown: usize) -> Self {
        match (civil3d > 0, imx > 0) {
            (true, true) => DetectedPattern::Mixed,
            (true, false) => DetectedPattern::Civil3d,
            (false, true) => DetectedPattern::Imx,
            (false, false) if unknown > 0 => DetectedPattern::Unknown,
            (false, false) => DetectedPattern::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedPattern::Civil3d => "CIVIL3D",
            DetectedPattern::Imx => "IMX",
            DetectedPattern::Mixed => "MIXED",
            DetectedPattern::Unknown => "UNKNOWN",
            DetectedPattern::None => "NONE",
        }
    }
}

/// One `(property, value)` line of the summary table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub property: String,
    pub value: String,
}

/// Summary metrics of one alignment report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentSummary {
    pub name: String,
    /// `#id`
    pub step_id: String,
    pub global_id: String,
    pub alignment_type: String,
    pub base_segments: usize,
    pub vertical_segments: usize,
    pub polynomial_segments: usize,
    pub base_length: f64,
    pub vertical_length: f64,
    pub base_points: usize,
    pub vertical_points: usize,
    pub curve_3d_points: usize,
    pub start_elevation: Option<f64>,
    pub min_elevation: Option<f64>,
    pub max_elevation: Option<f64>,
    pub civil3d_segments: usize,
    pub imx_segments: usize,
    pub unknown_pattern_segments: usize,
    pub detected_pattern: DetectedPattern,
    pub unresolved_segments: usize,
    pub continuity_violations: usize,
}

impl AlignmentSummary {
    pub fn new(
        alignment: &Alignment,
        base_segments: &[Segment],
        vertical_segments: &[VerticalSegment],
        points: (&[PlanPoint], &[ProfilePoint], &[SpacePoint]),
        continuity: &[ContinuityViolation],
    ) -> Self {
        let (base_points, vertical_points, curve_3d_points) = points;

        let count_pattern = |kind: PatternKind| {
            vertical_segments
                .iter()
                .filter(|s| s.pattern_kind() == Some(kind))
                .count()
        };
        let civil3d_segments = count_pattern(PatternKind::Civil3d);
        let imx_segments = count_pattern(PatternKind::Imx);
        let unknown_pattern_segments = count_pattern(PatternKind::Unknown);

        let elevations = vertical_points.iter().map(|p| p.elevation);
        let min_elevation = elevations.clone().reduce(f64::min);
        let max_elevation = elevations.reduce(f64::max);

        Self {
            name: alignment.display_name(),
            step_id: format!("#{}", alignment.id),
            global_id: alignment.global_id.clone(),
            alignment_type: alignment.alignment_type.clone(),
            base_segments: base_segments.len(),
            vertical_segments: vertical_segments.len(),
            polynomial_segments: vertical_segments
                .iter()
                .filter(|s| matches!(s.segment.kind, CurveKind::Polynomial { .. }))
                .count(),
            base_length: base_segments.iter().map(|s| s.length).sum(),
            vertical_length: vertical_segments.iter().map(|s| s.segment.length).sum(),
            base_points: base_points.len(),
            vertical_points: vertical_points.len(),
            curve_3d_points: curve_3d_points.len(),
            start_elevation: vertical_points.first().map(|p| p.elevation),
            min_elevation,
            max_elevation,
            civil3d_segments,
            imx_segments,
            unknown_pattern_segments,
            detected_pattern: DetectedPattern::from_counts(
                civil3d_segments,
                imx_segments,
                unknown_pattern_segments,
            ),
            unresolved_segments: base_segments.iter().filter(|s| !s.is_resolved()).count()
                + vertical_segments
                    .iter()
                    .filter(|s| !s.segment.is_resolved())
                    .count(),
            continuity_violations: continuity.len(),
        }
    }

    /// Summary table in display order
    pub fn rows(&self) -> Vec<SummaryRow> {
        let elevation = |value: Option<f64>| match value {
            Some(z) => format!("{:.2} m", z),
            None => "N/A".to_string(),
        };
        let rows = [
            ("Name", self.name.clone()),
            ("STEP ID", self.step_id.clone()),
            ("Global ID", self.global_id.clone()),
            ("Type", self.alignment_type.clone()),
            ("Base Segments", self.base_segments.to_string()),
            ("Vertical Segments", self.vertical_segments.to_string()),
            ("Polynomial Curves", self.polynomial_segments.to_string()),
            ("Total Length", format!("{:.2} m", self.base_length)),
            ("Vertical Length", format!("{:.2} m", self.vertical_length)),
            ("Start Elevation", elevation(self.start_elevation)),
            ("Min Elevation", elevation(self.min_elevation)),
            ("Max Elevation", elevation(self.max_elevation)),
            ("Base Points", self.base_points.to_string()),
            ("Vertical Points", self.vertical_points.to_string()),
            ("3D Points", self.curve_3d_points.to_string()),
            ("CIVIL3D Segments", self.civil3d_segments.to_string()),
            ("IMX Segments", self.imx_segments.to_string()),
            ("Unclassified Polynomials", self.unknown_pattern_segments.to_string()),
            ("Pattern Detected", self.detected_pattern.as_str().to_string()),
            ("Unresolved Segments", self.unresolved_segments.to_string()),
            ("Continuity Violations", self.continuity_violations.to_string()),
        ];
        rows.into_iter()
            .map(|(property, value)| SummaryRow {
                property: property.to_string(),
                value,
            })
            .collect()
    }
}

/// Complete analysis of one alignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentReport {
    pub alignment: Alignment,
    pub summary: AlignmentSummary,
    pub base_segments: Vec<Segment>,
    pub vertical_segments: Vec<VerticalSegment>,
    pub base_points: Vec<PlanPoint>,
    pub vertical_points: Vec<ProfilePoint>,
    pub curve_3d_points: Vec<SpacePoint>,
    pub continuity: Vec<ContinuityViolation>,
}

impl AlignmentReport {
    pub fn base_rows(&self) -> Vec<BaseRow> {
        self.base_segments
            .iter()
            .map(|segment| BaseRow {
                seg: segment.index,
                segment_type: segment.kind.label().to_string(),
                length: format!("{:.2}", segment.length),
                details: base_details(segment),
            })
            .collect()
    }

    pub fn vertical_rows(&self) -> Vec<VerticalRow> {
        self.vertical_segments
            .iter()
            .map(|vertical| {
                let segment = &vertical.segment;
                VerticalRow {
                    seg: segment.index,
                    segment_type: segment.kind.label().to_string(),
                    distance: format!("{:.2}", segment.start_distance_along),
                    length: format!("{:.2}", segment.length),
                    elevation: format!(
                        "{:.2}",
                        vertical.start_elevation.unwrap_or(segment.start_point[1])
                    ),
                    details: vertical.details(),
                }
            })
            .collect()
    }
}

/// Why an alignment has no full report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncompleteReason {
    MissingBaseCurve,
    MissingGradientCurve,
    NoResolvedBaseSegments,
    NoResolvedVerticalSegments,
}

/// Alignment that cannot be analyzed end to end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncompleteReport {
    pub alignment: Alignment,
    pub reasons: Vec<IncompleteReason>,
}

/// Result of [`crate::AlignmentAnalyzer::build_report`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
#[allow(clippy::large_enum_variant)]
pub enum ReportOutcome {
    #[serde(rename = "complete")]
    Report(AlignmentReport),
    Incomplete(IncompleteReport),
}

impl ReportOutcome {
    pub fn alignment(&self) -> &Alignment {
        match self {
            ReportOutcome::Report(report) => &report.alignment,
            ReportOutcome::Incomplete(incomplete) => &incomplete.alignment,
        }
    }

    pub fn report(&self) -> Option<&AlignmentReport> {
        match self {
            ReportOutcome::Report(report) => Some(report),
            ReportOutcome::Incomplete(_) => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ReportOutcome::Report(_))
    }
}

/// Profile elevation at `distance`, linearly interpolated.
///
/// Outside the sampled domain the nearest endpoint elevation is used.
/// `profile` must be ordered by distance.
pub fn elevation_at(profile: &[ProfilePoint], distance: f64) -> Option<f64> {
    let first = profile.first()?;
    let last = profile.last()?;
    let upper = profile.partition_point(|p| p.distance_along < distance);
    if upper == 0 {
        return Some(first.elevation);
    }
    if upper == profile.len() {
        return Some(last.elevation);
    }

    let a = &profile[upper - 1];
    let b = &profile[upper];
    let span = b.distance_along - a.distance_along;
    if span <= 0.0 {
        return Some(b.elevation);
    }
    let t = (distance - a.distance_along) / span;
    Some(a.elevation + t * (b.elevation - a.elevation))
}

/// Lift plan points to the profile elevation at their distance-along.
///
/// A profile whose distances ever decrease (segments stored out of order or
/// overlapping) has no single elevation per distance; nothing is lifted and
/// the continuity check reports the cause.
pub fn lift_to_profile(plan: &[PlanPoint], profile: &[ProfilePoint]) -> Vec<SpacePoint> {
    if profile
        .windows(2)
        .any(|pair| pair[1].distance_along < pair[0].distance_along)
    {
        tracing::warn!(
            profile_points = profile.len(),
            "Profile distances are not ordered, skipping 3D curve"
        );
        return Vec::new();
    }

    plan.iter()
        .filter_map(|p| {
            Some(SpacePoint {
                distance_along: p.distance_along,
                x: p.x,
                y: p.y,
                z: elevation_at(profile, p.distance_along)?,
            })
        })
        .collect()
}
