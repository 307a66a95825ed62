// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alignment data model
//!
//! Plain records produced by the resolver and sampler. Nothing here holds a
//! reference into the entity graph, so reports outlive the decoded file.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Polynomial coefficients, constant term first
pub type Coefficients = SmallVec<[f64; 4]>;

/// Which curve of an alignment a segment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveRole {
    /// Plan geometry (x, y)
    Horizontal,
    /// Profile geometry (distance along, elevation)
    Vertical,
}

impl std::fmt::Display for CurveRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurveRole::Horizontal => f.write_str("horizontal"),
            CurveRole::Vertical => f.write_str("vertical"),
        }
    }
}

/// Parametric definition of a segment's parent curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CurveKind {
    Line,
    Circle {
        radius: f64,
    },
    Clothoid {
        /// Signed clothoid constant `A`; negative turns clockwise
        constant: f64,
    },
    Polynomial {
        coefficients_x: Coefficients,
        coefficients_y: Coefficients,
    },
    Unknown,
}

impl CurveKind {
    /// Label used in segment tables
    pub fn label(&self) -> &'static str {
        match self {
            CurveKind::Line => "Line",
            CurveKind::Circle { .. } => "Circle",
            CurveKind::Clothoid { .. } => "Clothoid",
            CurveKind::Polynomial { .. } => "PolynomialCurve",
            CurveKind::Unknown => "Unknown",
        }
    }

    #[inline]
    pub fn is_curved(&self) -> bool {
        matches!(
            self,
            CurveKind::Circle { .. } | CurveKind::Clothoid { .. } | CurveKind::Polynomial { .. }
        )
    }
}

/// Why a segment could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeGap {
    /// Entity that was missing or malformed
    pub entity_id: u32,
    pub reason: String,
}

impl DecodeGap {
    pub fn new(entity_id: u32, reason: impl Into<String>) -> Self {
        Self {
            entity_id,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for DecodeGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}: {}", self.entity_id, self.reason)
    }
}

/// One piece of a horizontal or vertical curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Position in the stored segment list
    pub index: usize,
    /// IfcCurveSegment instance number
    pub entity_id: u32,
    #[serde(flatten)]
    pub kind: CurveKind,
    /// Plan x/y (horizontal) or distance/elevation (vertical)
    pub start_point: [f64; 2],
    /// Heading in radians (horizontal) or slope dy/dx (vertical)
    pub start_direction: f64,
    pub start_distance_along: f64,
    /// Always non-negative
    pub length: f64,
    /// Raw SegmentStart on the parent curve
    pub segment_start: f64,
    /// Raw SegmentLength; the sign encodes the traversal direction
    pub signed_length: f64,
    /// Raw placement RefDirection
    pub direction_ratios: Option<[f64; 2]>,
    pub gap: Option<DecodeGap>,
}

impl Segment {
    /// Unresolved segment carrying only its position and the reason
    pub fn unresolved(index: usize, entity_id: u32, gap: DecodeGap) -> Self {
        Self {
            index,
            entity_id,
            kind: CurveKind::Unknown,
            start_point: [0.0, 0.0],
            start_direction: 0.0,
            start_distance_along: 0.0,
            length: 0.0,
            segment_start: 0.0,
            signed_length: 0.0,
            direction_ratios: None,
            gap: Some(gap),
        }
    }

    /// Keep the parameter range of an unresolved segment
    pub fn with_extent(mut self, segment_start: f64, signed_length: f64) -> Self {
        self.segment_start = segment_start;
        self.signed_length = signed_length;
        self.length = signed_length.abs();
        self
    }

    #[inline]
    pub fn end_distance_along(&self) -> f64 {
        self.start_distance_along + self.length
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.kind != CurveKind::Unknown
    }

    /// +1 when the segment runs along its parent curve, -1 when reversed
    #[inline]
    pub fn traversal_sign(&self) -> f64 {
        if self.signed_length < 0.0 {
            -1.0
        } else {
            1.0
        }
    }
}

/// Sampled point of the horizontal curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanPoint {
    pub distance_along: f64,
    pub x: f64,
    pub y: f64,
    /// Signed curvature, positive turning counter-clockwise
    pub curvature: f64,
}

/// Sampled point of the vertical profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub distance_along: f64,
    pub elevation: f64,
    /// Gradient dz/dd
    pub slope: f64,
}

/// Plan point lifted to the profile elevation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpacePoint {
    pub distance_along: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Alignment metadata discovered from an IfcAlignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    /// STEP instance number
    pub id: u32,
    pub global_id: String,
    pub name: String,
    pub description: String,
    /// PredefinedType, USERDEFINED when absent
    #[serde(rename = "type")]
    pub alignment_type: String,
    pub has_base_curve: bool,
    pub has_gradient_curve: bool,
    /// Both curves present, each with at least one resolved segment
    pub is_complete: bool,
}

impl Alignment {
    /// Name, or `Alignment {id}` when the name is empty
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Alignment {}", self.id)
        } else {
            self.name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alignment(name: &str) -> Alignment {
        Alignment {
            id: 42,
            global_id: "3Zu5Bv0LOHrPC10026FoQQ".into(),
            name: name.into(),
            description: String::new(),
            alignment_type: "USERDEFINED".into(),
            has_base_curve: true,
            has_gradient_curve: false,
            is_complete: false,
        }
    }

    #[test]
    fn display_name_falls_back_to_id() {
        assert_eq!(alignment("").display_name(), "Alignment 42");
        assert_eq!(alignment("  ").display_name(), "Alignment 42");
        assert_eq!(alignment("A1 Mainline").display_name(), "A1 Mainline");
    }

    #[test]
    fn segment_serializes_kind_inline() {
        let mut segment = Segment::unresolved(0, 10, DecodeGap::new(11, "missing ParentCurve"));
        segment.kind = CurveKind::Circle { radius: 250.0 };
        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(json["kind"], "CIRCLE");
        assert_eq!(json["radius"], 250.0);

        let back: Segment = serde_json::from_value(json).unwrap();
        assert_eq!(back, segment);
    }

    #[test]
    fn alignment_type_serializes_as_type() {
        let json = serde_json::to_value(alignment("A")).unwrap();
        assert_eq!(json["type"], "USERDEFINED");
    }
}
