// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Segment Resolver - walks a segmented curve into normalized [`Segment`]s
//!
//! The stored `Segments` order is kept as is. A segment whose placement,
//! length or parent curve cannot be read becomes an UNKNOWN segment with a
//! [`DecodeGap`]; the rest of the curve is still resolved.

use crate::model::{Coefficients, CurveKind, CurveRole, DecodeGap, Segment};
use ifc_align_core::{AttributeValue, EntityAccessor, EntityRef, IfcType};
use smallvec::smallvec;

/// Placement of a curve segment, in its curve's 2D frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPlacement {
    pub location: [f64; 2],
    /// Raw RefDirection, None when the placement omits it
    pub direction_ratios: Option<[f64; 2]>,
}

impl SegmentPlacement {
    /// Normalized direction, (1, 0) when absent or degenerate
    pub fn direction(&self) -> [f64; 2] {
        match self.direction_ratios {
            Some([dx, dy]) if dx.hypot(dy) > f64::EPSILON => {
                let norm = dx.hypot(dy);
                [dx / norm, dy / norm]
            }
            _ => [1.0, 0.0],
        }
    }

    /// Heading in radians
    pub fn angle(&self) -> f64 {
        let [dx, dy] = self.direction();
        dy.atan2(dx)
    }

    /// Gradient dy/dx; 0 for a vertical direction
    pub fn slope(&self) -> f64 {
        let [dx, dy] = self.direction_ratios.unwrap_or([1.0, 0.0]);
        if dx == 0.0 {
            0.0
        } else {
            dy / dx
        }
    }
}

/// Resolve every segment of a composite, gradient or segmented reference curve
pub fn resolve_segments<A: EntityAccessor + ?Sized>(
    accessor: &A,
    curve: EntityRef,
    role: CurveRole,
) -> Vec<Segment> {
    let members = match accessor.attribute(curve, "Segments").and_then(|v| v.as_list()) {
        Some(members) => members,
        None => {
            tracing::debug!(curve = curve.id(), %role, "Curve has no segment list");
            return Vec::new();
        }
    };

    let mut segments = Vec::with_capacity(members.len());
    let mut cumulative = 0.0;

    for (index, member) in members.iter().enumerate() {
        let mut segment = resolve_member(accessor, curve, index, member, role);

        if role == CurveRole::Horizontal {
            segment.start_distance_along = cumulative;
        }
        cumulative += segment.length;

        if let Some(gap) = &segment.gap {
            tracing::warn!(
                curve = curve.id(),
                %role,
                index,
                gap = %gap,
                "Unresolved curve segment"
            );
        }
        segments.push(segment);
    }

    tracing::debug!(
        curve = curve.id(),
        %role,
        segments = segments.len(),
        unresolved = segments.iter().filter(|s| !s.is_resolved()).count(),
        "Resolved curve"
    );

    segments
}

fn resolve_member<A: EntityAccessor + ?Sized>(
    accessor: &A,
    curve: EntityRef,
    index: usize,
    member: &AttributeValue,
    role: CurveRole,
) -> Segment {
    let Some(id) = member.as_entity_ref() else {
        return Segment::unresolved(
            index,
            curve.id(),
            DecodeGap::new(curve.id(), format!("segment {} is not an entity reference", index)),
        );
    };
    let entity = EntityRef(id);

    match accessor.type_of(entity) {
        None => Segment::unresolved(index, id, DecodeGap::new(id, "segment entity not found")),
        Some(IfcType::IfcCurveSegment) => resolve_curve_segment(accessor, entity, index, role),
        Some(_) => {
            let type_name = accessor.type_name(entity).unwrap_or("UNKNOWN");
            Segment::unresolved(
                index,
                id,
                DecodeGap::new(id, format!("unsupported segment type {}", type_name)),
            )
        }
    }
}

fn resolve_curve_segment<A: EntityAccessor + ?Sized>(
    accessor: &A,
    entity: EntityRef,
    index: usize,
    role: CurveRole,
) -> Segment {
    let id = entity.id();

    let Some(signed_length) = accessor.attribute_f64(entity, "SegmentLength") else {
        return Segment::unresolved(index, id, DecodeGap::new(id, "missing SegmentLength"));
    };
    let segment_start = accessor.attribute_f64(entity, "SegmentStart").unwrap_or(0.0);

    // Length still counts toward the distance of later segments
    let placement = match resolve_placement(accessor, entity) {
        Ok(placement) => placement,
        Err(gap) => {
            return Segment::unresolved(index, id, gap).with_extent(segment_start, signed_length)
        }
    };

    let (start_direction, start_distance_along) = match role {
        CurveRole::Horizontal => (placement.angle(), 0.0),
        CurveRole::Vertical => (placement.slope(), placement.location[0]),
    };

    let (kind, gap) = match resolve_parent_curve(accessor, entity) {
        Ok(kind) => (kind, None),
        Err(gap) => (CurveKind::Unknown, Some(gap)),
    };

    Segment {
        index,
        entity_id: id,
        kind,
        start_point: placement.location,
        start_direction,
        start_distance_along,
        length: signed_length.abs(),
        segment_start,
        signed_length,
        direction_ratios: placement.direction_ratios,
        gap,
    }
}

/// Read an IfcAxis2Placement2D (or the plan part of an IfcAxis2Placement3D)
pub fn resolve_placement<A: EntityAccessor + ?Sized>(
    accessor: &A,
    segment: EntityRef,
) -> Result<SegmentPlacement, DecodeGap> {
    let placement = accessor
        .resolve(segment, "Placement")
        .ok_or_else(|| DecodeGap::new(segment.id(), "missing Placement"))?;

    match accessor.type_of(placement) {
        Some(IfcType::IfcAxis2Placement2D) | Some(IfcType::IfcAxis2Placement3D) => {}
        _ => {
            return Err(DecodeGap::new(
                placement.id(),
                format!(
                    "unsupported placement type {}",
                    accessor.type_name(placement).unwrap_or("UNKNOWN")
                ),
            ))
        }
    }

    let location = accessor
        .resolve(placement, "Location")
        .and_then(|point| accessor.attribute_floats(point, "Coordinates"))
        .filter(|coords| coords.len() >= 2)
        .ok_or_else(|| DecodeGap::new(placement.id(), "missing or malformed Location"))?;

    let direction_ratios = accessor
        .resolve(placement, "RefDirection")
        .and_then(|dir| accessor.attribute_floats(dir, "DirectionRatios"))
        .filter(|ratios| ratios.len() >= 2)
        .map(|ratios| [ratios[0], ratios[1]]);

    Ok(SegmentPlacement {
        location: [location[0], location[1]],
        direction_ratios,
    })
}

/// Read the parametric definition of a segment's ParentCurve
pub fn resolve_parent_curve<A: EntityAccessor + ?Sized>(
    accessor: &A,
    segment: EntityRef,
) -> Result<CurveKind, DecodeGap> {
    let parent = accessor
        .resolve(segment, "ParentCurve")
        .ok_or_else(|| DecodeGap::new(segment.id(), "missing ParentCurve"))?;

    match accessor.type_of(parent) {
        Some(IfcType::IfcLine) => Ok(CurveKind::Line),
        Some(IfcType::IfcCircle) => accessor
            .attribute_f64(parent, "Radius")
            .filter(|r| r.is_finite() && *r > 0.0)
            .map(|radius| CurveKind::Circle { radius })
            .ok_or_else(|| DecodeGap::new(parent.id(), "circle radius missing or not positive")),
        Some(IfcType::IfcClothoid) => accessor
            .attribute_f64(parent, "ClothoidConstant")
            .filter(|a| a.is_finite() && *a != 0.0)
            .map(|constant| CurveKind::Clothoid { constant })
            .ok_or_else(|| DecodeGap::new(parent.id(), "clothoid constant missing or zero")),
        Some(IfcType::IfcPolynomialCurve) => {
            let coefficients_x = accessor.attribute_floats(parent, "CoefficientsX");
            let coefficients_y = accessor.attribute_floats(parent, "CoefficientsY");
            if coefficients_x.is_none() && coefficients_y.is_none() {
                return Err(DecodeGap::new(parent.id(), "polynomial has no coefficients"));
            }
            Ok(CurveKind::Polynomial {
                coefficients_x: coefficients_x.unwrap_or_else(|| smallvec![0.0, 1.0]),
                coefficients_y: coefficients_y.unwrap_or_else(Coefficients::new),
            })
        }
        _ => Err(DecodeGap::new(
            parent.id(),
            format!(
                "unsupported parent curve {}",
                accessor.type_name(parent).unwrap_or("UNKNOWN")
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ifc_align_core::EntityGraph;

    const CURVE: &str = r#"
#1=IFCCARTESIANPOINT((0.,0.));
#2=IFCDIRECTION((1.,0.));
#3=IFCAXIS2PLACEMENT2D(#1,#2);
#4=IFCLINE(#1,#9);
#10=IFCCARTESIANPOINT((100.,0.));
#11=IFCDIRECTION((0.,1.));
#12=IFCAXIS2PLACEMENT2D(#10,#11);
#13=IFCCIRCLE(#3,250.);
#20=IFCCURVESEGMENT(.CONTINUOUS.,#3,IFCLENGTHMEASURE(0.),IFCLENGTHMEASURE(100.),#4);
#21=IFCCURVESEGMENT(.CONTINUOUS.,#12,IFCLENGTHMEASURE(0.),IFCLENGTHMEASURE(-50.),#13);
#22=IFCCURVESEGMENT(.CONTINUOUS.,#12,IFCLENGTHMEASURE(0.),IFCLENGTHMEASURE(20.),#99);
#23=IFCCURVESEGMENT(.CONTINUOUS.,$,IFCLENGTHMEASURE(0.),IFCLENGTHMEASURE(20.),#4);
#30=IFCCOMPOSITECURVE((#20,#21,#22,#23,#98),.F.);
#40=IFCCARTESIANPOINT((120.,35.5));
#41=IFCDIRECTION((1.,0.02));
#42=IFCAXIS2PLACEMENT2D(#40,#41);
#43=IFCPOLYNOMIALCURVE(#3,(0.,1.),(0.,0.,0.0001),$);
#44=IFCCURVESEGMENT(.CONTINUOUS.,#42,IFCLENGTHMEASURE(0.),IFCLENGTHMEASURE(80.),#43);
#45=IFCGRADIENTCURVE((#44),.F.,#30,$);
"#;

    #[test]
    fn horizontal_segments_keep_stored_order() {
        let graph = EntityGraph::from_step(CURVE);
        let segments = resolve_segments(&graph, EntityRef(30), CurveRole::Horizontal);
        assert_eq!(segments.len(), 5);
        assert_eq!(
            segments.iter().map(|s| s.entity_id).collect::<Vec<_>>(),
            vec![20, 21, 22, 23, 98]
        );

        let line = &segments[0];
        assert_eq!(line.kind, CurveKind::Line);
        assert_relative_eq!(line.length, 100.0);
        assert_relative_eq!(line.start_direction, 0.0);

        let arc = &segments[1];
        assert_eq!(arc.kind, CurveKind::Circle { radius: 250.0 });
        assert_relative_eq!(arc.length, 50.0);
        assert_relative_eq!(arc.signed_length, -50.0);
        assert_relative_eq!(arc.start_distance_along, 100.0);
        assert_relative_eq!(arc.start_direction, std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn gaps_degrade_to_unknown() {
        let graph = EntityGraph::from_step(CURVE);
        let segments = resolve_segments(&graph, EntityRef(30), CurveRole::Horizontal);

        // Dangling parent keeps placement and length
        assert_eq!(segments[2].kind, CurveKind::Unknown);
        assert_eq!(segments[2].gap.as_ref().unwrap().entity_id, 22);
        assert_relative_eq!(segments[2].length, 20.0);
        assert_relative_eq!(segments[2].start_distance_along, 150.0);

        assert!(segments[3].gap.as_ref().unwrap().reason.contains("Placement"));
        assert!(segments[4].gap.as_ref().unwrap().reason.contains("not found"));
    }

    #[test]
    fn missing_placement_keeps_running_distance() {
        let content = r#"
#1=IFCCARTESIANPOINT((0.,0.));
#2=IFCDIRECTION((1.,0.));
#3=IFCAXIS2PLACEMENT2D(#1,#2);
#4=IFCLINE(#1,#9);
#5=IFCCARTESIANPOINT((150.,0.));
#6=IFCAXIS2PLACEMENT2D(#5,#2);
#20=IFCCURVESEGMENT(.CONTINUOUS.,#3,IFCLENGTHMEASURE(0.),IFCLENGTHMEASURE(100.),#4);
#21=IFCCURVESEGMENT(.CONTINUOUS.,$,IFCLENGTHMEASURE(0.),IFCLENGTHMEASURE(50.),#4);
#22=IFCCURVESEGMENT(.CONTINUOUS.,#6,IFCLENGTHMEASURE(0.),IFCLENGTHMEASURE(100.),#4);
#30=IFCCOMPOSITECURVE((#20,#21,#22),.F.);
"#;
        let graph = EntityGraph::from_step(content);
        let segments = resolve_segments(&graph, EntityRef(30), CurveRole::Horizontal);

        assert!(!segments[1].is_resolved());
        assert_relative_eq!(segments[1].length, 50.0);
        assert_relative_eq!(segments[1].start_distance_along, 100.0);
        assert_relative_eq!(segments[2].start_distance_along, 150.0);
    }

    #[test]
    fn vertical_segments_use_placement_distance() {
        let graph = EntityGraph::from_step(CURVE);
        let segments = resolve_segments(&graph, EntityRef(45), CurveRole::Vertical);
        assert_eq!(segments.len(), 1);
        let poly = &segments[0];
        assert_relative_eq!(poly.start_distance_along, 120.0);
        assert_relative_eq!(poly.start_point[1], 35.5);
        assert_relative_eq!(poly.start_direction, 0.02);
        match &poly.kind {
            CurveKind::Polynomial { coefficients_y, .. } => {
                assert_eq!(coefficients_y.as_slice(), &[0.0, 0.0, 0.0001]);
            }
            other => panic!("expected polynomial, got {:?}", other),
        }
    }

    #[test]
    fn curve_without_segments_is_empty() {
        let graph = EntityGraph::from_step(CURVE);
        assert!(resolve_segments(&graph, EntityRef(4), CurveRole::Horizontal).is_empty());
    }

    #[test]
    fn placement_slope_handles_vertical_direction() {
        let placement = SegmentPlacement {
            location: [0.0, 0.0],
            direction_ratios: Some([0.0, 1.0]),
        };
        assert_eq!(placement.slope(), 0.0);
        assert_relative_eq!(placement.angle(), std::f64::consts::FRAC_PI_2);
    }
}
