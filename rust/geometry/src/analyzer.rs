// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alignment Aggregator - per-alignment orchestration
//!
//! Discovers the base and gradient curves of an IfcAlignment, resolves and
//! samples both, classifies vertical polynomials and assembles the report.

use crate::classifier::classify;
use crate::config::AnalysisConfig;
use crate::continuity::{check_continuity, SegmentEnds};
use crate::error::{Error, Result};
use crate::model::{Alignment, CurveKind, CurveRole, PlanPoint, ProfilePoint, Segment};
use crate::report::{
    lift_to_profile, AlignmentReport, AlignmentSummary, IncompleteReason, IncompleteReport,
    ReportOutcome, VerticalSegment,
};
use crate::resolver::resolve_segments;
use crate::sampler::{append_joined, point_counts, profile_state, sample_plan, sample_profile};
use ifc_align_core::{EntityAccessor, EntityRef, IfcType};
use rayon::prelude::*;
use std::time::Instant;

/// Curves referenced by an alignment's representations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignmentCurves {
    /// Horizontal composite curve
    pub base: Option<EntityRef>,
    /// Gradient curve (never the segmented reference curve itself)
    pub gradient: Option<EntityRef>,
}

/// Alignment metadata plus resolved segments of both curves
struct Inspection {
    alignment: Alignment,
    base_segments: Vec<Segment>,
    vertical_segments: Vec<Segment>,
}

/// Read-only alignment analysis over an entity graph
pub struct AlignmentAnalyzer<'a, A: EntityAccessor + ?Sized> {
    accessor: &'a A,
    config: AnalysisConfig,
}

impl<'a, A: EntityAccessor + ?Sized> AlignmentAnalyzer<'a, A> {
    pub fn new(accessor: &'a A) -> Self {
        Self::with_config(accessor, AnalysisConfig::default())
    }

    pub fn with_config(accessor: &'a A, config: AnalysisConfig) -> Self {
        Self { accessor, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Every IfcAlignment, in ascending id order
    pub fn list_alignments(&self) -> Vec<Alignment> {
        self.accessor
            .entities_of_type(IfcType::IfcAlignment)
            .into_iter()
            .map(|entity| self.inspect(entity).alignment)
            .collect()
    }

    /// Metadata of a single alignment
    pub fn alignment(&self, id: u32) -> Result<Alignment> {
        let entity = self.require_alignment(id)?;
        Ok(self.inspect(entity).alignment)
    }

    /// Analyze one alignment.
    ///
    /// Missing curves are reported as [`ReportOutcome::Incomplete`]; only an
    /// id that does not name an IfcAlignment is an error.
    pub fn build_report(&self, id: u32) -> Result<ReportOutcome> {
        let started = Instant::now();
        let entity = self.require_alignment(id)?;
        let Inspection {
            alignment,
            base_segments,
            vertical_segments,
        } = self.inspect(entity);

        let reasons = incomplete_reasons(&alignment, &base_segments, &vertical_segments);
        if !reasons.is_empty() {
            tracing::info!(alignment = id, ?reasons, "Alignment incomplete");
            return Ok(ReportOutcome::Incomplete(IncompleteReport { alignment, reasons }));
        }

        let thresholds = &self.config.thresholds;
        let sampling = &self.config.sampling;

        // Horizontal
        let mut base_points: Vec<PlanPoint> = Vec::new();
        for (segment, count) in base_segments
            .iter()
            .zip(point_counts(&base_segments, sampling))
        {
            append_joined(&mut base_points, sample_plan(segment, count));
        }
        let base_ends: Vec<_> = base_segments.iter().map(SegmentEnds::plan).collect();
        let mut continuity = check_continuity(
            &base_segments,
            &base_ends,
            CurveRole::Horizontal,
            self.config.continuity_tolerance,
        );

        // Vertical
        let patterns: Vec<_> = vertical_segments
            .iter()
            .map(|segment| match segment.kind {
                CurveKind::Polynomial { .. } => Some(classify(segment, thresholds)),
                _ => None,
            })
            .collect();
        let kinds: Vec<_> = patterns
            .iter()
            .map(|label| label.as_ref().map(|l| l.kind))
            .collect();

        let mut vertical_points: Vec<ProfilePoint> = Vec::new();
        for ((segment, count), kind) in vertical_segments
            .iter()
            .zip(point_counts(&vertical_segments, sampling))
            .zip(&kinds)
        {
            append_joined(&mut vertical_points, sample_profile(segment, count, *kind));
        }
        let vertical_ends: Vec<_> = vertical_segments
            .iter()
            .zip(&kinds)
            .map(|(segment, kind)| SegmentEnds::profile(segment, *kind))
            .collect();
        continuity.extend(check_continuity(
            &vertical_segments,
            &vertical_ends,
            CurveRole::Vertical,
            self.config.continuity_tolerance,
        ));

        let verticals: Vec<VerticalSegment> = vertical_segments
            .into_iter()
            .zip(patterns)
            .zip(kinds)
            .map(|((segment, pattern), kind)| {
                let start = profile_state(&segment, 0.0, kind);
                let end = profile_state(&segment, segment.length, kind);
                VerticalSegment {
                    pattern,
                    start_elevation: start.map(|p| p.elevation),
                    end_elevation: end.map(|p| p.elevation),
                    start_gradient: start.map(|p| p.slope),
                    end_gradient: end.map(|p| p.slope),
                    segment,
                }
            })
            .collect();

        let curve_3d_points = lift_to_profile(&base_points, &vertical_points);

        let summary = AlignmentSummary::new(
            &alignment,
            &base_segments,
            &verticals,
            (&base_points, &vertical_points, &curve_3d_points),
            &continuity,
        );

        tracing::info!(
            alignment = id,
            base_segments = summary.base_segments,
            vertical_segments = summary.vertical_segments,
            pattern = summary.detected_pattern.as_str(),
            violations = summary.continuity_violations,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built alignment report"
        );

        Ok(ReportOutcome::Report(AlignmentReport {
            alignment,
            summary,
            base_segments,
            vertical_segments: verticals,
            base_points,
            vertical_points,
            curve_3d_points,
            continuity,
        }))
    }

    /// Base and gradient curves of an alignment.
    ///
    /// `Curve2D` names the base curve and `Curve3D` the gradient curve; a
    /// segmented reference curve is followed to its gradient curve, and a
    /// gradient curve supplies the base curve when no `Curve2D` exists.
    pub fn discover_curves(&self, alignment: EntityRef) -> AlignmentCurves {
        let accessor = self.accessor;
        let mut curves = AlignmentCurves::default();

        let representations = accessor
            .resolve(alignment, "Representation")
            .map(|shape| accessor.resolve_list(shape, "Representations"))
            .unwrap_or_default();

        for representation in representations {
            let Some(item) = accessor
                .resolve_list(representation, "Items")
                .into_iter()
                .find(|item| matches!(accessor.type_of(*item), Some(t) if t.is_segmented_curve()))
            else {
                continue;
            };

            match accessor.attribute_str(representation, "RepresentationType") {
                Some("Curve2D") if curves.base.is_none() => curves.base = Some(item),
                Some("Curve3D") if curves.gradient.is_none() => {
                    curves.gradient = self.gradient_of(item);
                }
                _ => {}
            }
        }

        if curves.base.is_none() {
            curves.base = curves.gradient.and_then(|gradient| {
                accessor
                    .resolve(gradient, "BaseCurve")
                    .filter(|base| accessor.type_of(*base) == Some(IfcType::IfcCompositeCurve))
            });
        }

        curves
    }

    fn gradient_of(&self, curve: EntityRef) -> Option<EntityRef> {
        match self.accessor.type_of(curve)? {
            IfcType::IfcGradientCurve => Some(curve),
            IfcType::IfcSegmentedReferenceCurve => self
                .accessor
                .resolve(curve, "BaseCurve")
                .filter(|base| self.accessor.type_of(*base) == Some(IfcType::IfcGradientCurve)),
            _ => None,
        }
    }

    fn require_alignment(&self, id: u32) -> Result<EntityRef> {
        let entity = EntityRef(id);
        match self.accessor.type_of(entity) {
            Some(IfcType::IfcAlignment) => Ok(entity),
            Some(_) => Err(Error::not_an_alignment(
                id,
                self.accessor.type_name(entity).unwrap_or("UNKNOWN"),
            )),
            None => Err(Error::AlignmentNotFound(id)),
        }
    }

    fn inspect(&self, entity: EntityRef) -> Inspection {
        let accessor = self.accessor;
        let curves = self.discover_curves(entity);

        let base_segments = curves
            .base
            .map(|curve| resolve_segments(accessor, curve, CurveRole::Horizontal))
            .unwrap_or_default();
        let vertical_segments = curves
            .gradient
            .map(|curve| resolve_segments(accessor, curve, CurveRole::Vertical))
            .unwrap_or_default();

        let text = |name: &str| {
            accessor
                .attribute_str(entity, name)
                .unwrap_or_default()
                .to_string()
        };
        let alignment = Alignment {
            id: entity.id(),
            global_id: text("GlobalId"),
            name: text("Name"),
            description: text("Description"),
            alignment_type: accessor
                .attribute_enum(entity, "PredefinedType")
                .unwrap_or("USERDEFINED")
                .to_string(),
            has_base_curve: curves.base.is_some(),
            has_gradient_curve: curves.gradient.is_some(),
            is_complete: curves.base.is_some()
                && curves.gradient.is_some()
                && base_segments.iter().any(Segment::is_resolved)
                && vertical_segments.iter().any(Segment::is_resolved),
        };

        Inspection {
            alignment,
            base_segments,
            vertical_segments,
        }
    }
}

impl<'a, A: EntityAccessor + Sync + ?Sized> AlignmentAnalyzer<'a, A> {
    /// Analyze every alignment in parallel
    pub fn build_all_reports(&self) -> Vec<(u32, Result<ReportOutcome>)> {
        let ids: Vec<u32> = self
            .accessor
            .entities_of_type(IfcType::IfcAlignment)
            .into_iter()
            .map(EntityRef::id)
            .collect();

        ids.par_iter()
            .map(|&id| (id, self.build_report(id)))
            .collect()
    }
}

fn incomplete_reasons(
    alignment: &Alignment,
    base_segments: &[Segment],
    vertical_segments: &[Segment],
) -> Vec<IncompleteReason> {
    let mut reasons = Vec::new();
    if !alignment.has_base_curve {
        reasons.push(IncompleteReason::MissingBaseCurve);
    } else if !base_segments.iter().any(Segment::is_resolved) {
        reasons.push(IncompleteReason::NoResolvedBaseSegments);
    }
    if !alignment.has_gradient_curve {
        reasons.push(IncompleteReason::MissingGradientCurve);
    } else if !vertical_segments.iter().any(Segment::is_resolved) {
        reasons.push(IncompleteReason::NoResolvedVerticalSegments);
    }
    reasons
}
