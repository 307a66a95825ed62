// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Align Geometry
//!
//! Alignment geometry extraction for IFC 4.3: resolves the horizontal and
//! vertical curve segments of an IfcAlignment, samples them with nalgebra
//! frames and Fresnel-integral clothoids, and classifies vertical
//! polynomials as CIVIL3D or IMX encodings.
//!
//! ```rust,ignore
//! use ifc_align_core::EntityGraph;
//! use ifc_align_geometry::{AlignmentAnalyzer, ReportOutcome};
//!
//! let graph = EntityGraph::parse(&content)?;
//! let analyzer = AlignmentAnalyzer::new(&graph);
//! for alignment in analyzer.list_alignments() {
//!     if let ReportOutcome::Report(report) = analyzer.build_report(alignment.id)? {
//!         println!("{}: {}", report.summary.name, report.summary.detected_pattern.as_str());
//!     }
//! }
//! ```

pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod continuity;
pub mod error;
pub mod model;
pub mod report;
pub mod resolver;
pub mod sampler;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Vector2};

pub use analyzer::{AlignmentAnalyzer, AlignmentCurves};
pub use classifier::{classify, classify_coefficients, PatternKind, PatternLabel};
pub use config::{AnalysisConfig, PatternThresholds, SamplingConfig};
pub use continuity::{check_continuity, ContinuityCheck, ContinuityViolation, SegmentEnds};
pub use error::{Error, Result};
pub use model::{
    Alignment, Coefficients, CurveKind, CurveRole, DecodeGap, PlanPoint, ProfilePoint, Segment,
    SpacePoint,
};
pub use report::{
    elevation_at, lift_to_profile, AlignmentReport, AlignmentSummary, BaseRow, DetectedPattern,
    IncompleteReason, IncompleteReport, ReportOutcome, SummaryRow, VerticalRow, VerticalSegment,
};
pub use resolver::{resolve_segments, SegmentPlacement};
pub use sampler::{point_counts, sample_plan, sample_profile};
