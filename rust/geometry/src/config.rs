// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Analysis configuration
//!
//! Every knob has a `Default` matching the behaviour of the reference
//! workflow: 1000 points per curve, CIVIL3D limits of 1.0 and 0.001.

use serde::{Deserialize, Serialize};

/// Point distribution across the segments of one curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Points shared by all segments of a curve, split by length
    pub point_budget: usize,
    /// Minimum points for a line segment
    pub min_line_points: usize,
    /// Minimum points for circle, clothoid and polynomial segments
    pub min_curve_points: usize,
    /// Upper bound on `point_budget`
    pub max_point_budget: usize,
}

impl SamplingConfig {
    /// Point budget after the cap
    pub fn budget(&self) -> usize {
        self.point_budget.min(self.max_point_budget)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            point_budget: 1000,
            min_line_points: 2,
            min_curve_points: 8,
            max_point_budget: 100_000,
        }
    }
}

/// Coefficient limits for vertical polynomial classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternThresholds {
    /// `|c0|` above this means the polynomial carries absolute elevation
    pub civil3d_c0_limit: f64,
    /// `|c1|` above this means the polynomial carries the start gradient
    pub civil3d_c1_limit: f64,
    /// Magnitude below which a coefficient counts as zero
    pub zero_tolerance: f64,
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            civil3d_c0_limit: 1.0,
            civil3d_c1_limit: 0.001,
            zero_tolerance: 1e-9,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sampling: SamplingConfig,
    pub thresholds: PatternThresholds,
    /// Allowed mismatch (metres) between consecutive segments
    pub continuity_tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            thresholds: PatternThresholds::default(),
            continuity_tolerance: 1e-3,
        }
    }
}

impl AnalysisConfig {
    /// Replace the point budget, capped at `max_point_budget`
    pub fn with_point_budget(mut self, point_budget: usize) -> Self {
        self.sampling.point_budget = point_budget.min(self.sampling.max_point_budget);
        self
    }

    pub fn with_thresholds(mut self, thresholds: PatternThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.sampling.point_budget, 1000);
        assert_eq!(config.sampling.min_line_points, 2);
        assert_eq!(config.sampling.min_curve_points, 8);
        assert_eq!(config.thresholds.civil3d_c0_limit, 1.0);
        assert_eq!(config.thresholds.civil3d_c1_limit, 0.001);
        assert_eq!(config.continuity_tolerance, 1e-3);
    }

    #[test]
    fn point_budget_is_capped() {
        let config = AnalysisConfig::default().with_point_budget(usize::MAX);
        assert_eq!(config.sampling.point_budget, 100_000);

        let raw = SamplingConfig {
            point_budget: 5_000_000,
            ..SamplingConfig::default()
        };
        assert_eq!(raw.budget(), 100_000);
        assert_eq!(SamplingConfig::default().budget(), 1000);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"thresholds": {"civil3d_c0_limit": 5.0}}"#).unwrap();
        assert_eq!(config.thresholds.civil3d_c0_limit, 5.0);
        assert_eq!(config.thresholds.civil3d_c1_limit, 0.001);
        assert_eq!(config.sampling, SamplingConfig::default());
    }
}
