// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use ifc_align_geometry::AnalysisConfig;
use serde::Deserialize;

/// Query options for report requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportOptions {
    /// Override the per-curve point budget; capped at the configured maximum.
    #[serde(default)]
    pub point_budget: Option<usize>,
}

impl ReportOptions {
    /// Server defaults with this request's overrides applied.
    pub fn apply(&self, base: AnalysisConfig) -> AnalysisConfig {
        match self.point_budget {
            Some(budget) if budget > 0 => base.with_point_budget(budget),
            _ => base,
        }
    }
}
