// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use ifc_align_geometry::{Alignment, BaseRow, ReportOutcome, SummaryRow, VerticalRow};
use serde::Serialize;

/// Result of a file upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    /// Key for later requests (SHA256 of file content).
    pub file_key: String,
    pub filename: String,
    /// File size in bytes.
    pub size: usize,
    /// IFC schema declared in the header.
    pub schema: String,
    pub alignments: Vec<Alignment>,
}

/// Alignments of a stored file.
#[derive(Debug, Clone, Serialize)]
pub struct AlignmentListResponse {
    pub file_key: String,
    pub alignments: Vec<Alignment>,
}

/// Display tables of a complete report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportTables {
    pub summary: Vec<SummaryRow>,
    pub base_segments: Vec<BaseRow>,
    pub vertical_segments: Vec<VerticalRow>,
}

/// Report or incomplete outcome for one alignment.
#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub file_key: String,
    #[serde(flatten)]
    pub outcome: ReportOutcome,
    /// Present only for complete reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<ReportTables>,
}

impl ReportResponse {
    pub fn new(file_key: String, outcome: ReportOutcome) -> Self {
        let tables = outcome.report().map(|report| ReportTables {
            summary: report.summary.rows(),
            base_segments: report.base_rows(),
            vertical_segments: report.vertical_rows(),
        });
        Self {
            file_key,
            outcome,
            tables,
        }
    }
}

/// Outcomes for every alignment of a stored file.
#[derive(Debug, Clone, Serialize)]
pub struct AllReportsResponse {
    pub file_key: String,
    pub complete: usize,
    pub incomplete: usize,
    pub reports: Vec<ReportResponse>,
}

impl AllReportsResponse {
    pub fn new(file_key: String, outcomes: Vec<ReportOutcome>) -> Self {
        let complete = outcomes.iter().filter(|o| o.is_complete()).count();
        let incomplete = outcomes.len() - complete;
        let reports = outcomes
            .into_iter()
            .map(|outcome| ReportResponse::new(file_key.clone(), outcome))
            .collect();
        Self {
            file_key,
            complete,
            incomplete,
            reports,
        }
    }
}
