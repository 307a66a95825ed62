// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alignment report endpoints.

use super::load_stored;
use crate::error::ApiError;
use crate::services::analysis;
use crate::types::{AllReportsResponse, ReportOptions, ReportResponse};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};

/// GET /api/v1/files/:file_key/alignments/:id/report - Report for one alignment.
pub async fn report(
    State(state): State<AppState>,
    Path((file_key, alignment_id)): Path<(String, u32)>,
    Query(options): Query<ReportOptions>,
) -> Result<Json<ReportResponse>, ApiError> {
    let file = load_stored(&state, &file_key).await?;
    let config = options.apply(state.config.analysis);

    let outcome =
        tokio::task::spawn_blocking(move || analysis::build_report(&file, config, alignment_id))
            .await??;

    Ok(Json(ReportResponse::new(file_key, outcome)))
}

/// GET /api/v1/files/:file_key/reports - Reports for every alignment.
pub async fn all_reports(
    State(state): State<AppState>,
    Path(file_key): Path<String>,
    Query(options): Query<ReportOptions>,
) -> Result<Json<AllReportsResponse>, ApiError> {
    let file = load_stored(&state, &file_key).await?;
    let config = options.apply(state.config.analysis);

    let outcomes =
        tokio::task::spawn_blocking(move || analysis::build_all_reports(&file, config)).await?;

    tracing::info!(
        file_key = %file_key,
        alignments = outcomes.len(),
        "Built all alignment reports"
    );
    Ok(Json(AllReportsResponse::new(file_key, outcomes)))
}
