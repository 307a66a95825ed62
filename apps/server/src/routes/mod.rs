// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP route handlers.

pub mod files;
pub mod health;
pub mod reports;

use crate::error::ApiError;
use crate::services::{analysis, LoadedFile};
use crate::AppState;

/// Read a stored upload and decode it on the blocking pool.
pub(crate) async fn load_stored(state: &AppState, file_key: &str) -> Result<LoadedFile, ApiError> {
    let data = state.cache.load_file(file_key).await?;
    tokio::task::spawn_blocking(move || analysis::load(data)).await?
}
