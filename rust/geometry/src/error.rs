// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for alignment analysis
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during alignment analysis.
///
/// Faults inside a curve (missing sub-entities, unsupported parent curves)
/// are not errors; they surface as UNKNOWN segments with a decode gap.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Alignment #{0} not found")]
    AlignmentNotFound(u32),

    #[error("Entity #{id} is {type_name}, not IFCALIGNMENT")]
    NotAnAlignment { id: u32, type_name: String },

    #[error("Core parser error: {0}")]
    Core(#[from] ifc_align_core::Error),
}

impl Error {
    pub fn not_an_alignment(id: u32, type_name: impl Into<String>) -> Self {
        Error::NotAnAlignment {
            id,
            type_name: type_name.into(),
        }
    }
}
