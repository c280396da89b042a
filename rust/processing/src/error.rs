// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Conversion errors
///
/// Only whole-drawing failures surface here; per-entity geometry problems
/// are logged and recorded in the conversion report instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Drawing error: {0}")]
    Core(#[from] dxf_lite_core::Error),

    #[error("Geometry error: {0}")]
    Geometry(#[from] dxf_lite_geometry::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Drawing produced no valid entities ({skipped} skipped)")]
    NoValidEntities { skipped: usize },
}
