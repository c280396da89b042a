// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for drawing decoding
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a decoded drawing
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid drawing document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsafe formula: {0:?}")]
    UnsafeFormula(String),

    #[error("Formula error: {0}")]
    FormulaError(String),
}
