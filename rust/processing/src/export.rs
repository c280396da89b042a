// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frozen conversion result and the background mapping export
//!
//! Once the pipeline finishes, its solids are frozen into an
//! `ExportSnapshot`. Clones share the same allocation, so the scene writer
//! and the mapping writer can run on different threads without locking.

use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use dxf_lite_geometry::Solid;

use crate::context::ConversionReport;
use crate::error::Result;
use crate::output::write_mapping;

/// Immutable, cheaply clonable result of one conversion
#[derive(Debug, Clone)]
pub struct ExportSnapshot {
    pub solids: Arc<[Solid]>,
    pub report: Arc<ConversionReport>,
    pub global_level: f64,
}

impl ExportSnapshot {
    pub fn new(solids: Vec<Solid>, report: ConversionReport, global_level: f64) -> Self {
        Self {
            solids: solids.into(),
            report: Arc::new(report),
            global_level,
        }
    }

    pub fn len(&self) -> usize {
        self.solids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    /// Total volume of all emitted solids
    pub fn total_volume(&self) -> f64 {
        self.solids.iter().map(|s| s.quantities.volume).sum()
    }
}

/// Write the mapping JSON on a background thread
///
/// The returned handle yields the number of entries written; the caller
/// joins it before exiting.
pub fn spawn_mapping_export(
    snapshot: ExportSnapshot,
    path: PathBuf,
) -> Result<JoinHandle<Result<usize>>> {
    let handle = std::thread::Builder::new()
        .name("mapping-export".to_string())
        .spawn(move || {
            let writer = BufWriter::new(std::fs::File::create(&path)?);
            let count = write_mapping(writer, &snapshot.solids)?;
            tracing::info!(path = %path.display(), entries = count, "Wrote mapping");
            Ok(count)
        })?;
    Ok(handle)
}
