// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-conversion accumulators
//!
//! Everything that used to be shared mutable state (id allocation, name
//! collision counters, the list of skipped entities) lives in one
//! `ConversionContext` created per drawing and passed by `&mut`.

use dxf_lite_geometry::SolidId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// An entity that produced no solid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedEntity {
    pub layer: String,
    pub handle: Option<String>,
    pub kind: String,
    pub reason: String,
}

/// A placeholder instance with no library counterpart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedFixture {
    pub block: String,
    pub expected: String,
    pub category: String,
    pub layer: String,
}

/// Non-fatal events collected during one conversion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionReport {
    pub skipped: Vec<SkippedEntity>,
    pub unmatched_fixtures: Vec<UnmatchedFixture>,
    /// Boolean operations that failed and kept the original solid
    pub failed_booleans: usize,
    /// Block voids that cut nothing inside their block
    pub dropped_voids: usize,
}

#[derive(Debug, Default)]
pub struct ConversionContext {
    next_id: u64,
    name_counters: FxHashMap<(String, Option<String>), usize>,
    pub report: ConversionReport,
}

impl ConversionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next solid id (`S1`, `S2`, ...)
    pub fn next_id(&mut self) -> SolidId {
        self.next_id += 1;
        SolidId(self.next_id)
    }

    /// Unique display name: `layer_Name_k`, or `layer_k` without a name
    pub fn unique_name(&mut self, layer: &str, name: Option<&str>) -> String {
        let counter = self
            .name_counters
            .entry((layer.to_string(), name.map(str::to_string)))
            .or_insert(0);
        *counter += 1;
        match name {
            Some(name) => format!("{}_{}_{}", layer, name, counter),
            None => format!("{}_{}", layer, counter),
        }
    }

    pub fn skip(&mut self, layer: &str, handle: Option<&str>, kind: &str, reason: impl ToString) {
        let reason = reason.to_string();
        tracing::warn!(layer, handle, kind, reason = %reason, "Skipping entity");
        self.report.skipped.push(SkippedEntity {
            layer: layer.to_string(),
            handle: handle.map(str::to_string),
            kind: kind.to_string(),
            reason,
        });
    }

    pub fn boolean_failed(&mut self) {
        self.report.failed_booleans += 1;
    }

    pub fn into_report(self) -> ConversionReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut ctx = ConversionContext::new();
        assert_eq!(ctx.next_id().to_string(), "S1");
        assert_eq!(ctx.next_id().to_string(), "S2");
    }

    #[test]
    fn test_unique_names() {
        let mut ctx = ConversionContext::new();
        assert_eq!(ctx.unique_name("IfcWall", None), "IfcWall_1");
        assert_eq!(ctx.unique_name("IfcWall", None), "IfcWall_2");
        assert_eq!(ctx.unique_name("IfcSpace", Some("Bedroom")), "IfcSpace_Bedroom_1");
        assert_eq!(ctx.unique_name("IfcSpace", Some("Bedroom")), "IfcSpace_Bedroom_2");
        assert_eq!(ctx.unique_name("IfcSpace", Some("Kitchen")), "IfcSpace_Kitchen_1");
    }

    #[test]
    fn test_contexts_do_not_share_state() {
        let mut first = ConversionContext::new();
        first.unique_name("IfcWall", None);
        first.skip("IfcWall", Some("1A"), "polyline", "degenerate");

        let mut second = ConversionContext::new();
        assert_eq!(second.unique_name("IfcWall", None), "IfcWall_1");
        assert!(second.report.skipped.is_empty());
        assert_eq!(first.into_report().skipped.len(), 1);
    }
}
