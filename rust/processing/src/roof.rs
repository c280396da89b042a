// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Roof trimming: walls and coverings never rise through a roof or slab
//! they overlap in plan.

use crate::config::PipelineConfig;
use crate::context::ConversionContext;
use dxf_lite_core::layers::{is_roof_layer, is_structural_layer};
use dxf_lite_geometry::{Aabb, ClippingProcessor, Solid, SolidId};

/// Footprint and bottom of one roof candidate
#[derive(Debug, Clone, Copy)]
struct RoofBounds {
    id: SolidId,
    bounds: Aabb,
}

pub struct RoofTrimmer {
    clipper: ClippingProcessor,
    trim_epsilon: f64,
    bbox_padding: f64,
}

impl RoofTrimmer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            clipper: ClippingProcessor::with_epsilon(config.trim_epsilon),
            trim_epsilon: config.trim_epsilon,
            bbox_padding: config.bbox_padding,
        }
    }

    /// Trim every wall/covering solid against every overlapping roof
    ///
    /// Roofs are visited in input order; each trim works on the result of
    /// the previous one. Columns and beams are never targets.
    pub fn apply(&self, ctx: &mut ConversionContext, solids: Vec<Solid>) -> Vec<Solid> {
        let roofs: Vec<RoofBounds> = solids
            .iter()
            .filter(|s| is_roof_layer(&s.layer))
            .filter_map(|s| {
                s.bounds().map(|bounds| RoofBounds { id: s.id, bounds })
            })
            .collect();

        if roofs.is_empty() {
            return solids;
        }

        solids
            .into_iter()
            .map(|solid| {
                if !is_structural_layer(&solid.layer) || is_roof_layer(&solid.layer) {
                    return solid;
                }
                roofs
                    .iter()
                    .fold(solid, |solid, roof| self.trim(ctx, solid, roof))
            })
            .collect()
    }

    fn trim(&self, ctx: &mut ConversionContext, solid: Solid, roof: &RoofBounds) -> Solid {
        let Some(bounds) = solid.bounds() else {
            return solid;
        };
        if !bounds.intersects_plan(&roof.bounds, self.bbox_padding) {
            return solid;
        }
        let roof_bottom = roof.bounds.min.z;
        if bounds.max.z <= roof_bottom + self.trim_epsilon {
            return solid;
        }
        // Entirely above the roof bottom: standing on this slab, not under it
        if bounds.min.z >= roof_bottom - self.trim_epsilon {
            return solid;
        }

        match self.clipper.clip_above(&solid.mesh, roof_bottom) {
            Ok(mesh) if !mesh.is_empty() => {
                tracing::debug!(
                    solid_id = %solid.id,
                    roof_id = %roof.id,
                    roof_bottom,
                    "Trimmed solid against roof"
                );
                solid.with_mesh(mesh)
            }
            Ok(_) => {
                tracing::warn!(
                    solid_id = %solid.id,
                    roof_id = %roof.id,
                    "Roof trim removed the whole solid, keeping original"
                );
                ctx.boolean_failed();
                solid
            }
            Err(e) => {
                tracing::warn!(
                    solid_id = %solid.id,
                    roof_id = %roof.id,
                    error = %e,
                    "Roof trim failed, keeping original"
                );
                ctx.boolean_failed();
                solid
            }
        }
    }
}
