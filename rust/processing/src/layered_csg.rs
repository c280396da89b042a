// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Layered void subtraction
//!
//! Voids are partitioned by scope and applied in a fixed order, each
//! stage working on the output of the previous one:
//!
//! 1. global voids (the configured void layer) cut every solid
//! 2. window-layer voids cut wall and covering solids
//! 3. remaining voids cut solids on exactly their own layer
//!
//! Each candidate pair goes through an AABB pre-test, then a confirmed
//! intersection volume above `intersection_epsilon`, and only then the
//! difference. Boolean failures keep the uncut solid.

use crate::config::PipelineConfig;
use crate::context::ConversionContext;
use dxf_lite_core::layers::{is_structural_layer, is_window_layer};
use dxf_lite_geometry::{ClippingProcessor, Solid, SolidId};
use rustc_hash::FxHashSet;

/// Which solids a void may cut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoidScope {
    Global,
    Window,
    SameLayer,
}

/// Output of a layered pass
#[derive(Debug, Default)]
pub struct CsgOutcome {
    /// Solids only; voids never leave the engine
    pub solids: Vec<Solid>,
    /// Voids that cut at least one solid
    pub used_voids: FxHashSet<SolidId>,
    /// Voids that cut nothing
    pub unused_voids: Vec<SolidId>,
}

/// Subtracts one void from one solid, or explains why not
pub struct Cutter {
    clipper: ClippingProcessor,
    intersection_epsilon: f64,
    bbox_padding: f64,
}

impl Cutter {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            clipper: ClippingProcessor::new(),
            intersection_epsilon: config.intersection_epsilon,
            bbox_padding: config.bbox_padding,
        }
    }

    /// Shared volume between two solids, `None` when the boxes are disjoint
    pub fn confirmed_overlap(&self, solid: &Solid, void: &Solid) -> Option<f64> {
        let (a, b) = (solid.bounds()?, void.bounds()?);
        if !a.intersects(&b, self.bbox_padding) {
            return None;
        }
        match self.clipper.intersection_volume(&solid.mesh, &void.mesh) {
            Ok(volume) => Some(volume),
            Err(e) => {
                tracing::warn!(
                    solid_id = %solid.id,
                    void_id = %void.id,
                    error = %e,
                    "Intersection test failed"
                );
                None
            }
        }
    }

    /// Cut `void` out of `solid`, returning the new solid and whether a
    /// cut was recorded
    pub fn cut(&self, ctx: &mut ConversionContext, solid: Solid, void: &Solid) -> (Solid, bool) {
        let volume = match self.confirmed_overlap(&solid, void) {
            Some(v) if v > self.intersection_epsilon => v,
            _ => return (solid, false),
        };

        match self.clipper.subtract_mesh(&solid.mesh, &void.mesh) {
            Ok(mesh) if !mesh.is_empty() => {
                tracing::debug!(
                    solid_id = %solid.id,
                    void_id = %void.id,
                    layer = %solid.layer,
                    volume,
                    "Void cut solid"
                );
                (solid.cut_by(void.id, mesh), true)
            }
            Ok(_) => {
                tracing::warn!(
                    solid_id = %solid.id,
                    void_id = %void.id,
                    "Difference left an empty mesh, keeping original solid"
                );
                ctx.boolean_failed();
                (solid, false)
            }
            Err(e) => {
                tracing::warn!(
                    solid_id = %solid.id,
                    void_id = %void.id,
                    error = %e,
                    "Boolean difference failed, keeping original solid"
                );
                ctx.boolean_failed();
                (solid, false)
            }
        }
    }
}

pub struct LayeredCsg<'a> {
    config: &'a PipelineConfig,
    cutter: Cutter,
}

impl<'a> LayeredCsg<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            cutter: Cutter::new(config),
        }
    }

    pub fn cutter(&self) -> &Cutter {
        &self.cutter
    }

    /// Scope of a void solid
    pub fn scope(&self, void: &Solid) -> VoidScope {
        if self.config.is_void_layer(&void.layer) {
            VoidScope::Global
        } else if is_window_layer(&void.layer) {
            VoidScope::Window
        } else {
            VoidScope::SameLayer
        }
    }

    /// Whether a void of `scope` on `void_layer` may cut a solid on `layer`
    pub fn may_cut(scope: VoidScope, void_layer: &str, layer: &str) -> bool {
        match scope {
            VoidScope::Global => true,
            VoidScope::Window => is_structural_layer(layer),
            VoidScope::SameLayer => void_layer == layer,
        }
    }

    /// Run all three stages over one set of solids
    ///
    /// Every solid on the global void layer acts as a void whatever its
    /// own flag says.
    pub fn apply(&self, ctx: &mut ConversionContext, input: Vec<Solid>) -> CsgOutcome {
        let (mut voids, mut solids): (Vec<Solid>, Vec<Solid>) = input
            .into_iter()
            .partition(|s| s.is_void() || self.config.is_void_layer(&s.layer));

        // Stable stage order: global, window, same layer
        voids.sort_by_key(|v| match self.scope(v) {
            VoidScope::Global => 0u8,
            VoidScope::Window => 1,
            VoidScope::SameLayer => 2,
        });

        tracing::debug!(solids = solids.len(), voids = voids.len(), "Layered CSG");

        let mut used_voids = FxHashSet::default();
        for void in &voids {
            let scope = self.scope(void);
            solids = solids
                .into_iter()
                .map(|solid| {
                    if !Self::may_cut(scope, &void.layer, &solid.layer) {
                        return solid;
                    }
                    let (solid, cut) = self.cutter.cut(ctx, solid, void);
                    if cut {
                        used_voids.insert(void.id);
                    }
                    solid
                })
                .collect();
        }

        let unused_voids = voids
            .iter()
            .filter(|v| !used_voids.contains(&v.id))
            .map(|v| v.id)
            .collect();

        CsgOutcome {
            solids,
            used_voids,
            unused_voids,
        }
    }
}
