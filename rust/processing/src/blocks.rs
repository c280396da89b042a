// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Block instance expansion
//!
//! Each instance builds its sub-entities in block-local coordinates with
//! their own metadata, resolves booleans inside the block, then places the
//! result with the instance transform (scale, Z rotation, X/Y rotation
//! about the insertion point, translation). Nested instances recurse and
//! hand back their own working set.

use crate::builder::{Frame, SolidBuilder};
use crate::context::ConversionContext;
use crate::decoder::decode;
use crate::layered_csg::LayeredCsg;
use dxf_lite_core::{BlockInsert, Drawing, Entity, Metadata};
use dxf_lite_geometry::{
    apply_transform, block_instance_matrix, Matrix4, Point2, Point3, Solid, Vector3,
};

/// Maximum nesting of block instances
pub const MAX_BLOCK_DEPTH: usize = 16;

/// Layer name that inherits the instance's layer
const BY_BLOCK_LAYER: &str = "0";

/// Solids produced by one block instance, booleans already resolved
#[derive(Debug, Default)]
pub struct BlockWorkingSet {
    pub solids: Vec<Solid>,
    /// Void sub-entities that cut nothing and were dropped
    pub dropped_voids: usize,
}

impl BlockWorkingSet {
    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    fn transformed(self, matrix: &Matrix4<f64>) -> Self {
        Self {
            solids: self.solids.into_iter().map(|s| place(s, matrix)).collect(),
            dropped_voids: self.dropped_voids,
        }
    }
}

/// Apply a placement to a solid, including its plan outline
///
/// Scaled instances change edge lengths and the extrusion height, so
/// perimeter, segment lengths and lateral area are re-derived from the
/// transformed edges alongside the mesh quantities. Edges are measured in
/// 3D, which keeps them independent of the instance's X/Y rotation.
pub(crate) fn place(mut solid: Solid, matrix: &Matrix4<f64>) -> Solid {
    let mut mesh = std::mem::take(&mut solid.mesh);
    apply_transform(&mut mesh, matrix);

    let n = solid.outline.len();
    let quantities = &mut solid.quantities;
    if n >= 2 {
        quantities.segment_lengths = (0..n)
            .map(|i| {
                let edge = solid.outline[(i + 1) % n] - solid.outline[i];
                matrix
                    .transform_vector(&Vector3::new(edge.x, edge.y, 0.0))
                    .norm()
            })
            .collect();
        quantities.perimeter = quantities.segment_lengths.iter().sum();
    }
    quantities.height *= matrix.transform_vector(&Vector3::z()).norm();
    quantities.lateral_area =
        quantities.perimeter * quantities.height - quantities.opening_deduction;

    let outline = solid
        .outline
        .iter()
        .map(|p| {
            let q = matrix.transform_point(&Point3::new(p.x, p.y, 0.0));
            Point2::new(q.x, q.y)
        })
        .collect();

    Solid {
        outline,
        ..solid.with_mesh(mesh)
    }
}

pub struct BlockExpander<'b, 'a> {
    builder: &'b SolidBuilder<'a>,
    drawing: &'b Drawing,
}

impl<'b, 'a> BlockExpander<'b, 'a> {
    pub fn new(builder: &'b SolidBuilder<'a>, drawing: &'b Drawing) -> Self {
        Self { builder, drawing }
    }

    /// Expand a top-level instance into world-space solids
    pub fn expand(&self, ctx: &mut ConversionContext, instance: &Entity) -> BlockWorkingSet {
        let Some(insert) = instance.as_insert() else {
            return BlockWorkingSet::default();
        };
        let metadata = instance.metadata();
        let offset = insert.position[2] + metadata.elevation_relative;

        let local = self.expand_block(ctx, insert, &instance.layer, offset, 0);
        let matrix = instance_matrix(
            insert,
            metadata,
            self.builder.global_level() + metadata.elevation_relative,
        );

        tracing::debug!(
            block = %insert.block,
            solids = local.solids.len(),
            dropped_voids = local.dropped_voids,
            "Expanded block instance"
        );
        ctx.report.dropped_voids += local.dropped_voids;
        local.transformed(&matrix)
    }

    /// Build one block's content in its local frame
    ///
    /// `offset` is the accumulated Z shift the enclosing instances will add,
    /// used for elevation bookkeeping and column anchoring.
    fn expand_block(
        &self,
        ctx: &mut ConversionContext,
        insert: &BlockInsert,
        instance_layer: &str,
        offset: f64,
        depth: usize,
    ) -> BlockWorkingSet {
        let Some(entities) = self.drawing.block(&insert.block) else {
            ctx.skip(instance_layer, None, "insert", format!("unknown block '{}'", insert.block));
            return BlockWorkingSet::default();
        };

        let config = self.builder.config();
        let mut local: Vec<Solid> = Vec::with_capacity(entities.len());
        let mut dropped_voids = 0;

        for entity in entities {
            let layer = if entity.layer == BY_BLOCK_LAYER {
                instance_layer
            } else {
                entity.layer.as_str()
            };

            if let Some(nested) = entity.as_insert() {
                if depth + 1 >= MAX_BLOCK_DEPTH {
                    ctx.skip(
                        layer,
                        entity.handle.as_deref(),
                        "insert",
                        format!("block nesting deeper than {}", MAX_BLOCK_DEPTH),
                    );
                    continue;
                }
                let metadata = entity.metadata();
                let nested_offset = offset + nested.position[2] + metadata.elevation_relative;
                let child = self.expand_block(ctx, nested, layer, nested_offset, depth + 1);
                dropped_voids += child.dropped_voids;
                let matrix = instance_matrix(nested, metadata, metadata.elevation_relative);
                local.extend(child.transformed(&matrix).solids);
                continue;
            }

            let Some(decoded) = decode(entity, config.arc_segments) else {
                continue;
            };
            let decoded = decoded.on_layer(layer);
            let height = decoded.metadata.height;
            match self
                .builder
                .build_in(ctx, &decoded, Frame::Block { offset }, height)
            {
                Ok(solid) => local.push(solid),
                Err(e) => ctx.skip(layer, entity.handle.as_deref(), entity.kind(), e),
            }
        }

        let outcome = LayeredCsg::new(config).apply(ctx, local);
        dropped_voids += outcome.unused_voids.len();
        if !outcome.unused_voids.is_empty() {
            tracing::debug!(
                block = %insert.block,
                count = outcome.unused_voids.len(),
                "Dropping block voids that cut nothing"
            );
        }

        BlockWorkingSet {
            solids: outcome.solids,
            dropped_voids,
        }
    }
}

/// Instance placement with the instance's own X/Y rotation
fn instance_matrix(insert: &BlockInsert, metadata: &Metadata, z_offset: f64) -> Matrix4<f64> {
    block_instance_matrix(
        insert,
        metadata.effective_rotate_x(),
        metadata.rotate_y,
        z_offset,
    )
}
