// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded entity -> `Solid`
//!
//! Resolves elevation (columns stay on the global level), picks the
//! extrusion strategy, applies element rotations and computes the
//! construction-time quantities.

use crate::config::PipelineConfig;
use crate::context::ConversionContext;
use crate::decoder::DecodedEntity;
use dxf_lite_core::layers::is_column_layer;
use dxf_lite_geometry::profile::segment_lengths;
use dxf_lite_geometry::{
    apply_transform, construct, element_rotation, ControlSurface, Elevation, ExtrusionStrategy,
    Point3, Profile2D, Quantities, Result, Role, Solid,
};

/// Frame a solid is built in
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    /// World coordinates, global level applied
    World,
    /// Block-local coordinates; the instance transform adds the global
    /// level plus `offset` later
    Block { offset: f64 },
}

pub struct SolidBuilder<'a> {
    config: &'a PipelineConfig,
    global_level: f64,
    surface: &'a ControlSurface,
}

impl<'a> SolidBuilder<'a> {
    pub fn new(config: &'a PipelineConfig, global_level: f64, surface: &'a ControlSurface) -> Self {
        Self {
            config,
            global_level,
            surface,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        self.config
    }

    pub fn global_level(&self) -> f64 {
        self.global_level
    }

    /// Build a top-level entity in world coordinates
    pub fn build(&self, ctx: &mut ConversionContext, entity: &DecodedEntity) -> Result<Solid> {
        self.build_in(ctx, entity, Frame::World, entity.metadata.height)
    }

    /// Build a solid in the given frame with an explicit height
    ///
    /// Spatial extrusion only applies to world-frame entities; block and
    /// fixture content stays orthogonal or inclined.
    pub fn build_in(
        &self,
        ctx: &mut ConversionContext,
        entity: &DecodedEntity,
        frame: Frame,
        height: f64,
    ) -> Result<Solid> {
        let metadata = &entity.metadata;
        let relative = metadata.elevation_relative;
        let anchored = is_column_layer(&entity.layer);

        let (elevation, base_z, surface) = match frame {
            Frame::World => {
                let elevation = if anchored {
                    Elevation::anchored(self.global_level, relative)
                } else {
                    Elevation::new(self.global_level, relative)
                };
                let surface = self
                    .config
                    .is_spatial_layer(&entity.layer)
                    .then_some(self.surface);
                (elevation, elevation.base(), surface)
            }
            Frame::Block { offset } => {
                let elevation = if anchored {
                    Elevation::anchored(self.global_level, offset + relative)
                } else {
                    Elevation::new(self.global_level, offset + relative)
                };
                let local_base = if anchored { -offset } else { relative };
                (elevation, local_base, None)
            }
        };

        let profile = Profile2D::from_points(&entity.points, self.config.degenerate_area_epsilon)?;
        let strategy = ExtrusionStrategy::select(metadata, surface);
        let mut mesh = construct(
            &profile,
            strategy,
            base_z,
            height,
            self.config.degenerate_area_epsilon,
        )?;

        let centroid = profile.centroid();
        if let Some(rotation) =
            element_rotation(metadata, &Point3::new(centroid.x, centroid.y, base_z))
        {
            apply_transform(&mut mesh, &rotation);
        }

        let perimeter = profile.perimeter();
        let opening_deduction = metadata.opening_deduction();
        let quantities = Quantities {
            perimeter,
            segment_lengths: segment_lengths(&profile.outer),
            plan_area: profile.area(),
            height,
            lateral_area: perimeter * height - opening_deduction,
            opening_deduction,
            volume: mesh.volume(),
        };

        let id = ctx.next_id();
        let name = ctx.unique_name(&entity.layer, metadata.name.as_deref());

        tracing::debug!(
            solid_id = %id,
            layer = %entity.layer,
            strategy = strategy.name(),
            base_z,
            volume = quantities.volume,
            "Built solid"
        );

        Ok(Solid {
            id,
            name,
            layer: entity.layer.clone(),
            elevation,
            role: Role::from_flag(metadata.solid),
            quantities,
            is_cut_by: Vec::new(),
            source_handle: entity.handle.clone(),
            outline: profile.outer,
            mesh,
        })
    }
}
