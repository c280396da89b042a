// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-drawing conversion pipeline
//!
//! Decode → construct → expand blocks and fixtures → layered CSG → roof
//! trimming → snapshot. Runs single-threaded; the finished snapshot is the
//! only thing shared with other threads.

use std::path::Path;

use dxf_lite_core::{Drawing, Entity, EntityGeometry};
use dxf_lite_geometry::{ControlSurface, Solid};

use crate::blocks::BlockExpander;
use crate::builder::SolidBuilder;
use crate::config::PipelineConfig;
use crate::context::ConversionContext;
use crate::decoder::decode;
use crate::error::{Error, Result};
use crate::export::ExportSnapshot;
use crate::fixtures::{placeholder_base, FixtureComposer};
use crate::layered_csg::LayeredCsg;
use crate::roof::RoofTrimmer;

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read a drawing document and convert it
    ///
    /// The global level comes from `level_override`, then the document,
    /// then the level suffix of the file stem.
    pub fn convert_file(&self, path: &Path, level_override: Option<f64>) -> Result<ExportSnapshot> {
        let drawing = Drawing::from_path(path)?;
        let stem = path.file_stem().and_then(|s| s.to_str());
        let global_level = drawing.resolve_global_level(level_override, stem);
        self.convert(&drawing, global_level)
    }

    /// Convert one drawing into its final solid set
    pub fn convert(&self, drawing: &Drawing, global_level: f64) -> Result<ExportSnapshot> {
        let config = &self.config;
        let surface = ControlSurface::new(drawing.control_points(&config.control_layer));
        let builder = SolidBuilder::new(config, global_level, &surface);
        let mut ctx = ConversionContext::new();

        tracing::info!(
            entities = drawing.entities.len(),
            blocks = drawing.blocks.len(),
            control_points = surface.points().len(),
            global_level,
            "Converting drawing"
        );

        let solids = self.build_all(&mut ctx, &builder, drawing);
        if solids.is_empty() {
            return Err(Error::NoValidEntities {
                skipped: ctx.report.skipped.len(),
            });
        }

        let outcome = LayeredCsg::new(config).apply(&mut ctx, solids);
        if !outcome.unused_voids.is_empty() {
            tracing::debug!(
                unused = outcome.unused_voids.len(),
                used = outcome.used_voids.len(),
                "Voids that cut nothing were dropped"
            );
        }

        let solids = RoofTrimmer::new(config).apply(&mut ctx, outcome.solids);
        let report = ctx.into_report();

        tracing::info!(
            solids = solids.len(),
            skipped = report.skipped.len(),
            unmatched_fixtures = report.unmatched_fixtures.len(),
            failed_booleans = report.failed_booleans,
            "Conversion finished"
        );

        Ok(ExportSnapshot::new(solids, report, global_level))
    }

    /// Every top-level entity to solids (voids included, booleans pending)
    fn build_all(
        &self,
        ctx: &mut ConversionContext,
        builder: &SolidBuilder<'_>,
        drawing: &Drawing,
    ) -> Vec<Solid> {
        let expander = BlockExpander::new(builder, drawing);
        let composer = FixtureComposer::new(builder, &drawing.fixture_library);
        let mut solids = Vec::with_capacity(drawing.entities.len());

        for entity in &drawing.entities {
            if self.is_control_marker(entity) {
                continue;
            }

            match &entity.geometry {
                EntityGeometry::Insert(insert) if placeholder_base(&insert.block).is_some() => {
                    if let Some(fixture) = composer.compose(ctx, entity) {
                        solids.extend(fixture);
                    }
                }
                EntityGeometry::Insert(_) => {
                    let set = expander.expand(ctx, entity);
                    solids.extend(set.solids);
                }
                _ => {
                    let Some(decoded) = decode(entity, self.config.arc_segments) else {
                        continue;
                    };
                    match builder.build(ctx, &decoded) {
                        Ok(solid) => solids.push(solid),
                        Err(e) => ctx.skip(
                            &entity.layer,
                            entity.handle.as_deref(),
                            decoded.kind.as_str(),
                            e,
                        ),
                    }
                }
            }
        }

        solids
    }

    /// Circles on the control layer only carry surface samples
    fn is_control_marker(&self, entity: &Entity) -> bool {
        entity.layer.eq_ignore_ascii_case(&self.config.control_layer)
            && matches!(entity.geometry, EntityGeometry::Circle { .. })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
