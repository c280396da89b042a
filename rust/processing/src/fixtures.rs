// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Door and window fixtures (TOV/FOV pairing)
//!
//! A placeholder instance of block `<base>_TOV` is replaced by the library
//! block `<base>_FOV`. Every FOV layer becomes a material group; void
//! layers only cut fixture solids with a compatible material, never the
//! whole fixture.

use crate::blocks::place;
use crate::builder::{Frame, SolidBuilder};
use crate::context::{ConversionContext, UnmatchedFixture};
use crate::decoder::{decode, DecodedEntity};
use crate::layered_csg::Cutter;
use dxf_lite_core::{BlockInsert, Entity, FixtureCategory, FixtureLibrary, Metadata};
use dxf_lite_geometry::{fixture_matrix, Solid};

pub const PLACEHOLDER_SUFFIX: &str = "_TOV";
pub const DETAIL_SUFFIX: &str = "_FOV";

/// Base name of a placeholder block, if it is one
pub fn placeholder_base(block: &str) -> Option<&str> {
    block.strip_suffix(PLACEHOLDER_SUFFIX)
}

/// Default role of a fixture layer: `true` for solid, `false` for void
///
/// Door leaves and glazing are openings; frames and walls stay solid.
/// Unknown door layers are voids, unknown window layers solids.
pub fn default_layer_role(category: FixtureCategory, layer: &str) -> bool {
    let specific = match category {
        FixtureCategory::Doors => match layer {
            "wood" | "glass" | "IfcDoor" => Some(false),
            "door_frame" | "frame" | "wall" => Some(true),
            _ => None,
        },
        FixtureCategory::Windows => match layer {
            "glass" => Some(false),
            "wood" | "IfcWindow" | "window_frame" | "frame" | "wall" => Some(true),
            _ => None,
        },
    };
    if let Some(role) = specific {
        return role;
    }
    match layer {
        "0" | "IfcDoor" | "IfcWindow" | "wall" | "walls" => true,
        "glass" | "window" => false,
        _ => category == FixtureCategory::Windows,
    }
}

/// Material a void layer stands for: `frame_void` and `void_frame` -> `frame`
fn void_material(layer: &str) -> &str {
    let n = layer.len();
    if let Some(stem) = layer
        .get(n.saturating_sub(5)..)
        .filter(|tail| n > 5 && tail.eq_ignore_ascii_case("_void"))
        .and_then(|_| layer.get(..n - 5))
    {
        return stem;
    }
    if let Some(rest) = layer
        .get(..5)
        .filter(|head| n > 5 && head.eq_ignore_ascii_case("void_"))
        .and_then(|_| layer.get(5..))
    {
        return rest;
    }
    layer
}

/// One built fixture part with its library layer
struct FixturePart {
    material: String,
    solid: Solid,
}

pub struct FixtureComposer<'b, 'a> {
    builder: &'b SolidBuilder<'a>,
    library: &'b FixtureLibrary,
    cutter: Cutter,
}

impl<'b, 'a> FixtureComposer<'b, 'a> {
    pub fn new(builder: &'b SolidBuilder<'a>, library: &'b FixtureLibrary) -> Self {
        Self {
            builder,
            library,
            cutter: Cutter::new(builder.config()),
        }
    }

    /// Whether fixture void layer `void_layer` may cut material `material`
    pub fn compatible(&self, void_layer: &str, material: &str) -> bool {
        void_material(void_layer).eq_ignore_ascii_case(material)
            || self
                .builder
                .config()
                .compatible_layers(void_layer)
                .iter()
                .any(|l| l.eq_ignore_ascii_case(material))
    }

    /// Replace a placeholder instance with its fixture solids
    ///
    /// Returns `None` when there is no library counterpart; the miss is
    /// recorded in the report and the placeholder produces nothing.
    pub fn compose(&self, ctx: &mut ConversionContext, placeholder: &Entity) -> Option<Vec<Solid>> {
        let insert = placeholder.as_insert()?;
        let base = placeholder_base(&insert.block)?;
        let category = FixtureCategory::from_base_name(base);
        let expected = format!("{}{}", base, DETAIL_SUFFIX);

        let Some(entities) = self.library.get(category, &expected) else {
            tracing::warn!(
                block = %insert.block,
                expected = %expected,
                category = category.as_str(),
                "No fixture for placeholder, leaving it unconverted"
            );
            ctx.report.unmatched_fixtures.push(UnmatchedFixture {
                block: insert.block.clone(),
                expected,
                category: category.as_str().to_string(),
                layer: placeholder.layer.clone(),
            });
            return None;
        };

        let instance = placeholder.metadata();
        let parts = self.build_parts(ctx, placeholder, insert, instance, category, entities);
        let solids = self.subtract_voids(ctx, parts);

        let matrix = fixture_matrix(
            insert,
            self.builder.global_level() + instance.elevation_relative,
        );

        tracing::debug!(
            block = %insert.block,
            fixture = %expected,
            solids = solids.len(),
            "Composed fixture"
        );

        Some(solids.into_iter().map(|s| place(s, &matrix)).collect())
    }

    fn build_parts(
        &self,
        ctx: &mut ConversionContext,
        placeholder: &Entity,
        insert: &BlockInsert,
        instance: &Metadata,
        category: FixtureCategory,
        entities: &[Entity],
    ) -> Vec<FixturePart> {
        let config = self.builder.config();
        let offset = insert.position[2] + instance.elevation_relative;
        let mut parts = Vec::with_capacity(entities.len());

        for entity in entities {
            let Some(decoded) = decode(entity, config.arc_segments) else {
                tracing::debug!(layer = %entity.layer, "Ignoring nested instance in fixture");
                continue;
            };

            let metadata = &decoded.metadata;
            let solid = if metadata.solid_declared {
                metadata.solid
            } else {
                default_layer_role(category, &entity.layer)
            };
            let height = if metadata.height_declared {
                metadata.height
            } else {
                config.fixture_thickness
            };
            let group = format!("{}/{}", placeholder.layer, entity.layer);
            let decoded = with_role(decoded, solid).on_layer(&group);

            match self
                .builder
                .build_in(ctx, &decoded, Frame::Block { offset }, height)
            {
                Ok(built) => parts.push(FixturePart {
                    material: entity.layer.clone(),
                    solid: built,
                }),
                Err(e) => ctx.skip(&group, entity.handle.as_deref(), entity.kind(), e),
            }
        }

        parts
    }

    /// Subtract every void part from compatible solid parts; voids are
    /// consumed here and never leave the fixture
    fn subtract_voids(&self, ctx: &mut ConversionContext, parts: Vec<FixturePart>) -> Vec<Solid> {
        let (voids, solids): (Vec<FixturePart>, Vec<FixturePart>) =
            parts.into_iter().partition(|p| p.solid.is_void());

        solids
            .into_iter()
            .map(|part| {
                voids
                    .iter()
                    .filter(|v| self.compatible(&v.material, &part.material))
                    .fold(part.solid, |solid, void| {
                        self.cutter.cut(ctx, solid, &void.solid).0
                    })
            })
            .collect()
    }
}

/// Decoded entity with its role resolved for the fixture
fn with_role(decoded: DecodedEntity, solid: bool) -> DecodedEntity {
    DecodedEntity {
        metadata: Metadata {
            solid,
            ..decoded.metadata
        },
        ..decoded
    }
}
