// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # DXF-Lite Processing
//!
//! Turns one decoded drawing into a set of closed, void-free solids.
//!
//! ## Stages
//!
//! 1. **Decode**: outline points plus typed metadata per entity
//! 2. **Construct**: orthogonal, inclined or spatial extrusion
//! 3. **Blocks**: instances built in local space, booleans resolved inside
//!    the block, then placed
//! 4. **Fixtures**: `_TOV` placeholders replaced by `_FOV` library geometry
//! 5. **Layered CSG**: global, window and same-layer voids in that order
//! 6. **Roof trimming**: walls and coverings clipped at the roof bottom
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dxf_lite_processing::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(PipelineConfig::from_env().with_arc_segments(24));
//! let snapshot = pipeline.convert_file("ground_+0.00.json".as_ref(), None)?;
//! for solid in snapshot.solids.iter() {
//!     println!("{} {} {:.3} m³", solid.id, solid.layer, solid.quantities.volume);
//! }
//! ```

pub mod blocks;
pub mod builder;
pub mod config;
pub mod context;
pub mod decoder;
pub mod error;
pub mod export;
pub mod fixtures;
pub mod layered_csg;
pub mod output;
pub mod pipeline;
pub mod roof;

pub use blocks::{BlockExpander, BlockWorkingSet};
pub use builder::{Frame, SolidBuilder};
pub use config::PipelineConfig;
pub use context::{ConversionContext, ConversionReport, SkippedEntity, UnmatchedFixture};
pub use decoder::{decode, DecodedEntity, EntityKind};
pub use error::{Error, Result};
pub use export::{spawn_mapping_export, ExportSnapshot};
pub use fixtures::FixtureComposer;
pub use layered_csg::{CsgOutcome, Cutter, LayeredCsg, VoidScope};
pub use output::{
    mapping_path, write_mapping, write_obj, write_scene, write_scene_json, MappingEntry,
    SceneDocument, SceneFormat, SolidRecord,
};
pub use pipeline::Pipeline;
pub use roof::RoofTrimmer;
