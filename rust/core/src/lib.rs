// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # DXF-Lite Core
//!
//! Drawing model and metadata decoding for annotated 2D CAD drawings.
//!
//! ## Overview
//!
//! - **Drawing documents**: entities, block definitions, control points and
//!   the door/window fixture library, read from the reader's JSON output
//! - **Metadata microformat**: `key:value` items parsed once into a typed
//!   [`Metadata`] record
//! - **Opening formulas**: a restricted arithmetic evaluator built with
//!   [nom](https://docs.rs/nom) for `Opening_area` deductions
//! - **Layer conventions**: column/roof/wall/window classification
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dxf_lite_core::Drawing;
//!
//! let drawing = Drawing::from_path("ground_+0.00.json")?;
//! for entity in &drawing.entities {
//!     let metadata = entity.metadata();
//!     println!("{} on {}: height {}", entity.kind(), entity.layer, metadata.height);
//! }
//! ```

pub mod drawing;
pub mod entity;
pub mod error;
pub mod formula;
pub mod layers;
pub mod metadata;

pub use drawing::{level_from_name, ControlPoint, Drawing, FixtureCategory, FixtureLibrary};
pub use entity::{BlockInsert, Entity, EntityGeometry, PolylineVertex};
pub use error::{Error, Result};
pub use metadata::{Metadata, MetadataKey};
