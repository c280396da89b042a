// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solids: a mesh plus its metadata envelope
//!
//! A `Solid` is never edited after construction. Booleans and trims go
//! through [`Solid::with_mesh`] / [`Solid::cut_by`], which consume the old
//! value and return a new one with volume and plan area re-derived.

use crate::footprint::plan_area;
use crate::mesh::{Aabb, Mesh};
use nalgebra::Point2;
use std::fmt;

/// Stable per-conversion solid identifier, rendered as `S{n}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SolidId(pub u64);

impl fmt::Display for SolidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Geometric role of a solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Emitted to output
    Solid,
    /// Only exists to be subtracted from solids
    Void,
}

impl Role {
    pub fn from_flag(solid: bool) -> Self {
        if solid {
            Role::Solid
        } else {
            Role::Void
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Solid => "solid",
            Role::Void => "void",
        }
    }
}

/// Elevation provenance
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Elevation {
    /// Drawing-wide level
    pub global_level: f64,
    /// Offset from the entity's `z` metadata (plus any instance offset)
    pub relative: f64,
    /// Base pinned to the global level regardless of `relative` (columns)
    pub anchored: bool,
}

impl Elevation {
    pub fn new(global_level: f64, relative: f64) -> Self {
        Self {
            global_level,
            relative,
            anchored: false,
        }
    }

    pub fn anchored(global_level: f64, relative: f64) -> Self {
        Self {
            global_level,
            relative,
            anchored: true,
        }
    }

    /// `global_level + relative`
    #[inline]
    pub fn resolved(&self) -> f64 {
        self.global_level + self.relative
    }

    /// Z of the solid's base
    #[inline]
    pub fn base(&self) -> f64 {
        if self.anchored {
            self.global_level
        } else {
            self.resolved()
        }
    }
}

/// Derived scalar quantities
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quantities {
    pub perimeter: f64,
    pub segment_lengths: Vec<f64>,
    pub plan_area: f64,
    /// Extrusion height, scaled along with block instances
    pub height: f64,
    /// `perimeter · height − opening_deduction`
    pub lateral_area: f64,
    pub opening_deduction: f64,
    pub volume: f64,
}

#[derive(Debug, Clone)]
pub struct Solid {
    pub id: SolidId,
    /// Display name, unique within one conversion
    pub name: String,
    pub layer: String,
    pub elevation: Elevation,
    pub role: Role,
    pub quantities: Quantities,
    /// Voids confirmed to have cut this solid, in cut order
    pub is_cut_by: Vec<SolidId>,
    pub source_handle: Option<String>,
    /// Plan outline the solid was built from
    pub outline: Vec<Point2<f64>>,
    pub mesh: Mesh,
}

impl Solid {
    #[inline]
    pub fn is_void(&self) -> bool {
        self.role == Role::Void
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.mesh.bounds()
    }

    pub fn top_z(&self) -> Option<f64> {
        self.bounds().map(|b| b.max.z)
    }

    pub fn bottom_z(&self) -> Option<f64> {
        self.bounds().map(|b| b.min.z)
    }

    /// Replace the mesh, re-deriving volume and plan area from it
    pub fn with_mesh(self, mesh: Mesh) -> Solid {
        let volume = mesh.volume();
        let plan_area = plan_area(&mesh);
        Solid {
            quantities: Quantities {
                volume,
                plan_area,
                ..self.quantities
            },
            mesh,
            ..self
        }
    }

    /// Result of subtracting `void` from this solid
    pub fn cut_by(self, void: SolidId, mesh: Mesh) -> Solid {
        let mut is_cut_by = self.is_cut_by.clone();
        if !is_cut_by.contains(&void) {
            is_cut_by.push(void);
        }
        Solid {
            is_cut_by,
            ..self.with_mesh(mesh)
        }
    }

    /// Same solid under a new identity (block instances, fixture groups)
    pub fn renamed(self, id: SolidId, name: String, layer: String) -> Solid {
        Solid {
            id,
            name,
            layer,
            ..self
        }
    }
}
