// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded drawing document
//!
//! The drawing reader hands over one JSON document per drawing: top-level
//! entities, block definitions, optional control points, the door/window
//! fixture library and the global elevation level.

use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityGeometry};
use crate::error::Result;

/// Sampled `(x, y, z)` used to interpolate a non-planar base surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ControlPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Fixture category, inferred from the fixture's base name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureCategory {
    Doors,
    Windows,
}

impl FixtureCategory {
    /// Names starting with `door` (any case) are doors, everything else windows
    pub fn from_base_name(base_name: &str) -> Self {
        if base_name.to_ascii_lowercase().starts_with("door") {
            Self::Doors
        } else {
            Self::Windows
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doors => "doors",
            Self::Windows => "windows",
        }
    }
}

/// Detailed fixture geometry keyed by `<base>_FOV` block name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureLibrary {
    #[serde(default)]
    pub doors: FxHashMap<String, Vec<Entity>>,
    #[serde(default)]
    pub windows: FxHashMap<String, Vec<Entity>>,
}

impl FixtureLibrary {
    /// Look up a fixture block in a category
    pub fn get(&self, category: FixtureCategory, name: &str) -> Option<&[Entity]> {
        let blocks = match category {
            FixtureCategory::Doors => &self.doors,
            FixtureCategory::Windows => &self.windows,
        };
        blocks.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.doors.is_empty() && self.windows.is_empty()
    }
}

/// One decoded drawing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    /// Drawing name; may carry the level suffix (`first_floor_+3.20`)
    #[serde(default)]
    pub name: Option<String>,
    /// Explicit global elevation level
    #[serde(default)]
    pub global_level: Option<f64>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Block definitions by name
    #[serde(default)]
    pub blocks: FxHashMap<String, Vec<Entity>>,
    /// Explicit control points `[x, y, z]`
    #[serde(default)]
    pub control_points: Vec<[f64; 3]>,
    #[serde(default)]
    pub fixture_library: FixtureLibrary,
}

impl Drawing {
    /// Parse a drawing document from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a drawing document
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Block definition by name
    pub fn block(&self, name: &str) -> Option<&[Entity]> {
        self.blocks.get(name).map(Vec::as_slice)
    }

    /// Control points: the explicit list plus circles on `control_layer`,
    /// whose `z` metadata gives the sample height
    pub fn control_points(&self, control_layer: &str) -> Vec<ControlPoint> {
        let mut points: Vec<ControlPoint> = self
            .control_points
            .iter()
            .map(|p| ControlPoint::new(p[0], p[1], p[2]))
            .collect();

        for entity in &self.entities {
            if !entity.layer.eq_ignore_ascii_case(control_layer) {
                continue;
            }
            if let EntityGeometry::Circle { center, .. } = entity.geometry {
                let z = entity.metadata().elevation_relative;
                points.push(ControlPoint::new(center[0], center[1], z));
            }
        }

        points
    }

    /// Resolve the global elevation level
    ///
    /// Precedence: explicit override, the document's `global_level`, a level
    /// suffix on the document name, a level suffix on `source_stem`, then 0.
    pub fn resolve_global_level(&self, override_level: Option<f64>, source_stem: Option<&str>) -> f64 {
        override_level
            .or(self.global_level)
            .or_else(|| self.name.as_deref().and_then(level_from_name))
            .or_else(|| source_stem.and_then(level_from_name))
            .unwrap_or(0.0)
    }
}

/// Extract a level from a name like `first_floor_+3.20` or `basement_-2.85`
///
/// The last `_`-separated token must carry an explicit sign.
pub fn level_from_name(name: &str) -> Option<f64> {
    let token = name.rsplit('_').next()?.trim();
    if !(token.starts_with('+') || token.starts_with('-')) {
        return None;
    }
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "ground",
        "entities": [
            {"layer": "IfcWall", "xdata": ["height:3"], "geometry": {"type": "polyline",
             "vertices": [{"x":0,"y":0},{"x":4,"y":0},{"x":4,"y":0.3},{"x":0,"y":0.3}]}},
            {"layer": "control", "xdata": ["z:2.5"], "geometry": {"type": "circle", "center": [10, 0], "radius": 0.1}}
        ],
        "blocks": {"B1": [{"layer": "IfcColumn", "geometry": {"type": "circle", "center": [0, 0], "radius": 0.2}}]},
        "control_points": [[0, 0, 0]],
        "fixture_library": {"doors": {"door90_FOV": []}}
    }"#;

    #[test]
    fn test_parse_document() {
        let drawing = Drawing::from_json_str(SAMPLE).unwrap();
        assert_eq!(drawing.entities.len(), 2);
        assert!(drawing.block("B1").is_some());
        assert!(drawing.block("B2").is_none());
        assert!(drawing
            .fixture_library
            .get(FixtureCategory::Doors, "door90_FOV")
            .is_some());
        assert!(drawing
            .fixture_library
            .get(FixtureCategory::Windows, "door90_FOV")
            .is_none());
    }

    #[test]
    fn test_control_points_merge_layer_circles() {
        let drawing = Drawing::from_json_str(SAMPLE).unwrap();
        let points = drawing.control_points("Control");
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], ControlPoint::new(10.0, 0.0, 2.5));
    }

    #[test]
    fn test_level_from_name() {
        assert_eq!(level_from_name("first_floor_+3.20"), Some(3.2));
        assert_eq!(level_from_name("basement_-2.85"), Some(-2.85));
        assert_eq!(level_from_name("ground_floor"), None);
        assert_eq!(level_from_name("plan_3.20"), None);
    }

    #[test]
    fn test_global_level_precedence() {
        let mut drawing = Drawing::default();
        assert_eq!(drawing.resolve_global_level(None, Some("etaj_+6.40")), 6.4);
        drawing.name = Some("level_+3.00".to_string());
        assert_eq!(drawing.resolve_global_level(None, Some("etaj_+6.40")), 3.0);
        drawing.global_level = Some(1.5);
        assert_eq!(drawing.resolve_global_level(None, None), 1.5);
        assert_eq!(drawing.resolve_global_level(Some(9.0), None), 9.0);
        assert_eq!(Drawing::default().resolve_global_level(None, None), 0.0);
    }

    #[test]
    fn test_fixture_category() {
        assert_eq!(FixtureCategory::from_base_name("Door90"), FixtureCategory::Doors);
        assert_eq!(FixtureCategory::from_base_name("win120"), FixtureCategory::Windows);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(Drawing::from_json_str("{not json").is_err());
    }
}
