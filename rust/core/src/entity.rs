// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded drawing entities

use serde::{Deserialize, Deserializer, Serialize};

use crate::metadata::Metadata;

/// A drawing primitive as delivered by the drawing reader
///
/// The `key:value` metadata is parsed once, when the entity is read or
/// built, and shared by every use (including each block instance).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    /// Source layer name
    pub layer: String,
    /// Source handle, if the reader exposes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    xdata: Vec<String>,
    pub geometry: EntityGeometry,
    #[serde(skip_serializing)]
    metadata: Metadata,
}

/// Wire form of [`Entity`]
#[derive(Deserialize)]
struct EntityRecord {
    #[serde(default = "default_layer")]
    layer: String,
    #[serde(default)]
    handle: Option<String>,
    #[serde(default)]
    xdata: Vec<String>,
    geometry: EntityGeometry,
}

impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let record = EntityRecord::deserialize(deserializer)?;
        Ok(Entity {
            metadata: Metadata::parse(&record.xdata),
            layer: record.layer,
            handle: record.handle,
            xdata: record.xdata,
            geometry: record.geometry,
        })
    }
}

fn default_layer() -> String {
    "0".to_string()
}

/// Entity geometry kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityGeometry {
    /// Polyline with bulge-encoded arc segments
    Polyline {
        #[serde(default = "default_closed")]
        closed: bool,
        vertices: Vec<PolylineVertex>,
    },
    /// Full circle
    Circle { center: [f64; 2], radius: f64 },
    /// Block instance
    Insert(BlockInsert),
}

fn default_closed() -> bool {
    true
}

/// Polyline vertex; `bulge` is the tangent of a quarter of the arc angle
/// to the next vertex (0 = straight segment)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolylineVertex {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub bulge: f64,
}

impl PolylineVertex {
    pub fn new(x: f64, y: f64, bulge: f64) -> Self {
        Self { x, y, bulge }
    }
}

/// Block instance placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockInsert {
    /// Referenced block name
    pub block: String,
    /// Insertion point
    #[serde(default)]
    pub position: [f64; 3],
    /// Per-axis scale
    #[serde(default = "unit_scale")]
    pub scale: [f64; 3],
    /// Self-rotation about Z in degrees
    #[serde(default)]
    pub rotation: f64,
}

fn unit_scale() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

impl BlockInsert {
    pub fn new(block: impl Into<String>, position: [f64; 3]) -> Self {
        Self {
            block: block.into(),
            position,
            scale: unit_scale(),
            rotation: 0.0,
        }
    }
}

impl Entity {
    /// Create an entity without metadata
    pub fn new(layer: impl Into<String>, geometry: EntityGeometry) -> Self {
        Self {
            layer: layer.into(),
            handle: None,
            xdata: Vec::new(),
            geometry,
            metadata: Metadata::default(),
        }
    }

    /// Builder-style metadata attachment
    pub fn with_xdata<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.xdata.extend(items.into_iter().map(Into::into));
        self.metadata = Metadata::parse(&self.xdata);
        self
    }

    /// Closed polyline from plain (x, y) points
    pub fn polygon(layer: impl Into<String>, points: &[(f64, f64)]) -> Self {
        Self::new(
            layer,
            EntityGeometry::Polyline {
                closed: true,
                vertices: points
                    .iter()
                    .map(|&(x, y)| PolylineVertex::new(x, y, 0.0))
                    .collect(),
            },
        )
    }

    /// Raw `key:value` metadata items
    pub fn xdata(&self) -> &[String] {
        &self.xdata
    }

    /// Typed metadata, parsed from the xdata
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Short geometry kind label for logs and reports
    pub fn kind(&self) -> &'static str {
        match self.geometry {
            EntityGeometry::Polyline { .. } => "polyline",
            EntityGeometry::Circle { .. } => "circle",
            EntityGeometry::Insert(_) => "insert",
        }
    }

    /// Block instance data, if this entity is one
    pub fn as_insert(&self) -> Option<&BlockInsert> {
        match &self.geometry {
            EntityGeometry::Insert(insert) => Some(insert),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_polyline() {
        let json = r#"{
            "layer": "IfcWall",
            "handle": "2F",
            "xdata": ["height:3.5"],
            "geometry": {"type": "polyline", "vertices": [
                {"x": 0, "y": 0}, {"x": 4, "y": 0, "bulge": 0.5}, {"x": 4, "y": 3}
            ]}
        }"#;
        let entity: Entity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.layer, "IfcWall");
        assert_eq!(entity.kind(), "polyline");
        match entity.geometry {
            EntityGeometry::Polyline { closed, ref vertices } => {
                assert!(closed);
                assert_eq!(vertices.len(), 3);
                assert_eq!(vertices[0].bulge, 0.0);
                assert_eq!(vertices[1].bulge, 0.5);
            }
            _ => panic!("Expected Polyline"),
        }
        assert_eq!(entity.metadata().height, 3.5);
    }

    #[test]
    fn test_deserialize_insert_defaults() {
        let json = r#"{"layer": "Blocks", "geometry": {"type": "insert", "block": "B1"}}"#;
        let entity: Entity = serde_json::from_str(json).unwrap();
        let insert = entity.as_insert().unwrap();
        assert_eq!(insert.block, "B1");
        assert_eq!(insert.position, [0.0, 0.0, 0.0]);
        assert_eq!(insert.scale, [1.0, 1.0, 1.0]);
        assert_eq!(insert.rotation, 0.0);
    }

    #[test]
    fn test_missing_layer_defaults_to_zero() {
        let json = r#"{"geometry": {"type": "circle", "center": [1, 2], "radius": 0.5}}"#;
        let entity: Entity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.layer, "0");
    }

    #[test]
    fn test_metadata_parsed_with_the_entity() {
        let built = Entity::polygon("IfcSlab", &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)])
            .with_xdata(["height:0.2"])
            .with_xdata(["z:-0.2"]);
        assert_eq!(built.metadata().height, 0.2);
        assert_eq!(built.metadata().elevation_relative, -0.2);
        assert_eq!(built.xdata().len(), 2);

        let read: Entity = serde_json::from_str(
            r#"{"layer": "IfcSlab", "xdata": ["height:0.2", "z:-0.2"],
                "geometry": {"type": "polyline", "vertices": [
                    {"x": 0, "y": 0}, {"x": 1, "y": 0}, {"x": 1, "y": 1}]}}"#,
        )
        .unwrap();
        assert_eq!(read, built);
    }
}
