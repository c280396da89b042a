// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output records and scene writers
//!
//! `SolidRecord` is the contract with the scene and BIM-export
//! collaborators; its field names are stable. `MappingEntry` is the same
//! record without mesh arrays, written to `<stem>_mapping.json`.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use dxf_lite_core::layers::ifc_class;
use dxf_lite_geometry::Solid;
use serde::{Deserialize, Serialize};

use crate::context::ConversionReport;
use crate::error::Result;

/// One emitted solid with its mesh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolidRecord {
    pub id: String,
    pub name: String,
    pub layer: String,
    /// Resolved world elevation (global + relative)
    pub elevation: f64,
    pub global_level: f64,
    pub relative_elevation: f64,
    pub role: String,
    pub perimeter: f64,
    pub segment_lengths: Vec<f64>,
    /// Plan area of the final mesh
    pub area: f64,
    /// Lateral area with the opening deduction applied
    pub lateral_area: f64,
    pub opening_area: f64,
    pub volume: f64,
    /// Plan outline `[x, y]` in world coordinates
    pub vertices: Vec<[f64; 2]>,
    /// Ids of the voids that cut this solid
    pub is_cut_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Flat `x, y, z` triples, Z up
    pub positions: Vec<f64>,
    pub indices: Vec<u32>,
}

impl From<&Solid> for SolidRecord {
    fn from(solid: &Solid) -> Self {
        let q = &solid.quantities;
        Self {
            id: solid.id.to_string(),
            name: solid.name.clone(),
            layer: solid.layer.clone(),
            elevation: solid.elevation.resolved(),
            global_level: solid.elevation.global_level,
            relative_elevation: solid.elevation.relative,
            role: solid.role.as_str().to_string(),
            perimeter: q.perimeter,
            segment_lengths: q.segment_lengths.clone(),
            area: q.plan_area,
            lateral_area: q.lateral_area,
            opening_area: q.opening_deduction,
            volume: q.volume,
            vertices: solid.outline.iter().map(|p| [p.x, p.y]).collect(),
            is_cut_by: solid.is_cut_by.iter().map(ToString::to_string).collect(),
            handle: solid.source_handle.clone(),
            positions: solid.mesh.positions.clone(),
            indices: solid.mesh.indices.clone(),
        }
    }
}

/// BIM mapping side-channel entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingEntry {
    pub id: String,
    pub name: String,
    pub layer: String,
    /// Export class derived from the layer name
    pub ifc_class: String,
    pub elevation: f64,
    pub global_level: f64,
    pub relative_elevation: f64,
    pub perimeter: f64,
    pub segment_lengths: Vec<f64>,
    pub area: f64,
    pub lateral_area: f64,
    pub opening_area: f64,
    pub volume: f64,
    pub vertices: Vec<[f64; 2]>,
    pub is_cut_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

impl From<&Solid> for MappingEntry {
    fn from(solid: &Solid) -> Self {
        let q = &solid.quantities;
        Self {
            id: solid.id.to_string(),
            name: solid.name.clone(),
            layer: solid.layer.clone(),
            ifc_class: ifc_class(&solid.layer).to_string(),
            elevation: solid.elevation.resolved(),
            global_level: solid.elevation.global_level,
            relative_elevation: solid.elevation.relative,
            perimeter: q.perimeter,
            segment_lengths: q.segment_lengths.clone(),
            area: q.plan_area,
            lateral_area: q.lateral_area,
            opening_area: q.opening_deduction,
            volume: q.volume,
            vertices: solid.outline.iter().map(|p| [p.x, p.y]).collect(),
            is_cut_by: solid.is_cut_by.iter().map(ToString::to_string).collect(),
            handle: solid.source_handle.clone(),
        }
    }
}

/// JSON scene document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDocument {
    pub solids: Vec<SolidRecord>,
    pub report: ConversionReport,
}

impl SceneDocument {
    pub fn new(solids: &[Solid], report: &ConversionReport) -> Self {
        Self {
            solids: solids.iter().map(SolidRecord::from).collect(),
            report: report.clone(),
        }
    }
}

/// Scene file format, chosen by output extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneFormat {
    Json,
    Obj,
}

impl SceneFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("obj") => SceneFormat::Obj,
            _ => SceneFormat::Json,
        }
    }
}

/// `<dir>/<stem>_mapping.json` next to the scene output
pub fn mapping_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scene");
    output.with_file_name(format!("{}_mapping.json", stem))
}

pub fn write_scene_json<W: Write>(writer: W, solids: &[Solid], report: &ConversionReport) -> Result<()> {
    serde_json::to_writer_pretty(writer, &SceneDocument::new(solids, report))?;
    Ok(())
}

pub fn write_mapping<W: Write>(writer: W, solids: &[Solid]) -> Result<usize> {
    let entries: Vec<MappingEntry> = solids.iter().map(MappingEntry::from).collect();
    serde_json::to_writer_pretty(writer, &entries)?;
    Ok(entries.len())
}

/// Wavefront OBJ, one object per solid
///
/// Converts Z-up to Y-up: `(x, y, z) -> (x, z, -y)`. That map is a proper
/// rotation, so triangle winding is kept.
pub fn write_obj<W: Write>(mut writer: W, solids: &[Solid]) -> Result<()> {
    writeln!(writer, "# Generated by dxf-lite")?;
    writeln!(writer, "# Solids: {}", solids.len())?;
    writeln!(writer, "# Coordinate system: Y-up (OBJ convention)")?;
    writeln!(writer)?;

    let mut vertex_offset: u32 = 0;

    for solid in solids {
        writeln!(writer, "# Layer: {}", solid.layer)?;
        writeln!(writer, "o {}", solid.name)?;

        let mesh = &solid.mesh;
        for p in mesh.positions.chunks_exact(3) {
            writeln!(writer, "v {:.6} {:.6} {:.6}", p[0], p[2], -p[1])?;
        }
        for n in mesh.normals.chunks_exact(3) {
            writeln!(writer, "vn {:.6} {:.6} {:.6}", n[0], n[2], -n[1])?;
        }
        for t in mesh.indices.chunks_exact(3) {
            let (i0, i1, i2) = (
                t[0] + vertex_offset + 1,
                t[1] + vertex_offset + 1,
                t[2] + vertex_offset + 1,
            );
            writeln!(writer, "f {}//{} {}//{} {}//{}", i0, i0, i1, i1, i2, i2)?;
        }

        vertex_offset += mesh.vertex_count() as u32;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the scene file in the format its extension asks for
pub fn write_scene(path: &Path, solids: &[Solid], report: &ConversionReport) -> Result<SceneFormat> {
    let format = SceneFormat::from_path(path);
    let writer = BufWriter::new(std::fs::File::create(path)?);
    match format {
        SceneFormat::Json => write_scene_json(writer, solids, report)?,
        SceneFormat::Obj => write_obj(writer, solids)?,
    }
    tracing::info!(path = %path.display(), solids = solids.len(), ?format, "Wrote scene");
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxf_lite_geometry::{box_mesh, Elevation, Point2, Point3, Quantities, Role, SolidId};

    fn wall() -> Solid {
        let mesh = box_mesh(Point3::new(0.0, 0.0, 3.0), Point3::new(4.0, 0.2, 5.5));
        Solid {
            id: SolidId(7),
            name: "IfcWall_North".to_string(),
            layer: "IfcWall".to_string(),
            elevation: Elevation::new(3.0, 0.0),
            role: Role::Solid,
            quantities: Quantities {
                perimeter: 8.4,
                segment_lengths: vec![4.0, 0.2, 4.0, 0.2],
                plan_area: 0.8,
                height: 2.5,
                lateral_area: 21.0,
                opening_deduction: 0.0,
                volume: mesh.volume(),
            },
            is_cut_by: vec![SolidId(9)],
            source_handle: Some("1A".to_string()),
            outline: vec![
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 0.2),
                Point2::new(0.0, 0.2),
            ],
            mesh,
        }
    }

    #[test]
    fn test_record_field_names_are_stable() {
        let value = serde_json::to_value(SolidRecord::from(&wall())).unwrap();
        for key in [
            "id",
            "name",
            "layer",
            "elevation",
            "global_level",
            "relative_elevation",
            "role",
            "perimeter",
            "segment_lengths",
            "area",
            "lateral_area",
            "opening_area",
            "volume",
            "vertices",
            "is_cut_by",
            "handle",
            "positions",
            "indices",
        ] {
            assert!(value.get(key).is_some(), "missing field {}", key);
        }
        assert_eq!(value["id"], "S7");
        assert_eq!(value["is_cut_by"][0], "S9");
        assert_eq!(value["elevation"], 3.0);
    }

    #[test]
    fn test_mapping_has_no_mesh_arrays() {
        let mut buffer = Vec::new();
        let count = write_mapping(&mut buffer, &[wall()]).unwrap();
        assert_eq!(count, 1);

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        let entry = &value[0];
        assert_eq!(entry["ifc_class"], "IfcWall");
        assert!(entry.get("positions").is_none());
        assert!(entry.get("indices").is_none());
    }

    #[test]
    fn test_obj_is_y_up_with_running_offsets() {
        let mut second = wall();
        second.name = "IfcWall_South".to_string();

        let mut buffer = Vec::new();
        write_obj(&mut buffer, &[wall(), second]).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("o IfcWall_North"));
        assert!(text.contains("o IfcWall_South"));
        // Point (4, 0.2, 5.5) becomes (4, 5.5, -0.2)
        assert!(text.contains("v 4.000000 5.500000 -0.200000"));

        let vertex_count = wall().mesh.vertex_count() as u32;
        let max_index = text
            .lines()
            .filter(|l| l.starts_with("f "))
            .flat_map(|l| l[2..].split(' '))
            .filter_map(|v| v.split("//").next()?.parse::<u32>().ok())
            .max()
            .unwrap();
        assert_eq!(max_index, 2 * vertex_count);
    }

    #[test]
    fn test_paths() {
        assert_eq!(
            mapping_path(Path::new("out/ground.json")),
            PathBuf::from("out/ground_mapping.json")
        );
        assert_eq!(SceneFormat::from_path(Path::new("a.OBJ")), SceneFormat::Obj);
        assert_eq!(SceneFormat::from_path(Path::new("a.json")), SceneFormat::Json);
    }
}
