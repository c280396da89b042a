// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Layer naming conventions
//!
//! Layers drive both material grouping and cutting scope. Matching is a
//! case-insensitive substring test, so `IfcWall`, `walls_ext` and `WALL`
//! all classify as walls.

#[inline]
fn contains_ci(layer: &str, needle: &str) -> bool {
    layer.to_ascii_lowercase().contains(needle)
}

/// Columns: base always at the global level, exempt from roof trimming
#[inline]
pub fn is_column_layer(layer: &str) -> bool {
    contains_ci(layer, "column")
}

/// Beams: exempt from roof trimming
#[inline]
pub fn is_beam_layer(layer: &str) -> bool {
    contains_ci(layer, "beam")
}

/// Roof candidates for trimming (roof or slab)
#[inline]
pub fn is_roof_layer(layer: &str) -> bool {
    contains_ci(layer, "roof") || contains_ci(layer, "slab")
}

/// Vertical structural layers that get trimmed and window openings
#[inline]
pub fn is_structural_layer(layer: &str) -> bool {
    (contains_ci(layer, "wall") || contains_ci(layer, "covering"))
        && !is_column_layer(layer)
        && !is_beam_layer(layer)
}

/// Window layers, whose voids cut walls and coverings
#[inline]
pub fn is_window_layer(layer: &str) -> bool {
    contains_ci(layer, "window")
}

/// BIM class for a layer, used by the semantic export
pub fn ifc_class(layer: &str) -> &'static str {
    const TABLE: &[(&str, &str)] = &[
        ("space", "IfcSpace"),
        ("wall", "IfcWall"),
        ("zid", "IfcWall"),
        ("column", "IfcColumn"),
        ("coloan", "IfcColumn"),
        ("beam", "IfcBeam"),
        ("slab", "IfcSlab"),
        ("plac", "IfcSlab"),
        ("roof", "IfcRoof"),
        ("acoperis", "IfcRoof"),
        ("covering", "IfcCovering"),
        ("stair", "IfcStair"),
        ("scar", "IfcStair"),
        ("door", "IfcDoor"),
        ("usa", "IfcDoor"),
        ("usi", "IfcDoor"),
        ("window", "IfcWindow"),
        ("fereastr", "IfcWindow"),
        ("ferestre", "IfcWindow"),
    ];

    let lower = layer.to_ascii_lowercase();
    TABLE
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, class)| *class)
        .unwrap_or("IfcBuildingElementProxy")
}
