// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end conversions of small drawings.

use approx::assert_relative_eq;
use dxf_lite_core::{BlockInsert, Drawing, Entity, EntityGeometry};
use dxf_lite_geometry::{ClippingProcessor, ControlSurface, Solid, SolidId};
use dxf_lite_processing::{
    decode, ConversionContext, Error, LayeredCsg, Pipeline, PipelineConfig, RoofTrimmer,
    SolidBuilder,
};
use rustc_hash::FxHashMap;

fn rect(layer: &str, min: (f64, f64), max: (f64, f64), xdata: &[&str]) -> Entity {
    Entity::polygon(
        layer,
        &[(min.0, min.1), (max.0, min.1), (max.0, max.1), (min.0, max.1)],
    )
    .with_xdata(xdata.iter().copied())
}

fn drawing(entities: Vec<Entity>) -> Drawing {
    Drawing {
        entities,
        ..Drawing::default()
    }
}

fn solid_on<'s>(solids: &'s [Solid], layer: &str) -> &'s Solid {
    solids
        .iter()
        .find(|s| s.layer == layer)
        .unwrap_or_else(|| panic!("no solid on {}", layer))
}

#[test]
fn test_wall_under_roof_stops_at_roof_bottom() {
    let drawing = drawing(vec![
        rect("IfcWall", (0.0, 0.0), (5.0, 5.0), &["height:3.5"]),
        rect("IfcRoof", (-1.0, -1.0), (6.0, 6.0), &["height:0.3", "z:2.8"]),
    ]);

    let snapshot = Pipeline::default().convert(&drawing, 0.0).unwrap();
    let wall = solid_on(&snapshot.solids, "IfcWall");

    assert_eq!(wall.top_z().unwrap(), 2.8);
    assert_relative_eq!(wall.quantities.volume, 25.0 * 2.8, epsilon = 1e-6);
    assert!(wall.mesh.signed_volume() > 0.0);
}

#[test]
fn test_window_void_reduces_wall_plan_area() {
    let drawing = drawing(vec![
        rect("IfcWall", (0.0, 0.0), (4.0, 2.0), &["height:3"]),
        rect(
            "IfcWindow",
            (1.0, 0.5),
            (2.0, 1.5),
            &["solid:0", "z:-0.5", "height:4"],
        ),
    ]);

    let snapshot = Pipeline::default().convert(&drawing, 0.0).unwrap();
    assert_eq!(snapshot.len(), 1);

    let wall = &snapshot.solids[0];
    assert_eq!(wall.layer, "IfcWall");
    assert_eq!(wall.is_cut_by.len(), 1);
    assert_relative_eq!(wall.quantities.plan_area, 7.0, epsilon = 1e-6);
    assert_relative_eq!(wall.quantities.volume, 21.0, epsilon = 1e-6);
}

#[test]
fn test_space_lateral_area_with_opening_formula() {
    let drawing = drawing(vec![rect(
        "IfcSpace",
        (0.0, 0.0),
        (5.0, 5.0),
        &["height:2.5", "Opening_area:=2.1*0.9+1.2*1.2"],
    )]);

    let snapshot = Pipeline::default().convert(&drawing, 0.0).unwrap();
    let space = &snapshot.solids[0];
    assert_relative_eq!(space.quantities.opening_deduction, 3.33, epsilon = 1e-9);
    assert_relative_eq!(space.quantities.lateral_area, 46.67, epsilon = 1e-9);
}

#[test]
fn test_elevation_round_trip() {
    let drawing = drawing(vec![
        rect("IfcWall", (0.0, 0.0), (4.0, 0.3), &["height:3", "z:0.4"]),
        rect("IfcColumn", (5.0, 0.0), (5.3, 0.3), &["height:3", "z:0.4"]),
        rect("IfcSlab", (0.0, 2.0), (4.0, 4.0), &["height:0.2", "z:-0.2"]),
    ]);

    let snapshot = Pipeline::default().convert(&drawing, 3.2).unwrap();
    for solid in snapshot.solids.iter() {
        assert_relative_eq!(
            solid.elevation.resolved(),
            3.2 + solid.elevation.relative,
            epsilon = 1e-12
        );
    }
    let column = solid_on(&snapshot.solids, "IfcColumn");
    assert_relative_eq!(column.bottom_z().unwrap(), 3.2, epsilon = 1e-12);
    let wall = solid_on(&snapshot.solids, "IfcWall");
    assert_relative_eq!(wall.bottom_z().unwrap(), 3.6, epsilon = 1e-12);
}

#[test]
fn test_void_exclusion_and_winding() {
    let drawing = drawing(vec![
        rect("IfcWall", (0.0, 0.0), (6.0, 0.3), &["height:3"]),
        rect("IfcWall", (0.0, 0.0), (0.3, 6.0), &["height:3"]),
        rect("void", (2.0, -1.0), (3.0, 1.0), &["height:2"]),
        rect("IfcWindow", (-0.1, 2.0), (0.4, 3.0), &["solid:0", "z:1", "height:1"]),
        rect("IfcSlab", (0.0, 0.0), (6.0, 6.0), &["height:0.2", "z:3"]),
        rect("IfcSlab", (1.0, 1.0), (2.0, 2.0), &["solid:0", "z:2.5", "height:1"]),
    ]);

    let snapshot = Pipeline::default().convert(&drawing, 0.0).unwrap();
    assert_eq!(snapshot.len(), 3);
    for solid in snapshot.solids.iter() {
        assert!(!solid.is_void());
        assert!(solid.layer != "void");
        assert!(solid.mesh.signed_volume() > 0.0, "{} is inside out", solid.name);
    }

    let slab = solid_on(&snapshot.solids, "IfcSlab");
    assert_eq!(slab.is_cut_by.len(), 1);
    assert_relative_eq!(slab.quantities.volume, 36.0 * 0.2 - 0.2, epsilon = 1e-6);
}

#[test]
fn test_cut_list_soundness_against_uncut_geometry() {
    let config = PipelineConfig::default();
    let surface = ControlSurface::default();
    let builder = SolidBuilder::new(&config, 0.0, &surface);
    let mut ctx = ConversionContext::new();

    let entities = vec![
        rect("IfcWall", (0.0, 0.0), (6.0, 0.3), &["height:3"]),
        rect("IfcCovering", (0.0, 0.3), (6.0, 0.35), &["height:3"]),
        rect("IfcWindow", (1.0, -0.1), (2.0, 0.5), &["solid:0", "z:1", "height:1.2"]),
        rect("void", (4.0, -0.1), (4.5, 0.2), &["height:2"]),
        // Touches the wall end face only
        rect("IfcWall", (6.0, 0.0), (7.0, 0.3), &["solid:0", "height:3"]),
    ];
    let built: Vec<Solid> = entities
        .iter()
        .map(|e| builder.build(&mut ctx, &decode(e, 16).unwrap()).unwrap())
        .collect();
    let originals: FxHashMap<SolidId, Solid> = built.iter().map(|s| (s.id, s.clone())).collect();

    let outcome = LayeredCsg::new(&config).apply(&mut ctx, built);
    let clipper = ClippingProcessor::new();

    let mut cuts = 0;
    for solid in &outcome.solids {
        let original = &originals[&solid.id];
        for void_id in &solid.is_cut_by {
            let void = &originals[void_id];
            let shared = clipper
                .intersection_volume(&original.mesh, &void.mesh)
                .unwrap();
            assert!(shared > config.intersection_epsilon);
            cuts += 1;
        }
    }
    // Window cuts wall and covering, the void layer cuts the wall
    assert_eq!(cuts, 3);
    assert_eq!(outcome.unused_voids.len(), 1);
}

#[test]
fn test_retrim_is_idempotent() {
    let config = PipelineConfig::default();
    let drawing = drawing(vec![
        rect("IfcWall", (0.0, 0.0), (5.0, 0.3), &["height:4"]),
        rect("IfcCovering", (0.0, 0.3), (5.0, 0.32), &["height:4"]),
        rect("IfcRoof", (-1.0, -1.0), (6.0, 2.0), &["height:0.3", "z:3"]),
    ]);

    let snapshot = Pipeline::new(config.clone()).convert(&drawing, 0.0).unwrap();
    let mut ctx = ConversionContext::new();
    let again = RoofTrimmer::new(&config).apply(&mut ctx, snapshot.solids.to_vec());

    for (before, after) in snapshot.solids.iter().zip(&again) {
        assert_eq!(before.mesh.positions, after.mesh.positions);
        assert_eq!(before.mesh.indices, after.mesh.indices);
        assert_eq!(before.quantities, after.quantities);
    }
}

#[test]
fn test_blocks_and_fixtures_in_one_drawing() {
    let mut drawing = drawing(vec![
        rect("IfcWall", (0.0, 0.0), (6.0, 0.3), &["height:3"]),
        Entity::new(
            "Furniture",
            EntityGeometry::Insert(BlockInsert::new("Table", [3.0, 3.0, 0.0])),
        ),
        Entity::new(
            "Doors",
            EntityGeometry::Insert(BlockInsert::new("Door90_TOV", [1.0, 0.0, 0.0])),
        ),
        Entity::new(
            "Doors",
            EntityGeometry::Insert(BlockInsert::new("Door120_TOV", [4.0, 0.0, 0.0])),
        ),
    ]);
    drawing.blocks.insert(
        "Table".to_string(),
        vec![rect("0", (0.0, 0.0), (1.0, 1.0), &["height:0.8"])],
    );
    drawing.fixture_library.doors.insert(
        "Door90_FOV".to_string(),
        vec![
            rect("frame", (0.0, 0.0), (0.9, 0.3), &["height:2.1"]),
            rect("frame_void", (0.05, -0.1), (0.85, 0.4), &["height:2.05"]),
        ],
    );

    let snapshot = Pipeline::default().convert(&drawing, 0.0).unwrap();

    let table = solid_on(&snapshot.solids, "Furniture");
    assert_relative_eq!(table.bounds().unwrap().min.x, 3.0, epsilon = 1e-12);

    let frame = solid_on(&snapshot.solids, "Doors/frame");
    assert_eq!(frame.is_cut_by.len(), 1);
    assert_relative_eq!(
        frame.quantities.volume,
        0.9 * 0.3 * 2.1 - 0.8 * 0.3 * 2.05,
        epsilon = 1e-6
    );

    assert_eq!(snapshot.report.unmatched_fixtures.len(), 1);
    assert_eq!(snapshot.report.unmatched_fixtures[0].expected, "Door120_FOV");
}

#[test]
fn test_document_with_level_in_name() {
    let json = r#"{
        "name": "first_floor_+3.20",
        "entities": [
            {"layer": "IfcSlab", "xdata": ["height:0.2"], "geometry": {"type": "polyline",
             "vertices": [{"x":0,"y":0},{"x":4,"y":0},{"x":4,"y":4},{"x":0,"y":4}]}}
        ]
    }"#;
    let drawing = Drawing::from_json_str(json).unwrap();
    let level = drawing.resolve_global_level(None, None);
    assert_relative_eq!(level, 3.2);

    let snapshot = Pipeline::default().convert(&drawing, level).unwrap();
    assert_relative_eq!(snapshot.solids[0].bottom_z().unwrap(), 3.2, epsilon = 1e-12);
    assert_relative_eq!(snapshot.global_level, 3.2);
}

#[test]
fn test_nothing_convertible_is_an_error() {
    let drawing = drawing(vec![
        Entity::polygon("IfcWall", &[(0.0, 0.0), (1.0, 1.0)]),
        Entity::polygon("IfcWall", &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]),
    ]);

    let err = Pipeline::default().convert(&drawing, 0.0).unwrap_err();
    assert!(matches!(err, Error::NoValidEntities { skipped: 2 }));
}

#[test]
fn test_scaled_block_instance_quantities() {
    let mut instance = Entity::new(
        "Furniture",
        EntityGeometry::Insert(BlockInsert::new("Counter", [2.0, 2.0, 0.0])),
    );
    if let EntityGeometry::Insert(ref mut insert) = instance.geometry {
        insert.scale = [2.0, 1.0, 1.0];
        insert.rotation = 90.0;
    }
    let mut drawing = drawing(vec![instance]);
    drawing.blocks.insert(
        "Counter".to_string(),
        vec![rect("0", (0.0, 0.0), (1.0, 1.0), &["height:0.9"])],
    );

    let snapshot = Pipeline::default().convert(&drawing, 0.0).unwrap();
    let counter = solid_on(&snapshot.solids, "Furniture");
    assert_relative_eq!(counter.quantities.perimeter, 6.0, epsilon = 1e-9);
    assert_relative_eq!(counter.quantities.lateral_area, 6.0 * 0.9, epsilon = 1e-9);
    assert_relative_eq!(counter.quantities.plan_area, 2.0, epsilon = 1e-6);
    assert_relative_eq!(counter.quantities.volume, 1.8, epsilon = 1e-6);
}

#[test]
fn test_runaway_opening_formula_deducts_nothing() {
    let parens = format!(
        "Opening_area:={}1{}",
        "(".repeat(100_000),
        ")".repeat(100_000)
    );
    let signs = format!("Opening_area:{}1", "-".repeat(100_000));
    let drawing = drawing(vec![
        rect("IfcSpace", (0.0, 0.0), (5.0, 5.0), &["height:2.5", parens.as_str()]),
        rect("IfcSpace", (6.0, 0.0), (11.0, 5.0), &["height:2.5", signs.as_str()]),
    ]);

    let snapshot = Pipeline::default().convert(&drawing, 0.0).unwrap();
    assert_eq!(snapshot.len(), 2);
    for space in snapshot.solids.iter() {
        assert_eq!(space.quantities.opening_deduction, 0.0);
        assert_relative_eq!(space.quantities.lateral_area, 50.0, epsilon = 1e-9);
    }
}
