use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use approx::assert_abs_diff_eq;
use marching_metaballs::prelude::*;

fn single_blob(side_length: f32, resolution: u32) -> (MetaballEngine, MetaballHandle) {
    let mut engine = MetaballEngine::new(Point::origin(), side_length, resolution, 1.0).unwrap();
    let handle = engine.add_metaball(Point::origin(), Shape::inverse_square());
    (engine, handle)
}

#[test]
fn unit_blob_is_a_unit_sphere() {
    let (mut engine, _) = single_blob(2.0, 30);
    let mesh = engine.refresh();

    assert!(!mesh.is_empty());
    assert_eq!(mesh.vertices.len() % 3, 0);
    assert_eq!(mesh.indices.len(), mesh.vertices.len());
    for v in &mesh.vertices {
        let r = v.position().coords.norm();
        assert!((r - 1.0).abs() <= 0.15, "vertex at radius {r}");
    }
}

#[test]
fn normals_point_away_from_the_center() {
    let (mut engine, _) = single_blob(3.0, 24);
    for v in &engine.refresh().vertices {
        let n = v.normal();
        assert_abs_diff_eq!(n.norm(), 1.0, epsilon = 1e-3);
        assert!(n.dot(&v.position().coords) > 0.0);
    }
}

#[test]
fn clean_refresh_reuses_the_cached_mesh() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut engine = MetaballEngine::new(Point::origin(), 3.0, 12, 1.0).unwrap();
    engine.add_metaball(
        Point::origin(),
        Shape::custom(move |c: &Point, p: &Point| {
            counter.fetch_add(1, Ordering::Relaxed);
            1.0 / (c - p).norm_squared()
        }),
    );

    let first_vertices = engine.refresh().vertex_bytes().to_vec();
    let first_indices = engine.mesh().index_bytes().to_vec();
    let after_first = calls.load(Ordering::Relaxed);
    assert!(after_first > 0);

    let second = engine.refresh();
    assert_eq!(second.vertex_bytes(), first_vertices.as_slice());
    assert_eq!(second.index_bytes(), first_indices.as_slice());
    assert_eq!(calls.load(Ordering::Relaxed), after_first);
}

#[test]
fn moving_a_ball_needs_make_dirty() {
    let (mut engine, ball) = single_blob(4.0, 24);
    let before = engine.refresh().clone();
    assert_abs_diff_eq!(before.centroid().unwrap().x, 0.0, epsilon = 0.02);

    engine.get_metaball_mut(ball).unwrap().center = Point::new(0.5, 0.0, 0.0);
    assert_eq!(engine.refresh(), &before);

    let after = engine.make_dirty().refresh();
    let centroid = after.centroid().unwrap();
    assert_abs_diff_eq!(centroid.x, 0.5, epsilon = 0.05);
    assert_abs_diff_eq!(centroid.y, 0.0, epsilon = 0.05);
}

#[test]
fn kinetic_balls_advance_with_time() {
    let mut engine = MetaballEngine::new(Point::origin(), 4.0, 24, 1.0).unwrap();
    engine.push_metaball(
        Metaball::new(Point::origin(), Shape::inverse_square()).with_velocity(Vector::new(0.0, 0.0, 1.0)),
    );
    engine.refresh();

    engine.advance(0.5);
    assert!(engine.is_dirty());
    let centroid = engine.refresh().centroid().unwrap();
    assert_abs_diff_eq!(centroid.z, 0.5, epsilon = 0.05);
}

#[test]
fn subtracted_ball_carves_the_surface() {
    let (mut engine, _) = single_blob(4.0, 32);
    let whole = engine.refresh().centroid().unwrap();

    engine.subtract_metaball(Point::new(1.5, 0.0, 0.0), Shape::inverse_square());
    assert!(engine.evaluate(&Point::new(0.8, 0.0, 0.0)) < engine.isovalue());
    let carved = engine.refresh().centroid().unwrap();
    assert!(carved.x < whole.x - 0.05, "centroid {carved} vs {whole}");
}

#[test]
fn isovalue_controls_the_radius() {
    let (mut engine, _) = single_blob(4.0, 32);
    engine.set_isovalue(4.0);
    for v in &engine.refresh().vertices {
        let r = v.position().coords.norm();
        assert!((r - 0.5).abs() <= 0.1, "vertex at radius {r}");
    }
}

#[test]
fn sequential_rebuild_matches_parallel() {
    let build = |parallel: bool| {
        let mut engine = MetaballEngine::new(Point::new(0.1, 0.0, -0.2), 5.0, 28, 1.0)
            .unwrap()
            .with_config(EngineConfig::default().with_parallel(parallel));
        engine.add_metaball(Point::new(-0.6, 0.0, 0.0), Shape::inverse_square());
        engine.add_metaball(Point::new(0.7, 0.2, 0.0), Shape::cube(0.6, Vector::repeat(1.0), 0.0));
        engine.subtract_metaball(Point::new(0.0, 1.0, 0.0), Shape::gaussian(0.1));
        engine.refresh().clone()
    };
    assert_eq!(build(false), build(true));
}

#[test]
fn edge_policy_decides_flat_edge_crossings() {
    // Across x the field changes by 1e-9 per cell, far below the 1e-6 denominator floor.
    // Samples at x = 0 sit exactly on the isovalue, samples at x = -1 just below it.
    let build = |policy: EdgePolicy| {
        let mut engine = MetaballEngine::new(Point::origin(), 2.0, 2, 0.0)
            .unwrap()
            .with_config(EngineConfig::default().with_edge_policy(policy));
        engine.add_metaball(Point::origin(), Shape::custom(|_: &Point, p: &Point| 1e-9 * p.x));
        engine.refresh().clone()
    };

    let snapped = build(EdgePolicy::SnapToNearest);
    let clamped = build(EdgePolicy::ClampDenominator);
    assert!(!snapped.is_empty());
    assert_eq!(snapped.vertices.len(), clamped.vertices.len());

    for v in &snapped.vertices {
        assert_abs_diff_eq!(v.position().x, 0.0, epsilon = 1e-6);
    }
    // Edges walked from the outside corner land a clamped t of 1e-3 from that corner.
    assert!(clamped.vertices.iter().any(|v| v.position().x < -0.99));
    assert!(clamped.vertices.iter().all(|v| v.position().x <= 1e-6));
}

#[test]
fn odd_resolution_is_rounded_down() {
    let (engine, _) = single_blob(2.0, 9);
    assert_eq!(engine.grid().resolution(), 8);
    assert_eq!(engine.grid().cells().len(), 512);
}

#[test]
fn construction_errors_are_descriptive() {
    let err = MetaballEngine::new(Point::origin(), 2.0, 1, 1.0).unwrap_err();
    assert!(matches!(err, MetaballError::InvalidResolution(1)));
    assert_eq!(err.to_string(), "resolution must be greater than 1, got 1");

    let (engine, _) = single_blob(2.0, 4);
    let bogus = {
        let (mut other, _) = single_blob(2.0, 4);
        other.add_metaball(Point::origin(), Shape::inverse_square())
    };
    let err = engine.get_metaball(bogus).unwrap_err();
    assert_eq!(err.to_string(), "metaball handle 1 is out of range (1 metaballs)");
}
