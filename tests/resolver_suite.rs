use std::path::{Path, PathBuf};

use smartstep::{DiagramSnapshot, EdgeRouter, RouterConfig, render_svg};

fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn assert_valid_svg(svg: &str, fixture: &str) {
    assert!(svg.contains("<svg"), "{fixture}: missing <svg tag");
    assert!(svg.contains("</svg>"), "{fixture}: missing </svg tag");
}

fn load_fixture(rel: &str) -> DiagramSnapshot {
    let path = fixture_root().join(rel);
    assert!(path.exists(), "fixture missing: {}", rel);
    DiagramSnapshot::from_path(&path).expect("fixture load failed")
}

#[test]
fn render_all_fixtures() {
    // Keep this list explicit so new fixtures must be added intentionally.
    let candidates = [
        "basic.json",
        "nested.json",
        "border_nodes.json",
        "blocked.json",
        "unroutable.json",
        "handles.json",
    ];

    let config = RouterConfig::default();
    for rel in candidates {
        let snapshot = load_fixture(rel);
        let mut router = EdgeRouter::new(config.clone());
        let edges = router.resolve_all(&snapshot);
        assert_eq!(
            edges.len(),
            snapshot.edges.len(),
            "{rel}: every edge should resolve"
        );
        let svg = render_svg(&snapshot, &edges, &config);
        assert_valid_svg(&svg, rel);
    }
}

#[test]
fn basic_edge_routes_directly() {
    let snapshot = load_fixture("basic.json");
    let mut router = EdgeRouter::new(RouterConfig::default());
    let edges = router.resolve_all(&snapshot);
    assert_eq!(edges.len(), 1);
    let (_, geometry) = &edges[0];
    assert!(geometry.routed, "open canvas should take the grid route");
    assert!(geometry.source.x < geometry.target.x);
}

#[test]
fn nested_edges_all_route() {
    let snapshot = load_fixture("nested.json");
    let mut router = EdgeRouter::new(RouterConfig::default());
    let edges = router.resolve_all(&snapshot);
    assert_eq!(edges.len(), 2);
    for (spec, geometry) in &edges {
        assert!(
            geometry.routed,
            "{} -> {}: expected a grid route",
            spec.source, spec.target
        );
        assert!(geometry.svg_path.starts_with('M'));
    }
}

#[test]
fn blocked_edge_detours_around_the_wall() {
    let snapshot = load_fixture("blocked.json");
    let mut router = EdgeRouter::new(RouterConfig::default());
    let edges = router.resolve_all(&snapshot);
    let (_, geometry) = &edges[0];
    assert!(geometry.routed, "wall should be avoidable, not fatal");

    // The wall spans x 300..360; no interior waypoint may sit inside it.
    let wall = snapshot.absolute_rect("wall").unwrap();
    for point in &geometry.points[1..geometry.points.len() - 1] {
        assert!(
            !wall.contains(*point),
            "waypoint ({}, {}) crosses the wall",
            point.x,
            point.y
        );
    }
}

#[test]
fn enclosed_target_falls_back_to_smooth_step() {
    let snapshot = load_fixture("unroutable.json");
    let mut router = EdgeRouter::new(RouterConfig::default());
    let edges = router.resolve_all(&snapshot);
    let (_, geometry) = &edges[0];
    assert!(!geometry.routed, "ring should force the fallback path");
    let expected_x = (geometry.source.x + geometry.target.x) / 2.0;
    let expected_y = (geometry.source.y + geometry.target.y) / 2.0;
    assert_eq!(geometry.label.x, expected_x);
    assert_eq!(geometry.label.y, expected_y);
}

#[test]
fn declared_handle_shifts_the_endpoint() {
    let snapshot = load_fixture("handles.json");
    let mut router = EdgeRouter::new(RouterConfig::default());
    let edges = router.resolve_all(&snapshot);
    assert_eq!(edges.len(), 2);

    // palette is 120x80 at (60, 40); the right-side midpoint sits at y 80
    // and "palette-out" is declared 20 px above it.
    let (_, via_handle) = &edges[0];
    assert_eq!(via_handle.source.y, 60.0);

    // iconLabel nodes anchor on the icon midline (y 73 here) rather than the
    // box center; the perpendicular snap then lands it on 70.
    assert_eq!(via_handle.target.y, 70.0);
}

#[test]
fn warm_cache_returns_the_same_geometry() {
    let snapshot = load_fixture("nested.json");
    let mut router = EdgeRouter::new(RouterConfig::default());
    let edge = snapshot.edges[0].clone();
    let first = router.resolve(&snapshot, &edge).expect("resolve failed");
    let second = router.resolve(&snapshot, &edge).expect("resolve failed");
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}
