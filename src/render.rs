use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::config::RouterConfig;
use crate::resolver::EdgeGeometry;
use crate::snapshot::{DiagramSnapshot, EdgeSpec};

const PREVIEW_PAD: f32 = 40.0;

/// Render the snapshot and its resolved edges as a standalone SVG preview.
/// Containers draw under their children; border nodes get their own fill so
/// perimeter attachment is visible.
pub fn render_svg(
    snapshot: &DiagramSnapshot,
    edges: &[(EdgeSpec, Arc<EdgeGeometry>)],
    config: &RouterConfig,
) -> String {
    let render = &config.render;
    let (width, height) = preview_extent(snapshot);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"0 0 {width:.0} {height:.0}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        render.background
    ));
    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        render.edge_stroke
    ));
    svg.push_str("</defs>");

    // Containers first so nested nodes draw on top of them.
    let mut ordered: Vec<&str> = snapshot.nodes.keys().map(|id| id.as_str()).collect();
    ordered.sort_by_key(|id| nesting_depth(snapshot, id));

    for id in &ordered {
        let Some(node) = snapshot.node(id) else {
            continue;
        };
        let Some(rect) = snapshot.absolute_rect(id) else {
            continue;
        };
        let is_container = snapshot.nodes.values().any(|n| n.parent.as_deref() == Some(*id));
        let fill = if node.border_node {
            &render.border_node_fill
        } else if is_container {
            &render.container_fill
        } else {
            &render.node_fill
        };
        let stroke = if is_container {
            &render.container_stroke
        } else {
            &render.node_stroke
        };
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"4\" ry=\"4\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.2\"><title>{}</title></rect>",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            fill,
            stroke,
            escape_xml(&node.id)
        ));
    }

    for (spec, geometry) in edges {
        let marker_end = match &spec.marker_end {
            Some(id) if !id.contains("None") => " marker-end=\"url(#arrow)\"",
            _ => "",
        };
        let marker_start = match &spec.marker_start {
            Some(id) if !id.contains("None") => " marker-start=\"url(#arrow)\"",
            _ => "",
        };
        let dasharray = if geometry.routed { "" } else { " stroke-dasharray=\"4 3\"" };
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"{}{}{}/>",
            geometry.svg_path,
            render.edge_stroke,
            render.edge_stroke_width,
            dasharray,
            marker_start,
            marker_end
        ));
        svg.push_str(&format!(
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"2.5\" fill=\"{}\"/>",
            geometry.label.x, geometry.label.y, render.label_anchor_fill
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn preview_extent(snapshot: &DiagramSnapshot) -> (f32, f32) {
    let mut max_x = 200.0f32;
    let mut max_y = 200.0f32;
    for id in snapshot.nodes.keys() {
        if let Some(rect) = snapshot.absolute_rect(id) {
            max_x = max_x.max(rect.right());
            max_y = max_y.max(rect.bottom());
        }
    }
    (max_x + PREVIEW_PAD, max_y + PREVIEW_PAD)
}

fn nesting_depth(snapshot: &DiagramSnapshot, id: &str) -> usize {
    let mut depth = 0;
    let mut cursor = snapshot.node(id);
    while let Some(node) = cursor {
        match &node.parent {
            Some(parent) => {
                depth += 1;
                cursor = snapshot.node(parent);
            }
            None => break,
        }
    }
    depth
}

pub fn write_output(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path) -> Result<()> {
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;
    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::EdgeRouter;
    use crate::snapshot::test_support::{node, snapshot};

    #[test]
    fn preview_contains_nodes_and_edges() {
        let snapshot = {
            let mut s = snapshot(vec![
                node("a", None, 0.0, 0.0, 50.0, 60.0),
                node("b", None, 250.0, 0.0, 50.0, 60.0),
            ]);
            s.edges.push(crate::snapshot::EdgeSpec {
                source: "a".to_string(),
                target: "b".to_string(),
                source_side: crate::snapshot::Side::Right,
                target_side: crate::snapshot::Side::Left,
                source_handle: None,
                target_handle: None,
                marker_start: None,
                marker_end: Some("arrow".to_string()),
            });
            s
        };
        let config = RouterConfig::default();
        let mut router = EdgeRouter::new(config.clone());
        let edges = router.resolve_all(&snapshot);
        let svg = render_svg(&snapshot, &edges, &config);
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
        assert!(svg.contains("<title>a</title>"));
        assert!(svg.contains("marker-end=\"url(#arrow)\""));
        assert!(svg.contains("<path d=\"M "));
    }

    #[test]
    fn containers_draw_before_children() {
        let snapshot = snapshot(vec![
            node("outer", None, 0.0, 0.0, 300.0, 200.0),
            node("inner", Some("outer"), 20.0, 20.0, 60.0, 40.0),
        ]);
        let config = RouterConfig::default();
        let svg = render_svg(&snapshot, &[], &config);
        let outer_at = svg.find("<title>outer</title>").unwrap();
        let inner_at = svg.find("<title>inner</title>").unwrap();
        assert!(outer_at < inner_at);
    }

    #[test]
    fn escapes_node_ids() {
        assert_eq!(escape_xml("a<b>&"), "a&lt;b&gt;&amp;");
    }
}
