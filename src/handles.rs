use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::config::RouterConfig;
use crate::geometry::{Point, Rect, round_to_nearest};
use crate::snapshot::{Node, Side};

/// Attachment-geometry override for a node rendering kind. Receives the
/// node, its absolute bounding box, the side the edge attaches to, and the
/// optional handle id.
pub type HandleFn = fn(&Node, Rect, Side, Option<&str>) -> Point;

/// Vertical midline of the icon/label strip on `iconLabel` nodes.
const ICON_LABEL_MIDLINE: f32 = 13.0;

static BUILTIN_HANDLES: Lazy<HashMap<&'static str, HandleFn>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, HandleFn> = HashMap::new();
    map.insert("iconLabel", icon_label_handle);
    map
});

/// Icon-label nodes are a single text strip; side attachments pin to the
/// strip midline instead of the box midpoint.
fn icon_label_handle(_node: &Node, rect: Rect, side: Side, _handle_id: Option<&str>) -> Point {
    let midline = rect.y + ICON_LABEL_MIDLINE.min(rect.height / 2.0);
    match side {
        Side::Left => Point::new(rect.x, midline),
        Side::Right => Point::new(rect.right(), midline),
        Side::Top => Point::new(rect.x + rect.width / 2.0, rect.y),
        Side::Bottom => Point::new(rect.x + rect.width / 2.0, rect.bottom()),
    }
}

/// Kind-tag to attachment-geometry dispatch table. Kinds without an entry
/// use the default border formula.
#[derive(Clone, Default)]
pub struct HandleRegistry {
    overrides: HashMap<String, HandleFn>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let overrides = BUILTIN_HANDLES
            .iter()
            .map(|(kind, f)| (kind.to_string(), *f))
            .collect();
        Self { overrides }
    }

    pub fn register(&mut self, kind: impl Into<String>, f: HandleFn) {
        self.overrides.insert(kind.into(), f);
    }

    pub fn lookup(&self, kind: &str) -> Option<HandleFn> {
        self.overrides.get(kind).copied()
    }
}

impl std::fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("kinds", &self.overrides.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Default attachment coordinate: the declared handle's offset along the
/// side, or the side midpoint when the handle id is absent or unknown.
fn default_handle_position(node: &Node, rect: Rect, side: Side, handle_id: Option<&str>) -> Point {
    let offset = handle_id
        .and_then(|id| {
            node.handles
                .iter()
                .find(|handle| handle.id == id && handle.side == side)
        })
        .map(|handle| handle.offset)
        .unwrap_or(0.0);
    let center = rect.center();
    match side {
        Side::Left => Point::new(rect.x, center.y + offset),
        Side::Right => Point::new(rect.right(), center.y + offset),
        Side::Top => Point::new(center.x + offset, rect.y),
        Side::Bottom => Point::new(center.x + offset, rect.bottom()),
    }
}

fn has_marker(marker: Option<&str>) -> bool {
    marker.is_some_and(|id| !id.contains("None"))
}

/// Exact pixel endpoint on the node border for one end of an edge.
///
/// A registered kind override is consulted first. The raw coordinate is then
/// nudged outward so the line (or its arrowhead) touches the border rather
/// than overlapping it, and the coordinate perpendicular to the nudge is
/// snapped to the configured step for a cleaner attachment point.
pub fn resolve_endpoint(
    registry: &HandleRegistry,
    node: &Node,
    rect: Rect,
    side: Side,
    handle_id: Option<&str>,
    marker: Option<&str>,
    config: &RouterConfig,
) -> Point {
    let mut point = match registry.lookup(&node.kind) {
        Some(custom) => custom(node, rect, side, handle_id),
        None => default_handle_position(node, rect, side, handle_id),
    };
    let radius = if has_marker(marker) {
        config.marker_handle_radius
    } else {
        config.handle_radius
    };
    match side {
        Side::Right => {
            point.x += radius;
            point.y = round_to_nearest(point.y, config.snap_step);
        }
        Side::Left => {
            point.x -= radius;
            point.y = round_to_nearest(point.y, config.snap_step);
        }
        Side::Top => {
            point.y -= radius;
            point.x = round_to_nearest(point.x, config.snap_step);
        }
        Side::Bottom => {
            point.y += radius;
            point.x = round_to_nearest(point.x, config.snap_step);
        }
    }
    point
}
