use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::ancestry::{NodeIndex, lowest_common_ancestor};
use crate::config::RouterConfig;
use crate::geometry::{Point, smooth_step_path};
use crate::handles::{HandleRegistry, resolve_endpoint};
use crate::routing::{Obstacle, RouteRequest, compute_route};
use crate::scope::relevant_obstacles;
use crate::snapshot::{DiagramSnapshot, EdgeSpec};

/// Everything the edge renderer needs: resolved border endpoints, a label
/// anchor, and the path description. `routed` is false when the smooth-step
/// fallback was used.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeGeometry {
    pub source: Point,
    pub target: Point,
    pub label: Point,
    pub points: Vec<Point>,
    pub svg_path: String,
    pub routed: bool,
}

#[derive(Debug)]
struct CacheEntry {
    hierarchy_version: u64,
    relevant: Vec<String>,
    /// Sum of `geometry_version` over the relevant nodes and every ancestor
    /// of both endpoints. Any move or resize of a member bumps it; nothing
    /// else does.
    geometry_stamp: u64,
    geometry: Arc<EdgeGeometry>,
}

/// Resolves edge geometry over diagram snapshots, memoizing per edge.
///
/// Recomputation is keyed on explicit version stamps rather than serialized
/// snapshots: the snapshot's `hierarchy_version` guards the ancestor chains
/// and the relevant-obstacle subset, and the summed `geometry_version` of
/// that subset plus the endpoints' ancestors guards the route. Absolute
/// coordinates accumulate ancestor offsets, so a container drag has to
/// invalidate even though containers are not obstacles. Moving or resizing
/// a node outside all of that returns the identical cached result.
#[derive(Debug)]
pub struct EdgeRouter {
    registry: HandleRegistry,
    config: RouterConfig,
    cache: HashMap<EdgeSpec, CacheEntry>,
}

impl EdgeRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            registry: HandleRegistry::with_builtins(),
            config,
            cache: HashMap::new(),
        }
    }

    pub fn with_registry(config: RouterConfig, registry: HandleRegistry) -> Self {
        Self {
            registry,
            config,
            cache: HashMap::new(),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn registry_mut(&mut self) -> &mut HandleRegistry {
        &mut self.registry
    }

    /// Resolve one edge against the current snapshot. Returns `None` when
    /// either endpoint is missing from the snapshot; the edge is not yet
    /// renderable and the caller should skip drawing it.
    pub fn resolve(
        &mut self,
        snapshot: &DiagramSnapshot,
        edge: &EdgeSpec,
    ) -> Option<Arc<EdgeGeometry>> {
        snapshot.node(&edge.source)?;
        snapshot.node(&edge.target)?;

        if let Some(entry) = self.cache.get(edge)
            && entry.hierarchy_version == snapshot.hierarchy_version
        {
            let stamp = geometry_stamp(snapshot, edge, &entry.relevant);
            if stamp == entry.geometry_stamp {
                return Some(Arc::clone(&entry.geometry));
            }
        }

        let index = NodeIndex::new(&snapshot.nodes);
        let source = index.get(&edge.source)?;
        let target = index.get(&edge.target)?;

        let relevant = match self.cache.get(edge) {
            Some(entry) if entry.hierarchy_version == snapshot.hierarchy_version => {
                entry.relevant.clone()
            }
            _ => {
                let lca = lowest_common_ancestor(&index, source, target);
                relevant_obstacles(&index, snapshot.nodes.values(), source, target, lca)
            }
        };
        let geometry_stamp = geometry_stamp(snapshot, edge, &relevant);

        let source_rect = snapshot.absolute_rect(&edge.source)?;
        let target_rect = snapshot.absolute_rect(&edge.target)?;
        let source_point = resolve_endpoint(
            &self.registry,
            source,
            source_rect,
            edge.source_side,
            edge.source_handle.as_deref(),
            edge.marker_start.as_deref(),
            &self.config,
        );
        let target_point = resolve_endpoint(
            &self.registry,
            target,
            target_rect,
            edge.target_side,
            edge.target_handle.as_deref(),
            edge.marker_end.as_deref(),
            &self.config,
        );

        let obstacles: Vec<Obstacle> = relevant
            .iter()
            .filter_map(|id| {
                let rect = snapshot.absolute_rect(id)?;
                Some(Obstacle {
                    id: id.clone(),
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                })
            })
            .collect();

        let request = RouteRequest {
            source: source_point,
            source_side: edge.source_side,
            target: target_point,
            target_side: edge.target_side,
            source_id: &edge.source,
            target_id: &edge.target,
            obstacles: &obstacles,
        };
        let geometry = match compute_route(&request, &self.config.routing) {
            Some(route) => EdgeGeometry {
                source: source_point,
                target: target_point,
                label: route.label,
                points: route.points,
                svg_path: route.svg_path,
                routed: true,
            },
            None => {
                let fallback = smooth_step_path(
                    source_point,
                    edge.source_side,
                    target_point,
                    edge.target_side,
                    self.config.routing.corner_radius,
                );
                EdgeGeometry {
                    source: source_point,
                    target: target_point,
                    label: fallback.label,
                    points: fallback.points,
                    svg_path: fallback.svg_path,
                    routed: false,
                }
            }
        };

        let geometry = Arc::new(geometry);
        self.cache.insert(
            edge.clone(),
            CacheEntry {
                hierarchy_version: snapshot.hierarchy_version,
                relevant,
                geometry_stamp,
                geometry: Arc::clone(&geometry),
            },
        );
        Some(geometry)
    }

    /// Resolve every declared edge, skipping those with missing endpoints.
    pub fn resolve_all(&mut self, snapshot: &DiagramSnapshot) -> Vec<(EdgeSpec, Arc<EdgeGeometry>)> {
        let edges = snapshot.edges.clone();
        edges
            .into_iter()
            .filter_map(|edge| {
                let geometry = self.resolve(snapshot, &edge)?;
                Some((edge, geometry))
            })
            .collect()
    }
}

/// Obstacle rects and resolved endpoints are absolute, so the stamp covers
/// the relevant subset and every ancestor of both endpoints. Nodes shared
/// between those groups contribute more than once, which is harmless: the
/// stamp only has to change whenever any member changes.
fn geometry_stamp(snapshot: &DiagramSnapshot, edge: &EdgeSpec, relevant: &[String]) -> u64 {
    let subset: u64 = relevant
        .iter()
        .filter_map(|id| snapshot.node(id))
        .map(|node| node.geometry_version)
        .sum();
    let mut ancestors = 0u64;
    for endpoint in [&edge.source, &edge.target] {
        let mut cursor = snapshot
            .node(endpoint)
            .and_then(|node| node.parent.as_deref());
        while let Some(parent_id) = cursor {
            let Some(parent) = snapshot.node(parent_id) else {
                break;
            };
            ancestors = ancestors.wrapping_add(parent.geometry_version);
            cursor = parent.parent.as_deref();
        }
    }
    subset.wrapping_add(ancestors)
}
