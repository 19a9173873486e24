use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// A declared attachment point on one side of a node. `offset` is a signed
/// distance in px along the side, measured from the side midpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handle {
    pub id: String,
    pub side: Side,
    #[serde(default)]
    pub offset: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub parent: Option<String>,
    pub kind: String,
    /// Relative to the parent's origin when nested, absolute otherwise.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Rendered on the perimeter of its container rather than inside it.
    pub border_node: bool,
    pub handles: Vec<Handle>,
    /// Bumped whenever position or size changes. See `EdgeRouter` memoization.
    pub geometry_version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSpec {
    pub source: String,
    pub target: String,
    pub source_side: Side,
    pub target_side: Side,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
    #[serde(default)]
    pub marker_start: Option<String>,
    #[serde(default)]
    pub marker_end: Option<String>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),
    #[error("node `{node}` references unknown parent `{parent}`")]
    UnknownParent { node: String, parent: String },
    #[error("edge references unknown node `{0}`")]
    UnknownEndpoint(String),
    #[error("parent chain of `{0}` forms a cycle")]
    ParentCycle(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeFile {
    id: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default = "default_kind")]
    kind: String,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    #[serde(default)]
    border_node: bool,
    #[serde(default)]
    handles: Vec<Handle>,
}

fn default_kind() -> String {
    "rectangle".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotFile {
    nodes: Vec<NodeFile>,
    #[serde(default)]
    edges: Vec<EdgeSpec>,
}

/// The current state of the canvas: every node of the containment forest
/// plus the declared edges. Supplied fresh by the diagram-state store; the
/// router only reads it and compares version stamps between calls.
#[derive(Debug, Clone, Default)]
pub struct DiagramSnapshot {
    pub nodes: BTreeMap<String, Node>,
    pub edges: Vec<EdgeSpec>,
    /// Bumped whenever the id/parent structure changes.
    pub hierarchy_version: u64,
}

impl DiagramSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(input: &str) -> Result<Self, SnapshotError> {
        let parsed: SnapshotFile = serde_json::from_str(input)?;
        let mut snapshot = DiagramSnapshot::new();
        for node in parsed.nodes {
            if snapshot.nodes.contains_key(&node.id) {
                return Err(SnapshotError::DuplicateNode(node.id));
            }
            snapshot.nodes.insert(
                node.id.clone(),
                Node {
                    id: node.id,
                    parent: node.parent,
                    kind: node.kind,
                    x: node.x,
                    y: node.y,
                    width: node.width,
                    height: node.height,
                    border_node: node.border_node,
                    handles: node.handles,
                    geometry_version: 0,
                },
            );
        }
        snapshot.validate()?;
        for edge in &parsed.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !snapshot.nodes.contains_key(endpoint) {
                    return Err(SnapshotError::UnknownEndpoint(endpoint.clone()));
                }
            }
        }
        snapshot.edges = parsed.edges;
        Ok(snapshot)
    }

    pub fn from_path(path: &Path) -> Result<Self, SnapshotError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parent references must exist and the parent relation must be a
    /// forest. Everything downstream walks parent links without a cycle
    /// guard, so this is checked once here.
    fn validate(&self) -> Result<(), SnapshotError> {
        for node in self.nodes.values() {
            if let Some(parent) = &node.parent
                && !self.nodes.contains_key(parent)
            {
                return Err(SnapshotError::UnknownParent {
                    node: node.id.clone(),
                    parent: parent.clone(),
                });
            }
        }
        for node in self.nodes.values() {
            let mut hops = 0usize;
            let mut cursor = node;
            while let Some(parent) = &cursor.parent {
                hops += 1;
                if hops > self.nodes.len() {
                    return Err(SnapshotError::ParentCycle(node.id.clone()));
                }
                cursor = &self.nodes[parent];
            }
        }
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
        self.hierarchy_version += 1;
    }

    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let removed = self.nodes.remove(id);
        if removed.is_some() {
            self.hierarchy_version += 1;
        }
        removed
    }

    pub fn set_parent(&mut self, id: &str, parent: Option<String>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = parent;
            self.hierarchy_version += 1;
        }
    }

    pub fn move_node(&mut self, id: &str, x: f32, y: f32) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.x = x;
            node.y = y;
            node.geometry_version += 1;
        }
    }

    pub fn resize_node(&mut self, id: &str, width: f32, height: f32) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.width = width;
            node.height = height;
            node.geometry_version += 1;
        }
    }

    /// Absolute bounding box of a node, accumulating parent offsets.
    pub fn absolute_rect(&self, id: &str) -> Option<Rect> {
        let node = self.nodes.get(id)?;
        let mut x = node.x;
        let mut y = node.y;
        let mut cursor = node;
        while let Some(parent_id) = &cursor.parent {
            let parent = self.nodes.get(parent_id)?;
            x += parent.x;
            y += parent.y;
            cursor = parent;
        }
        Some(Rect::new(x, y, node.width, node.height))
    }
}
