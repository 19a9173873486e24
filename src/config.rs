use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Outward nudge of an endpoint so the line visually touches the border.
    pub handle_radius: f32,
    /// Outward nudge when an arrowhead marker occupies the border.
    pub marker_handle_radius: f32,
    /// Snap step for the endpoint coordinate perpendicular to the nudge.
    pub snap_step: f32,
    pub routing: RoutingConfig,
    pub render: RenderConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            handle_radius: 2.0,
            marker_handle_radius: 3.0,
            snap_step: 10.0,
            routing: RoutingConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Routing grid cell size in px.
    pub grid_cell: f32,
    /// Extra space around the obstacle extent covered by the grid.
    pub grid_margin: f32,
    /// Padding added around obstacle bounding boxes.
    pub obstacle_pad: f32,
    /// Search budget for the grid router before giving up.
    pub max_steps: usize,
    /// Cost multiplier for direction changes, in cells.
    pub turn_penalty: f32,
    /// Upper bound on grid cells before the router declines to route.
    pub max_cells: usize,
    /// Corner radius of the emitted SVG path.
    pub corner_radius: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            grid_cell: 10.0,
            grid_margin: 40.0,
            obstacle_pad: 6.0,
            max_steps: 40_000,
            turn_penalty: 3.0,
            max_cells: 250_000,
            corner_radius: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub background: String,
    pub node_fill: String,
    pub node_stroke: String,
    pub container_fill: String,
    pub container_stroke: String,
    pub border_node_fill: String,
    pub edge_stroke: String,
    pub edge_stroke_width: f32,
    pub label_anchor_fill: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: "#FFFFFF".to_string(),
            node_fill: "#ECECFF".to_string(),
            node_stroke: "#9370DB".to_string(),
            container_fill: "#F8F8FC".to_string(),
            container_stroke: "#C7D2E5".to_string(),
            border_node_fill: "#FFE6CC".to_string(),
            edge_stroke: "#333333".to_string(),
            edge_stroke_width: 1.4,
            label_anchor_fill: "#9370DB".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RoutingConfigFile {
    grid_cell: Option<f32>,
    grid_margin: Option<f32>,
    obstacle_pad: Option<f32>,
    max_steps: Option<usize>,
    turn_penalty: Option<f32>,
    max_cells: Option<usize>,
    corner_radius: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    background: Option<String>,
    node_fill: Option<String>,
    node_stroke: Option<String>,
    container_fill: Option<String>,
    container_stroke: Option<String>,
    border_node_fill: Option<String>,
    edge_stroke: Option<String>,
    edge_stroke_width: Option<f32>,
    label_anchor_fill: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    handle_radius: Option<f32>,
    marker_handle_radius: Option<f32>,
    snap_step: Option<f32>,
    routing: Option<RoutingConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<RouterConfig> {
    let Some(path) = path else {
        return Ok(RouterConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = json5::from_str(&contents)?;
    Ok(apply_overrides(RouterConfig::default(), parsed))
}

fn apply_overrides(mut config: RouterConfig, parsed: ConfigFile) -> RouterConfig {
    if let Some(v) = parsed.handle_radius {
        config.handle_radius = v;
    }
    if let Some(v) = parsed.marker_handle_radius {
        config.marker_handle_radius = v;
    }
    if let Some(v) = parsed.snap_step {
        config.snap_step = v;
    }
    if let Some(routing) = parsed.routing {
        if let Some(v) = routing.grid_cell {
            config.routing.grid_cell = v;
        }
        if let Some(v) = routing.grid_margin {
            config.routing.grid_margin = v;
        }
        if let Some(v) = routing.obstacle_pad {
            config.routing.obstacle_pad = v;
        }
        if let Some(v) = routing.max_steps {
            config.routing.max_steps = v;
        }
        if let Some(v) = routing.turn_penalty {
            config.routing.turn_penalty = v;
        }
        if let Some(v) = routing.max_cells {
            config.routing.max_cells = v;
        }
        if let Some(v) = routing.corner_radius {
            config.routing.corner_radius = v;
        }
    }
    if let Some(render) = parsed.render {
        if let Some(v) = render.background {
            config.render.background = v;
        }
        if let Some(v) = render.node_fill {
            config.render.node_fill = v;
        }
        if let Some(v) = render.node_stroke {
            config.render.node_stroke = v;
        }
        if let Some(v) = render.container_fill {
            config.render.container_fill = v;
        }
        if let Some(v) = render.container_stroke {
            config.render.container_stroke = v;
        }
        if let Some(v) = render.border_node_fill {
            config.render.border_node_fill = v;
        }
        if let Some(v) = render.edge_stroke {
            config.render.edge_stroke = v;
        }
        if let Some(v) = render.edge_stroke_width {
            config.render.edge_stroke_width = v;
        }
        if let Some(v) = render.label_anchor_fill {
            config.render.label_anchor_fill = v;
        }
    }
    config
}
