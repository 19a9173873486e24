pub mod ancestry;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod geometry;
pub mod handles;
pub mod render;
pub mod resolver;
pub mod routing;
pub mod scope;
pub mod snapshot;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{RouterConfig, RoutingConfig, load_config};
pub use geometry::{Point, Rect, smooth_step_path};
pub use handles::{HandleFn, HandleRegistry, resolve_endpoint};
pub use render::render_svg;
pub use resolver::{EdgeGeometry, EdgeRouter};
pub use routing::{Obstacle, RouteRequest, SmartRoute, compute_route};
pub use snapshot::{DiagramSnapshot, EdgeSpec, Handle, Node, Side, SnapshotError};
