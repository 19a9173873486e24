use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::config::RoutingConfig;
use crate::geometry::{Point, compress_path, path_midpoint, points_to_path};
use crate::snapshot::Side;

/// Integer cost multiplier so the search can use u32 costs with fractional
/// cell sizes.
const ASTAR_COST_SCALE: f32 = 1000.0;
/// Minimum routing cell size.
const ROUTING_CELL_MIN: f32 = 4.0;

/// Absolute bounding box the router must keep the path out of.
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Obstacle {
    fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// A successfully routed edge: the stepped polyline, its SVG rendering, and
/// the label anchor at the arc-length midpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartRoute {
    pub points: Vec<Point>,
    pub svg_path: String,
    pub label: Point,
}

#[derive(Debug, Clone)]
pub struct RouteRequest<'a> {
    pub source: Point,
    pub source_side: Side,
    pub target: Point,
    pub target_side: Side,
    pub source_id: &'a str,
    pub target_id: &'a str,
    pub obstacles: &'a [Obstacle],
}

#[derive(Debug)]
struct RoutingGrid {
    cell: f32,
    min_x: f32,
    min_y: f32,
    cols: i32,
    rows: i32,
    cell_obstacles: Vec<Vec<usize>>,
}

impl RoutingGrid {
    fn new(obstacles: &[Obstacle], cell: f32, margin: f32, max_cells: usize) -> Option<Self> {
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        for obs in obstacles {
            min_x = min_x.min(obs.x);
            min_y = min_y.min(obs.y);
            max_x = max_x.max(obs.x + obs.width);
            max_y = max_y.max(obs.y + obs.height);
        }
        if min_x == f32::MAX {
            return None;
        }
        min_x -= margin;
        min_y -= margin;
        max_x += margin;
        max_y += margin;
        let cell = cell.max(ROUTING_CELL_MIN);
        let cols = ((max_x - min_x) / cell).ceil() as i32 + 1;
        let rows = ((max_y - min_y) / cell).ceil() as i32 + 1;
        if cols <= 1 || rows <= 1 {
            return None;
        }
        let total_cells = (cols as usize).saturating_mul(rows as usize);
        if total_cells > max_cells {
            return None;
        }
        let mut cell_obstacles = vec![Vec::new(); (cols * rows) as usize];
        for (idx, obs) in obstacles.iter().enumerate() {
            let start_x = ((obs.x - min_x) / cell).floor().max(0.0) as i32;
            let end_x = ((obs.x + obs.width - min_x) / cell)
                .floor()
                .min((cols - 1) as f32) as i32;
            let start_y = ((obs.y - min_y) / cell).floor().max(0.0) as i32;
            let end_y = ((obs.y + obs.height - min_y) / cell)
                .floor()
                .min((rows - 1) as f32) as i32;
            for iy in start_y..=end_y {
                for ix in start_x..=end_x {
                    let cell_idx = (iy * cols + ix) as usize;
                    cell_obstacles[cell_idx].push(idx);
                }
            }
        }
        Some(Self {
            cell,
            min_x,
            min_y,
            cols,
            rows,
            cell_obstacles,
        })
    }

    fn index(&self, ix: i32, iy: i32) -> usize {
        (iy * self.cols + ix) as usize
    }

    fn cell_for_point(&self, point: Point) -> Option<(i32, i32)> {
        let ix = ((point.x - self.min_x) / self.cell).floor() as i32;
        let iy = ((point.y - self.min_y) / self.cell).floor() as i32;
        if ix < 0 || iy < 0 || ix >= self.cols || iy >= self.rows {
            return None;
        }
        Some((ix, iy))
    }

    fn cell_center(&self, ix: i32, iy: i32) -> Point {
        Point::new(
            self.min_x + (ix as f32 + 0.5) * self.cell,
            self.min_y + (iy as f32 + 0.5) * self.cell,
        )
    }

    fn cell_obstacle_indices(&self, ix: i32, iy: i32) -> &[usize] {
        &self.cell_obstacles[self.index(ix, iy)]
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct GridState {
    x: i32,
    y: i32,
    dir: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct GridEntry {
    est: u32,
    cost: u32,
    state: GridState,
}

impl Ord for GridEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .est
            .cmp(&self.est)
            .then_with(|| other.cost.cmp(&self.cost))
            .then_with(|| self.state.y.cmp(&other.state.y))
            .then_with(|| self.state.x.cmp(&other.state.x))
            .then_with(|| self.state.dir.cmp(&other.state.dir))
    }
}

impl PartialOrd for GridEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The edge's own endpoint boxes never block: the path has to leave and
/// enter them at the resolved border points.
fn cell_blocked(grid: &RoutingGrid, request: &RouteRequest<'_>, ix: i32, iy: i32) -> bool {
    let center = grid.cell_center(ix, iy);
    for &obs_idx in grid.cell_obstacle_indices(ix, iy) {
        let obstacle = &request.obstacles[obs_idx];
        if obstacle.id == request.source_id || obstacle.id == request.target_id {
            continue;
        }
        if obstacle.contains(center.x, center.y) {
            return true;
        }
    }
    false
}

/// Orthogonal obstacle-avoiding route with the fewest-bend preference, or
/// `None` when no valid route exists within the search limits. Callers fall
/// back to `geometry::smooth_step_path` on `None`.
pub fn compute_route(request: &RouteRequest<'_>, config: &RoutingConfig) -> Option<SmartRoute> {
    let padded: Vec<Obstacle> = request
        .obstacles
        .iter()
        .map(|obs| Obstacle {
            id: obs.id.clone(),
            x: obs.x - config.obstacle_pad,
            y: obs.y - config.obstacle_pad,
            width: obs.width + config.obstacle_pad * 2.0,
            height: obs.height + config.obstacle_pad * 2.0,
        })
        .collect();
    let padded_request = RouteRequest {
        obstacles: &padded,
        ..*request
    };
    let grid = RoutingGrid::new(
        &padded,
        config.grid_cell,
        config.grid_margin,
        config.max_cells,
    )?;

    let (start_ix, start_iy) = grid.cell_for_point(request.source)?;
    let (end_ix, end_iy) = grid.cell_for_point(request.target)?;
    if start_ix == end_ix && start_iy == end_iy {
        let points = vec![request.source, request.target];
        return Some(finish_route(points, config));
    }

    let dirs: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
    let step_cost = (grid.cell * ASTAR_COST_SCALE).round() as u32;
    let turn_penalty = (config.turn_penalty * grid.cell * ASTAR_COST_SCALE).round() as u32;
    let max_steps = config.max_steps.max(1_000);

    let cols = grid.cols;
    let rows = grid.rows;
    let states = (cols * rows * 4) as usize;
    let mut best_cost = vec![u32::MAX; states];
    let mut prev: Vec<Option<GridState>> = vec![None; states];
    let mut heap = BinaryHeap::new();

    for dir in 0..4u8 {
        let idx = ((start_iy * cols + start_ix) as usize) * 4 + dir as usize;
        best_cost[idx] = 0;
        heap.push(GridEntry {
            est: 0,
            cost: 0,
            state: GridState {
                x: start_ix,
                y: start_iy,
                dir,
            },
        });
    }

    let mut end_state: Option<GridState> = None;
    let mut steps = 0usize;

    while let Some(entry) = heap.pop() {
        steps += 1;
        if steps > max_steps {
            break;
        }
        let GridEntry { cost, state, .. } = entry;
        let state_idx = ((state.y * cols + state.x) as usize) * 4 + state.dir as usize;
        if cost != best_cost[state_idx] {
            continue;
        }
        if state.x == end_ix && state.y == end_iy {
            end_state = Some(state);
            break;
        }
        for (dir_idx, (dx, dy)) in dirs.iter().enumerate() {
            let nx = state.x + dx;
            let ny = state.y + dy;
            if nx < 0 || ny < 0 || nx >= cols || ny >= rows {
                continue;
            }
            if (nx != end_ix || ny != end_iy)
                && (nx != start_ix || ny != start_iy)
                && cell_blocked(&grid, &padded_request, nx, ny)
            {
                continue;
            }
            let mut next_cost = cost.saturating_add(step_cost);
            if state.dir != dir_idx as u8 {
                next_cost = next_cost.saturating_add(turn_penalty);
            }
            let next_idx = ((ny * cols + nx) as usize) * 4 + dir_idx;
            if next_cost >= best_cost[next_idx] {
                continue;
            }
            best_cost[next_idx] = next_cost;
            prev[next_idx] = Some(state);
            let manhattan = (nx - end_ix).unsigned_abs() + (ny - end_iy).unsigned_abs();
            let est = next_cost.saturating_add(manhattan.saturating_mul(step_cost));
            heap.push(GridEntry {
                est,
                cost: next_cost,
                state: GridState {
                    x: nx,
                    y: ny,
                    dir: dir_idx as u8,
                },
            });
        }
    }

    let end_state = end_state?;
    let mut cells: Vec<(i32, i32)> = Vec::new();
    let mut cur = end_state;
    loop {
        cells.push((cur.x, cur.y));
        let cur_idx = ((cur.y * cols + cur.x) as usize) * 4 + cur.dir as usize;
        if let Some(prev_state) = prev[cur_idx] {
            cur = prev_state;
        } else {
            break;
        }
    }
    cells.reverse();
    if cells.is_empty() {
        return None;
    }

    let mut points: Vec<Point> = Vec::with_capacity(cells.len() + 4);
    points.push(request.source);
    if let Some(&(ix, iy)) = cells.first() {
        let center = grid.cell_center(ix, iy);
        match request.source_side {
            Side::Left | Side::Right => points.push(Point::new(center.x, request.source.y)),
            Side::Top | Side::Bottom => points.push(Point::new(request.source.x, center.y)),
        }
        points.push(center);
    }
    for &(ix, iy) in cells.iter().skip(1) {
        points.push(grid.cell_center(ix, iy));
    }
    if let Some(&(ix, iy)) = cells.last() {
        let center = grid.cell_center(ix, iy);
        match request.target_side {
            Side::Left | Side::Right => points.push(Point::new(center.x, request.target.y)),
            Side::Top | Side::Bottom => points.push(Point::new(request.target.x, center.y)),
        }
    }
    points.push(request.target);
    Some(finish_route(points, config))
}

fn finish_route(points: Vec<Point>, config: &RoutingConfig) -> SmartRoute {
    let points = compress_path(&points);
    let svg_path = points_to_path(&points, config.corner_radius);
    let label = path_midpoint(&points);
    SmartRoute {
        points,
        svg_path,
        label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obstacle(id: &str, x: f32, y: f32, w: f32, h: f32) -> Obstacle {
        Obstacle {
            id: id.to_string(),
            x,
            y,
            width: w,
            height: h,
        }
    }

    fn side_by_side_request<'a>(obstacles: &'a [Obstacle]) -> RouteRequest<'a> {
        RouteRequest {
            source: Point::new(52.0, 30.0),
            source_side: Side::Right,
            target: Point::new(248.0, 30.0),
            target_side: Side::Left,
            source_id: "a",
            target_id: "b",
            obstacles,
        }
    }

    #[test]
    fn routes_between_unobstructed_nodes() {
        let obstacles = vec![
            obstacle("a", 0.0, 0.0, 50.0, 60.0),
            obstacle("b", 250.0, 0.0, 50.0, 60.0),
        ];
        let request = side_by_side_request(&obstacles);
        let route = compute_route(&request, &RoutingConfig::default()).expect("route expected");
        assert_eq!(route.points[0], request.source);
        assert_eq!(route.points[route.points.len() - 1], request.target);
        assert!(!route.svg_path.is_empty());
    }

    #[test]
    fn detours_around_a_blocking_node() {
        let obstacles = vec![
            obstacle("a", 0.0, 0.0, 50.0, 60.0),
            obstacle("b", 250.0, 0.0, 50.0, 60.0),
            obstacle("wall", 120.0, -40.0, 40.0, 140.0),
        ];
        let request = side_by_side_request(&obstacles);
        let config = RoutingConfig::default();
        let route = compute_route(&request, &config).expect("route expected");
        // No interior point may sit inside the padded wall.
        let wall = obstacle("wall", 120.0, -40.0, 40.0, 140.0);
        for point in &route.points[1..route.points.len() - 1] {
            assert!(
                !wall.contains(point.x, point.y),
                "point {:?} crosses the wall",
                point
            );
        }
        // The detour has to bend.
        assert!(route.points.len() > 2);
    }

    #[test]
    fn enclosed_target_yields_no_route() {
        let obstacles = vec![
            obstacle("a", 0.0, 0.0, 50.0, 60.0),
            obstacle("b", 250.0, 0.0, 50.0, 60.0),
            obstacle("ring", 200.0, -60.0, 160.0, 200.0),
        ];
        let request = side_by_side_request(&obstacles);
        assert!(compute_route(&request, &RoutingConfig::default()).is_none());
    }

    #[test]
    fn no_obstacles_means_no_grid() {
        let request = RouteRequest {
            source: Point::new(0.0, 0.0),
            source_side: Side::Right,
            target: Point::new(100.0, 0.0),
            target_side: Side::Left,
            source_id: "a",
            target_id: "b",
            obstacles: &[],
        };
        assert!(compute_route(&request, &RoutingConfig::default()).is_none());
    }

    #[test]
    fn label_sits_on_the_path() {
        let obstacles = vec![
            obstacle("a", 0.0, 0.0, 50.0, 60.0),
            obstacle("b", 250.0, 0.0, 50.0, 60.0),
        ];
        let request = side_by_side_request(&obstacles);
        let route = compute_route(&request, &RoutingConfig::default()).expect("route expected");
        let on_some_segment = route.points.windows(2).any(|seg| {
            let min_x = seg[0].x.min(seg[1].x) - 1.0;
            let max_x = seg[0].x.max(seg[1].x) + 1.0;
            let min_y = seg[0].y.min(seg[1].y) - 1.0;
            let max_y = seg[0].y.max(seg[1].y) + 1.0;
            route.label.x >= min_x
                && route.label.x <= max_x
                && route.label.y >= min_y
                && route.label.y <= max_y
        });
        assert!(on_some_segment);
    }
}
