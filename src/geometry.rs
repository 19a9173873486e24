use serde::{Deserialize, Serialize};

use crate::snapshot::Side;

/// Length of the straight stub leaving a node before the first bend in the
/// smooth-step fallback path.
const SMOOTH_STEP_STUB: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    pub fn expand(&self, pad: f32) -> Rect {
        Rect::new(
            self.x - pad,
            self.y - pad,
            self.width + pad * 2.0,
            self.height + pad * 2.0,
        )
    }
}

pub fn round_to_nearest(value: f32, step: f32) -> f32 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

/// Drop duplicate and collinear interior points from an orthogonal polyline.
pub fn compress_path(points: &[Point]) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    out.push(points[0]);
    for idx in 1..points.len() - 1 {
        let prev = out[out.len() - 1];
        let curr = points[idx];
        if (curr.x - prev.x).abs() <= 1e-4 && (curr.y - prev.y).abs() <= 1e-4 {
            continue;
        }
        let next = points[idx + 1];
        let dx1 = curr.x - prev.x;
        let dy1 = curr.y - prev.y;
        let dx2 = next.x - curr.x;
        let dy2 = next.y - curr.y;
        if (dx1.abs() <= 1e-4 && dx2.abs() <= 1e-4) || (dy1.abs() <= 1e-4 && dy2.abs() <= 1e-4) {
            continue;
        }
        out.push(curr);
    }
    let last = points[points.len() - 1];
    let tail = out[out.len() - 1];
    if (last.x - tail.x).abs() > 1e-4 || (last.y - tail.y).abs() > 1e-4 {
        out.push(last);
    }
    out
}

pub fn path_length(points: &[Point]) -> f32 {
    points
        .windows(2)
        .map(|seg| {
            let dx = seg[1].x - seg[0].x;
            let dy = seg[1].y - seg[0].y;
            (dx * dx + dy * dy).sqrt()
        })
        .sum()
}

/// Point halfway along the polyline by arc length.
pub fn path_midpoint(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::new(0.0, 0.0);
    }
    if points.len() == 1 {
        return points[0];
    }
    let half = path_length(points) / 2.0;
    let mut walked = 0.0;
    for seg in points.windows(2) {
        let dx = seg[1].x - seg[0].x;
        let dy = seg[1].y - seg[0].y;
        let len = (dx * dx + dy * dy).sqrt();
        if walked + len >= half && len > 1e-6 {
            let t = (half - walked) / len;
            return Point::new(seg[0].x + dx * t, seg[0].y + dy * t);
        }
        walked += len;
    }
    points[points.len() - 1]
}

/// Render an orthogonal polyline as an SVG path with quarter-arc corners.
/// The corner radius shrinks to fit short segments.
pub fn points_to_path(points: &[Point], corner_radius: f32) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].x, points[0].y));
    if corner_radius <= 0.0 || points.len() < 3 {
        for point in points.iter().skip(1) {
            d.push_str(&format!(" L {:.2} {:.2}", point.x, point.y));
        }
        return d;
    }
    for idx in 1..points.len() - 1 {
        let prev = points[idx - 1];
        let curr = points[idx];
        let next = points[idx + 1];
        let len_in = ((curr.x - prev.x).abs() + (curr.y - prev.y).abs()).max(1e-6);
        let len_out = ((next.x - curr.x).abs() + (next.y - curr.y).abs()).max(1e-6);
        let radius = corner_radius.min(len_in / 2.0).min(len_out / 2.0);
        let in_dir = ((curr.x - prev.x).signum(), (curr.y - prev.y).signum());
        let out_dir = ((next.x - curr.x).signum(), (next.y - curr.y).signum());
        let arc_start = Point::new(curr.x - in_dir.0 * radius, curr.y - in_dir.1 * radius);
        let arc_end = Point::new(curr.x + out_dir.0 * radius, curr.y + out_dir.1 * radius);
        d.push_str(&format!(" L {:.2} {:.2}", arc_start.x, arc_start.y));
        d.push_str(&format!(
            " Q {:.2} {:.2} {:.2} {:.2}",
            curr.x, curr.y, arc_end.x, arc_end.y
        ));
    }
    let last = points[points.len() - 1];
    d.push_str(&format!(" L {:.2} {:.2}", last.x, last.y));
    d
}

fn stub_out(point: Point, side: Side, length: f32) -> Point {
    match side {
        Side::Left => Point::new(point.x - length, point.y),
        Side::Right => Point::new(point.x + length, point.y),
        Side::Top => Point::new(point.x, point.y - length),
        Side::Bottom => Point::new(point.x, point.y + length),
    }
}

#[derive(Debug, Clone)]
pub struct SmoothStepPath {
    pub points: Vec<Point>,
    pub svg_path: String,
    pub label: Point,
}

/// Unobstructed stepped path straight between the two endpoints. Pure
/// geometric formula; cannot fail. The label anchor is the average of the
/// two endpoints.
pub fn smooth_step_path(
    source: Point,
    source_side: Side,
    target: Point,
    target_side: Side,
    corner_radius: f32,
) -> SmoothStepPath {
    let source_stub = stub_out(source, source_side, SMOOTH_STEP_STUB);
    let target_stub = stub_out(target, target_side, SMOOTH_STEP_STUB);

    let mut points = vec![source, source_stub];
    match (source_side, target_side) {
        (Side::Left | Side::Right, Side::Left | Side::Right) => {
            let mid_x = (source_stub.x + target_stub.x) / 2.0;
            points.push(Point::new(mid_x, source_stub.y));
            points.push(Point::new(mid_x, target_stub.y));
        }
        (Side::Top | Side::Bottom, Side::Top | Side::Bottom) => {
            let mid_y = (source_stub.y + target_stub.y) / 2.0;
            points.push(Point::new(source_stub.x, mid_y));
            points.push(Point::new(target_stub.x, mid_y));
        }
        (Side::Left | Side::Right, Side::Top | Side::Bottom) => {
            points.push(Point::new(target_stub.x, source_stub.y));
        }
        (Side::Top | Side::Bottom, Side::Left | Side::Right) => {
            points.push(Point::new(source_stub.x, target_stub.y));
        }
    }
    points.push(target_stub);
    points.push(target);

    let points = compress_path(&points);
    let svg_path = points_to_path(&points, corner_radius);
    let label = Point::new((source.x + target.x) / 2.0, (source.y + target.y) / 2.0);
    SmoothStepPath {
        points,
        svg_path,
        label,
    }
}
