//! Outer boundary tracing and polygon simplification.

use bulk_picker_core::{ComponentLabels, ComponentStats};
use nalgebra::Point2;

/// 8-neighbourhood in clockwise order (image y points down), starting east.
const DIRS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];
const WEST: usize = 4;

fn dir_index(dx: i32, dy: i32) -> Option<usize> {
    DIRS.iter().position(|&d| d == (dx, dy))
}

/// Moore-neighbour trace of one component's outer boundary, clockwise.
///
/// Starts at the component's first pixel in raster order. The returned points
/// are pixel centres; a pixel appears more than once where the boundary
/// passes through it twice (one-pixel-wide necks).
pub fn trace_outer_boundary(labels: &ComponentLabels, comp: &ComponentStats) -> Vec<Point2<i32>> {
    let (w, h) = (labels.width as i32, labels.height as i32);
    let inside = |p: Point2<i32>| {
        p.x >= 0
            && p.y >= 0
            && p.x < w
            && p.y < h
            && labels.label_at(p.x as usize, p.y as usize) == comp.label
    };

    let Some(start_x) = (comp.left..comp.left + comp.width)
        .find(|&x| labels.label_at(x, comp.top) == comp.label)
    else {
        return Vec::new();
    };
    let start = Point2::new(start_x as i32, comp.top as i32);

    let mut contour = vec![start];
    let mut current = start;
    let mut backtrack = WEST;
    let mut first_step: Option<Point2<i32>> = None;
    let limit = 4 * comp.area + 8;

    for _ in 0..limit {
        let mut next = None;
        for i in 1..=8 {
            let d = (backtrack + i) % 8;
            let cand = Point2::new(current.x + DIRS[d].0, current.y + DIRS[d].1);
            if inside(cand) {
                let prev = (backtrack + i - 1) % 8;
                let b = Point2::new(current.x + DIRS[prev].0, current.y + DIRS[prev].1);
                next = Some((cand, b));
                break;
            }
        }
        let Some((cand, b)) = next else {
            // isolated pixel
            return contour;
        };

        if current == start {
            match first_step {
                Some(first) if first == cand => break,
                None => first_step = Some(cand),
                _ => {}
            }
        }

        let Some(new_backtrack) = dir_index(b.x - cand.x, b.y - cand.y) else {
            break;
        };
        backtrack = new_backtrack;
        current = cand;
        contour.push(cand);
    }

    if contour.len() > 1 && contour.last() == Some(&start) {
        contour.pop();
    }
    contour
}

/// Length of the closed polyline.
pub fn closed_perimeter(points: &[Point2<f32>]) -> f32 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| (*b - *a).norm())
        .sum()
}

fn point_line_distance(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    let ab = b - a;
    let len = ab.norm();
    if len <= f32::EPSILON {
        return (p - a).norm();
    }
    (ab.x * (p.y - a.y) - ab.y * (p.x - a.x)).abs() / len
}

/// Open-chain Douglas–Peucker; keeps both endpoints.
fn simplify_chain(points: &[Point2<f32>], epsilon: f32) -> Vec<Point2<f32>> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((lo, hi)) = stack.pop() {
        if hi <= lo + 1 {
            continue;
        }
        let (mut best, mut best_d) = (lo, -1.0f32);
        for (i, p) in points.iter().enumerate().take(hi).skip(lo + 1) {
            let d = point_line_distance(*p, points[lo], points[hi]);
            if d > best_d {
                best = i;
                best_d = d;
            }
        }
        if best_d > epsilon {
            keep[best] = true;
            stack.push((lo, best));
            stack.push((best, hi));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Douglas–Peucker on a closed contour.
///
/// The contour is split at its first point and the point farthest from it,
/// each half is simplified separately and the halves are joined again.
pub fn approx_polygon_closed(points: &[Point2<f32>], epsilon: f32) -> Vec<Point2<f32>> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let first = points[0];
    let far = points
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            (**a - first)
                .norm_squared()
                .total_cmp(&(**b - first).norm_squared())
        })
        .map(|(i, _)| i)
        .unwrap_or(0);
    if far == 0 {
        return vec![first];
    }

    let head = simplify_chain(&points[..=far], epsilon);
    let mut tail_src = points[far..].to_vec();
    tail_src.push(first);
    let tail = simplify_chain(&tail_src, epsilon);

    let mut out = head[..head.len() - 1].to_vec();
    out.extend_from_slice(&tail[..tail.len() - 1]);
    out
}

/// Signed shoelace area; positive for clockwise order in image coordinates.
pub fn signed_area(poly: &[Point2<f32>]) -> f32 {
    0.5 * poly
        .iter()
        .zip(poly.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum::<f32>()
}

/// True when every turn of the closed polygon has the same sign.
pub fn is_convex(poly: &[Point2<f32>]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f32;
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        let c = poly[(i + 2) % n];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross.abs() <= f32::EPSILON {
            return false;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}
