//! Additional 2D math helpers layered on top of `glam`.

use glam::Vec2;

/// Tolerance used by geometric predicates.
pub const EPSILON: f32 = 1e-6;

/// 2D cross product of two vectors (z component of the 3D cross).
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Cross product of a scalar (angular velocity about z) and a vector: `w × r`.
pub fn cross_scalar_vec(w: f32, r: Vec2) -> Vec2 {
    Vec2::new(-w * r.y, w * r.x)
}

/// Right-hand perpendicular, `(y, -x)`. Outward normal of a CCW edge direction.
pub fn right_perp(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

/// Signed area of a closed loop; positive for counter-clockwise winding.
pub fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    let mut twice_area = 0.0;
    for i in 0..n {
        twice_area += cross(points[i], points[(i + 1) % n]);
    }
    twice_area * 0.5
}

/// Area-weighted centroid of a closed loop. Falls back to the vertex mean for degenerate loops.
pub fn centroid(points: &[Vec2]) -> Vec2 {
    let area = signed_area(points);
    if area.abs() <= EPSILON {
        if points.is_empty() {
            return Vec2::ZERO;
        }
        return points.iter().copied().sum::<Vec2>() / points.len() as f32;
    }
    let n = points.len();
    let mut c = Vec2::ZERO;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        c += (a + b) * cross(a, b);
    }
    c / (6.0 * area)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ccw_square_has_positive_area_and_centered_centroid() {
        let square = [
            Vec2::new(1.0, 1.0),
            Vec2::new(3.0, 1.0),
            Vec2::new(3.0, 3.0),
            Vec2::new(1.0, 3.0),
        ];
        assert!((signed_area(&square) - 4.0).abs() < 1e-6);
        assert!((centroid(&square) - Vec2::new(2.0, 2.0)).length() < 1e-6);
    }

    #[test]
    fn cross_scalar_matches_3d_cross() {
        // (0,0,w) x (rx,ry,0) = (-w*ry, w*rx, 0)
        let v = cross_scalar_vec(2.0, Vec2::new(1.0, 0.0));
        assert_eq!(v, Vec2::new(0.0, 2.0));
    }
}
