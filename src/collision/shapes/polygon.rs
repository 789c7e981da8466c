use glam::Vec2;

use super::composite::CompositeCollider;
use crate::{
    collision::{closest, queries::RayCastHit},
    core::{
        bounds::BoundingBox,
        collider::{Collider, ColliderBase},
        projection::Projection,
        ray::Ray,
        segment::LineSegment,
        types::Transform,
    },
    debug::{DebugColor, DebugDraw},
    error::GeometryError,
    utils::math::{centroid, cross, signed_area, EPSILON},
};

/// Convex polygon with a counter-clockwise vertex loop.
///
/// Side `i` runs from vertex `i` to vertex `i + 1`; its outward normal is the
/// separating axis candidate `i`.
#[derive(Debug, Clone)]
pub struct PolygonCollider {
    pub(crate) base: ColliderBase,
    points: Vec<Vec2>,
    world_points: Vec<Vec2>,
    world_sides: Vec<LineSegment>,
    world_axes: Vec<Vec2>,
    world_bounds: BoundingBox,
}

impl PolygonCollider {
    /// Validates and winds `points` counter-clockwise.
    pub fn new(points: impl Into<Vec<Vec2>>) -> Result<Self, GeometryError> {
        let mut points = points.into();
        validate_loop(&points)?;
        if signed_area(&points) < 0.0 {
            points.reverse();
        }
        if let Some(index) = first_reflex_vertex(&points) {
            return Err(GeometryError::NotConvex { index });
        }

        let mut polygon = Self {
            base: ColliderBase::default(),
            world_points: points.clone(),
            points,
            world_sides: Vec::new(),
            world_axes: Vec::new(),
            world_bounds: BoundingBox::empty(),
        };
        polygon.recompute_world(&Transform::default());
        polygon.base.transform = None;
        Ok(polygon)
    }

    /// Axis-aligned box centered on the origin.
    pub fn rect(width: f32, height: f32) -> Result<Self, GeometryError> {
        let half = Vec2::new(width, height) * 0.5;
        Self::new(vec![
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ])
    }

    /// Splits a simple (possibly concave) loop into triangles by ear clipping.
    pub fn triangulate(points: &[Vec2]) -> Result<CompositeCollider, GeometryError> {
        validate_loop(points)?;
        let mut ring: Vec<Vec2> = points.to_vec();
        if signed_area(&ring) < 0.0 {
            ring.reverse();
        }

        let mut triangles: Vec<Collider> = Vec::with_capacity(ring.len().saturating_sub(2));
        while ring.len() > 3 {
            let ear = (0..ring.len()).find(|&i| is_ear(&ring, i));
            let Some(i) = ear else {
                return Err(GeometryError::TriangulationFailed);
            };
            let n = ring.len();
            let triangle = vec![ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]];
            triangles.push(PolygonCollider::new(triangle)?.into());
            ring.remove(i);
        }
        triangles.push(PolygonCollider::new(ring)?.into());
        CompositeCollider::new(triangles)
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.base.offset = offset;
        self
    }

    /// Local vertices, counter-clockwise, without the offset.
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn world_points(&self) -> &[Vec2] {
        &self.world_points
    }

    pub fn sides(&self) -> &[LineSegment] {
        &self.world_sides
    }

    /// Sides in the owner's local space, offset included.
    pub fn local_sides(&self) -> Vec<LineSegment> {
        let offset = self.base.total_offset();
        let n = self.points.len();
        (0..n)
            .map(|i| LineSegment::new(self.points[i] + offset, self.points[(i + 1) % n] + offset))
            .collect()
    }

    /// World-space outward side normals.
    pub fn axes(&self) -> &[Vec2] {
        &self.world_axes
    }

    pub fn update(&mut self, transform: &Transform) {
        self.recompute_world(transform);
    }

    pub fn bounds(&self) -> BoundingBox {
        self.world_bounds
    }

    pub fn local_bounds(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points).translate(self.base.total_offset())
    }

    /// Area centroid of the world polygon.
    pub fn center(&self) -> Vec2 {
        centroid(&self.world_points)
    }

    pub fn furthest_point(&self, direction: Vec2) -> Vec2 {
        self.world_points[self.furthest_index(direction)]
    }

    pub(crate) fn furthest_index(&self, direction: Vec2) -> usize {
        let mut best = 0;
        let mut best_dot = f32::NEG_INFINITY;
        for (i, point) in self.world_points.iter().enumerate() {
            let d = point.dot(direction);
            if d > best_dot {
                best_dot = d;
                best = i;
            }
        }
        best
    }

    /// Side whose normal is most aligned with `direction`.
    pub fn closest_face(&self, direction: Vec2) -> (usize, LineSegment) {
        let mut best = 0;
        let mut best_dot = f32::NEG_INFINITY;
        for (i, axis) in self.world_axes.iter().enumerate() {
            let d = axis.dot(direction);
            if d > best_dot {
                best_dot = d;
                best = i;
            }
        }
        (best, self.world_sides[best])
    }

    /// Moment of inertia about the owner's origin for a uniform density.
    pub fn inertia(&self, mass: f32) -> f32 {
        let offset = self.base.total_offset();
        let n = self.points.len();
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for i in 0..n {
            let a = self.points[i] + offset;
            let b = self.points[(i + 1) % n] + offset;
            let c = cross(a, b).abs();
            numerator += c * (a.dot(a) + a.dot(b) + b.dot(b));
            denominator += c;
        }
        if denominator <= EPSILON {
            return mass;
        }
        mass / 6.0 * (numerator / denominator)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.world_sides.iter().all(|side| side.below(point))
    }

    /// Nearest side crossed by the ray. Rays starting inside the polygon miss.
    pub fn ray_cast(&self, ray: &Ray, max_distance: f32) -> Option<RayCastHit> {
        if self.contains(ray.origin) {
            return None;
        }
        let (index, distance) = self
            .world_sides
            .iter()
            .enumerate()
            .filter_map(|(i, side)| side.intersect_ray(ray).map(|t| (i, t)))
            .filter(|&(_, t)| t <= max_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        Some(RayCastHit {
            collider: self.base.id,
            body: self.base.owner,
            point: ray.point_at(distance),
            normal: self.world_axes[index],
            distance,
        })
    }

    pub fn project(&self, axis: Vec2) -> Projection {
        let (min, max) = self
            .world_points
            .iter()
            .map(|p| p.dot(axis))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| {
                (lo.min(d), hi.max(d))
            });
        Projection::new(min, max)
    }

    /// Shortest segment from this polygon's boundary to `other`'s surface.
    pub fn closest_line_between(&self, other: &Collider) -> LineSegment {
        match other {
            Collider::Circle(circle) => closest::polygon_circle(self, circle),
            Collider::Polygon(polygon) => closest::polygon_polygon(self, polygon),
            Collider::Composite(composite) => closest::shortest(
                composite
                    .colliders()
                    .iter()
                    .map(|child| self.closest_line_between(child)),
            )
            .unwrap_or_else(|| LineSegment::new(self.center(), composite.center())),
        }
    }

    pub fn debug(&self, draw: &mut dyn DebugDraw, color: DebugColor) {
        for side in &self.world_sides {
            draw.draw_line(side.begin, side.end, color);
        }
    }

    fn recompute_world(&mut self, transform: &Transform) {
        let offset = self.base.total_offset();
        self.world_points.clear();
        self.world_points
            .extend(self.points.iter().map(|&p| transform.apply(p + offset)));
        // A mirrored transform flips the winding; restore counter-clockwise order.
        if transform.scale.x * transform.scale.y < 0.0 {
            self.world_points.reverse();
        }

        let n = self.world_points.len();
        self.world_sides.clear();
        self.world_axes.clear();
        for i in 0..n {
            let side = LineSegment::new(self.world_points[i], self.world_points[(i + 1) % n]);
            self.world_axes.push(side.normal());
            self.world_sides.push(side);
        }
        self.world_bounds = BoundingBox::from_points(&self.world_points);
        self.base.transform = Some(*transform);
    }
}

fn validate_loop(points: &[Vec2]) -> Result<(), GeometryError> {
    if points.len() < 3 {
        return Err(GeometryError::TooFewPoints(points.len()));
    }
    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(GeometryError::NonFinitePoint { index });
    }
    let n = points.len();
    for i in 0..n {
        if points[i].distance_squared(points[(i + 1) % n]) <= EPSILON * EPSILON {
            return Err(GeometryError::ZeroLengthEdge { index: i });
        }
    }
    if signed_area(points).abs() <= EPSILON {
        return Err(GeometryError::ZeroArea);
    }
    Ok(())
}

/// First vertex where a counter-clockwise loop turns clockwise.
fn first_reflex_vertex(points: &[Vec2]) -> Option<usize> {
    let n = points.len();
    (0..n).find(|&i| {
        let prev = points[(i + n - 1) % n];
        let next = points[(i + 1) % n];
        cross(points[i] - prev, next - points[i]) < -EPSILON
    })
}

fn is_ear(ring: &[Vec2], i: usize) -> bool {
    let n = ring.len();
    let (a, b, c) = (ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]);
    if cross(b - a, c - b) <= EPSILON {
        return false;
    }
    ring.iter()
        .enumerate()
        .filter(|&(j, _)| j != i && j != (i + n - 1) % n && j != (i + 1) % n)
        .all(|(_, &p)| !point_in_triangle(p, a, b, c))
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = cross(b - a, p - a);
    let d2 = cross(c - b, p - b);
    let d3 = cross(a - c, p - c);
    d1 >= 0.0 && d2 >= 0.0 && d3 >= 0.0
}
