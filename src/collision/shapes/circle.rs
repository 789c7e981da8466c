use glam::Vec2;

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
};

#[derive(Debug, Clone)]
pub struct CircleCollider {
    pub(crate) base: ColliderBase,
    radius: f32,
}

impl CircleCollider {
    pub fn new(radius: f32) -> Result<Self, GeometryError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(GeometryError::InvalidRadius(radius));
        }
        Ok(Self {
            base: ColliderBase::default(),
            radius,
        })
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.base.offset = offset;
        self
    }

    /// Radius before scaling.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Radius scaled by the largest component of the current scale.
    pub fn world_radius(&self) -> f32 {
        self.radius * self.base.transform().scale.abs().max_element()
    }

    pub fn world_center(&self) -> Vec2 {
        self.base.to_world(Vec2::ZERO)
    }

    pub fn update(&mut self, transform: &Transform) {
        self.base.transform = Some(*transform);
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_center_half_extents(self.world_center(), Vec2::splat(self.world_radius()))
    }

    pub fn local_bounds(&self) -> BoundingBox {
        BoundingBox::from_center_half_extents(self.base.total_offset(), Vec2::splat(self.radius))
    }

    pub fn furthest_point(&self, direction: Vec2) -> Vec2 {
        self.world_center() + direction.normalize_or_zero() * self.world_radius()
    }

    /// Solid disc about its center, shifted to the owner's origin.
    pub fn inertia(&self, mass: f32) -> f32 {
        mass * self.radius * self.radius * 0.5 + mass * self.base.total_offset().length_squared()
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.world_center().distance_squared(point) <= self.world_radius() * self.world_radius()
    }

    /// Nearest entry point along the ray. Rays starting inside the circle miss.
    pub fn ray_cast(&self, ray: &Ray, max_distance: f32) -> Option<RayCastHit> {
        let center = self.world_center();
        let radius = self.world_radius();
        let oc = ray.origin - center;
        let b = oc.dot(ray.direction);
        let c = oc.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let t = -b - discriminant.sqrt();
        if t < 0.0 || t > max_distance {
            return None;
        }
        let point = ray.point_at(t);
        Some(RayCastHit {
            collider: self.base.id,
            body: self.base.owner,
            point,
            normal: (point - center).normalize_or_zero(),
            distance: t,
        })
    }

    pub fn project(&self, axis: Vec2) -> Projection {
        let center = self.world_center().dot(axis);
        let radius = self.world_radius();
        Projection::new(center - radius, center + radius)
    }

    /// Shortest segment from this circle's surface to `other`'s.
    pub fn closest_line_between(&self, other: &Collider) -> LineSegment {
        match other {
            Collider::Circle(circle) => closest::circle_circle(self, circle),
            Collider::Polygon(polygon) => closest::circle_polygon(self, polygon),
            Collider::Composite(composite) => closest::shortest(
                composite
                    .colliders()
                    .iter()
                    .map(|child| self.closest_line_between(child)),
            )
            .unwrap_or_else(|| LineSegment::new(self.world_center(), composite.center())),
        }
    }

    pub fn debug(&self, draw: &mut dyn DebugDraw, color: DebugColor) {
        let center = self.world_center();
        draw.draw_circle(center, self.world_radius(), color);
        let spoke = Vec2::from_angle(self.base.transform().rotation) * self.world_radius();
        draw.draw_line(center, center + spoke, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::shapes::PolygonCollider;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_bad_radius() {
        assert!(CircleCollider::new(0.0).is_err());
        assert!(CircleCollider::new(f32::NAN).is_err());
    }

    #[test]
    fn ray_hits_front_of_circle() {
        let mut circle = CircleCollider::new(1.0).expect("radius");
        circle.update(&Transform::from_position(Vec2::new(5.0, 0.0)));
        let hit = circle
            .ray_cast(&Ray::new(Vec2::ZERO, Vec2::X), 100.0)
            .expect("ray points at circle");
        assert_relative_eq!(hit.distance, 4.0, epsilon = 1e-5);
        assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-5);
        assert!(circle.ray_cast(&Ray::new(Vec2::ZERO, Vec2::X), 3.0).is_none());
    }

    #[test]
    fn closest_line_joins_facing_surfaces() {
        let mut a = CircleCollider::new(1.0).expect("radius");
        a.update(&Transform::from_position(Vec2::ZERO));
        let mut b = CircleCollider::new(1.0).expect("radius");
        b.update(&Transform::from_position(Vec2::new(5.0, 0.0)));
        let line = a.closest_line_between(&Collider::from(b));
        assert_relative_eq!(line.begin.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(line.end.x, 4.0, epsilon = 1e-5);
        assert_relative_eq!(line.length(), 3.0, epsilon = 1e-5);

        let mut ground = PolygonCollider::rect(1.0, 1.0).expect("box");
        ground.update(&Transform::from_position(Vec2::new(0.0, -3.0)));
        let line = a.closest_line_between(&Collider::from(ground));
        assert_relative_eq!(line.begin.y, -1.0, epsilon = 1e-5);
        assert_relative_eq!(line.end.y, -2.5, epsilon = 1e-5);
        assert_relative_eq!(line.begin.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn offset_moves_world_center() {
        let mut circle = CircleCollider::new(0.5).expect("radius").with_offset(Vec2::new(1.0, 0.0));
        circle.update(&Transform::from_position_rotation(
            Vec2::ZERO,
            std::f32::consts::FRAC_PI_2,
        ));
        assert_relative_eq!(circle.world_center().y, 1.0, epsilon = 1e-5);
        assert!(circle.contains(Vec2::new(0.0, 1.2)));
    }
}
