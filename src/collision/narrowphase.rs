//! Exact contact generation for broad-phase candidate pairs.

use glam::Vec2;
use log::warn;

use crate::{
    collision::{
        clipping::clip_to_side_planes,
        contact::{CollisionContact, ContactAnchor, ContactFeature, ContactPoint, FaceOwner},
        separating_axis::{
            find_circle_polygon_separation, find_polygon_polygon_separation,
            find_polygon_polygon_separation_degenerate, is_degenerate, SeparationPool,
        },
        shapes::{CircleCollider, CompositeStrategy, PolygonCollider},
    },
    core::{collider::Collider, types::Transform},
    utils::math::EPSILON,
};

/// Contacts whose normals are this aligned are merged by a `Together` composite.
const MERGE_NORMAL_ALIGNMENT: f32 = 0.99;

/// Narrow phase with a pool of [`SeparationInfo`](crate::collision::separating_axis::SeparationInfo)
/// results reused across pair tests.
#[derive(Debug, Default)]
pub struct NarrowPhase {
    pool: SeparationPool,
}

impl NarrowPhase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self) -> &SeparationPool {
        &self.pool
    }

    /// Contacts between two updated colliders; empty when they do not touch.
    ///
    /// Every returned contact has its normal pointing from `a` toward `b`.
    pub fn collide(&mut self, a: &Collider, b: &Collider) -> Vec<CollisionContact> {
        match (a, b) {
            (Collider::Composite(_), _) | (_, Collider::Composite(_)) => {
                self.collide_composite(a, b)
            }
            (Collider::Circle(ca), Collider::Circle(cb)) => {
                circle_circle(a, ca, b, cb).into_iter().collect()
            }
            (Collider::Circle(circle), Collider::Polygon(polygon)) => self
                .circle_polygon(a, circle, b, polygon, true)
                .into_iter()
                .collect(),
            (Collider::Polygon(polygon), Collider::Circle(circle)) => self
                .circle_polygon(b, circle, a, polygon, false)
                .into_iter()
                .collect(),
            (Collider::Polygon(pa), Collider::Polygon(pb)) => {
                self.polygon_polygon(a, pa, b, pb).into_iter().collect()
            }
        }
    }

    fn circle_polygon(
        &mut self,
        circle_collider: &Collider,
        circle: &CircleCollider,
        polygon_collider: &Collider,
        polygon: &PolygonCollider,
        circle_is_a: bool,
    ) -> Option<CollisionContact> {
        let info = find_circle_polygon_separation(circle, polygon, &mut self.pool);
        if info.is_separated() {
            self.pool.release(info);
            return None;
        }

        let radius = circle.world_radius();
        let center = circle.world_center();
        let local_center = circle.base.to_owner_local(center);
        let polygon_owner = if circle_is_a { FaceOwner::B } else { FaceOwner::A };

        let anchor = match info.side {
            Some(side) => ContactAnchor::Face {
                reference: polygon_owner,
                local_face_point: polygon.base.to_owner_local(side.begin),
                local_face_normal: info.local_axis,
                local_incident: local_center,
                incident_radius: radius,
            },
            None => {
                let vertex = center - info.axis * (radius + info.separation);
                let local_vertex = polygon.base.to_owner_local(vertex);
                if circle_is_a {
                    ContactAnchor::Points {
                        local_a: local_center,
                        local_b: local_vertex,
                        radius_a: radius,
                        radius_b: 0.0,
                    }
                } else {
                    ContactAnchor::Points {
                        local_a: local_vertex,
                        local_b: local_center,
                        radius_a: 0.0,
                        radius_b: radius,
                    }
                }
            }
        };

        let penetration = -info.separation;
        let normal = if circle_is_a { -info.axis } else { info.axis };
        let feature = info.side.map(|_| ContactFeature {
            owner: polygon_owner,
            side: info.side_id,
        });
        let point = ContactPoint {
            point: info.point,
            depth: penetration,
            anchor,
        };
        self.pool.release(info);

        let (a, b) = if circle_is_a {
            (circle_collider, polygon_collider)
        } else {
            (polygon_collider, circle_collider)
        };
        Some(CollisionContact::new(
            a,
            b,
            normal,
            vec![point],
            penetration,
            feature,
        ))
    }

    fn polygon_polygon(
        &mut self,
        a: &Collider,
        pa: &PolygonCollider,
        b: &Collider,
        pb: &PolygonCollider,
    ) -> Option<CollisionContact> {
        if is_degenerate(pa) || is_degenerate(pb) {
            return self.polygon_polygon_degenerate(a, pa, b, pb);
        }

        let sep_a = find_polygon_polygon_separation(pa, pb, &mut self.pool);
        if sep_a.is_separated() {
            self.pool.release(sep_a);
            return None;
        }
        let sep_b = find_polygon_polygon_separation(pb, pa, &mut self.pool);
        if sep_b.is_separated() {
            self.pool.release(sep_a);
            self.pool.release(sep_b);
            return None;
        }

        // Ties keep A as the reference so contact features stay stable.
        let (reference, incident, info, owner) = if sep_a.separation >= sep_b.separation {
            (pa, pb, sep_a, FaceOwner::A)
        } else {
            (pb, pa, sep_b, FaceOwner::B)
        };
        let axis = info.axis;
        let penetration = -info.separation;
        let local_face_normal = info.local_axis;

        let mut points = Vec::with_capacity(2);
        if let Some(reference_side) = info.side {
            let local_face_point = reference.base.to_owner_local(reference_side.begin);
            let (_, incident_side) = incident.closest_face(-axis);
            if let Some(clipped) = clip_to_side_planes(&incident_side, &reference_side) {
                for p in [clipped.begin, clipped.end] {
                    let distance = reference_side.distance_to_point(p);
                    if distance <= 0.0 {
                        points.push(ContactPoint {
                            point: p,
                            depth: -distance,
                            anchor: ContactAnchor::Face {
                                reference: owner,
                                local_face_point,
                                local_face_normal,
                                local_incident: incident.base.to_owner_local(p),
                                incident_radius: 0.0,
                            },
                        });
                    }
                }
            }
            if points.is_empty() {
                points.push(ContactPoint {
                    point: info.point,
                    depth: penetration,
                    anchor: ContactAnchor::Face {
                        reference: owner,
                        local_face_point,
                        local_face_normal,
                        local_incident: info.local_point,
                        incident_radius: 0.0,
                    },
                });
            }
        }

        let normal = match owner {
            FaceOwner::A => axis,
            FaceOwner::B => -axis,
        };
        let feature = ContactFeature {
            owner,
            side: info.side_id,
        };
        self.pool.release(sep_a);
        self.pool.release(sep_b);

        if points.is_empty() {
            return None;
        }
        Some(CollisionContact::new(
            a,
            b,
            normal,
            points,
            penetration,
            Some(feature),
        ))
    }

    fn polygon_polygon_degenerate(
        &mut self,
        a: &Collider,
        pa: &PolygonCollider,
        b: &Collider,
        pb: &PolygonCollider,
    ) -> Option<CollisionContact> {
        let info = find_polygon_polygon_separation_degenerate(pa, pb, &mut self.pool);
        if info.is_separated() {
            self.pool.release(info);
            return None;
        }
        let penetration = -info.separation;
        let face_point = info.point + info.axis * penetration;
        let point = ContactPoint {
            point: info.point,
            depth: penetration,
            anchor: ContactAnchor::Face {
                reference: FaceOwner::A,
                local_face_point: pa.base.to_owner_local(face_point),
                local_face_normal: info.local_axis,
                local_incident: info.local_point,
                incident_radius: 0.0,
            },
        };
        let normal = info.axis;
        self.pool.release(info);
        Some(CollisionContact::new(a, b, normal, vec![point], penetration, None))
    }

    fn collide_composite(&mut self, a: &Collider, b: &Collider) -> Vec<CollisionContact> {
        let mut contacts = Vec::new();
        match (a, b) {
            (Collider::Composite(composite), other) => {
                for child in composite.query(&other.bounds()) {
                    contacts.extend(self.collide(child, other));
                }
            }
            (other, Collider::Composite(composite)) => {
                for child in composite.query(&other.bounds()) {
                    contacts.extend(self.collide(other, child));
                }
            }
            _ => {}
        }

        if contacts.is_empty() || all_separate(a, b) {
            return contacts;
        }
        merge_together(contacts, a, b).into_iter().collect()
    }
}

/// Current signed separation of a contact point after its bodies have moved.
pub fn contact_separation(point: &ContactPoint, transform_a: &Transform, transform_b: &Transform) -> f32 {
    point.anchor.evaluate(transform_a, transform_b).separation
}

fn circle_circle(
    a: &Collider,
    ca: &CircleCollider,
    b: &Collider,
    cb: &CircleCollider,
) -> Option<CollisionContact> {
    let center_a = ca.world_center();
    let center_b = cb.world_center();
    let radius_a = ca.world_radius();
    let radius_b = cb.world_radius();
    let delta = center_b - center_a;
    let distance = delta.length();
    if distance > radius_a + radius_b {
        return None;
    }
    let normal = if distance > EPSILON {
        delta / distance
    } else {
        warn!("coincident circles {:?}/{:?}, using +x normal", a.id(), b.id());
        Vec2::X
    };
    let penetration = radius_a + radius_b - distance;
    let point = ContactPoint {
        point: center_a + normal * radius_a,
        depth: penetration,
        anchor: ContactAnchor::Points {
            local_a: ca.base.to_owner_local(center_a),
            local_b: cb.base.to_owner_local(center_b),
            radius_a,
            radius_b,
        },
    };
    Some(CollisionContact::new(a, b, normal, vec![point], penetration, None))
}

/// True when every composite in the pair reports child contacts separately.
fn all_separate(a: &Collider, b: &Collider) -> bool {
    [a, b]
        .iter()
        .filter_map(|c| c.as_composite())
        .all(|c| c.strategy() == CompositeStrategy::Separate)
}

/// Folds child contacts into one contact labelled with the top-level colliders.
///
/// Starts from the deepest contact and keeps the two points furthest apart
/// along its tangent among contacts sharing its normal.
fn merge_together(
    contacts: Vec<CollisionContact>,
    a: &Collider,
    b: &Collider,
) -> Option<CollisionContact> {
    let deepest = contacts
        .iter()
        .max_by(|x, y| x.penetration.total_cmp(&y.penetration))?;
    let mut merged = deepest.clone();
    let normal = merged.normal;
    let tangent = merged.tangent;

    let aligned: Vec<ContactPoint> = contacts
        .iter()
        .filter(|c| c.normal.dot(normal) > MERGE_NORMAL_ALIGNMENT)
        .flat_map(|c| c.points.iter().copied())
        .collect();
    let lowest = aligned
        .iter()
        .min_by(|x, y| x.point.dot(tangent).total_cmp(&y.point.dot(tangent)))
        .copied();
    let highest = aligned
        .iter()
        .max_by(|x, y| x.point.dot(tangent).total_cmp(&y.point.dot(tangent)))
        .copied();
    if let (Some(lowest), Some(highest)) = (lowest, highest) {
        merged.points = if lowest.point.distance_squared(highest.point) > EPSILON {
            vec![lowest, highest]
        } else {
            vec![lowest]
        };
    }

    merged.relabel(a.id(), b.id());
    merged.body_a = a.owner();
    merged.body_b = b.owner();
    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::shapes::CompositeCollider;
    use approx::assert_relative_eq;

    fn square_at(x: f32, y: f32) -> Collider {
        let mut square: Collider = PolygonCollider::rect(1.0, 1.0).expect("square").into();
        square.update(&Transform::from_position(Vec2::new(x, y)));
        square
    }

    fn circle_at(x: f32, y: f32, radius: f32) -> Collider {
        let mut circle: Collider = CircleCollider::new(radius).expect("circle").into();
        circle.update(&Transform::from_position(Vec2::new(x, y)));
        circle
    }

    #[test]
    fn overlapping_squares_produce_two_points() {
        let a = square_at(0.0, 0.0);
        let b = square_at(0.5, 0.0);
        let contacts = NarrowPhase::new().collide(&a, &b);
        assert_eq!(contacts.len(), 1);
        let contact = &contacts[0];
        assert_relative_eq!(contact.normal.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(contact.penetration, 0.5, epsilon = 1e-5);
        assert_eq!(contact.points.len(), 2);
        for point in &contact.points {
            assert_relative_eq!(point.depth, 0.5, epsilon = 1e-5);
        }
    }

    #[test]
    fn swapping_the_pair_flips_the_normal() {
        let a = square_at(0.0, 0.0);
        let b = square_at(0.5, 0.2);
        let mut narrow = NarrowPhase::new();
        let ab = narrow.collide(&a, &b);
        let ba = narrow.collide(&b, &a);
        assert_eq!(ab[0].id, ba[0].id);
        assert_relative_eq!(ab[0].normal.x, -ba[0].normal.x, epsilon = 1e-5);
    }

    #[test]
    fn distant_squares_do_not_touch() {
        let mut narrow = NarrowPhase::new();
        assert!(narrow.collide(&square_at(0.0, 0.0), &square_at(10.0, 0.0)).is_empty());
        assert_eq!(narrow.pool().outstanding(), 0);
    }

    #[test]
    fn circle_normals_point_from_a_to_b() {
        let mut narrow = NarrowPhase::new();
        let square = square_at(0.0, 0.0);
        let circle = circle_at(0.0, 0.8, 0.5);

        let polygon_first = narrow.collide(&square, &circle);
        assert_relative_eq!(polygon_first[0].normal.y, 1.0, epsilon = 1e-5);
        let circle_first = narrow.collide(&circle, &square);
        assert_relative_eq!(circle_first[0].normal.y, -1.0, epsilon = 1e-5);
        assert_relative_eq!(circle_first[0].penetration, 0.2, epsilon = 1e-5);

        let other = circle_at(0.0, 1.5, 0.5);
        let pair = narrow.collide(&circle, &other);
        assert_relative_eq!(pair[0].normal.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(pair[0].penetration, 0.3, epsilon = 1e-5);
    }

    #[test]
    fn separation_follows_moved_bodies() {
        let a = square_at(0.0, 0.0);
        let b = square_at(0.5, 0.0);
        let contacts = NarrowPhase::new().collide(&a, &b);
        let point = &contacts[0].points[0];
        let ta = Transform::default();
        let tb = Transform::from_position(Vec2::new(0.5, 0.0));
        assert_relative_eq!(contact_separation(point, &ta, &tb), -0.5, epsilon = 1e-5);
        let pushed = Transform::from_position(Vec2::new(0.8, 0.0));
        assert_relative_eq!(contact_separation(point, &ta, &pushed), -0.2, epsilon = 1e-5);
    }

    #[test]
    fn together_composite_reports_one_contact_under_its_own_id() {
        let tiles: Vec<Collider> = [-0.5, 0.5]
            .iter()
            .map(|&x| {
                PolygonCollider::rect(1.0, 1.0)
                    .expect("tile")
                    .with_offset(Vec2::new(x, 0.0))
                    .into()
            })
            .collect();
        let mut ground: Collider = CompositeCollider::new(tiles).expect("ground").into();
        ground.update(&Transform::default());
        let circle = circle_at(0.0, 0.9, 0.5);

        let contacts = NarrowPhase::new().collide(&ground, &circle);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].collider_a, ground.id());
        assert!(contacts[0].normal.y > 0.9);
    }
}
