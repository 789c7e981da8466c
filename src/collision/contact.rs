//! Contact model shared by the narrow phase, the solver and the world.
//!
//! A [`CollisionContact`] is rebuilt every tick. Its [`ContactId`] only
//! depends on the two collider ids, so the solver can look up last tick's
//! impulses for the same pair and the [`ContactTracker`] can tell when a pair
//! starts or stops touching.

use std::{collections::HashMap, fmt};

use glam::Vec2;
use log::debug;

use crate::{
    core::{
        collider::{Collider, ColliderId},
        rigidbody::BodyId,
        types::Transform,
    },
    debug::{draw_normal, DebugColor, DebugDraw},
};

/// Stable identity of a touching pair: the two collider ids, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactId {
    pub first: ColliderId,
    pub second: ColliderId,
}

impl ContactId {
    pub fn new(a: ColliderId, b: ColliderId) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}+{}", self.first.0, self.second.0)
    }
}

/// Which collider of a contact owns the reference face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceOwner {
    A,
    B,
}

/// Reference side that produced a polygon contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContactFeature {
    pub owner: FaceOwner,
    pub side: usize,
}

/// Body-local description of a contact point, so its separation can be
/// recomputed after the solver has moved the bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactAnchor {
    /// Two rounded points, one per body (circle centers or a polygon vertex with radius 0).
    Points {
        local_a: Vec2,
        local_b: Vec2,
        radius_a: f32,
        radius_b: f32,
    },
    /// A point of one body measured against a face of the other.
    Face {
        reference: FaceOwner,
        local_face_point: Vec2,
        local_face_normal: Vec2,
        local_incident: Vec2,
        incident_radius: f32,
    },
}

/// Current normal (A to B), surface point and signed separation of an anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorEvaluation {
    pub normal: Vec2,
    pub point: Vec2,
    pub separation: f32,
}

impl ContactAnchor {
    pub fn evaluate(&self, transform_a: &Transform, transform_b: &Transform) -> AnchorEvaluation {
        match *self {
            ContactAnchor::Points {
                local_a,
                local_b,
                radius_a,
                radius_b,
            } => {
                let pa = transform_a.apply(local_a);
                let pb = transform_b.apply(local_b);
                let delta = pb - pa;
                let normal = delta.normalize_or(Vec2::X);
                let surface_a = pa + normal * radius_a;
                let surface_b = pb - normal * radius_b;
                AnchorEvaluation {
                    normal,
                    point: (surface_a + surface_b) * 0.5,
                    separation: delta.length() - radius_a - radius_b,
                }
            }
            ContactAnchor::Face {
                reference,
                local_face_point,
                local_face_normal,
                local_incident,
                incident_radius,
            } => {
                let (reference_tf, incident_tf) = match reference {
                    FaceOwner::A => (transform_a, transform_b),
                    FaceOwner::B => (transform_b, transform_a),
                };
                let face_normal = reference_tf
                    .rotate_vector(local_face_normal)
                    .normalize_or(Vec2::X);
                let face_point = reference_tf.apply(local_face_point);
                let incident = incident_tf.apply(local_incident);
                let separation = (incident - face_point).dot(face_normal) - incident_radius;
                let normal = match reference {
                    FaceOwner::A => face_normal,
                    FaceOwner::B => -face_normal,
                };
                AnchorEvaluation {
                    normal,
                    point: incident - face_normal * incident_radius,
                    separation,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// World position at detection time.
    pub point: Vec2,
    /// Penetration of this point along the contact normal.
    pub depth: f32,
    pub anchor: ContactAnchor,
}

/// A confirmed touching pair for the current tick.
///
/// `normal` points from collider A toward collider B. `points` holds one or two
/// entries and `penetration` is never negative.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionContact {
    pub id: ContactId,
    pub collider_a: ColliderId,
    pub collider_b: ColliderId,
    pub body_a: Option<BodyId>,
    pub body_b: Option<BodyId>,
    pub normal: Vec2,
    pub tangent: Vec2,
    /// Translation that separates B from A: `normal * penetration`.
    pub mtv: Vec2,
    pub points: Vec<ContactPoint>,
    pub penetration: f32,
    pub feature: Option<ContactFeature>,
}

impl CollisionContact {
    pub fn new(
        a: &Collider,
        b: &Collider,
        normal: Vec2,
        points: Vec<ContactPoint>,
        penetration: f32,
        feature: Option<ContactFeature>,
    ) -> Self {
        let penetration = penetration.max(0.0);
        Self {
            id: ContactId::new(a.id(), b.id()),
            collider_a: a.id(),
            collider_b: b.id(),
            body_a: a.owner(),
            body_b: b.owner(),
            normal,
            tangent: Vec2::new(-normal.y, normal.x),
            mtv: normal * penetration,
            points,
            penetration,
            feature,
        }
    }

    /// Reports the contact under different collider ids, e.g. a composite's own id.
    pub fn relabel(&mut self, collider_a: ColliderId, collider_b: ColliderId) {
        self.collider_a = collider_a;
        self.collider_b = collider_b;
        self.id = ContactId::new(collider_a, collider_b);
    }

    /// True when either collider is owned by `body`.
    pub fn involves(&self, body: BodyId) -> bool {
        self.body_a == Some(body) || self.body_b == Some(body)
    }

    pub fn debug(&self, draw: &mut dyn DebugDraw) {
        for point in &self.points {
            draw.draw_point(point.point, DebugColor::RED);
            draw_normal(draw, point.point, self.normal, 0.5, DebugColor::YELLOW);
        }
    }
}

/// Contact start or end, derived by comparing successive ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEvent {
    Started {
        id: ContactId,
        body_a: Option<BodyId>,
        body_b: Option<BodyId>,
    },
    Ended {
        id: ContactId,
        body_a: Option<BodyId>,
        body_b: Option<BodyId>,
    },
}

impl ContactEvent {
    pub fn id(&self) -> ContactId {
        match self {
            ContactEvent::Started { id, .. } | ContactEvent::Ended { id, .. } => *id,
        }
    }
}

/// Remembers last tick's contact ids.
#[derive(Debug, Default, Clone)]
pub struct ContactTracker {
    active: HashMap<ContactId, (Option<BodyId>, Option<BodyId>)>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, id: ContactId) -> bool {
        self.active.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Replaces the remembered set with `contacts`; returns starts then ends, each sorted by id.
    pub fn update(&mut self, contacts: &[CollisionContact]) -> Vec<ContactEvent> {
        let current: HashMap<_, _> = contacts
            .iter()
            .map(|c| (c.id, (c.body_a, c.body_b)))
            .collect();

        let mut started: Vec<ContactEvent> = current
            .iter()
            .filter(|(id, _)| !self.active.contains_key(id))
            .map(|(&id, &(body_a, body_b))| ContactEvent::Started { id, body_a, body_b })
            .collect();
        let mut ended: Vec<ContactEvent> = self
            .active
            .iter()
            .filter(|(id, _)| !current.contains_key(id))
            .map(|(&id, &(body_a, body_b))| ContactEvent::Ended { id, body_a, body_b })
            .collect();
        started.sort_by_key(ContactEvent::id);
        ended.sort_by_key(ContactEvent::id);

        for event in started.iter().chain(ended.iter()) {
            debug!("contact {:?}", event);
        }

        self.active = current;
        started.extend(ended);
        started
    }

    /// Forgets every contact touching `collider`, returning the matching end events.
    pub fn forget_collider(&mut self, collider: ColliderId) -> Vec<ContactEvent> {
        let mut ended: Vec<ContactEvent> = self
            .active
            .iter()
            .filter(|(id, _)| id.first == collider || id.second == collider)
            .map(|(&id, &(body_a, body_b))| ContactEvent::Ended { id, body_a, body_b })
            .collect();
        ended.sort_by_key(ContactEvent::id);
        self.active
            .retain(|id, _| id.first != collider && id.second != collider);
        ended
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}
