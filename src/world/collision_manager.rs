use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::{
    collision::{
        broadphase::{CollisionProcessor, DynamicTreeProcessor, Pair, SparseHashGridProcessor},
        ccd::CcdDetector,
        contact::{CollisionContact, ContactEvent, ContactTracker},
        dynamic_tree::ColliderProxy,
        narrowphase::NarrowPhase,
        queries::{sort_hits, RayCastHit, RayCastOptions},
    },
    config::{PhysicsConfig, SpatialPartitionStrategy},
    core::{
        bounds::BoundingBox,
        collider::{Collider, ColliderId},
        ray::Ray,
        rigidbody::{BodyId, RigidBody},
    },
    debug::{DebugColor, DebugDraw},
    utils::allocator::Arena,
};

/// Owns colliders and everything that turns them into contacts.
pub struct CollisionManager {
    colliders: BTreeMap<ColliderId, Collider>,
    processor: Box<dyn CollisionProcessor>,
    narrow_phase: NarrowPhase,
    tracker: ContactTracker,
    ccd: CcdDetector,
    contacts: Vec<CollisionContact>,
    pair_count: usize,
}

impl CollisionManager {
    pub fn new(config: &PhysicsConfig) -> Self {
        let processor: Box<dyn CollisionProcessor> = match config.spatial_partition {
            SpatialPartitionStrategy::DynamicTree => {
                Box::new(DynamicTreeProcessor::new(config.dynamic_tree))
            }
            SpatialPartitionStrategy::SparseHashGrid => {
                Box::new(SparseHashGridProcessor::new(config.sparse_hash_grid))
            }
        };
        Self {
            colliders: BTreeMap::new(),
            processor,
            narrow_phase: NarrowPhase::new(),
            tracker: ContactTracker::new(),
            ccd: CcdDetector::new(config.ccd),
            contacts: Vec::new(),
            pair_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(&id)
    }

    pub fn colliders(&self) -> impl Iterator<Item = &Collider> + '_ {
        self.colliders.values()
    }

    pub fn owned_by(&self, body: BodyId) -> Vec<ColliderId> {
        self.colliders
            .values()
            .filter(|c| c.owner() == Some(body))
            .map(Collider::id)
            .collect()
    }

    pub fn contacts(&self) -> &[CollisionContact] {
        &self.contacts
    }

    pub fn pair_count(&self) -> usize {
        self.pair_count
    }

    pub fn processor(&self) -> &dyn CollisionProcessor {
        self.processor.as_ref()
    }

    /// Starts tracking an already updated collider.
    pub fn insert(&mut self, collider: Collider) -> ColliderId {
        let id = collider.id();
        self.processor.track(proxy_of(&collider));
        self.colliders.insert(id, collider);
        id
    }

    /// Stops tracking `id`; contacts it or any of its children were part of
    /// end immediately.
    pub fn remove(&mut self, id: ColliderId) -> Option<(Collider, Vec<ContactEvent>)> {
        let collider = self.colliders.remove(&id)?;
        self.processor.untrack(id);
        let mut ids = vec![id];
        if let Some(composite) = collider.as_composite() {
            ids.extend(composite.colliders().iter().map(Collider::id));
        }
        self.contacts
            .retain(|c| !ids.contains(&c.collider_a) && !ids.contains(&c.collider_b));
        let mut events: Vec<ContactEvent> = ids
            .iter()
            .flat_map(|&id| self.tracker.forget_collider(id))
            .collect();
        events.sort_by_key(ContactEvent::id);
        Some((collider, events))
    }

    /// Sweeps fast bodies against every other collider and pulls tunnelling ones back.
    pub fn continuous(&self, bodies: &mut Arena<RigidBody>) -> usize {
        if !self.ccd.enabled() {
            return 0;
        }
        let mut body_bounds: HashMap<BodyId, BoundingBox> = HashMap::new();
        for collider in self.colliders.values() {
            if let Some(owner) = collider.owner() {
                let bounds = collider.bounds();
                body_bounds
                    .entry(owner)
                    .and_modify(|b| *b = b.combine(&bounds))
                    .or_insert(bounds);
            }
        }

        let mut swept = 0;
        for (id, body) in bodies.iter_mut() {
            let Some(bounds) = body_bounds.get(&id) else {
                continue;
            };
            let hit = self.ccd.sweep(body, bounds, |ray, distance| {
                self.cast(ray, &RayCastOptions::default().with_max_distance(distance), Some(id))
                    .into_iter()
                    .next()
            });
            if hit.is_some() {
                swept += 1;
            }
        }
        swept
    }

    /// Moves every owned collider to its body's transform and refreshes the spatial index.
    pub fn update(&mut self, bodies: &Arena<RigidBody>) -> usize {
        let mut proxies = Vec::with_capacity(self.colliders.len());
        for collider in self.colliders.values_mut() {
            let Some(body) = collider.owner().and_then(|owner| bodies.get(owner)) else {
                continue;
            };
            collider.update(&body.transform);
            let displacement = body.transform.position - body.previous_transform.position;
            proxies.push(proxy_of(collider).with_displacement(displacement));
        }
        let restructured = self.processor.update(&proxies);
        if restructured > 0 {
            debug!("spatial index restructured {restructured} proxies");
        }
        restructured
    }

    /// Candidate pairs through the filter and the narrow phase.
    pub fn find_contacts(&mut self, bodies: &Arena<RigidBody>) -> &[CollisionContact] {
        self.contacts.clear();
        let pairs = self.processor.pairs();
        self.pair_count = pairs.len();
        for (a, b) in pairs {
            let (Some(collider_a), Some(collider_b)) =
                (self.colliders.get(&a), self.colliders.get(&b))
            else {
                continue;
            };
            let body_a = collider_a.owner().and_then(|owner| bodies.get(owner));
            let body_b = collider_b.owner().and_then(|owner| bodies.get(owner));
            if !Pair::can_collide(collider_a, body_a, collider_b, body_b) {
                continue;
            }
            self.contacts
                .extend(self.narrow_phase.collide(collider_a, collider_b));
        }
        &self.contacts
    }

    /// Diffs this tick's contacts against the last tick's.
    pub fn track_events(&mut self) -> Vec<ContactEvent> {
        self.tracker.update(&self.contacts)
    }

    /// Colliders whose current bounds overlap `bounds`, by id.
    pub fn query(&self, bounds: &BoundingBox) -> Vec<ColliderId> {
        self.processor
            .query(bounds)
            .into_iter()
            .filter(|id| {
                self.colliders
                    .get(id)
                    .is_some_and(|c| c.bounds().overlaps(bounds))
            })
            .collect()
    }

    pub fn ray_cast(&self, ray: &Ray, options: &RayCastOptions) -> Vec<RayCastHit> {
        self.cast(ray, options, None)
    }

    fn cast(&self, ray: &Ray, options: &RayCastOptions, skip: Option<BodyId>) -> Vec<RayCastHit> {
        let mut hits: Vec<RayCastHit> = self
            .processor
            .ray_cast_candidates(ray, options.max_distance)
            .into_iter()
            .filter_map(|id| self.colliders.get(&id))
            .filter(|c| skip.is_none() || c.owner() != skip)
            .filter(|c| options.group.can_collide(&c.group()))
            .filter_map(|c| c.ray_cast(ray, options.max_distance))
            .collect();
        sort_hits(&mut hits);
        if !options.search_all_colliders {
            hits.truncate(1);
        }
        hits
    }

    pub fn debug(&self, draw: &mut dyn DebugDraw, bodies: &Arena<RigidBody>) {
        self.processor.debug(draw);
        for collider in self.colliders.values() {
            let color = match collider.owner().and_then(|owner| bodies.get(owner)) {
                Some(body) if body.is_sleeping() => DebugColor::GRAY,
                Some(body) if body.is_fixed() => DebugColor::BLUE,
                _ => DebugColor::GREEN,
            };
            collider.debug(draw, color);
        }
        for contact in &self.contacts {
            contact.debug(draw);
        }
    }
}

fn proxy_of(collider: &Collider) -> ColliderProxy<ColliderId> {
    ColliderProxy::new(collider.id(), collider.bounds()).with_owner(collider.owner())
}
