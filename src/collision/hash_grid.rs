//! Sparse hash grid broad phase.
//!
//! Space is cut into square cells of `size`; only occupied cells exist. Each
//! proxy is registered in every cell its bounds touch, so a query only
//! inspects the cells under the query box.

use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
};

use glam::Vec2;
use log::warn;

use crate::{
    collision::dynamic_tree::ColliderProxy,
    config::SparseHashGridConfig,
    core::{bounds::BoundingBox, ray::Ray},
    debug::{DebugColor, DebugDraw},
    utils::pool::{Pool, Poolable},
};

pub type CellKey = (i32, i32);

/// One occupied cell.
#[derive(Debug, Clone)]
pub struct HashGridCell<T> {
    pub key: CellKey,
    pub proxies: Vec<T>,
}

impl<T> Default for HashGridCell<T> {
    fn default() -> Self {
        Self {
            key: (0, 0),
            proxies: Vec::new(),
        }
    }
}

impl<T> Poolable for HashGridCell<T> {
    fn reset(&mut self) {
        self.key = (0, 0);
        self.proxies.clear();
    }
}

/// Hashed extent of a tracked proxy.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CellRange {
    min: CellKey,
    max: CellKey,
}

impl CellRange {
    fn keys(&self) -> impl Iterator<Item = CellKey> {
        let (min, max) = (self.min, self.max);
        (min.0..=max.0).flat_map(move |x| (min.1..=max.1).map(move |y| (x, y)))
    }
}

#[derive(Debug, Clone)]
struct GridEntry<T> {
    proxy: ColliderProxy<T>,
    range: CellRange,
}

#[derive(Debug)]
pub struct SparseHashGrid<T: Copy + Eq + Hash + Ord> {
    size: f32,
    cells: HashMap<CellKey, HashGridCell<T>>,
    entries: HashMap<T, GridEntry<T>>,
    cell_pool: Pool<HashGridCell<T>>,
    bounds: BoundingBox,
}

impl<T: Copy + Eq + Hash + Ord> Default for SparseHashGrid<T> {
    fn default() -> Self {
        Self::new(SparseHashGridConfig::default())
    }
}

impl<T: Copy + Eq + Hash + Ord> SparseHashGrid<T> {
    pub fn new(config: SparseHashGridConfig) -> Self {
        Self {
            size: config.size,
            cells: HashMap::new(),
            entries: HashMap::new(),
            cell_pool: Pool::default(),
            bounds: BoundingBox::empty(),
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: T) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of occupied cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell(&self, key: CellKey) -> Option<&HashGridCell<T>> {
        self.cells.get(&key)
    }

    pub fn proxy(&self, id: T) -> Option<&ColliderProxy<T>> {
        self.entries.get(&id).map(|entry| &entry.proxy)
    }

    fn key_of(&self, point: Vec2) -> CellKey {
        (
            (point.x / self.size).floor() as i32,
            (point.y / self.size).floor() as i32,
        )
    }

    fn range_of(&self, bounds: &BoundingBox) -> CellRange {
        CellRange {
            min: self.key_of(bounds.min),
            max: self.key_of(bounds.max),
        }
    }

    /// Registers a proxy; an already tracked id is updated instead.
    pub fn track(&mut self, proxy: ColliderProxy<T>) {
        if self.entries.contains_key(&proxy.id) {
            self.update_one(proxy);
            return;
        }
        if !proxy.bounds.is_finite() {
            warn!("refusing to hash proxy with non-finite bounds {:?}", proxy.bounds);
            return;
        }
        let range = self.range_of(&proxy.bounds);
        self.insert(proxy.id, range);
        self.bounds = self.bounds.combine(&proxy.bounds);
        self.entries.insert(proxy.id, GridEntry { proxy, range });
    }

    pub fn untrack(&mut self, id: T) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        self.remove(id, entry.range);
        true
    }

    /// Refreshes proxies, rehashing those whose cell range changed. Returns how many moved.
    pub fn update(&mut self, proxies: impl IntoIterator<Item = ColliderProxy<T>>) -> usize {
        proxies
            .into_iter()
            .filter(|proxy| self.update_one(*proxy))
            .count()
    }

    fn update_one(&mut self, proxy: ColliderProxy<T>) -> bool {
        if !proxy.bounds.is_finite() {
            return false;
        }
        let range = self.range_of(&proxy.bounds);
        let Some(old_range) = self.entries.get(&proxy.id).map(|entry| entry.range) else {
            self.track(proxy);
            return true;
        };
        self.bounds = self.bounds.combine(&proxy.bounds);
        let moved = old_range != range;
        if moved {
            self.remove(proxy.id, old_range);
            self.insert(proxy.id, range);
        }
        self.entries.insert(proxy.id, GridEntry { proxy, range });
        moved
    }

    fn insert(&mut self, id: T, range: CellRange) {
        for key in range.keys() {
            let pool = &mut self.cell_pool;
            let cell = self.cells.entry(key).or_insert_with(|| {
                let mut cell = pool.acquire();
                cell.key = key;
                cell
            });
            cell.proxies.push(id);
        }
    }

    fn remove(&mut self, id: T, range: CellRange) {
        for key in range.keys() {
            let Some(cell) = self.cells.get_mut(&key) else {
                continue;
            };
            cell.proxies.retain(|&other| other != id);
            if cell.proxies.is_empty() {
                if let Some(cell) = self.cells.remove(&key) {
                    self.cell_pool.release(cell);
                }
            }
        }
    }

    /// Visits proxies whose bounds overlap `bounds`, in id order. Returning
    /// true from `callback` stops the query.
    pub fn query_bounds(&self, bounds: &BoundingBox, mut callback: impl FnMut(T) -> bool) {
        if !bounds.is_finite() {
            return;
        }
        let range = self.range_of(bounds);
        let mut found: Vec<T> = range
            .keys()
            .filter_map(|key| self.cells.get(&key))
            .flat_map(|cell| cell.proxies.iter().copied())
            .filter(|id| {
                self.entries
                    .get(id)
                    .is_some_and(|entry| entry.proxy.bounds.overlaps(bounds))
            })
            .collect();
        found.sort();
        found.dedup();
        for id in found {
            if callback(id) {
                return;
            }
        }
    }

    /// Proxies whose bounds contain `point`, in id order.
    pub fn query_point(&self, point: Vec2) -> Vec<T> {
        if !point.is_finite() {
            return Vec::new();
        }
        let mut found: Vec<T> = self
            .cells
            .get(&self.key_of(point))
            .map(|cell| {
                cell.proxies
                    .iter()
                    .copied()
                    .filter(|id| {
                        self.entries
                            .get(id)
                            .is_some_and(|entry| entry.proxy.bounds.contains_point(point))
                    })
                    .collect()
            })
            .unwrap_or_default();
        found.sort();
        found
    }

    /// Walks the cells under the ray nearest first and visits each proxy whose
    /// bounds the ray enters within `max_distance`, once.
    pub fn ray_cast_query(&self, ray: &Ray, max_distance: f32, mut callback: impl FnMut(T) -> bool) {
        if self.entries.is_empty()
            || !ray.origin.is_finite()
            || ray.direction == Vec2::ZERO
            || !ray.direction.is_finite()
        {
            return;
        }
        let furthest_corner = [
            self.bounds.min,
            self.bounds.max,
            Vec2::new(self.bounds.min.x, self.bounds.max.y),
            Vec2::new(self.bounds.max.x, self.bounds.min.y),
        ]
        .iter()
        .map(|corner| corner.distance(ray.origin))
        .fold(0.0, f32::max);
        let limit = max_distance.min(furthest_corner + self.size);

        let mut key = self.key_of(ray.origin);
        let step = (
            if ray.direction.x > 0.0 { 1 } else { -1 },
            if ray.direction.y > 0.0 { 1 } else { -1 },
        );
        let boundary = |cell: i32, step: i32| {
            if step > 0 {
                (cell + 1) as f32 * self.size
            } else {
                cell as f32 * self.size
            }
        };
        let axis_time = |origin: f32, dir: f32, edge: f32| {
            if dir.abs() < f32::EPSILON {
                f32::INFINITY
            } else {
                (edge - origin) / dir
            }
        };
        let mut t_max = Vec2::new(
            axis_time(ray.origin.x, ray.direction.x, boundary(key.0, step.0)),
            axis_time(ray.origin.y, ray.direction.y, boundary(key.1, step.1)),
        );
        let t_delta = Vec2::new(
            axis_time(0.0, ray.direction.x.abs(), self.size),
            axis_time(0.0, ray.direction.y.abs(), self.size),
        );

        let mut seen = HashSet::new();
        let mut t = 0.0;
        while t <= limit {
            if let Some(cell) = self.cells.get(&key) {
                let mut ids: Vec<T> = cell
                    .proxies
                    .iter()
                    .copied()
                    .filter(|id| seen.insert(*id))
                    .collect();
                ids.sort();
                for id in ids {
                    let hit = self
                        .entries
                        .get(&id)
                        .is_some_and(|entry| entry.proxy.bounds.ray_cast(ray, max_distance));
                    if hit && callback(id) {
                        return;
                    }
                }
            }
            if t_max.x < t_max.y {
                t = t_max.x;
                t_max.x += t_delta.x;
                key.0 += step.0;
            } else {
                t = t_max.y;
                t_max.y += t_delta.y;
                key.1 += step.1;
            }
        }
    }

    /// Every pair of distinct proxies sharing a cell with overlapping bounds,
    /// as `(low, high)` sorted ascending.
    pub fn pairs(&self) -> Vec<(T, T)> {
        let mut pairs = HashSet::new();
        for cell in self.cells.values() {
            for (i, &a) in cell.proxies.iter().enumerate() {
                for &b in &cell.proxies[i + 1..] {
                    let (Some(ea), Some(eb)) = (self.entries.get(&a), self.entries.get(&b)) else {
                        continue;
                    };
                    if ea.proxy.owner.is_some() && ea.proxy.owner == eb.proxy.owner {
                        continue;
                    }
                    if ea.proxy.bounds.overlaps(&eb.proxy.bounds) {
                        pairs.insert(if a < b { (a, b) } else { (b, a) });
                    }
                }
            }
        }
        let mut pairs: Vec<(T, T)> = pairs.into_iter().collect();
        pairs.sort();
        pairs
    }

    pub fn clear(&mut self) {
        for (_, cell) in self.cells.drain() {
            self.cell_pool.release(cell);
        }
        self.entries.clear();
        self.bounds = BoundingBox::empty();
    }

    /// Outlines every occupied cell.
    pub fn debug(&self, draw: &mut dyn DebugDraw) {
        for key in self.cells.keys() {
            let min = Vec2::new(key.0 as f32, key.1 as f32) * self.size;
            draw.draw_rect(
                &BoundingBox::new(min, min + Vec2::splat(self.size)),
                DebugColor::GRAY.with_alpha(0.5),
            );
        }
        for entry in self.entries.values() {
            draw.draw_rect(&entry.proxy.bounds, DebugColor::GREEN);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy(id: u32, x: f32, y: f32) -> ColliderProxy<u32> {
        ColliderProxy::new(
            id,
            BoundingBox::from_center_half_extents(Vec2::new(x, y), Vec2::splat(0.5)),
        )
    }

    #[test]
    fn proxies_spanning_cells_are_registered_in_each() {
        let mut grid = SparseHashGrid::new(SparseHashGridConfig { size: 1.0 });
        grid.track(proxy(1, 1.0, 1.0));
        assert_eq!(grid.cell_count(), 4);
        assert!(grid.untrack(1));
        assert_eq!(grid.cell_count(), 0);
        assert!(!grid.untrack(1));
    }

    #[test]
    fn update_counts_only_rehashed_proxies() {
        let mut grid = SparseHashGrid::new(SparseHashGridConfig { size: 4.0 });
        grid.track(proxy(1, 1.0, 1.0));
        grid.track(proxy(2, 10.0, 10.0));
        let moved = grid.update([proxy(1, 1.2, 1.0), proxy(2, 20.0, 10.0)]);
        assert_eq!(moved, 1);
        assert_eq!(grid.query_point(Vec2::new(20.0, 10.0)), vec![2]);
        assert!(grid.query_point(Vec2::new(10.0, 10.0)).is_empty());
    }

    #[test]
    fn pairs_are_canonical_and_unique() {
        let mut grid = SparseHashGrid::new(SparseHashGridConfig { size: 1.0 });
        grid.track(proxy(5, 0.0, 0.0));
        grid.track(proxy(2, 0.6, 0.0));
        grid.track(proxy(9, 8.0, 8.0));
        assert_eq!(grid.pairs(), vec![(2, 5)]);
    }

    #[test]
    fn ray_walk_finds_proxies_in_order() {
        let mut grid = SparseHashGrid::new(SparseHashGridConfig { size: 1.0 });
        grid.track(proxy(1, 5.0, 0.0));
        grid.track(proxy(2, 2.0, 0.0));
        grid.track(proxy(3, 2.0, 5.0));
        let mut visited = Vec::new();
        grid.ray_cast_query(&Ray::new(Vec2::ZERO, Vec2::X), f32::INFINITY, |id| {
            visited.push(id);
            false
        });
        assert_eq!(visited, vec![2, 1]);
    }
}
