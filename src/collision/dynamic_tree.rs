//! Dynamic AABB tree over fattened collider bounds.
//!
//! Leaves hold a [`ColliderProxy`] and a box padded by
//! [`DynamicTreeConfig::bounds_padding`] plus the proxy's displacement scaled
//! by [`DynamicTreeConfig::velocity_multiplier`]. Moving a proxy only
//! restructures the tree once its true bounds leave the padded box.
//!
//! Nodes live in an [`Arena`]; parent and child links are handles, so the tree
//! owns every node and never forms a cycle. Every internal node has exactly two
//! children, its box is the union of theirs, and the heights of its children
//! differ by at most one.

use std::{collections::HashMap, hash::Hash};

use glam::Vec2;
use log::{debug, warn};

use crate::{
    config::DynamicTreeConfig,
    core::{bounds::BoundingBox, ray::Ray, rigidbody::BodyId},
    debug::{DebugColor, DebugDraw},
    utils::allocator::{Arena, Handle},
};

pub type NodeId<T> = Handle<TreeNode<T>>;

/// What the tree knows about a tracked collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderProxy<T> {
    pub id: T,
    pub owner: Option<BodyId>,
    /// True bounds at the time of the last track or update.
    pub bounds: BoundingBox,
    /// Motion over the last tick, used to stretch the fat box ahead of the collider.
    pub displacement: Vec2,
}

impl<T> ColliderProxy<T> {
    pub fn new(id: T, bounds: BoundingBox) -> Self {
        Self {
            id,
            owner: None,
            bounds,
            displacement: Vec2::ZERO,
        }
    }

    pub fn with_owner(mut self, owner: Option<BodyId>) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_displacement(mut self, displacement: Vec2) -> Self {
        self.displacement = displacement;
        self
    }
}

#[derive(Debug, Clone)]
pub struct TreeNode<T> {
    pub parent: Option<NodeId<T>>,
    pub left: Option<NodeId<T>>,
    pub right: Option<NodeId<T>>,
    pub bounds: BoundingBox,
    /// Zero for leaves.
    pub height: i32,
    pub proxy: Option<ColliderProxy<T>>,
}

impl<T> TreeNode<T> {
    pub fn is_leaf(&self) -> bool {
        self.left.is_none()
    }

    fn leaf(bounds: BoundingBox, proxy: ColliderProxy<T>) -> Self {
        Self {
            parent: None,
            left: None,
            right: None,
            bounds,
            height: 0,
            proxy: Some(proxy),
        }
    }
}

/// Handle-free structural snapshot of a tree, for comparisons.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeShape<T> {
    Leaf {
        id: T,
        bounds: BoundingBox,
    },
    Node {
        bounds: BoundingBox,
        height: i32,
        left: Box<TreeShape<T>>,
        right: Box<TreeShape<T>>,
    },
}

/// A rotation done while rebalancing, with enough to reverse it.
#[derive(Debug, Clone, Copy)]
struct Rotation<T> {
    pivot: NodeId<T>,
    lifted: NodeId<T>,
    lifted_was_right: bool,
    lifted_children: (NodeId<T>, NodeId<T>),
}

/// The most recent `track`, so that untracking the same leaf right after
/// restores the tree exactly.
#[derive(Debug, Clone)]
struct LastInsertion<T> {
    leaf: NodeId<T>,
    rotations: Vec<Rotation<T>>,
}

#[derive(Debug, Clone)]
pub struct DynamicTree<T: Copy + Eq + Hash> {
    nodes: Arena<TreeNode<T>>,
    root: Option<NodeId<T>>,
    leaves: HashMap<T, NodeId<T>>,
    config: DynamicTreeConfig,
    rotations: Vec<Rotation<T>>,
    last_insertion: Option<LastInsertion<T>>,
}

impl<T: Copy + Eq + Hash> Default for DynamicTree<T> {
    fn default() -> Self {
        Self::new(DynamicTreeConfig::default())
    }
}

impl<T: Copy + Eq + Hash> DynamicTree<T> {
    pub fn new(config: DynamicTreeConfig) -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            leaves: HashMap::new(),
            config,
            rotations: Vec::new(),
            last_insertion: None,
        }
    }

    pub fn config(&self) -> &DynamicTreeConfig {
        &self.config
    }

    /// Number of tracked proxies.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn root(&self) -> Option<NodeId<T>> {
        self.root
    }

    /// Height of the root; zero for an empty tree or a single leaf.
    pub fn height(&self) -> i32 {
        self.root.map_or(0, |root| self.nodes[root].height)
    }

    pub fn contains(&self, id: T) -> bool {
        self.leaves.contains_key(&id)
    }

    pub fn node(&self, id: NodeId<T>) -> Option<&TreeNode<T>> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId<T>, &TreeNode<T>)> + '_ {
        self.nodes.iter()
    }

    pub fn proxy(&self, id: T) -> Option<&ColliderProxy<T>> {
        let leaf = *self.leaves.get(&id)?;
        self.nodes.get(leaf)?.proxy.as_ref()
    }

    /// The padded box currently stored for `id`.
    pub fn fat_bounds(&self, id: T) -> Option<BoundingBox> {
        let leaf = *self.leaves.get(&id)?;
        self.nodes.get(leaf).map(|node| node.bounds)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.leaves.clear();
        self.root = None;
        self.rotations.clear();
        self.last_insertion = None;
    }

    /// Inserts a leaf for `proxy`. Tracking an already tracked id updates it instead.
    ///
    /// Untracking the same id before any other mutation leaves the tree
    /// structurally identical to how it was before this call.
    pub fn track(&mut self, proxy: ColliderProxy<T>) {
        if self.leaves.contains_key(&proxy.id) {
            self.update(proxy);
            return;
        }
        if !proxy.bounds.is_finite() {
            warn!("dynamic tree: refusing to track proxy with non-finite bounds");
            return;
        }
        let fat = self.fatten(&proxy);
        let leaf = self.nodes.insert(TreeNode::leaf(fat, proxy));
        self.leaves.insert(proxy.id, leaf);
        self.rotations.clear();
        self.insert_leaf(leaf);
        self.last_insertion = Some(LastInsertion {
            leaf,
            rotations: std::mem::take(&mut self.rotations),
        });
    }

    /// Refreshes a proxy's bounds. Returns true when the leaf had to be reinserted.
    pub fn update(&mut self, proxy: ColliderProxy<T>) -> bool {
        let Some(&leaf) = self.leaves.get(&proxy.id) else {
            let before = self.len();
            self.track(proxy);
            return self.len() > before;
        };
        if !proxy.bounds.is_finite() {
            debug!("dynamic tree: ignoring non-finite bounds update");
            return false;
        }

        if self.nodes[leaf].bounds.contains(&proxy.bounds) {
            self.nodes[leaf].proxy = Some(proxy);
            return false;
        }

        self.last_insertion = None;
        self.remove_leaf(leaf);
        let fat = self.fatten(&proxy);
        let node = &mut self.nodes[leaf];
        node.bounds = fat;
        node.proxy = Some(proxy);
        self.insert_leaf(leaf);
        self.rotations.clear();
        true
    }

    /// Removes the leaf for `id`; returns whether it was tracked.
    pub fn untrack(&mut self, id: T) -> bool {
        let Some(leaf) = self.leaves.remove(&id) else {
            return false;
        };
        match self.last_insertion.take() {
            Some(last) if last.leaf == leaf => {
                for rotation in last.rotations.iter().rev() {
                    self.rotate_back(*rotation);
                }
                self.splice_out(leaf, false);
            }
            _ => self.remove_leaf(leaf),
        }
        self.nodes.remove(leaf);
        true
    }

    /// Visits every proxy whose fat box overlaps `proxy.bounds`, skipping `proxy`
    /// itself and leaves owned by the same body. Returning true from `callback`
    /// stops the traversal.
    pub fn query(&self, proxy: &ColliderProxy<T>, mut callback: impl FnMut(T) -> bool) {
        self.traverse(
            |bounds| bounds.overlaps(&proxy.bounds),
            |other| {
                if other.id == proxy.id
                    || (proxy.owner.is_some() && proxy.owner == other.owner)
                {
                    return false;
                }
                callback(other.id)
            },
        );
    }

    /// Visits every proxy whose fat box overlaps `bounds`. Non-finite bounds visit nothing.
    pub fn query_bounds(&self, bounds: &BoundingBox, mut callback: impl FnMut(T) -> bool) {
        if !bounds.is_finite() {
            return;
        }
        self.traverse(|node| node.overlaps(bounds), |proxy| callback(proxy.id));
    }

    /// Visits every proxy whose fat box the ray enters within `max_distance`.
    pub fn ray_cast_query(
        &self,
        ray: &Ray,
        max_distance: f32,
        mut callback: impl FnMut(T) -> bool,
    ) {
        if !ray.origin.is_finite() || !ray.direction.is_finite() || ray.direction == Vec2::ZERO {
            return;
        }
        self.traverse(
            |bounds| bounds.ray_cast(ray, max_distance),
            |proxy| callback(proxy.id),
        );
    }

    /// Every pair of distinct proxies whose fat boxes overlap, each reported once.
    pub fn overlapping_pairs(&self, mut callback: impl FnMut(T, T)) {
        for (leaf, node) in self.nodes.iter() {
            let Some(proxy) = node.proxy.as_ref() else {
                continue;
            };
            let fat = node.bounds;
            self.traverse(
                |bounds| bounds.overlaps(&fat),
                |other| {
                    let later = self
                        .leaves
                        .get(&other.id)
                        .is_some_and(|&other_leaf| other_leaf > leaf);
                    if later {
                        callback(proxy.id, other.id);
                    }
                    false
                },
            );
        }
    }

    pub fn shape(&self) -> Option<TreeShape<T>> {
        self.shape_of(self.root?)
    }

    /// Checks the structural invariants, describing the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let Some(root) = self.root else {
            return if self.leaves.is_empty() {
                Ok(())
            } else {
                Err(format!("empty tree still maps {} leaves", self.leaves.len()))
            };
        };
        if self.nodes[root].parent.is_some() {
            return Err("root has a parent".into());
        }
        let mut leaf_count = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            match (node.left, node.right) {
                (None, None) => {
                    leaf_count += 1;
                    if node.height != 0 {
                        return Err(format!("leaf {id:?} has height {}", node.height));
                    }
                    let Some(proxy) = node.proxy.as_ref() else {
                        return Err(format!("leaf {id:?} has no proxy"));
                    };
                    if self.leaves.get(&proxy.id) != Some(&id) {
                        return Err(format!("leaf {id:?} is not indexed"));
                    }
                    if !node.bounds.contains(&proxy.bounds) {
                        return Err(format!("leaf {id:?} fat box does not contain its bounds"));
                    }
                }
                (Some(left), Some(right)) => {
                    let (l, r) = (&self.nodes[left], &self.nodes[right]);
                    if l.parent != Some(id) || r.parent != Some(id) {
                        return Err(format!("children of {id:?} do not point back"));
                    }
                    if node.height != 1 + l.height.max(r.height) {
                        return Err(format!("node {id:?} has stale height"));
                    }
                    if (l.height - r.height).abs() > 1 {
                        return Err(format!(
                            "node {id:?} unbalanced: {} vs {}",
                            l.height, r.height
                        ));
                    }
                    if node.bounds != l.bounds.combine(&r.bounds) {
                        return Err(format!("node {id:?} bounds are not the union of its children"));
                    }
                    stack.push(left);
                    stack.push(right);
                }
                _ => return Err(format!("node {id:?} has a single child")),
            }
        }
        if leaf_count != self.leaves.len() {
            return Err(format!(
                "reachable leaves {leaf_count} != indexed leaves {}",
                self.leaves.len()
            ));
        }
        Ok(())
    }

    pub fn debug(&self, draw: &mut dyn DebugDraw) {
        for (_, node) in self.nodes.iter() {
            let color = if node.is_leaf() {
                DebugColor::GREEN
            } else {
                DebugColor::GRAY.with_alpha(0.5)
            };
            draw.draw_rect(&node.bounds, color);
        }
    }

    fn fatten(&self, proxy: &ColliderProxy<T>) -> BoundingBox {
        let displacement = proxy.displacement * self.config.velocity_multiplier;
        let displacement = if displacement.is_finite() {
            displacement
        } else {
            Vec2::ZERO
        };
        proxy
            .bounds
            .inflate(self.config.bounds_padding)
            .expand_by_displacement(displacement)
    }

    fn traverse(
        &self,
        mut visit: impl FnMut(&BoundingBox) -> bool,
        mut on_leaf: impl FnMut(&ColliderProxy<T>) -> bool,
    ) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if !visit(&node.bounds) {
                continue;
            }
            match (node.left, node.right, node.proxy.as_ref()) {
                (Some(left), Some(right), _) => {
                    stack.push(right);
                    stack.push(left);
                }
                (_, _, Some(proxy)) => {
                    if on_leaf(proxy) {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    fn shape_of(&self, id: NodeId<T>) -> Option<TreeShape<T>> {
        let node = self.nodes.get(id)?;
        match (node.left, node.right, node.proxy.as_ref()) {
            (Some(left), Some(right), _) => Some(TreeShape::Node {
                bounds: node.bounds,
                height: node.height,
                left: Box::new(self.shape_of(left)?),
                right: Box::new(self.shape_of(right)?),
            }),
            (None, None, Some(proxy)) => Some(TreeShape::Leaf {
                id: proxy.id,
                bounds: node.bounds,
            }),
            _ => None,
        }
    }

    fn insert_leaf(&mut self, leaf: NodeId<T>) {
        let Some(root) = self.root else {
            self.nodes[leaf].parent = None;
            self.root = Some(leaf);
            return;
        };

        // The sibling is always a leaf, so no ancestor ends up more than one
        // rotation away from balanced.
        let leaf_bounds = self.nodes[leaf].bounds;
        let mut sibling = root;
        while let (Some(left), Some(right)) = (self.nodes[sibling].left, self.nodes[sibling].right)
        {
            let cost_left = self.insertion_cost(left, &leaf_bounds);
            let cost_right = self.insertion_cost(right, &leaf_bounds);
            sibling = if cost_left <= cost_right { left } else { right };
        }

        let old_parent = self.nodes[sibling].parent;
        let sibling_bounds = self.nodes[sibling].bounds;
        let new_parent = self.nodes.insert(TreeNode {
            parent: old_parent,
            left: Some(sibling),
            right: Some(leaf),
            bounds: sibling_bounds.combine(&leaf_bounds),
            height: 1,
            proxy: None,
        });
        self.nodes[sibling].parent = Some(new_parent);
        self.nodes[leaf].parent = Some(new_parent);
        match old_parent {
            Some(parent) => self.replace_child(parent, sibling, new_parent),
            None => self.root = Some(new_parent),
        }

        self.refit_ancestors(self.nodes[leaf].parent);
    }

    fn remove_leaf(&mut self, leaf: NodeId<T>) {
        self.splice_out(leaf, true);
        self.rotations.clear();
    }

    /// Replaces the leaf's parent with its sibling, then refits the ancestors,
    /// rebalancing them when `rebalance` is set.
    fn splice_out(&mut self, leaf: NodeId<T>, rebalance: bool) {
        if self.root == Some(leaf) {
            self.root = None;
            return;
        }
        let Some(parent) = self.nodes[leaf].parent else {
            return;
        };
        let sibling = if self.nodes[parent].left == Some(leaf) {
            self.nodes[parent].right
        } else {
            self.nodes[parent].left
        };
        let Some(sibling) = sibling else {
            return;
        };

        let grandparent = self.nodes[parent].parent;
        self.nodes[sibling].parent = grandparent;
        match grandparent {
            Some(grandparent) => {
                self.replace_child(grandparent, parent, sibling);
                self.nodes.remove(parent);
                if rebalance {
                    self.refit_ancestors(Some(grandparent));
                } else {
                    self.refit_path(Some(grandparent));
                }
            }
            None => {
                self.root = Some(sibling);
                self.nodes.remove(parent);
            }
        }
        self.nodes[leaf].parent = None;
    }

    /// Perimeter growth of `node`'s box when `bounds` is added to it.
    fn insertion_cost(&self, node: NodeId<T>, bounds: &BoundingBox) -> f32 {
        let current = self.nodes[node].bounds;
        current.combine(bounds).perimeter() - current.perimeter()
    }

    fn replace_child(&mut self, parent: NodeId<T>, old: NodeId<T>, new: NodeId<T>) {
        let node = &mut self.nodes[parent];
        if node.left == Some(old) {
            node.left = Some(new);
        } else {
            node.right = Some(new);
        }
    }

    /// Rebalances and refits every node from `start` up to the root.
    fn refit_ancestors(&mut self, start: Option<NodeId<T>>) {
        let mut current = start;
        while let Some(id) = current {
            let id = self.balance(id);
            self.refit(id);
            current = self.nodes[id].parent;
        }
    }

    fn refit_path(&mut self, start: Option<NodeId<T>>) {
        let mut current = start;
        while let Some(id) = current {
            self.refit(id);
            current = self.nodes[id].parent;
        }
    }

    fn refit(&mut self, id: NodeId<T>) {
        let (Some(left), Some(right)) = (self.nodes[id].left, self.nodes[id].right) else {
            return;
        };
        let (l, r) = (&self.nodes[left], &self.nodes[right]);
        let height = 1 + l.height.max(r.height);
        let bounds = l.bounds.combine(&r.bounds);
        let node = &mut self.nodes[id];
        node.height = height;
        node.bounds = bounds;
    }

    /// Rotates the taller child of `a` up when the children's heights differ by
    /// more than one. Returns the root of the (possibly new) subtree.
    fn balance(&mut self, a: NodeId<T>) -> NodeId<T> {
        let node = &self.nodes[a];
        if node.height < 2 {
            return a;
        }
        let (Some(b), Some(c)) = (node.left, node.right) else {
            return a;
        };
        let difference = self.nodes[c].height - self.nodes[b].height;
        if difference > 1 {
            self.rotate_up(a, c)
        } else if difference < -1 {
            self.rotate_up(a, b)
        } else {
            a
        }
    }

    /// Lifts `tall` into `a`'s place. `a` keeps its other child and adopts the
    /// lower of `tall`'s children; `tall` keeps the higher one.
    fn rotate_up(&mut self, a: NodeId<T>, tall: NodeId<T>) -> NodeId<T> {
        let (Some(f), Some(g)) = (self.nodes[tall].left, self.nodes[tall].right) else {
            return a;
        };
        let tall_was_right = self.nodes[a].right == Some(tall);
        self.rotations.push(Rotation {
            pivot: a,
            lifted: tall,
            lifted_was_right: tall_was_right,
            lifted_children: (f, g),
        });

        let parent = self.nodes[a].parent;
        self.nodes[tall].parent = parent;
        self.nodes[a].parent = Some(tall);
        match parent {
            Some(parent) => self.replace_child(parent, a, tall),
            None => self.root = Some(tall),
        }

        let (keep, give) = if self.nodes[f].height > self.nodes[g].height {
            (f, g)
        } else {
            (g, f)
        };

        if tall_was_right {
            self.nodes[a].right = Some(give);
        } else {
            self.nodes[a].left = Some(give);
        }
        self.nodes[give].parent = Some(a);

        let tall_node = &mut self.nodes[tall];
        tall_node.left = Some(a);
        tall_node.right = Some(keep);
        self.nodes[keep].parent = Some(tall);

        self.refit(a);
        self.refit(tall);
        tall
    }

    /// Undoes a [`Self::rotate_up`]: `pivot` takes its place back and `lifted`
    /// gets its original children in their original order.
    fn rotate_back(&mut self, rotation: Rotation<T>) {
        let Rotation {
            pivot,
            lifted,
            lifted_was_right,
            lifted_children: (left, right),
        } = rotation;

        let parent = self.nodes[lifted].parent;
        self.nodes[pivot].parent = parent;
        match parent {
            Some(parent) => self.replace_child(parent, lifted, pivot),
            None => self.root = Some(pivot),
        }

        if lifted_was_right {
            self.nodes[pivot].right = Some(lifted);
        } else {
            self.nodes[pivot].left = Some(lifted);
        }
        self.nodes[lifted].parent = Some(pivot);

        let node = &mut self.nodes[lifted];
        node.left = Some(left);
        node.right = Some(right);
        self.nodes[left].parent = Some(lifted);
        self.nodes[right].parent = Some(lifted);

        self.refit(lifted);
        self.refit(pivot);
    }
}
