//! Transform System
//!
//! Per-frame depth-first update of the scene hierarchy, decoupled from
//! [`Scene`](crate::scene::Scene) so it only borrows the node arena.
//!
//! For every visited node, in order:
//! 1. modifier hooks, then component hooks (`update(node, dt)`)
//! 2. unless pinned, `world = parent_world` (the node's own local transform
//!    is not applied here)
//! 3. cameras on the node pick up the new `world * local`
//! 4. children are visited in slot order with `world * local`
//! 5. unless pinned, `aabb = union(children's aabb)` once they have returned;
//!    a node without children keeps its current box
//!
//! A hook failure is logged with the node's name and the hook's type. With
//! [`HookFailurePolicy::SkipSubtree`] the traversal leaves that node and its
//! subtree as they were and moves on to the next sibling.

use glam::Affine3A;
use slotmap::SlotMap;

use crate::scene::NodeHandle;
use crate::scene::bounds::BoundingBox;
use crate::scene::camera::Camera;
use crate::scene::node::Node;
use crate::scene::settings::HookFailurePolicy;

/// Counters gathered during one update pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateStats {
    /// Nodes whose update ran to completion.
    pub visited: usize,
    /// Nodes whose hooks failed.
    pub hook_failures: usize,
    /// Nodes not visited because an ancestor's hook failed.
    pub skipped: usize,
}

/// Updates `handle` and everything below it.
///
/// Stale handles (and stale child slots) are ignored; the arena owner is
/// expected to have validated the starting handle.
pub fn update_subtree(
    nodes: &mut SlotMap<NodeHandle, Node>,
    handle: NodeHandle,
    dt: f32,
    parent_world: Affine3A,
    policy: HookFailurePolicy,
) -> UpdateStats {
    let mut stats = UpdateStats::default();
    update_recursive(nodes, handle, dt, parent_world, policy, &mut stats);
    stats
}

fn update_recursive(
    nodes: &mut SlotMap<NodeHandle, Node>,
    handle: NodeHandle,
    dt: f32,
    parent_world: Affine3A,
    policy: HookFailurePolicy,
    stats: &mut UpdateStats,
) {
    // Phase 1: the node itself
    let (propagated, children) = {
        let Some(node) = nodes.get_mut(handle) else {
            return;
        };

        if let Err(failure) = node.run_hooks(dt) {
            stats.hook_failures += 1;
            log::error!(
                "Hook '{}' failed on node '{}': {}",
                failure.hook,
                node.name(),
                failure.error
            );
            if policy == HookFailurePolicy::SkipSubtree {
                stats.skipped += count_descendants(nodes, handle);
                return;
            }
        }

        if !node.world_transform_is_current() {
            node.set_world_transform(parent_world);
        }

        let propagated = node.propagated_transform();

        if let Ok(camera) = node.get_component_mut::<Camera>() {
            camera.update_view_projection(&propagated);
        }

        let children: Vec<NodeHandle> = node.child_handles().collect();
        (propagated, children)
    };

    // Phase 2: children, in slot order
    for &child in &children {
        update_recursive(nodes, child, dt, propagated, policy, stats);
    }

    // Phase 3: bounds, strictly after every child returned
    let aggregated = union_of(nodes, &children);
    if let Some(node) = nodes.get_mut(handle) {
        if !node.world_aabb_is_current()
            && let Some(aabb) = aggregated
        {
            node.set_world_aabb(aabb);
        }
    }

    stats.visited += 1;
}

/// Union of the children's boxes, seeded with the first live child.
/// `None` when no child is alive.
fn union_of(nodes: &SlotMap<NodeHandle, Node>, children: &[NodeHandle]) -> Option<BoundingBox> {
    children
        .iter()
        .filter_map(|&child| nodes.get(child).map(|n| *n.world_aabb()))
        .reduce(|acc, b| acc.union(&b))
}

fn count_descendants(nodes: &SlotMap<NodeHandle, Node>, handle: NodeHandle) -> usize {
    let mut count = 0;
    let mut stack: Vec<NodeHandle> = nodes
        .get(handle)
        .map(|n| n.child_handles().collect())
        .unwrap_or_default();

    while let Some(current) = stack.pop() {
        if let Some(node) = nodes.get(current) {
            count += 1;
            stack.extend(node.child_handles());
        }
    }
    count
}

/// Pre-order flattening of the subtree at `handle`, `handle` included.
/// Empty slots are skipped; siblings appear in slot order.
#[must_use]
pub fn collect_preorder(nodes: &SlotMap<NodeHandle, Node>, handle: NodeHandle) -> Vec<NodeHandle> {
    let mut out = Vec::new();
    let mut stack = vec![handle];

    while let Some(current) = stack.pop() {
        let Some(node) = nodes.get(current) else {
            continue;
        };
        out.push(current);

        // Reverse push keeps slot order on pop
        for &child in node.children().iter().rev().flatten() {
            stack.push(child);
        }
    }
    out
}
