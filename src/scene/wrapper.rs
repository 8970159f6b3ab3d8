//! Chainable node operation wrapper.
//!
//! [`NodeMut`] borrows a [`Scene`] mutably and provides a fluent API
//! for editing a node without needing `get_node_mut().unwrap()`.
//!
//! All methods silently no-op when the handle is stale, so users never
//! encounter panics from dangling handles.
//!
//! # Example
//!
//! ```rust,ignore
//! scene.node(handle)
//!     .set_translation(Vec3::new(0.0, 3.0, 0.0))
//!     .rotate_y(0.5)
//!     .pin_world_aabb(BoundingBox::splat(-1.0, 1.0));
//! ```
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::must_use_candidate)]
use glam::{Affine3A, Quat, Vec3};

use crate::scene::NodeHandle;
use crate::scene::bounds::BoundingBox;
use crate::scene::component::{Component, Modifier};
use crate::scene::scene::Scene;

/// Temporary mutable borrow of a scene node for chainable operations.
pub struct NodeMut<'a> {
    scene: &'a mut Scene,
    handle: NodeHandle,
}

impl<'a> NodeMut<'a> {
    #[inline]
    pub fn new(scene: &'a mut Scene, handle: NodeHandle) -> Self {
        Self { scene, handle }
    }

    /// Returns the underlying handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    // -- Local transform setters (chainable) --

    /// Replaces the local transform.
    #[inline]
    pub fn set_local(self, transform: Affine3A) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            node.set_local_transform(transform);
        }
        self
    }

    /// Sets the translation part of the local transform.
    #[inline]
    pub fn set_translation(self, translation: Vec3) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            let mut local = *node.local_transform();
            local.translation = translation.into();
            node.set_local_transform(local);
        }
        self
    }

    /// Post-multiplies the local transform by a rotation.
    #[inline]
    pub fn rotate(self, rotation: Quat) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            let local = *node.local_transform() * Affine3A::from_quat(rotation);
            node.set_local_transform(local);
        }
        self
    }

    /// Rotates around the X axis by `angle` radians (cumulative).
    #[inline]
    pub fn rotate_x(self, angle: f32) -> Self {
        self.rotate(Quat::from_rotation_x(angle))
    }

    /// Rotates around the Y axis by `angle` radians (cumulative).
    #[inline]
    pub fn rotate_y(self, angle: f32) -> Self {
        self.rotate(Quat::from_rotation_y(angle))
    }

    // -- Pinned state --

    /// Pins the world transform against propagation.
    #[inline]
    pub fn pin_world_transform(self, transform: Affine3A) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            node.pin_world_transform(transform);
        }
        self
    }

    /// Pins the world box against recomputation.
    #[inline]
    pub fn pin_world_aabb(self, aabb: BoundingBox) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            node.pin_world_aabb(aabb);
        }
        self
    }

    /// Hands the world transform back to propagation.
    #[inline]
    pub fn unpin_world_transform(self) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            node.set_world_transform_current(false);
        }
        self
    }

    /// Hands the world box back to aggregation.
    #[inline]
    pub fn unpin_world_aabb(self) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            node.set_world_aabb_current(false);
        }
        self
    }

    // -- Extensions --

    /// Attaches a component (replacing one of the same type).
    #[inline]
    pub fn with_component<T: Component>(self, component: T) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            node.add_component(component);
        }
        self
    }

    /// Attaches a modifier (replacing one of the same type).
    #[inline]
    pub fn with_modifier<T: Modifier>(self, modifier: T) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            node.add_modifier(modifier);
        }
        self
    }

    /// Renames the node. The instancing registry is not touched.
    #[inline]
    pub fn set_name(self, name: &str) -> Self {
        if let Some(node) = self.scene.get_node_mut(self.handle) {
            node.set_name(name);
        }
        self
    }
}
