use glam::{Affine3A, Vec3};

use crate::errors::{Result, SceneError};
use crate::scene::NodeHandle;
use crate::scene::bounds::BoundingBox;
use crate::scene::component::{
    Component, ComponentTable, HookFailure, Modifier, ModifierTable, TypeKey,
};

/// A scene graph node.
///
/// # Hierarchy
///
/// Nodes live in the [`Scene`](crate::scene::Scene) arena and refer to each
/// other through [`NodeHandle`]s:
/// - `parent`: non-owning back-reference (None for the root and unowned nodes)
/// - `children`: owning child slots; `None` marks a slot emptied by a detach
///
/// Hierarchy edits go through the `Scene`, which keeps both sides in sync.
///
/// # Transform
///
/// - `local_transform`: relative to the parent
/// - `world_transform`: the value the parent propagated during the last
///   update, unless pinned with [`set_world_transform_current`](Self::set_world_transform_current)
///
/// The value handed to children is `world_transform * local_transform`
/// ([`propagated_transform`](Self::propagated_transform)).
///
/// # Bounds
///
/// `world_aabb` is the union of the children's boxes after each update,
/// unless pinned. A leaf keeps whatever it had (empty by default, or what a
/// component wrote).
#[derive(Debug)]
pub struct Node {
    name: String,

    // === Core Hierarchy ===
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<Option<NodeHandle>>,

    // === Core Spatial Data ===
    local_transform: Affine3A,
    world_transform: Affine3A,
    world_transform_current: bool,
    world_aabb: BoundingBox,
    world_aabb_current: bool,

    // === Extensions ===
    modifiers: ModifierTable,
    components: ComponentTable,
}

impl Node {
    /// Creates a detached node with identity transforms, an empty box and
    /// both currency flags cleared.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            local_transform: Affine3A::IDENTITY,
            world_transform: Affine3A::IDENTITY,
            world_transform_current: false,
            world_aabb: BoundingBox::EMPTY,
            world_aabb_current: false,
            modifiers: ModifierTable::new(),
            components: ComponentTable::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Raw child slots, tombstones included.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Option<NodeHandle>] {
        &self.children
    }

    /// Occupied child slots in slot order.
    pub fn child_handles(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.children.iter().flatten().copied()
    }

    #[inline]
    #[must_use]
    pub fn has_children(&self) -> bool {
        self.children.iter().any(Option::is_some)
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn local_transform(&self) -> &Affine3A {
        &self.local_transform
    }

    pub fn set_local_transform(&mut self, transform: Affine3A) {
        self.local_transform = transform;
    }

    #[inline]
    #[must_use]
    pub fn world_transform(&self) -> &Affine3A {
        &self.world_transform
    }

    /// Writes the world transform without touching the currency flag. An
    /// unpinned node gets it overwritten on the next update.
    pub fn set_world_transform(&mut self, transform: Affine3A) {
        self.world_transform = transform;
    }

    #[inline]
    #[must_use]
    pub fn world_transform_is_current(&self) -> bool {
        self.world_transform_current
    }

    pub fn set_world_transform_current(&mut self, current: bool) {
        self.world_transform_current = current;
    }

    /// Sets the world transform and exempts it from propagation.
    pub fn pin_world_transform(&mut self, transform: Affine3A) {
        self.world_transform = transform;
        self.world_transform_current = true;
    }

    /// `world * local`: what this node hands to its children.
    #[inline]
    #[must_use]
    pub fn propagated_transform(&self) -> Affine3A {
        self.world_transform * self.local_transform
    }

    /// Maps a point from this node's local space into world space.
    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.propagated_transform().transform_point3(point)
    }

    // ========================================================================
    // Bounds
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn world_aabb(&self) -> &BoundingBox {
        &self.world_aabb
    }

    pub fn set_world_aabb(&mut self, aabb: BoundingBox) {
        self.world_aabb = aabb;
    }

    #[inline]
    #[must_use]
    pub fn world_aabb_is_current(&self) -> bool {
        self.world_aabb_current
    }

    pub fn set_world_aabb_current(&mut self, current: bool) {
        self.world_aabb_current = current;
    }

    /// Sets the box and exempts it from recomputation. The pinned box still
    /// takes part in the parent's union.
    pub fn pin_world_aabb(&mut self, aabb: BoundingBox) {
        self.world_aabb = aabb;
        self.world_aabb_current = true;
    }

    // ========================================================================
    // Components
    // ========================================================================

    /// Attaches `component`, replacing any previous instance of the same type.
    /// Returns true when an instance was replaced.
    pub fn add_component<T: Component>(&mut self, component: T) -> bool {
        self.components
            .insert(TypeKey::of::<T>(), Box::new(component))
            .is_some()
    }

    pub fn get_component<T: Component>(&self) -> Result<&T> {
        self.components
            .get::<T>()
            .ok_or(SceneError::ComponentNotFound(std::any::type_name::<T>()))
    }

    pub fn get_component_mut<T: Component>(&mut self) -> Result<&mut T> {
        self.components
            .get_mut::<T>()
            .ok_or(SceneError::ComponentNotFound(std::any::type_name::<T>()))
    }

    #[must_use]
    pub fn has_component<T: Component>(&self) -> bool {
        self.components.contains::<T>()
    }

    pub fn remove_component<T: Component>(&mut self) -> Option<T> {
        self.components.remove::<T>()
    }

    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    #[inline]
    #[must_use]
    pub fn components(&self) -> &ComponentTable {
        &self.components
    }

    // ========================================================================
    // Modifiers
    // ========================================================================

    /// Attaches `modifier`, replacing any previous instance of the same type.
    pub fn add_modifier<T: Modifier>(&mut self, modifier: T) -> bool {
        self.modifiers
            .insert(TypeKey::of::<T>(), Box::new(modifier))
            .is_some()
    }

    pub fn get_modifier<T: Modifier>(&self) -> Result<&T> {
        self.modifiers
            .get::<T>()
            .ok_or(SceneError::ComponentNotFound(std::any::type_name::<T>()))
    }

    pub fn get_modifier_mut<T: Modifier>(&mut self) -> Result<&mut T> {
        self.modifiers
            .get_mut::<T>()
            .ok_or(SceneError::ComponentNotFound(std::any::type_name::<T>()))
    }

    #[must_use]
    pub fn has_modifier<T: Modifier>(&self) -> bool {
        self.modifiers.contains::<T>()
    }

    pub fn remove_modifier<T: Modifier>(&mut self) -> Option<T> {
        self.modifiers.remove::<T>()
    }

    #[inline]
    #[must_use]
    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }

    #[inline]
    #[must_use]
    pub fn modifiers(&self) -> &ModifierTable {
        &self.modifiers
    }

    /// Runs every modifier, then every component, in insertion order.
    ///
    /// The tables are moved out for the duration of the pass so each hook can
    /// borrow the node mutably. Entries added by hooks are merged back
    /// afterwards.
    pub(crate) fn run_hooks(&mut self, dt: f32) -> std::result::Result<(), HookFailure> {
        let mut modifiers = std::mem::take(&mut self.modifiers);
        let result = modifiers.dispatch(|m| m.update(self, dt));
        let added = std::mem::replace(&mut self.modifiers, modifiers);
        self.modifiers.absorb(added);
        result?;

        let mut components = std::mem::take(&mut self.components);
        let result = components.dispatch(|c| c.update(self, dt));
        let added = std::mem::replace(&mut self.components, components);
        self.components.absorb(added);
        result
    }

    /// Copy used by instancing: spatial state, flags and whatever components
    /// `clone_component` duplicates. Modifiers and hierarchy are not copied.
    pub(crate) fn duplicate<F>(&self, name: &str, clone_component: F) -> Self
    where
        F: FnMut(&dyn Component) -> Option<Box<dyn Component>>,
    {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            local_transform: self.local_transform,
            world_transform: self.world_transform,
            world_transform_current: self.world_transform_current,
            world_aabb: self.world_aabb,
            world_aabb_current: self.world_aabb_current,
            modifiers: ModifierTable::new(),
            components: self.components.clone_where(clone_component),
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::HookError;

    #[derive(Debug, PartialEq)]
    struct Counter(u32);

    impl Component for Counter {
        fn update(&mut self, _node: &mut Node, _dt: f32) -> crate::errors::HookResult {
            self.0 += 1;
            Ok(())
        }
    }

    struct Spawner;

    impl Component for Spawner {
        fn update(&mut self, node: &mut Node, _dt: f32) -> crate::errors::HookResult {
            node.add_component(Counter(100));
            Ok(())
        }
    }

    struct Broken;

    impl Modifier for Broken {
        fn update(&mut self, _node: &mut Node, _dt: f32) -> crate::errors::HookResult {
            Err(HookError::msg("boom"))
        }
    }

    #[test]
    fn fresh_node_defaults() {
        let node = Node::new("n");
        assert_eq!(node.name(), "n");
        assert!(!node.world_transform_is_current());
        assert!(!node.world_aabb_is_current());
        assert_eq!(*node.world_aabb(), BoundingBox::EMPTY);
        assert_eq!(*node.world_transform(), Affine3A::IDENTITY);
        assert_eq!(*node.local_transform(), Affine3A::IDENTITY);
        assert!(node.parent().is_none());
        assert!(node.children().is_empty());
    }

    #[test]
    fn pinning_sets_flags() {
        let mut node = Node::new("n");
        node.pin_world_aabb(BoundingBox::splat(0.0, 1.0));
        node.pin_world_transform(Affine3A::from_translation(Vec3::X));
        assert!(node.world_aabb_is_current());
        assert!(node.world_transform_is_current());
    }

    #[test]
    fn missing_component_is_an_error() {
        let node = Node::new("n");
        assert!(matches!(
            node.get_component::<Counter>(),
            Err(SceneError::ComponentNotFound(_))
        ));
        assert!(!node.has_component::<Counter>());
    }

    #[test]
    fn hooks_added_during_dispatch_are_merged() {
        let mut node = Node::new("n");
        node.add_component(Spawner);
        node.run_hooks(0.1).unwrap();
        assert_eq!(node.get_component::<Counter>().unwrap(), &Counter(100));
        assert_eq!(node.components().len(), 2);
    }

    #[test]
    fn failing_modifier_stops_component_pass() {
        let mut node = Node::new("n");
        node.add_modifier(Broken);
        node.add_component(Counter(0));

        let failure = node.run_hooks(0.1).unwrap_err();
        assert!(failure.hook.ends_with("Broken"));
        assert_eq!(node.get_component::<Counter>().unwrap(), &Counter(0));
        assert!(node.has_modifier::<Broken>());
    }

    #[test]
    fn transform_point_uses_world_then_local() {
        let mut node = Node::new("n");
        node.set_world_transform(Affine3A::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        node.set_local_transform(Affine3A::from_translation(Vec3::new(0.0, 2.0, 0.0)));
        assert_eq!(node.transform_point(Vec3::ZERO), Vec3::new(1.0, 2.0, 0.0));
    }
}
