use glam::Affine3A;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use crate::errors::{Result, SceneError};
use crate::scene::NodeHandle;
use crate::scene::camera::{Camera, CameraBuilder};
use crate::scene::component::{Component, Erased};
use crate::scene::light::{DirectionLightBuilder, Light, PointLightBuilder, SpotLightBuilder};
use crate::scene::node::Node;
use crate::scene::renderable::Renderable;
use crate::scene::settings::SceneSettings;
use crate::scene::transform_system::{self, UpdateStats};
use crate::scene::wrapper::NodeMut;

/// Identifies a child of a given parent, either by handle or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildRef<'a> {
    Handle(NodeHandle),
    Name(&'a str),
}

impl From<NodeHandle> for ChildRef<'_> {
    fn from(handle: NodeHandle) -> Self {
        ChildRef::Handle(handle)
    }
}

impl<'a> From<&'a str> for ChildRef<'a> {
    fn from(name: &'a str) -> Self {
        ChildRef::Name(name)
    }
}

/// Scene graph container.
///
/// The scene owns every node in an arena. A node is *owned* when it sits in
/// some parent's child slot (or is the root); destroying a node destroys
/// everything it owns. Nodes created through [`create_node`](Self::create_node)
/// or the `make_*` factories start out unowned and stay alive until they are
/// attached somewhere or destroyed.
///
/// Besides the tree, the scene keeps:
/// - a name → node registry used by tooling and instancing
/// - the light nodes and the camera node made through its factories. That
///   bookkeeping is independent of the tree; the caller attaches those
///   nodes wherever they belong.
pub struct Scene {
    pub(crate) nodes: SlotMap<NodeHandle, Node>,
    root: Option<NodeHandle>,

    items: FxHashMap<String, NodeHandle>,
    lights: Vec<NodeHandle>,
    camera: Option<NodeHandle>,
    warned_unattached: FxHashSet<NodeHandle>,

    settings: SceneSettings,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(SceneSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: SceneSettings) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            items: FxHashMap::default(),
            lights: Vec::new(),
            camera: None,
            warned_unattached: FxHashSet::default(),
            settings,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SceneSettings {
        &mut self.settings
    }

    // ========================================================================
    // Node access
    // ========================================================================

    /// Creates an unowned node with identity transforms.
    pub fn create_node(&mut self, name: &str) -> NodeHandle {
        self.nodes.insert(Node::new(name))
    }

    /// Number of live nodes in the arena, owned or not.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Like [`get_node`](Self::get_node) but reports stale handles.
    pub fn try_node(&self, handle: NodeHandle) -> Result<&Node> {
        self.nodes
            .get(handle)
            .ok_or(SceneError::AlreadyDestroyed(handle))
    }

    pub fn try_node_mut(&mut self, handle: NodeHandle) -> Result<&mut Node> {
        self.nodes
            .get_mut(handle)
            .ok_or(SceneError::AlreadyDestroyed(handle))
    }

    /// Chainable editor for one node.
    pub fn node(&mut self, handle: NodeHandle) -> NodeMut<'_> {
        NodeMut::new(self, handle)
    }

    // ========================================================================
    // Component shortcuts
    // ========================================================================

    pub fn add_component<T: Component>(&mut self, handle: NodeHandle, component: T) -> Result<()> {
        self.try_node_mut(handle)?.add_component(component);
        Ok(())
    }

    pub fn get_component<T: Component>(&self, handle: NodeHandle) -> Result<&T> {
        self.try_node(handle)?.get_component::<T>()
    }

    pub fn get_component_mut<T: Component>(&mut self, handle: NodeHandle) -> Result<&mut T> {
        self.try_node_mut(handle)?.get_component_mut::<T>()
    }

    /// False for stale handles as well as for nodes without a `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, handle: NodeHandle) -> bool {
        self.nodes
            .get(handle)
            .is_some_and(Node::has_component::<T>)
    }

    // ========================================================================
    // Hierarchy: Attach / Detach
    // ========================================================================

    /// Moves ownership of `child` into a slot of `parent` and points the
    /// child's back-reference at `parent`.
    ///
    /// The first empty slot (or one holding a destroyed node) is reused,
    /// otherwise the child is appended. If `child` was owned elsewhere, its
    /// old slot is emptied first. Returns the slot index.
    pub fn add_child(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<usize> {
        self.try_node(parent)?;
        self.try_node(child)?;

        if parent == child {
            return Err(SceneError::InvalidArgument(
                "cannot attach a node to itself".to_string(),
            ));
        }
        if self.root == Some(child) {
            return Err(SceneError::InvalidArgument(
                "the scene root cannot become a child".to_string(),
            ));
        }
        if self.owns(child, parent) {
            return Err(SceneError::InvalidArgument(format!(
                "attaching '{}' under '{}' would create a cycle",
                self.nodes[child].name(),
                self.nodes[parent].name()
            )));
        }

        // 1. Detach from old owner
        self.release_from_owner(child);

        // 2. Attach to new
        let free = self.nodes[parent]
            .children
            .iter()
            .position(|slot| slot.is_none_or(|h| !self.nodes.contains_key(h)));
        let slots = &mut self.nodes[parent].children;
        let index = if let Some(free) = free {
            slots[free] = Some(child);
            free
        } else {
            slots.push(Some(child));
            slots.len() - 1
        };

        // 3. Update child
        self.nodes[child].parent = Some(parent);

        Ok(index)
    }

    /// Constructs a fresh child of `parent`, honoring the same slot reuse.
    pub fn add_child_named(&mut self, parent: NodeHandle, name: &str) -> Result<NodeHandle> {
        self.try_node(parent)?;
        let child = self.create_node(name);
        self.add_child(parent, child)?;
        Ok(child)
    }

    /// Argument order of `attach(child, parent)`; same effect as
    /// [`add_child`](Self::add_child).
    pub fn reparent(&mut self, child: NodeHandle, new_parent: NodeHandle) -> Result<usize> {
        self.add_child(new_parent, child)
    }

    /// Empties the first slot of `parent` that matches `child`, without
    /// shrinking the slot list, and clears the detached node's parent.
    ///
    /// Returns the detached node (now unowned), or `None` when nothing
    /// matched.
    pub fn detach_child<'a>(
        &mut self,
        parent: NodeHandle,
        child: impl Into<ChildRef<'a>>,
    ) -> Result<Option<NodeHandle>> {
        let wanted = child.into();
        let node = self.try_node(parent)?;

        let found = node.children.iter().enumerate().find_map(|(i, slot)| {
            let handle = (*slot)?;
            let matches = match wanted {
                ChildRef::Handle(h) => h == handle,
                ChildRef::Name(name) => self.nodes.get(handle).is_some_and(|n| n.name() == name),
            };
            matches.then_some((i, handle))
        });

        let Some((index, handle)) = found else {
            return Ok(None);
        };

        self.nodes[parent].children[index] = None;
        if let Some(detached) = self.nodes.get_mut(handle) {
            detached.parent = None;
        }
        log::debug!(
            "Detached '{}' from slot {index} of '{}'",
            self.nodes.get(handle).map_or("", Node::name),
            self.nodes[parent].name()
        );
        Ok(Some(handle))
    }

    /// Sets only the back-reference of `node`; `parent`'s slots are not
    /// touched.
    ///
    /// Fails with `InvalidArgument` when `parent` is `node` itself or already
    /// has `node` on its parent chain.
    pub fn set_parent(&mut self, node: NodeHandle, parent: Option<NodeHandle>) -> Result<()> {
        self.try_node(node)?;
        if let Some(p) = parent {
            self.try_node(p)?;
            if self.is_ancestor(node, p) {
                return Err(SceneError::InvalidArgument(format!(
                    "'{}' cannot be the parent of '{}': it would close a parent cycle",
                    self.nodes[p].name(),
                    self.nodes[node].name()
                )));
            }
        }
        self.try_node_mut(node)?.parent = parent;
        Ok(())
    }

    /// Bound-checked slot access. `Ok(None)` is an emptied slot.
    pub fn child(&self, parent: NodeHandle, index: usize) -> Result<Option<NodeHandle>> {
        let slots = &self.try_node(parent)?.children;
        slots
            .get(index)
            .copied()
            .ok_or(SceneError::IndexOutOfRange {
                index,
                len: slots.len(),
            })
    }

    /// Number of slots, empty ones included.
    pub fn child_count(&self, parent: NodeHandle) -> Result<usize> {
        Ok(self.try_node(parent)?.children.len())
    }

    /// Live children of `parent`, in slot order.
    pub fn children(&self, parent: NodeHandle) -> Result<Vec<NodeHandle>> {
        Ok(self
            .try_node(parent)?
            .child_handles()
            .filter(|&h| self.nodes.contains_key(h))
            .collect())
    }

    /// Destroys `handle` and every node it owns.
    ///
    /// The slot holding it in its parent is emptied; registry entries, the
    /// tracked lights and camera, and the root that pointed into the
    /// destroyed subtree are forgotten.
    pub fn destroy_node(&mut self, handle: NodeHandle) -> Result<()> {
        self.try_node(handle)?;

        self.release_from_owner(handle);

        let doomed = transform_system::collect_preorder(&self.nodes, handle);
        for &h in &doomed {
            self.nodes.remove(h);
        }

        if self.root.is_some_and(|r| !self.nodes.contains_key(r)) {
            self.root = None;
        }
        self.items.retain(|_, h| self.nodes.contains_key(*h));
        self.lights.retain(|h| self.nodes.contains_key(*h));
        self.warned_unattached.retain(|h| self.nodes.contains_key(*h));
        if self.camera.is_some_and(|c| !self.nodes.contains_key(c)) {
            self.camera = None;
        }

        log::debug!("Destroyed {} node(s)", doomed.len());
        Ok(())
    }

    /// First node named `name` in a pre-order walk from `start`.
    #[must_use]
    pub fn find_by_name(&self, start: NodeHandle, name: &str) -> Option<NodeHandle> {
        transform_system::collect_preorder(&self.nodes, start)
            .into_iter()
            .find(|&h| self.nodes[h].name() == name)
    }

    /// True when `ancestor` is `node` or lies on `node`'s parent chain.
    ///
    /// The walk follows back-references and stops after as many steps as
    /// there are nodes.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = Some(node);
        for _ in 0..=self.nodes.len() {
            let Some(h) = current else {
                return false;
            };
            if h == ancestor {
                return true;
            }
            current = self.nodes.get(h).and_then(Node::parent);
        }
        false
    }

    /// True when `node` is `owner` or sits in `owner`'s subtree, following
    /// child slots rather than back-references.
    fn owns(&self, owner: NodeHandle, node: NodeHandle) -> bool {
        transform_system::collect_preorder(&self.nodes, owner).contains(&node)
    }

    /// Empties the slot that owns `child`.
    ///
    /// The back-reference is tried first. When it does not name a node that
    /// actually holds `child` (see [`set_parent`](Self::set_parent)), every
    /// node is scanned.
    fn release_from_owner(&mut self, child: NodeHandle) {
        if let Some(parent) = self.nodes.get(child).and_then(Node::parent)
            && let Some(p) = self.nodes.get_mut(parent)
            && let Some(slot) = p.children.iter_mut().find(|s| **s == Some(child))
        {
            *slot = None;
            return;
        }

        for (_, node) in &mut self.nodes {
            for slot in &mut node.children {
                if *slot == Some(child) {
                    *slot = None;
                }
            }
        }
    }

    // ========================================================================
    // Root
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<NodeHandle> {
        self.root
    }

    /// Makes `handle` the root and returns the previous root. The previous
    /// root is left alive and unowned.
    pub fn set_root(&mut self, handle: NodeHandle) -> Result<Option<NodeHandle>> {
        if self.try_node(handle)?.parent.is_some() {
            return Err(SceneError::InvalidArgument(format!(
                "'{}' is owned by another node and cannot be the root",
                self.nodes[handle].name()
            )));
        }
        Ok(self.root.replace(handle))
    }

    pub fn clear_root(&mut self) -> Option<NodeHandle> {
        self.root.take()
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Per-frame update from the root with an identity parent transform.
    /// No-op without a root.
    pub fn update(&mut self, dt: f32) -> UpdateStats {
        let Some(root) = self.root else {
            return UpdateStats::default();
        };

        if self.settings.warn_unattached {
            self.warn_unattached();
        }

        transform_system::update_subtree(
            &mut self.nodes,
            root,
            dt,
            Affine3A::IDENTITY,
            self.settings.hook_failure,
        )
    }

    /// Warns once per tracked node that is not attached. A node that gets
    /// attached and later drops out again is reported again.
    fn warn_unattached(&mut self) {
        let unattached = self.unattached_tracked();
        self.warned_unattached.retain(|h| unattached.contains(h));
        for handle in unattached {
            if self.warned_unattached.insert(handle) {
                log::warn!(
                    "'{}' is tracked by the scene but not attached; it will not be updated",
                    self.nodes[handle].name()
                );
            }
        }
    }

    /// Updates the subtree at `handle` as if its parent had propagated
    /// `parent_world`.
    pub fn update_node(
        &mut self,
        handle: NodeHandle,
        dt: f32,
        parent_world: Affine3A,
    ) -> Result<UpdateStats> {
        self.try_node(handle)?;
        Ok(transform_system::update_subtree(
            &mut self.nodes,
            handle,
            dt,
            parent_world,
            self.settings.hook_failure,
        ))
    }

    /// Every node reachable from the root, pre-order, root first.
    ///
    /// No culling is applied.
    #[must_use]
    pub fn visible_list(&self) -> Vec<NodeHandle> {
        self.root
            .map(|root| transform_system::collect_preorder(&self.nodes, root))
            .unwrap_or_default()
    }

    // ========================================================================
    // Registry & instancing
    // ========================================================================

    /// Registers `handle` under its current name, replacing an earlier entry.
    pub fn register_item(&mut self, handle: NodeHandle) -> Result<()> {
        let name = self.try_node(handle)?.name().to_string();
        if let Some(previous) = self.items.insert(name, handle)
            && previous != handle
        {
            log::debug!(
                "Registry entry '{}' now points at a different node",
                self.nodes[handle].name()
            );
        }
        Ok(())
    }

    pub fn unregister_item(&mut self, name: &str) -> Option<NodeHandle> {
        self.items.remove(name)
    }

    #[must_use]
    pub fn item(&self, name: &str) -> Option<NodeHandle> {
        self.items.get(name).copied()
    }

    /// Duplicates the subtree registered as `source_name` under the same
    /// parent and registers the copy as `new_name`.
    ///
    /// Names, transforms, currency flags, boxes and [`Renderable`] links are
    /// copied; other components and modifiers are not.
    pub fn create_instance(&mut self, source_name: &str, new_name: &str) -> Result<NodeHandle> {
        let source = self
            .item(source_name)
            .ok_or_else(|| SceneError::ItemNotFound(source_name.to_string()))?;

        if self.root == Some(source) {
            return Err(SceneError::InvalidArgument(format!(
                "cannot instance the scene root '{source_name}'"
            )));
        }
        let Some(parent) = self.try_node(source)?.parent else {
            return Err(SceneError::InvalidArgument(format!(
                "cannot instance '{source_name}': it is not attached to a parent"
            )));
        };

        let copy = self.duplicate_subtree(source, Some(new_name));
        self.add_child(parent, copy)?;
        self.register_item(copy)?;

        log::debug!("Instanced '{source_name}' as '{new_name}'");
        Ok(copy)
    }

    fn duplicate_subtree(&mut self, source: NodeHandle, rename: Option<&str>) -> NodeHandle {
        let (copy, children) = {
            let node = &self.nodes[source];
            let name = rename.unwrap_or(node.name());
            let copy = node.duplicate(name, |c| {
                c.as_any()
                    .downcast_ref::<Renderable>()
                    .map(|r| Box::new(r.clone()) as Box<dyn Component>)
            });
            (copy, node.child_handles().collect::<Vec<_>>())
        };

        let handle = self.nodes.insert(copy);
        for child in children {
            let child_copy = self.duplicate_subtree(child, None);
            self.nodes[child_copy].parent = Some(handle);
            self.nodes[handle].children.push(Some(child_copy));
        }
        handle
    }

    // ========================================================================
    // Lights & camera
    // ========================================================================

    pub fn make_point_light(&mut self, builder: &PointLightBuilder, name: &str) -> NodeHandle {
        self.make_light(builder.build(), name)
    }

    pub fn make_spot_light(&mut self, builder: &SpotLightBuilder, name: &str) -> NodeHandle {
        self.make_light(builder.build(), name)
    }

    pub fn make_direction_light(&mut self, builder: &DirectionLightBuilder, name: &str) -> NodeHandle {
        self.make_light(builder.build(), name)
    }

    fn make_light(&mut self, light: Light, name: &str) -> NodeHandle {
        let mut node = Node::new(name);
        node.add_component(light);
        let handle = self.nodes.insert(node);
        self.items.insert(name.to_string(), handle);
        self.lights.push(handle);
        handle
    }

    /// Creates an unowned camera node and tracks it as the scene camera,
    /// replacing the previously tracked one. The previous camera node is
    /// left where it is.
    pub fn make_camera(&mut self, builder: &CameraBuilder, name: &str) -> NodeHandle {
        let mut node = Node::new(name);
        node.add_component(builder.build(name));
        let handle = self.nodes.insert(node);
        self.items.insert(name.to_string(), handle);
        if let Some(previous) = self.camera.replace(handle) {
            log::debug!("Scene camera replaced (previous node {previous:?} kept)");
        }
        handle
    }

    #[inline]
    #[must_use]
    pub fn lights(&self) -> &[NodeHandle] {
        &self.lights
    }

    #[inline]
    #[must_use]
    pub fn camera(&self) -> Option<NodeHandle> {
        self.camera
    }

    /// Tracked light and camera nodes that the traversal does not reach
    /// from the root.
    #[must_use]
    pub fn unattached_tracked(&self) -> Vec<NodeHandle> {
        let reachable: FxHashSet<NodeHandle> = self.visible_list().into_iter().collect();
        self.lights
            .iter()
            .copied()
            .chain(self.camera)
            .filter(|h| !reachable.contains(h))
            .collect()
    }

    /// The tracked camera component, if the camera node is alive.
    pub fn camera_component(&self) -> Option<&Camera> {
        self.camera
            .and_then(|h| self.nodes.get(h))
            .and_then(|n| n.get_component::<Camera>().ok())
    }
}
