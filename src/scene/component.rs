//! Typed per-node extension tables.
//!
//! A node carries two [`HookTable`]s: one of [`Modifier`]s and one of
//! [`Component`]s. Both are keyed by the concrete Rust type of the stored
//! value ([`TypeKey`]), hold at most one instance per type, and keep
//! insertion order so the per-frame dispatch is deterministic.
//!
//! During traversal the modifiers run first, then the components, each as
//! `update(node, dt)`. The hook sees only the node's own state; it has no
//! path to the arena, so it can't restructure the tree mid-traversal.

use std::any::{Any, TypeId};
use std::fmt;

use crate::errors::HookResult;
use crate::scene::node::Node;

/// Stable per-type key used by the hook tables.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl std::hash::Hash for TypeKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Data or behavior attached to a node, looked up by its concrete type.
///
/// Structural edits made from inside [`update`](Self::update) are limited to
/// additions: components or modifiers added to `node` during the hook pass
/// are merged in once the pass finishes, while removals of entries that are
/// currently dispatching have no effect.
pub trait Component: Any {
    /// Per-frame hook, run before the node's transform is propagated.
    fn update(&mut self, _node: &mut Node, _dt: f32) -> HookResult {
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Per-frame behavior dispatched ahead of all components of the node.
///
/// Same contract as [`Component`]; the separate table only fixes ordering.
pub trait Modifier: Any {
    fn update(&mut self, _node: &mut Node, _dt: f32) -> HookResult {
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Glue between a hook trait object and `dyn Any` for downcasting.
pub trait Erased: 'static {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn hook_name(&self) -> &'static str;
}

impl Erased for dyn Component {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
    fn hook_name(&self) -> &'static str {
        self.type_name()
    }
}

impl Erased for dyn Modifier {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
    fn hook_name(&self) -> &'static str {
        self.type_name()
    }
}

/// A hook that returned an error during dispatch.
#[derive(Debug)]
pub struct HookFailure {
    pub hook: &'static str,
    pub error: crate::errors::HookError,
}

/// Insertion-ordered, type-keyed table of boxed hooks.
pub struct HookTable<H: ?Sized + Erased> {
    entries: Vec<(TypeKey, Box<H>)>,
}

pub type ComponentTable = HookTable<dyn Component>;
pub type ModifierTable = HookTable<dyn Modifier>;

impl<H: ?Sized + Erased> HookTable<H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Stores `value` under `key`, replacing in place any previous instance of
    /// the same type. Returns the replaced instance.
    pub fn insert(&mut self, key: TypeKey, value: Box<H>) -> Option<Box<H>> {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.entries.iter().any(|(k, _)| k.id == id)
    }

    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<&T> {
        let id = TypeId::of::<T>();
        self.entries
            .iter()
            .find(|(k, _)| k.id == id)
            .and_then(|(_, v)| v.as_any().downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        let id = TypeId::of::<T>();
        self.entries
            .iter_mut()
            .find(|(k, _)| k.id == id)
            .and_then(|(_, v)| v.as_any_mut().downcast_mut::<T>())
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        let id = TypeId::of::<T>();
        let pos = self.entries.iter().position(|(k, _)| k.id == id)?;
        let (_, boxed) = self.entries.remove(pos);
        boxed.into_any().downcast::<T>().ok().map(|b| *b)
    }

    /// Keys in dispatch order.
    pub fn keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn iter(&self) -> impl Iterator<Item = &H> {
        self.entries.iter().map(|(_, v)| &**v)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Moves every entry of `other` into `self` with replace-on-insert.
    pub(crate) fn absorb(&mut self, other: Self) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Calls `f` on each entry in order, stopping at the first error.
    pub(crate) fn dispatch<F>(&mut self, mut f: F) -> Result<(), HookFailure>
    where
        F: FnMut(&mut H) -> HookResult,
    {
        for (_, hook) in &mut self.entries {
            if let Err(error) = f(&mut **hook) {
                return Err(HookFailure {
                    hook: hook.hook_name(),
                    error,
                });
            }
        }
        Ok(())
    }

    /// Builds a new table from the entries `f` agrees to duplicate.
    pub(crate) fn clone_where<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&H) -> Option<Box<H>>,
    {
        let entries = self
            .entries
            .iter()
            .filter_map(|(k, v)| f(&**v).map(|cloned| (*k, cloned)))
            .collect();
        Self { entries }
    }
}

impl<H: ?Sized + Erased> Default for HookTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized + Erased> fmt::Debug for HookTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter().map(|(k, _)| k)).finish()
    }
}
