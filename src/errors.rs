//! Error Types
//!
//! This module defines the error types used throughout the scene graph.
//!
//! # Overview
//!
//! The main error type [`SceneError`] covers the structural failure modes of
//! the tree:
//! - Child-slot access outside the slot range
//! - Typed component or modifier lookups that miss
//! - Invalid arguments (cycles, instancing a root, re-parenting the root)
//! - Handles to nodes that were already destroyed
//! - Registry lookups by name that miss
//!
//! Per-frame hook failures use the separate [`HookError`] type. They never
//! escape [`Scene::update`](crate::scene::Scene::update); the traversal logs
//! them at the node boundary and carries on with the sibling subtrees.
//!
//! # Usage
//!
//! ```rust,ignore
//! use arbor::errors::{Result, SceneError};
//!
//! fn first_child(scene: &Scene, parent: NodeHandle) -> Result<Option<NodeHandle>> {
//!     scene.child(parent, 0)
//! }
//! ```

use thiserror::Error;

use crate::scene::NodeHandle;

/// The main error type for scene graph operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// A child slot index was outside the parent's slot range.
    #[error("Child index out of range: {index} (slot count: {len})")]
    IndexOutOfRange {
        /// The requested slot index
        index: usize,
        /// Number of slots (tombstones included)
        len: usize,
    },

    /// A typed lookup found no instance of the requested type.
    #[error("Component not found: {0}")]
    ComponentNotFound(&'static str),

    /// A required argument was unusable (self-parenting, cycles, root misuse).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The handle refers to a node that no longer exists.
    #[error("Node already destroyed: {0:?}")]
    AlreadyDestroyed(NodeHandle),

    /// No node is registered under the given name.
    #[error("Item not found: {0}")]
    ItemNotFound(String),
}

/// Failure reported by a component or modifier hook.
#[derive(Error, Debug)]
pub enum HookError {
    /// Plain message from the hook.
    #[error("{0}")]
    Message(String),

    /// Any other error the hook wants to surface.
    #[error("{0}")]
    Source(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HookError {
    /// Builds a [`HookError::Message`].
    pub fn msg(message: impl Into<String>) -> Self {
        HookError::Message(message.into())
    }
}

/// Alias for `Result<T, SceneError>`.
pub type Result<T> = std::result::Result<T, SceneError>;

/// Return type of component and modifier hooks.
pub type HookResult = std::result::Result<(), HookError>;
