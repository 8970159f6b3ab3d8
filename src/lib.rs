#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Arbor: a hierarchical scene graph.
//!
//! Nodes form a tree inside a [`Scene`]. Each frame, [`Scene::update`]
//! walks the tree depth-first: it runs the node's modifiers and components,
//! propagates world transforms down, and unions world bounding boxes back
//! up. Renderers read the results after the update returns, typically
//! through [`Scene::visible_list`].
//!
//! ```rust,ignore
//! use arbor::prelude::*;
//!
//! let mut scene = Scene::new();
//! let root = scene.create_node("root");
//! scene.set_root(root)?;
//! let child = scene.add_child_named(root, "child")?;
//! scene.node(child).set_translation(Vec3::new(0.0, 1.0, 0.0));
//! scene.update(1.0 / 60.0);
//! ```

pub mod errors;
pub mod scene;

pub use errors::{HookError, HookResult, Result, SceneError};
pub use scene::{BoundingBox, Component, Modifier, Node, NodeHandle, Scene};

/// Common imports for scene users.
pub mod prelude {
    pub use crate::errors::{HookError, HookResult, Result, SceneError};
    pub use crate::scene::{
        BoundingBox, Camera, CameraBuilder, ChildRef, Component, DirectionLightBuilder,
        HookFailurePolicy, Light, LightKind, MaterialHandle, MeshHandle, Modifier, Node,
        NodeHandle, PointLightBuilder, Renderable, Scene, SceneSettings, SpotLightBuilder,
    };
    pub use glam::{Affine3A, Quat, Vec3};
}
