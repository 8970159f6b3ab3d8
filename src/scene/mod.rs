//! Scene graph module
//!
//! Manages the node hierarchy and everything hung off it:
//! - Node: tree node with local/world transforms, world bounds and extensions
//! - Scene: node arena, root, name registry, light/camera bookkeeping
//! - Component / Modifier: typed per-node per-frame hooks
//! - TransformSystem: the per-frame traversal
//! - Camera / Light / Renderable: built-in components

pub mod bounds;
pub mod camera;
pub mod component;
pub mod light;
pub mod node;
pub mod renderable;
pub mod scene;
pub mod settings;
pub mod transform_system;
pub mod wrapper;

pub use bounds::BoundingBox;
pub use camera::{Camera, CameraBuilder, ProjectionType};
pub use component::{Component, Modifier, TypeKey};
pub use light::{DirectionLightBuilder, Light, LightKind, PointLightBuilder, SpotLightBuilder};
pub use node::Node;
pub use renderable::Renderable;
pub use scene::{ChildRef, Scene};
pub use settings::{HookFailurePolicy, SceneSettings};
pub use transform_system::UpdateStats;
pub use wrapper::NodeMut;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct MeshHandle;
    pub struct MaterialHandle;
}
