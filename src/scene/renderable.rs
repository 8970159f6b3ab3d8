use crate::errors::HookResult;
use crate::scene::bounds::BoundingBox;
use crate::scene::component::Component;
use crate::scene::node::Node;
use crate::scene::{MaterialHandle, MeshHandle};

/// Links a node to mesh and material resources owned elsewhere.
///
/// The handles are opaque to the scene graph; instancing copies them as-is
/// so the copy shares the same GPU data.
///
/// Each frame the component fits the node's world box around `local_bounds`
/// using the node's propagated transform as it stands when hooks run, i.e.
/// the transform from the previous update.
#[derive(Debug, Clone)]
pub struct Renderable {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub local_bounds: BoundingBox,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
}

impl Renderable {
    #[must_use]
    pub fn new(mesh: MeshHandle, material: MaterialHandle, local_bounds: BoundingBox) -> Self {
        Self {
            mesh,
            material,
            local_bounds,
            cast_shadows: true,
            receive_shadows: true,
        }
    }
}

impl Component for Renderable {
    fn update(&mut self, node: &mut Node, _dt: f32) -> HookResult {
        if !node.world_aabb_is_current() {
            let fitted = self.local_bounds.transform(&node.propagated_transform());
            node.set_world_aabb(fitted);
        }
        Ok(())
    }
}
