use glam::{Affine3A, Mat4};
use std::borrow::Cow;
use uuid::Uuid;

use crate::scene::component::Component;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionType {
    Perspective,
    Orthographic,
}

/// Camera component.
///
/// Projection parameters are user-owned. The view matrices are refreshed by
/// the traversal from the owning node's propagated transform; the renderer
/// only reads them.
#[derive(Debug, Clone)]
pub struct Camera {
    pub uuid: Uuid,
    pub name: Cow<'static, str>,

    pub projection_type: ProjectionType,
    /// Vertical field of view, radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub ortho_size: f32,

    pub(crate) world_matrix: Affine3A,
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
    pub(crate) view_projection_matrix: Mat4,
}

impl Camera {
    /// `fov` is given in degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            uuid: Uuid::new_v4(),
            name: Cow::Borrowed("Camera"),
            projection_type: ProjectionType::Perspective,
            fov: fov.to_radians(),
            aspect,
            near,
            far,
            ortho_size: 10.0,

            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
        };

        cam.update_projection_matrix();
        cam
    }

    #[must_use]
    pub fn new_orthographic(size: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self::new_perspective(45.0, aspect, near, far);
        cam.projection_type = ProjectionType::Orthographic;
        cam.ortho_size = size;
        cam.update_projection_matrix();
        cam
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = match self.projection_type {
            ProjectionType::Perspective => {
                Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
            }
            ProjectionType::Orthographic => {
                let w = self.ortho_size * self.aspect;
                let h = self.ortho_size;
                Mat4::orthographic_rh(-w, w, -h, h, self.near, self.far)
            }
        };

        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    pub fn update_view_projection(&mut self, world_transform: &Affine3A) {
        self.world_matrix = *world_transform;
        self.view_matrix = Mat4::from(*world_transform).inverse();
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_projection_matrix(&self) -> &Mat4 {
        &self.view_projection_matrix
    }
}

impl Component for Camera {}

/// Parameters consumed by `Scene::make_camera`.
#[derive(Debug, Clone)]
pub struct CameraBuilder {
    pub projection_type: ProjectionType,
    /// Degrees for perspective cameras.
    pub fov: f32,
    pub ortho_size: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraBuilder {
    fn default() -> Self {
        Self::perspective(45.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl CameraBuilder {
    #[must_use]
    pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            projection_type: ProjectionType::Perspective,
            fov,
            ortho_size: 10.0,
            aspect,
            near,
            far,
        }
    }

    #[must_use]
    pub fn orthographic(size: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            projection_type: ProjectionType::Orthographic,
            fov: 45.0,
            ortho_size: size,
            aspect,
            near,
            far,
        }
    }

    #[must_use]
    pub fn build(&self, name: &str) -> Camera {
        let mut cam = match self.projection_type {
            ProjectionType::Perspective => {
                Camera::new_perspective(self.fov, self.aspect, self.near, self.far)
            }
            ProjectionType::Orthographic => {
                Camera::new_orthographic(self.ortho_size, self.aspect, self.near, self.far)
            }
        };
        cam.name = Cow::Owned(name.to_string());
        cam
    }
}
