use glam::Vec3;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

use crate::scene::component::Component;

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {}

#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub range: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotLight {
    pub range: f32,
    pub inner_cone: f32,
    pub outer_cone: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LightKind {
    Directional(DirectionalLight),
    Point(PointLight),
    Spot(SpotLight),
}

/// Light component. Position and direction come from the owning node's
/// transform, so a light only lights anything once its node is in the tree.
#[derive(Debug, Clone)]
pub struct Light {
    pub uuid: Uuid,
    pub id: u64,
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
    pub cast_shadows: bool,
}

impl Light {
    fn generate_id_from_uuid(uuid: &Uuid) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        uuid.hash(&mut hasher);
        hasher.finish()
    }

    fn with_kind(color: Vec3, intensity: f32, kind: LightKind, cast_shadows: bool) -> Self {
        let uuid = Uuid::new_v4();
        Self {
            uuid,
            id: Self::generate_id_from_uuid(&uuid),
            color,
            intensity,
            kind,
            cast_shadows,
        }
    }

    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32) -> Self {
        Self::with_kind(color, intensity, LightKind::Directional(DirectionalLight {}), false)
    }

    #[must_use]
    pub fn new_point(color: Vec3, intensity: f32, range: f32) -> Self {
        Self::with_kind(color, intensity, LightKind::Point(PointLight { range }), false)
    }

    #[must_use]
    pub fn new_spot(color: Vec3, intensity: f32, range: f32, inner_cone: f32, outer_cone: f32) -> Self {
        Self::with_kind(
            color,
            intensity,
            LightKind::Spot(SpotLight {
                range,
                inner_cone,
                outer_cone,
            }),
            false,
        )
    }
}

impl Component for Light {}

// ============================================================================
// Builders consumed by `Scene::make_*_light`
// ============================================================================

#[derive(Debug, Clone)]
pub struct PointLightBuilder {
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
    pub cast_shadows: bool,
}

impl Default for PointLightBuilder {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            range: 10.0,
            cast_shadows: false,
        }
    }
}

impl PointLightBuilder {
    #[must_use]
    pub fn color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    #[must_use]
    pub fn range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    #[must_use]
    pub fn cast_shadows(mut self, cast: bool) -> Self {
        self.cast_shadows = cast;
        self
    }

    #[must_use]
    pub fn build(&self) -> Light {
        let mut light = Light::new_point(self.color, self.intensity, self.range);
        light.cast_shadows = self.cast_shadows;
        light
    }
}

#[derive(Debug, Clone)]
pub struct SpotLightBuilder {
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
    /// Radians.
    pub inner_cone: f32,
    /// Radians.
    pub outer_cone: f32,
    pub cast_shadows: bool,
}

impl Default for SpotLightBuilder {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            range: 10.0,
            inner_cone: std::f32::consts::FRAC_PI_8,
            outer_cone: std::f32::consts::FRAC_PI_4,
            cast_shadows: false,
        }
    }
}

impl SpotLightBuilder {
    #[must_use]
    pub fn color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    #[must_use]
    pub fn range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    #[must_use]
    pub fn cones(mut self, inner: f32, outer: f32) -> Self {
        self.inner_cone = inner;
        self.outer_cone = outer;
        self
    }

    #[must_use]
    pub fn build(&self) -> Light {
        let mut light = Light::new_spot(
            self.color,
            self.intensity,
            self.range,
            self.inner_cone,
            self.outer_cone,
        );
        light.cast_shadows = self.cast_shadows;
        light
    }
}

#[derive(Debug, Clone)]
pub struct DirectionLightBuilder {
    pub color: Vec3,
    pub intensity: f32,
    pub cast_shadows: bool,
}

impl Default for DirectionLightBuilder {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            cast_shadows: false,
        }
    }
}

impl DirectionLightBuilder {
    #[must_use]
    pub fn color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    #[must_use]
    pub fn cast_shadows(mut self, cast: bool) -> Self {
        self.cast_shadows = cast;
        self
    }

    #[must_use]
    pub fn build(&self) -> Light {
        let mut light = Light::new_directional(self.color, self.intensity);
        light.cast_shadows = self.cast_shadows;
        light
    }
}
