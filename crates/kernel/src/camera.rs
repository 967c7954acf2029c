use glam::{Mat4, Vec3};
use stagecraft_config::CameraConfig;
use std::any::Any;

/// Capability set every camera assigned to a world must provide.
pub trait Camera: Any {
    fn aspect(&self) -> f32;

    fn set_aspect(&mut self, aspect: f32);

    /// Recompute the cached projection after a parameter change.
    fn update_projection_matrix(&mut self);

    fn projection_matrix(&self) -> Mat4;

    fn position(&self) -> Vec3;

    fn set_position(&mut self, position: Vec3);

    fn view_matrix(&self) -> Mat4;

    fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Perspective camera looking at a target point.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    projection: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(75.0, 16.0 / 9.0, 1.0, 1000.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Build from resolved configuration and an aspect ratio.
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self::new(config.fov, aspect, config.near, config.far);
        camera.position = config.position;
        camera.target = config.position + Vec3::NEG_Z;
        camera
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }
}

impl Camera for PerspectiveCamera {
    fn aspect(&self) -> f32 {
        self.aspect
    }

    fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    fn update_projection_matrix(&mut self) {
        self.projection =
            Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far);
    }

    fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        let offset = self.target - self.position;
        self.position = position;
        self.target = position + offset;
    }

    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }
}

/// Orthographic camera; `height` is the visible vertical extent in world units.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthographicCamera {
    pub height: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    projection: Mat4,
}

impl OrthographicCamera {
    pub fn new(height: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            height,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }
}

impl Camera for OrthographicCamera {
    fn aspect(&self) -> f32 {
        self.aspect
    }

    fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    fn update_projection_matrix(&mut self) {
        let half_h = self.height * 0.5;
        let half_w = half_h * self.aspect;
        self.projection =
            Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far);
    }

    fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        let offset = self.target - self.position;
        self.position = position;
        self.target = position + offset;
    }

    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }
}

/// Accept an untyped value as a camera if it is one of the known camera types.
pub(crate) fn downcast_camera(candidate: Box<dyn Any>) -> Result<Box<dyn Camera>, Box<dyn Any>> {
    let candidate = match candidate.downcast::<PerspectiveCamera>() {
        Ok(camera) => return Ok(camera),
        Err(other) => other,
    };
    match candidate.downcast::<OrthographicCamera>() {
        Ok(camera) => Ok(camera),
        Err(other) => Err(other),
    }
}
