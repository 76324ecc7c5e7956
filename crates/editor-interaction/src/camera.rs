use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::picking::Ray;

/// Camera uniform for the host's GPU buffer.
/// View-projection matrix in column-major order.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn from_mat4(mat: Mat4) -> Self {
        Self {
            view_proj: mat.to_cols_array_2d(),
        }
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::from_mat4(Mat4::IDENTITY)
    }
}

/// Canvas size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Screen coordinates (origin top-left) to normalized device coordinates (-1..1, y up)
    pub fn to_ndc(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new((x / self.width) * 2.0 - 1.0, -(y / self.height) * 2.0 + 1.0)
    }

    /// Normalized device coordinates back to screen coordinates
    pub fn from_ndc(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.width,
            (1.0 - ndc.y) * 0.5 * self.height,
        )
    }
}

/// Perspective camera looking from `position` at `target`
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Camera above and in front of the origin, looking down at it
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 75.0_f32.to_radians(),
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn build_view_projection_matrix(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.position, self.target, self.up);
        let proj = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
        proj * view
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform::from_mat4(self.build_view_projection_matrix())
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Unit vector the camera looks along
    pub fn view_direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    /// The camera's own up axis, orthogonal to the view direction
    pub fn up_vector(&self) -> Vec3 {
        let view = self.view_direction();
        let right = view.cross(self.up).try_normalize().unwrap_or(Vec3::X);
        right.cross(view).normalize()
    }

    /// Ray from the camera through a point in normalized device coordinates
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inv = self.build_view_projection_matrix().inverse();
        let point = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.5));
        Ray::new(self.position, point - self.position)
    }

    /// Ray through a screen pixel
    pub fn screen_to_ray(&self, x: f32, y: f32, viewport: Viewport) -> Ray {
        self.ray_from_ndc(viewport.to_ndc(x, y))
    }

    /// Project a world point to screen coordinates. `None` when it is behind the camera.
    pub fn world_to_screen(&self, point: Vec3, viewport: Viewport) -> Option<Vec2> {
        let clip = self.build_view_projection_matrix() * Vec4::from((point, 1.0));
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = Vec2::new(clip.x / clip.w, clip.y / clip.w);
        Some(viewport.from_ndc(ndc))
    }
}
