//! Orbit camera controls
//!
//! Spherical orbit around a target point with optional damping. Input only
//! accumulates deltas; `update` applies them to the camera once per frame.

use std::f32::consts::TAU;

use glam::Vec3;
use tracing::trace;

use crate::camera::Camera;
use crate::config::ControlsConfig;

/// Keeps `phi` away from the poles, where the view basis degenerates
const POLE_EPSILON: f32 = 1e-6;
/// Position change below which an update counts as idle
const MOTION_EPSILON: f32 = 1e-6;
/// Per-notch zoom factor before `zoom_speed` is applied
const ZOOM_BASE: f32 = 0.95;

/// Spherical coordinates around the orbit target, y up
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y
    phi: f32,
    /// Azimuth around +Y, measured from +Z
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius < f32::EPSILON {
            return Self { radius: 0.0, phi: 0.0, theta: 0.0 };
        }
        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    config: ControlsConfig,
    enabled: bool,
    /// Pending azimuth change
    delta_theta: f32,
    /// Pending polar change
    delta_phi: f32,
    /// Pending radius multiplier
    scale: f32,
}

impl OrbitControls {
    pub fn new(config: ControlsConfig) -> Self {
        Self {
            config,
            enabled: true,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling also drops any residual damped motion
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.reset_motion();
        }
    }

    fn reset_motion(&mut self) {
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.scale = 1.0;
    }

    /// Whether damped motion is still pending
    pub fn is_moving(&self) -> bool {
        self.delta_theta.abs() > MOTION_EPSILON
            || self.delta_phi.abs() > MOTION_EPSILON
            || (self.scale - 1.0).abs() > MOTION_EPSILON
    }

    /// Orbit by a pointer movement in pixels. A drag across the full viewport height
    /// is one full turn.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if !self.enabled || viewport_height <= 0.0 {
            return;
        }
        let speed = self.config.rotate_speed;
        self.delta_theta -= TAU * dx / viewport_height * speed;
        self.delta_phi -= TAU * dy / viewport_height * speed;
    }

    /// Wheel zoom. Negative `delta_y` (wheel up) moves closer.
    pub fn zoom(&mut self, delta_y: f32) {
        if !self.enabled || delta_y == 0.0 {
            return;
        }
        let factor = ZOOM_BASE.powf(self.config.zoom_speed);
        if delta_y < 0.0 {
            self.scale *= factor;
        } else {
            self.scale /= factor;
        }
    }

    /// Apply pending motion to the camera. Returns true when the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        if !self.enabled {
            return false;
        }

        let target = camera.target;
        let mut spherical = Spherical::from_offset(camera.position - target);

        let damping = if self.config.enable_damping {
            self.config.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.delta_theta * damping;
        spherical.phi += self.delta_phi * damping;
        spherical.phi = spherical
            .phi
            .clamp(0.0, self.config.max_polar_angle)
            .clamp(POLE_EPSILON, std::f32::consts::PI - POLE_EPSILON);

        spherical.radius = (spherical.radius * self.scale)
            .clamp(self.config.min_distance, self.config.max_distance);

        let position = target + spherical.to_offset();
        let moved = (position - camera.position).length_squared() > MOTION_EPSILON;
        camera.set_position(position);

        if self.config.enable_damping {
            self.delta_theta *= 1.0 - damping;
            self.delta_phi *= 1.0 - damping;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;

        if moved {
            trace!(?position, "orbit update");
        }
        moved
    }
}
