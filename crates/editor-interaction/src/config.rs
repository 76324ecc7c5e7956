//! Editor configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use editor_core::Color;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::error::{EditorError, Result};

/// Look of placed markers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub radius: f32,
    pub base_color: Color,
    pub selected_color: Color,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: 0.2,
            base_color: Color(0x00aaff),
            selected_color: Color(0xffff00),
        }
    }
}

/// Initial camera pose and projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 5.0),
            target: Vec3::ZERO,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraConfig {
    pub fn build(&self, aspect: f32) -> Camera {
        Camera {
            position: self.position,
            target: self.target,
            up: Vec3::Y,
            fov: self.fov_degrees.to_radians(),
            aspect,
            near: self.near,
            far: self.far,
        }
    }
}

/// Orbit controls tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians from the up axis; `π/2` keeps the camera above the horizon
    pub max_polar_angle: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 1.0,
            max_distance: 50.0,
            max_polar_angle: std::f32::consts::FRAC_PI_2,
        }
    }
}

/// Handle dimensions, modelled along the handle's own +Y
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GizmoConfig {
    pub shaft_length: f32,
    pub shaft_radius: f32,
    pub head_length: f32,
    pub head_radius: f32,
    /// Opacity of handles that are not highlighted
    pub dimmed_opacity: f32,
}

impl Default for GizmoConfig {
    fn default() -> Self {
        Self {
            shaft_length: 0.8,
            shaft_radius: 0.02,
            head_length: 0.2,
            head_radius: 0.06,
            dimmed_opacity: 0.5,
        }
    }
}

/// What the session does once a placement creates an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    /// Select the new object and attach the gizmo to it
    #[default]
    SelectNew,
    /// Deselect everything and go back to idle
    ReturnToIdle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub marker: MarkerStyle,
    pub preview_color: Color,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub gizmo: GizmoConfig,
    pub placement: PlacementPolicy,
    pub initial_objects: Vec<Vec3>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            marker: MarkerStyle::default(),
            preview_color: Color(0xff00ff),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            gizmo: GizmoConfig::default(),
            placement: PlacementPolicy::default(),
            initial_objects: vec![Vec3::ZERO],
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EditorError::InvalidConfig {
            field,
            reason: format!("must be a positive number, got {}", value),
        })
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(EditorError::InvalidConfig {
            field,
            reason: format!("must be within {}..={}, got {}", min, max, value),
        })
    }
}

impl EditorConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        positive("marker.radius", self.marker.radius)?;

        positive("camera.near", self.camera.near)?;
        positive("camera.far", self.camera.far)?;
        if self.camera.far <= self.camera.near {
            return Err(EditorError::InvalidConfig {
                field: "camera.far",
                reason: "must be greater than camera.near".into(),
            });
        }
        in_range("camera.fov_degrees", self.camera.fov_degrees, 1.0, 179.0)?;
        if (self.camera.position - self.camera.target).length() < f32::EPSILON {
            return Err(EditorError::InvalidConfig {
                field: "camera.position",
                reason: "must differ from camera.target".into(),
            });
        }

        in_range("controls.damping_factor", self.controls.damping_factor, 0.0, 1.0)?;
        positive("controls.rotate_speed", self.controls.rotate_speed)?;
        positive("controls.zoom_speed", self.controls.zoom_speed)?;
        positive("controls.min_distance", self.controls.min_distance)?;
        if self.controls.max_distance < self.controls.min_distance {
            return Err(EditorError::InvalidConfig {
                field: "controls.max_distance",
                reason: "must not be below controls.min_distance".into(),
            });
        }
        in_range(
            "controls.max_polar_angle",
            self.controls.max_polar_angle,
            0.0,
            std::f32::consts::PI,
        )?;

        positive("gizmo.shaft_length", self.gizmo.shaft_length)?;
        positive("gizmo.shaft_radius", self.gizmo.shaft_radius)?;
        positive("gizmo.head_length", self.gizmo.head_length)?;
        positive("gizmo.head_radius", self.gizmo.head_radius)?;
        in_range("gizmo.dimmed_opacity", self.gizmo.dimmed_opacity, 0.0, 1.0)?;

        Ok(())
    }
}
