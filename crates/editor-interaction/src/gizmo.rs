//! Translation gizmo
//!
//! Three drag handles whose directions follow the camera rather than the world
//! axes, plus the axis-constrained drag that turns pointer rays into positions.

use editor_core::Color;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::camera::Camera;
use crate::config::GizmoConfig;
use crate::picking::{PickTable, PickTag, Plane, Ray, Shape};
use crate::snapshot::HandleInstance;

/// Below this magnitude `axis × view` counts as degenerate
const DEGENERATE_EPSILON: f32 = 1e-3;

/// Below this cosine between the drag plane normal and the line of sight to the object,
/// the plane is seen edge-on
const GRAZING_COSINE: f32 = 0.05;

/// Every handle arrow is modelled along +Y and rotated into place
const REFERENCE_AXIS: Vec3 = Vec3::Y;

/// Gizmo axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GizmoAxis {
    #[default]
    None,
    X,
    Y,
    Z,
}

impl GizmoAxis {
    pub const ALL: [GizmoAxis; 3] = [GizmoAxis::X, GizmoAxis::Y, GizmoAxis::Z];

    fn index(self) -> Option<usize> {
        match self {
            GizmoAxis::X => Some(0),
            GizmoAxis::Y => Some(1),
            GizmoAxis::Z => Some(2),
            GizmoAxis::None => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GizmoAxis::X => "x",
            GizmoAxis::Y => "y",
            GizmoAxis::Z => "z",
            GizmoAxis::None => "",
        }
    }
}

impl std::str::FromStr for GizmoAxis {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "x" => GizmoAxis::X,
            "y" => GizmoAxis::Y,
            "z" => GizmoAxis::Z,
            _ => GizmoAxis::None,
        })
    }
}

/// Handle sub-geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlePart {
    Shaft,
    Head,
}

/// Handle directions for one camera pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxesOrientation {
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
}

impl AxesOrientation {
    /// Orthonormal, camera-relative handle directions:
    /// 1. `x = normalize(up × view)`
    /// 2. `y = normalize(view × x)`
    /// 3. `z = -view`
    pub fn from_camera(view_direction: Vec3, camera_up: Vec3) -> Self {
        let right = camera_up.cross(view_direction).normalize();
        let corrected_up = view_direction.cross(right).normalize();
        Self {
            x: right,
            y: corrected_up,
            z: -view_direction,
        }
    }

    pub fn direction(&self, axis: GizmoAxis) -> Option<Vec3> {
        match axis {
            GizmoAxis::X => Some(self.x),
            GizmoAxis::Y => Some(self.y),
            GizmoAxis::Z => Some(self.z),
            GizmoAxis::None => None,
        }
    }
}

/// Normal of the auxiliary plane used to drag along `axis_direction`.
/// Falls back to world Y when the axis looks straight down the view, or world X
/// when that axis is itself vertical.
pub fn drag_plane_normal(axis_direction: Vec3, view_direction: Vec3) -> Vec3 {
    let normal = axis_direction.cross(view_direction);
    if normal.length() >= DEGENERATE_EPSILON {
        return normal.normalize();
    }
    if axis_direction.dot(Vec3::Y).abs() > 1.0 - DEGENERATE_EPSILON {
        Vec3::X
    } else {
        Vec3::Y
    }
}

/// Drag plane through `object_position` for dragging along `axis_direction`.
/// When the eye sees that plane edge-on, pointer rays graze it and meet it far from the
/// object (or at the eye itself), so the plane is turned to contain the axis while facing
/// the camera.
pub fn drag_plane(
    axis_direction: Vec3,
    view_direction: Vec3,
    eye: Vec3,
    object_position: Vec3,
) -> Plane {
    let normal = drag_plane_normal(axis_direction, view_direction);
    let plane = Plane::from_normal_and_point(normal, object_position);
    let sight = (object_position - eye)
        .try_normalize()
        .unwrap_or(view_direction);
    if normal.dot(sight).abs() >= GRAZING_COSINE {
        return plane;
    }
    let facing = axis_direction.cross(view_direction.cross(axis_direction));
    match facing.try_normalize() {
        Some(normal) => Plane::from_normal_and_point(normal, object_position),
        None => plane,
    }
}

/// State captured when a handle drag begins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub axis: GizmoAxis,
    pub plane: Plane,
    pub start_point: Vec3,
    pub object_start: Vec3,
}

#[derive(Debug, Clone)]
struct Handle {
    axis: GizmoAxis,
    color: Color,
    rotation: Quat,
    opacity: f32,
    transparent: bool,
}

/// Translation gizmo attached to the selected object
#[derive(Debug, Clone)]
pub struct ManipulationGizmo {
    config: GizmoConfig,
    visible: bool,
    position: Vec3,
    handles: [Handle; 3],
    selected_axis: GizmoAxis,
    drag: Option<DragSession>,
}

impl ManipulationGizmo {
    /// Create a hidden gizmo and register its handle geometry
    pub fn new(config: GizmoConfig, table: &mut PickTable) -> Self {
        let colors = [Color::RED, Color::GREEN, Color::BLUE];
        let handles = std::array::from_fn(|i| Handle {
            axis: GizmoAxis::ALL[i],
            color: colors[i],
            rotation: Quat::IDENTITY,
            opacity: 1.0,
            transparent: false,
        });

        for axis in GizmoAxis::ALL {
            for part in [HandlePart::Shaft, HandlePart::Head] {
                table.register(PickTag::GizmoHandle { axis, part });
            }
        }

        let mut gizmo = Self {
            config,
            visible: false,
            position: Vec3::ZERO,
            handles,
            selected_axis: GizmoAxis::None,
            drag: None,
        };
        gizmo.select_axis(GizmoAxis::None);
        gizmo
    }

    pub fn show(&mut self, position: Vec3, camera: &Camera) {
        self.visible = true;
        self.update_axes_orientation(position, camera);
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Re-derive every handle rotation from the current camera and move to `target`
    pub fn update_axes_orientation(&mut self, target: Vec3, camera: &Camera) {
        let axes = AxesOrientation::from_camera(camera.view_direction(), camera.up_vector());
        for handle in &mut self.handles {
            if let Some(direction) = axes.direction(handle.axis) {
                handle.rotation = Quat::from_rotation_arc(REFERENCE_AXIS, direction);
            }
        }
        self.position = target;
    }

    /// Live direction of a handle, read back from its rotation
    pub fn axis_direction(&self, axis: GizmoAxis) -> Option<Vec3> {
        let handle = &self.handles[axis.index()?];
        Some((handle.rotation * REFERENCE_AXIS).normalize())
    }

    /// Highlight one handle and dim the rest. Does not start a drag.
    pub fn select_axis(&mut self, axis: GizmoAxis) {
        self.selected_axis = axis;
        let dimmed = self.config.dimmed_opacity;
        for handle in &mut self.handles {
            let active = handle.axis == axis;
            handle.opacity = if active { 1.0 } else { dimmed };
            handle.transparent = !active;
        }
    }

    pub fn selected_axis(&self) -> GizmoAxis {
        self.selected_axis
    }

    /// `(opacity, transparent)` of a handle
    pub fn handle_highlight(&self, axis: GizmoAxis) -> Option<(f32, bool)> {
        let handle = &self.handles[axis.index()?];
        Some((handle.opacity, handle.transparent))
    }

    /// Begin dragging `axis`. Returns false when the axis is `None` or the ray misses
    /// the drag plane.
    pub fn start_drag(
        &mut self,
        axis: GizmoAxis,
        ray: &Ray,
        object_position: Vec3,
        camera: &Camera,
    ) -> bool {
        let Some(axis_direction) = self.axis_direction(axis) else {
            return false;
        };

        let plane = drag_plane(
            axis_direction,
            camera.view_direction(),
            camera.position,
            object_position,
        );

        let Some(start_point) = ray.intersect_plane(&plane) else {
            debug!(axis = axis.as_str(), "pointer ray misses drag plane, drag not started");
            return false;
        };

        self.drag = Some(DragSession {
            axis,
            plane,
            start_point,
            object_start: object_position,
        });
        self.select_axis(axis);
        debug!(axis = axis.as_str(), ?object_position, "gizmo drag started");
        true
    }

    /// Constrained position for the current pointer ray, `None` without an active drag
    /// or when the ray misses the drag plane
    pub fn on_drag(&self, ray: &Ray) -> Option<Vec3> {
        let session = self.drag.as_ref()?;
        let current_point = ray.intersect_plane(&session.plane)?;
        let axis_direction = self.axis_direction(session.axis)?;

        let move_vector = current_point - session.start_point;
        let projection = move_vector.dot(axis_direction);
        Some(session.object_start + axis_direction * projection)
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
        self.select_axis(GizmoAxis::None);
    }

    /// End the drag and hand back the position the object had when it started
    pub fn cancel_drag(&mut self) -> Option<Vec3> {
        let session = self.drag.take()?;
        self.select_axis(GizmoAxis::None);
        Some(session.object_start)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Pick geometry for every handle at the current pose
    pub fn handle_shapes(&self) -> Vec<(PickTag, Shape)> {
        let shaft_end = self.config.shaft_length;
        let head_end = shaft_end + self.config.head_length;

        let mut shapes = Vec::with_capacity(6);
        for handle in &self.handles {
            let dir = (handle.rotation * REFERENCE_AXIS).normalize();
            let axis = handle.axis;
            shapes.push((
                PickTag::GizmoHandle { axis, part: HandlePart::Shaft },
                Shape::Cylinder {
                    start: self.position,
                    end: self.position + dir * shaft_end,
                    radius: self.config.shaft_radius,
                },
            ));
            // Cone head approximated by its bounding cylinder
            shapes.push((
                PickTag::GizmoHandle { axis, part: HandlePart::Head },
                Shape::Cylinder {
                    start: self.position + dir * shaft_end,
                    end: self.position + dir * head_end,
                    radius: self.config.head_radius,
                },
            ));
        }
        shapes
    }

    /// Render records for the three handles
    pub fn instances(&self) -> [HandleInstance; 3] {
        let length = self.config.shaft_length + self.config.head_length;
        std::array::from_fn(|i| {
            let handle = &self.handles[i];
            HandleInstance {
                rotation: handle.rotation.to_array(),
                position: self.position.to_array(),
                opacity: handle.opacity,
                color: handle.color.to_rgb(),
                length,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn front_camera() -> Camera {
        let mut camera = Camera::new(1.0);
        camera.set_position(Vec3::new(0.0, 0.0, 5.0));
        camera
    }

    fn gizmo() -> ManipulationGizmo {
        let mut table = PickTable::new();
        ManipulationGizmo::new(GizmoConfig::default(), &mut table)
    }

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_gizmo_axis_from_str() {
        assert_eq!("x".parse::<GizmoAxis>().unwrap(), GizmoAxis::X);
        assert_eq!("Y".parse::<GizmoAxis>().unwrap(), GizmoAxis::Y);
        assert_eq!("invalid".parse::<GizmoAxis>().unwrap(), GizmoAxis::None);
    }

    #[test]
    fn test_orientation_for_front_camera() {
        let axes = AxesOrientation::from_camera(Vec3::NEG_Z, Vec3::Y);
        assert_vec_eq(axes.x, Vec3::NEG_X);
        assert_vec_eq(axes.y, Vec3::Y);
        assert_vec_eq(axes.z, Vec3::Z);
    }

    #[test]
    fn test_orientation_is_orthonormal_for_oblique_camera() {
        let camera = Camera::new(1.0);
        let axes = AxesOrientation::from_camera(camera.view_direction(), camera.up_vector());
        for v in [axes.x, axes.y, axes.z] {
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
        assert!(axes.x.dot(axes.y).abs() < 1e-5);
        assert!(axes.y.dot(axes.z).abs() < 1e-5);
        assert!(axes.x.dot(axes.z).abs() < 1e-5);
    }

    #[test]
    fn test_show_hide() {
        let mut gizmo = gizmo();
        assert!(!gizmo.is_visible());
        gizmo.show(Vec3::new(1.0, 2.0, 3.0), &front_camera());
        assert!(gizmo.is_visible());
        assert_eq!(gizmo.position(), Vec3::new(1.0, 2.0, 3.0));
        gizmo.hide();
        assert!(!gizmo.is_visible());
    }

    #[test]
    fn test_axis_direction_follows_orientation() {
        let mut gizmo = gizmo();
        gizmo.update_axes_orientation(Vec3::ZERO, &front_camera());
        assert_vec_eq(gizmo.axis_direction(GizmoAxis::X).unwrap(), Vec3::NEG_X);
        assert_vec_eq(gizmo.axis_direction(GizmoAxis::Y).unwrap(), Vec3::Y);
        assert_vec_eq(gizmo.axis_direction(GizmoAxis::Z).unwrap(), Vec3::Z);
        assert!(gizmo.axis_direction(GizmoAxis::None).is_none());
    }

    #[test]
    fn test_orientation_idempotent() {
        let camera = Camera::new(1.0);
        let mut gizmo = gizmo();
        gizmo.update_axes_orientation(Vec3::ONE, &camera);
        let first: Vec<_> = GizmoAxis::ALL.iter().map(|&a| gizmo.axis_direction(a)).collect();
        gizmo.update_axes_orientation(Vec3::ONE, &camera);
        let second: Vec<_> = GizmoAxis::ALL.iter().map(|&a| gizmo.axis_direction(a)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_orientation_tracks_camera_moves() {
        let mut camera = front_camera();
        let mut gizmo = gizmo();
        gizmo.update_axes_orientation(Vec3::ZERO, &camera);

        camera.set_position(Vec3::new(5.0, 0.0, 0.0));
        gizmo.update_axes_orientation(Vec3::ZERO, &camera);
        assert_vec_eq(gizmo.axis_direction(GizmoAxis::Z).unwrap(), Vec3::X);
    }

    #[test]
    fn test_select_axis_highlight() {
        let mut gizmo = gizmo();
        gizmo.select_axis(GizmoAxis::Y);
        assert_eq!(gizmo.selected_axis(), GizmoAxis::Y);
        assert_eq!(gizmo.handle_highlight(GizmoAxis::Y), Some((1.0, false)));
        assert_eq!(gizmo.handle_highlight(GizmoAxis::X), Some((0.5, true)));
        assert_eq!(gizmo.handle_highlight(GizmoAxis::Z), Some((0.5, true)));
        assert!(!gizmo.is_dragging());
    }

    #[test]
    fn test_drag_plane_normal() {
        assert_vec_eq(drag_plane_normal(Vec3::Y, Vec3::NEG_Z), Vec3::NEG_X);
    }

    #[test]
    fn test_drag_plane_fallbacks() {
        // Axis along the view direction
        assert_eq!(drag_plane_normal(Vec3::Z, Vec3::NEG_Z), Vec3::Y);
        // Both vertical
        assert_eq!(drag_plane_normal(Vec3::Y, Vec3::NEG_Y), Vec3::X);
    }

    #[test]
    fn test_drag_plane_contains_view_direction() {
        let plane = drag_plane(Vec3::Y, Vec3::NEG_Z, Vec3::new(0.0, 0.0, 5.0), Vec3::X);
        assert_vec_eq(plane.normal, Vec3::NEG_X);
        assert!(plane.distance_to_point(Vec3::X).abs() < 1e-6);
    }

    #[test]
    fn test_drag_plane_faces_camera_when_eye_on_plane() {
        // Object on the line of sight: the x = 0 plane would contain the eye
        let plane = drag_plane(Vec3::Y, Vec3::NEG_Z, Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        assert_vec_eq(plane.normal, Vec3::NEG_Z);
        assert!(plane.distance_to_point(Vec3::ZERO).abs() < 1e-6);
    }

    #[test]
    fn test_drag_plane_faces_camera_near_line_of_sight() {
        let eye = Vec3::new(0.0, 0.0, 5.0);
        for x in [0.005, 0.02, -0.1] {
            let object = Vec3::new(x, 0.0, 0.0);
            let plane = drag_plane(Vec3::Y, Vec3::NEG_Z, eye, object);
            assert_vec_eq(plane.normal, Vec3::NEG_Z);
            assert!(plane.distance_to_point(object).abs() < 1e-6);
        }
    }

    #[test]
    fn test_drag_moves_along_axis_only() {
        let camera = front_camera();
        let mut gizmo = gizmo();
        let object = Vec3::new(1.0, 0.0, 0.0);
        gizmo.show(object, &camera);

        let start = Ray::new(camera.position, Vec3::new(1.0, 0.5, 0.0) - camera.position);
        assert!(gizmo.start_drag(GizmoAxis::Y, &start, object, &camera));
        assert!(gizmo.is_dragging());
        assert_eq!(gizmo.selected_axis(), GizmoAxis::Y);

        // Intersection moves by d = (0, 1.5, -2) inside the x = 1 drag plane
        let target = Vec3::new(1.0, 2.0, -2.0);
        let current = Ray::new(camera.position, target - camera.position);
        let position = gizmo.on_drag(&current).unwrap();
        assert_vec_eq(position, Vec3::new(1.0, 1.5, 0.0));
    }

    #[test]
    fn test_drag_projection_matches_dot_product() {
        let camera = Camera::new(1.0);
        let mut gizmo = gizmo();
        let object = Vec3::new(0.5, 0.0, -0.5);
        gizmo.show(object, &camera);

        let axis = gizmo.axis_direction(GizmoAxis::X).unwrap();
        let start = Ray::new(camera.position, object - camera.position);
        assert!(gizmo.start_drag(GizmoAxis::X, &start, object, &camera));
        let session = *gizmo.drag_session().unwrap();

        // Arbitrary motion inside the drag plane
        let in_plane = session.plane.normal.cross(Vec3::new(0.3, 0.7, 0.1)).normalize() * 0.8;
        let target = session.start_point + in_plane;
        let position = gizmo.on_drag(&Ray::new(camera.position, target - camera.position)).unwrap();

        assert_vec_eq(position, object + axis * in_plane.dot(axis));
    }

    #[test]
    fn test_on_drag_without_session() {
        let gizmo = gizmo();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(gizmo.on_drag(&ray).is_none());
    }

    #[test]
    fn test_start_drag_rejects_missing_plane() {
        let camera = front_camera();
        let mut gizmo = gizmo();
        gizmo.show(Vec3::ZERO, &camera);
        // Pointing away from the x = 0 plane
        let ray = Ray::new(Vec3::new(1.0, 0.0, 5.0), Vec3::X);
        assert!(!gizmo.start_drag(GizmoAxis::Y, &ray, Vec3::ZERO, &camera));
        assert!(!gizmo.is_dragging());
        assert!(!gizmo.start_drag(GizmoAxis::None, &ray, Vec3::ZERO, &camera));
    }

    #[test]
    fn test_end_drag_clears_state() {
        let camera = front_camera();
        let mut gizmo = gizmo();
        gizmo.show(Vec3::ZERO, &camera);
        let ray = Ray::new(camera.position, Vec3::new(0.0, 0.5, 0.0) - camera.position);
        gizmo.start_drag(GizmoAxis::Y, &ray, Vec3::ZERO, &camera);

        gizmo.end_drag();
        assert!(!gizmo.is_dragging());
        assert_eq!(gizmo.selected_axis(), GizmoAxis::None);
        assert_eq!(gizmo.handle_highlight(GizmoAxis::Y), Some((0.5, true)));
    }

    #[test]
    fn test_cancel_drag_returns_start() {
        let camera = front_camera();
        let mut gizmo = gizmo();
        let start = Vec3::new(0.0, 0.1, 0.0);
        gizmo.show(start, &camera);
        let ray = Ray::new(camera.position, Vec3::new(0.0, 0.5, 0.0) - camera.position);
        gizmo.start_drag(GizmoAxis::Y, &ray, start, &camera);

        assert_eq!(gizmo.cancel_drag(), Some(start));
        assert_eq!(gizmo.cancel_drag(), None);
    }

    #[test]
    fn test_handle_shapes_follow_orientation() {
        let mut gizmo = gizmo();
        gizmo.show(Vec3::new(1.0, 0.0, 0.0), &front_camera());
        let shapes = gizmo.handle_shapes();
        assert_eq!(shapes.len(), 6);

        let (_, y_shaft) = shapes
            .iter()
            .find(|(tag, _)| *tag == PickTag::GizmoHandle { axis: GizmoAxis::Y, part: HandlePart::Shaft })
            .unwrap();
        match y_shaft {
            Shape::Cylinder { start, end, .. } => {
                assert_vec_eq(*start, Vec3::new(1.0, 0.0, 0.0));
                assert_vec_eq(*end, Vec3::new(1.0, 0.8, 0.0));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_instances() {
        let mut gizmo = gizmo();
        gizmo.show(Vec3::ZERO, &front_camera());
        gizmo.select_axis(GizmoAxis::X);
        let instances = gizmo.instances();
        assert_eq!(instances[0].opacity, 1.0);
        assert_eq!(instances[0].color, [1.0, 0.0, 0.0]);
        assert_eq!(instances[1].opacity, 0.5);
        assert!((instances[2].length - 1.0).abs() < 1e-6);
    }
}
