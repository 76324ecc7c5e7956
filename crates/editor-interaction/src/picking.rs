//! Picking system
//!
//! Ray/shape intersection plus the resolver that turns a pointer ray into a
//! gizmo, object or empty-space pick. Geometry only carries a [`GeometryHandle`];
//! identity lives in the [`PickTable`] side-table.

use std::collections::HashMap;

use editor_core::{ObjectId, ObjectRegistry};
use glam::Vec3;

use crate::gizmo::{GizmoAxis, HandlePart, ManipulationGizmo};

const PARALLEL_EPSILON: f32 = 1e-6;

/// Ray for raycasting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin point
    pub origin: Vec3,
    /// Ray direction (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray, normalizing the direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the plane, `None` when parallel or behind the origin
    pub fn distance_to_plane(&self, plane: &Plane) -> Option<f32> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = -(self.origin.dot(plane.normal) + plane.constant) / denom;
        (t >= 0.0).then_some(t)
    }

    /// Intersection point with the plane
    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        self.distance_to_plane(plane).map(|t| self.at(t))
    }

    /// Nearest non-negative hit distance against a shape
    pub fn intersect_shape(&self, shape: &Shape) -> Option<f32> {
        match *shape {
            Shape::Sphere { center, radius } => ray_sphere_intersection(self, center, radius),
            Shape::Cylinder { start, end, radius } => {
                ray_cylinder_intersection(self, start, end, radius)
            }
            Shape::Quad { center, half_u, half_v } => ray_quad_intersection(self, center, half_u, half_v),
        }
    }
}

/// Infinite plane `normal · p + constant = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Plane {
    /// Plane with the given unit normal passing through `point`
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        Self {
            normal,
            constant: -point.dot(normal),
        }
    }

    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }
}

/// Pickable geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { center: Vec3, radius: f32 },
    /// Solid finite cylinder around the segment `start..end`
    Cylinder { start: Vec3, end: Vec3, radius: f32 },
    /// Rectangle spanned by two half-extent vectors around `center`
    Quad { center: Vec3, half_u: Vec3, half_v: Vec3 },
}

fn ray_sphere_intersection(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.dot(oc) - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    let t_near = -b - sqrt_disc;
    let t_far = -b + sqrt_disc;

    if t_near >= 0.0 {
        Some(t_near)
    } else if t_far >= 0.0 {
        // Origin inside the sphere
        Some(t_far)
    } else {
        None
    }
}

/// Ray against a solid finite cylinder: the side wall plus both end caps
fn ray_cylinder_intersection(ray: &Ray, start: Vec3, end: Vec3, radius: f32) -> Option<f32> {
    let axis = end - start;
    let axis_len = axis.length();
    if axis_len < 1e-6 {
        return None;
    }
    let axis_dir = axis / axis_len;

    let side = ray_cylinder_side(ray, start, axis_dir, axis_len, radius);
    let caps = [start, end]
        .into_iter()
        .filter_map(|center| ray_disk_intersection(ray, center, axis_dir, radius));
    side.into_iter().chain(caps).min_by(f32::total_cmp)
}

fn ray_cylinder_side(
    ray: &Ray,
    start: Vec3,
    axis_dir: Vec3,
    axis_len: f32,
    radius: f32,
) -> Option<f32> {
    let oc = ray.origin - start;

    // Components perpendicular to the cylinder axis
    let ray_perp = ray.direction - axis_dir * ray.direction.dot(axis_dir);
    let oc_perp = oc - axis_dir * oc.dot(axis_dir);

    let a = ray_perp.dot(ray_perp);
    if a < PARALLEL_EPSILON {
        // Looking down the axis, only the caps can be hit
        return None;
    }
    let b = 2.0 * ray_perp.dot(oc_perp);
    let c = oc_perp.dot(oc_perp) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);

    [t1, t2].into_iter().find(|&t| {
        t >= 0.0 && (0.0..=axis_len).contains(&(ray.at(t) - start).dot(axis_dir))
    })
}

fn ray_disk_intersection(ray: &Ray, center: Vec3, normal: Vec3, radius: f32) -> Option<f32> {
    let t = ray.distance_to_plane(&Plane::from_normal_and_point(normal, center))?;
    ((ray.at(t) - center).length_squared() <= radius * radius).then_some(t)
}

fn ray_quad_intersection(ray: &Ray, center: Vec3, half_u: Vec3, half_v: Vec3) -> Option<f32> {
    let normal = half_u.cross(half_v).try_normalize()?;
    let t = ray.distance_to_plane(&Plane::from_normal_and_point(normal, center))?;
    let local = ray.at(t) - center;

    let u = local.dot(half_u) / half_u.length_squared();
    let v = local.dot(half_v) / half_v.length_squared();
    (u.abs() <= 1.0 && v.abs() <= 1.0).then_some(t)
}

// ========================================================================
// Side-table
// ========================================================================

/// Opaque handle attached to a piece of pick geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryHandle(u32);

/// What a piece of geometry stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickTag {
    Object(ObjectId),
    GizmoHandle { axis: GizmoAxis, part: HandlePart },
    /// Non-object geometry that still occludes picks
    Scenery(u32),
}

/// Bidirectional map between geometry handles and their identity
#[derive(Debug, Default)]
pub struct PickTable {
    tags: HashMap<GeometryHandle, PickTag>,
    handles: HashMap<PickTag, GeometryHandle>,
    next_handle: u32,
}

impl PickTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register identity for new geometry. Re-registering a tag returns its existing handle.
    pub fn register(&mut self, tag: PickTag) -> GeometryHandle {
        if let Some(&handle) = self.handles.get(&tag) {
            return handle;
        }
        let handle = GeometryHandle(self.next_handle);
        self.next_handle += 1;
        self.tags.insert(handle, tag);
        self.handles.insert(tag, handle);
        handle
    }

    pub fn unregister(&mut self, tag: PickTag) -> Option<GeometryHandle> {
        let handle = self.handles.remove(&tag)?;
        self.tags.remove(&handle);
        Some(handle)
    }

    pub fn tag(&self, handle: GeometryHandle) -> Option<PickTag> {
        self.tags.get(&handle).copied()
    }

    pub fn handle_of(&self, tag: PickTag) -> Option<GeometryHandle> {
        self.handles.get(&tag).copied()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Nearest hit among `(handle, shape)` candidates. Ties keep the earlier candidate.
pub fn nearest_hit(
    ray: &Ray,
    candidates: impl IntoIterator<Item = (GeometryHandle, Shape)>,
) -> Option<(GeometryHandle, f32)> {
    let mut closest: Option<(GeometryHandle, f32)> = None;
    for (handle, shape) in candidates {
        if let Some(t) = ray.intersect_shape(&shape) {
            match closest {
                Some((_, prev_t)) if prev_t <= t => {}
                _ => closest = Some((handle, t)),
            }
        }
    }
    closest
}

// ========================================================================
// Resolver
// ========================================================================

/// Outcome of resolving one pointer ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickResult {
    Gizmo(GizmoAxis),
    Object(ObjectId),
    Empty,
}

/// Scenery geometry registered by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneryItem {
    pub id: u32,
    pub shape: Shape,
}

/// Borrowed view of everything pickable for the duration of one event
pub struct PickResolver<'a> {
    pub table: &'a PickTable,
    pub registry: &'a ObjectRegistry,
    pub gizmo: &'a ManipulationGizmo,
    pub scenery: &'a [SceneryItem],
}

impl<'a> PickResolver<'a> {
    /// Resolve in strict priority: gizmo handle, then object, then empty space
    pub fn resolve(&self, ray: &Ray, has_selection: bool) -> PickResult {
        if has_selection {
            if let Some(axis) = self.pick_gizmo(ray) {
                return PickResult::Gizmo(axis);
            }
        }

        match self.pick_object(ray) {
            Some(id) => PickResult::Object(id),
            None => PickResult::Empty,
        }
    }

    /// Nearest gizmo handle under the ray, only while the gizmo is visible
    pub fn pick_gizmo(&self, ray: &Ray) -> Option<GizmoAxis> {
        if !self.gizmo.is_visible() {
            return None;
        }

        let candidates = self
            .gizmo
            .handle_shapes()
            .into_iter()
            .filter_map(|(tag, shape)| self.table.handle_of(tag).map(|h| (h, shape)));

        let (handle, _) = nearest_hit(ray, candidates)?;
        match self.table.tag(handle)? {
            PickTag::GizmoHandle { axis, .. } if axis != GizmoAxis::None => Some(axis),
            _ => None,
        }
    }

    /// Nearest object or scenery under the ray; only an object hit yields an id
    pub fn pick_object(&self, ray: &Ray) -> Option<ObjectId> {
        let objects = self.registry.iter().filter_map(|object| {
            let handle = self.table.handle_of(PickTag::Object(object.id()))?;
            Some((
                handle,
                Shape::Sphere {
                    center: object.position(),
                    radius: object.radius(),
                },
            ))
        });
        let scenery = self.scenery.iter().filter_map(|item| {
            let handle = self.table.handle_of(PickTag::Scenery(item.id))?;
            Some((handle, item.shape))
        });

        let (handle, _) = nearest_hit(ray, objects.chain(scenery))?;
        match self.table.tag(handle)? {
            PickTag::Object(id) => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use editor_core::{Color, PickableObject};

    use crate::camera::Camera;
    use crate::config::GizmoConfig;

    #[test]
    fn test_ray_sphere_hit() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let t = ray
            .intersect_shape(&Shape::Sphere { center: Vec3::ZERO, radius: 0.5 })
            .unwrap();
        assert!((t - 4.5).abs() < 1e-5);
    }

    #[test]
    fn test_ray_sphere_miss() {
        let ray = Ray::new(Vec3::new(5.0, 5.0, 5.0), Vec3::NEG_Z);
        assert!(ray.intersect_shape(&Shape::Sphere { center: Vec3::ZERO, radius: 0.5 }).is_none());
    }

    #[test]
    fn test_ray_inside_sphere() {
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let t = ray.intersect_shape(&Shape::Sphere { center: Vec3::ZERO, radius: 1.0 }).unwrap();
        assert!((t - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_sphere_behind_ray() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(ray.intersect_shape(&Shape::Sphere { center: Vec3::ZERO, radius: 0.5 }).is_none());
    }

    #[test]
    fn test_ray_cylinder_hit_within_segment() {
        let ray = Ray::new(Vec3::new(0.0, 0.5, 5.0), Vec3::NEG_Z);
        let shape = Shape::Cylinder { start: Vec3::ZERO, end: Vec3::Y, radius: 0.1 };
        let t = ray.intersect_shape(&shape).unwrap();
        assert!((t - 4.9).abs() < 1e-4);
    }

    #[test]
    fn test_ray_cylinder_miss_past_end() {
        let ray = Ray::new(Vec3::new(0.0, 1.5, 5.0), Vec3::NEG_Z);
        let shape = Shape::Cylinder { start: Vec3::ZERO, end: Vec3::Y, radius: 0.1 };
        assert!(ray.intersect_shape(&shape).is_none());
    }

    #[test]
    fn test_ray_cylinder_end_on_hits_cap() {
        let shape = Shape::Cylinder { start: Vec3::ZERO, end: Vec3::Z, radius: 0.06 };

        let center = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!((center.intersect_shape(&shape).unwrap() - 4.0).abs() < 1e-5);

        let inside_rim = Ray::new(Vec3::new(0.05, 0.0, 5.0), Vec3::NEG_Z);
        assert!((inside_rim.intersect_shape(&shape).unwrap() - 4.0).abs() < 1e-5);

        let outside_rim = Ray::new(Vec3::new(0.1, 0.0, 5.0), Vec3::NEG_Z);
        assert!(outside_rim.intersect_shape(&shape).is_none());
    }

    #[test]
    fn test_ray_cylinder_cap_nearer_than_side() {
        // Slanted ray entering through the top cap
        let shape = Shape::Cylinder { start: Vec3::ZERO, end: Vec3::Y, radius: 0.5 };
        let ray = Ray::new(Vec3::new(0.0, 3.0, 0.0), Vec3::new(0.1, -1.0, 0.0));
        let t = ray.intersect_shape(&shape).unwrap();
        assert!((ray.at(t).y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_ray_quad() {
        let quad = Shape::Quad {
            center: Vec3::ZERO,
            half_u: Vec3::new(5.0, 0.0, 0.0),
            half_v: Vec3::new(0.0, 0.0, 5.0),
        };
        let down = Ray::new(Vec3::new(1.0, 3.0, 1.0), Vec3::NEG_Y);
        assert!((down.intersect_shape(&quad).unwrap() - 3.0).abs() < 1e-5);

        let outside = Ray::new(Vec3::new(6.0, 3.0, 0.0), Vec3::NEG_Y);
        assert!(outside.intersect_shape(&quad).is_none());
    }

    #[test]
    fn test_plane_intersection() {
        let plane = Plane::from_normal_and_point(Vec3::Y, Vec3::new(0.0, 2.0, 0.0));
        let ray = Ray::new(Vec3::new(1.0, 5.0, 0.0), Vec3::NEG_Y);
        assert_eq!(ray.intersect_plane(&plane), Some(Vec3::new(1.0, 2.0, 0.0)));
        assert_eq!(plane.distance_to_point(Vec3::new(0.0, 3.0, 0.0)), 1.0);
    }

    #[test]
    fn test_plane_parallel_ray_misses() {
        let plane = Plane::from_normal_and_point(Vec3::Y, Vec3::ZERO);
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        assert!(ray.intersect_plane(&plane).is_none());
    }

    #[test]
    fn test_plane_behind_ray_misses() {
        let plane = Plane::from_normal_and_point(Vec3::Y, Vec3::ZERO);
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        assert!(ray.intersect_plane(&plane).is_none());
    }

    #[test]
    fn test_pick_table_roundtrip() {
        let mut table = PickTable::new();
        let tag = PickTag::Scenery(3);
        let handle = table.register(tag);
        assert_eq!(table.register(tag), handle);
        assert_eq!(table.tag(handle), Some(tag));
        assert_eq!(table.unregister(tag), Some(handle));
        assert!(table.tag(handle).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_nearest_hit_prefers_smaller_distance() {
        let mut table = PickTable::new();
        let far = table.register(PickTag::Scenery(0));
        let near = table.register(PickTag::Scenery(1));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);

        let hit = nearest_hit(
            &ray,
            [
                (far, Shape::Sphere { center: Vec3::ZERO, radius: 0.5 }),
                (near, Shape::Sphere { center: Vec3::new(0.0, 0.0, 3.0), radius: 0.5 }),
            ],
        )
        .unwrap();
        assert_eq!(hit.0, near);
    }

    struct Fixture {
        table: PickTable,
        registry: ObjectRegistry,
        gizmo: ManipulationGizmo,
        scenery: Vec<SceneryItem>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut table = PickTable::new();
            let gizmo = ManipulationGizmo::new(GizmoConfig::default(), &mut table);
            Self {
                table,
                registry: ObjectRegistry::new(),
                gizmo,
                scenery: Vec::new(),
            }
        }

        fn spawn(&mut self, position: Vec3) -> ObjectId {
            let id = self
                .registry
                .insert_with(|id| PickableObject::new(id, position, 0.2, Color(0x00aaff)));
            self.table.register(PickTag::Object(id));
            id
        }

        fn resolver(&self) -> PickResolver<'_> {
            PickResolver {
                table: &self.table,
                registry: &self.registry,
                gizmo: &self.gizmo,
                scenery: &self.scenery,
            }
        }
    }

    #[test]
    fn test_resolve_empty() {
        let fixture = Fixture::new();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert_eq!(fixture.resolver().resolve(&ray, false), PickResult::Empty);
    }

    #[test]
    fn test_resolve_nearest_object_wins() {
        let mut fixture = Fixture::new();
        let far = fixture.spawn(Vec3::ZERO);
        let near = fixture.spawn(Vec3::new(0.0, 0.0, 2.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);

        assert_eq!(fixture.resolver().resolve(&ray, false), PickResult::Object(near));
        assert_ne!(fixture.resolver().resolve(&ray, false), PickResult::Object(far));
    }

    #[test]
    fn test_gizmo_has_priority_over_object() {
        let mut fixture = Fixture::new();
        let mut camera = Camera::new(1.0);
        camera.set_position(Vec3::new(0.0, 0.0, 5.0));

        // A large object enclosing the gizmo handles
        let id = fixture
            .registry
            .insert_with(|id| PickableObject::new(id, Vec3::ZERO, 2.0, Color(0x00aaff)));
        fixture.table.register(PickTag::Object(id));
        fixture.gizmo.show(Vec3::ZERO, &camera);

        // Aim at the Y handle shaft
        let ray = Ray::new(Vec3::new(0.0, 0.5, 5.0), Vec3::NEG_Z);
        assert_eq!(fixture.resolver().resolve(&ray, true), PickResult::Gizmo(GizmoAxis::Y));
        // Without a selection the handles are not considered
        assert_eq!(fixture.resolver().resolve(&ray, false), PickResult::Object(id));
    }

    #[test]
    fn test_hidden_gizmo_is_not_picked() {
        let fixture = Fixture::new();
        let ray = Ray::new(Vec3::new(0.0, 0.5, 5.0), Vec3::NEG_Z);
        assert_eq!(fixture.resolver().pick_gizmo(&ray), None);
    }

    #[test]
    fn test_scenery_occludes_objects() {
        let mut fixture = Fixture::new();
        fixture.spawn(Vec3::ZERO);
        fixture.scenery.push(SceneryItem {
            id: 0,
            shape: Shape::Quad {
                center: Vec3::new(0.0, 0.0, 1.0),
                half_u: Vec3::X * 5.0,
                half_v: Vec3::Y * 5.0,
            },
        });
        fixture.table.register(PickTag::Scenery(0));

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert_eq!(fixture.resolver().resolve(&ray, false), PickResult::Empty);
    }

    #[test]
    fn test_unregistered_geometry_is_ignored() {
        let mut fixture = Fixture::new();
        let id = fixture.spawn(Vec3::ZERO);
        fixture.table.unregister(PickTag::Object(id));

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert_eq!(fixture.resolver().pick_object(&ray), None);
    }
}
