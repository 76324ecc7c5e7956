//! Editor session
//!
//! Owns the scene (object registry, pick side-table, gizmo, camera) and runs the
//! interaction state machine. Every pointer event is resolved in full before any
//! state changes; object notifications are drained and published once per event.

use editor_core::object::pickable::IDLE_OPACITY;
use editor_core::{
    EventQueue, MarkerInstance, MaterialState, ObjectEvent, ObjectId, ObjectRegistry,
    PickableObject, Subscribers,
};
use glam::{Vec2, Vec3};
use tracing::{debug, info, trace, warn};

use crate::camera::{Camera, CameraUniform, Viewport};
use crate::config::{EditorConfig, PlacementPolicy};
use crate::controls::OrbitControls;
use crate::error::{EditorError, Result};
use crate::gizmo::{GizmoAxis, ManipulationGizmo};
use crate::interaction::{EditorEvent, InteractionState, Modifiers, PointerButton};
use crate::picking::{PickResolver, PickResult, PickTable, PickTag, Plane, Ray, SceneryItem, Shape};
use crate::snapshot::{HandleInstance, OverlayStatus};

fn checked_viewport(width: f32, height: f32) -> Result<Viewport> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok(Viewport::new(width, height))
    } else {
        Err(EditorError::InvalidViewport { width, height })
    }
}

/// Top-level editor state
pub struct EditorSession {
    config: EditorConfig,
    viewport: Viewport,
    camera: Camera,
    controls: OrbitControls,
    registry: ObjectRegistry,
    table: PickTable,
    gizmo: ManipulationGizmo,
    scenery: Vec<SceneryItem>,
    next_scenery_id: u32,
    state: InteractionState,
    /// Click/hover reports pushed by objects, drained per event
    object_events: EventQueue<ObjectEvent>,
    outbox: EventQueue<EditorEvent>,
    subscribers: Subscribers<EditorEvent>,
    /// Last pointer position of an orbit gesture in progress
    orbit_anchor: Option<Vec2>,
}

impl EditorSession {
    pub fn new(config: EditorConfig, viewport: Viewport) -> Result<Self> {
        config.validate()?;
        let viewport = checked_viewport(viewport.width, viewport.height)?;

        let mut table = PickTable::new();
        let gizmo = ManipulationGizmo::new(config.gizmo, &mut table);
        let camera = config.camera.build(viewport.aspect());
        let controls = OrbitControls::new(config.controls);

        let mut session = Self {
            viewport,
            camera,
            controls,
            registry: ObjectRegistry::new(),
            table,
            gizmo,
            scenery: Vec::new(),
            next_scenery_id: 0,
            state: InteractionState::Idle,
            object_events: EventQueue::new(),
            outbox: EventQueue::new(),
            subscribers: Subscribers::new(),
            orbit_anchor: None,
            config,
        };

        for position in session.config.initial_objects.clone() {
            session.spawn(position);
        }
        session.flush();

        info!(
            objects = session.registry.len(),
            width = viewport.width,
            height = viewport.height,
            "editor session created"
        );
        Ok(session)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn gizmo(&self) -> &ManipulationGizmo {
        &self.gizmo
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    /// Object the gizmo is attached to. A pending placement keeps the prior selection.
    pub fn selected(&self) -> Option<ObjectId> {
        self.state
            .selected()
            .or_else(|| self.registry.selected_ids().first().copied())
    }

    pub fn object_position(&self, id: ObjectId) -> Result<Vec3> {
        self.registry
            .position(id)
            .ok_or(EditorError::UnknownObject(id))
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    pub fn subscribe(&mut self, callback: impl FnMut(&EditorEvent) + 'static) -> u32 {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: u32) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn emit(&mut self, event: EditorEvent) {
        self.outbox.push(event);
    }

    /// Apply queued object notifications, then publish everything to subscribers
    fn flush(&mut self) {
        while let Some(event) = self.object_events.pop() {
            self.emit(EditorEvent::Object { event });
            if let ObjectEvent::Clicked { id, selected } = event {
                self.apply_selection(id, selected);
            }
        }
        while let Some(event) = self.outbox.pop() {
            self.subscribers.notify(&event);
        }
    }

    // ========================================================================
    // Scene
    // ========================================================================

    fn spawn(&mut self, position: Vec3) -> ObjectId {
        let style = self.config.marker;
        let id = self.registry.insert_with(|id| {
            PickableObject::new(id, position, style.radius, style.base_color)
                .with_selected_color(style.selected_color)
        });
        self.table.register(PickTag::Object(id));
        self.emit(EditorEvent::ObjectCreated { id, position });
        id
    }

    pub fn add_object(&mut self, position: Vec3) -> ObjectId {
        let id = self.spawn(position);
        info!(%id, ?position, "object added");
        self.flush();
        id
    }

    /// Register geometry that occludes picks without being selectable
    pub fn add_scenery(&mut self, shape: Shape) -> u32 {
        let id = self.next_scenery_id;
        self.next_scenery_id += 1;
        self.table.register(PickTag::Scenery(id));
        self.scenery.push(SceneryItem { id, shape });
        debug!(id, "scenery added");
        id
    }

    pub fn remove_scenery(&mut self, id: u32) -> bool {
        let before = self.scenery.len();
        self.scenery.retain(|item| item.id != id);
        self.table.unregister(PickTag::Scenery(id));
        self.scenery.len() != before
    }

    /// Scene teardown: drop every object and its pick geometry
    pub fn clear(&mut self) -> usize {
        let had_selection = self.selected().is_some();
        if self.gizmo.is_dragging() {
            self.gizmo.end_drag();
        }
        self.gizmo.hide();
        self.set_controls_enabled(true);
        self.state = InteractionState::Idle;
        self.orbit_anchor = None;

        let removed = self.registry.clear();
        for object in &removed {
            self.table.unregister(PickTag::Object(object.id()));
        }
        if had_selection {
            self.emit(EditorEvent::SelectionChanged { selected: None });
        }
        info!(count = removed.len(), "scene cleared");
        self.flush();
        removed.len()
    }

    pub fn set_object_position(&mut self, id: ObjectId, position: Vec3) -> Result<()> {
        let object = self
            .registry
            .get_mut(id)
            .ok_or(EditorError::UnknownObject(id))?;
        object.set_position(position);
        if self.selected() == Some(id) {
            self.refresh_gizmo();
        }
        self.emit(EditorEvent::ObjectMoved { id, position });
        self.flush();
        Ok(())
    }

    /// Host-driven selection, same effect as clicking the object (or empty space)
    pub fn select(&mut self, id: Option<ObjectId>) -> Result<()> {
        if let Some(id) = id {
            if !self.registry.contains(id) {
                return Err(EditorError::UnknownObject(id));
            }
        }
        if self.state.is_dragging() || self.state.is_placement_pending() {
            self.cancel();
        }
        match id {
            Some(id) => self.apply_selection(id, true),
            None => self.clear_selection(),
        }
        self.flush();
        Ok(())
    }

    // ========================================================================
    // Camera
    // ========================================================================

    pub fn resize(&mut self, width: f32, height: f32) -> Result<()> {
        self.viewport = checked_viewport(width, height)?;
        self.camera.set_aspect(self.viewport.aspect());
        debug!(width, height, "viewport resized");
        Ok(())
    }

    /// Host moved the camera
    pub fn set_camera(&mut self, position: Vec3, target: Vec3) {
        self.camera.set_position(position);
        self.camera.set_target(target);
        self.refresh_gizmo();
    }

    pub fn camera_uniform(&self) -> CameraUniform {
        self.camera.uniform()
    }

    /// Advance damped orbit motion. Returns true when the camera moved.
    pub fn tick(&mut self) -> bool {
        let moved = self.controls.update(&mut self.camera);
        if moved {
            self.refresh_gizmo();
        }
        moved
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.controls.zoom(delta_y);
        self.tick();
    }

    /// Re-orient a visible gizmo to the current camera
    fn refresh_gizmo(&mut self) {
        if !self.gizmo.is_visible() {
            return;
        }
        if let Some(position) = self.selected().and_then(|id| self.registry.position(id)) {
            self.gizmo.update_axes_orientation(position, &self.camera);
        }
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        if self.controls.is_enabled() == enabled {
            return;
        }
        self.controls.set_enabled(enabled);
        debug!(enabled, "camera controls toggled");
        self.emit(EditorEvent::CameraControlsToggled { enabled });
    }

    // ========================================================================
    // Picking
    // ========================================================================

    fn resolver(&self) -> PickResolver<'_> {
        PickResolver {
            table: &self.table,
            registry: &self.registry,
            gizmo: &self.gizmo,
            scenery: &self.scenery,
        }
    }

    fn ray_at(&self, x: f32, y: f32) -> Ray {
        self.camera.screen_to_ray(x, y, self.viewport)
    }

    fn has_selection(&self) -> bool {
        matches!(self.state, InteractionState::ObjectSelected(_))
    }

    /// Resolve what a click at `(x, y)` would hit, without acting on it
    pub fn pick(&self, x: f32, y: f32) -> PickResult {
        self.resolver().resolve(&self.ray_at(x, y), self.has_selection())
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Enforce exclusivity after a click toggled `id`
    fn apply_selection(&mut self, id: ObjectId, selected: bool) {
        self.registry.deselect_all();

        let position = if selected {
            self.registry.get_mut(id).map(|object| {
                object.set_selected(true);
                object.position()
            })
        } else {
            None
        };

        match position {
            Some(position) => {
                self.gizmo.show(position, &self.camera);
                self.state = InteractionState::ObjectSelected(id);
                info!(%id, "object selected");
                self.emit(EditorEvent::SelectionChanged { selected: Some(id) });
            }
            None => {
                self.gizmo.hide();
                self.state = InteractionState::Idle;
                info!(%id, "selection cleared");
                self.emit(EditorEvent::SelectionChanged { selected: None });
            }
        }
    }

    fn clear_selection(&mut self) {
        let had_selection = self.selected().is_some();
        self.registry.deselect_all();
        self.gizmo.hide();
        self.state = InteractionState::Idle;
        if had_selection {
            info!("selection cleared");
            self.emit(EditorEvent::SelectionChanged { selected: None });
        }
    }

    // ========================================================================
    // Pointer input
    // ========================================================================

    pub fn pointer_down(&mut self, x: f32, y: f32, button: PointerButton, modifiers: Modifiers) {
        if button != PointerButton::Primary {
            return;
        }

        match self.state {
            InteractionState::Dragging { .. } => {}
            InteractionState::PlacementPending { preview, .. } => self.complete_placement(preview),
            InteractionState::Idle | InteractionState::ObjectSelected(_) => {
                let ray = self.ray_at(x, y);
                let pick = self.resolver().resolve(&ray, self.has_selection());
                trace!(?pick, x, y, "pointer down");

                let consumed = match pick {
                    PickResult::Gizmo(axis) => {
                        self.begin_drag(axis, &ray);
                        true
                    }
                    PickResult::Object(id) if modifiers.placement() => {
                        self.begin_placement(id);
                        true
                    }
                    PickResult::Object(id) => {
                        if let Some(object) = self.registry.get_mut(id) {
                            object.trigger_click(&mut self.object_events);
                        }
                        false
                    }
                    PickResult::Empty => {
                        self.clear_selection();
                        false
                    }
                };

                if !consumed && self.controls.is_enabled() {
                    self.orbit_anchor = Some(Vec2::new(x, y));
                }
            }
        }

        self.flush();
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let ray = self.ray_at(x, y);

        match self.state {
            InteractionState::Dragging { object, .. } => self.continue_drag(object, &ray),
            InteractionState::PlacementPending { source, .. } => self.update_preview(source, &ray),
            InteractionState::Idle | InteractionState::ObjectSelected(_) => {
                if let Some(anchor) = self.orbit_anchor {
                    let delta = Vec2::new(x, y) - anchor;
                    self.orbit_anchor = Some(Vec2::new(x, y));
                    self.controls.rotate(delta.x, delta.y, self.viewport.height);
                    self.tick();
                }
                // The camera may have moved
                let ray = self.ray_at(x, y);
                self.update_hover(&ray);
            }
        }

        self.flush();
    }

    /// Releasing the pointer ends a drag wherever the cursor is
    pub fn pointer_up(&mut self) {
        self.orbit_anchor = None;

        if let InteractionState::Dragging { object, axis } = self.state {
            self.gizmo.end_drag();
            self.state = InteractionState::ObjectSelected(object);
            self.set_controls_enabled(true);
            let position = self.registry.position(object).unwrap_or_default();
            debug!(%object, axis = axis.as_str(), ?position, "drag ended");
            self.emit(EditorEvent::DragEnded {
                id: object,
                position,
                cancelled: false,
            });
        }

        self.flush();
    }

    /// Abort a drag (restoring the start position) or a pending placement
    pub fn cancel(&mut self) {
        self.orbit_anchor = None;

        match self.state {
            InteractionState::Dragging { object, .. } => {
                let restored = self.gizmo.cancel_drag();
                if let (Some(position), Some(target)) = (restored, self.registry.get_mut(object)) {
                    target.set_position(position);
                }
                self.state = InteractionState::ObjectSelected(object);
                self.refresh_gizmo();
                self.set_controls_enabled(true);

                let position = self.registry.position(object).unwrap_or_default();
                debug!(%object, ?position, "drag cancelled");
                self.emit(EditorEvent::DragEnded {
                    id: object,
                    position,
                    cancelled: true,
                });
            }
            InteractionState::PlacementPending { .. } => {
                self.state = match self.registry.selected_ids().first() {
                    Some(&id) => InteractionState::ObjectSelected(id),
                    None => InteractionState::Idle,
                };
                debug!("placement cancelled");
                self.emit(EditorEvent::PlacementEnded { created: None });
            }
            InteractionState::Idle | InteractionState::ObjectSelected(_) => {}
        }

        self.flush();
    }

    // ========================================================================
    // Drag
    // ========================================================================

    fn begin_drag(&mut self, axis: GizmoAxis, ray: &Ray) {
        let InteractionState::ObjectSelected(object) = self.state else {
            return;
        };
        let Some(position) = self.registry.position(object) else {
            warn!(%object, "selected object missing from registry");
            return;
        };

        if self.gizmo.start_drag(axis, ray, position, &self.camera) {
            self.state = InteractionState::Dragging { object, axis };
            self.set_controls_enabled(false);
            self.emit(EditorEvent::DragStarted { id: object, axis });
        }
    }

    fn continue_drag(&mut self, object: ObjectId, ray: &Ray) {
        let Some(position) = self.gizmo.on_drag(ray) else {
            trace!("drag ray misses plane, position unchanged");
            return;
        };
        if let Some(target) = self.registry.get_mut(object) {
            target.set_position(position);
        }
        self.gizmo.update_axes_orientation(position, &self.camera);
        self.emit(EditorEvent::ObjectMoved {
            id: object,
            position,
        });
    }

    // ========================================================================
    // Placement
    // ========================================================================

    fn begin_placement(&mut self, source: ObjectId) {
        let Some(preview) = self.registry.position(source) else {
            return;
        };
        self.state = InteractionState::PlacementPending { source, preview };
        debug!(%source, "placement started");
        self.emit(EditorEvent::PlacementStarted { source, preview });
    }

    /// Track the pointer on the camera-facing plane through the source object
    fn update_preview(&mut self, source: ObjectId, ray: &Ray) {
        let Some(anchor) = self.registry.position(source) else {
            return;
        };
        let plane = Plane::from_normal_and_point(self.camera.view_direction(), anchor);
        let Some(preview) = ray.intersect_plane(&plane) else {
            trace!("placement ray misses plane, preview unchanged");
            return;
        };
        self.state = InteractionState::PlacementPending { source, preview };
        self.emit(EditorEvent::PlacementPreview { position: preview });
    }

    fn complete_placement(&mut self, position: Vec3) {
        let id = self.spawn(position);
        info!(%id, ?position, "object placed");
        self.emit(EditorEvent::PlacementEnded { created: Some(id) });

        match self.config.placement {
            PlacementPolicy::SelectNew => self.apply_selection(id, true),
            PlacementPolicy::ReturnToIdle => self.clear_selection(),
        }
    }

    // ========================================================================
    // Hover
    // ========================================================================

    fn update_hover(&mut self, ray: &Ray) {
        let (hit, handle) = {
            let resolver = self.resolver();
            let handle = if self.has_selection() {
                resolver.pick_gizmo(ray)
            } else {
                None
            };
            (resolver.pick_object(ray), handle)
        };

        if self.gizmo.is_visible() {
            let axis = handle.unwrap_or_default();
            if axis != self.gizmo.selected_axis() {
                self.gizmo.select_axis(axis);
            }
        }

        for object in self.registry.iter_mut() {
            let hovering = hit == Some(object.id());
            if object.is_hovered() != hovering {
                trace!(id = %object.id(), hovering, "hover changed");
            }
            object.trigger_hover(hovering, &mut self.object_events);
        }
    }

    // ========================================================================
    // Render state
    // ========================================================================

    pub fn marker_instances(&self) -> Vec<MarkerInstance> {
        self.registry.iter().map(PickableObject::instance).collect()
    }

    /// Handle records while the gizmo is visible
    pub fn handle_instances(&self) -> Option<[HandleInstance; 3]> {
        self.gizmo.is_visible().then(|| self.gizmo.instances())
    }

    /// Preview marker while a placement is pending
    pub fn preview_instance(&self) -> Option<MarkerInstance> {
        match self.state {
            InteractionState::PlacementPending { preview, .. } => Some(MarkerInstance::new(
                preview,
                self.config.marker.radius,
                MaterialState {
                    color: self.config.preview_color,
                    opacity: IDLE_OPACITY,
                },
            )),
            _ => None,
        }
    }

    pub fn overlay_status(&self) -> OverlayStatus {
        OverlayStatus {
            selected_label: self
                .selected()
                .and_then(|id| self.registry.display_name(id)),
            placement_active: self.state.is_placement_pending(),
        }
    }
}
