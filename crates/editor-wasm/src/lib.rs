// crates/editor-wasm/src/lib.rs

mod subscription;
mod utils;

use std::rc::Rc;

use glam::Vec3;
use js_sys::Function;
use tracing::info;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, MouseEvent, PointerEvent, WheelEvent};

use editor_core::ObjectId;
use editor_interaction::{
    EditorConfig, EditorSession, Modifiers, PointerButton, Shape, Viewport,
};

use subscription::{drain_events, EventBuffer, EventSubscriptionManager};
use utils::{axis_to_string, to_js_error};

/// Panic hook and console logging
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::INFO)
            .build(),
    );
}

fn modifiers_of(event: &MouseEvent) -> Modifiers {
    Modifiers {
        alt: event.alt_key(),
        meta: event.meta_key(),
        ctrl: event.ctrl_key(),
        shift: event.shift_key(),
    }
}

/// Editor facade driven by the browser host.
/// The host renders; this only consumes input and exposes render state.
#[wasm_bindgen]
pub struct Editor {
    session: EditorSession,
    events: EventBuffer,
    subscriptions: EventSubscriptionManager,
}

impl Editor {
    fn from_session(mut session: EditorSession) -> Self {
        let events = EventBuffer::default();
        let sink = Rc::clone(&events);
        session.subscribe(move |event| sink.borrow_mut().push(*event));
        Self {
            session,
            events,
            subscriptions: EventSubscriptionManager::new(),
        }
    }

    /// Deliver everything the last call published
    fn dispatch(&self) {
        self.subscriptions.dispatch(&self.events);
    }
}

#[wasm_bindgen]
impl Editor {
    /// Create an editor for a viewport. `config_json` may omit any field.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32, config_json: Option<String>) -> Result<Editor, JsValue> {
        let config = match config_json {
            Some(json) => EditorConfig::from_json(&json).map_err(to_js_error)?,
            None => EditorConfig::default(),
        };
        let session =
            EditorSession::new(config, Viewport::new(width, height)).map_err(to_js_error)?;
        info!("editor created");
        Ok(Self::from_session(session))
    }

    /// Create an editor sized to a canvas
    pub fn for_canvas(
        canvas: &HtmlCanvasElement,
        config_json: Option<String>,
    ) -> Result<Editor, JsValue> {
        Self::new(
            canvas.client_width() as f32,
            canvas.client_height() as f32,
            config_json,
        )
    }

    /// Current config as JSON
    pub fn config_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.session.config()).map_err(to_js_error)
    }

    // ========================================================================
    // Input
    // ========================================================================

    pub fn pointer_down(
        &mut self,
        x: f32,
        y: f32,
        button: i16,
        alt: bool,
        meta: bool,
        ctrl: bool,
        shift: bool,
    ) {
        let modifiers = Modifiers {
            alt,
            meta,
            ctrl,
            shift,
        };
        self.session
            .pointer_down(x, y, PointerButton::from(button), modifiers);
        self.dispatch();
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.session.pointer_move(x, y);
        self.dispatch();
    }

    pub fn pointer_up(&mut self) {
        self.session.pointer_up();
        self.dispatch();
    }

    /// `pointerdown` listener target, coordinates relative to the canvas
    pub fn handle_pointer_down(&mut self, event: &PointerEvent) {
        let modifiers = modifiers_of(event);
        self.session.pointer_down(
            event.offset_x() as f32,
            event.offset_y() as f32,
            PointerButton::from(event.button()),
            modifiers,
        );
        self.dispatch();
    }

    pub fn handle_pointer_move(&mut self, event: &PointerEvent) {
        self.pointer_move(event.offset_x() as f32, event.offset_y() as f32);
    }

    pub fn handle_pointer_up(&mut self, _event: &PointerEvent) {
        self.pointer_up();
    }

    pub fn handle_wheel(&mut self, event: &WheelEvent) {
        self.wheel(event.delta_y() as f32);
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.session.wheel(delta_y);
        self.dispatch();
    }

    /// Abort the current drag or placement
    pub fn cancel(&mut self) {
        self.session.cancel();
        self.dispatch();
    }

    /// Per-frame update, call before rendering. Returns true when the camera moved.
    pub fn tick(&mut self) -> bool {
        let moved = self.session.tick();
        self.dispatch();
        moved
    }

    /// Canvas resize
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), JsValue> {
        self.session.resize(width, height).map_err(to_js_error)
    }

    pub fn set_camera(&mut self, px: f32, py: f32, pz: f32, tx: f32, ty: f32, tz: f32) {
        self.session
            .set_camera(Vec3::new(px, py, pz), Vec3::new(tx, ty, tz));
        self.dispatch();
    }

    // ========================================================================
    // Scene
    // ========================================================================

    /// Add a marker, returns its id
    pub fn add_object(&mut self, x: f32, y: f32, z: f32) -> u32 {
        let id = self.session.add_object(Vec3::new(x, y, z));
        self.dispatch();
        id.to_u32()
    }

    /// Ground quad on the XZ plane that blocks picks, returns its scenery id
    pub fn add_ground(&mut self, size: f32) -> u32 {
        let half = size * 0.5;
        self.session.add_scenery(Shape::Quad {
            center: Vec3::ZERO,
            half_u: Vec3::X * half,
            half_v: Vec3::NEG_Z * half,
        })
    }

    pub fn remove_scenery(&mut self, id: u32) -> bool {
        self.session.remove_scenery(id)
    }

    /// Remove every marker, returns how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.session.clear();
        self.dispatch();
        removed
    }

    pub fn select(&mut self, id: Option<u32>) -> Result<(), JsValue> {
        let result = self.session.select(id.map(ObjectId::from_u32));
        self.dispatch();
        result.map_err(to_js_error)
    }

    /// Position of a marker (x, y, z)
    pub fn get_position(&self, id: u32) -> Option<Vec<f32>> {
        self.session
            .object_position(ObjectId::from_u32(id))
            .ok()
            .map(|p| p.to_array().to_vec())
    }

    pub fn set_position(&mut self, id: u32, x: f32, y: f32, z: f32) -> Result<(), JsValue> {
        let result = self
            .session
            .set_object_position(ObjectId::from_u32(id), Vec3::new(x, y, z));
        self.dispatch();
        result.map_err(to_js_error)
    }

    /// Marker ids in creation order
    pub fn object_ids(&self) -> Vec<u32> {
        self.session
            .registry()
            .ids()
            .iter()
            .map(|id| id.to_u32())
            .collect()
    }

    pub fn object_count(&self) -> usize {
        self.session.registry().len()
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Interaction state name, e.g. `object_selected`
    pub fn state(&self) -> String {
        self.session.state().name().to_string()
    }

    pub fn selected(&self) -> Option<u32> {
        self.session.selected().map(|id| id.to_u32())
    }

    /// Highlighted gizmo axis (`x`, `y`, `z` or empty)
    pub fn selected_axis(&self) -> String {
        axis_to_string(self.session.gizmo().selected_axis())
    }

    pub fn gizmo_visible(&self) -> bool {
        self.session.gizmo().is_visible()
    }

    /// Whether the host's orbit input is currently honoured
    pub fn controls_enabled(&self) -> bool {
        self.session.controls().is_enabled()
    }

    /// `{ selected_label, placement_active }`
    pub fn overlay_status(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.session.overlay_status()).map_err(to_js_error)
    }

    // ========================================================================
    // Render state (flat f32 arrays for GPU upload)
    // ========================================================================

    /// 8 floats per marker: position, radius, color, opacity
    pub fn marker_instances(&self) -> Vec<f32> {
        bytemuck::cast_slice(&self.session.marker_instances()).to_vec()
    }

    /// 12 floats per handle: rotation, position, opacity, color, length. Empty while hidden.
    pub fn handle_instances(&self) -> Vec<f32> {
        self.session
            .handle_instances()
            .map(|handles| bytemuck::cast_slice(&handles).to_vec())
            .unwrap_or_default()
    }

    /// Placement preview marker, empty when no placement is pending
    pub fn preview_instance(&self) -> Vec<f32> {
        self.session
            .preview_instance()
            .map(|preview| bytemuck::cast_slice(&[preview]).to_vec())
            .unwrap_or_default()
    }

    /// Column-major view-projection matrix
    pub fn camera_uniform(&self) -> Vec<f32> {
        bytemuck::cast_slice(&[self.session.camera_uniform()]).to_vec()
    }

    pub fn camera_position(&self) -> Vec<f32> {
        self.session.camera().position.to_array().to_vec()
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Call `callback(event)` for every editor event, or only those whose `type` is `event_type`.
    /// Callbacks run inside the editor call that produced the event and must not call back
    /// into the editor; use `take_events` to react with editor queries.
    pub fn subscribe(&mut self, callback: Function, event_type: Option<String>) -> u32 {
        self.subscriptions.subscribe(callback, event_type)
    }

    pub fn unsubscribe(&mut self, id: u32) -> bool {
        self.subscriptions.unsubscribe(id)
    }

    /// Pull the events published since the last pull, as an array of event objects.
    /// Only collects events while no callback is subscribed.
    pub fn take_events(&mut self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&drain_events(&self.events)).map_err(to_js_error)
    }
}
