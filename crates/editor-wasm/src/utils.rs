//! Helpers shared by the JS bindings

use std::fmt::Display;

use editor_interaction::{EditorEvent, GizmoAxis};
use wasm_bindgen::JsValue;

/// GizmoAxis to its JS string form
pub fn axis_to_string(axis: GizmoAxis) -> String {
    axis.as_str().to_string()
}

/// Error to a JS string value
pub fn to_js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Serialized `type` tag of an event, used for subscription filters
pub fn event_type(event: &EditorEvent) -> &'static str {
    match event {
        EditorEvent::Object { .. } => "object",
        EditorEvent::SelectionChanged { .. } => "selection_changed",
        EditorEvent::DragStarted { .. } => "drag_started",
        EditorEvent::ObjectMoved { .. } => "object_moved",
        EditorEvent::DragEnded { .. } => "drag_ended",
        EditorEvent::PlacementStarted { .. } => "placement_started",
        EditorEvent::PlacementPreview { .. } => "placement_preview",
        EditorEvent::PlacementEnded { .. } => "placement_ended",
        EditorEvent::ObjectCreated { .. } => "object_created",
        EditorEvent::CameraControlsToggled { .. } => "camera_controls_toggled",
    }
}
