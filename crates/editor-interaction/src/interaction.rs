//! Interaction state, pointer input types and outbound editor events

use editor_core::{ObjectEvent, ObjectId};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::gizmo::GizmoAxis;

/// What the current gesture means. Exactly one variant is active.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    ObjectSelected(ObjectId),
    Dragging { object: ObjectId, axis: GizmoAxis },
    PlacementPending { source: ObjectId, preview: Vec3 },
}

impl InteractionState {
    /// Object the gizmo is attached to, if any
    pub fn selected(&self) -> Option<ObjectId> {
        match *self {
            InteractionState::ObjectSelected(id) => Some(id),
            InteractionState::Dragging { object, .. } => Some(object),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, InteractionState::Dragging { .. })
    }

    pub fn is_placement_pending(&self) -> bool {
        matches!(self, InteractionState::PlacementPending { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::ObjectSelected(_) => "object_selected",
            InteractionState::Dragging { .. } => "dragging",
            InteractionState::PlacementPending { .. } => "placement_pending",
        }
    }
}

/// Mouse button, numbered like DOM `MouseEvent.button`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
    Other(i16),
}

impl From<i16> for PointerButton {
    fn from(button: i16) -> Self {
        match button {
            0 => PointerButton::Primary,
            1 => PointerButton::Middle,
            2 => PointerButton::Secondary,
            other => PointerButton::Other(other),
        }
    }
}

/// Modifier keys held during a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub alt: bool,
    pub meta: bool,
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        alt: false,
        meta: false,
        ctrl: false,
        shift: false,
    };

    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    /// Alt or Meta turns an object click into a placement
    pub fn placement(&self) -> bool {
        self.alt || self.meta
    }
}

/// Notifications published to session subscribers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorEvent {
    /// Raw click/hover report from an object
    Object { event: ObjectEvent },
    SelectionChanged { selected: Option<ObjectId> },
    DragStarted { id: ObjectId, axis: GizmoAxis },
    ObjectMoved { id: ObjectId, position: Vec3 },
    DragEnded { id: ObjectId, position: Vec3, cancelled: bool },
    PlacementStarted { source: ObjectId, preview: Vec3 },
    PlacementPreview { position: Vec3 },
    PlacementEnded { created: Option<ObjectId> },
    ObjectCreated { id: ObjectId, position: Vec3 },
    CameraControlsToggled { enabled: bool },
}
