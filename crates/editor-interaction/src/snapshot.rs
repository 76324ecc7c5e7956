//! Render-facing snapshots of editor state

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Per-handle record for instanced rendering.
/// The handle arrow is modelled along +Y and rotated by `rotation` (xyzw).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct HandleInstance {
    pub rotation: [f32; 4],
    pub position: [f32; 3],
    pub opacity: f32,
    pub color: [f32; 3],
    /// Shaft plus head
    pub length: f32,
}

impl HandleInstance {
    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

/// Overlay text state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayStatus {
    /// Display name of the selected object, e.g. `sphere-0`
    pub selected_label: Option<String>,
    pub placement_active: bool,
}
