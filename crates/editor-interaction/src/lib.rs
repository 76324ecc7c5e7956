pub mod camera;
pub mod config;
pub mod controls;
pub mod error;
pub mod gizmo;
pub mod interaction;
pub mod picking;
pub mod session;
pub mod snapshot;

pub use camera::{Camera, CameraUniform, Viewport};
pub use config::{
    CameraConfig, ControlsConfig, EditorConfig, GizmoConfig, MarkerStyle, PlacementPolicy,
};
pub use controls::OrbitControls;
pub use error::{EditorError, Result};
pub use gizmo::{AxesOrientation, DragSession, GizmoAxis, HandlePart, ManipulationGizmo};
pub use interaction::{EditorEvent, InteractionState, Modifiers, PointerButton};
pub use picking::{
    PickResolver, PickResult, PickTable, PickTag, Plane, Ray, SceneryItem, Shape,
};
pub use session::EditorSession;
pub use snapshot::{HandleInstance, OverlayStatus};

// Re-export core types for consistent version usage
pub use editor_core;
pub use editor_core::glam;
