pub mod events;
pub mod object;
pub mod registry;

// Re-exports
pub use events::{EventQueue, Subscribers};
pub use object::{Color, MarkerInstance, MaterialState, ObjectEvent, ObjectId, PickableObject};
pub use registry::ObjectRegistry;

// Re-export glam types for consistent version usage
pub use glam;
