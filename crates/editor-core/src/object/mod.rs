pub mod color;
pub mod id;
pub mod pickable;

pub use color::Color;
pub use id::ObjectId;
pub use pickable::{MarkerInstance, MaterialState, ObjectEvent, PickableObject};
