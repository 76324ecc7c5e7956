use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Object identifier with a generation counter.
/// - index: slot in the registry arena
/// - generation: bumped when a slot is reused, so stale ids never alias a new object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u32", from = "u32")]
pub struct ObjectId {
    index: u32,
    generation: NonZeroU32,
}

impl ObjectId {
    /// Largest generation that survives [`ObjectId::to_u32`]
    pub const MAX_GENERATION: u32 = 0xFFF;

    /// Create an id. A zero generation is clamped to 1 (0 is reserved).
    pub fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation: NonZeroU32::new(generation).unwrap_or(NonZeroU32::MIN),
        }
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation.get()
    }

    /// Packed id for the JS side (upper 12 bits: generation, lower 20 bits: index)
    #[inline]
    pub fn to_u32(&self) -> u32 {
        let generation_bits = (self.generation.get() & Self::MAX_GENERATION) << 20;
        let index_bits = self.index & 0xFFFFF;
        generation_bits | index_bits
    }

    /// Restore an id packed by [`ObjectId::to_u32`]
    #[inline]
    pub fn from_u32(id: u32) -> Self {
        let generation = (id >> 20) & Self::MAX_GENERATION;
        let index = id & 0xFFFFF;
        Self::new(index, generation.max(1))
    }
}

impl From<ObjectId> for u32 {
    fn from(id: ObjectId) -> Self {
        id.to_u32()
    }
}

impl From<u32> for ObjectId {
    fn from(id: u32) -> Self {
        ObjectId::from_u32(id)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_accessors() {
        let id = ObjectId::new(42, 3);
        assert_eq!(id.index(), 42);
        assert_eq!(id.generation(), 3);
    }

    #[test]
    fn test_zero_generation_is_clamped() {
        let id = ObjectId::new(7, 0);
        assert_eq!(id.generation(), 1);
    }

    #[test]
    fn test_packed_id_keeps_generation() {
        let id = ObjectId::new(12345, 7);
        let restored = ObjectId::from_u32(id.to_u32());
        assert_eq!(restored, id);
        assert_ne!(ObjectId::new(12345, 8).to_u32(), id.to_u32());
    }

    #[test]
    fn test_packed_id_max_generation() {
        let id = ObjectId::new(0xFFFFF, ObjectId::MAX_GENERATION);
        assert_eq!(ObjectId::from_u32(id.to_u32()), id);
    }

    #[test]
    fn test_serializes_as_packed_number() {
        let id = ObjectId::new(2, 1);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, id.to_u32().to_string());
        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_display() {
        assert_eq!(ObjectId::new(4, 2).to_string(), "4v2");
    }
}
