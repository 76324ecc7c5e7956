use glam::Vec3;
use tracing::debug;

use crate::object::{ObjectId, PickableObject};

/// Arena slot
struct Slot {
    /// Current generation
    generation: u32,
    object: Option<PickableObject>,
}

/// Ordered registry of every pickable object in the scene.
/// Iteration follows creation order, which also drives display naming.
#[derive(Default)]
pub struct ObjectRegistry {
    slots: Vec<Slot>,
    /// Reusable slot indices
    free_list: Vec<u32>,
    /// Live ids in creation order
    order: Vec<ObjectId>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id and store the object built for it
    pub fn insert_with(&mut self, build: impl FnOnce(ObjectId) -> PickableObject) -> ObjectId {
        let id = if let Some(index) = self.free_list.pop() {
            // Reuse: bump the generation, wrapping within what a packed id can carry
            let slot = &mut self.slots[index as usize];
            slot.generation = if slot.generation >= ObjectId::MAX_GENERATION {
                1
            } else {
                slot.generation + 1
            };
            ObjectId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 1,
                object: None,
            });
            ObjectId::new(index, 1)
        };

        self.slots[id.index() as usize].object = Some(build(id));
        self.order.push(id);
        debug!(%id, "object registered");
        id
    }

    /// Remove an object. Returns `None` for stale or unknown ids.
    pub fn remove(&mut self, id: ObjectId) -> Option<PickableObject> {
        if !self.contains(id) {
            return None;
        }
        let object = self.slots[id.index() as usize].object.take();
        self.free_list.push(id.index());
        self.order.retain(|&other| other != id);
        object
    }

    /// Remove every object (scene teardown), in creation order
    pub fn clear(&mut self) -> Vec<PickableObject> {
        let ids = std::mem::take(&mut self.order);
        ids.into_iter()
            .filter_map(|id| {
                self.free_list.push(id.index());
                self.slots[id.index() as usize].object.take()
            })
            .collect()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.slots
            .get(id.index() as usize)
            .is_some_and(|slot| slot.generation == id.generation() && slot.object.is_some())
    }

    pub fn get(&self, id: ObjectId) -> Option<&PickableObject> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.object.as_ref()
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut PickableObject> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.object.as_mut()
    }

    pub fn position(&self, id: ObjectId) -> Option<Vec3> {
        self.get(id).map(PickableObject::position)
    }

    /// Live ids in creation order
    pub fn ids(&self) -> &[ObjectId] {
        &self.order
    }

    /// Objects in creation order
    pub fn iter(&self) -> impl Iterator<Item = &PickableObject> {
        self.order.iter().filter_map(|&id| self.get(id))
    }

    /// Mutable access to every live object, in creation order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PickableObject> {
        let mut by_index: Vec<Option<&mut PickableObject>> = self
            .slots
            .iter_mut()
            .map(|slot| slot.object.as_mut())
            .collect();
        self.order
            .iter()
            .filter_map(move |id| by_index.get_mut(id.index() as usize)?.take())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Position of the object in creation order
    pub fn display_index(&self, id: ObjectId) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    /// Overlay label, e.g. `sphere-0`
    pub fn display_name(&self, id: ObjectId) -> Option<String> {
        self.display_index(id).map(|i| format!("sphere-{}", i))
    }

    pub fn deselect_all(&mut self) {
        for object in self.iter_mut() {
            object.set_selected(false);
        }
    }

    /// Ids of every object currently flagged selected
    pub fn selected_ids(&self) -> Vec<ObjectId> {
        self.iter().filter(|o| o.is_selected()).map(|o| o.id()).collect()
    }
}
