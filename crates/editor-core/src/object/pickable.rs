//! Pickable marker entity
//!
//! A sphere marker with selection/hover visual state. Click and hover
//! notifications go out through an [`EventQueue`]; the object never touches
//! other objects, selection exclusivity is orchestrated by the owner.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::id::ObjectId;
use crate::events::EventQueue;

/// Opacity of a selected or hovered marker
pub const OPAQUE: f32 = 1.0;
/// Opacity of an idle marker
pub const IDLE_OPACITY: f32 = 0.8;

/// Default highlight color for selected markers
pub const DEFAULT_SELECTED_COLOR: Color = Color(0xffff00);

/// Notifications emitted by a [`PickableObject`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectEvent {
    /// Emitted after a click toggled the selection flag
    Clicked { id: ObjectId, selected: bool },
    /// Emitted on every hover evaluation
    Hovered { id: ObjectId, hovering: bool },
}

/// Material parameters derived from selection/hover state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialState {
    pub color: Color,
    pub opacity: f32,
}

/// Flat per-marker record for instanced rendering
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MarkerInstance {
    pub position: [f32; 3],
    pub radius: f32,
    pub color: [f32; 3],
    pub opacity: f32,
}

impl MarkerInstance {
    pub fn new(position: Vec3, radius: f32, material: MaterialState) -> Self {
        Self {
            position: position.to_array(),
            radius,
            color: material.color.to_rgb(),
            opacity: material.opacity,
        }
    }
}

/// Movable spherical marker
#[derive(Debug, Clone)]
pub struct PickableObject {
    id: ObjectId,
    position: Vec3,
    radius: f32,
    base_color: Color,
    selected_color: Color,
    selected: bool,
    hovered: bool,
}

impl PickableObject {
    pub fn new(id: ObjectId, position: Vec3, radius: f32, base_color: Color) -> Self {
        Self {
            id,
            position,
            radius,
            base_color,
            selected_color: DEFAULT_SELECTED_COLOR,
            selected: false,
            hovered: false,
        }
    }

    pub fn with_selected_color(mut self, color: Color) -> Self {
        self.selected_color = color;
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Current position (returned by value)
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn base_color(&self) -> Color {
        self.base_color
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Toggle selection, then report the click
    pub fn trigger_click(&mut self, events: &mut EventQueue<ObjectEvent>) {
        self.selected = !self.selected;
        events.push(ObjectEvent::Clicked {
            id: self.id,
            selected: self.selected,
        });
    }

    /// Record hover state and report it.
    /// A selected marker keeps its highlight look regardless of hover.
    pub fn trigger_hover(&mut self, hovering: bool, events: &mut EventQueue<ObjectEvent>) {
        self.hovered = hovering;
        events.push(ObjectEvent::Hovered {
            id: self.id,
            hovering,
        });
    }

    /// Material as a pure function of `(selected, hovered)`
    pub fn material(&self) -> MaterialState {
        match (self.selected, self.hovered) {
            (true, _) => MaterialState {
                color: self.selected_color,
                opacity: OPAQUE,
            },
            (false, true) => MaterialState {
                color: self.base_color,
                opacity: OPAQUE,
            },
            (false, false) => MaterialState {
                color: self.base_color,
                opacity: IDLE_OPACITY,
            },
        }
    }

    pub fn instance(&self) -> MarkerInstance {
        MarkerInstance::new(self.position, self.radius, self.material())
    }
}
