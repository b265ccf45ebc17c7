//! Pointer drag constraint
//!
//! While grabbed, the ball centre is pulled toward the pointer (minus the
//! offset it was grabbed at) by a stiffness-weighted share of the remaining
//! distance. The resulting displacement becomes the body velocity, so letting
//! go keeps the momentum the drag built up.

use glam::Vec2;

use super::state::Body;
use crate::consts::BASE_DELTA_MS;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Grab {
    /// Latest pointer position
    pointer: Vec2,
    /// Pointer position relative to the body centre at grab time
    offset: Vec2,
}

/// Spring that ties the body to the pointer while dragging
#[derive(Debug, Clone, PartialEq)]
pub struct DragConstraint {
    /// Fraction of the remaining distance covered per base frame (0, 1]
    pub stiffness: f32,
    grab: Option<Grab>,
}

impl DragConstraint {
    pub fn new(stiffness: f32) -> Self {
        Self {
            stiffness,
            grab: None,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.grab.is_some()
    }

    /// Attach to the body at the pointer position
    pub fn grab(&mut self, body: &Body, pointer: Vec2) {
        self.grab = Some(Grab {
            pointer,
            offset: pointer - body.pos,
        });
    }

    /// Follow the pointer (no-op when not dragging)
    pub fn move_to(&mut self, pointer: Vec2) {
        if let Some(grab) = self.grab.as_mut() {
            grab.pointer = pointer;
        }
    }

    /// Detach; the body keeps its current velocity
    pub fn release(&mut self) {
        self.grab = None;
    }

    /// Where the body centre is being pulled to
    pub fn target(&self) -> Option<Vec2> {
        self.grab.map(|g| g.pointer - g.offset)
    }

    /// Share of the remaining distance covered in `dt_ms`
    ///
    /// Compounds the per-frame stiffness so the spring feels the same at any
    /// frame rate.
    pub fn blend_factor(&self, dt_ms: f32) -> f32 {
        let frames = dt_ms / BASE_DELTA_MS;
        (1.0 - (1.0 - self.stiffness).powf(frames)).clamp(0.0, 1.0)
    }

    /// Drive the body toward the target; returns false when not dragging
    pub fn apply(&self, body: &mut Body, dt_ms: f32) -> bool {
        let Some(target) = self.target() else {
            return false;
        };

        let displacement = (target - body.pos) * self.blend_factor(dt_ms);
        body.pos += displacement;
        if dt_ms > 0.0 {
            body.vel = displacement / dt_ms;
        }
        true
    }
}
