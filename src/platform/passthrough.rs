//! Pointer hit-testing and the pass-through input mode
//!
//! The host call that toggles pass-through can cross a process boundary, so
//! it is made only when the "over the ball" answer flips. The two-state
//! [`InputMode`] machine makes that structural: the only way to reach the
//! host is through a transition.

use glam::Vec2;

use super::host::{OverlayHost, PassthroughOptions};
use crate::sim::Body;

/// Decides whether a pointer sample is over the ball
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTester {
    /// Extra pixels around the ball that still count as a hit
    pub click_buffer: f32,
}

impl HitTester {
    pub fn new(click_buffer: f32) -> Self {
        Self { click_buffer }
    }

    /// Inclusive: a pointer exactly `radius + click_buffer` away is over
    pub fn is_over(&self, body: &Body, pointer: Vec2) -> bool {
        pointer.distance(body.pos) <= body.radius() + self.click_buffer
    }
}

/// Where pointer input currently goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Input falls through to the windows below
    #[default]
    PassThrough,
    /// Input is delivered to the overlay
    Interactive,
}

impl InputMode {
    pub fn for_hit(over: bool) -> Self {
        if over {
            InputMode::Interactive
        } else {
            InputMode::PassThrough
        }
    }

    #[inline]
    pub fn ignores_input(self) -> bool {
        self == InputMode::PassThrough
    }
}

/// Instruction for the host produced by a mode change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassthroughRequest {
    pub ignore_input: bool,
    pub options: PassthroughOptions,
}

impl PassthroughRequest {
    fn for_mode(mode: InputMode) -> Self {
        Self {
            ignore_input: mode.ignores_input(),
            options: PassthroughOptions { forward: true },
        }
    }

    pub fn send<H: OverlayHost + ?Sized>(self, host: &mut H) {
        host.set_input_passthrough(self.ignore_input, self.options);
    }
}

/// Edge-triggered bridge between hit-test results and the host
#[derive(Debug, Clone, Default)]
pub struct PassthroughBridge {
    mode: InputMode,
}

impl PassthroughBridge {
    /// Starts in pass-through: the overlay ignores input until approached
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.mode == InputMode::Interactive
    }

    /// The request that mirrors the current mode, for the startup sync
    pub fn current_request(&self) -> PassthroughRequest {
        PassthroughRequest::for_mode(self.mode)
    }

    /// Feed a hit-test result; returns a request only when the mode flips
    pub fn transition(&mut self, over: bool) -> Option<PassthroughRequest> {
        let next = InputMode::for_hit(over);
        if next == self.mode {
            return None;
        }
        log::debug!("Input mode {:?} -> {:?}", self.mode, next);
        self.mode = next;
        Some(PassthroughRequest::for_mode(next))
    }
}
