//! The overlay core driven by the host's frame callback
//!
//! One logical thread: the host calls [`Overlay::tick`] (or
//! [`Overlay::advance`] when it skips painting) once per loop iteration and
//! forwards pointer events in between. Hosts with their own
//! threads must serialize both onto one queue.

use glam::Vec2;

use super::host::OverlayHost;
use super::passthrough::{HitTester, InputMode, PassthroughBridge};
use crate::renderer::{Compositor, SphereFrame};
use crate::settings::Settings;
use crate::sim::{self, Screen, StepReport, World};

/// Turns frame timestamps into elapsed milliseconds
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed time since the previous timestamp
    ///
    /// The first call yields 0. A timestamp earlier than the previous one
    /// yields the negative gap, which the physics step ignores, and becomes
    /// the new baseline.
    pub fn delta(&mut self, now_ms: f64) -> f32 {
        if !now_ms.is_finite() {
            return f32::NAN;
        }
        let dt = self.last.map_or(0.0, |last| now_ms - last);
        self.last = Some(now_ms);
        dt as f32
    }
}

/// Physics, hit-testing and composition for one ball
#[derive(Debug, Clone)]
pub struct Overlay {
    world: World,
    hit_tester: HitTester,
    bridge: PassthroughBridge,
    compositor: Compositor,
    clock: FrameClock,
    pointer: Option<Vec2>,
}

impl Overlay {
    pub fn new(screen: Screen, settings: &Settings) -> Self {
        Self {
            world: World::new(screen, settings),
            hit_tester: HitTester::new(settings.click_buffer),
            bridge: PassthroughBridge::new(),
            compositor: Compositor,
            clock: FrameClock::new(),
            pointer: None,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn input_mode(&self) -> InputMode {
        self.bridge.mode()
    }

    pub fn is_dragging(&self) -> bool {
        self.world.drag.is_active()
    }

    /// Tell the host the initial mode (pass-through) before any pointer sample
    pub fn start<H: OverlayHost + ?Sized>(&self, host: &mut H) {
        self.bridge.current_request().send(host);
    }

    /// Advance physics to `now_ms` and compose the frame to paint
    pub fn tick(&mut self, now_ms: f64) -> SphereFrame {
        self.advance(now_ms);
        self.compose()
    }

    /// Advance physics to `now_ms` without composing
    ///
    /// Hosts that skip painting (e.g. while the window is covered) keep
    /// calling this so the ball never freezes.
    pub fn advance(&mut self, now_ms: f64) -> StepReport {
        let dt = self.clock.delta(now_ms);
        self.step(dt)
    }

    /// Advance physics by an explicit delta
    pub fn step(&mut self, dt_ms: f32) -> StepReport {
        sim::step(&mut self.world, dt_ms)
    }

    pub fn compose(&self) -> SphereFrame {
        self.compositor.compose(&self.world.body)
    }

    /// Re-evaluate the hit test for a pointer sample
    pub fn on_pointer_move<H: OverlayHost + ?Sized>(&mut self, host: &mut H, x: f32, y: f32) {
        let pointer = Vec2::new(x, y);
        if !pointer.is_finite() {
            log::trace!("Ignoring pointer sample ({x}, {y})");
            return;
        }
        self.pointer = Some(pointer);
        self.world.drag.move_to(pointer);

        // Stay interactive while dragging so the release is still delivered
        let over = self.is_dragging() || self.hit_tester.is_over(&self.world.body, pointer);
        if let Some(request) = self.bridge.transition(over) {
            request.send(host);
        }
    }

    /// Grab the ball if the pointer is over it
    pub fn on_pointer_down(&mut self) {
        let Some(pointer) = self.pointer else {
            return;
        };
        if self.bridge.mode() == InputMode::Interactive && !self.is_dragging() {
            log::debug!("Drag started at ({:.0}, {:.0})", pointer.x, pointer.y);
            self.world.drag.grab(&self.world.body, pointer);
        }
    }

    /// Let go of the ball, keeping its momentum
    pub fn on_pointer_up(&mut self) {
        if self.is_dragging() {
            let vel = self.world.body.vel;
            log::debug!("Drag released with velocity ({:.3}, {:.3}) px/ms", vel.x, vel.y);
            self.world.drag.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::host::PassthroughOptions;
    use crate::platform::passthrough::tests::RecordingHost;

    fn overlay() -> Overlay {
        Overlay::new(Screen::new(1920.0, 1080.0, 1040.0), &Settings::default())
    }

    #[test]
    fn test_clock_first_delta_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.delta(1000.0), 0.0);
        assert_eq!(clock.delta(1016.5), 16.5);
        assert_eq!(clock.delta(1010.0), -6.5);
        assert_eq!(clock.delta(1026.0), 16.0);
        assert!(clock.delta(f64::NAN).is_nan());
    }

    #[test]
    fn test_start_requests_pass_through() {
        let overlay = overlay();
        let mut host = RecordingHost::default();
        overlay.start(&mut host);
        assert_eq!(host.calls, vec![(true, PassthroughOptions { forward: true })]);
        assert_eq!(overlay.input_mode(), InputMode::PassThrough);
    }

    #[test]
    fn test_tick_advances_and_composes() {
        let mut overlay = overlay();
        let first = overlay.tick(0.0);
        assert_eq!(first.layers[1].center, Vec2::new(960.0, 100.0));

        let second = overlay.tick(16.0);
        assert!(second.layers[1].center.y > 100.0);
    }

    #[test]
    fn test_advance_without_painting_keeps_falling() {
        let mut overlay = overlay();
        overlay.advance(0.0);
        for i in 1..=30 {
            overlay.advance(f64::from(i) * 16.0);
        }
        let body = &overlay.world().body;
        assert!(body.pos.y > 100.0);
        assert!(body.vel.y > 0.0);

        // Painting resumes from where physics got to
        let frame = overlay.compose();
        assert_eq!(frame.layers[1].center, body.pos);
    }

    #[test]
    fn test_backwards_timestamp_keeps_state() {
        let mut overlay = overlay();
        overlay.tick(100.0);
        overlay.tick(116.0);
        let before = overlay.world().body.clone();
        overlay.tick(50.0);
        assert_eq!(overlay.world().body, before);
    }

    #[test]
    fn test_pointer_moves_toggle_on_change_only() {
        let mut overlay = overlay();
        let mut host = RecordingHost::default();

        overlay.on_pointer_move(&mut host, 10.0, 10.0);
        overlay.on_pointer_move(&mut host, 960.0, 150.0);
        overlay.on_pointer_move(&mut host, 965.0, 110.0);
        overlay.on_pointer_move(&mut host, 1500.0, 900.0);

        assert_eq!(
            host.calls,
            vec![
                (false, PassthroughOptions { forward: true }),
                (true, PassthroughOptions { forward: true }),
            ]
        );
    }

    #[test]
    fn test_nan_pointer_is_ignored() {
        let mut overlay = overlay();
        let mut host = RecordingHost::default();
        overlay.on_pointer_move(&mut host, 960.0, 100.0);
        overlay.on_pointer_move(&mut host, f32::NAN, 0.0);
        assert_eq!(host.calls.len(), 1);
        assert_eq!(overlay.input_mode(), InputMode::Interactive);
    }

    #[test]
    fn test_pointer_down_outside_does_not_grab() {
        let mut overlay = overlay();
        let mut host = RecordingHost::default();
        overlay.on_pointer_move(&mut host, 10.0, 10.0);
        overlay.on_pointer_down();
        assert!(!overlay.is_dragging());
    }

    #[test]
    fn test_drag_and_throw() {
        let mut overlay = overlay();
        let mut host = RecordingHost::default();

        overlay.on_pointer_move(&mut host, 960.0, 100.0);
        overlay.on_pointer_down();
        assert!(overlay.is_dragging());

        overlay.on_pointer_move(&mut host, 100.0, 100.0);
        for _ in 0..3 {
            overlay.step(16.0);
        }
        // The pointer ran ahead of the ball but the surface stays interactive
        assert_eq!(overlay.input_mode(), InputMode::Interactive);

        let body = &overlay.world().body;
        let displacement = Vec2::new(100.0, 100.0) - body.pos;
        overlay.on_pointer_up();

        let vel = overlay.world().body.vel;
        assert!(!overlay.is_dragging());
        assert!(vel.normalize().dot(displacement.normalize()) > 0.999);
    }

    #[test]
    fn test_release_away_from_ball_returns_to_pass_through() {
        let mut overlay = overlay();
        let mut host = RecordingHost::default();

        overlay.on_pointer_move(&mut host, 960.0, 100.0);
        overlay.on_pointer_down();
        overlay.on_pointer_up();
        overlay.on_pointer_move(&mut host, 1800.0, 900.0);

        assert_eq!(overlay.input_mode(), InputMode::PassThrough);
        assert_eq!(host.calls.len(), 2);
    }
}
