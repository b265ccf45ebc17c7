//! Variable timestep physics step
//!
//! The engine advances once per displayed frame by the real elapsed time.
//! There is no fixed-step accumulator and no sub-stepping: very large deltas
//! (after a stall or suspend) can tunnel through a wall, and are recovered
//! only by the post-step safety clamp.

use glam::Vec2;

use super::collision::{circle_rect_collision, resolve_contact};
use super::state::{Body, BoundaryKind, World};
use crate::consts::BASE_DELTA_MS;

/// A wall hit during a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub boundary: BoundaryKind,
    /// Speed into the wall before the impulse
    pub normal_speed_before: f32,
    /// Speed away from the wall after the impulse
    pub normal_speed_after: f32,
}

/// What happened during one call to [`step`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub impacts: Vec<Impact>,
    /// The safety clamp had to pull the body back in
    pub clamped: bool,
    /// The input was malformed and the world was left untouched
    pub skipped: bool,
}

/// Advance the world by `dt_ms` milliseconds of wall-clock time
///
/// Never fails. Negative or non-finite deltas are ignored, and a step that
/// would produce a non-finite state is rolled back.
pub fn step(world: &mut World, dt_ms: f32) -> StepReport {
    if !dt_ms.is_finite() || dt_ms < 0.0 {
        log::trace!("Ignoring step with dt = {dt_ms}");
        return StepReport {
            skipped: true,
            ..Default::default()
        };
    }

    let snapshot = world.body.clone();
    let mut report = StepReport::default();

    if !world.drag.apply(&mut world.body, dt_ms) {
        integrate(&mut world.body, world.params.gravity, dt_ms);
    }
    if !world.body.is_finite() {
        return roll_back(world, snapshot, dt_ms);
    }

    for boundary in &world.boundaries {
        let contact = circle_rect_collision(world.body.pos, world.body.radius(), boundary);
        if let Some((before, after)) = resolve_contact(&mut world.body, &contact) {
            report.impacts.push(Impact {
                boundary: boundary.kind,
                normal_speed_before: before,
                normal_speed_after: after,
            });
        }
    }

    report.clamped = safety_clamp(world);

    if !world.body.is_finite() {
        return roll_back(world, snapshot, dt_ms);
    }

    report
}

fn roll_back(world: &mut World, snapshot: Body, dt_ms: f32) -> StepReport {
    log::trace!("Rolling back non-finite step (dt = {dt_ms})");
    world.body = snapshot;
    StepReport {
        skipped: true,
        ..Default::default()
    }
}

/// Free flight: air friction, gravity, then position
fn integrate(body: &mut Body, gravity: f32, dt_ms: f32) {
    let damping = (1.0 - body.material.friction_air * dt_ms / BASE_DELTA_MS).clamp(0.0, 1.0);
    body.vel = body.vel * damping + Vec2::new(0.0, gravity * dt_ms);
    body.pos += body.vel * dt_ms;
}

/// Force the body centre back into the playable region
///
/// Each out-of-range axis is clamped and its velocity reflected by the
/// world's clamp damping. Returns whether a correction was made.
pub fn safety_clamp(world: &mut World) -> bool {
    let (min, max) = world.screen.playable(world.body.radius());
    let damping = world.params.clamp_damping;
    let body = &mut world.body;
    let mut clamped = false;

    if body.pos.x < min.x || body.pos.x > max.x {
        body.pos.x = body.pos.x.clamp(min.x, max.x);
        body.vel.x = -body.vel.x * damping;
        clamped = true;
    }
    if body.pos.y < min.y || body.pos.y > max.y {
        body.pos.y = body.pos.y.clamp(min.y, max.y);
        body.vel.y = -body.vel.y * damping;
        clamped = true;
    }

    clamped
}
