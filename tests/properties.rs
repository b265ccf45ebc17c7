//! Property tests for the physics step and the pass-through bridge

use desktop_ball::Settings;
use desktop_ball::platform::{HitTester, InputMode, Overlay, OverlayHost, PassthroughOptions};
use desktop_ball::sim::{Screen, World, step};
use glam::Vec2;
use proptest::prelude::*;

#[derive(Default)]
struct CountingHost {
    calls: Vec<bool>,
}

impl OverlayHost for CountingHost {
    fn set_input_passthrough(&mut self, ignore: bool, options: PassthroughOptions) {
        assert!(options.forward);
        self.calls.push(ignore);
    }
}

fn screen() -> Screen {
    Screen::new(1920.0, 1080.0, 1040.0)
}

fn world_at(pos: Vec2, vel: Vec2) -> World {
    let mut world = World::new(screen(), &Settings::default());
    world.body.pos = pos;
    world.body.vel = vel;
    world
}

proptest! {
    #[test]
    fn ball_stays_on_screen(
        x in 40.0f32..1880.0,
        y in 40.0f32..1000.0,
        vx in -5.0f32..5.0,
        vy in -5.0f32..5.0,
        deltas in prop::collection::vec(0.0f32..5000.0, 1..40),
    ) {
        let mut world = world_at(Vec2::new(x, y), Vec2::new(vx, vy));
        for dt in deltas {
            step(&mut world, dt);
            prop_assert!(world.body.is_finite());
            prop_assert!(world.body_in_bounds(), "escaped to {:?}", world.body.pos);
        }
    }

    #[test]
    fn bounces_never_gain_speed(
        x in 40.0f32..1880.0,
        vx in -3.0f32..3.0,
        vy in 0.0f32..3.0,
        dt in 1.0f32..40.0,
    ) {
        let mut world = world_at(Vec2::new(x, 990.0), Vec2::new(vx, vy));
        let restitution = world.body.material.restitution;
        for _ in 0..50 {
            let report = step(&mut world, dt);
            for impact in &report.impacts {
                prop_assert!(
                    impact.normal_speed_after <= impact.normal_speed_before * restitution + 1e-4
                );
            }
        }
    }

    #[test]
    fn host_is_called_once_per_flip(
        points in prop::collection::vec((0.0f32..1920.0, 0.0f32..1080.0), 1..60),
    ) {
        let settings = Settings::default();
        let mut overlay = Overlay::new(screen(), &settings);
        let mut host = CountingHost::default();
        let hit = HitTester::new(settings.click_buffer);

        let mut expected = Vec::new();
        let mut over = false;
        for &(x, y) in &points {
            let now_over = hit.is_over(&overlay.world().body, Vec2::new(x, y));
            if now_over != over {
                expected.push(!now_over);
                over = now_over;
            }
            overlay.on_pointer_move(&mut host, x, y);
        }

        prop_assert_eq!(&host.calls, &expected);
        prop_assert_eq!(overlay.input_mode(), InputMode::for_hit(over));
    }

    #[test]
    fn hit_radius_is_radius_plus_buffer(
        angle in 0.0f32..std::f32::consts::TAU,
        distance in 0.0f32..200.0,
    ) {
        let settings = Settings::default();
        let world = World::new(screen(), &settings);
        let reach = settings.ball_radius + settings.click_buffer;
        prop_assume!((distance - reach).abs() > 0.01);

        let pointer = world.body.pos + Vec2::from_angle(angle) * distance;
        let hit = HitTester::new(settings.click_buffer);
        prop_assert_eq!(hit.is_over(&world.body, pointer), distance < reach);
    }
}

#[test]
fn drag_throws_toward_the_pointer() {
    let settings = Settings::default();
    let mut overlay = Overlay::new(screen(), &settings);
    let mut host = CountingHost::default();
    overlay.start(&mut host);

    let center = overlay.world().body.pos;
    overlay.on_pointer_move(&mut host, center.x, center.y);
    overlay.on_pointer_down();
    assert!(overlay.is_dragging());

    overlay.on_pointer_move(&mut host, 100.0, 100.0);
    let mut t = 0.0;
    overlay.tick(t);
    for _ in 0..5 {
        t += 16.0;
        overlay.tick(t);
    }

    let before = overlay.world().body.pos;
    assert!(before.x < center.x);
    overlay.on_pointer_up();
    assert!(!overlay.is_dragging());

    let vel = overlay.world().body.vel;
    assert!(vel.x < 0.0);
    assert!(vel.y.abs() < 1e-3);

    // Released momentum carries the ball further left
    overlay.tick(t + 16.0);
    assert!(overlay.world().body.pos.x < before.x);
    assert_eq!(host.calls, vec![true, false]);
}
