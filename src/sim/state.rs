//! Simulation state: the ball, its walls and the world that owns them

use glam::Vec2;

use super::drag::DragConstraint;
use crate::settings::Settings;

/// Usable screen geometry in physical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    /// Full display width
    pub width: f32,
    /// Full display height (including taskbar)
    pub height: f32,
    /// Bottom of the work area; the ground sits here
    pub avail_height: f32,
}

impl Screen {
    pub fn new(width: f32, height: f32, avail_height: f32) -> Self {
        Self {
            width,
            height,
            avail_height: avail_height.min(height),
        }
    }

    /// Valid range for a circle centre of the given radius: (min, max)
    pub fn playable(&self, radius: f32) -> (Vec2, Vec2) {
        let min = Vec2::splat(radius);
        let max = Vec2::new(self.width - radius, self.avail_height - radius).max(min);
        (min, max)
    }
}

/// Physical properties of the ball, fixed after creation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub restitution: f32,
    pub friction_air: f32,
}

/// The only dynamic entity
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    radius: f32,
    pub material: Material,
}

impl Body {
    pub fn new(pos: Vec2, radius: f32, material: Material) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
            material,
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite()
    }
}

/// Which edge of the work area a wall guards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    Ground,
    LeftWall,
    RightWall,
    Ceiling,
}

/// A static, infinitely heavy axis-aligned wall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    pub kind: BoundaryKind,
    pub center: Vec2,
    pub size: Vec2,
}

impl Boundary {
    pub fn new(kind: BoundaryKind, center: Vec2, size: Vec2) -> Self {
        Self { kind, center, size }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.size * 0.5
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.size * 0.5
    }

    /// The four walls enclosing the work area
    pub fn enclosing(screen: &Screen, thickness: f32) -> [Boundary; 4] {
        let Screen {
            width,
            height,
            avail_height,
        } = *screen;
        let half = thickness / 2.0;

        [
            Boundary::new(
                BoundaryKind::Ground,
                Vec2::new(width / 2.0, avail_height + half),
                Vec2::new(width, thickness),
            ),
            Boundary::new(
                BoundaryKind::LeftWall,
                Vec2::new(-half, height / 2.0),
                Vec2::new(thickness, height),
            ),
            Boundary::new(
                BoundaryKind::RightWall,
                Vec2::new(width + half, height / 2.0),
                Vec2::new(thickness, height),
            ),
            Boundary::new(
                BoundaryKind::Ceiling,
                Vec2::new(width / 2.0, -half),
                Vec2::new(width, thickness),
            ),
        ]
    }
}

/// Engine tunables that are not properties of the body itself
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldParams {
    /// Downward acceleration (px/ms²)
    pub gravity: f32,
    /// Velocity factor applied by the out-of-bounds correction
    pub clamp_damping: f32,
}

/// Body, walls and gravity. Created once at startup.
#[derive(Debug, Clone)]
pub struct World {
    pub screen: Screen,
    pub body: Body,
    pub boundaries: [Boundary; 4],
    pub params: WorldParams,
    pub drag: DragConstraint,
}

impl World {
    /// Build a world with the ball at rest, centred horizontally at the spawn height
    pub fn new(screen: Screen, settings: &Settings) -> Self {
        let material = Material {
            restitution: settings.restitution,
            friction_air: settings.friction_air,
        };
        let spawn = Vec2::new(screen.width / 2.0, settings.spawn_height);
        let body = Body::new(spawn, settings.ball_radius, material);

        Self {
            screen,
            body,
            boundaries: Boundary::enclosing(&screen, settings.wall_thickness),
            params: WorldParams {
                gravity: settings.gravity,
                clamp_damping: settings.clamp_damping,
            },
            drag: DragConstraint::new(settings.drag_stiffness),
        }
    }

    pub fn boundary(&self, kind: BoundaryKind) -> &Boundary {
        self.boundaries
            .iter()
            .find(|b| b.kind == kind)
            .unwrap_or(&self.boundaries[0])
    }

    /// Whether the body centre lies within the clamp region
    pub fn body_in_bounds(&self) -> bool {
        let (min, max) = self.screen.playable(self.body.radius());
        let p = self.body.pos;
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Screen {
        Screen::new(1920.0, 1080.0, 1040.0)
    }

    #[test]
    fn test_ground_sits_on_work_area() {
        let walls = Boundary::enclosing(&screen(), 50.0);
        let ground = walls.iter().find(|b| b.kind == BoundaryKind::Ground).unwrap();
        assert_eq!(ground.center, Vec2::new(960.0, 1065.0));
        assert_eq!(ground.min().y, 1040.0);
        assert_eq!(ground.size, Vec2::new(1920.0, 50.0));
    }

    #[test]
    fn test_walls_span_full_height() {
        let walls = Boundary::enclosing(&screen(), 50.0);
        let left = walls.iter().find(|b| b.kind == BoundaryKind::LeftWall).unwrap();
        let right = walls.iter().find(|b| b.kind == BoundaryKind::RightWall).unwrap();
        let ceiling = walls.iter().find(|b| b.kind == BoundaryKind::Ceiling).unwrap();

        assert_eq!(left.max().x, 0.0);
        assert_eq!(right.min().x, 1920.0);
        assert_eq!(left.size.y, 1080.0);
        assert_eq!(ceiling.max().y, 0.0);
    }

    #[test]
    fn test_world_spawn() {
        let world = World::new(screen(), &Settings::default());
        assert_eq!(world.body.pos, Vec2::new(960.0, 100.0));
        assert_eq!(world.body.vel, Vec2::ZERO);
        assert_eq!(world.body.radius(), 40.0);
        assert!(world.body_in_bounds());
    }

    #[test]
    fn test_playable_region() {
        let (min, max) = screen().playable(40.0);
        assert_eq!(min, Vec2::new(40.0, 40.0));
        assert_eq!(max, Vec2::new(1880.0, 1000.0));
    }

    #[test]
    fn test_avail_height_never_exceeds_height() {
        let s = Screen::new(800.0, 600.0, 700.0);
        assert_eq!(s.avail_height, 600.0);
    }
}
