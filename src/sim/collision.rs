//! Collision detection and response between the ball and the walls
//!
//! Walls are axis-aligned rectangles. Contact is found from the closest point
//! on the rectangle to the ball centre; response is a restitution impulse
//! along the contact normal.

use glam::Vec2;

use super::state::{Body, Boundary};
use crate::consts::RESTING_SPEED;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point on the wall surface
    pub point: Vec2,
    /// Surface normal at contact (pointing toward the ball centre)
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between a circle and an axis-aligned rectangle
///
/// A centre inside the rectangle is resolved through the face it is closest
/// to. A circle that has already passed all the way through is a miss.
pub fn circle_rect_collision(center: Vec2, radius: f32, rect: &Boundary) -> CollisionResult {
    let min = rect.min();
    let max = rect.max();
    let closest = center.clamp(min, max);
    let offset = center - closest;
    let dist_sq = offset.length_squared();

    if dist_sq > 0.0 {
        if dist_sq >= radius * radius {
            return CollisionResult::miss();
        }
        let dist = dist_sq.sqrt();
        return CollisionResult {
            hit: true,
            point: closest,
            normal: offset / dist,
            penetration: radius - dist,
        };
    }

    // Centre inside the rectangle: push out through the nearest face
    let faces = [
        (center.x - min.x, Vec2::NEG_X, Vec2::new(min.x, center.y)),
        (max.x - center.x, Vec2::X, Vec2::new(max.x, center.y)),
        (center.y - min.y, Vec2::NEG_Y, Vec2::new(center.x, min.y)),
        (max.y - center.y, Vec2::Y, Vec2::new(center.x, max.y)),
    ];
    let (depth, normal, point) = faces
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .unwrap_or(faces[0]);

    CollisionResult {
        hit: true,
        point,
        normal,
        penetration: depth + radius,
    }
}

/// Split velocity into (normal, tangential) parts relative to `normal`
#[inline]
pub fn decompose(velocity: Vec2, normal: Vec2) -> (f32, Vec2) {
    let vn = velocity.dot(normal);
    (vn, velocity - normal * vn)
}

/// Separate the body from the wall and apply the bounce impulse
///
/// Returns the normal speed before and after the impulse when the body was
/// moving into the wall, `None` if there was nothing to respond to.
pub fn resolve_contact(body: &mut Body, contact: &CollisionResult) -> Option<(f32, f32)> {
    if !contact.hit {
        return None;
    }

    // Rest exactly on the surface so the safety clamp sees no rounding error
    body.pos = contact.point + contact.normal * body.radius();

    let (vn, tangential) = decompose(body.vel, contact.normal);
    if vn >= 0.0 {
        // Already separating
        return None;
    }

    let bounced = if -vn < RESTING_SPEED {
        0.0
    } else {
        -vn * body.material.restitution
    };
    let tangential = tangential * (1.0 - body.material.friction_air);

    body.vel = contact.normal * bounced + tangential;
    Some((-vn, bounced))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{BoundaryKind, Material};

    fn ground() -> Boundary {
        // Top face at y = 1040
        Boundary::new(BoundaryKind::Ground, Vec2::new(960.0, 1065.0), Vec2::new(1920.0, 50.0))
    }

    fn body_at(pos: Vec2, vel: Vec2) -> Body {
        let mut body = Body::new(
            pos,
            40.0,
            Material {
                restitution: 0.8,
                friction_air: 0.01,
            },
        );
        body.vel = vel;
        body
    }

    #[test]
    fn test_circle_above_ground_misses() {
        let result = circle_rect_collision(Vec2::new(500.0, 990.0), 40.0, &ground());
        assert!(!result.hit);
    }

    #[test]
    fn test_circle_touching_ground() {
        let result = circle_rect_collision(Vec2::new(500.0, 1010.0), 40.0, &ground());
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::NEG_Y);
        assert!((result.penetration - 10.0).abs() < 1e-4);
        assert_eq!(result.point, Vec2::new(500.0, 1040.0));
    }

    #[test]
    fn test_centre_inside_wall_uses_nearest_face() {
        let result = circle_rect_collision(Vec2::new(500.0, 1045.0), 40.0, &ground());
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::NEG_Y);
        assert!((result.penetration - 45.0).abs() < 1e-4);
    }

    #[test]
    fn test_tunnelled_circle_misses() {
        let result = circle_rect_collision(Vec2::new(500.0, 2000.0), 40.0, &ground());
        assert!(!result.hit);
    }

    #[test]
    fn test_corner_contact_normal_is_diagonal() {
        let wall = Boundary::new(BoundaryKind::LeftWall, Vec2::new(-25.0, 540.0), Vec2::new(50.0, 1080.0));
        let result = circle_rect_collision(Vec2::new(20.0, 1100.0), 40.0, &wall);
        assert!(result.hit);
        assert!(result.normal.x > 0.0 && result.normal.y > 0.0);
    }

    #[test]
    fn test_resolve_bounces_with_restitution() {
        let mut body = body_at(Vec2::new(500.0, 1010.0), Vec2::new(0.3, 1.0));
        let contact = circle_rect_collision(body.pos, body.radius(), &ground());

        let (before, after) = resolve_contact(&mut body, &contact).unwrap();
        assert!((before - 1.0).abs() < 1e-6);
        assert!((after - 0.8).abs() < 1e-6);
        assert!((body.pos.y - 1000.0).abs() < 1e-4);
        assert!((body.vel.y + 0.8).abs() < 1e-6);
        assert!((body.vel.x - 0.3 * 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_slow_approach_settles() {
        let mut body = body_at(Vec2::new(500.0, 1000.5), Vec2::new(0.0, 0.016));
        let contact = circle_rect_collision(body.pos, body.radius(), &ground());

        let (_, after) = resolve_contact(&mut body, &contact).unwrap();
        assert_eq!(after, 0.0);
        assert_eq!(body.vel, Vec2::ZERO);
    }

    #[test]
    fn test_separating_body_keeps_velocity() {
        let mut body = body_at(Vec2::new(500.0, 1010.0), Vec2::new(0.0, -0.5));
        let contact = circle_rect_collision(body.pos, body.radius(), &ground());

        assert!(resolve_contact(&mut body, &contact).is_none());
        assert_eq!(body.vel, Vec2::new(0.0, -0.5));
        assert!((body.pos.y - 1000.0).abs() < 1e-4);
    }

    #[test]
    fn test_decompose() {
        let (vn, vt) = decompose(Vec2::new(3.0, 4.0), Vec2::NEG_Y);
        assert_eq!(vn, -4.0);
        assert_eq!(vt, Vec2::new(3.0, 0.0));
    }
}
