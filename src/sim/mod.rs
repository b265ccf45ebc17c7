//! Physics engine
//!
//! Pure simulation of the ball and its walls:
//! - Variable timestep driven by real elapsed time
//! - Boundary contact with restitution impulses
//! - Pointer drag spring
//! - Post-step safety clamp keeping the ball on screen
//! - No rendering or platform dependencies

pub mod collision;
pub mod drag;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, circle_rect_collision, resolve_contact};
pub use drag::DragConstraint;
pub use state::{Body, Boundary, BoundaryKind, Material, Screen, World, WorldParams};
pub use tick::{Impact, StepReport, safety_clamp, step};
