//! Desktop Ball - a physics-animated sphere living on the desktop
//!
//! Core modules:
//! - `sim`: Physics engine (gravity, restitution, boundary walls, drag, safety clamp)
//! - `renderer`: Layered sphere compositor and its wgpu pipeline
//! - `platform`: Host window boundary, hit-testing and the frame loop
//! - `settings`: Tunable constants loaded from a JSON file

pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::Settings;

/// Default simulation and rendering constants
pub mod consts {
    /// Reference frame length (ms) that per-frame factors are expressed in
    pub const BASE_DELTA_MS: f32 = 1000.0 / 60.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 40.0;
    pub const RESTITUTION: f32 = 0.8;
    /// Velocity damping per base frame
    pub const FRICTION_AIR: f32 = 0.01;
    /// Downward acceleration (px/ms²)
    pub const GRAVITY: f32 = 0.001;
    /// Approach speeds below this (px/ms) settle instead of bouncing
    pub const RESTING_SPEED: f32 = 0.05;

    /// Velocity factor applied when the safety clamp has to correct position
    pub const CLAMP_DAMPING: f32 = 0.8;

    /// Pointer drag spring stiffness (fraction of remaining distance per base frame)
    pub const DRAG_STIFFNESS: f32 = 0.2;

    /// Extra hit radius around the ball for easier grabbing (px)
    pub const CLICK_BUFFER: f32 = 20.0;

    /// Boundary wall thickness (px)
    pub const WALL_THICKNESS: f32 = 50.0;

    /// Initial ball height, horizontally centred (px)
    pub const SPAWN_HEIGHT: f32 = 100.0;

    /// Height reserved by the OS taskbar when the host cannot query the work area
    pub const TASKBAR_HEIGHT: u32 = 40;
}
