//! Physics and interaction settings
//!
//! Read once at startup from a JSON file. Every field is optional in the
//! file; missing ones fall back to the defaults in [`crate::consts`].

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Environment variable that overrides the settings file location
pub const SETTINGS_ENV: &str = "DESKTOP_BALL_SETTINGS";

/// Tunables for the ball, its walls and the pointer hit area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Body ===
    /// Ball radius in pixels
    pub ball_radius: f32,
    /// Fraction of normal velocity kept after hitting a wall (0.0 - 1.0)
    pub restitution: f32,
    /// Velocity damping per 60 Hz frame (0.0 - <1.0)
    pub friction_air: f32,
    /// Downward acceleration in px/ms²
    pub gravity: f32,

    // === Interaction ===
    /// Drag spring stiffness (0.0 - 1.0]
    pub drag_stiffness: f32,
    /// Extra pixels around the ball that still count as "over"
    pub click_buffer: f32,

    // === Containment ===
    /// Velocity factor used by the out-of-bounds correction (0.0 - 1.0)
    pub clamp_damping: f32,
    /// Thickness of the invisible walls
    pub wall_thickness: f32,

    // === Layout ===
    /// Initial distance of the ball centre from the top of the screen
    pub spawn_height: f32,
    /// Screen rows taken by the taskbar/dock below the work area
    pub taskbar_height: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ball_radius: BALL_RADIUS,
            restitution: RESTITUTION,
            friction_air: FRICTION_AIR,
            gravity: GRAVITY,

            drag_stiffness: DRAG_STIFFNESS,
            click_buffer: CLICK_BUFFER,

            clamp_damping: CLAMP_DAMPING,
            wall_thickness: WALL_THICKNESS,

            spawn_height: SPAWN_HEIGHT,
            taskbar_height: TASKBAR_HEIGHT,
        }
    }
}

impl Settings {
    /// Parse settings from JSON text (no sanitizing)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read and parse a settings file
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("parsing settings in {}", path.display()))
    }

    /// Where settings are looked up when no override is given
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(SETTINGS_ENV) {
            return Some(PathBuf::from(path));
        }

        let base = if cfg!(windows) {
            std::env::var_os("APPDATA").map(PathBuf::from)
        } else {
            std::env::var_os("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|| std::env::var_os("HOME").map(|home| Path::new(&home).join(".config")))
        };

        base.map(|dir| dir.join("desktop-ball").join("settings.json"))
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            log::info!("No config directory, using default settings");
            return Self::default();
        };

        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::from_path(&path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings.sanitized()
            }
            Err(e) => {
                log::warn!("{e:#}; using default settings");
                Self::default()
            }
        }
    }

    /// Pull every field back into its valid range
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !(self.ball_radius.is_finite() && self.ball_radius > 0.0) {
            log::warn!("ball_radius {} invalid, using {}", self.ball_radius, defaults.ball_radius);
            self.ball_radius = defaults.ball_radius;
        }
        if !(self.gravity.is_finite() && self.gravity > 0.0) {
            log::warn!("gravity {} invalid, using {}", self.gravity, defaults.gravity);
            self.gravity = defaults.gravity;
        }
        self.restitution = unit_range("restitution", self.restitution, defaults.restitution);
        self.clamp_damping = unit_range("clamp_damping", self.clamp_damping, defaults.clamp_damping);

        if !(self.friction_air.is_finite() && (0.0..1.0).contains(&self.friction_air)) {
            log::warn!("friction_air {} outside [0, 1), using {}", self.friction_air, defaults.friction_air);
            self.friction_air = defaults.friction_air;
        }
        if !(self.drag_stiffness.is_finite() && self.drag_stiffness > 0.0 && self.drag_stiffness <= 1.0) {
            log::warn!("drag_stiffness {} outside (0, 1], using {}", self.drag_stiffness, defaults.drag_stiffness);
            self.drag_stiffness = defaults.drag_stiffness;
        }
        if !(self.click_buffer.is_finite() && self.click_buffer >= 0.0) {
            log::warn!("click_buffer {} invalid, using {}", self.click_buffer, defaults.click_buffer);
            self.click_buffer = defaults.click_buffer;
        }
        if !(self.wall_thickness.is_finite() && self.wall_thickness > 0.0) {
            log::warn!("wall_thickness {} invalid, using {}", self.wall_thickness, defaults.wall_thickness);
            self.wall_thickness = defaults.wall_thickness;
        }
        if !self.spawn_height.is_finite() {
            self.spawn_height = defaults.spawn_height;
        }

        self
    }
}

fn unit_range(name: &str, value: f32, fallback: f32) -> f32 {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        value
    } else {
        log::warn!("{name} {value} outside [0, 1], using {fallback}");
        fallback
    }
}
