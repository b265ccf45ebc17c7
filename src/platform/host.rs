//! What the overlay needs from the window it lives in

use crate::settings::Settings;
use crate::sim::Screen;

/// Options for [`OverlayHost::set_input_passthrough`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassthroughOptions {
    /// Keep reporting pointer positions while input passes through
    pub forward: bool,
}

impl Default for PassthroughOptions {
    fn default() -> Self {
        Self { forward: true }
    }
}

/// The host window as seen by the overlay core
pub trait OverlayHost {
    /// Toggle whether pointer input reaches the overlay (`ignore = false`)
    /// or the windows beneath it (`ignore = true`).
    ///
    /// Fire-and-forget: the core neither waits for nor retries the change.
    fn set_input_passthrough(&mut self, ignore: bool, options: PassthroughOptions);
}

/// Usable rectangle of a display as reported by the OS (physical pixels,
/// relative to the display origin)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkArea {
    pub top: i32,
    pub bottom: i32,
}

/// Primary display geometry in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMetrics {
    pub width: u32,
    pub height: u32,
    /// Height of the work area (display minus taskbar/dock)
    pub avail_height: u32,
}

impl DisplayMetrics {
    /// Derive the work area from a known taskbar height
    pub fn with_taskbar(width: u32, height: u32, taskbar_height: u32) -> Self {
        Self {
            width,
            height,
            avail_height: height.saturating_sub(taskbar_height),
        }
    }

    pub fn from_settings(width: u32, height: u32, settings: &Settings) -> Self {
        Self::with_taskbar(width, height, settings.taskbar_height)
    }

    /// Use a work area reported by the OS, relative to the display origin
    ///
    /// Only the bottom edge matters: the floor sits on top of whatever the
    /// OS reserves at the bottom of the display.
    pub fn from_work_area(width: u32, height: u32, work_area: WorkArea) -> Self {
        let bottom = work_area.bottom.clamp(0, height as i32) as u32;
        Self {
            width,
            height,
            avail_height: bottom,
        }
    }

    /// Prefer the OS work area, falling back to the configured taskbar height
    pub fn resolve(width: u32, height: u32, work_area: Option<WorkArea>, settings: &Settings) -> Self {
        match work_area {
            Some(area) if area.bottom > 0 => Self::from_work_area(width, height, area),
            _ => Self::from_settings(width, height, settings),
        }
    }

    /// Gap between the display bottom and the work area bottom
    pub fn taskbar_height(&self) -> u32 {
        self.height.saturating_sub(self.avail_height)
    }

    pub fn screen(&self) -> Screen {
        Screen::new(self.width as f32, self.height as f32, self.avail_height as f32)
    }
}
