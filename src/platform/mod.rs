//! Platform abstraction layer
//!
//! Handles the overlay's relationship with the desktop:
//! - Host window contract ([`OverlayHost`])
//! - Pointer hit-testing and click-through toggling
//! - Frame-driven stepping and composition ([`Overlay`])
//! - The native winit window and its tray menu

pub mod frame_loop;
pub mod host;
pub mod native;
pub mod passthrough;
pub mod tray;

pub use frame_loop::{FrameClock, Overlay};
pub use host::{DisplayMetrics, OverlayHost, PassthroughOptions, WorkArea};
pub use passthrough::{HitTester, InputMode, PassthroughBridge, PassthroughRequest};
