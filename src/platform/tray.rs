//! Tray menu, the only way to quit a window that never takes input
//!
//! Windows and macOS get a tray icon with a Quit item. Elsewhere the
//! process quits on SIGINT/SIGTERM, handled in [`super::native`].

use glam::Vec2;
use winit::event_loop::EventLoopProxy;

use crate::renderer::LayerKind;
use crate::renderer::compositor::sphere_layers;

/// Menu id of the Quit entry
pub const QUIT_ID: &str = "quit";

/// Requests delivered to the event loop from outside the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Quit,
}

pub fn command_for_menu(id: &str) -> Option<HostCommand> {
    match id {
        QUIT_ID => Some(HostCommand::Quit),
        _ => None,
    }
}

/// Straight-alpha RGBA pixels of the ball, without its drop shadow
pub fn icon_rgba(size: u32) -> Vec<u8> {
    let half = size as f32 / 2.0;
    let frame = sphere_layers(Vec2::splat(half), half - 1.0);

    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let c = frame
                .layers
                .iter()
                .filter(|layer| layer.kind != LayerKind::Shadow)
                .fold([0.0f32; 4], |dst, layer| {
                    let src = layer.shade(p);
                    std::array::from_fn(|i| src[i] + dst[i] * (1.0 - src[3]))
                });
            let a = c[3];
            let unmul = |v: f32| if a > 0.0 { (v / a).clamp(0.0, 1.0) } else { 0.0 };
            pixels.extend([unmul(c[0]), unmul(c[1]), unmul(c[2]), a.clamp(0.0, 1.0)].map(|v| (v * 255.0).round() as u8));
        }
    }
    pixels
}

/// Keeps the tray icon alive for the life of the app
pub struct Tray {
    #[cfg(any(target_os = "windows", target_os = "macos"))]
    _icon: tray_icon::TrayIcon,
}

impl Tray {
    /// Install the tray icon; `None` where the platform has no tray support
    pub fn create(proxy: EventLoopProxy<HostCommand>) -> anyhow::Result<Option<Self>> {
        build(proxy)
    }
}

#[cfg(any(target_os = "windows", target_os = "macos"))]
fn build(proxy: EventLoopProxy<HostCommand>) -> anyhow::Result<Option<Tray>> {
    use std::sync::Mutex;

    use anyhow::Context;
    use tray_icon::menu::{Menu, MenuEvent, MenuItem};
    use tray_icon::{Icon, TrayIconBuilder};

    const ICON_SIZE: u32 = 32;

    let quit = MenuItem::with_id(QUIT_ID, "Quit", true, None);
    let menu = Menu::new();
    menu.append(&quit).context("building tray menu")?;

    let icon = Icon::from_rgba(icon_rgba(ICON_SIZE), ICON_SIZE, ICON_SIZE).context("building tray icon")?;

    let proxy = Mutex::new(proxy);
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        let Some(command) = command_for_menu(event.id.as_ref()) else {
            return;
        };
        if let Ok(proxy) = proxy.lock()
            && proxy.send_event(command).is_err()
        {
            log::warn!("Event loop gone, dropping {command:?}");
        }
    }));

    let icon = TrayIconBuilder::new()
        .with_menu(Box::new(menu))
        .with_tooltip("Desktop Ball")
        .with_icon(icon)
        .build()
        .context("creating tray icon")?;

    log::info!("Tray icon installed");
    Ok(Some(Tray { _icon: icon }))
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn build(_proxy: EventLoopProxy<HostCommand>) -> anyhow::Result<Option<Tray>> {
    log::info!("No tray on this platform; stop with Ctrl-C or SIGTERM");
    Ok(None)
}
