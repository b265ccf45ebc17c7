//! Native host: a borderless, transparent window pinned below all others
//!
//! winit drives the loop. Physics advances on every loop iteration in
//! `about_to_wait`, independent of painting, so the ball keeps moving while
//! the window is covered and the GPU paint is skipped.
//!
//! A click-through window receives no cursor events, so the pointer is read
//! from the OS cursor position each iteration instead.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowId, WindowLevel};

use super::frame_loop::Overlay;
use super::host::{DisplayMetrics, OverlayHost, PassthroughOptions, WorkArea};
use super::tray::{HostCommand, Tray};
use crate::renderer::SdfRenderState;
use crate::settings::Settings;

/// Loop period while nothing is being painted
const IDLE_FRAME: Duration = Duration::from_millis(16);

/// Where the OS cursor is, in global physical pixels
pub trait CursorSource {
    fn global_position(&self) -> Option<Vec2>;
}

/// Reads the system cursor through `device_query`
pub struct DesktopCursor {
    state: device_query::DeviceState,
    /// Converts reported coordinates to physical pixels
    scale: f32,
}

impl DesktopCursor {
    pub fn new(scale_factor: f64) -> Option<Self> {
        #[cfg(target_os = "linux")]
        let state = device_query::DeviceState::checked_new()?;
        #[cfg(not(target_os = "linux"))]
        let state = device_query::DeviceState::new();

        // macOS reports points, everything else reports pixels
        let scale = if cfg!(target_os = "macos") { scale_factor as f32 } else { 1.0 };
        Some(Self { state, scale })
    }
}

impl CursorSource for DesktopCursor {
    fn global_position(&self) -> Option<Vec2> {
        use device_query::DeviceQuery;

        let (x, y) = self.state.get_mouse().coords;
        Some(Vec2::new(x as f32, y as f32) * self.scale)
    }
}

/// Last pointer position in display pixels; reports only changes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerTracker {
    last: Option<Vec2>,
    /// Global position of the display's top-left corner
    origin: Vec2,
}

impl PointerTracker {
    pub fn new(origin: Vec2) -> Self {
        Self { last: None, origin }
    }

    pub fn position(&self) -> Option<Vec2> {
        self.last
    }

    /// Position relative to the window, as winit reports it
    pub fn observe_local(&mut self, p: Vec2) -> Option<Vec2> {
        if self.last == Some(p) {
            return None;
        }
        self.last = Some(p);
        Some(p)
    }

    /// Position in global desktop coordinates
    pub fn observe_global(&mut self, p: Vec2) -> Option<Vec2> {
        self.observe_local(p - self.origin)
    }
}

/// Feed the OS cursor position to the overlay if it moved
pub fn sync_pointer<S, H>(source: &S, tracker: &mut PointerTracker, overlay: &mut Overlay, host: &mut H)
where
    S: CursorSource + ?Sized,
    H: OverlayHost + ?Sized,
{
    if let Some(p) = source.global_position().and_then(|g| tracker.observe_global(g)) {
        overlay.on_pointer_move(host, p.x, p.y);
    }
}

/// Decides whether to paint and how long the loop may sleep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramePacer {
    occluded: bool,
}

impl FramePacer {
    pub fn set_occluded(&mut self, occluded: bool) {
        self.occluded = occluded;
    }

    /// Painting a covered window may block on present; physics must not
    pub fn should_paint(&self) -> bool {
        !self.occluded
    }

    /// Visible frames are paced by vsync in present; covered ones by a timer
    pub fn control_flow(&self, now: Instant) -> ControlFlow {
        if self.occluded {
            ControlFlow::WaitUntil(now + IDLE_FRAME)
        } else {
            ControlFlow::Poll
        }
    }
}

/// Work area of the primary display, relative to its origin
#[cfg(target_os = "windows")]
fn query_work_area(origin: PhysicalPosition<i32>) -> Option<WorkArea> {
    use windows_sys::Win32::Foundation::RECT;
    use windows_sys::Win32::UI::WindowsAndMessaging::{SPI_GETWORKAREA, SystemParametersInfoW};

    let mut rect = RECT {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };
    // SAFETY: SPI_GETWORKAREA writes one RECT through the pointer
    let ok = unsafe { SystemParametersInfoW(SPI_GETWORKAREA, 0, (&mut rect as *mut RECT).cast(), 0) };
    if ok == 0 {
        log::warn!("SPI_GETWORKAREA failed");
        return None;
    }
    Some(WorkArea {
        top: rect.top - origin.y,
        bottom: rect.bottom - origin.y,
    })
}

#[cfg(not(target_os = "windows"))]
fn query_work_area(_origin: PhysicalPosition<i32>) -> Option<WorkArea> {
    None
}

/// The window, its GPU surface and the display it covers
pub struct HostSession {
    window: Arc<Window>,
    renderer: SdfRenderState,
    metrics: DisplayMetrics,
    origin: PhysicalPosition<i32>,
}

impl HostSession {
    /// Open the overlay window over the primary display
    pub fn create(event_loop: &ActiveEventLoop, settings: &Settings) -> anyhow::Result<Self> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .context("no display found")?;
        let size = monitor.size();
        let origin = monitor.position();
        let work_area = query_work_area(origin);
        if work_area.is_none() {
            log::info!("Work area unavailable, reserving {} px for the taskbar", settings.taskbar_height);
        }
        let metrics = DisplayMetrics::resolve(size.width, size.height, work_area, settings);
        log::info!(
            "Display {:?}: {}x{} (work area height {})",
            monitor.name(),
            metrics.width,
            metrics.height,
            metrics.avail_height
        );

        let attributes = Window::default_attributes()
            .with_title("Desktop Ball")
            .with_transparent(true)
            .with_decorations(false)
            .with_resizable(false)
            .with_active(false)
            .with_window_level(WindowLevel::AlwaysOnBottom)
            .with_position(origin)
            .with_inner_size(PhysicalSize::new(metrics.width, metrics.height));

        #[cfg(target_os = "windows")]
        let attributes = {
            use winit::platform::windows::WindowAttributesExtWindows;
            attributes.with_skip_taskbar(true)
        };

        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("creating overlay window")?,
        );

        let renderer = pollster::block_on(init_renderer(window.clone(), metrics))?;

        Ok(Self {
            window,
            renderer,
            metrics,
            origin,
        })
    }

    pub fn metrics(&self) -> DisplayMetrics {
        self.metrics
    }

    pub fn teardown(self) {
        log::info!("Closing overlay window");
        self.window.set_visible(false);
    }
}

impl OverlayHost for HostSession {
    fn set_input_passthrough(&mut self, ignore: bool, options: PassthroughOptions) {
        // Forwarding needs nothing from the window: the cursor is polled
        log::trace!("Passthrough ignore={ignore} forward={}", options.forward);
        if let Err(e) = self.window.set_cursor_hittest(!ignore) {
            log::warn!("Failed to toggle click-through: {e}");
        }
    }
}

async fn init_renderer(window: Arc<Window>, metrics: DisplayMetrics) -> anyhow::Result<SdfRenderState> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let surface = instance
        .create_surface(window)
        .context("creating window surface")?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        })
        .await
        .context("finding a GPU adapter")?;

    log::info!("Using adapter: {:?}", adapter.get_info().name);

    SdfRenderState::new(surface, &adapter, metrics.width, metrics.height).await
}

struct Running {
    session: HostSession,
    overlay: Overlay,
    pointer: PointerTracker,
    cursor: Option<DesktopCursor>,
    pacer: FramePacer,
    _tray: Option<Tray>,
}

/// winit application wrapping the overlay
pub struct NativeApp {
    settings: Settings,
    proxy: EventLoopProxy<HostCommand>,
    started: Instant,
    running: Option<Running>,
    error: Option<anyhow::Error>,
}

impl NativeApp {
    pub fn new(settings: Settings, proxy: EventLoopProxy<HostCommand>) -> Self {
        Self {
            settings,
            proxy,
            started: Instant::now(),
            running: None,
            error: None,
        }
    }

    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let mut session = HostSession::create(event_loop, &self.settings)?;
        let metrics = session.metrics();

        let overlay = Overlay::new(metrics.screen(), &self.settings);
        overlay.start(&mut session);

        let cursor = DesktopCursor::new(session.window.scale_factor());
        if cursor.is_none() {
            log::warn!("Cannot read the cursor position; the ball can only be grabbed while the window has input");
        }

        let tray = Tray::create(self.proxy.clone()).unwrap_or_else(|e| {
            log::warn!("{e:#}; quit with Ctrl-C or SIGTERM");
            None
        });

        let origin = Vec2::new(session.origin.x as f32, session.origin.y as f32);
        self.running = Some(Running {
            session,
            overlay,
            pointer: PointerTracker::new(origin),
            cursor,
            pacer: FramePacer::default(),
            _tray: tray,
        });
        Ok(())
    }

    /// Paint the current state; physics has already advanced
    fn paint(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        if !running.pacer.should_paint() {
            return;
        }

        let frame = running.overlay.compose();
        match running.session.renderer.render(&frame) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost, reconfiguring");
                running.session.renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::Timeout) => log::debug!("Frame timed out, skipping"),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
    }

    /// Error that stopped the loop, if any
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }
}

impl ApplicationHandler<HostCommand> for NativeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        if let Err(e) = self.start(event_loop) {
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, command: HostCommand) {
        match command {
            HostCommand::Quit => {
                log::info!("Quit requested");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if let WindowEvent::RedrawRequested = event {
            self.paint(event_loop);
            return;
        }
        let Some(Running {
            session,
            overlay,
            pointer,
            pacer,
            ..
        }) = self.running.as_mut()
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                session.renderer.resize(width, height);
            }
            WindowEvent::CursorMoved {
                position: PhysicalPosition { x, y },
                ..
            } => {
                if let Some(p) = pointer.observe_local(Vec2::new(x as f32, y as f32)) {
                    overlay.on_pointer_move(session, p.x, p.y);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => overlay.on_pointer_down(),
                ElementState::Released => overlay.on_pointer_up(),
            },
            WindowEvent::Occluded(occluded) => {
                log::debug!("Overlay occluded: {occluded}");
                pacer.set_occluded(occluded);
            }
            WindowEvent::Focused(focused) => log::debug!("Overlay focused: {focused}"),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.now_ms();
        let Some(Running {
            session,
            overlay,
            pointer,
            cursor,
            pacer,
            ..
        }) = self.running.as_mut()
        else {
            return;
        };

        if let Some(cursor) = cursor.as_ref() {
            sync_pointer(cursor, pointer, overlay, session);
        }
        overlay.advance(now);

        if pacer.should_paint() {
            session.window.request_redraw();
        }
        event_loop.set_control_flow(pacer.control_flow(Instant::now()));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = self.running.take() {
            running.session.teardown();
        }
    }
}

/// Open the overlay and run until quit from the tray or by signal
pub fn run(settings: Settings) -> anyhow::Result<()> {
    let event_loop = EventLoop::<HostCommand>::with_user_event()
        .build()
        .context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let proxy = event_loop.create_proxy();
    let signal_proxy = proxy.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = signal_proxy.send_event(HostCommand::Quit);
    }) {
        log::warn!("Failed to install signal handler: {e}");
    }

    let mut app = NativeApp::new(settings, proxy);
    event_loop.run_app(&mut app).context("running event loop")?;

    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
