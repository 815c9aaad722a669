//! Baseview backend
//!
//! Baseview owns the OS window and drives it through a [`WindowHandler`]
//! callback on its own thread (or the host's, for embedded views). The window
//! layer instead pumps events from one thread, so the two sides talk through
//! channels: the handler translates native events and sends them to the view,
//! the view sends commands and composed frames to the handler, which applies
//! them on the next `on_frame`.
//!
//! The graphics context is created inside baseview's build closure, and the
//! outcome travels back over a handshake channel, so `realize` fails when the
//! window has nothing to draw to. Baseview cannot unmap a window, so hiding a
//! standalone view closes the native window and showing it again opens a new
//! one. A native window that disappears on its own is reported as
//! [`Event::Destroyed`].

use std::time::Duration;

use ::baseview::{
    Event as NativeEvent, EventStatus, Size, Window as NativeWindow, WindowHandle,
    WindowHandler, WindowOpenOptions, WindowScalePolicy,
};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use dpi::PhysicalSize;
use raw_window_handle::{HasRawWindowHandle, RawWindowHandle};
use vello::peniko::Color;
use vello::Scene;

use super::{FileBrowserOptions, NativeHandle, NativeView, Platform, ViewConfig};
use crate::error::{Result, WindowError};
use crate::event::Event;
use crate::render::RenderContext;
use crate::translate::EventTranslator;

/// How long `realize` waits for the window thread to report back
const REALIZE_TIMEOUT: Duration = Duration::from_secs(5);

/// Native handle of the opened window, or why it has no graphics context
type Handshake = std::result::Result<Option<NativeHandle>, String>;

/// Requests from the pumping thread to the window thread
enum Command {
    Resize(PhysicalSize<u32>),
    Focus,
    Close,
    Present(Scene),
}

/// A host-provided parent view
struct ParentWindow(RawWindowHandle);

unsafe impl HasRawWindowHandle for ParentWindow {
    fn raw_window_handle(&self) -> RawWindowHandle {
        self.0
    }
}

/// Build a raw handle for a parent view on the current platform
#[cfg(target_os = "linux")]
fn parent_window_handle(parent: NativeHandle) -> Result<RawWindowHandle> {
    let mut handle = raw_window_handle::XlibWindowHandle::empty();
    handle.window = parent.as_raw() as std::os::raw::c_ulong;
    Ok(RawWindowHandle::Xlib(handle))
}

#[cfg(target_os = "windows")]
fn parent_window_handle(parent: NativeHandle) -> Result<RawWindowHandle> {
    let mut handle = raw_window_handle::Win32WindowHandle::empty();
    handle.hwnd = parent.as_raw() as *mut std::ffi::c_void;
    Ok(RawWindowHandle::Win32(handle))
}

#[cfg(target_os = "macos")]
fn parent_window_handle(parent: NativeHandle) -> Result<RawWindowHandle> {
    let mut handle = raw_window_handle::AppKitWindowHandle::empty();
    handle.ns_view = parent.as_raw() as *mut std::ffi::c_void;
    Ok(RawWindowHandle::AppKit(handle))
}

#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
fn parent_window_handle(parent: NativeHandle) -> Result<RawWindowHandle> {
    Err(WindowError::UnsupportedHandle(format!(
        "cannot embed into {:#x} on this platform",
        parent.as_raw()
    )))
}

fn native_handle_of(handle: RawWindowHandle) -> Option<NativeHandle> {
    match handle {
        RawWindowHandle::Xlib(h) => NativeHandle::new(h.window as usize),
        RawWindowHandle::Xcb(h) => NativeHandle::new(h.window as usize),
        RawWindowHandle::Win32(h) => NativeHandle::new(h.hwnd as usize),
        RawWindowHandle::AppKit(h) => NativeHandle::new(h.ns_view as usize),
        _ => None,
    }
}

/// Runs on the window thread: renders frames and forwards native events
struct ViewHandler {
    translator: EventTranslator,
    /// `None` when the graphics context could not be created; the window then
    /// closes on its first frame
    render_ctx: Option<RenderContext>,
    events: Sender<Event>,
    commands: Receiver<Command>,
    frame: Option<Scene>,
    dirty: bool,
    base_color: Color,
}

/// Everything the build closure needs to set up a [`ViewHandler`]
struct HandlerSetup {
    events: Sender<Event>,
    commands: Receiver<Command>,
    ready: Sender<Handshake>,
    size: PhysicalSize<u32>,
    scale_factor: f64,
    base_color: Color,
}

impl HandlerSetup {
    fn build(self, window: &mut NativeWindow) -> ViewHandler {
        let render_ctx =
            match unsafe { RenderContext::new(window, self.size.width, self.size.height) } {
                Ok(ctx) => {
                    tracing::info!("GPU context initialized");
                    let _ = self.ready.send(Ok(native_handle_of(window.raw_window_handle())));
                    Some(ctx)
                }
                Err(e) => {
                    tracing::error!("Failed to create GPU context: {}", e);
                    let _ = self.ready.send(Err(e.to_string()));
                    None
                }
            };

        ViewHandler {
            translator: EventTranslator::new(self.scale_factor),
            render_ctx,
            events: self.events,
            commands: self.commands,
            frame: None,
            dirty: false,
            base_color: self.base_color,
        }
    }
}

impl ViewHandler {
    fn apply_commands(&mut self, window: &mut NativeWindow) {
        loop {
            match self.commands.try_recv() {
                Ok(Command::Resize(size)) => {
                    let scale = self.translator.scale_factor();
                    window.resize(Size::new(
                        f64::from(size.width) / scale,
                        f64::from(size.height) / scale,
                    ));
                }
                Ok(Command::Focus) => window.focus(),
                Ok(Command::Close) => {
                    window.close();
                    return;
                }
                Ok(Command::Present(scene)) => {
                    self.frame = Some(scene);
                    self.dirty = true;
                }
                Err(TryRecvError::Empty) => return,
                // The view was dropped
                Err(TryRecvError::Disconnected) => {
                    window.close();
                    return;
                }
            }
        }
    }

    fn render_frame(&mut self) {
        if !self.dirty {
            return;
        }
        let (Some(render_ctx), Some(frame)) = (self.render_ctx.as_mut(), self.frame.as_ref())
        else {
            return;
        };
        if let Err(e) = render_ctx.render(frame, self.base_color) {
            tracing::error!("Render error: {}", e);
        }
        self.dirty = false;
    }
}

impl WindowHandler for ViewHandler {
    fn on_frame(&mut self, window: &mut NativeWindow) {
        if self.render_ctx.is_none() {
            window.close();
            return;
        }
        self.apply_commands(window);
        self.render_frame();
    }

    fn on_event(&mut self, _window: &mut NativeWindow, event: NativeEvent) -> EventStatus {
        if let NativeEvent::Window(::baseview::WindowEvent::Resized(info)) = &event {
            let size = info.physical_size();
            if let Some(ctx) = &mut self.render_ctx {
                ctx.resize(size.width, size.height);
            }
            self.dirty = self.frame.is_some();
        }

        let events = self.translator.translate(&event);
        if events.is_empty() {
            return EventStatus::Ignored;
        }
        for event in events {
            // The view is gone, its window is about to be closed
            if self.events.send(event).is_err() {
                break;
            }
        }
        EventStatus::Captured
    }
}

/// Channel ends held by the pumping side while the native window is open
struct Connection {
    events: Receiver<Event>,
    commands: Sender<Command>,
    handle: Option<NativeHandle>,
    /// Only embedded views get one; standalone windows live on their own thread
    window: Option<WindowHandle>,
}

impl Connection {
    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::trace!("window thread already gone");
        }
    }
}

/// One baseview window, standalone or embedded into a host view
pub struct BaseviewView {
    config: ViewConfig,
    base_color: Color,
    connection: Option<Connection>,
    mapped: bool,
    min_size: Option<PhysicalSize<u32>>,
}

impl BaseviewView {
    fn open_options(&self) -> WindowOpenOptions {
        let scale = self.config.scale_factor;
        WindowOpenOptions {
            title: self.config.title.clone(),
            size: Size::new(
                f64::from(self.config.size.width) / scale,
                f64::from(self.config.size.height) / scale,
            ),
            scale: if scale == 1.0 {
                WindowScalePolicy::SystemScaleFactor
            } else {
                WindowScalePolicy::ScaleFactor(scale)
            },
        }
    }

    /// Channel ends for a new window: the handler's side, then ours
    fn channels(&self) -> (HandlerSetup, Receiver<Event>, Sender<Command>, Receiver<Handshake>) {
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);
        let setup = HandlerSetup {
            events: event_tx,
            commands: command_rx,
            ready: ready_tx,
            size: self.config.size,
            scale_factor: self.config.scale_factor,
            base_color: self.base_color,
        };
        (setup, event_rx, command_tx, ready_rx)
    }

    fn open_embedded(&mut self, parent: NativeHandle) -> Result<Connection> {
        let parent = ParentWindow(parent_window_handle(parent)?);
        let (setup, events, commands, ready) = self.channels();

        let mut window =
            NativeWindow::open_parented(&parent, self.open_options(), move |window| {
                setup.build(window)
            });
        let handle = match await_handshake(&ready) {
            Ok(handle) => handle,
            Err(err) => {
                window.close();
                return Err(err);
            }
        };

        Ok(Connection {
            events,
            commands,
            handle,
            window: Some(window),
        })
    }

    fn open_standalone(&mut self) -> Result<Connection> {
        let (setup, events, commands, ready) = self.channels();
        let options = self.open_options();

        std::thread::Builder::new()
            .name(format!("window {}", self.config.title))
            .spawn(move || {
                NativeWindow::open_blocking(options, move |window| setup.build(window));
            })
            .map_err(|e| WindowError::Realize(e.to_string()))?;

        let handle = await_handshake(&ready)?;
        Ok(Connection {
            events,
            commands,
            handle,
            window: None,
        })
    }

    fn send(&self, command: Command) {
        if let Some(connection) = &self.connection {
            connection.send(command);
        }
    }
}

fn await_handshake(ready: &Receiver<Handshake>) -> Result<Option<NativeHandle>> {
    match ready.recv_timeout(REALIZE_TIMEOUT) {
        Ok(Ok(handle)) => Ok(handle),
        Ok(Err(reason)) => Err(WindowError::GraphicsContext(reason)),
        Err(e) => Err(WindowError::Realize(format!("window did not open: {e}"))),
    }
}

impl NativeView for BaseviewView {
    fn realize(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }
        let connection = match self.config.parent {
            Some(parent) => self.open_embedded(parent)?,
            None => self.open_standalone()?,
        };
        tracing::debug!(
            handle = ?connection.handle,
            embedded = self.config.parent.is_some(),
            "baseview window opened"
        );
        self.connection = Some(connection);
        Ok(())
    }

    fn is_realized(&self) -> bool {
        self.connection.is_some()
    }

    fn show(&mut self) {
        self.mapped = true;
    }

    fn hide(&mut self) {
        self.mapped = false;
        if self.config.parent.is_some() {
            tracing::debug!("embedded view visibility is owned by the host");
            return;
        }
        if let Some(connection) = self.connection.take() {
            connection.send(Command::Close);
        }
    }

    fn raise(&mut self) {
        self.send(Command::Focus);
    }

    fn grab_focus(&mut self) {
        self.send(Command::Focus);
    }

    fn set_size(&mut self, size: PhysicalSize<u32>) {
        let size = match self.min_size {
            Some(min) => PhysicalSize::new(size.width.max(min.width), size.height.max(min.height)),
            None => size,
        };
        self.config.size = size;
        self.send(Command::Resize(size));
    }

    fn set_position(&mut self, x: i32, y: i32) {
        tracing::debug!(x, y, "baseview cannot position windows");
    }

    fn set_geometry_constraints(&mut self, min_size: Option<PhysicalSize<u32>>, keep_aspect: bool) {
        tracing::debug!(?min_size, keep_aspect, "minimum size enforced on resize requests only");
        self.min_size = min_size;
    }

    fn set_resizable(&mut self, resizable: bool) {
        self.config.resizable = resizable;
    }

    fn title(&self) -> &str {
        &self.config.title
    }

    fn set_title(&mut self, title: &str) {
        if self.connection.is_some() {
            tracing::debug!("window title applies the next time the window opens");
        }
        self.config.title = title.to_owned();
    }

    fn transient_parent(&self) -> Option<NativeHandle> {
        self.config.transient_parent
    }

    fn set_transient_parent(&mut self, parent: Option<NativeHandle>) {
        self.config.transient_parent = parent;
    }

    fn native_handle(&self) -> Option<NativeHandle> {
        self.connection.as_ref().and_then(|c| c.handle)
    }

    fn desktop_scale_factor(&self) -> f64 {
        // The system scale arrives with the first resize
        1.0
    }

    fn enter_context(&mut self) -> bool {
        self.mapped && self.connection.is_some()
    }

    fn leave_context(&mut self, frame: Scene) {
        self.send(Command::Present(frame));
    }

    fn open_file_browser(&mut self, options: &FileBrowserOptions) -> bool {
        tracing::warn!(title = ?options.title, "baseview has no file dialog");
        false
    }

    fn poll_events(&mut self, events: &mut Vec<Event>) {
        let Some(connection) = &self.connection else {
            return;
        };
        loop {
            match connection.events.try_recv() {
                Ok(event) => {
                    if let Event::Configure { size, .. } = &event {
                        self.config.size = *size;
                    }
                    events.push(event);
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    tracing::debug!("native window destroyed");
                    self.connection = None;
                    self.mapped = false;
                    events.push(Event::Destroyed);
                    return;
                }
            }
        }
    }
}

impl Drop for BaseviewView {
    fn drop(&mut self) {
        if let Some(mut window) = self.connection.take().and_then(|c| c.window) {
            window.close();
        }
    }
}

/// Creates baseview windows
pub struct BaseviewPlatform {
    base_color: Color,
}

impl Default for BaseviewPlatform {
    fn default() -> Self {
        Self {
            base_color: Color::from_rgba8(30, 30, 35, 255),
        }
    }
}

impl BaseviewPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color frames are cleared to before widgets paint
    pub fn with_background(mut self, color: Color) -> Self {
        self.base_color = color;
        self
    }
}

impl Platform for BaseviewPlatform {
    fn create_view(&mut self, config: &ViewConfig) -> Result<Box<dyn NativeView>> {
        if config.scale_factor <= 0.0 {
            return Err(WindowError::ViewCreation(format!(
                "invalid scale factor {}",
                config.scale_factor
            )));
        }
        Ok(Box::new(BaseviewView {
            config: config.clone(),
            base_color: self.base_color,
            connection: None,
            mapped: false,
            min_size: None,
        }))
    }
}
