//! Native backend adapter
//!
//! A [`NativeView`] is a thin wrapper over one platform view. It carries no
//! policy: visibility bookkeeping, modal handling and dispatch all live in the
//! [`Window`](crate::Window) and [`Application`](crate::Application). A
//! [`Platform`] creates views for the application.

pub mod baseview;
pub mod headless;

use std::path::PathBuf;

use dpi::PhysicalSize;
use vello::Scene;

use crate::error::Result;
use crate::event::Event;

/// An opaque platform window handle (`HWND`, X11 window id, `NSView*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(usize);

impl NativeHandle {
    /// Wrap a raw handle. Zero means "no window" and yields `None`.
    pub fn new(raw: usize) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    pub fn as_raw(self) -> usize {
        self.0
    }
}

/// Everything a platform needs to create a view
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    pub title: String,
    pub size: PhysicalSize<u32>,
    pub scale_factor: f64,
    pub resizable: bool,
    /// Foreign parent view to embed into
    pub parent: Option<NativeHandle>,
    /// Window the view should stay on top of
    pub transient_parent: Option<NativeHandle>,
}

/// Options for a native file dialog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileBrowserOptions {
    /// Directory to start in, the current directory if unset
    pub start_dir: Option<PathBuf>,
    /// Dialog title, the window title if unset
    pub title: Option<String>,
    pub show_hidden: bool,
    pub list_all_files: bool,
}

/// One native view.
pub trait NativeView {
    /// Create the OS-level window or child view. Called once, before the first
    /// show for standalone windows and at construction for embedded ones.
    fn realize(&mut self) -> Result<()>;
    fn is_realized(&self) -> bool;

    fn show(&mut self);
    fn hide(&mut self);

    /// Bring the window to the foreground
    fn raise(&mut self);
    fn grab_focus(&mut self);

    fn set_size(&mut self, size: PhysicalSize<u32>);
    fn set_position(&mut self, x: i32, y: i32);
    /// Minimum size, `None` clears it
    fn set_geometry_constraints(&mut self, min_size: Option<PhysicalSize<u32>>, keep_aspect: bool);
    fn set_resizable(&mut self, resizable: bool);

    fn title(&self) -> &str;
    fn set_title(&mut self, title: &str);

    fn transient_parent(&self) -> Option<NativeHandle>;
    fn set_transient_parent(&mut self, parent: Option<NativeHandle>);

    /// Handle of the realized view
    fn native_handle(&self) -> Option<NativeHandle>;
    fn desktop_scale_factor(&self) -> f64;

    /// Make the graphics context current for a frame. Returns false when there
    /// is nothing to draw to yet.
    fn enter_context(&mut self) -> bool;
    /// Present the frame painted since `enter_context` and release the context
    fn leave_context(&mut self, frame: Scene);

    /// Start a file dialog. The outcome arrives later as
    /// [`Event::FileSelected`]. Returns false if the backend has no dialog.
    fn open_file_browser(&mut self, options: &FileBrowserOptions) -> bool;

    /// Move all pending native events into `events`
    fn poll_events(&mut self, events: &mut Vec<Event>);
}

/// Creates native views
pub trait Platform {
    fn create_view(&mut self, config: &ViewConfig) -> Result<Box<dyn NativeView>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_handle() {
        assert_eq!(NativeHandle::new(0), None);
        assert_eq!(NativeHandle::new(0x2a).map(NativeHandle::as_raw), Some(0x2a));
    }
}
