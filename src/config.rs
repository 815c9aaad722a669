//! Window and application configuration

use std::time::Duration;

use dpi::PhysicalSize;

use crate::application::WindowId;
use crate::backend::NativeHandle;

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;

/// Construction parameters of a window.
///
/// ```ignore
/// // standalone
/// let main = app.create_window(WindowConfig::new().with_title("Synth"))?;
/// // modal dialog on top of it
/// let dialog = app.create_window(WindowConfig::new().with_modal_parent(main))?;
/// // embedded into a host-provided view
/// let editor = app.create_window(WindowConfig::embedded(parent).with_size(800, 600))?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    /// Initial physical size, a default size when unset
    pub size: Option<PhysicalSize<u32>>,
    /// Scale factor, the desktop scale factor when unset
    pub scale_factor: Option<f64>,
    pub resizable: bool,
    /// Foreign view to embed into
    pub parent: Option<NativeHandle>,
    /// Window this one runs modally on top of
    pub modal_parent: Option<WindowId>,
    pub transient_parent: Option<NativeHandle>,
    pub ignore_key_repeat: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: String::from("baseview_shell"),
            size: None,
            scale_factor: None,
            resizable: false,
            parent: None,
            modal_parent: None,
            transient_parent: None,
            ignore_key_repeat: false,
        }
    }
}

impl WindowConfig {
    /// A standalone window
    pub fn new() -> Self {
        Self::default()
    }

    /// A window embedded into a view owned by someone else
    pub fn embedded(parent: NativeHandle) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some(PhysicalSize::new(width, height));
        self
    }

    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = Some(scale_factor);
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn with_modal_parent(mut self, parent: WindowId) -> Self {
        self.modal_parent = Some(parent);
        self
    }

    pub fn with_transient_parent(mut self, parent: NativeHandle) -> Self {
        self.transient_parent = Some(parent);
        self
    }

    pub fn with_ignore_key_repeat(mut self, ignore: bool) -> Self {
        self.ignore_key_repeat = ignore;
        self
    }

    pub fn is_embedded(&self) -> bool {
        self.parent.is_some()
    }

    /// Size to create the view with, falling back to the default for unset or
    /// degenerate sizes
    pub(crate) fn initial_size(&self) -> PhysicalSize<u32> {
        match self.size {
            Some(size) if size.width > 1 && size.height > 1 => size,
            _ => PhysicalSize::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
        }
    }
}

/// Application wide settings
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// The application owns its event loop. Only standalone applications may
    /// block in `run` or in a blocking modal.
    pub standalone: bool,
    /// Sleep between two pumps of an owned loop
    pub pump_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            standalone: true,
            pump_interval: Duration::from_millis(16),
        }
    }
}

impl AppConfig {
    /// An application driven by a plugin host's idle calls
    pub fn hosted() -> Self {
        Self {
            standalone: false,
            ..Self::default()
        }
    }

    pub fn with_pump_interval(mut self, interval: Duration) -> Self {
        self.pump_interval = interval;
        self
    }
}
