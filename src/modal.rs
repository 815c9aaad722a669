//! Modal relationship between two windows
//!
//! Links are [`WindowId`] keys into the application's registry, so either side
//! can be destroyed without leaving a dangling owner. The application keeps the
//! two ends consistent; this type only carries the state and the destruction
//! invariant.

use crate::application::WindowId;

#[derive(Debug, Default)]
pub struct Modal {
    /// Window that opened this one, fixed at construction
    pub(crate) parent: Option<WindowId>,
    /// Window to hand focus to while it runs modally on top of us
    pub(crate) child: Option<WindowId>,
    /// Whether this window is currently running as a modal
    pub(crate) enabled: bool,
}

impl Modal {
    pub fn with_parent(parent: WindowId) -> Self {
        Self {
            parent: Some(parent),
            child: None,
            enabled: false,
        }
    }

    pub fn parent(&self) -> Option<WindowId> {
        self.parent
    }

    pub fn child(&self) -> Option<WindowId> {
        self.child
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Drop for Modal {
    fn drop(&mut self) {
        // A second panic while unwinding would abort the process
        if !std::thread::panicking() {
            assert!(
                !self.enabled,
                "window destroyed while its modal session is still active"
            );
        }
    }
}
