//! Per-frame graphics context handed to widgets

use dpi::PhysicalSize;
use vello::Scene;

/// Drawing target for one widget during one frame.
///
/// The context borrows the frame being prepared, so it cannot outlive the
/// paint call it was handed to.
pub struct GraphicsContext<'frame> {
    scene: &'frame mut Scene,
    size: PhysicalSize<u32>,
    scale_factor: f64,
}

impl<'frame> GraphicsContext<'frame> {
    pub(crate) fn new(scene: &'frame mut Scene, size: PhysicalSize<u32>, scale_factor: f64) -> Self {
        Self {
            scene,
            size,
            scale_factor,
        }
    }

    /// Scene to paint into, in widget coordinates
    pub fn scene(&mut self) -> &mut Scene {
        self.scene
    }

    /// Widget-space size of the area being painted
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Informational window scale factor
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }
}
