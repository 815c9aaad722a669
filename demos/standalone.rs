//! Standalone example: a painted widget with a masonry UI on top
//!
//! Run with: cargo run --example standalone

use baseview_shell::backend::baseview::BaseviewPlatform;
use baseview_shell::{
    AppConfig, Application, GraphicsContext, MasonryWidget, MouseEvent, Widget, WindowConfig,
};
use dpi::PhysicalSize;
use masonry::core::NewWidget;
use masonry::properties::types::Length;
use masonry::widgets::{Flex, Label};
use vello::kurbo::{Affine, Rect};
use vello::peniko::{Color, Fill};

/// Fills the window and flashes on click
struct Backdrop {
    pressed: bool,
    dirty: bool,
}

impl Widget for Backdrop {
    fn on_display(&mut self, context: &mut GraphicsContext<'_>) {
        let size = context.size();
        let color = if self.pressed {
            Color::from_rgba8(60, 60, 80, 255)
        } else {
            Color::from_rgba8(40, 40, 48, 255)
        };
        let rect = Rect::new(0.0, 0.0, f64::from(size.width), f64::from(size.height));
        context
            .scene()
            .fill(Fill::NonZero, Affine::IDENTITY, color, None, &rect);
    }

    fn on_mouse(&mut self, event: &MouseEvent) -> bool {
        self.dirty |= self.pressed != event.press;
        self.pressed = event.press;
        true
    }

    fn take_repaint(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

fn main() -> baseview_shell::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    let mut app = Application::new(BaseviewPlatform::new(), AppConfig::default());
    let window = app.create_window(
        WindowConfig::new()
            .with_title("Baseview Shell Example")
            .with_size(400, 300)
            .with_resizable(true),
    )?;

    if let Some(w) = app.window_mut(window) {
        w.set_geometry_constraints(400, 300, true, true);
        w.add_widget(Box::new(Backdrop {
            pressed: false,
            dirty: false,
        }));

        let ui = Flex::column()
            .with_child(NewWidget::new(Label::new("Hello from baseview_shell!")))
            .with_spacer(Length::px(20.0))
            .with_child(NewWidget::new(Label::new("Painted with Vello/wgpu")));
        let scale_factor = w.scale_factor();
        w.add_widget(Box::new(MasonryWidget::new(
            ui,
            PhysicalSize::new(400, 300),
            scale_factor,
        )));
    }

    app.show(window);
    // Blocks until the window is closed
    app.run();

    println!("Window closed.");
    Ok(())
}
