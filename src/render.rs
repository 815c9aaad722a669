//! GPU presentation of composed frames
//!
//! Sets up a wgpu surface and a Vello renderer for one native view. Vello
//! renders with compute shaders that cannot target surface textures, so each
//! frame goes to an intermediate texture first and is then blitted onto the
//! surface.

use std::sync::Arc;

use thiserror::Error;
use vello::peniko::Color;
use vello::wgpu;
use vello::{AaConfig, RenderParams, Renderer, RendererOptions, Scene};
use wgpu::util::TextureBlitter;
use wgpu::{
    CompositeAlphaMode, Device, DeviceDescriptor, Features, Instance, InstanceDescriptor, Limits,
    PresentMode, Queue, Surface, SurfaceConfiguration, Texture, TextureDescriptor,
    TextureDimension, TextureFormat, TextureUsages, TextureView, TextureViewDescriptor,
};

const TARGET_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

/// Errors that can occur while setting up or presenting a frame
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no suitable GPU adapter found: {0}")]
    NoAdapter(String),
    #[error("device error: {0}")]
    Device(String),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("renderer error: {0}")]
    Renderer(String),
    #[error("unsupported window handle: {0}")]
    UnsupportedHandle(&'static str),
}

/// GPU rendering context of one view
pub struct RenderContext {
    device: Arc<Device>,
    queue: Arc<Queue>,
    renderer: Renderer,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    target_texture: Texture,
    target_view: TextureView,
    blitter: TextureBlitter,
}

impl RenderContext {
    /// Create a render context for a window
    ///
    /// # Safety
    ///
    /// The window handle must remain valid for the lifetime of this context.
    pub unsafe fn new<W>(window: &W, width: u32, height: u32) -> Result<Self, RenderError>
    where
        W: raw_window_handle::HasRawWindowHandle + raw_window_handle::HasRawDisplayHandle,
    {
        let instance = Instance::new(&InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let target = wgpu::SurfaceTargetUnsafe::RawHandle {
            raw_display_handle: convert_display_handle(window.raw_display_handle())?,
            raw_window_handle: convert_window_handle(window.raw_window_handle())?,
        };
        let surface = instance
            .create_surface_unsafe(target)
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| RenderError::NoAdapter(e.to_string()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&DeviceDescriptor {
            required_features: Features::empty(),
            required_limits: Limits::default(),
            label: Some("baseview_shell"),
            memory_hints: wgpu::MemoryHints::default(),
            ..Default::default()
        }))
        .map_err(|e| RenderError::Device(e.to_string()))?;

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .unwrap_or(TextureFormat::Bgra8Unorm);

        let alpha_mode = if caps.alpha_modes.contains(&CompositeAlphaMode::PreMultiplied) {
            CompositeAlphaMode::PreMultiplied
        } else {
            CompositeAlphaMode::Auto
        };

        let width = width.max(1);
        let height = height.max(1);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let (target_texture, target_view) = create_target_texture(&device, width, height);
        let blitter = TextureBlitter::new(&device, surface_format);

        let renderer = Renderer::new(
            &device,
            RendererOptions {
                use_cpu: false,
                antialiasing_support: vello::AaSupport::all(),
                num_init_threads: None,
                pipeline_cache: None,
            },
        )
        .map_err(|e| RenderError::Renderer(e.to_string()))?;

        tracing::debug!(width, height, ?surface_format, "render context created");

        Ok(Self {
            device,
            queue,
            renderer,
            surface,
            surface_config,
            target_texture,
            target_view,
            blitter,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Resize the surface and the intermediate texture
    pub fn resize(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if (width, height) == self.size() {
            return;
        }

        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);

        let (target_texture, target_view) = create_target_texture(&self.device, width, height);
        self.target_texture = target_texture;
        self.target_view = target_view;
    }

    /// Render a Vello scene and present it
    pub fn render(&mut self, scene: &Scene, base_color: Color) -> Result<(), RenderError> {
        let render_params = RenderParams {
            base_color,
            width: self.target_texture.width(),
            height: self.target_texture.height(),
            antialiasing_method: AaConfig::Msaa16,
        };

        self.renderer
            .render_to_texture(
                &self.device,
                &self.queue,
                scene,
                &self.target_view,
                &render_params,
            )
            .map_err(|e| RenderError::Renderer(e.to_string()))?;

        let surface_texture = self
            .surface
            .get_current_texture()
            .map_err(|e| RenderError::Surface(e.to_string()))?;
        let surface_view = surface_texture
            .texture
            .create_view(&TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("present"),
            });
        self.blitter
            .copy(&self.device, &mut encoder, &self.target_view, &surface_view);
        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();

        Ok(())
    }
}

fn create_target_texture(device: &Device, width: u32, height: u32) -> (Texture, TextureView) {
    let texture = device.create_texture(&TextureDescriptor {
        label: Some("vello_target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: TextureUsages::STORAGE_BINDING | TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });

    let view = texture.create_view(&TextureViewDescriptor::default());
    (texture, view)
}

/// Convert a raw-window-handle 0.5 display handle to the 0.6 one wgpu expects
fn convert_display_handle(
    handle: raw_window_handle::RawDisplayHandle,
) -> Result<wgpu::rwh::RawDisplayHandle, RenderError> {
    use raw_window_handle::RawDisplayHandle as Old;
    use wgpu::rwh::RawDisplayHandle as New;

    match handle {
        #[cfg(target_os = "macos")]
        Old::AppKit(_) => Ok(New::AppKit(wgpu::rwh::AppKitDisplayHandle::new())),

        #[cfg(target_os = "linux")]
        Old::Xlib(h) => Ok(New::Xlib(wgpu::rwh::XlibDisplayHandle::new(
            std::ptr::NonNull::new(h.display),
            h.screen,
        ))),

        #[cfg(target_os = "linux")]
        Old::Xcb(h) => Ok(New::Xcb(wgpu::rwh::XcbDisplayHandle::new(
            std::ptr::NonNull::new(h.connection),
            h.screen,
        ))),

        #[cfg(target_os = "linux")]
        Old::Wayland(h) => std::ptr::NonNull::new(h.display)
            .map(|display| New::Wayland(wgpu::rwh::WaylandDisplayHandle::new(display)))
            .ok_or(RenderError::UnsupportedHandle("null wayland display")),

        #[cfg(target_os = "windows")]
        Old::Windows(_) => Ok(New::Windows(wgpu::rwh::WindowsDisplayHandle::new())),

        _ => Err(RenderError::UnsupportedHandle("display handle type")),
    }
}

/// Convert a raw-window-handle 0.5 window handle to the 0.6 one wgpu expects
fn convert_window_handle(
    handle: raw_window_handle::RawWindowHandle,
) -> Result<wgpu::rwh::RawWindowHandle, RenderError> {
    use raw_window_handle::RawWindowHandle as Old;
    use wgpu::rwh::RawWindowHandle as New;

    match handle {
        #[cfg(target_os = "macos")]
        Old::AppKit(h) => std::ptr::NonNull::new(h.ns_view)
            .map(|view| New::AppKit(wgpu::rwh::AppKitWindowHandle::new(view)))
            .ok_or(RenderError::UnsupportedHandle("null NSView")),

        #[cfg(target_os = "linux")]
        Old::Xlib(h) => Ok(New::Xlib(wgpu::rwh::XlibWindowHandle::new(h.window))),

        #[cfg(target_os = "linux")]
        Old::Xcb(h) => std::num::NonZeroU32::new(h.window)
            .map(|window| New::Xcb(wgpu::rwh::XcbWindowHandle::new(window)))
            .ok_or(RenderError::UnsupportedHandle("null xcb window")),

        #[cfg(target_os = "linux")]
        Old::Wayland(h) => std::ptr::NonNull::new(h.surface)
            .map(|surface| New::Wayland(wgpu::rwh::WaylandWindowHandle::new(surface)))
            .ok_or(RenderError::UnsupportedHandle("null wayland surface")),

        #[cfg(target_os = "windows")]
        Old::Win32(h) => {
            let hwnd = std::num::NonZeroIsize::new(h.hwnd as isize)
                .ok_or(RenderError::UnsupportedHandle("null HWND"))?;
            let mut new_handle = wgpu::rwh::Win32WindowHandle::new(hwnd);
            new_handle.hinstance = std::num::NonZeroIsize::new(h.hinstance as isize);
            Ok(New::Win32(new_handle))
        }

        _ => Err(RenderError::UnsupportedHandle("window handle type")),
    }
}
