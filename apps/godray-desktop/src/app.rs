use crate::state::{
    AppState, BASIC_EFFECT, CUBE_GEOMETRY, MotionAccumulator, SCATTERING_EFFECT, wheel_notches,
};
use anyhow::{Context as _, Result, anyhow};
use egui::Context as EguiContext;
use godray_assets::Geometry;
use godray_input::MouseInput;
use godray_render_wgpu::{LightScatteringPass, RenderTarget, SceneRenderer};
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Surface, device and the surface configuration they were set up with.
struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
}

impl Gpu {
    fn new(window: Arc<Window>) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("godray_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
    }
}

/// Offscreen target plus the two passes drawn from it. Built once assets load.
struct Passes {
    target: RenderTarget,
    scene: SceneRenderer,
    post: LightScatteringPass,
}

impl Passes {
    fn new(gpu: &Gpu, state: &AppState) -> Result<Self> {
        let basic = state.assets.require_effect(BASIC_EFFECT)?;
        let scattering = state.assets.require_effect(SCATTERING_EFFECT)?;
        let cube = state.assets.require_geometry(CUBE_GEOMETRY)?;

        let target = RenderTarget::new(&gpu.device, gpu.config.width, gpu.config.height);
        let scene = SceneRenderer::new(&gpu.device, basic, cube);
        let post = LightScatteringPass::new(
            &gpu.device,
            scattering,
            &Geometry::quad(),
            gpu.config.format,
            &target,
        );
        Ok(Self {
            target,
            scene,
            post,
        })
    }

    fn resize(&mut self, gpu: &Gpu) {
        self.target = RenderTarget::new(&gpu.device, gpu.config.width, gpu.config.height);
        self.post.rebind(&gpu.device, &self.target);
    }
}

/// egui context with its winit and wgpu halves.
struct Overlay {
    ctx: EguiContext,
    winit: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl Overlay {
    fn new(window: &Window, gpu: &Gpu) -> Self {
        let ctx = EguiContext::default();
        let winit = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(&gpu.device, gpu.config.format, None, 1, false);
        Self {
            ctx,
            winit,
            renderer,
        }
    }

    fn draw(
        &mut self,
        window: &Window,
        gpu: &Gpu,
        view: &wgpu::TextureView,
        state: &mut AppState,
        target_size: Option<(u32, u32)>,
    ) {
        let raw_input = self.winit.take_egui_input(window);
        let full_output = self.ctx.run(raw_input, |ctx| {
            state.draw_hud(ctx, target_size);
        });
        self.winit
            .handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

pub struct DemoApp {
    state: AppState,
    title: String,
    size: PhysicalSize<u32>,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    passes: Option<Passes>,
    overlay: Option<Overlay>,
    motion: MotionAccumulator,
    startup_error: Option<anyhow::Error>,
}

impl DemoApp {
    pub fn new(state: AppState, title: String, width: u32, height: u32) -> Self {
        Self {
            state,
            title,
            size: PhysicalSize::new(width, height),
            window: None,
            gpu: None,
            passes: None,
            overlay: None,
            motion: MotionAccumulator::default(),
            startup_error: None,
        }
    }

    pub(crate) fn record_startup_error(&mut self, e: anyhow::Error) {
        tracing::error!("startup failed: {e:#}");
        self.startup_error = Some(e);
    }

    /// The error that stopped startup, if any. Taken once the loop has exited.
    pub fn take_startup_error(&mut self) -> Option<anyhow::Error> {
        self.startup_error.take()
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(self.size);
        let window = Arc::new(event_loop.create_window(attrs)?);
        let gpu = Gpu::new(window.clone())?;

        // A failed load keeps the window up, clearing every frame.
        match self.state.load_assets() {
            Ok(()) => self.passes = Some(Passes::new(&gpu, &self.state)?),
            Err(e) => tracing::error!("asset loading failed: {e:#}"),
        }

        self.overlay = Some(Overlay::new(&window, &gpu));
        self.gpu = Some(gpu);
        self.window = Some(window);
        Ok(())
    }

    fn redraw(&mut self) {
        let view_proj = self.state.update();

        let (Some(window), Some(gpu)) = (&self.window, &self.gpu) else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let target_size = match &mut self.passes {
            Some(passes) => {
                passes.scene.render(
                    &gpu.device,
                    &gpu.queue,
                    &passes.target,
                    view_proj,
                    &self.state.scene,
                );
                passes.post.render(
                    &gpu.device,
                    &gpu.queue,
                    &view,
                    view_proj,
                    self.state.camera.aspect,
                );
                Some(passes.target.size())
            }
            None => {
                godray_render_wgpu::clear(&gpu.device, &gpu.queue, &view);
                None
            }
        };

        if let Some(overlay) = &mut self.overlay {
            overlay.draw(window, gpu, &view, &mut self.state, target_size);
        }

        output.present();
        window.request_redraw();
    }
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.record_startup_error(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(overlay), Some(window)) = (&mut self.overlay, &self.window) {
            let response = overlay.winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.state.resize(new_size.width, new_size.height);
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                    if let Some(passes) = &mut self.passes {
                        passes.resize(gpu);
                    }
                }
                tracing::debug!("resized to {}x{}", new_size.width, new_size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::F1),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.state.show_hud = !self.state.show_hud;
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.state.handle_mouse(match btn_state {
                    ElementState::Pressed => MouseInput::LeftButtonDown,
                    ElementState::Released => MouseInput::LeftButtonUp,
                });
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let (h, v) = wheel_notches(delta);
                self.state.handle_mouse(MouseInput::Wheel { h, v });
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            let (dx, dy) = self.motion.accumulate(delta);
            self.state.handle_mouse(MouseInput::Move { dx, dy });
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
