//! The scene host and application event loop.
//!
//! [`SceneHost`] owns one scene for its whole lifetime: it performs the
//! synchronous setup pass (context, camera, lights, composer), issues the
//! asynchronous asset loads, and drives the render loop until teardown.
//!
//! # Render-loop lifecycle
//!
//! The loop is an explicit state machine, `Uninitialized → Running →
//! Disposed`. Depending on [`StartPolicy`] the `Running` transition happens
//! right after setup or is deferred until the primary asset's completion
//! event fires; the transition is idempotent either way. Disposal is
//! checked at the top of every tick, so teardown never races a frame.
//!
//! # Tick order
//!
//! Each tick, in this order:
//! 1. request the next frame (scheduling is never skipped by a long frame)
//! 2. measure the delta since the previous tick
//! 3. advance the mixer and the spin node by the delta
//! 4. update the orbit controller and refresh camera/light uniforms
//! 5. render the frame through the composer

use std::{iter, sync::Arc};

use instant::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    context::Context,
    data_structures::{texture::Texture, transform::Transform},
    post::EffectComposer,
    resources::{self, LoadedAsset},
    stage::{Stage, StageConfig, StartPolicy},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Render-loop lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// No frame has been scheduled yet.
    Uninitialized,
    /// A frame render is always pending one display refresh away.
    Running,
    /// The loop no longer reschedules itself.
    Disposed,
}

/// The render-loop state machine, separated from the GPU so the lifecycle
/// rules stay testable.
#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    policy: StartPolicy,
}

impl RenderLoop {
    pub fn new(policy: StartPolicy) -> Self {
        Self {
            state: LoopState::Uninitialized,
            policy,
        }
    }

    /// Synchronous setup finished. Returns whether the loop starts now
    /// (only under [`StartPolicy::Immediate`]).
    pub fn on_setup_complete(&mut self) -> bool {
        match (self.state, self.policy) {
            (LoopState::Uninitialized, StartPolicy::Immediate) => {
                self.state = LoopState::Running;
                true
            }
            _ => false,
        }
    }

    /// The primary asset's completion event fired. Returns whether this
    /// event started the loop; repeat events never start a second one.
    pub fn on_primary_asset(&mut self) -> bool {
        if self.policy != StartPolicy::GateOnPrimary {
            return false;
        }
        match self.state {
            LoopState::Uninitialized => {
                self.state = LoopState::Running;
                true
            }
            LoopState::Running | LoopState::Disposed => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn dispose(&mut self) {
        self.state = LoopState::Disposed;
    }

    pub fn state(&self) -> LoopState {
        self.state
    }
}

/// Measures the elapsed real time between ticks.
#[derive(Debug)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Forget time spent before the first tick (e.g. while gated on a load).
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn delta(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now - self.last;
        self.last = now;
        dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub(crate) enum MouseButtonState {
    Left,
    Right,
    None,
}

/// Messages delivered to the host on the event-loop thread.
pub(crate) enum HostEvent {
    /// Asynchronous setup finished (WASM hands the state over this way).
    #[allow(dead_code)]
    Initialized(HostState),
    /// An asset load completed, successfully or not. Completions of
    /// independent assets race; arrival order carries no meaning.
    AssetReady {
        index: usize,
        result: anyhow::Result<LoadedAsset>,
    },
}

/// GPU context, stage and composer bundle owned by a running host.
pub struct HostState {
    pub(crate) ctx: Context,
    pub(crate) stage: Stage,
    composer: EffectComposer,
    is_surface_configured: bool,
}

impl HostState {
    async fn new(window: Arc<Window>, config: &StageConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, config).await?;
        let composer = EffectComposer::new(
            &ctx.device,
            &ctx.config,
            &ctx.camera.bind_group_layout,
            &ctx.light.bind_group_layout,
            &config.params,
        );
        log::info!(
            "composer passes in order: {}",
            composer.pass_labels().join(" -> ")
        );
        Ok(Self {
            ctx,
            stage: Stage::new(),
            composer,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
            self.composer
                .resize(&self.ctx.device, &self.ctx.queue, width, height);
        }
    }

    /// Tick step 4: apply accumulated input to the orbit, refresh the
    /// camera uniform and keep the point light on the camera.
    fn update_camera(&mut self, dt: Duration) {
        self.ctx
            .camera
            .controller
            .update(&mut self.ctx.camera.camera, dt);
        self.ctx
            .camera
            .uniform
            .update_view_proj(&self.ctx.camera.camera, &self.ctx.projection);
        self.ctx.queue.write_buffer(
            &self.ctx.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.ctx.camera.uniform]),
        );

        self.ctx.light.uniform.position = self.ctx.camera.camera.position.into();
        self.ctx.queue.write_buffer(
            &self.ctx.light.buffer,
            0,
            bytemuck::cast_slice(&[self.ctx.light.uniform]),
        );
    }

    /// Tick step 5: one frame through the composer, never through the raw
    /// surface pass.
    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.stage.root.update_world_transforms(&Transform::default());
        self.stage.root.write_to_buffers(&self.ctx.queue);

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });

        self.composer
            .render(&self.ctx, &self.stage.root, &mut encoder, &view);

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// Hosts one scene: setup, asset loading, render loop, teardown.
pub struct SceneHost {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<HostEvent>,
    config: StageConfig,
    state: Option<HostState>,
    render_loop: RenderLoop,
    clock: FrameClock,
    mouse_pressed: MouseButtonState,
}

impl SceneHost {
    fn new(event_loop: &EventLoop<HostEvent>, config: StageConfig) -> Self {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new().unwrap();
        let render_loop = RenderLoop::new(config.start);
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            state: None,
            render_loop,
            clock: FrameClock::new(),
            mouse_pressed: MouseButtonState::None,
        }
    }

    /// Issue one load task per asset spec. Completions come back as
    /// [`HostEvent::AssetReady`], strictly after this call returns.
    fn spawn_asset_loads(&self, state: &HostState) {
        for (index, spec) in self.config.assets.iter().enumerate() {
            let spec = spec.clone();
            // Device and queue are internally reference counted, the clone
            // only shares the handle with the load task.
            let device = state.ctx.device.clone();
            let queue = state.ctx.queue.clone();
            let proxy = self.proxy.clone();

            let load = async move {
                let result = resources::load_asset(&spec, &device, &queue).await;
                if proxy
                    .send_event(HostEvent::AssetReady { index, result })
                    .is_err()
                {
                    log::warn!("event loop closed before {} finished loading", spec.path);
                }
            };

            #[cfg(not(target_arch = "wasm32"))]
            self.async_runtime.spawn(load);

            #[cfg(target_arch = "wasm32")]
            wasm_bindgen_futures::spawn_local(load);
        }
    }

    fn start_loop(&mut self) {
        // Time spent in setup or waiting on the gate is not animation time.
        self.clock.reset();
        if let Some(state) = &self.state {
            state.ctx.window.request_redraw();
        }
    }
}

impl ApplicationHandler<HostEvent> for SceneHost {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let state = match self
                .async_runtime
                .block_on(HostState::new(window, &self.config))
            {
                Ok(state) => state,
                Err(e) => panic!(
                    "Host initialization failed. Cannot create the main context: {}",
                    e
                ),
            };
            self.spawn_asset_loads(&state);
            self.state = Some(state);
            if self.render_loop.on_setup_complete() {
                self.start_loop();
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            let config = self.config.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let state = match HostState::new(window, &config).await {
                    Ok(state) => state,
                    Err(e) => panic!(
                        "Host initialization failed. Cannot create the main context: {}",
                        e
                    ),
                };
                assert!(proxy.send_event(HostEvent::Initialized(state)).is_ok());
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: HostEvent) {
        match event {
            HostEvent::Initialized(state) => {
                // This is the message from our wasm `spawn_local`
                self.state = Some(state);
                let state = self.state.as_mut().unwrap();
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                self.spawn_asset_loads(self.state.as_ref().unwrap());
                if self.render_loop.on_setup_complete() {
                    self.start_loop();
                }
            }
            HostEvent::AssetReady { index, result } => {
                let Some(state) = &mut self.state else {
                    return;
                };
                let spec = self.config.assets[index].clone();
                match result {
                    Ok(asset) => state.stage.attach(&spec, asset),
                    // The scene stays live without the asset; a dark frame
                    // beats a dead loop.
                    Err(e) => log::error!("failed to load {}: {:?}", spec.path, e),
                }
                if spec.primary && self.render_loop.on_primary_asset() {
                    self.start_loop();
                }
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if let MouseButtonState::Left = self.mouse_pressed {
                state.ctx.camera.controller.handle_mouse(dx, dy);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => {
                self.render_loop.dispose();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                self.mouse_pressed = match (button, button_state.is_pressed()) {
                    (MouseButton::Left, true) => MouseButtonState::Left,
                    (MouseButton::Right, true) => MouseButtonState::Right,
                    _ => MouseButtonState::None,
                };
            }
            WindowEvent::RedrawRequested => {
                // Disposal and gating are checked before any frame work.
                if !self.render_loop.is_running() {
                    return;
                }

                // 1. keep the loop alive before rendering, so a long frame
                //    cannot skip the next schedule
                state.ctx.window.request_redraw();

                // 2. elapsed real time since the previous tick
                let dt = self.clock.delta();

                // 3. animations advance proportionally to the delta
                state.stage.advance(dt.as_secs_f32());

                // 4. controls and uniforms
                state.update_camera(dt);

                // 5. the frame itself
                match state.render() {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Build the event loop and run `config` until the window closes.
pub fn run(config: StageConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<HostEvent> = EventLoop::with_user_event().build()?;

    let mut host = SceneHost::new(&event_loop, config);

    event_loop.run_app(&mut host)?;

    Ok(())
}
