//! Application event loop.
//!
//! The world is built before any window exists: building only needs the
//! asset loader, whose requests start right away and complete while the GPU
//! is being set up. Once the [`Renderer`] is ready, one frame is drawn
//! synchronously and every redraw after it
//!
//! 1. applies finished asset loads to the scene
//! 2. moves the camera from pending orbit input
//! 3. runs one [`AnimationDriver`] frame, which animates and submits the scene
//! 4. requests the next redraw
//!
//! Natively the GPU setup blocks on a tokio runtime that also runs the asset
//! loads. On the web it is spawned on the browser's executor and handed back
//! through an event loop user event.

use std::sync::Arc;

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::{
    animation::AnimationDriver,
    camera::{Camera, CameraController},
    context::Context,
    render::Renderer,
    resources::{AssetLoader, LoadingManager, Spawner},
    world::{SceneBuilder, SceneConfig, World, make_rng},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub(crate) enum FlowEvent {
    /// The renderer finished initialising on the web executor.
    #[allow(dead_code)]
    Initialized(Box<Renderer>),
    #[allow(dead_code)]
    Failed(anyhow::Error),
}

async fn init_renderer(window: Arc<Window>, camera: Camera) -> anyhow::Result<Renderer> {
    let ctx = Context::new(window).await?;
    Ok(Renderer::new(ctx, &camera))
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: EventLoopProxy<FlowEvent>,
    #[allow(dead_code)]
    config: SceneConfig,
    world: World,
    loader: AssetLoader,
    renderer: Option<Renderer>,
    controller: CameraController,
    driver: AnimationDriver,
    start: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, config: SceneConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();

        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        #[cfg(not(target_arch = "wasm32"))]
        let spawner = Spawner::Tokio(async_runtime.handle().clone());
        #[cfg(target_arch = "wasm32")]
        let spawner = Spawner::Local;

        let mut loader = AssetLoader::new(config.assets_root.clone(), spawner, LoadingManager::new());
        let mut rng = make_rng(config.seed);
        let world = SceneBuilder::new(&config).build(&mut rng, &mut loader);

        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            world,
            loader,
            renderer: None,
            controller: CameraController::new(0.005, 0.1),
            driver: AnimationDriver::new(),
            start: Instant::now(),
        })
    }

    /// Draws the first frame right away, then arms the redraw loop.
    fn set_renderer(&mut self, mut renderer: Renderer) {
        let size = renderer.ctx.window.inner_size();
        renderer.resize(size.width, size.height);
        self.world.camera.projection.resize(size.width, size.height);
        self.renderer = Some(renderer);
        self.redraw();
    }

    fn redraw(&mut self) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };
        self.loader.apply_completed(&mut self.world.scene);
        self.controller.update(&mut self.world.camera);

        let timestamp_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        if let Err(e) = self.driver.frame(&mut self.world, renderer, timestamp_ms) {
            log::error!("Unable to render {e:#}");
        }
        // re-arm for the next frame
        renderer.ctx.window.request_redraw();
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Aquarium");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document
                .get_element_by_id(&self.config.canvas_id)
                .unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create a window: {e}");
                event_loop.exit();
                return;
            }
        };

        let init_future = init_renderer(window, self.world.camera);

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(renderer) => self.set_renderer(renderer),
                Err(e) => {
                    log::error!("App initialization failed: {e:#}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok(renderer) => FlowEvent::Initialized(Box::new(renderer)),
                    Err(e) => FlowEvent::Failed(e),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("Event loop closed before the renderer was ready");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            FlowEvent::Initialized(renderer) => self.set_renderer(*renderer),
            FlowEvent::Failed(e) => {
                log::error!("App initialization failed: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        self.controller.handle_window_events(&event);
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                }
                self.world.camera.projection.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

/// Opens the window and runs the aquarium until it is closed.
pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {e}").into());
        }
    }

    log::info!("Starting aquarium with assets from {}", config.assets_root);
    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
