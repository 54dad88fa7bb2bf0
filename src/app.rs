use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::config::{SieveConfig, MAX_POSITIONS, SCRUB_STEP};
use crate::engine::{LoopStatus, SieveEngine, TimelineMode};
use crate::gpu::{GpuContext, RenderPipeline, SieveBuffers};

/// Application state: the engine plus everything needed to show it
pub struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    buffers: Option<SieveBuffers>,
    render_pipeline: Option<RenderPipeline>,
    engine: SieveEngine,
    config: SieveConfig,
    last_frame: Option<Instant>,
    fps_counter: FpsCounter,
}

impl App {
    pub fn new(config: SieveConfig) -> Self {
        Self {
            window: None,
            gpu: None,
            buffers: None,
            render_pipeline: None,
            engine: SieveEngine::new(),
            config,
            last_frame: None,
            fps_counter: FpsCounter::new(),
        }
    }

    /// (Re)configure the engine and size the GPU buffers to match
    fn apply_config(&mut self, config: SieveConfig) {
        if let Err(e) = self.engine.setup(config) {
            log::error!("Rejected configuration: {}", e);
            return;
        }
        self.config = config;

        if let Some(gpu) = &self.gpu {
            let (Ok(encoded), Ok(primes)) = (self.engine.encoded_buffer(), self.engine.primes())
            else {
                return;
            };
            self.buffers = Some(SieveBuffers::new(&gpu.device, &gpu.queue, encoded, primes));
        }
        if let Err(e) = self.engine.play() {
            log::error!("Failed to start: {}", e);
        }
    }

    fn render(&mut self) {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|prev| now.duration_since(prev).as_secs_f64())
            .unwrap_or(0.0);
        self.last_frame = Some(now);

        // 1. Advance the simulation on the CPU
        let changed = match self.engine.step(dt) {
            Ok(changed) => changed,
            Err(e) => {
                log::error!("Step failed: {}", e);
                return;
            }
        };

        let (Some(gpu), Some(buffers), Some(render)) =
            (self.gpu.as_ref(), self.buffers.as_ref(), self.render_pipeline.as_ref())
        else {
            return;
        };

        // 2. Upload crossings only when they changed, parameters every frame
        if changed {
            if let Ok(encoded) = self.engine.encoded_buffer() {
                if buffers.fits(encoded.len() as u32) {
                    buffers.upload_crossed(&gpu.queue, encoded);
                }
            }
        }
        let (Ok(params), Ok(time)) = (self.engine.field_params(), self.engine.time()) else {
            return;
        };
        buffers.update_params(&gpu.queue, &params, time as f32);

        // Get surface texture
        let output = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        // 3. Draw the field
        let bind_group = render.create_bind_group(&gpu.device, buffers);
        render.draw(&mut encoder, &view, &bind_group);

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if let Some(fps) = self.fps_counter.tick() {
            self.update_title(fps);
        }
    }

    fn update_title(&self, fps: f64) {
        let Some(window) = &self.window else {
            return;
        };
        let progress = self.engine.normalized_time().unwrap_or(0.0);
        let crossed = self.engine.crossed_count().unwrap_or(0);
        let status = match self.engine.status() {
            LoopStatus::Running => "",
            LoopStatus::Paused => " [Paused]",
            LoopStatus::Stopped => " [Stopped]",
        };
        window.set_title(&format!(
            "Wavefront Sieve - {:.0} FPS - N={} - {:.0}% - {} crossed - x{}{}",
            fps,
            self.config.n,
            progress * 100.0,
            crossed,
            self.engine.playback_rate(),
            status
        ));
    }

    fn scrub_by(&mut self, delta: f64) {
        let target = match self.engine.timeline_mode() {
            TimelineMode::Looping => self.engine.normalized_time().map(|p| p + delta),
            TimelineMode::FreeRun => match (self.engine.time(), self.engine.loop_duration()) {
                (Ok(t), Ok(d)) => Ok(t + delta * d),
                (Err(e), _) | (_, Err(e)) => Err(e),
            },
        };
        if let Err(e) = target.and_then(|t| self.engine.scrub(t)) {
            log::error!("Scrub failed: {}", e);
        }
    }

    fn handle_key(&mut self, key_code: KeyCode) {
        let result = match key_code {
            KeyCode::Space => self.engine.toggle(),
            KeyCode::KeyR => self.engine.restart(),

            KeyCode::ArrowLeft => {
                self.scrub_by(-SCRUB_STEP);
                Ok(())
            }
            KeyCode::ArrowRight => {
                self.scrub_by(SCRUB_STEP);
                Ok(())
            }

            KeyCode::BracketLeft => {
                self.engine.set_playback_rate(self.engine.playback_rate() / 2.0);
                log::info!("Playback rate: x{}", self.engine.playback_rate());
                Ok(())
            }
            KeyCode::BracketRight => {
                self.engine.set_playback_rate(self.engine.playback_rate() * 2.0);
                log::info!("Playback rate: x{}", self.engine.playback_rate());
                Ok(())
            }

            KeyCode::KeyL => {
                let mode = match self.engine.timeline_mode() {
                    TimelineMode::Looping => TimelineMode::FreeRun,
                    TimelineMode::FreeRun => TimelineMode::Looping,
                };
                self.engine.set_timeline_mode(mode);
                Ok(())
            }

            // Resize the axis: a full setup
            KeyCode::Equal | KeyCode::NumpadAdd => {
                let n = (self.config.n * 2).min(MAX_POSITIONS);
                self.apply_config(SieveConfig { n, ..self.config });
                Ok(())
            }
            KeyCode::Minus | KeyCode::NumpadSubtract => {
                let n = (self.config.n / 2).max(2);
                self.apply_config(SieveConfig { n, ..self.config });
                Ok(())
            }

            _ => Ok(()),
        };

        if let Err(e) = result {
            log::error!("Key {:?} failed: {}", key_code, e);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        log::info!("Initializing Wavefront Sieve...");

        let window_attrs = Window::default_attributes()
            .with_title("Wavefront Sieve - Initializing...")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 360));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        log::info!("Creating GPU context...");
        let gpu = pollster::block_on(GpuContext::new(window.clone()));

        log::info!("Creating render pipeline...");
        let render_pipeline = RenderPipeline::new(&gpu.device, gpu.format());

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.render_pipeline = Some(render_pipeline);
        self.apply_config(self.config);

        log::info!("Initialization complete!");
        log::info!("Controls:");
        log::info!("  Space: Play/pause");
        log::info!("  R: Restart");
        log::info!("  Left/Right: Scrub");
        log::info!("  [/]: Halve/double playback rate");
        log::info!("  L: Toggle looping/free-run timeline");
        log::info!("  +/-: Double/halve N");
        log::info!("  Escape: Quit");
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() {
                    if let PhysicalKey::Code(key_code) = event.physical_key {
                        if key_code == KeyCode::Escape {
                            log::info!("Escape pressed, exiting...");
                            event_loop.exit();
                        } else {
                            self.handle_key(key_code);
                        }
                    }
                }
            }
            WindowEvent::Resized(new_size) => {
                // Surface only; the simulation keeps its time and crossings
                if let Some(gpu) = &mut self.gpu {
                    log::info!("Window resized to {}x{}", new_size.width, new_size.height);
                    gpu.resize(new_size);
                }
                self.engine.resize(new_size.width, new_size.height);
            }
            WindowEvent::RedrawRequested => {
                self.render();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Simple FPS counter
struct FpsCounter {
    last_update: Instant,
    frame_count: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last_update: Instant::now(),
            frame_count: 0,
        }
    }

    /// Tick the counter, returns Some(fps) every second
    fn tick(&mut self) -> Option<f64> {
        self.frame_count += 1;
        let elapsed = self.last_update.elapsed();

        if elapsed.as_secs_f64() >= 1.0 {
            let fps = self.frame_count as f64 / elapsed.as_secs_f64();
            self.frame_count = 0;
            self.last_update = Instant::now();
            Some(fps)
        } else {
            None
        }
    }
}
