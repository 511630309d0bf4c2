use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::audio::AudioPlayer;
use crate::error::Error;
use crate::input::InputState;
use crate::renderer::{Camera, RenderContext, RenderTarget};
use crate::scene::Scene;
use crate::settings::{Settings, Z_FAR, Z_NEAR};

/// Winit application driver. `resumed` is Init: window, GPU context, scene
/// and the first render target; every `RedrawRequested` is one Running
/// iteration; close request or a fatal error shuts the loop down.
pub struct App {
    settings: Settings,
    state: Option<State>,
    window_id: Option<WindowId>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            state: None,
            window_id: None,
        }
    }
}

struct State {
    window: Arc<Window>,
    context: RenderContext,
    scene: Scene,
    target: RenderTarget,
    camera: Camera,
    input: InputState,
    _audio: Option<AudioPlayer>,
}

impl State {
    fn new(event_loop: &ActiveEventLoop, settings: &Settings) -> Result<Self, Error> {
        let attributes = Window::default_attributes()
            .with_title("meadow")
            .with_inner_size(winit::dpi::LogicalSize::new(
                settings.window_width,
                settings.window_height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|e| Error::Initialization(format!("window creation failed: {e}")))?,
        );

        let context = pollster::block_on(RenderContext::new(window.clone()))?;
        let scene = Scene::new(&context, settings)?;

        let mut camera = Camera::new(glam::Vec3::ZERO);
        camera.set_projection(
            settings.fov_degrees,
            context.aspect_ratio(),
            Z_NEAR,
            Z_FAR,
        )?;

        let target = RenderTarget::new(
            &context.device,
            context.drawable_size(),
            context.format(),
            scene.post_program(),
        )?;
        scene.set_drawable_size(&context.queue, target.size());

        let audio = match &settings.music {
            Some(path) => Some(AudioPlayer::play_looping(path)?),
            None => None,
        };

        Ok(Self {
            window,
            context,
            scene,
            target,
            camera,
            input: InputState::new(),
            _audio: audio,
        })
    }

    /// One Running iteration: derive matrices, recreate the target on a
    /// size change, render both passes, present, then apply input for the
    /// next frame.
    fn frame(&mut self, settings: &Settings) -> Result<(), Error> {
        let drawable = self.context.drawable_size();

        self.camera.set_projection(
            settings.fov_degrees,
            self.context.aspect_ratio(),
            Z_NEAR,
            Z_FAR,
        )?;
        self.camera.update_view();

        if self.target.needs_resize(drawable) {
            // Assigning the fresh target drops the old color and depth
            // images exactly once, before any further encoding can touch
            // them.
            self.target = RenderTarget::new(
                &self.context.device,
                drawable,
                self.context.format(),
                self.scene.post_program(),
            )?;
            self.scene.set_drawable_size(&self.context.queue, drawable);
            log::info!(
                "render target recreated at {}x{}",
                drawable.width,
                drawable.height
            );
        }

        self.scene.update_camera(&self.context.queue, &self.camera);

        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.context.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timeout; skipping frame");
                return Ok(());
            }
            Err(err) => {
                return Err(Error::Initialization(format!("surface unusable: {err}")));
            }
        };
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Frame"),
                });

        {
            let mut pass = self.target.begin_scene_pass(&mut encoder);
            self.scene.draw_world(&mut pass);
        }
        {
            let mut pass = RenderTarget::begin_present_pass(&mut encoder, &surface_view);
            self.scene.draw_post(&mut pass, self.target.bind_group());
        }

        self.context.queue.submit(Some(encoder.finish()));
        frame.present();

        self.apply_input(settings);
        Ok(())
    }

    /// Movement and look deltas for the next iteration, taken against the
    /// basis derived for the frame just rendered.
    fn apply_input(&mut self, settings: &Settings) {
        let look = settings.look_speed;
        let speed = settings.move_speed;

        if self.input.is_down(KeyCode::ArrowUp) {
            self.camera.look(-look, 0.0);
        }
        if self.input.is_down(KeyCode::ArrowDown) {
            self.camera.look(look, 0.0);
        }
        if self.input.is_down(KeyCode::ArrowLeft) {
            self.camera.look(0.0, -look);
        }
        if self.input.is_down(KeyCode::ArrowRight) {
            self.camera.look(0.0, look);
        }

        if self.input.is_down(KeyCode::KeyW) {
            self.camera.advance(speed);
        }
        if self.input.is_down(KeyCode::KeyS) {
            self.camera.advance(-speed);
        }
        if self.input.is_down(KeyCode::KeyD) {
            self.camera.strafe(speed);
        }
        if self.input.is_down(KeyCode::KeyA) {
            self.camera.strafe(-speed);
        }
        if self.input.is_down(KeyCode::Space) {
            self.camera.ascend(speed);
        }
        if self.input.is_down(KeyCode::ShiftLeft) {
            self.camera.ascend(-speed);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match State::new(event_loop, &self.settings) {
            Ok(state) => {
                self.window_id = Some(state.window.id());
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(err) => {
                log::error!("initialization failed: {err}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if Some(id) != self.window_id {
            return;
        }
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                // The surface follows immediately; the render target is
                // replaced by the next frame's size comparison.
                state.context.resize(size);
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                state.context.resize(state.window.inner_size());
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape && key_state == ElementState::Pressed {
                    event_loop.exit();
                    return;
                }
                state.input.handle_key(code, key_state.is_pressed());
            }
            WindowEvent::RedrawRequested => {
                match state.frame(&self.settings) {
                    Ok(()) => state.window.request_redraw(),
                    Err(err) => {
                        log::error!("rendering failed: {err}");
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }
}
