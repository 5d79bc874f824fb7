//! winit event loop that drives a [`FrameHandler`]: one window, continuous redraw,
//! tracked keys and mouse-look forwarded to the handler.

use std::sync::Arc;

use strata_core::TrackedKey;
use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    CreateWindow(#[from] winit::error::OsError),

    #[error("frame handler failed to start: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// What the loop should do after a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    Continue,
    Exit,
}

/// The application side of the loop. All calls happen on the event-loop thread.
pub trait FrameHandler {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Called once, when the window exists. Surface and device setup go here.
    fn init(&mut self, window: Arc<Window>) -> Result<(), Self::Error>;

    /// Draws one frame. Called continuously while the window is open.
    fn frame(&mut self) -> FrameStatus;

    /// Rebuilds size-dependent resources. Returning [`FrameStatus::Exit`] stops the loop.
    fn resize(&mut self, width: u32, height: u32) -> FrameStatus;

    fn key(&mut self, key: TrackedKey, pressed: bool);

    /// Raw mouse travel while the left button is held.
    fn look(&mut self, dx: f32, dy: f32);

    /// Held keys are not reported as released when focus moves away.
    fn focus_lost(&mut self) {}
}

// The State Machine that holds the handler while waiting for the OS
struct StrataRunner<H: FrameHandler> {
    title: String,
    handler: H,
    window: Option<Arc<Window>>,
    looking: bool,
    error: Option<WindowError>,
}

impl<H: FrameHandler> StrataRunner<H> {
    fn new(title: &str, handler: H) -> Self {
        Self {
            title: title.to_string(),
            handler,
            window: None,
            looking: false,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: WindowError) {
        log::error!("{error}");
        self.error = Some(error);
        event_loop.exit();
    }
}

impl<H: FrameHandler> ApplicationHandler for StrataRunner<H> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // We keep track if we have started the handler yet
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes().with_title(self.title.as_str());
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => return self.fail(event_loop, err.into()),
        };

        if let Err(err) = self.handler.init(window.clone()) {
            return self.fail(event_loop, WindowError::Handler(Box::new(err)));
        }
        window.request_redraw();
        self.window = Some(window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.looking {
                self.handler.look(dx as f32, dy as f32);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(key) = TrackedKey::from_key_code(code) {
                    self.handler.key(key, state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.looking = state == ElementState::Pressed;
            }
            WindowEvent::Focused(false) => {
                self.looking = false;
                self.handler.focus_lost();
            }
            WindowEvent::Resized(size) => {
                if self.handler.resize(size.width, size.height) == FrameStatus::Exit {
                    event_loop.exit();
                }
            }
            WindowEvent::CloseRequested => {
                log::info!("The close button was pressed; stopping");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                if self.handler.frame() == FrameStatus::Exit {
                    event_loop.exit();
                }
            }
            _ => (),
        }
    }
}

/// Opens a window titled `title` and runs `handler` until the window closes.
pub fn run<H: FrameHandler>(title: &str, handler: H) -> Result<(), WindowError> {
    let event_loop = EventLoop::new()?;

    // ControlFlow::Poll continuously runs the event loop, even if the OS hasn't
    // dispatched any events. This is ideal for games and similar applications.
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut runner = StrataRunner::new(title, handler);
    event_loop.run_app(&mut runner)?;

    match runner.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
