use std::collections::HashSet;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::device::ContextResolver;

use super::{ContextRequest, Display, DisplayError, DisplayEvent, Key, WindowConfig};

/// Pumps the event loop this many times waiting for the platform to hand out
/// an active loop that can create the window.
const CREATE_WINDOW_PUMPS: usize = 16;

/// `Display` backed by a `winit` event loop driven with `pump_app_events`.
///
/// The loop is pumped with a zero timeout, so `poll_events` never blocks.
pub struct WinitDisplay {
    event_loop: Option<EventLoop<()>>,
    state: PumpState,
    request: ContextRequest,
    current_thread: Option<ThreadId>,
}

/// Receives winit callbacks during a pump.
#[derive(Default)]
struct PumpState {
    pending: Option<WindowConfig>,
    window: Option<Arc<Window>>,
    creation_error: Option<String>,
    close_requested: bool,
    pressed: HashSet<Key>,

    /// Reused between polls; drained, never reallocated after warm-up.
    queued: Vec<DisplayEvent>,
}

impl WinitDisplay {
    pub fn new() -> Self {
        Self {
            event_loop: None,
            state: PumpState::default(),
            request: ContextRequest::default(),
            current_thread: None,
        }
    }

    fn pump(&mut self) -> PumpStatus {
        let Some(event_loop) = self.event_loop.as_mut() else {
            return PumpStatus::Exit(0);
        };
        event_loop.pump_app_events(Some(Duration::ZERO), &mut self.state)
    }
}

impl Default for WinitDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for WinitDisplay {
    type Resolver = ContextResolver<Window>;

    fn initialize_platform(&mut self) -> Result<(), DisplayError> {
        let event_loop =
            EventLoop::new().map_err(|e| DisplayError::PlatformInit(e.to_string()))?;
        self.event_loop = Some(event_loop);
        Ok(())
    }

    fn request_context(&mut self, request: ContextRequest) {
        log::debug!(
            "context requested: {}.{} {:?}",
            request.major,
            request.minor,
            request.profile
        );
        self.request = request;
    }

    fn create_window(&mut self, config: &WindowConfig) -> Result<(), DisplayError> {
        if self.event_loop.is_none() {
            return Err(DisplayError::WindowCreation(
                "platform is not initialized".to_string(),
            ));
        }

        self.state.pending = Some(config.clone());

        for _ in 0..CREATE_WINDOW_PUMPS {
            if let PumpStatus::Exit(code) = self.pump() {
                return Err(DisplayError::WindowCreation(format!(
                    "event loop exited with code {code} before the window opened"
                )));
            }
            if let Some(reason) = self.state.creation_error.take() {
                self.state.pending = None;
                return Err(DisplayError::WindowCreation(reason));
            }
            if self.state.window.is_some() {
                return Ok(());
            }
        }

        self.state.pending = None;
        Err(DisplayError::WindowCreation(
            "platform never became ready to create windows".to_string(),
        ))
    }

    fn make_current(&mut self) -> Result<Self::Resolver, DisplayError> {
        let window = self.state.window.as_ref().ok_or(DisplayError::NoWindow)?;

        let this_thread = thread::current().id();
        match self.current_thread {
            Some(owner) if owner != this_thread => return Err(DisplayError::ContextThread),
            _ => self.current_thread = Some(this_thread),
        }

        Ok(ContextResolver {
            target: Arc::clone(window),
            request: self.request,
        })
    }

    fn should_close(&self) -> bool {
        self.state.close_requested
    }

    fn poll_events(&mut self, handler: &mut dyn FnMut(DisplayEvent)) {
        if let PumpStatus::Exit(_) = self.pump() {
            self.state.close_requested = true;
        }
        for event in self.state.queued.drain(..) {
            handler(event);
        }
    }

    fn is_key_pressed(&self, key: Key) -> bool {
        self.state.pressed.contains(&key)
    }

    fn request_close(&mut self) {
        self.state.close_requested = true;
    }

    fn swap_buffers(&mut self) {
        // The surface texture is presented by the GPU context; the window only
        // needs to tell the compositor a frame is on its way.
        if let Some(window) = self.state.window.as_ref() {
            window.pre_present_notify();
        }
    }

    fn destroy_window(&mut self) {
        if self.state.window.take().is_some() {
            log::debug!("window destroyed");
        }
        self.state.pressed.clear();
        self.state.queued.clear();
        self.current_thread = None;
    }

    fn shutdown_platform(&mut self) {
        if self.event_loop.take().is_some() {
            log::debug!("platform shut down");
        }
    }
}

impl PumpState {
    fn try_create_window(&mut self, event_loop: &ActiveEventLoop) {
        let Some(config) = self.pending.take() else {
            return;
        };

        let attrs = Window::default_attributes()
            .with_title(config.title)
            .with_inner_size(PhysicalSize::new(config.width, config.height));

        match event_loop.create_window(attrs) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(e) => self.creation_error = Some(e.to_string()),
        }
    }
}

impl ApplicationHandler for PumpState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);
        self.try_create_window(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Some platforms only resume once; a window requested later is created here.
        self.try_create_window(event_loop);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.close_requested = true,

            WindowEvent::Resized(size) => self.queued.push(DisplayEvent::Resized {
                width: size.width,
                height: size.height,
            }),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = self.window.as_ref() {
                    let size = window.inner_size();
                    self.queued.push(DisplayEvent::Resized {
                        width: size.width,
                        height: size.height,
                    });
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let key = map_key(event.physical_key);
                let pressed = event.state == ElementState::Pressed;
                if pressed {
                    self.pressed.insert(key);
                } else {
                    self.pressed.remove(&key);
                }
            }

            // Releasing focus can swallow key-up events.
            WindowEvent::Focused(false) => self.pressed.clear(),

            _ => {}
        }
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    match pk {
        PhysicalKey::Code(code) => match code {
            KeyCode::Escape => Key::Escape,
            _ => Key::Other,
        },
        PhysicalKey::Unidentified(_) => Key::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_exit_key() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Escape)), Key::Escape);
    }

    #[test]
    fn unmapped_keys_collapse_to_other() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyA)), Key::Other);
    }

    #[test]
    fn operations_before_platform_init_fail_cleanly() {
        let mut display = WinitDisplay::new();
        assert!(matches!(
            display.create_window(&WindowConfig::default()),
            Err(DisplayError::WindowCreation(_))
        ));
        assert!(matches!(display.make_current(), Err(DisplayError::NoWindow)));
        assert!(!display.should_close());

        display.request_close();
        assert!(display.should_close());

        display.destroy_window();
        display.shutdown_platform();
    }
}
