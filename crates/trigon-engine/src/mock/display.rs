use std::collections::HashSet;

use crate::window::{ContextRequest, Display, DisplayError, DisplayEvent, Key, WindowConfig};

use super::{Call, CallTrace};

/// What `MockDisplay::make_current` hands to the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResolver {
    pub request: ContextRequest,
    pub size: (u32, u32),
}

/// Scripted display. Events are keyed on the 1-based poll count, so a test
/// can say "the user closes the window during frame K".
#[derive(Debug)]
pub struct MockDisplay {
    trace: CallTrace,
    fail_platform_init: bool,
    fail_window_creation: bool,
    close_on_poll: Option<u64>,
    escape_on_poll: Option<u64>,
    resizes: Vec<(u64, u32, u32)>,

    polls: u64,
    platform_up: bool,
    window: Option<WindowConfig>,
    request: Option<ContextRequest>,
    close_requested: bool,
    pressed: HashSet<Key>,
}

impl MockDisplay {
    pub fn new(trace: CallTrace) -> Self {
        Self {
            trace,
            fail_platform_init: false,
            fail_window_creation: false,
            close_on_poll: None,
            escape_on_poll: None,
            resizes: Vec::new(),
            polls: 0,
            platform_up: false,
            window: None,
            request: None,
            close_requested: false,
            pressed: HashSet::new(),
        }
    }

    pub fn fail_platform_init(mut self) -> Self {
        self.fail_platform_init = true;
        self
    }

    pub fn fail_window_creation(mut self) -> Self {
        self.fail_window_creation = true;
        self
    }

    /// The window manager asks to close during poll `k`.
    pub fn close_on_poll(mut self, k: u64) -> Self {
        self.close_on_poll = Some(k);
        self
    }

    /// Escape goes down during poll `k` and stays down.
    pub fn press_escape_on_poll(mut self, k: u64) -> Self {
        self.escape_on_poll = Some(k);
        self
    }

    pub fn resize_on_poll(mut self, k: u64, width: u32, height: u32) -> Self {
        self.resizes.push((k, width, height));
        self
    }

    pub fn is_platform_up(&self) -> bool {
        self.platform_up
    }
}

impl Display for MockDisplay {
    type Resolver = MockResolver;

    fn initialize_platform(&mut self) -> Result<(), DisplayError> {
        self.trace.push(Call::InitializePlatform);
        if self.fail_platform_init {
            return Err(DisplayError::PlatformInit("scripted failure".to_string()));
        }
        self.platform_up = true;
        Ok(())
    }

    fn request_context(&mut self, request: ContextRequest) {
        self.trace.push(Call::RequestContext(request));
        self.request = Some(request);
    }

    fn create_window(&mut self, config: &WindowConfig) -> Result<(), DisplayError> {
        assert!(self.platform_up, "window created before platform init");
        self.trace.push(Call::CreateWindow {
            width: config.width,
            height: config.height,
        });
        if self.fail_window_creation {
            return Err(DisplayError::WindowCreation("scripted failure".to_string()));
        }
        self.window = Some(config.clone());
        Ok(())
    }

    fn make_current(&mut self) -> Result<MockResolver, DisplayError> {
        self.trace.push(Call::MakeCurrent);
        let window = self.window.as_ref().ok_or(DisplayError::NoWindow)?;
        Ok(MockResolver {
            request: self.request.unwrap_or_default(),
            size: (window.width, window.height),
        })
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn poll_events(&mut self, handler: &mut dyn FnMut(DisplayEvent)) {
        self.polls += 1;
        self.trace.push(Call::PollEvents);

        let poll = self.polls;
        let due: Vec<(u32, u32)> = self
            .resizes
            .iter()
            .filter(|(k, ..)| *k == poll)
            .map(|&(_, w, h)| (w, h))
            .collect();
        for (width, height) in due {
            if let Some(window) = self.window.as_mut() {
                window.width = width;
                window.height = height;
            }
            handler(DisplayEvent::Resized { width, height });
        }
        if self.escape_on_poll == Some(self.polls) {
            self.pressed.insert(Key::Escape);
        }
        if self.close_on_poll == Some(self.polls) {
            self.close_requested = true;
        }
    }

    fn is_key_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    fn request_close(&mut self) {
        self.trace.push(Call::RequestClose);
        self.close_requested = true;
    }

    fn swap_buffers(&mut self) {
        self.trace.push(Call::SwapBuffers);
    }

    fn destroy_window(&mut self) {
        self.trace.push(Call::DestroyWindow);
        self.window = None;
    }

    fn shutdown_platform(&mut self) {
        self.trace.push(Call::ShutdownPlatform);
        self.platform_up = false;
    }
}
