//! Polled input state for the fly camera.
//!
//! winit delivers input as events; the camera wants to poll. `InputState`
//! folds events into a snapshot that implements [`CameraInput`].

use std::collections::HashSet;

use glint_math::Vec2;
use glint_renderer::{CameraInput, CursorMode, MoveKey};
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window};

/// Map a physical key to the camera movement it drives.
pub fn move_key_for(code: KeyCode) -> Option<MoveKey> {
    match code {
        KeyCode::KeyW => Some(MoveKey::Forward),
        KeyCode::KeyS => Some(MoveKey::Backward),
        KeyCode::KeyA => Some(MoveKey::Left),
        KeyCode::KeyD => Some(MoveKey::Right),
        KeyCode::ControlLeft => Some(MoveKey::Down),
        KeyCode::Space => Some(MoveKey::Up),
        _ => None,
    }
}

/// Snapshot of the input the camera cares about.
#[derive(Debug, Default)]
pub struct InputState {
    /// Sum of raw pointer motion; keeps counting while the cursor is locked
    mouse_position: Vec2,
    look_button_down: bool,
    keys_down: HashSet<MoveKey>,

    requested_cursor: CursorMode,
    applied_cursor: CursorMode,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a window event into the snapshot.
    ///
    /// Presses that egui consumed are ignored; releases always go through so
    /// a button released over a panel does not stay stuck down.
    pub fn handle_window_event(&mut self, event: &WindowEvent, consumed_by_ui: bool) {
        match event {
            WindowEvent::MouseInput { button: MouseButton::Right, state, .. } => match state {
                ElementState::Pressed if !consumed_by_ui => self.look_button_down = true,
                ElementState::Released => self.look_button_down = false,
                _ => {}
            },
            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(code), state, .. },
                ..
            } => {
                if let Some(key) = move_key_for(*code) {
                    match state {
                        ElementState::Pressed if !consumed_by_ui => {
                            self.keys_down.insert(key);
                        }
                        ElementState::Released => {
                            self.keys_down.remove(&key);
                        }
                        _ => {}
                    }
                }
            }
            WindowEvent::Focused(false) => {
                self.look_button_down = false;
                self.keys_down.clear();
            }
            _ => {}
        }
    }

    /// Fold raw device motion into the virtual pointer position.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.mouse_position += Vec2::new(delta.0 as f32, delta.1 as f32);
        }
    }

    /// Whether anything that could move the camera is active.
    pub fn is_active(&self) -> bool {
        self.look_button_down
    }

    /// Push the cursor mode the camera asked for to the window, if it changed.
    pub fn apply_cursor_mode(&mut self, window: &Window) {
        if self.requested_cursor == self.applied_cursor {
            return;
        }

        match self.requested_cursor {
            CursorMode::Locked => {
                let grabbed = window
                    .set_cursor_grab(CursorGrabMode::Locked)
                    .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
                if let Err(e) = grabbed {
                    log::warn!("Failed to grab cursor: {}", e);
                }
                window.set_cursor_visible(false);
            }
            CursorMode::Normal => {
                if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
                    log::warn!("Failed to release cursor: {}", e);
                }
                window.set_cursor_visible(true);
            }
        }

        self.applied_cursor = self.requested_cursor;
    }
}

impl CameraInput for InputState {
    fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    fn is_look_button_down(&self) -> bool {
        self.look_button_down
    }

    fn is_key_down(&self, key: MoveKey) -> bool {
        self.keys_down.contains(&key)
    }

    fn set_cursor_mode(&mut self, mode: CursorMode) {
        self.requested_cursor = mode;
    }
}
