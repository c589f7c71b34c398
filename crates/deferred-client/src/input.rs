use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// What a key press does to the running demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    TogglePause,
    ToggleRenderMode,
    MoreLights,
    FewerLights,
    Quit,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Self::TogglePause,
        Self::ToggleRenderMode,
        Self::MoreLights,
        Self::FewerLights,
        Self::Quit,
    ];
}

/// Key names per action, as written in the `bindings` config section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct InputBindings {
    pub actions: HashMap<Action, Vec<String>>,
}

impl Default for InputBindings {
    fn default() -> Self {
        let mut actions = HashMap::new();
        actions.insert(Action::TogglePause, vec!["Space".into()]);
        actions.insert(Action::ToggleRenderMode, vec!["M".into()]);
        actions.insert(Action::MoreLights, vec!["ArrowUp".into()]);
        actions.insert(Action::FewerLights, vec!["ArrowDown".into()]);
        actions.insert(Action::Quit, vec!["Escape".into()]);
        Self { actions }
    }
}

impl InputBindings {
    /// Key names that do not map to a known key.
    pub fn unknown_keys(&self) -> Vec<String> {
        let mut unknown: Vec<String> = self
            .actions
            .values()
            .flatten()
            .filter(|name| key_name_to_code(name).is_none())
            .cloned()
            .collect();
        unknown.sort();
        unknown
    }

    /// Fill in defaults for actions the config leaves unbound.
    pub fn with_defaults(mut self) -> Self {
        for (action, keys) in InputBindings::default().actions {
            self.actions.entry(action).or_insert(keys);
        }
        self
    }
}

/// Maps key name strings to winit KeyCode.
pub fn key_name_to_code(name: &str) -> Option<KeyCode> {
    match name {
        "A" => Some(KeyCode::KeyA),
        "B" => Some(KeyCode::KeyB),
        "C" => Some(KeyCode::KeyC),
        "D" => Some(KeyCode::KeyD),
        "E" => Some(KeyCode::KeyE),
        "F" => Some(KeyCode::KeyF),
        "G" => Some(KeyCode::KeyG),
        "H" => Some(KeyCode::KeyH),
        "I" => Some(KeyCode::KeyI),
        "J" => Some(KeyCode::KeyJ),
        "K" => Some(KeyCode::KeyK),
        "L" => Some(KeyCode::KeyL),
        "M" => Some(KeyCode::KeyM),
        "N" => Some(KeyCode::KeyN),
        "O" => Some(KeyCode::KeyO),
        "P" => Some(KeyCode::KeyP),
        "Q" => Some(KeyCode::KeyQ),
        "R" => Some(KeyCode::KeyR),
        "S" => Some(KeyCode::KeyS),
        "T" => Some(KeyCode::KeyT),
        "U" => Some(KeyCode::KeyU),
        "V" => Some(KeyCode::KeyV),
        "W" => Some(KeyCode::KeyW),
        "X" => Some(KeyCode::KeyX),
        "Y" => Some(KeyCode::KeyY),
        "Z" => Some(KeyCode::KeyZ),
        "Digit0" | "0" => Some(KeyCode::Digit0),
        "Digit1" | "1" => Some(KeyCode::Digit1),
        "Digit2" | "2" => Some(KeyCode::Digit2),
        "Digit3" | "3" => Some(KeyCode::Digit3),
        "Minus" | "-" => Some(KeyCode::Minus),
        "Equal" | "=" => Some(KeyCode::Equal),
        "Space" => Some(KeyCode::Space),
        "Escape" => Some(KeyCode::Escape),
        "Enter" => Some(KeyCode::Enter),
        "Tab" => Some(KeyCode::Tab),
        "PageUp" => Some(KeyCode::PageUp),
        "PageDown" => Some(KeyCode::PageDown),
        "ArrowUp" => Some(KeyCode::ArrowUp),
        "ArrowDown" => Some(KeyCode::ArrowDown),
        "ArrowLeft" => Some(KeyCode::ArrowLeft),
        "ArrowRight" => Some(KeyCode::ArrowRight),
        _ => None,
    }
}

/// Resolved key bindings plus the keys currently held.
pub struct InputState {
    key_actions: HashMap<KeyCode, Action>,
    keys_held: HashSet<KeyCode>,
    pending: Vec<Action>,
}

impl InputState {
    pub fn new(bindings: &InputBindings) -> Self {
        let mut key_actions = HashMap::new();
        for (action, keys) in &bindings.actions {
            for name in keys {
                match key_name_to_code(name) {
                    Some(code) => {
                        key_actions.insert(code, *action);
                    }
                    None => tracing::warn!("Unknown key '{}' bound to {:?}", name, action),
                }
            }
        }
        Self {
            key_actions,
            keys_held: HashSet::new(),
            pending: Vec::new(),
        }
    }

    /// Process a winit WindowEvent. Actions fire on the initial press only.
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if let PhysicalKey::Code(key_code) = event.physical_key {
                self.handle_key(key_code, event.state);
            }
        }
    }

    fn handle_key(&mut self, key_code: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.keys_held.insert(key_code) {
                    if let Some(action) = self.key_actions.get(&key_code) {
                        self.pending.push(*action);
                    }
                }
            }
            ElementState::Released => {
                self.keys_held.remove(&key_code);
            }
        }
    }

    /// Actions triggered since the last call, in press order.
    pub fn drain_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending)
    }
}
