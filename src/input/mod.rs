use std::collections::{HashMap, HashSet};
use std::hash::Hash;
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

/// Represents a raw input source that can be bound to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Key(KeyCode),
    Mouse(MouseButton),
}

/// Raw hardware state for a single frame.
#[derive(Debug, Default)]
pub struct InputState {
    pub keys_held: HashSet<KeyCode>,
    pub keys_pressed: HashSet<KeyCode>,

    /// Cursor position in physical pixels, y-down.
    pub mouse_pos: [f32; 2],
    /// Previous frame's cursor position, for drag deltas.
    pub last_mouse_pos: [f32; 2],
    pub mouse_wheel: f32,
    pub mouse_held: HashSet<MouseButton>,
    pub mouse_pressed: HashSet<MouseButton>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_frame_state(&mut self) {
        self.keys_pressed.clear();
        self.mouse_pressed.clear();
        self.mouse_wheel = 0.0;
        self.last_mouse_pos = self.mouse_pos;
    }

    pub fn press_key(&mut self, key: KeyCode) {
        if self.keys_held.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    pub fn press_mouse(&mut self, button: MouseButton) {
        if self.mouse_held.insert(button) {
            self.mouse_pressed.insert(button);
        }
    }

    pub fn release_mouse(&mut self, button: MouseButton) {
        self.mouse_held.remove(&button);
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool { self.keys_held.contains(&key) }
    pub fn is_key_pressed(&self, key: KeyCode) -> bool { self.keys_pressed.contains(&key) }

    pub fn is_mouse_held(&self, button: MouseButton) -> bool { self.mouse_held.contains(&button) }
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool { self.mouse_pressed.contains(&button) }

    /// Cursor movement since the previous frame.
    pub fn mouse_delta(&self) -> [f32; 2] {
        [
            self.mouse_pos[0] - self.last_mouse_pos[0],
            self.mouse_pos[1] - self.last_mouse_pos[1],
        ]
    }
}

/// Maps logical actions to one or more physical inputs.
#[derive(Debug, Clone)]
pub struct ActionMap<A: Hash + Eq + Copy> {
    bindings: HashMap<A, Vec<InputSource>>,
}

impl<A: Hash + Eq + Copy> ActionMap<A> {
    pub fn new() -> Self {
        Self { bindings: HashMap::new() }
    }

    pub fn bind(&mut self, action: A, source: InputSource) {
        self.bindings.entry(action).or_default().push(source);
    }

    /// Returns true if the action was triggered this frame (pressed).
    pub fn is_pressed(&self, action: A, input: &InputState) -> bool {
        self.bindings.get(&action).is_some_and(|sources| {
            sources.iter().any(|s| match s {
                InputSource::Key(k) => input.is_key_pressed(*k),
                InputSource::Mouse(b) => input.is_mouse_pressed(*b),
            })
        })
    }

    /// Returns true if the action is currently being held.
    pub fn is_held(&self, action: A, input: &InputState) -> bool {
        self.bindings.get(&action).is_some_and(|sources| {
            sources.iter().any(|s| match s {
                InputSource::Key(k) => input.is_key_held(*k),
                InputSource::Mouse(b) => input.is_mouse_held(*b),
            })
        })
    }
}

impl<A: Hash + Eq + Copy> Default for ActionMap<A> {
    fn default() -> Self { Self::new() }
}

// ── Viewer actions ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerAction {
    PanUp,
    PanDown,
    PanLeft,
    PanRight,
    /// Pan by dragging the cursor.
    Drag,
    ZLevelUp,
    ZLevelDown,
    /// Drop every sprite and animation.
    ClearAll,
    /// Re-read the sprites file and redraw.
    Reload,
}

/// Arrow keys / WASD pan, middle mouse drags, PageUp/PageDown change z-level,
/// Delete clears, F5 reloads.
pub fn default_bindings() -> ActionMap<ViewerAction> {
    use InputSource::{Key, Mouse};
    let mut map = ActionMap::new();
    map.bind(ViewerAction::PanUp, Key(KeyCode::ArrowUp));
    map.bind(ViewerAction::PanUp, Key(KeyCode::KeyW));
    map.bind(ViewerAction::PanDown, Key(KeyCode::ArrowDown));
    map.bind(ViewerAction::PanDown, Key(KeyCode::KeyS));
    map.bind(ViewerAction::PanLeft, Key(KeyCode::ArrowLeft));
    map.bind(ViewerAction::PanLeft, Key(KeyCode::KeyA));
    map.bind(ViewerAction::PanRight, Key(KeyCode::ArrowRight));
    map.bind(ViewerAction::PanRight, Key(KeyCode::KeyD));
    map.bind(ViewerAction::Drag, Mouse(MouseButton::Middle));
    map.bind(ViewerAction::ZLevelUp, Key(KeyCode::PageUp));
    map.bind(ViewerAction::ZLevelDown, Key(KeyCode::PageDown));
    map.bind(ViewerAction::ClearAll, Key(KeyCode::Delete));
    map.bind(ViewerAction::Reload, Key(KeyCode::F5));
    map
}
