pub use winit::keyboard::KeyCode;

/// Keys the viewer reacts to. Anything else is ignored.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TrackedKey {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
    Fast,
    Slow,
    MoreLights,
    FewerLights,
}

impl TrackedKey {
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        Some(match code {
            KeyCode::KeyW => Self::Forward,
            KeyCode::KeyS => Self::Backward,
            KeyCode::KeyA => Self::Left,
            KeyCode::KeyD => Self::Right,
            KeyCode::KeyE => Self::Up,
            KeyCode::KeyQ => Self::Down,
            KeyCode::ShiftLeft | KeyCode::ShiftRight => Self::Fast,
            KeyCode::AltLeft | KeyCode::AltRight => Self::Slow,
            KeyCode::Equal | KeyCode::NumpadAdd => Self::MoreLights,
            KeyCode::Minus | KeyCode::NumpadSubtract => Self::FewerLights,
            _ => return None,
        })
    }

    pub fn flag(self) -> KeySet {
        match self {
            Self::Forward => KeySet::FORWARD,
            Self::Backward => KeySet::BACKWARD,
            Self::Left => KeySet::LEFT,
            Self::Right => KeySet::RIGHT,
            Self::Up => KeySet::UP,
            Self::Down => KeySet::DOWN,
            Self::Fast => KeySet::FAST,
            Self::Slow => KeySet::SLOW,
            Self::MoreLights => KeySet::MORE_LIGHTS,
            Self::FewerLights => KeySet::FEWER_LIGHTS,
        }
    }
}

bitflags::bitflags! {
    /// Held state of every [`TrackedKey`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct KeySet: u16 {
        const FORWARD      = 1 << 0;
        const BACKWARD     = 1 << 1;
        const LEFT         = 1 << 2;
        const RIGHT        = 1 << 3;
        const UP           = 1 << 4;
        const DOWN         = 1 << 5;
        const FAST         = 1 << 6;
        const SLOW         = 1 << 7;
        const MORE_LIGHTS  = 1 << 8;
        const FEWER_LIGHTS = 1 << 9;
    }
}

impl KeySet {
    pub fn is_pressed(&self, key: TrackedKey) -> bool {
        self.contains(key.flag())
    }

    pub fn press(&mut self, key: TrackedKey) {
        self.insert(key.flag());
    }

    pub fn release(&mut self, key: TrackedKey) {
        self.remove(key.flag());
    }

    /// Forget everything, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        *self = KeySet::empty();
    }
}
