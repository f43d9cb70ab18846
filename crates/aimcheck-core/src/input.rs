//! Input resolver: raw pointer/key events to game actions.
//!
//! Pure mapping with no knowledge of the entity pool. Whether an action
//! connects with anything is decided later by hit resolution.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Raw pointer click in viewport coordinates, with the host's optional
/// hit-test result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub position: Vec2,
    pub target: Option<EntityId>,
}

impl PointerEvent {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            target: None,
        }
    }

    pub fn on(id: EntityId, x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            target: Some(id),
        }
    }
}

/// Raw key transition using DOM `KeyboardEvent.code` names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub code: String,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn down(code: &str) -> Self {
        Self {
            code: code.to_string(),
            pressed: true,
        }
    }

    pub fn up(code: &str) -> Self {
        Self {
            code: code.to_string(),
            pressed: false,
        }
    }
}

/// Game action produced from one raw event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputAction {
    /// Fire at a point.
    Shoot(Vec2),
    /// Click a specific entity in the ordered-click challenge.
    OrderClick(EntityId),
    /// New movement direction from the held keys (zero = stop).
    Move(Vec2),
}

/// How pointer clicks are interpreted by the active challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerMode {
    /// Click position is a shot origin.
    Shoot,
    /// Click hit-test target is the clicked entity.
    OrderClick,
}

/// Keys the resolver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Fire,
}

impl Key {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ArrowUp" | "KeyW" => Some(Key::Up),
            "ArrowDown" | "KeyS" => Some(Key::Down),
            "ArrowLeft" | "KeyA" => Some(Key::Left),
            "ArrowRight" | "KeyD" => Some(Key::Right),
            "Space" => Some(Key::Fire),
            _ => None,
        }
    }
}

/// Held movement keys. The only state the resolver keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementKeys {
    /// Unit-length (or zero) direction for the held keys. +y points down the
    /// screen.
    pub fn direction(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| f32::from(u8::from(pos)) - f32::from(u8::from(neg));
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down)).normalize_or_zero()
    }

    fn set(&mut self, key: Key, pressed: bool) -> bool {
        let slot = match key {
            Key::Up => &mut self.up,
            Key::Down => &mut self.down,
            Key::Left => &mut self.left,
            Key::Right => &mut self.right,
            Key::Fire => return false,
        };
        let changed = *slot != pressed;
        *slot = pressed;
        changed
    }
}

/// Map a pointer click to an action.
///
/// A click without a hit-test target yields nothing in order-click mode, and
/// a non-finite position yields nothing in shoot mode.
pub fn resolve_pointer(event: &PointerEvent, mode: PointerMode) -> Option<InputAction> {
    match mode {
        PointerMode::Shoot => event
            .position
            .is_finite()
            .then_some(InputAction::Shoot(event.position)),
        PointerMode::OrderClick => event.target.map(InputAction::OrderClick),
    }
}

/// Map a key transition to an action, updating the held-key state.
///
/// Pressing fire shoots at `aim`; movement keys emit `Move` only when the
/// resulting direction changes (key repeat is swallowed).
pub fn resolve_key(keys: &mut MovementKeys, event: &KeyEvent, aim: Vec2) -> Option<InputAction> {
    let key = Key::from_code(&event.code)?;
    if key == Key::Fire {
        return (event.pressed && aim.is_finite()).then_some(InputAction::Shoot(aim));
    }
    let before = keys.direction();
    if !keys.set(key, event.pressed) {
        return None;
    }
    let after = keys.direction();
    (after != before).then_some(InputAction::Move(after))
}
