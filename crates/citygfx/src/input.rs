use crate::geometry::Point;

/// Platform-neutral input delivered to the active layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Mouse(MouseEvent),
    Keyboard(KeyboardEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Moved,
    LeftPressed,
    LeftReleased,
    RightPressed,
    RightReleased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    /// Cursor position in window pixels.
    pub pos: Point,
    /// Left button state at the time of the event.
    pub left_held: bool,
}

impl MouseEvent {
    pub const fn new(kind: MouseEventKind, pos: Point, left_held: bool) -> Self {
        Self {
            kind,
            pos,
            left_held,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Escape,
    Character(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub key: Key,
    pub pressed: bool,
    pub shift: bool,
}

impl KeyboardEvent {
    pub const fn new(key: Key, pressed: bool, shift: bool) -> Self {
        Self {
            key,
            pressed,
            shift,
        }
    }
}

impl InputEvent {
    pub const fn mouse(kind: MouseEventKind, pos: Point, left_held: bool) -> Self {
        InputEvent::Mouse(MouseEvent::new(kind, pos, left_held))
    }

    pub const fn key(key: Key, pressed: bool, shift: bool) -> Self {
        InputEvent::Keyboard(KeyboardEvent::new(key, pressed, shift))
    }
}
