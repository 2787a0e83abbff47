use winit::event::{ElementState, MouseButton};
use winit::keyboard::{Key as LogicalKey, KeyCode, ModifiersState, PhysicalKey};

use crate::geometry::Point;
use crate::input::{InputEvent, Key, MouseEventKind};

/// Turns winit window events into [`InputEvent`]s, tracking the cursor,
/// left-button and shift state the layers need.
#[derive(Debug, Default)]
pub(crate) struct InputCollector {
    cursor_px: Point,
    left_mouse_is_down: bool,
    shift_is_down: bool,
}

impl InputCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_modifiers(&mut self, modifiers: ModifiersState) {
        self.shift_is_down = modifiers.shift_key();
    }

    pub(crate) fn handle_cursor_moved(&mut self, x: f64, y: f64) -> InputEvent {
        self.cursor_px = Point::new(x.round() as i32, y.round() as i32);
        InputEvent::mouse(MouseEventKind::Moved, self.cursor_px, self.left_mouse_is_down)
    }

    pub(crate) fn handle_mouse_input(
        &mut self,
        button: MouseButton,
        state: ElementState,
    ) -> Option<InputEvent> {
        let kind = match (button, state) {
            (MouseButton::Left, ElementState::Pressed) => {
                self.left_mouse_is_down = true;
                MouseEventKind::LeftPressed
            }
            (MouseButton::Left, ElementState::Released) => {
                self.left_mouse_is_down = false;
                MouseEventKind::LeftReleased
            }
            (MouseButton::Right, ElementState::Pressed) => MouseEventKind::RightPressed,
            (MouseButton::Right, ElementState::Released) => MouseEventKind::RightReleased,
            _ => return None,
        };
        Some(InputEvent::mouse(kind, self.cursor_px, self.left_mouse_is_down))
    }

    pub(crate) fn handle_key(
        &mut self,
        physical: PhysicalKey,
        logical: &LogicalKey,
        state: ElementState,
    ) -> Option<InputEvent> {
        let key = key_from_winit(physical, logical);
        if key == Key::Other {
            return None;
        }
        Some(InputEvent::key(
            key,
            state == ElementState::Pressed,
            self.shift_is_down,
        ))
    }
}

fn key_from_winit(physical: PhysicalKey, logical: &LogicalKey) -> Key {
    match physical {
        PhysicalKey::Code(KeyCode::ArrowUp) => return Key::ArrowUp,
        PhysicalKey::Code(KeyCode::ArrowDown) => return Key::ArrowDown,
        PhysicalKey::Code(KeyCode::ArrowLeft) => return Key::ArrowLeft,
        PhysicalKey::Code(KeyCode::ArrowRight) => return Key::ArrowRight,
        PhysicalKey::Code(KeyCode::Escape) => return Key::Escape,
        _ => {}
    }
    match logical {
        LogicalKey::Character(text) => text
            .chars()
            .next()
            .map(|c| Key::Character(c.to_ascii_lowercase()))
            .unwrap_or(Key::Other),
        _ => Key::Other,
    }
}

#[cfg(test)]
mod tests {
    use winit::keyboard::NamedKey;

    use super::*;
    use crate::input::KeyboardEvent;

    #[test]
    fn arrow_keys_map_by_physical_code() {
        let mut input = InputCollector::new();
        let event = input.handle_key(
            PhysicalKey::Code(KeyCode::ArrowLeft),
            &LogicalKey::Named(NamedKey::ArrowLeft),
            ElementState::Pressed,
        );
        assert_eq!(event, Some(InputEvent::key(Key::ArrowLeft, true, false)));
    }

    #[test]
    fn shift_modifier_is_carried_on_key_events() {
        let mut input = InputCollector::new();
        input.set_modifiers(ModifiersState::SHIFT);
        let event = input.handle_key(
            PhysicalKey::Code(KeyCode::ArrowUp),
            &LogicalKey::Named(NamedKey::ArrowUp),
            ElementState::Released,
        );
        assert_eq!(
            event,
            Some(InputEvent::Keyboard(KeyboardEvent::new(Key::ArrowUp, false, true)))
        );
    }

    #[test]
    fn characters_are_lowercased_and_unknown_keys_dropped() {
        let mut input = InputCollector::new();
        let d = input.handle_key(
            PhysicalKey::Code(KeyCode::KeyD),
            &LogicalKey::Character("D".into()),
            ElementState::Pressed,
        );
        assert_eq!(d, Some(InputEvent::key(Key::Character('d'), true, false)));

        let f1 = input.handle_key(
            PhysicalKey::Code(KeyCode::F1),
            &LogicalKey::Named(NamedKey::F1),
            ElementState::Pressed,
        );
        assert_eq!(f1, None);
    }

    #[test]
    fn mouse_events_carry_cursor_and_left_button_state() {
        let mut input = InputCollector::new();
        let moved = input.handle_cursor_moved(120.4, 80.6);
        assert_eq!(
            moved,
            InputEvent::mouse(MouseEventKind::Moved, Point::new(120, 81), false)
        );

        let pressed = input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        assert_eq!(
            pressed,
            Some(InputEvent::mouse(MouseEventKind::LeftPressed, Point::new(120, 81), true))
        );
        let dragged = input.handle_cursor_moved(140.0, 80.0);
        assert_eq!(
            dragged,
            InputEvent::mouse(MouseEventKind::Moved, Point::new(140, 80), true)
        );
        let released = input.handle_mouse_input(MouseButton::Left, ElementState::Released);
        assert_eq!(
            released,
            Some(InputEvent::mouse(MouseEventKind::LeftReleased, Point::new(140, 80), false))
        );
        assert_eq!(
            input.handle_mouse_input(MouseButton::Middle, ElementState::Pressed),
            None
        );
    }
}
