use std::collections::VecDeque;

use crate::geometry::TilePos;

/// Requests a layer sends to the rest of the game. Layers never wait on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEvent {
    ClearLand { pos: TilePos },
}

#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    /// Removes and returns every queued event in dispatch order.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_events_in_dispatch_order_and_empties_queue() {
        let mut queue = EventQueue::new();
        queue.dispatch(GameEvent::ClearLand {
            pos: TilePos::new(2, 0),
        });
        queue.dispatch(GameEvent::ClearLand {
            pos: TilePos::new(0, 1),
        });
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert_eq!(
            drained,
            vec![
                GameEvent::ClearLand {
                    pos: TilePos::new(2, 0)
                },
                GameEvent::ClearLand {
                    pos: TilePos::new(0, 1)
                },
            ]
        );
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }
}
