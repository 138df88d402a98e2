use super::events::ControlEvent;
use crate::types::EVENT_HISTORY_SIZE;
use heapless::Vec;

/// Bounded history of dispatched events. Only the newest one drives transitions.
#[derive(Debug, Clone, Default)]
pub struct EventBuffer {
    slots: Vec<ControlEvent, EVENT_HISTORY_SIZE>,
    last: Option<ControlEvent>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event`, dropping the oldest entry when full.
    pub fn push(&mut self, event: ControlEvent) {
        if self.slots.is_full() {
            self.slots.remove(0);
        }
        // Cannot fail: a slot was freed above when the buffer was full
        let _ = self.slots.push(event);
        self.last = Some(event);
    }

    pub fn last_event(&self) -> Option<ControlEvent> {
        self.last
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &ControlEvent> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.is_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::events::WorkflowState;

    #[test]
    fn test_fills_in_order() {
        let mut buffer = EventBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.last_event(), None);

        buffer.push(ControlEvent::Increment);
        buffer.push(ControlEvent::GroupTypeA);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.last_event(), Some(ControlEvent::GroupTypeA));
        assert_eq!(
            buffer.iter().copied().collect::<std::vec::Vec<_>>(),
            vec![ControlEvent::Increment, ControlEvent::GroupTypeA]
        );
    }

    #[test]
    fn test_full_buffer_drops_oldest() {
        let mut buffer = EventBuffer::new();
        let events = [
            ControlEvent::Increment,
            ControlEvent::GroupTypeA,
            ControlEvent::Tare,
            ControlEvent::SelectRaw,
            ControlEvent::Increment,
        ];
        for e in events {
            buffer.push(e);
        }
        assert!(buffer.is_full());

        let extra = ControlEvent::ReturnTo(WorkflowState::Raw);
        buffer.push(extra);
        assert_eq!(buffer.len(), EVENT_HISTORY_SIZE);
        assert_eq!(buffer.last_event(), Some(extra));
        let history: std::vec::Vec<_> = buffer.iter().copied().collect();
        assert_eq!(&history[..4], &events[1..]);
        assert_eq!(history[4], extra);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut buffer = EventBuffer::new();
        for i in 0..50 {
            let event = if i % 2 == 0 {
                ControlEvent::Increment
            } else {
                ControlEvent::Decrement
            };
            buffer.push(event);
            assert!(buffer.len() <= EVENT_HISTORY_SIZE);
            assert_eq!(buffer.last_event(), Some(event));
        }
    }
}
