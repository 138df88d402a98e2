//! Button ids to control events

use crate::workflow::events::ControlEvent;
use embassy_time::{Duration, Instant};
use log::{debug, warn};

pub const MATRIX_BUTTONS: u8 = 20;
pub const MAX_PRESSES_PER_SCAN: usize = 8;

/// Edges found by one keypad scan.
pub type ScanPresses = heapless::Vec<ButtonPress, MAX_PRESSES_PER_SCAN>;

/// Adds a press to the scan result, logging it if the scan is already full.
pub fn record_press(presses: &mut ScanPresses, press: ButtonPress) {
    if let Err(dropped) = presses.push(press) {
        warn!("🔘 Too many presses in one scan, dropping {:?}", dropped);
    }
}

/// Front keypad, ids 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeypadButton {
    Raw,
    Cooked,
    AddDish,
    DeleteDish,
    Save,
}

impl KeypadButton {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Raw),
            2 => Some(Self::Cooked),
            3 => Some(Self::AddDish),
            4 => Some(Self::DeleteDish),
            5 => Some(Self::Save),
            _ => None,
        }
    }

    pub fn event(self) -> ControlEvent {
        match self {
            Self::Raw => ControlEvent::SelectRaw,
            Self::Cooked => ControlEvent::SelectCooked,
            Self::AddDish => ControlEvent::AddDish,
            Self::DeleteDish => ControlEvent::DeleteDish,
            Self::Save => ControlEvent::SaveMeal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonPress {
    Keypad(KeypadButton),
    /// Food-group matrix, ids 1 to 20; the id is the raw group id.
    Matrix(u8),
}

impl ButtonPress {
    pub fn keypad(id: u8) -> Option<Self> {
        KeypadButton::from_id(id).map(Self::Keypad)
    }

    pub fn matrix(id: u8) -> Option<Self> {
        (1..=MATRIX_BUTTONS).contains(&id).then_some(Self::Matrix(id))
    }

    pub fn event(self) -> ControlEvent {
        match self {
            Self::Keypad(button) => button.event(),
            Self::Matrix(id) if needs_processing(id) => ControlEvent::GroupTypeA,
            Self::Matrix(_) => ControlEvent::GroupTypeB,
        }
    }

    pub fn group_id(self) -> Option<u8> {
        match self {
            Self::Matrix(id) => Some(id),
            Self::Keypad(_) => None,
        }
    }
}

/// Groups whose nutrition changes with cooking (type A): 7 to 9 and 16 to 18.
pub fn needs_processing(group_id: u8) -> bool {
    matches!(group_id, 7..=9 | 16..=18)
}

/// Drops presses that arrive within the window after the last accepted one.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    pub fn accept(&mut self, press: ButtonPress, now: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.window {
                debug!("🔘 Debounced {:?}", press);
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypad_mapping() {
        let events: Vec<_> = (1..=5)
            .map(|id| ButtonPress::keypad(id).unwrap().event())
            .collect();
        assert_eq!(
            events,
            vec![
                ControlEvent::SelectRaw,
                ControlEvent::SelectCooked,
                ControlEvent::AddDish,
                ControlEvent::DeleteDish,
                ControlEvent::SaveMeal,
            ]
        );
        assert_eq!(ButtonPress::keypad(0), None);
        assert_eq!(ButtonPress::keypad(6), None);
    }

    #[test]
    fn test_matrix_group_types() {
        for id in 1..=MATRIX_BUTTONS {
            let press = ButtonPress::matrix(id).unwrap();
            let expected = if [7, 8, 9, 16, 17, 18].contains(&id) {
                ControlEvent::GroupTypeA
            } else {
                ControlEvent::GroupTypeB
            };
            assert_eq!(press.event(), expected, "button {}", id);
            assert_eq!(press.group_id(), Some(id));
        }
        assert_eq!(ButtonPress::matrix(0), None);
        assert_eq!(ButtonPress::matrix(21), None);
    }

    #[test]
    fn test_debounce_window() {
        let mut debouncer = Debouncer::new(Duration::from_millis(200));
        let press = ButtonPress::Matrix(3);
        let t0 = Instant::from_millis(10_000);

        assert!(debouncer.accept(press, t0));
        assert!(!debouncer.accept(press, t0 + Duration::from_millis(120)));
        assert!(!debouncer.accept(ButtonPress::Keypad(KeypadButton::Save), t0 + Duration::from_millis(199)));
        assert!(debouncer.accept(press, t0 + Duration::from_millis(200)));
    }

    #[test]
    fn test_scan_overflow_keeps_first_presses() {
        let mut presses = ScanPresses::new();
        for id in 1..=(MAX_PRESSES_PER_SCAN as u8 + 3) {
            record_press(&mut presses, ButtonPress::Matrix(id));
        }
        assert_eq!(presses.len(), MAX_PRESSES_PER_SCAN);
        assert_eq!(presses.first(), Some(&ButtonPress::Matrix(1)));
        assert_eq!(presses.last(), Some(&ButtonPress::Matrix(MAX_PRESSES_PER_SCAN as u8)));
    }
}
