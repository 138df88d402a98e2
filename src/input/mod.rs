pub mod buttons;
#[cfg(target_os = "espidf")]
pub mod keypad;
pub mod signals;

pub use buttons::{ButtonPress, Debouncer, KeypadButton};
pub use signals::InputSignals;
