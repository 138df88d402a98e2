//! Meal-assembly workflow: states, transition table, supervisor and engine

pub mod buffer;
pub mod engine;
pub mod events;
pub mod rules;
pub mod supervisor;

pub use buffer::EventBuffer;
pub use engine::{EngineContext, ErrorReport, Outputs, WorkflowEngine};
pub use events::{Action, ControlEvent, ErrorHint, Input, Output, Screen, WorkflowState};
pub use rules::{TransitionRule, TransitionTable, TRANSITIONS};
pub use supervisor::Dwell;
