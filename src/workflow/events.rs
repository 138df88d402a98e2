//! Workflow states, control events, and the engine's inputs and outputs

use crate::input::buttons::ButtonPress;
use crate::nutrition::{FoodGroup, NutritionTotals};
use crate::scales::ScaleEvent;
use crate::storage::MealRecord;
use crate::types::Processing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    /// No container on the scale
    Empty,
    /// Container placed, no group chosen
    DishPending,
    GroupA,
    GroupB,
    Raw,
    Cooked,
    /// Food on the scale
    Weighted,
    AddCheck,
    DeleteCheck,
    SaveCheck,
    Added,
    Deleted,
    Saved,
    Error,
    Cancel,
    Warning,
    DeleteLedgerCheck,
    DeleteLedgerDone,
}

impl WorkflowState {
    pub const ALL: [WorkflowState; 18] = [
        WorkflowState::Empty,
        WorkflowState::DishPending,
        WorkflowState::GroupA,
        WorkflowState::GroupB,
        WorkflowState::Raw,
        WorkflowState::Cooked,
        WorkflowState::Weighted,
        WorkflowState::AddCheck,
        WorkflowState::DeleteCheck,
        WorkflowState::SaveCheck,
        WorkflowState::Added,
        WorkflowState::Deleted,
        WorkflowState::Saved,
        WorkflowState::Error,
        WorkflowState::Cancel,
        WorkflowState::Warning,
        WorkflowState::DeleteLedgerCheck,
        WorkflowState::DeleteLedgerDone,
    ];

    /// States a confirmable action or a recovery return may originate from.
    pub fn is_anchor(self) -> bool {
        matches!(
            self,
            WorkflowState::Empty | WorkflowState::Raw | WorkflowState::Cooked | WorkflowState::Weighted
        )
    }

    pub fn is_group(self) -> bool {
        matches!(self, WorkflowState::GroupA | WorkflowState::GroupB)
    }

    pub fn is_confirmation(self) -> bool {
        matches!(
            self,
            WorkflowState::AddCheck | WorkflowState::DeleteCheck | WorkflowState::SaveCheck
        )
    }

    /// Unmatched events are dropped here instead of raising a new error.
    pub fn ignores_unmatched(self) -> bool {
        matches!(
            self,
            WorkflowState::Error | WorkflowState::DeleteLedgerCheck | WorkflowState::DeleteLedgerDone
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlEvent {
    // Buttons
    GroupTypeA,
    GroupTypeB,
    SelectRaw,
    SelectCooked,
    AddDish,
    DeleteDish,
    SaveMeal,

    // Scale
    Increment,
    Decrement,
    Tare,
    PartialRemove,
    Release,

    // Synthesized
    IllegalAction,
    CancelRequested,
    WarningRaised,
    ReturnTo(WorkflowState),
    ResetLedger,
}

impl ControlEvent {
    /// Every event that does not carry a payload.
    pub const SIMPLE: [ControlEvent; 16] = [
        ControlEvent::GroupTypeA,
        ControlEvent::GroupTypeB,
        ControlEvent::SelectRaw,
        ControlEvent::SelectCooked,
        ControlEvent::AddDish,
        ControlEvent::DeleteDish,
        ControlEvent::SaveMeal,
        ControlEvent::Increment,
        ControlEvent::Decrement,
        ControlEvent::Tare,
        ControlEvent::PartialRemove,
        ControlEvent::Release,
        ControlEvent::IllegalAction,
        ControlEvent::CancelRequested,
        ControlEvent::WarningRaised,
        ControlEvent::ResetLedger,
    ];

    pub fn is_button(self) -> bool {
        matches!(
            self,
            ControlEvent::GroupTypeA
                | ControlEvent::GroupTypeB
                | ControlEvent::SelectRaw
                | ControlEvent::SelectCooked
                | ControlEvent::AddDish
                | ControlEvent::DeleteDish
                | ControlEvent::SaveMeal
        )
    }

    pub fn is_scale(self) -> bool {
        matches!(
            self,
            ControlEvent::Increment
                | ControlEvent::Decrement
                | ControlEvent::Tare
                | ControlEvent::PartialRemove
                | ControlEvent::Release
        )
    }
}

impl From<ScaleEvent> for ControlEvent {
    fn from(event: ScaleEvent) -> Self {
        match event {
            ScaleEvent::Increment => ControlEvent::Increment,
            ScaleEvent::Decrement => ControlEvent::Decrement,
            ScaleEvent::Tare => ControlEvent::Tare,
            ScaleEvent::PartialRemove => ControlEvent::PartialRemove,
            ScaleEvent::Release => ControlEvent::Release,
        }
    }
}

/// What the main loop feeds the engine.
#[derive(Debug, Clone, Copy)]
pub enum Input {
    /// Gross weight from the sampling tick
    Sample(f32),
    Button(ButtonPress),
    /// Periodic tick so timers can fire without other input
    Tick,
}

/// Confirmable user actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AddDish,
    DeleteDish,
    SaveMeal,
}

/// Why the error screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorHint {
    PlaceContainer,
    ChooseGroup,
    ChooseProcessing,
    /// Weight was placed before raw/cooked was chosen; held until it is lifted.
    RemoveUnprocessedFood,
    RemoveDish,
    Generic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Dashboard {
        last_meal: NutritionTotals,
        last_meal_dishes: u32,
        day: NutritionTotals,
        meals_today: u32,
        just_saved: bool,
    },
    ChooseGroup {
        container_g: f32,
    },
    GroupExamples {
        group: &'static FoodGroup,
        needs_processing: bool,
    },
    ProcessingChosen {
        group: &'static FoodGroup,
        processing: Processing,
    },
    Weighing {
        group: &'static FoodGroup,
        item: NutritionTotals,
        dish: NutritionTotals,
        meal: NutritionTotals,
    },
    Confirm(Action),
    ActionDone {
        action: Action,
        meal: NutritionTotals,
        dishes: u32,
    },
    Error(ErrorHint),
    Cancelled,
    Warning(Action),
    LedgerResetConfirm,
    LedgerResetDone,
    StorageFailure {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    StateChanged {
        from: WorkflowState,
        to: WorkflowState,
    },
    Render(Screen),
    MealSaved(MealRecord),
    LedgerCleared,
}
