//! Error / Cancel / Warning supervision
//!
//! Every transient screen and confirmation timeout is a [`Dwell`]: a deadline (or none,
//! when held), the event to synthesize on expiry, and optionally the origin whose
//! legitimate input is honoured while the screen is showing.

use super::events::{ControlEvent, ErrorHint, WorkflowState};
use embassy_time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dwell {
    deadline: Option<Instant>,
    on_expiry: ControlEvent,
    honor_from: Option<WorkflowState>,
    held: bool,
}

impl Dwell {
    /// Fires `on_expiry` once `length` has passed since `now`.
    pub fn timed(now: Instant, length: Duration, on_expiry: ControlEvent) -> Self {
        Self {
            deadline: Some(now + length),
            on_expiry,
            honor_from: None,
            held: false,
        }
    }

    /// Error screen for an illegal action that happened in `origin`.
    pub fn error(now: Instant, length: Duration, origin: WorkflowState, held: bool) -> Self {
        Self {
            deadline: if held { None } else { Some(now + length) },
            on_expiry: ControlEvent::ReturnTo(origin),
            honor_from: Some(origin),
            held,
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn on_expiry(&self) -> ControlEvent {
        self.on_expiry
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    /// The synthetic return to dispatch instead of `event`, if `event` is meaningful
    /// for the state this dwell is guarding.
    pub fn honor(&self, event: ControlEvent) -> Option<ControlEvent> {
        let origin = self.honor_from?;
        let target = if self.held {
            held_target(origin, event)
        } else {
            allowed_target(origin, event)
        }?;
        Some(ControlEvent::ReturnTo(target))
    }
}

/// Where a legitimate event arriving during an error screen should lead, per origin.
pub fn allowed_target(origin: WorkflowState, event: ControlEvent) -> Option<WorkflowState> {
    use ControlEvent as E;
    use WorkflowState as S;

    let group_choice = |event| match event {
        E::GroupTypeA => Some(S::GroupA),
        E::GroupTypeB => Some(S::GroupB),
        _ => None,
    };
    let processing_choice = |event| match event {
        E::SelectRaw => Some(S::Raw),
        E::SelectCooked => Some(S::Cooked),
        _ => None,
    };
    let confirmable = |event| match event {
        E::AddDish => Some(S::AddCheck),
        E::DeleteDish => Some(S::DeleteCheck),
        E::SaveMeal => Some(S::SaveCheck),
        _ => None,
    };

    match origin {
        S::Empty => match event {
            E::Increment => Some(S::DishPending),
            E::SaveMeal => Some(S::SaveCheck),
            _ => None,
        },
        S::DishPending => match event {
            E::Increment | E::Decrement => Some(S::DishPending),
            E::Release => Some(S::Empty),
            _ => group_choice(event),
        },
        S::GroupA | S::GroupB => match event {
            E::Decrement | E::PartialRemove => Some(origin),
            E::Release => Some(S::Empty),
            _ => group_choice(event).or_else(|| processing_choice(event)),
        },
        S::Raw | S::Cooked => match event {
            E::Increment => Some(S::Weighted),
            E::Release => Some(S::Empty),
            _ => group_choice(event)
                .or_else(|| processing_choice(event))
                .or_else(|| confirmable(event)),
        },
        S::Weighted => match event {
            E::Increment | E::Decrement | E::PartialRemove => Some(S::Weighted),
            E::Release => Some(S::Empty),
            _ => group_choice(event).or_else(|| confirmable(event)),
        },
        S::AddCheck | S::DeleteCheck | S::SaveCheck => {
            let confirm = match origin {
                S::AddCheck => (E::AddDish, S::Added),
                S::DeleteCheck => (E::DeleteDish, S::Deleted),
                _ => (E::SaveMeal, S::Saved),
            };
            if event == confirm.0 {
                Some(confirm.1)
            } else if event.is_button() {
                Some(S::Cancel)
            } else {
                None
            }
        }
        S::Added | S::Deleted | S::Saved => match event {
            E::Increment | E::PartialRemove => Some(origin),
            E::Release => Some(S::Empty),
            _ => None,
        },
        S::Error | S::Cancel | S::Warning | S::DeleteLedgerCheck | S::DeleteLedgerDone => None,
    }
}

/// A held error only clears once the offending weight is lifted again.
fn held_target(origin: WorkflowState, event: ControlEvent) -> Option<WorkflowState> {
    match event {
        ControlEvent::Decrement | ControlEvent::PartialRemove => Some(origin),
        ControlEvent::Release => Some(WorkflowState::Empty),
        _ => None,
    }
}

/// Recovery screens are not valid return targets; fall back to the anchor.
pub fn error_origin(previous: WorkflowState, anchor: WorkflowState) -> WorkflowState {
    match previous {
        WorkflowState::Cancel | WorkflowState::Warning => anchor,
        other => other,
    }
}

/// Weight placed in a group state means raw/cooked was skipped.
pub fn is_held_error(origin: WorkflowState, event: ControlEvent) -> bool {
    origin.is_group() && event == ControlEvent::Increment
}

pub fn error_hint(origin: WorkflowState, event: ControlEvent) -> ErrorHint {
    use WorkflowState as S;
    match origin {
        S::Empty => ErrorHint::PlaceContainer,
        S::DishPending => ErrorHint::ChooseGroup,
        S::GroupA | S::GroupB if event == ControlEvent::Increment => ErrorHint::RemoveUnprocessedFood,
        S::GroupA | S::GroupB => ErrorHint::ChooseProcessing,
        S::Added | S::Deleted | S::Saved => ErrorHint::RemoveDish,
        _ => ErrorHint::Generic,
    }
}

/// After a warning: back to Empty, or to the group the user was working in.
pub fn warning_return(anchor: WorkflowState, last_group: Option<WorkflowState>) -> WorkflowState {
    match anchor {
        WorkflowState::Empty => WorkflowState::Empty,
        _ => last_group.unwrap_or(WorkflowState::Empty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ControlEvent as E;
    use WorkflowState as S;

    fn t0() -> Instant {
        Instant::from_millis(1_000)
    }

    #[test]
    fn test_timed_dwell_expires_at_deadline() {
        let dwell = Dwell::timed(t0(), Duration::from_millis(3_000), E::ReturnTo(S::Raw));
        assert!(!dwell.is_expired(t0() + Duration::from_millis(2_999)));
        assert!(dwell.is_expired(t0() + Duration::from_millis(3_000)));
        assert_eq!(dwell.on_expiry(), E::ReturnTo(S::Raw));
        assert_eq!(dwell.honor(E::SelectRaw), None);
    }

    #[test]
    fn test_held_error_never_expires() {
        let dwell = Dwell::error(t0(), Duration::from_millis(3_000), S::GroupA, true);
        assert!(dwell.is_held());
        assert!(!dwell.is_expired(t0() + Duration::from_secs(3_600)));
        assert_eq!(dwell.honor(E::SelectRaw), None);
        assert_eq!(dwell.honor(E::PartialRemove), Some(E::ReturnTo(S::GroupA)));
        assert_eq!(dwell.honor(E::Release), Some(E::ReturnTo(S::Empty)));
    }

    #[test]
    fn test_group_origin_allow_list() {
        let dwell = Dwell::error(t0(), Duration::from_millis(3_000), S::GroupA, false);
        assert_eq!(dwell.honor(E::GroupTypeA), Some(E::ReturnTo(S::GroupA)));
        assert_eq!(dwell.honor(E::GroupTypeB), Some(E::ReturnTo(S::GroupB)));
        assert_eq!(dwell.honor(E::SelectRaw), Some(E::ReturnTo(S::Raw)));
        assert_eq!(dwell.honor(E::SelectCooked), Some(E::ReturnTo(S::Cooked)));
        assert_eq!(dwell.honor(E::Release), Some(E::ReturnTo(S::Empty)));
        assert_eq!(dwell.honor(E::AddDish), None);
        assert_eq!(dwell.honor(E::SaveMeal), None);
    }

    #[test]
    fn test_confirmation_origin_allow_list() {
        assert_eq!(allowed_target(S::SaveCheck, E::SaveMeal), Some(S::Saved));
        assert_eq!(allowed_target(S::SaveCheck, E::AddDish), Some(S::Cancel));
        assert_eq!(allowed_target(S::AddCheck, E::AddDish), Some(S::Added));
        assert_eq!(allowed_target(S::DeleteCheck, E::GroupTypeB), Some(S::Cancel));
        assert_eq!(allowed_target(S::DeleteCheck, E::Increment), None);
    }

    #[test]
    fn test_allowed_targets_are_real_transitions() {
        use crate::system::config::ProcessingPolicy;
        use crate::workflow::rules::TransitionTable;

        let table = TransitionTable::new(ProcessingPolicy::Required);
        for origin in S::ALL {
            for event in E::SIMPLE {
                if let Some(target) = allowed_target(origin, event) {
                    assert_eq!(
                        table.lookup(S::Error, E::ReturnTo(target)),
                        Some(target),
                        "{:?} + {:?} -> {:?}",
                        origin,
                        event,
                        target
                    );
                }
            }
        }
    }

    #[test]
    fn test_error_origin_skips_recovery_screens() {
        assert_eq!(error_origin(S::Cancel, S::Raw), S::Raw);
        assert_eq!(error_origin(S::Warning, S::Empty), S::Empty);
        assert_eq!(error_origin(S::DishPending, S::Empty), S::DishPending);
    }

    #[test]
    fn test_warning_return() {
        assert_eq!(warning_return(S::Empty, Some(S::GroupB)), S::Empty);
        assert_eq!(warning_return(S::Weighted, Some(S::GroupB)), S::GroupB);
        assert_eq!(warning_return(S::Raw, Some(S::GroupA)), S::GroupA);
        assert_eq!(warning_return(S::Cooked, None), S::Empty);
    }

    #[test]
    fn test_hints() {
        assert!(is_held_error(S::GroupB, E::Increment));
        assert!(!is_held_error(S::Raw, E::Increment));
        assert_eq!(error_hint(S::GroupA, E::Increment), ErrorHint::RemoveUnprocessedFood);
        assert_eq!(error_hint(S::GroupA, E::SaveMeal), ErrorHint::ChooseProcessing);
        assert_eq!(error_hint(S::DishPending, E::SaveMeal), ErrorHint::ChooseGroup);
    }
}
