//! Transition table
//!
//! The rules are plain data so the whole set can be audited and tested. Lookups go
//! through [`TransitionTable`], which indexes them once at start-up.

use super::events::{ControlEvent as E, WorkflowState as S};
use crate::system::config::ProcessingPolicy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: S,
    pub event: E,
    pub to: S,
}

const fn rule(from: S, event: E, to: S) -> TransitionRule {
    TransitionRule { from, event, to }
}

pub static TRANSITIONS: &[TransitionRule] = &[
    // Empty
    rule(S::Empty, E::Tare, S::Empty),
    rule(S::Empty, E::Increment, S::DishPending),
    rule(S::Empty, E::SaveMeal, S::SaveCheck),
    rule(S::Empty, E::IllegalAction, S::Error),
    // DishPending
    rule(S::DishPending, E::Increment, S::DishPending),
    rule(S::DishPending, E::Decrement, S::DishPending),
    rule(S::DishPending, E::PartialRemove, S::DishPending),
    rule(S::DishPending, E::Release, S::Empty),
    rule(S::DishPending, E::GroupTypeA, S::GroupA),
    rule(S::DishPending, E::GroupTypeB, S::GroupB),
    rule(S::DishPending, E::IllegalAction, S::Error),
    // GroupA
    rule(S::GroupA, E::Release, S::Empty),
    rule(S::GroupA, E::Decrement, S::GroupA),
    rule(S::GroupA, E::PartialRemove, S::GroupA),
    rule(S::GroupA, E::GroupTypeA, S::GroupA),
    rule(S::GroupA, E::Tare, S::GroupA),
    rule(S::GroupA, E::GroupTypeB, S::GroupB),
    rule(S::GroupA, E::SelectRaw, S::Raw),
    rule(S::GroupA, E::SelectCooked, S::Cooked),
    rule(S::GroupA, E::IllegalAction, S::Error),
    // GroupB
    rule(S::GroupB, E::Release, S::Empty),
    rule(S::GroupB, E::Decrement, S::GroupB),
    rule(S::GroupB, E::PartialRemove, S::GroupB),
    rule(S::GroupB, E::GroupTypeB, S::GroupB),
    rule(S::GroupB, E::Tare, S::GroupB),
    rule(S::GroupB, E::GroupTypeA, S::GroupA),
    rule(S::GroupB, E::SelectRaw, S::Raw),
    rule(S::GroupB, E::SelectCooked, S::Cooked),
    rule(S::GroupB, E::IllegalAction, S::Error),
    // Raw
    rule(S::Raw, E::Release, S::Empty),
    rule(S::Raw, E::Decrement, S::Raw),
    rule(S::Raw, E::PartialRemove, S::Raw),
    rule(S::Raw, E::GroupTypeA, S::GroupA),
    rule(S::Raw, E::GroupTypeB, S::GroupB),
    rule(S::Raw, E::SelectRaw, S::Raw),
    rule(S::Raw, E::SelectCooked, S::Cooked),
    rule(S::Raw, E::Increment, S::Weighted),
    rule(S::Raw, E::AddDish, S::AddCheck),
    rule(S::Raw, E::DeleteDish, S::DeleteCheck),
    rule(S::Raw, E::SaveMeal, S::SaveCheck),
    rule(S::Raw, E::IllegalAction, S::Error),
    // Cooked
    rule(S::Cooked, E::Release, S::Empty),
    rule(S::Cooked, E::Decrement, S::Cooked),
    rule(S::Cooked, E::PartialRemove, S::Cooked),
    rule(S::Cooked, E::GroupTypeA, S::GroupA),
    rule(S::Cooked, E::GroupTypeB, S::GroupB),
    rule(S::Cooked, E::SelectCooked, S::Cooked),
    rule(S::Cooked, E::SelectRaw, S::Raw),
    rule(S::Cooked, E::Increment, S::Weighted),
    rule(S::Cooked, E::AddDish, S::AddCheck),
    rule(S::Cooked, E::DeleteDish, S::DeleteCheck),
    rule(S::Cooked, E::SaveMeal, S::SaveCheck),
    rule(S::Cooked, E::IllegalAction, S::Error),
    // Weighted
    rule(S::Weighted, E::Release, S::Empty),
    rule(S::Weighted, E::Increment, S::Weighted),
    rule(S::Weighted, E::Decrement, S::Weighted),
    rule(S::Weighted, E::PartialRemove, S::Weighted),
    rule(S::Weighted, E::GroupTypeA, S::GroupA),
    rule(S::Weighted, E::GroupTypeB, S::GroupB),
    rule(S::Weighted, E::AddDish, S::AddCheck),
    rule(S::Weighted, E::DeleteDish, S::DeleteCheck),
    rule(S::Weighted, E::SaveMeal, S::SaveCheck),
    rule(S::Weighted, E::IllegalAction, S::Error),
    // AddCheck
    rule(S::AddCheck, E::AddDish, S::Added),
    rule(S::AddCheck, E::GroupTypeA, S::Cancel),
    rule(S::AddCheck, E::GroupTypeB, S::Cancel),
    rule(S::AddCheck, E::SelectRaw, S::Cancel),
    rule(S::AddCheck, E::SelectCooked, S::Cancel),
    rule(S::AddCheck, E::DeleteDish, S::Cancel),
    rule(S::AddCheck, E::SaveMeal, S::Cancel),
    rule(S::AddCheck, E::CancelRequested, S::Cancel),
    rule(S::AddCheck, E::IllegalAction, S::Error),
    // Added
    rule(S::Added, E::Tare, S::Added),
    rule(S::Added, E::PartialRemove, S::Added),
    rule(S::Added, E::Increment, S::Added),
    rule(S::Added, E::Release, S::Empty),
    rule(S::Added, E::ReturnTo(S::GroupA), S::GroupA),
    rule(S::Added, E::ReturnTo(S::GroupB), S::GroupB),
    rule(S::Added, E::IllegalAction, S::Error),
    rule(S::Added, E::WarningRaised, S::Warning),
    // DeleteCheck
    rule(S::DeleteCheck, E::DeleteDish, S::Deleted),
    rule(S::DeleteCheck, E::GroupTypeA, S::Cancel),
    rule(S::DeleteCheck, E::GroupTypeB, S::Cancel),
    rule(S::DeleteCheck, E::SelectRaw, S::Cancel),
    rule(S::DeleteCheck, E::SelectCooked, S::Cancel),
    rule(S::DeleteCheck, E::AddDish, S::Cancel),
    rule(S::DeleteCheck, E::SaveMeal, S::Cancel),
    rule(S::DeleteCheck, E::CancelRequested, S::Cancel),
    rule(S::DeleteCheck, E::IllegalAction, S::Error),
    // Deleted
    rule(S::Deleted, E::Tare, S::Deleted),
    rule(S::Deleted, E::PartialRemove, S::Deleted),
    rule(S::Deleted, E::Increment, S::Deleted),
    rule(S::Deleted, E::Release, S::Empty),
    rule(S::Deleted, E::ReturnTo(S::GroupA), S::GroupA),
    rule(S::Deleted, E::ReturnTo(S::GroupB), S::GroupB),
    rule(S::Deleted, E::IllegalAction, S::Error),
    rule(S::Deleted, E::WarningRaised, S::Warning),
    // SaveCheck
    rule(S::SaveCheck, E::SaveMeal, S::Saved),
    rule(S::SaveCheck, E::GroupTypeA, S::Cancel),
    rule(S::SaveCheck, E::GroupTypeB, S::Cancel),
    rule(S::SaveCheck, E::SelectRaw, S::Cancel),
    rule(S::SaveCheck, E::SelectCooked, S::Cancel),
    rule(S::SaveCheck, E::AddDish, S::Cancel),
    rule(S::SaveCheck, E::DeleteDish, S::Cancel),
    rule(S::SaveCheck, E::CancelRequested, S::Cancel),
    rule(S::SaveCheck, E::IllegalAction, S::Error),
    // Saved
    rule(S::Saved, E::Tare, S::Saved),
    rule(S::Saved, E::PartialRemove, S::Saved),
    rule(S::Saved, E::Increment, S::Saved),
    rule(S::Saved, E::Release, S::Empty),
    rule(S::Saved, E::ReturnTo(S::GroupA), S::GroupA),
    rule(S::Saved, E::ReturnTo(S::GroupB), S::GroupB),
    rule(S::Saved, E::ReturnTo(S::Empty), S::Empty),
    rule(S::Saved, E::IllegalAction, S::Error),
    rule(S::Saved, E::WarningRaised, S::Warning),
    // Error
    rule(S::Error, E::ReturnTo(S::Empty), S::Empty),
    rule(S::Error, E::ReturnTo(S::DishPending), S::DishPending),
    rule(S::Error, E::ReturnTo(S::GroupA), S::GroupA),
    rule(S::Error, E::ReturnTo(S::GroupB), S::GroupB),
    rule(S::Error, E::ReturnTo(S::Raw), S::Raw),
    rule(S::Error, E::ReturnTo(S::Cooked), S::Cooked),
    rule(S::Error, E::ReturnTo(S::Weighted), S::Weighted),
    rule(S::Error, E::ReturnTo(S::AddCheck), S::AddCheck),
    rule(S::Error, E::ReturnTo(S::Added), S::Added),
    rule(S::Error, E::ReturnTo(S::DeleteCheck), S::DeleteCheck),
    rule(S::Error, E::ReturnTo(S::Deleted), S::Deleted),
    rule(S::Error, E::ReturnTo(S::SaveCheck), S::SaveCheck),
    rule(S::Error, E::ReturnTo(S::Saved), S::Saved),
    rule(S::Error, E::ReturnTo(S::Cancel), S::Cancel),
    rule(S::Error, E::Release, S::Empty),
    // Cancel
    rule(S::Cancel, E::ReturnTo(S::Empty), S::Empty),
    rule(S::Cancel, E::ReturnTo(S::Raw), S::Raw),
    rule(S::Cancel, E::ReturnTo(S::Cooked), S::Cooked),
    rule(S::Cancel, E::ReturnTo(S::Weighted), S::Weighted),
    rule(S::Cancel, E::IllegalAction, S::Error),
    rule(S::Cancel, E::ResetLedger, S::DeleteLedgerCheck),
    // Warning
    rule(S::Warning, E::ReturnTo(S::GroupA), S::GroupA),
    rule(S::Warning, E::ReturnTo(S::GroupB), S::GroupB),
    rule(S::Warning, E::ReturnTo(S::Empty), S::Empty),
    rule(S::Warning, E::IllegalAction, S::Error),
    // Ledger maintenance
    rule(S::DeleteLedgerCheck, E::ResetLedger, S::DeleteLedgerDone),
    rule(S::DeleteLedgerCheck, E::ReturnTo(S::Empty), S::Empty),
    rule(S::DeleteLedgerCheck, E::ReturnTo(S::Raw), S::Raw),
    rule(S::DeleteLedgerCheck, E::ReturnTo(S::Cooked), S::Cooked),
    rule(S::DeleteLedgerCheck, E::ReturnTo(S::Weighted), S::Weighted),
    rule(S::DeleteLedgerDone, E::ReturnTo(S::Empty), S::Empty),
];

/// Weighing straight after choosing a group, when processing is optional.
pub static OPTIONAL_PROCESSING_RULES: &[TransitionRule] = &[
    rule(S::GroupA, E::Increment, S::Weighted),
    rule(S::GroupB, E::Increment, S::Weighted),
];

/// `(state, event)` index over the rule data.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    index: HashMap<(S, E), S>,
}

impl TransitionTable {
    pub fn new(policy: ProcessingPolicy) -> Self {
        let extra: &[TransitionRule] = match policy {
            ProcessingPolicy::Optional => OPTIONAL_PROCESSING_RULES,
            ProcessingPolicy::Required => &[],
        };
        Self::from_rules(TRANSITIONS.iter().chain(extra))
    }

    pub fn from_rules<'a>(rules: impl IntoIterator<Item = &'a TransitionRule>) -> Self {
        let index = rules
            .into_iter()
            .map(|r| ((r.from, r.event), r.to))
            .collect();
        Self { index }
    }

    pub fn lookup(&self, from: S, event: E) -> Option<S> {
        self.index.get(&(from, event)).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_events() -> Vec<E> {
        E::SIMPLE
            .iter()
            .copied()
            .chain(S::ALL.iter().map(|s| E::ReturnTo(*s)))
            .collect()
    }

    #[test]
    fn test_no_duplicate_keys() {
        let table = TransitionTable::new(ProcessingPolicy::Required);
        assert_eq!(table.len(), TRANSITIONS.len());
        let table = TransitionTable::new(ProcessingPolicy::Optional);
        assert_eq!(table.len(), TRANSITIONS.len() + OPTIONAL_PROCESSING_RULES.len());
    }

    #[test]
    fn test_lookup_matches_linear_scan() {
        let table = TransitionTable::new(ProcessingPolicy::Required);
        for state in S::ALL {
            for event in all_events() {
                let scanned = TRANSITIONS
                    .iter()
                    .find(|r| r.from == state && r.event == event)
                    .map(|r| r.to);
                assert_eq!(table.lookup(state, event), scanned, "{:?} + {:?}", state, event);
            }
        }
    }

    #[test]
    fn test_every_state_has_an_exit() {
        for state in S::ALL {
            assert!(
                TRANSITIONS.iter().any(|r| r.from == state && r.to != state),
                "{:?} is a sink",
                state
            );
        }
    }

    #[test]
    fn test_illegal_action_routes_to_error_except_in_recovery() {
        let table = TransitionTable::new(ProcessingPolicy::Required);
        for state in S::ALL {
            let target = table.lookup(state, E::IllegalAction);
            if state.ignores_unmatched() {
                assert_eq!(target, None, "{:?}", state);
            } else {
                assert_eq!(target, Some(S::Error), "{:?}", state);
            }
        }
    }

    #[test]
    fn test_confirmations_confirm_or_cancel_on_every_button() {
        let table = TransitionTable::new(ProcessingPolicy::Required);
        let cases = [
            (S::AddCheck, E::AddDish, S::Added),
            (S::DeleteCheck, E::DeleteDish, S::Deleted),
            (S::SaveCheck, E::SaveMeal, S::Saved),
        ];
        for (check, confirm, done) in cases {
            for event in E::SIMPLE.iter().copied().filter(|e| e.is_button()) {
                let expected = if event == confirm { done } else { S::Cancel };
                assert_eq!(table.lookup(check, event), Some(expected));
            }
            assert_eq!(table.lookup(check, E::CancelRequested), Some(S::Cancel));
            // Scale movement while confirming is an error
            assert_eq!(table.lookup(check, E::Increment), None);
        }
    }

    #[test]
    fn test_cancel_returns_only_to_anchors() {
        let table = TransitionTable::new(ProcessingPolicy::Required);
        for state in S::ALL {
            let target = table.lookup(S::Cancel, E::ReturnTo(state));
            assert_eq!(target.is_some(), state.is_anchor(), "{:?}", state);
        }
    }

    #[test]
    fn test_error_can_return_to_every_working_state() {
        let table = TransitionTable::new(ProcessingPolicy::Required);
        for state in S::ALL {
            let expected = !matches!(
                state,
                S::Error | S::Warning | S::DeleteLedgerCheck | S::DeleteLedgerDone
            );
            assert_eq!(
                table.lookup(S::Error, E::ReturnTo(state)).is_some(),
                expected,
                "{:?}",
                state
            );
        }
        assert_eq!(table.lookup(S::Error, E::Release), Some(S::Empty));
    }

    #[test]
    fn test_processing_policy() {
        let optional = TransitionTable::new(ProcessingPolicy::Optional);
        let required = TransitionTable::new(ProcessingPolicy::Required);
        for group in [S::GroupA, S::GroupB] {
            assert_eq!(optional.lookup(group, E::Increment), Some(S::Weighted));
            assert_eq!(required.lookup(group, E::Increment), None);
        }
    }

    #[test]
    fn test_ledger_reset_is_only_reachable_from_cancel() {
        let into_reset: Vec<_> = TRANSITIONS
            .iter()
            .filter(|r| r.to == S::DeleteLedgerCheck)
            .collect();
        assert_eq!(into_reset.len(), 1);
        assert_eq!(into_reset[0].from, S::Cancel);
    }
}
