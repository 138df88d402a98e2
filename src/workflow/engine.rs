//! Workflow engine
//!
//! Owns the aggregates, the classifier and the transition index. Every input goes
//! through [`WorkflowEngine::handle_input`], which returns what the outside world
//! should do: redraw, persist, or just log a state change.

use super::buffer::EventBuffer;
use super::events::{Action, ControlEvent, ErrorHint, Input, Output, Screen, WorkflowState};
use super::rules::TransitionTable;
use super::supervisor::{self, Dwell};
use crate::input::buttons::{needs_processing, ButtonPress};
use crate::nutrition::{groups, DailyLedger, Dish, FoodGroup, FoodItem, Meal};
use crate::scales::WeightClassifier;
use crate::storage::{LedgerStore, MealRecord};
use crate::system::{AppConfig, Clock, WorkflowConfig};
use crate::types::{Processing, MAX_OUTPUTS};
use embassy_time::Instant;
use heapless::Vec;
use log::{debug, error, info, warn};

/// Matrix button that opens the ledger reset from the cancel screen.
pub const LEDGER_RESET_GESTURE_ID: u8 = 1;
/// Matrix button that confirms the ledger reset.
pub const LEDGER_RESET_CONFIRM_ID: u8 = 20;

pub type Outputs = Vec<Output, MAX_OUTPUTS>;

/// Where and why the last illegal action happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorReport {
    pub origin: WorkflowState,
    pub hint: ErrorHint,
    pub held: bool,
}

/// Everything the entry actions read and mutate.
#[derive(Debug)]
pub struct EngineContext {
    group: Option<&'static FoodGroup>,
    pressed_group_id: Option<u8>,
    last_group_state: Option<WorkflowState>,
    processing: Processing,
    container_g: Option<f32>,
    // Sum of every tare since Empty: what lifting it all off should read
    tared_load_g: f32,
    pending_item: Option<FoodItem>,
    dish: Dish,
    meal: Meal,
    saved_meal: Option<Meal>,
    meal_saved: bool,
    ledger: DailyLedger,
    ledger_just_reset: bool,
    error: Option<ErrorReport>,
    dwell: Option<Dwell>,
    outputs: Outputs,
}

impl EngineContext {
    fn new(ledger: DailyLedger) -> Self {
        Self {
            group: None,
            pressed_group_id: None,
            last_group_state: None,
            processing: Processing::None,
            container_g: None,
            tared_load_g: 0.0,
            pending_item: None,
            dish: Dish::new(),
            meal: Meal::new(),
            saved_meal: None,
            meal_saved: false,
            ledger,
            ledger_just_reset: false,
            error: None,
            dwell: None,
            outputs: Vec::new(),
        }
    }
}

pub struct WorkflowEngine<S: LedgerStore, C: Clock> {
    config: WorkflowConfig,
    table: TransitionTable,
    classifier: WeightClassifier,
    store: S,
    clock: C,
    current: WorkflowState,
    previous: WorkflowState,
    anchor: WorkflowState,
    // Initial entry action has run, through start() or the first input
    started: bool,
    buffer: EventBuffer,
    context: EngineContext,
}

impl<S: LedgerStore, C: Clock> WorkflowEngine<S, C> {
    /// Rebuilds today's ledger from the store. A store that cannot be read starts the
    /// day at zero rather than blocking the scale.
    pub fn new(config: AppConfig, store: S, clock: C) -> Self {
        let today = clock.now().date();
        let ledger = store.load_day(today).unwrap_or_else(|e| {
            error!("📒 Failed to load ledger for {}: {}", today, e);
            DailyLedger::new(today)
        });
        info!(
            "📒 Ledger for {}: {} meals, {:.0} kcal",
            today,
            ledger.meal_count(),
            ledger.totals().kcal
        );

        Self {
            config: config.workflow,
            table: TransitionTable::new(config.workflow.processing_policy),
            classifier: WeightClassifier::new(config.scale),
            store,
            clock,
            current: WorkflowState::Empty,
            previous: WorkflowState::Empty,
            anchor: WorkflowState::Empty,
            started: false,
            buffer: EventBuffer::new(),
            context: EngineContext::new(ledger),
        }
    }

    /// Runs the entry action of the initial state.
    pub fn start(&mut self, now: Instant) -> Outputs {
        self.context.outputs.clear();
        if !self.started {
            self.started = true;
            if let Some(follow) = self.enter(now) {
                self.dispatch(follow, now);
            }
        }
        std::mem::take(&mut self.context.outputs)
    }

    /// Process one input, then fire any timer that has come due.
    pub fn handle_input(&mut self, input: Input, now: Instant) -> Outputs {
        self.context.outputs.clear();
        self.started = true;

        match input {
            Input::Sample(gross_g) => {
                let expected = self.context.tared_load_g;
                if let Some(event) = self.classifier.process_sample(gross_g, expected) {
                    self.dispatch(event.into(), now);
                }
            }
            Input::Button(press) => {
                let event = self.map_button(press);
                debug!("🔘 {:?} -> {:?}", press, event);
                self.dispatch(event, now);
            }
            Input::Tick => {}
        }
        self.fire_due_timer(now);

        std::mem::take(&mut self.context.outputs)
    }

    /// Dispatches `event` and whatever follow-up events the entry actions raise.
    pub fn dispatch(&mut self, event: ControlEvent, now: Instant) {
        let mut next = Some(event);
        while let Some(event) = next.take() {
            next = self.step(event, now);
        }
    }

    /// Earliest pending deadline, so the caller can sleep until then.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.context.dwell.and_then(|d| d.deadline())
    }

    pub fn state(&self) -> WorkflowState {
        self.current
    }

    pub fn previous(&self) -> WorkflowState {
        self.previous
    }

    pub fn anchor(&self) -> WorkflowState {
        self.anchor
    }

    pub fn dish(&self) -> &Dish {
        &self.context.dish
    }

    pub fn meal(&self) -> &Meal {
        &self.context.meal
    }

    pub fn ledger(&self) -> &DailyLedger {
        &self.context.ledger
    }

    pub fn pending_item(&self) -> Option<&FoodItem> {
        self.context.pending_item.as_ref()
    }

    pub fn group(&self) -> Option<&'static FoodGroup> {
        self.context.group
    }

    pub fn processing(&self) -> Processing {
        self.context.processing
    }

    pub fn last_error(&self) -> Option<ErrorReport> {
        self.context.error
    }

    pub fn dwell(&self) -> Option<&Dwell> {
        self.context.dwell.as_ref()
    }

    pub fn buffer(&self) -> &EventBuffer {
        &self.buffer
    }

    pub fn stable_weight(&self) -> f32 {
        self.classifier.stable_weight()
    }

    /// Whether this gross reading would reach the workflow as a scale event.
    pub fn is_significant_sample(&self, gross_g: f32) -> bool {
        self.classifier.is_significant(gross_g)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn map_button(&mut self, press: ButtonPress) -> ControlEvent {
        match (self.current, press) {
            (WorkflowState::Cancel, ButtonPress::Matrix(LEDGER_RESET_GESTURE_ID))
            | (WorkflowState::DeleteLedgerCheck, ButtonPress::Matrix(LEDGER_RESET_CONFIRM_ID)) => {
                ControlEvent::ResetLedger
            }
            _ => {
                if let Some(id) = press.group_id() {
                    self.context.pressed_group_id = Some(id);
                }
                press.event()
            }
        }
    }

    fn fire_due_timer(&mut self, now: Instant) {
        let due = self.context.dwell.filter(|d| d.is_expired(now));
        if let Some(dwell) = due {
            // Cleared before dispatch so it fires exactly once
            self.context.dwell = None;
            debug!("⏰ Timer expired in {:?}: {:?}", self.current, dwell.on_expiry());
            self.dispatch(dwell.on_expiry(), now);
        }
    }

    fn step(&mut self, event: ControlEvent, now: Instant) -> Option<ControlEvent> {
        self.buffer.push(event);

        if self.current == WorkflowState::Error {
            if let Some(ret) = self.context.dwell.and_then(|d| d.honor(event)) {
                info!("🩹 Honouring {:?} during error: {:?}", event, ret);
                return Some(ret);
            }
        }

        match self.table.lookup(self.current, event) {
            Some(target) => self.transition(target, event, now),
            None if self.current.ignores_unmatched() => {
                debug!("Ignoring {:?} in {:?}", event, self.current);
                None
            }
            None => {
                self.report_illegal(event);
                Some(ControlEvent::IllegalAction)
            }
        }
    }

    fn report_illegal(&mut self, event: ControlEvent) {
        let origin = supervisor::error_origin(self.current, self.anchor);
        let report = ErrorReport {
            origin,
            hint: supervisor::error_hint(origin, event),
            held: supervisor::is_held_error(origin, event),
        };
        warn!("🚫 Illegal {:?} in {:?} ({:?})", event, self.current, report.hint);
        self.context.error = Some(report);
    }

    fn transition(&mut self, target: WorkflowState, event: ControlEvent, now: Instant) -> Option<ControlEvent> {
        let from = self.current;
        self.previous = from;
        self.current = target;
        if target.is_anchor() {
            self.anchor = target;
        }

        if from != target {
            info!("🔄 {:?} -> {:?} on {:?}", from, target, event);
            // Leaving a state cancels its timer
            self.context.dwell = None;
            self.emit(Output::StateChanged { from, to: target });
        }

        self.enter(now)
    }

    fn enter(&mut self, now: Instant) -> Option<ControlEvent> {
        match self.current {
            WorkflowState::Empty => self.enter_empty(),
            WorkflowState::DishPending => self.enter_dish_pending(),
            WorkflowState::GroupA | WorkflowState::GroupB => self.enter_group(),
            WorkflowState::Raw => self.enter_processing(Processing::Raw),
            WorkflowState::Cooked => self.enter_processing(Processing::Cooked),
            WorkflowState::Weighted => self.enter_weighted(),
            WorkflowState::AddCheck => self.enter_check(Action::AddDish, now),
            WorkflowState::DeleteCheck => self.enter_check(Action::DeleteDish, now),
            WorkflowState::SaveCheck => self.enter_check(Action::SaveMeal, now),
            WorkflowState::Added => self.enter_added(),
            WorkflowState::Deleted => self.enter_deleted(),
            WorkflowState::Saved => self.enter_saved(now),
            WorkflowState::Error => self.enter_error(now),
            WorkflowState::Cancel => self.enter_cancel(now),
            WorkflowState::Warning => self.enter_warning(now),
            WorkflowState::DeleteLedgerCheck => self.enter_ledger_check(now),
            WorkflowState::DeleteLedgerDone => self.enter_ledger_done(now),
        }
    }

    fn enter_empty(&mut self) -> Option<ControlEvent> {
        // Boot and Tare self-loops keep the current zero
        if self.previous != WorkflowState::Empty {
            self.classifier.tare();
        }
        let ctx = &mut self.context;
        ctx.tared_load_g = 0.0;
        ctx.container_g = None;
        ctx.processing = Processing::None;
        ctx.group = None;
        ctx.last_group_state = None;
        if ctx.pending_item.take().is_some() || !ctx.dish.is_empty() {
            info!("🍽️ Scale cleared, discarding unfinished dish");
            ctx.dish.restore();
        }
        if ctx.ledger_just_reset {
            ctx.saved_meal = None;
            ctx.ledger_just_reset = false;
        }
        self.render_dashboard();
        None
    }

    fn enter_dish_pending(&mut self) -> Option<ControlEvent> {
        let ctx = &mut self.context;
        if ctx.meal.is_empty() && ctx.saved_meal.is_some() {
            ctx.saved_meal = None;
        }
        ctx.meal_saved = false;
        let container_g = self.classifier.stable_weight();
        self.render(Screen::ChooseGroup { container_g });
        None
    }

    fn enter_group(&mut self) -> Option<ControlEvent> {
        if self.context.container_g.is_none() {
            let container_g = self.classifier.stable_weight();
            info!("🥣 Container {:.0}g", container_g);
            self.context.container_g = Some(container_g);
            self.tare();
        } else if self.commit_pending() {
            self.tare();
        } else if self.previous != WorkflowState::Error && !self.previous.is_group() {
            self.tare();
        }

        let ctx = &mut self.context;
        ctx.processing = Processing::None;
        ctx.last_group_state = Some(self.current);
        let wants_type_a = self.current == WorkflowState::GroupA;
        if let Some(group) = ctx
            .pressed_group_id
            .filter(|id| needs_processing(*id) == wants_type_a)
            .and_then(groups::find)
        {
            ctx.group = Some(group);
        }

        let group = ctx.group;
        match group {
            Some(group) => self.render(Screen::GroupExamples {
                group,
                needs_processing: group.has_cooked_variant(),
            }),
            None => warn!("No food group selected in {:?}", self.current),
        }
        None
    }

    fn enter_processing(&mut self, processing: Processing) -> Option<ControlEvent> {
        let ctx = &mut self.context;
        ctx.processing = processing;
        let group = ctx
            .group
            .map(|g| groups::for_processing(g, processing == Processing::Cooked));
        ctx.group = group;
        if let Some(group) = group {
            self.render(Screen::ProcessingChosen { group, processing });
        }
        None
    }

    fn enter_weighted(&mut self) -> Option<ControlEvent> {
        let weight_g = self.classifier.stable_weight();
        let ctx = &mut self.context;
        let group = ctx.group;
        ctx.pending_item = match group {
            Some(group) if weight_g > 0.0 => Some(FoodItem::new(group, weight_g)),
            _ => None,
        };
        if let Some(group) = group {
            let item = ctx.pending_item.map(|i| i.totals()).unwrap_or_default();
            let screen = Screen::Weighing {
                group,
                item,
                dish: ctx.dish.totals() + item,
                meal: ctx.meal.totals() + ctx.dish.totals() + item,
            };
            self.render(screen);
        }
        None
    }

    fn enter_check(&mut self, action: Action, now: Instant) -> Option<ControlEvent> {
        self.context.dwell = Some(Dwell::timed(
            now,
            self.config.confirm_timeout(),
            ControlEvent::CancelRequested,
        ));
        self.render(Screen::Confirm(action));
        None
    }

    /// Self-loops while the dish is lifted, and the return from an error raised
    /// there, must not apply the action twice.
    fn already_applied(&self) -> bool {
        self.previous == self.current
            || (self.previous == WorkflowState::Error
                && self.context.error.map(|e| e.origin) == Some(self.current))
    }

    fn enter_added(&mut self) -> Option<ControlEvent> {
        if self.already_applied() {
            return None;
        }
        self.commit_pending();
        self.tare();

        if !self.context.dish.is_empty() {
            let ctx = &mut self.context;
            ctx.meal.fold(&ctx.dish);
            ctx.dish.restore();
            info!(
                "🍽️ Dish added, meal now {} dishes {:.0}g",
                ctx.meal.dish_count(),
                ctx.meal.weight_g()
            );
            self.render_action_done(Action::AddDish);
            None
        } else {
            self.vacuous(Action::AddDish)
        }
    }

    fn enter_deleted(&mut self) -> Option<ControlEvent> {
        if self.already_applied() {
            return None;
        }
        let discarded_item = self.context.pending_item.take().is_some();
        self.tare();

        if !self.context.dish.is_empty() {
            self.context.dish.restore();
            info!("🗑️ Dish deleted");
            self.render_action_done(Action::DeleteDish);
            None
        } else if discarded_item {
            info!("🗑️ Pending item deleted");
            self.render_action_done(Action::DeleteDish);
            None
        } else {
            self.vacuous(Action::DeleteDish)
        }
    }

    fn enter_saved(&mut self, now: Instant) -> Option<ControlEvent> {
        if self.already_applied() {
            return None;
        }
        self.commit_pending();
        self.tare();
        if !self.context.dish.is_empty() {
            let ctx = &mut self.context;
            ctx.meal.fold(&ctx.dish);
            ctx.dish.restore();
        }

        let follow = if self.context.meal.is_empty() {
            self.vacuous(Action::SaveMeal)
        } else {
            self.persist_meal();
            None
        };

        if follow.is_none() && self.anchor == WorkflowState::Empty {
            self.context.dwell = Some(Dwell::timed(
                now,
                self.config.saved_return(),
                ControlEvent::ReturnTo(WorkflowState::Empty),
            ));
        }
        follow
    }

    fn persist_meal(&mut self) {
        let record = MealRecord::from_meal(&self.context.meal, self.clock.now());
        match self.store.append(&record) {
            Ok(()) => {
                let ctx = &mut self.context;
                let date = record.timestamp.date();
                if ctx.ledger.date() != date {
                    info!("📒 New day {}, starting a fresh ledger", date);
                    ctx.ledger = DailyLedger::new(date);
                }
                ctx.ledger.add_meal(&ctx.meal);
                ctx.saved_meal = Some(ctx.meal);
                ctx.meal.restore();
                ctx.meal_saved = true;
                info!(
                    "💾 Meal saved: {:.0} kcal, day total {:.0} kcal",
                    record.totals.kcal,
                    ctx.ledger.totals().kcal
                );
                self.emit(Output::MealSaved(record));
                self.render_action_done(Action::SaveMeal);
            }
            Err(e) => {
                // Meal stays in memory so the save can be retried
                error!("💾 Failed to save meal: {}", e);
                self.render(Screen::StorageFailure {
                    message: e.to_string(),
                });
            }
        }
    }

    fn enter_error(&mut self, now: Instant) -> Option<ControlEvent> {
        let report = self.context.error.unwrap_or(ErrorReport {
            origin: self.anchor,
            hint: ErrorHint::Generic,
            held: false,
        });
        self.context.dwell = Some(Dwell::error(
            now,
            self.config.error_dwell(),
            report.origin,
            report.held,
        ));
        self.render(Screen::Error(report.hint));
        None
    }

    fn enter_cancel(&mut self, now: Instant) -> Option<ControlEvent> {
        self.context.dwell = Some(Dwell::timed(
            now,
            self.config.cancel_dwell(),
            ControlEvent::ReturnTo(self.anchor),
        ));
        self.render(Screen::Cancelled);
        None
    }

    fn enter_warning(&mut self, now: Instant) -> Option<ControlEvent> {
        let action = match self.previous {
            WorkflowState::Deleted => Action::DeleteDish,
            WorkflowState::Saved => Action::SaveMeal,
            _ => Action::AddDish,
        };
        let target = supervisor::warning_return(self.anchor, self.context.last_group_state);
        self.context.dwell = Some(Dwell::timed(
            now,
            self.config.warning_dwell(),
            ControlEvent::ReturnTo(target),
        ));
        self.render(Screen::Warning(action));
        None
    }

    fn enter_ledger_check(&mut self, now: Instant) -> Option<ControlEvent> {
        self.context.dwell = Some(Dwell::timed(
            now,
            self.config.ledger_reset_confirm(),
            ControlEvent::ReturnTo(self.anchor),
        ));
        self.render(Screen::LedgerResetConfirm);
        None
    }

    fn enter_ledger_done(&mut self, now: Instant) -> Option<ControlEvent> {
        match self.store.reset() {
            Ok(()) => {
                let ctx = &mut self.context;
                ctx.ledger.clear();
                ctx.ledger_just_reset = true;
                warn!("📒 Daily ledger reset");
                self.emit(Output::LedgerCleared);
                self.render(Screen::LedgerResetDone);
            }
            Err(e) => {
                error!("📒 Failed to reset ledger: {}", e);
                self.render(Screen::StorageFailure {
                    message: e.to_string(),
                });
            }
        }
        self.context.dwell = Some(Dwell::timed(
            now,
            self.config.ledger_reset_done(),
            ControlEvent::ReturnTo(WorkflowState::Empty),
        ));
        None
    }

    /// An action with nothing to act on. Warn, unless we are recovering from an error.
    fn vacuous(&mut self, action: Action) -> Option<ControlEvent> {
        if self.previous == WorkflowState::Error {
            self.render_action_done(action);
            None
        } else {
            info!("🤷 {:?} had nothing to act on", action);
            Some(ControlEvent::WarningRaised)
        }
    }

    /// Moves the pending item into the dish. Returns whether there was one.
    fn commit_pending(&mut self) -> bool {
        match self.context.pending_item.take() {
            Some(item) => {
                debug!("➕ {} {:.0}g", item.group().name, item.weight_g());
                self.context.dish.add_item(item);
                true
            }
            None => false,
        }
    }

    /// Software tare. Whatever is on the scale now joins the load expected to come off.
    fn tare(&mut self) {
        self.context.tared_load_g += self.classifier.stable_weight();
        self.classifier.tare();
    }

    fn render_dashboard(&mut self) {
        let ctx = &self.context;
        let shown = match ctx.saved_meal {
            Some(saved) if ctx.meal.is_empty() => saved,
            _ => ctx.meal,
        };
        let screen = Screen::Dashboard {
            last_meal: shown.totals(),
            last_meal_dishes: shown.dish_count(),
            day: ctx.ledger.totals(),
            meals_today: ctx.ledger.meal_count(),
            just_saved: ctx.meal_saved,
        };
        self.render(screen);
    }

    fn render_action_done(&mut self, action: Action) {
        let ctx = &self.context;
        let meal = match (action, ctx.saved_meal) {
            (Action::SaveMeal, Some(saved)) if ctx.meal.is_empty() => saved,
            _ => ctx.meal,
        };
        self.render(Screen::ActionDone {
            action,
            meal: meal.totals(),
            dishes: meal.dish_count(),
        });
    }

    fn render(&mut self, screen: Screen) {
        self.emit(Output::Render(screen));
    }

    fn emit(&mut self, output: Output) {
        if let Err(dropped) = self.context.outputs.push(output) {
            warn!("Output queue full, dropping {:?}", dropped);
        }
    }
}
