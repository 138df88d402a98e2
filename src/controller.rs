use crate::hardware::display::{RenderOutcome, Renderer};
use crate::input::{Debouncer, InputSignals};
use crate::scales::traits::LoadCell;
use crate::storage::LedgerStore;
use crate::system::{AppConfig, Clock};
use crate::types::{ScaleSample, BUTTON_DEBOUNCE_MS};
use crate::workflow::{Input, Output, Outputs, Screen, WorkflowEngine, WorkflowState};
use embassy_futures::select::{select3, Either3};
use embassy_time::{Duration, Instant, Timer};
use log::{debug, error, info, warn};

/// How often timers are checked when no input arrives.
pub const TICK_PERIOD_MS: u64 = 100;

pub struct NutritionController<S: LedgerStore, C: Clock, R: Renderer> {
    engine: WorkflowEngine<S, C>,
    renderer: R,
    signals: &'static InputSignals,
    debouncer: Debouncer,
    pending_screen: Option<Screen>,
    tick: Duration,
}

impl<S: LedgerStore, C: Clock, R: Renderer> NutritionController<S, C, R> {
    pub fn new(engine: WorkflowEngine<S, C>, renderer: R, signals: &'static InputSignals) -> Self {
        Self {
            engine,
            renderer,
            signals,
            debouncer: Debouncer::new(Duration::from_millis(BUTTON_DEBOUNCE_MS)),
            pending_screen: None,
            tick: Duration::from_millis(TICK_PERIOD_MS),
        }
    }

    pub fn engine(&self) -> &WorkflowEngine<S, C> {
        &self.engine
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub async fn run(&mut self) -> ! {
        info!("Starting main control loop with Embassy select");
        self.start().await;
        loop {
            self.run_once().await;
        }
    }

    /// Shows the initial screen.
    pub async fn start(&mut self) {
        let outputs = self.engine.start(Instant::now());
        self.apply(outputs);
        self.flush_render().await;
    }

    /// Waits for one input (or the tick), drains whatever else is queued, then redraws.
    pub async fn run_once(&mut self) {
        let signals = self.signals;
        let sample_fut = signals.samples().wait();
        let button_fut = signals.buttons().receive();
        let periodic_timer = Timer::after(self.tick);

        match select3(sample_fut, button_fut, periodic_timer).await {
            Either3::First(sample) => self.handle_sample(sample),
            Either3::Second(press) => self.handle_button(press),
            Either3::Third(_) => self.feed(Input::Tick),
        }
        self.drain();
        self.flush_render().await;
    }

    fn drain(&mut self) {
        while let Some(press) = self.signals.take_button() {
            self.handle_button(press);
        }
        if let Some(sample) = self.signals.take_sample() {
            self.handle_sample(sample);
        }
    }

    fn handle_sample(&mut self, sample: ScaleSample) {
        debug!("Sample {:.1}g", sample.weight_g);
        self.feed(Input::Sample(sample.weight_g));
    }

    fn handle_button(&mut self, press: crate::input::ButtonPress) {
        if self.debouncer.accept(press, Instant::now()) {
            self.feed(Input::Button(press));
        }
    }

    fn feed(&mut self, input: Input) {
        let outputs = self.engine.handle_input(input, Instant::now());
        self.apply(outputs);
    }

    fn apply(&mut self, outputs: Outputs) {
        for output in outputs {
            match output {
                Output::Render(screen) => {
                    // Only the newest screen is worth drawing
                    self.pending_screen = Some(screen);
                }
                Output::StateChanged { from, to } => {
                    if to == WorkflowState::Error {
                        warn!("Workflow error raised from {:?}", from);
                    }
                }
                Output::MealSaved(record) => {
                    info!(
                        "💾 Saved meal at {}: {} dishes, {:.0} kcal",
                        record.timestamp, record.dish_count, record.totals.kcal
                    );
                }
                Output::LedgerCleared => info!("📒 Ledger cleared"),
            }
        }
    }

    async fn flush_render(&mut self) {
        let Some(screen) = self.pending_screen.take() else {
            return;
        };
        let signals = self.signals;
        let engine = &self.engine;
        let interrupted = || signals.has_pending_event(|g| engine.is_significant_sample(g));
        match self.renderer.render(&screen, &interrupted).await {
            Ok(RenderOutcome::Completed) => {}
            Ok(RenderOutcome::Interrupted) => debug!("🖥️ Render cut short by new input"),
            Err(e) => error!("🖥️ {}", e),
        }
    }
}

/// Reads the load cell once per period and publishes the sample.
pub async fn sample_loop<L: LoadCell>(mut cell: L, signals: &'static InputSignals, config: AppConfig) -> ! {
    let period = Duration::from_millis(config.scale.sample_period_ms);
    loop {
        Timer::after(period).await;
        match cell.read_grams() {
            Ok(weight_g) => signals.publish_sample(ScaleSample {
                weight_g,
                received_at: Instant::now(),
            }),
            Err(e) => warn!("⚖️ Sample skipped: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{FrameBuffer, OledRenderer};
    use crate::input::{ButtonPress, KeypadButton};
    use crate::storage::MemoryLedgerStore;
    use crate::system::FixedClock;
    use chrono::NaiveDate;
    use embassy_futures::block_on;

    fn controller(
        signals: &'static InputSignals,
    ) -> NutritionController<MemoryLedgerStore, FixedClock, OledRenderer<FrameBuffer>> {
        let clock = FixedClock::new(
            NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(13, 0, 0)
                .unwrap(),
        );
        let engine = WorkflowEngine::new(AppConfig::default(), MemoryLedgerStore::new(), clock);
        let renderer = OledRenderer::with_slice(FrameBuffer::new(), Duration::from_millis(1));
        NutritionController::new(engine, renderer, signals)
    }

    fn sample(weight_g: f32) -> ScaleSample {
        ScaleSample {
            weight_g,
            received_at: Instant::now(),
        }
    }

    #[test]
    fn test_start_draws_dashboard() {
        static SIGNALS: InputSignals = InputSignals::new();
        let mut c = controller(&SIGNALS);
        block_on(c.start());
        assert_eq!(c.renderer().panel().flushes(), 1);
        assert_eq!(c.engine().state(), WorkflowState::Empty);
    }

    #[test]
    fn test_loop_feeds_samples_and_buttons() {
        static SIGNALS: InputSignals = InputSignals::new();
        let mut c = controller(&SIGNALS);
        block_on(c.start());

        SIGNALS.publish_sample(sample(150.0));
        block_on(c.run_once());
        assert_eq!(c.engine().state(), WorkflowState::DishPending);

        SIGNALS.publish_button(ButtonPress::Matrix(3));
        block_on(c.run_once());
        assert_eq!(c.engine().state(), WorkflowState::GroupB);

        // A bounce right after the press is dropped
        SIGNALS.publish_button(ButtonPress::Matrix(3));
        SIGNALS.publish_sample(sample(150.0));
        block_on(c.run_once());
        assert_eq!(c.engine().state(), WorkflowState::GroupB);
        assert!(!SIGNALS.has_pending());

        SIGNALS.publish_sample(sample(200.0));
        block_on(c.run_once());
        assert_eq!(c.engine().state(), WorkflowState::Weighted);
        assert_eq!(c.engine().pending_item().map(|i| i.weight_g()), Some(50.0));
    }

    #[test]
    fn test_idle_loop_ticks() {
        static SIGNALS: InputSignals = InputSignals::new();
        let mut c = controller(&SIGNALS);
        block_on(c.start());
        SIGNALS.publish_button(ButtonPress::Keypad(KeypadButton::Save));
        block_on(c.run_once());
        assert_eq!(c.engine().state(), WorkflowState::SaveCheck);

        // No input: the loop falls through on the tick and leaves the state alone
        block_on(c.run_once());
        assert_eq!(c.engine().state(), WorkflowState::SaveCheck);
    }
}
