use embassy_time::Instant;
use serde::{Deserialize, Serialize};

/// Processing selection for the food currently being weighed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Processing {
    #[default]
    None,
    Raw,
    Cooked,
}

/// One reading from the load cell, gross grams as delivered by the driver.
#[derive(Debug, Clone, Copy)]
pub struct ScaleSample {
    pub weight_g: f32,
    pub received_at: Instant,
}

// Scale classification
pub const NOISE_THRESHOLD_G: f32 = 2.0;
pub const RELEASE_THRESHOLD_G: f32 = 5.0; // |removed - expected| below this counts as fully released
pub const ZERO_SNAP_G: f32 = 1.0;
pub const SAMPLE_PERIOD_MS: u64 = 500;
pub const LOAD_CELL_COUNTS_PER_GRAM: f32 = 420.0; // 5 kg bar, HX711 gain 128

// Workflow timers
pub const CONFIRM_TIMEOUT_MS: u64 = 10_000;
pub const ERROR_DWELL_MS: u64 = 3_000;
pub const CANCEL_DWELL_MS: u64 = 1_000;
pub const WARNING_DWELL_MS: u64 = 3_000;
pub const SAVED_RETURN_MS: u64 = 3_000;
pub const LEDGER_RESET_CONFIRM_MS: u64 = 5_000;
pub const LEDGER_RESET_DONE_MS: u64 = 2_000;

// Input
pub const BUTTON_DEBOUNCE_MS: u64 = 200;
pub const EVENT_HISTORY_SIZE: usize = 5;
pub const MAX_OUTPUTS: usize = 8;

// Display animation
pub const ANIMATION_SLICE_MS: u64 = 50;
