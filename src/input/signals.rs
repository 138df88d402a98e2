//! Hand-off points between interrupt-side producers and the main loop

use super::buttons::ButtonPress;
use crate::scales::traits::ScaleSampleSignal;
use crate::types::ScaleSample;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use log::warn;

pub const BUTTON_QUEUE_DEPTH: usize = 8;

pub type ButtonChannel = Channel<CriticalSectionRawMutex, ButtonPress, BUTTON_QUEUE_DEPTH>;

/// Samples are latest-wins; button presses queue up.
pub struct InputSignals {
    samples: ScaleSampleSignal,
    buttons: ButtonChannel,
}

impl InputSignals {
    pub const fn new() -> Self {
        Self {
            samples: ScaleSampleSignal::new(),
            buttons: ButtonChannel::new(),
        }
    }

    pub fn publish_sample(&self, sample: ScaleSample) {
        self.samples.signal(sample);
    }

    pub fn publish_button(&self, press: ButtonPress) {
        if self.buttons.try_send(press).is_err() {
            warn!("🔘 Button queue full, dropping {:?}", press);
        }
    }

    pub fn take_sample(&self) -> Option<ScaleSample> {
        self.samples.try_take()
    }

    pub fn take_button(&self) -> Option<ButtonPress> {
        self.buttons.try_receive().ok()
    }

    /// Anything the loop has not consumed yet. Renders poll this to cut animations short.
    pub fn has_pending(&self) -> bool {
        self.samples.signaled() || !self.buttons.is_empty()
    }

    /// Like [`has_pending`](Self::has_pending), but an unread sample only counts when
    /// `significant` says it would classify. Sensor noise must not cut animations short.
    /// The sample stays available to the loop either way.
    pub fn has_pending_event(&self, significant: impl Fn(f32) -> bool) -> bool {
        if !self.buttons.is_empty() {
            return true;
        }
        match self.samples.try_take() {
            Some(sample) => {
                let hit = significant(sample.weight_g);
                // A newer sample may have landed in between; it wins
                if !self.samples.signaled() {
                    self.samples.signal(sample);
                }
                hit
            }
            None => false,
        }
    }

    pub fn samples(&self) -> &ScaleSampleSignal {
        &self.samples
    }

    pub fn buttons(&self) -> &ButtonChannel {
        &self.buttons
    }
}

impl Default for InputSignals {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_time::Instant;

    #[test]
    fn test_latest_sample_wins() {
        let signals = InputSignals::new();
        assert!(!signals.has_pending());

        for weight_g in [10.0, 20.0, 30.0] {
            signals.publish_sample(ScaleSample {
                weight_g,
                received_at: Instant::from_millis(0),
            });
        }
        assert!(signals.has_pending());
        assert_eq!(signals.take_sample().map(|s| s.weight_g), Some(30.0));
        assert!(signals.take_sample().is_none());
        assert!(!signals.has_pending());
    }

    #[test]
    fn test_buttons_queue_in_order_and_overflow_drops() {
        let signals = InputSignals::new();
        for id in 1..=(BUTTON_QUEUE_DEPTH as u8 + 2) {
            signals.publish_button(ButtonPress::Matrix(id));
        }
        let drained: Vec<_> = std::iter::from_fn(|| signals.take_button()).collect();
        assert_eq!(drained.len(), BUTTON_QUEUE_DEPTH);
        assert_eq!(drained[0], ButtonPress::Matrix(1));
        assert_eq!(drained[BUTTON_QUEUE_DEPTH - 1], ButtonPress::Matrix(BUTTON_QUEUE_DEPTH as u8));
    }

    #[test]
    fn test_noise_sample_is_not_a_pending_event() {
        let signals = InputSignals::new();
        let significant = |g: f32| (g - 100.0).abs() > 2.0;
        signals.publish_sample(ScaleSample {
            weight_g: 101.0,
            received_at: Instant::from_millis(0),
        });
        assert!(!signals.has_pending_event(significant));
        assert_eq!(signals.take_sample().map(|s| s.weight_g), Some(101.0));

        signals.publish_sample(ScaleSample {
            weight_g: 180.0,
            received_at: Instant::from_millis(500),
        });
        assert!(signals.has_pending_event(significant));
        assert!(signals.has_pending());

        signals.take_sample();
        signals.publish_button(ButtonPress::Matrix(4));
        assert!(signals.has_pending_event(|_| false));
    }
}
