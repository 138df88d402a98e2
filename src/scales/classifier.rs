//! Weight-sample classifier
//! Turns the continuously re-sampled load-cell reading into discrete scale events.

use crate::system::config::ScaleConfig;
use log::debug;
use serde::{Deserialize, Serialize};

/// Semantic meaning of a weight change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScaleEvent {
    /// Something was placed or added.
    Increment,
    /// Something was taken off but the scale still reads clearly positive.
    Decrement,
    /// The reading settled after a tare.
    Tare,
    /// Removal in progress; the reading crossed zero but does not match the load yet.
    PartialRemove,
    /// Everything has been lifted off.
    Release,
}

/// How a change right after a tare is classified.
///
/// The two appliance firmwares disagree on this, so both are kept selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TarePolicy {
    /// Increases are `Increment` unless rising back from a negative reading. Decreases
    /// that stay positive are `Decrement`; only a drop to zero counts as `Tare`.
    #[default]
    IncrementWins,
    /// Any change while the tare flag is set is `Tare`.
    FlagFirst,
}

/// Everything a single classification looks at.
#[derive(Debug, Clone, Copy)]
pub struct Reading {
    pub last_g: f32,
    pub new_g: f32,
    pub tared: bool,
    pub expected_remove_g: f32,
}

/// Classifies one change. `None` when the difference is sensor noise.
pub fn classify(reading: Reading, config: &ScaleConfig) -> Option<ScaleEvent> {
    let Reading {
        last_g,
        new_g,
        tared,
        expected_remove_g,
    } = reading;

    if (new_g - last_g).abs() <= config.noise_threshold_g {
        return None;
    }

    let removal = || {
        if (new_g.abs() - expected_remove_g).abs() < config.release_threshold_g {
            ScaleEvent::Release
        } else {
            ScaleEvent::PartialRemove
        }
    };

    let event = match config.tare_policy {
        TarePolicy::FlagFirst => {
            if tared {
                ScaleEvent::Tare
            } else if new_g > last_g {
                ScaleEvent::Increment
            } else if new_g >= config.zero_snap_g {
                ScaleEvent::Decrement
            } else {
                removal()
            }
        }
        TarePolicy::IncrementWins => {
            if new_g > last_g {
                if last_g > -config.zero_snap_g {
                    ScaleEvent::Increment
                } else {
                    ScaleEvent::Tare
                }
            } else if new_g >= config.zero_snap_g {
                ScaleEvent::Decrement
            } else if tared {
                ScaleEvent::Tare
            } else {
                removal()
            }
        }
    };
    Some(event)
}

/// Snaps readings below the threshold, negatives included, to zero.
pub fn snap(weight_g: f32, zero_snap_g: f32) -> f32 {
    if weight_g < zero_snap_g {
        0.0
    } else {
        weight_g
    }
}

/// Stateful wrapper: keeps the reference weight, the tare offset and the tare flag.
#[derive(Debug, Clone)]
pub struct WeightClassifier {
    config: ScaleConfig,
    offset_g: f32,
    last_gross_g: f32,
    reference_g: f32,
    stable_g: f32,
    tared: bool,
}

impl WeightClassifier {
    pub fn new(config: ScaleConfig) -> Self {
        Self {
            config,
            offset_g: 0.0,
            last_gross_g: 0.0,
            reference_g: 0.0,
            stable_g: 0.0,
            tared: false,
        }
    }

    pub fn config(&self) -> &ScaleConfig {
        &self.config
    }

    /// Feeds one gross sample. Returns the event it caused, if any.
    pub fn process_sample(&mut self, gross_g: f32, expected_remove_g: f32) -> Option<ScaleEvent> {
        self.last_gross_g = gross_g;
        let net_g = gross_g - self.offset_g;

        let event = classify(
            Reading {
                last_g: self.reference_g,
                new_g: net_g,
                tared: self.tared,
                expected_remove_g,
            },
            &self.config,
        )?;

        debug!(
            "⚖️ {:?}: {:.1}g -> {:.1}g (expect remove {:.1}g)",
            event, self.reference_g, net_g, expected_remove_g
        );
        self.reference_g = net_g;
        self.stable_g = snap(net_g, self.config.zero_snap_g);
        self.tared = false;
        Some(event)
    }

    /// Zeroes the scale at the current gross reading.
    ///
    /// The reference weight is kept, so the next sample (now near zero) is the one that
    /// reports the tare. Nothing is pending when the reference already reads zero.
    pub fn tare(&mut self) {
        self.offset_g = self.last_gross_g;
        self.stable_g = 0.0;
        self.tared = self.reference_g.abs() > self.config.noise_threshold_g;
    }

    /// Whether a gross reading would produce an event rather than count as noise.
    pub fn is_significant(&self, gross_g: f32) -> bool {
        let net_g = gross_g - self.offset_g;
        (net_g - self.reference_g).abs() > self.config.noise_threshold_g
    }

    /// Weight used for display and for new food items.
    pub fn stable_weight(&self) -> f32 {
        self.stable_g
    }

    pub fn is_tared(&self) -> bool {
        self.tared
    }
}
