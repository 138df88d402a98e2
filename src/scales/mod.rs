pub mod classifier;
#[cfg(target_os = "espidf")]
pub mod hx711;
pub mod traits;

pub use classifier::{ScaleEvent, TarePolicy, WeightClassifier};
pub use traits::*;
