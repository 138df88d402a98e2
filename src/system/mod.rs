pub mod clock;
pub mod config;

pub use clock::*;
pub use config::*;
