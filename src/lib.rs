pub mod controller;
pub mod hardware;
pub mod input;
pub mod nutrition;
pub mod scales;
pub mod storage;
pub mod system;
pub mod types;
pub mod workflow;

pub use types::*;
pub use controller::*;
