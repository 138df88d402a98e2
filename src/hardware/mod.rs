pub mod display;
pub mod framebuffer;
#[cfg(target_os = "espidf")]
pub mod oled;

pub use display::{DisplayError, OledRenderer, Panel, RenderOutcome, Renderer};
pub use framebuffer::FrameBuffer;
