//! Dispatch window (sliding-rate gate)
//!
//! Releases at most `limit` network tasks per window. Excess tasks wait in a
//! FIFO and are flushed when the window elapses. Unlike the admission queue
//! this stage never rejects: rejection already happened upstream.

mod config;
mod window;

pub use config::DispatchConfig;
pub use window::{DispatchWindow, NetworkTask, WindowStats};
