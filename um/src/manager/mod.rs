//! Orchestrator for user operations
//!
//! Wires validation, the session cache, the admission queue, the dispatch
//! window and the transport together:
//!
//! ```text
//! caller -> validate -> cache (reads) -> admission queue -> dispatch window -> transport
//!                                                                                 |
//! caller <----------------------- cache write-back (success only) <---------------+
//! ```

mod commit;
mod session;
mod user_manager;

pub use commit::CacheCommit;
pub use session::Session;
pub use user_manager::UserManager;
