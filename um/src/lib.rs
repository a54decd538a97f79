//! UserManager - rate-limited client for a remote user API
//!
//! Application code hands user operations to a [`UserManager`], which admits
//! them into a bounded leaky bucket, releases them onto the network through a
//! sliding dispatch window, and keeps a session-scoped cache of every user it
//! has seen so repeated reads never touch the network.
//!
//! # Modules
//!
//! - [`admission`] - Leaky bucket admission queue
//! - [`dispatch`] - Windowed dispatch gate for network tasks
//! - [`scheduler`] - Throttle and coalesce spacing schedulers
//! - [`store`] - Thread-safe scoped entity cache
//! - [`api`] - Typed requests, URL building and response decoding
//! - [`transport`] - HTTP transport trait and reqwest implementation
//! - [`manager`] - Orchestrator and per-application sessions
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod admission;
pub mod api;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod manager;
pub mod scheduler;
pub mod store;
pub mod transport;
pub mod validation;

// Re-export commonly used types
pub use admission::{AdmissionConfig, LeakyBucket};
pub use config::{ApiConfig, Config, ConfigSource, ValidationConfig};
pub use dispatch::{DispatchConfig, DispatchWindow, NetworkTask};
pub use domain::{Credentials, User, UserCreationParams, UserPage, UserUpdateParams};
pub use error::ManagerError;
pub use manager::{Session, UserManager};
pub use scheduler::{CoalesceScheduler, ThrottleScheduler};
pub use store::{Entity, ScopedCache, UserStore};
pub use transport::{HttpTransport, Method, RawResponse, RequestDescription, Transport, TransportError};
