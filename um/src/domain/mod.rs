//! Domain types for the user manager
//!
//! Users as the remote API returns them, the parameter types callers hand to
//! the manager, and the credentials that identify an application session.

mod credentials;
mod params;
mod user;

pub use credentials::Credentials;
pub use params::{UserCreationParams, UserUpdateParams};
pub use user::{User, UserPage};
