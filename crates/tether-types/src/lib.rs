//! Shared conversation types and error hierarchy for Tether.

pub mod error;
pub mod message;
pub mod provider;
pub mod util;

pub use error::{ApiError, ConfigError, TetherError};
pub use message::*;
pub use provider::ModelBackend;
pub use util::{preview, truncate_str, truncate_string};
