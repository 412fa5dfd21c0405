pub mod config;
pub mod error;
pub mod types;

pub use config::RemindConfig;
pub use error::{RemindError, Result};
pub use types::*;
