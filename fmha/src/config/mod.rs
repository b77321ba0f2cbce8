mod error;
mod launch;

pub use error::ConfigError;
pub use launch::LaunchConfig;
