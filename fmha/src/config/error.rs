use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Stride multiplier `{0}` must be at least 1")]
    InvalidStrideMultiplier(&'static str),
}
