pub mod common;
pub mod host;
