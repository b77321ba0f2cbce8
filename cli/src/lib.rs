pub mod error;
pub mod handlers;
pub mod logger;
pub mod request_file;
