use fmha::backends::{
    common::{AllocError, kernel::attention_backward::{AttentionBackwardError, RequestError}},
    host::HostError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Unable to read request file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse request file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Pass a request file or --json")]
    MissingRequest,
    #[error("No kernel variant covers head dim {0}")]
    UnsupportedHeadDim(usize),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("Unable to allocate tensors: {0}")]
    Alloc(#[from] AllocError),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Launch(#[from] AttentionBackwardError<HostError>),
}
