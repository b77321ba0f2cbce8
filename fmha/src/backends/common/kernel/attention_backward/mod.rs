//! Backward pass of fused multi-head attention over a grouped GEMM engine.
//!
//! [`layout`] maps one tensor role to its lengths/strides, [`problem`] builds
//! the per-batch-element problem list, and [`launcher`] drives an
//! [`AttentionBackwardEngine`] through argument building, workspace binding,
//! the support check and dispatch.

mod element_ops;
mod engine;
mod error;
pub mod layout;
mod launcher;
pub mod problem;
mod request;
mod variant;

pub use element_ops::{ElementwiseOperation, ElementwiseOperations};
pub use engine::{AttentionBackwardEngine, EngineInputs, StreamConfig};
pub use error::{AttentionBackwardError, RequestError};
pub use layout::{AttentionShape, TensorRole, compute_layout};
pub use launcher::{AttentionBackwardLauncher, LaunchOutcome, LaunchState};
pub use problem::{ProblemSet, RoleExtents, assemble, assemble_batched, assemble_offsets};
pub use request::{AttentionBackwardBuffers, AttentionBackwardRequest, RngSeeds};
pub use variant::{HeadDimBucket, KernelVariant};
