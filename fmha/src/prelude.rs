//! Prelude module containing commonly used types from the fmha crate.
//!
//! This module can be imported with `use fmha::prelude::*;` to bring the most
//! frequently used types into scope.

// Constants & Configuration
// Backend Abstractions
// Host Backend
// Attention Backward
pub use crate::{
    DataType, LaunchConfig, VERSION,
    backends::{
        common::{
            AllocError, Backend, Context, Device, DeviceBuffer, NativeBuffer, Stream,
            kernel::attention_backward::{
                AttentionBackwardBuffers, AttentionBackwardError, AttentionBackwardLauncher, AttentionBackwardRequest,
                KernelVariant, LaunchOutcome, LaunchState, ProblemSet, RequestError, RngSeeds,
            },
        },
        host::{Host, HostBuffer, HostContext, HostDevice, HostError, HostStream},
    },
};
