mod attention_backward;

pub use attention_backward::{HostAttentionBackwardArgument, HostAttentionBackwardEngine};

use super::Host;
use crate::backends::common::Kernels;

pub struct HostKernels;

impl Kernels for HostKernels {
    type Backend = Host;
    type AttentionBackwardEngine = HostAttentionBackwardEngine;
}
