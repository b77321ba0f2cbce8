#![allow(dead_code)]
use std::rc::Rc;

use fmha::{
    DataType, LaunchConfig,
    backends::{
        common::{
            DeviceBuffer, NativeBuffer,
            kernel::attention_backward::{
                AttentionBackwardBuffers, AttentionBackwardRequest, KernelVariant, ProblemSet, RngSeeds,
            },
        },
        host::{HostBuffer, HostContext, HostDevice},
    },
};

pub const DEVICE_ID: u32 = 0;

pub fn host_context() -> Rc<HostContext> {
    HostContext::new(HostDevice::new(DEVICE_ID))
}

pub fn limited_host_context(memory_limit: usize) -> Rc<HostContext> {
    HostContext::new(HostDevice::with_memory_limit(DEVICE_ID, memory_limit))
}

pub fn null_buffers() -> AttentionBackwardBuffers {
    let null = DeviceBuffer::new(0, 0, DEVICE_ID);
    AttentionBackwardBuffers {
        query: null,
        key: null,
        value: null,
        dropout_mask: None,
        output: null,
        softmax_lse: null,
        delta: null,
        grad_output: null,
        grad_query: null,
        grad_key: null,
        grad_value: null,
    }
}

/// Request over unbound buffers with the default launch configuration.
pub fn request<'a>(
    host_seqlens_q: &'a [i32],
    host_seqlens_k: &'a [i32],
    num_heads: usize,
    head_dim: usize,
) -> AttentionBackwardRequest<'a> {
    AttentionBackwardRequest {
        batch_size: host_seqlens_q.len().saturating_sub(1),
        num_heads,
        head_dim,
        scale_softmax: 1.0 / (head_dim as f32).sqrt(),
        data_type: DataType::F16,
        buffers: null_buffers(),
        host_seqlens_q,
        host_seqlens_k,
        dropout_probability: 0.0,
        rng_seeds: RngSeeds {
            seed: 42,
            offset: 0,
        },
        config: LaunchConfig::default(),
    }
}

/// Allocates every buffer `request` needs for `variant` and binds it.
///
/// The returned buffers own the memory and must outlive the launch.
pub fn bind_buffers(
    context: &HostContext,
    request: &mut AttentionBackwardRequest,
    variant: KernelVariant,
    with_dropout_mask: bool,
) -> Vec<HostBuffer> {
    let extents = ProblemSet::for_variant(request, variant).unwrap().required_elements();
    let (owned, buffers) =
        context.create_attention_backward_buffers(request.data_type, &extents, with_dropout_mask).unwrap();
    request.buffers = buffers;
    owned
}

pub fn tensor_bytes(buffers: &[HostBuffer]) -> usize {
    buffers.iter().map(|buffer| buffer.length()).sum()
}
