//! Per-batch-element problem list for the grouped GEMM engine.

use itertools::Itertools;

use super::{AttentionBackwardRequest, KernelVariant, RequestError, layout::*};
use crate::{
    LaunchConfig,
    backends::common::gpu_types::{ProblemDescriptor, ProblemOffsets, TensorDescriptor},
};

/// Elements each buffer role must hold for a problem list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleExtents {
    pub query: usize,
    pub key: usize,
    pub value: usize,
    pub output: usize,
    pub dropout_mask: usize,
    pub softmax_lse: usize,
}

/// Problems in engine order together with their buffer offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemSet {
    pub problems: Vec<ProblemDescriptor>,
    pub offsets: Vec<ProblemOffsets>,
}

impl ProblemSet {
    /// Builds the problem list shape the variant expects: one problem per
    /// batch element for grouped variants, a single batch-wide problem for
    /// batched ones.
    pub fn for_variant(
        request: &AttentionBackwardRequest,
        variant: KernelVariant,
    ) -> Result<Self, RequestError> {
        request.check_extents()?;
        let problem_set = if variant.is_grouped() {
            Self {
                problems: assemble(request)?,
                offsets: assemble_offsets(request)?,
            }
        } else {
            Self {
                problems: vec![assemble_batched(request)?],
                offsets: vec![ProblemOffsets::default()],
            }
        };
        log::debug!(
            "assembled {} problem(s) for {variant} (batch {}, heads {}, head dim {})",
            problem_set.len(),
            request.batch_size,
            request.num_heads,
            request.head_dim
        );
        Ok(problem_set)
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// Highest element each role addresses across all problems, saturating
    /// at `usize::MAX`.
    pub fn required_elements(&self) -> RoleExtents {
        fn end(
            offset: usize,
            descriptor: &TensorDescriptor,
        ) -> usize {
            match descriptor.element_span() {
                0 => 0,
                span => offset.saturating_add(span),
            }
        }

        self.problems.iter().zip(&self.offsets).fold(RoleExtents::default(), |extents, (problem, offsets)| {
            RoleExtents {
                query: extents.query.max(end(offsets.query, &problem.query)),
                key: extents.key.max(end(offsets.key, &problem.key)),
                value: extents.value.max(end(offsets.value, &problem.value)),
                output: extents.output.max(end(offsets.output, &problem.output)),
                dropout_mask: extents.dropout_mask.max(end(offsets.dropout_mask, &problem.dropout_mask)),
                softmax_lse: extents.softmax_lse.max(end(offsets.softmax_lse, &problem.softmax_lse)),
            }
        })
    }
}

fn build_problem(
    shape: &AttentionShape,
    config: &LaunchConfig,
) -> ProblemDescriptor {
    let input_permute = config.input_permute;
    ProblemDescriptor {
        query: compute_layout(TensorRole::Query, shape, input_permute, config.q_stride_multiplier),
        key: compute_layout(TensorRole::Key, shape, input_permute, config.kv_stride_multiplier),
        dropout_mask: compute_layout(TensorRole::DropoutMask, shape, input_permute, 1),
        value: compute_layout(TensorRole::Value, shape, input_permute, config.kv_stride_multiplier),
        output: compute_layout(TensorRole::Output, shape, config.output_permute, 1),
        softmax_lse: compute_layout(TensorRole::SoftmaxLse, shape, input_permute, 1),
        acc0_bias: TensorDescriptor::empty(),
        acc1_bias: TensorDescriptor::empty(),
    }
}

/// One problem per batch element, in batch order.
pub fn assemble(request: &AttentionBackwardRequest) -> Result<Vec<ProblemDescriptor>, RequestError> {
    let problems = request
        .sequence_lengths()?
        .into_iter()
        .map(|(seq_len_q, seq_len_k)| {
            let shape = AttentionShape::new(seq_len_q, seq_len_k, request.head_dim, request.num_heads);
            build_problem(&shape, &request.config)
        })
        .collect();
    Ok(problems)
}

/// A single problem whose outer group axis spans the whole batch.
pub fn assemble_batched(request: &AttentionBackwardRequest) -> Result<ProblemDescriptor, RequestError> {
    let lengths = request.sequence_lengths()?;
    let Ok(&(seq_len_q, seq_len_k)) = lengths.iter().all_equal_value() else {
        return Err(RequestError::new(
            "host_seqlens_q",
            "batched kernels need every batch element to share its query and key lengths",
        ));
    };
    let shape =
        AttentionShape::new(seq_len_q, seq_len_k, request.head_dim, request.num_heads).with_group_count(request.batch_size);
    Ok(build_problem(&shape, &request.config))
}

/// Element offset of every batch element's region in each buffer.
pub fn assemble_offsets(request: &AttentionBackwardRequest) -> Result<Vec<ProblemOffsets>, RequestError> {
    request.check_extents()?;
    let (q_offsets, k_offsets) = request.cumulative_offsets()?;
    let config = &request.config;
    let heads = request.num_heads;
    let row = heads * request.head_dim;
    let (q_row, kv_row) = if config.input_permute {
        (row * config.q_stride_multiplier, row * config.kv_stride_multiplier)
    } else {
        (row, row)
    };

    let mut dropout_mask = 0;
    let offsets = q_offsets
        .iter()
        .tuple_windows()
        .zip(k_offsets.iter().tuple_windows())
        .map(|((&q_start, &q_end), (&k_start, &k_end))| {
            let offsets = ProblemOffsets {
                query: q_start * q_row,
                key: k_start * kv_row,
                value: k_start * kv_row,
                output: q_start * row,
                dropout_mask,
                softmax_lse: q_start * heads,
            };
            dropout_mask += heads * (q_end - q_start) * (k_end - k_start);
            offsets
        })
        .collect();
    Ok(offsets)
}
