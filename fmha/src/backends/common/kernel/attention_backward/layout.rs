//! Lengths and strides of each attention backward operand.
//!
//! With `permute` the physical layout is `[batch, seq, head, feature]`
//! (heads interleaved with the sequence), otherwise `[batch, head, seq,
//! feature]`. A stride multiplier accounts for sibling tensors interleaved in
//! the same allocation (for instance packed query/key/value) and only widens
//! the batch and sequence strides of the query, key and value roles under
//! `permute`.

use crate::backends::common::gpu_types::TensorDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TensorRole {
    Query,
    Key,
    Value,
    Output,
    DropoutMask,
    SoftmaxLse,
}

impl TensorRole {
    pub const ALL: [TensorRole; 6] = [
        TensorRole::Query,
        TensorRole::Key,
        TensorRole::Value,
        TensorRole::Output,
        TensorRole::DropoutMask,
        TensorRole::SoftmaxLse,
    ];

    pub fn uses_stride_multiplier(&self) -> bool {
        matches!(self, TensorRole::Query | TensorRole::Key | TensorRole::Value)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TensorRole::Query => "query",
            TensorRole::Key => "key",
            TensorRole::Value => "value",
            TensorRole::Output => "output",
            TensorRole::DropoutMask => "dropout_mask",
            TensorRole::SoftmaxLse => "softmax_lse",
        }
    }
}

/// Logical problem size of one engine problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttentionShape {
    /// Outer group axis: 1 for grouped problems, the batch size for batched ones.
    pub group_count: usize,
    pub num_heads: usize,
    /// Query sequence length (M).
    pub seq_len_q: usize,
    /// Key/value sequence length (N).
    pub seq_len_k: usize,
    /// Feature width of query, key, value and output (K = O).
    pub head_dim: usize,
}

impl AttentionShape {
    pub fn new(
        seq_len_q: usize,
        seq_len_k: usize,
        head_dim: usize,
        num_heads: usize,
    ) -> Self {
        Self {
            group_count: 1,
            num_heads,
            seq_len_q,
            seq_len_k,
            head_dim,
        }
    }

    pub fn with_group_count(
        self,
        group_count: usize,
    ) -> Self {
        Self {
            group_count,
            ..self
        }
    }

    /// Number of elements the role's region occupies in its flat buffer,
    /// `None` when it does not fit `usize`.
    pub fn region_extent(
        &self,
        role: TensorRole,
        permute: bool,
        stride_multiplier: usize,
    ) -> Option<usize> {
        let multiplier = if permute && role.uses_stride_multiplier() {
            stride_multiplier
        } else {
            1
        };
        let Self {
            group_count,
            num_heads,
            seq_len_q,
            seq_len_k,
            head_dim,
        } = *self;
        let per_head = match role {
            TensorRole::Query | TensorRole::Output => [seq_len_q, head_dim],
            TensorRole::Key | TensorRole::Value => [seq_len_k, head_dim],
            TensorRole::DropoutMask => [seq_len_q, seq_len_k],
            TensorRole::SoftmaxLse => [seq_len_q, 1],
        };
        [group_count, num_heads, multiplier].into_iter().chain(per_head).try_fold(1usize, usize::checked_mul)
    }
}

/// Computes the view of `role` for one problem.
///
/// `stride_multiplier` is ignored by the output, dropout-mask and
/// log-sum-exp roles, and the log-sum-exp view does not depend on `permute`.
pub fn compute_layout(
    role: TensorRole,
    shape: &AttentionShape,
    permute: bool,
    stride_multiplier: usize,
) -> TensorDescriptor {
    let AttentionShape {
        group_count: g0,
        num_heads: g1,
        seq_len_q: m,
        seq_len_k: n,
        head_dim: k,
    } = *shape;

    match role {
        TensorRole::Query => sequence_major(g0, g1, m, k, permute, stride_multiplier),
        TensorRole::Key => sequence_major(g0, g1, n, k, permute, stride_multiplier),
        TensorRole::Value => feature_major(g0, g1, n, k, permute, stride_multiplier),
        TensorRole::Output => sequence_major(g0, g1, m, k, permute, 1),
        TensorRole::DropoutMask => sequence_major(g0, g1, m, n, permute, 1),
        TensorRole::SoftmaxLse => TensorDescriptor::new(vec![g0, g1, m], positive([product(&[g1, m]), m, 1])),
    }
}

/// `[G0, G1, rows, cols]` with `cols` contiguous.
fn sequence_major(
    g0: usize,
    g1: usize,
    rows: usize,
    cols: usize,
    permute: bool,
    multiplier: usize,
) -> TensorDescriptor {
    let strides = if permute {
        // [G0, rows, G1, cols]
        [product(&[rows, g1, cols, multiplier]), cols, product(&[g1, cols, multiplier]), 1]
    } else {
        // [G0, G1, rows, cols]
        [product(&[g1, rows, cols]), product(&[rows, cols]), cols, 1]
    };
    TensorDescriptor::new(vec![g0, g1, rows, cols], positive(strides))
}

/// `[G0, G1, feature, seq]` view over a buffer stored sequence-major.
fn feature_major(
    g0: usize,
    g1: usize,
    seq: usize,
    feature: usize,
    permute: bool,
    multiplier: usize,
) -> TensorDescriptor {
    let strides = if permute {
        // [G0, seq, G1, feature]
        [product(&[seq, g1, feature, multiplier]), feature, 1, product(&[g1, feature, multiplier])]
    } else {
        // [G0, G1, seq, feature]
        [product(&[g1, seq, feature]), product(&[seq, feature]), 1, feature]
    };
    TensorDescriptor::new(vec![g0, g1, feature, seq], positive(strides))
}

// Saturates at `usize::MAX`, so an oversized view can never pass a buffer
// coverage check.
fn product(factors: &[usize]) -> usize {
    factors.iter().fold(1usize, |product, &factor| product.saturating_mul(factor))
}

// A zero-length sequence collapses products to 0; such axes are never indexed.
fn positive<const RANK: usize>(strides: [usize; RANK]) -> Vec<usize> {
    strides.iter().map(|&stride| stride.max(1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_interleaved_heads() {
        let shape = AttentionShape::new(3, 3, 4, 2);
        let query = compute_layout(TensorRole::Query, &shape, true, 1);
        assert_eq!(query.lengths(), &[1, 2, 3, 4]);
        assert_eq!(query.strides(), &[24, 4, 8, 1]);
    }

    #[test]
    fn test_query_grouped_heads() {
        let shape = AttentionShape::new(3, 3, 4, 2);
        let query = compute_layout(TensorRole::Query, &shape, false, 1);
        assert_eq!(query.lengths(), &[1, 2, 3, 4]);
        assert_eq!(query.strides(), &[24, 12, 4, 1]);
    }

    #[test]
    fn test_value_swaps_sequence_and_feature() {
        let shape = AttentionShape::new(3, 5, 4, 2);

        let permuted = compute_layout(TensorRole::Value, &shape, true, 1);
        assert_eq!(permuted.lengths(), &[1, 2, 4, 5]);
        assert_eq!(permuted.strides(), &[40, 4, 1, 8]);

        let grouped = compute_layout(TensorRole::Value, &shape, false, 1);
        assert_eq!(grouped.lengths(), &[1, 2, 4, 5]);
        assert_eq!(grouped.strides(), &[40, 20, 1, 4]);
    }

    #[test]
    fn test_stride_multiplier_applies_to_inputs_only() {
        let shape = AttentionShape::new(3, 5, 4, 2);

        let query = compute_layout(TensorRole::Query, &shape, true, 3);
        assert_eq!(query.strides(), &[72, 4, 24, 1]);

        let key = compute_layout(TensorRole::Key, &shape, true, 2);
        assert_eq!(key.strides(), &[80, 4, 16, 1]);

        let value = compute_layout(TensorRole::Value, &shape, true, 2);
        assert_eq!(value.strides(), &[80, 4, 1, 16]);

        let output = compute_layout(TensorRole::Output, &shape, true, 3);
        assert_eq!(output.strides(), &[24, 4, 8, 1]);

        let grouped_query = compute_layout(TensorRole::Query, &shape, false, 3);
        assert_eq!(grouped_query.strides(), &[24, 12, 4, 1]);
    }

    #[test]
    fn test_dropout_mask_and_lse() {
        let shape = AttentionShape::new(3, 5, 4, 2);

        let mask = compute_layout(TensorRole::DropoutMask, &shape, true, 1);
        assert_eq!(mask.lengths(), &[1, 2, 3, 5]);
        assert_eq!(mask.strides(), &[30, 5, 10, 1]);

        let mask = compute_layout(TensorRole::DropoutMask, &shape, false, 1);
        assert_eq!(mask.strides(), &[30, 15, 5, 1]);

        let lse = compute_layout(TensorRole::SoftmaxLse, &shape, true, 1);
        assert_eq!(lse.lengths(), &[1, 2, 3]);
        assert_eq!(lse.strides(), &[6, 3, 1]);
        assert_eq!(lse, compute_layout(TensorRole::SoftmaxLse, &shape, false, 4));
    }

    #[test]
    fn test_empty_sequence_keeps_positive_strides() {
        let shape = AttentionShape::new(0, 5, 4, 2);
        for role in TensorRole::ALL {
            for permute in [true, false] {
                let descriptor = compute_layout(role, &shape, permute, 1);
                assert!(descriptor.strides().iter().all(|&stride| stride > 0), "{role:?} permute={permute}");
                if !matches!(role, TensorRole::Key | TensorRole::Value) {
                    assert_eq!(descriptor.element_span(), 0, "{role:?} permute={permute}");
                }
            }
        }
        let query = compute_layout(TensorRole::Query, &shape, true, 1);
        assert_eq!(query.lengths(), &[1, 2, 0, 4]);
    }

    #[test]
    fn test_group_count_scales_outer_axis() {
        let shape = AttentionShape::new(3, 3, 4, 2).with_group_count(5);
        let query = compute_layout(TensorRole::Query, &shape, true, 1);
        assert_eq!(query.lengths(), &[5, 2, 3, 4]);
        assert_eq!(Some(query.element_span()), shape.region_extent(TensorRole::Query, true, 1));
    }

    #[test]
    fn test_oversized_shape_saturates() {
        let shape = AttentionShape::new(1 << 30, 1 << 30, 128, 1 << 27);
        let query = compute_layout(TensorRole::Query, &shape, true, 1);
        assert_eq!(query.strides()[0], usize::MAX);
        assert_eq!(query.strides()[2], 1 << 34);
        assert_eq!(query.element_span(), usize::MAX);
        assert_eq!(shape.region_extent(TensorRole::Query, true, 1), None);
        assert_eq!(shape.region_extent(TensorRole::SoftmaxLse, true, 1), Some(1 << 57));
    }
}
