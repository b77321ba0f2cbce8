use super::TensorDescriptor;

/// Operand views for one batch element of the grouped attention backward GEMM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemDescriptor {
    pub query: TensorDescriptor,
    pub key: TensorDescriptor,
    pub dropout_mask: TensorDescriptor,
    pub value: TensorDescriptor,
    pub output: TensorDescriptor,
    pub softmax_lse: TensorDescriptor,
    /// Bias added to the pre-softmax accumulation. Always empty.
    pub acc0_bias: TensorDescriptor,
    /// Bias added to the output accumulation. Always empty.
    pub acc1_bias: TensorDescriptor,
}

impl ProblemDescriptor {
    pub fn group_count(&self) -> usize {
        self.query.lengths()[0]
    }

    pub fn num_heads(&self) -> usize {
        self.query.lengths()[1]
    }

    pub fn seq_len_q(&self) -> usize {
        self.query.lengths()[2]
    }

    pub fn seq_len_k(&self) -> usize {
        self.key.lengths()[2]
    }

    pub fn head_dim(&self) -> usize {
        self.query.lengths()[3]
    }
}

/// Element offsets of one batch element's region inside each flat buffer.
///
/// Gradient buffers share the offsets of the tensor they differentiate, and
/// the delta buffer shares the log-sum-exp offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProblemOffsets {
    pub query: usize,
    pub key: usize,
    pub value: usize,
    pub output: usize,
    pub dropout_mask: usize,
    pub softmax_lse: usize,
}
