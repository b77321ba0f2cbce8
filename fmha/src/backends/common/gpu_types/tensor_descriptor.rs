/// Lengths and element strides of a logical tensor view over a flat buffer.
///
/// Rank-4 views are ordered `[batch-group, head-group, sequence, feature]`
/// (the value role swaps the last two axes), the log-sum-exp statistic is
/// rank 3, and rank 0 marks an unused operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TensorDescriptor {
    lengths: Vec<usize>,
    strides: Vec<usize>,
}

impl TensorDescriptor {
    pub fn new(
        lengths: Vec<usize>,
        strides: Vec<usize>,
    ) -> Self {
        debug_assert_eq!(lengths.len(), strides.len());
        Self {
            lengths,
            strides,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn rank(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Saturates at `usize::MAX`.
    pub fn element_count(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        self.lengths.iter().fold(1usize, |count, &length| count.saturating_mul(length))
    }

    /// One past the largest element offset the view can address; 0 when any
    /// axis is empty. Saturates at `usize::MAX`.
    pub fn element_span(&self) -> usize {
        if self.is_empty() || self.lengths.contains(&0) {
            return 0;
        }
        self.lengths
            .iter()
            .zip(&self.strides)
            .fold(1usize, |span, (&length, &stride)| span.saturating_add((length - 1).saturating_mul(stride)))
    }
}
