use std::fmt;

/// Largest head dimension a kernel instance is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadDimBucket {
    D32,
    D64,
    D128,
}

impl HeadDimBucket {
    pub fn for_head_dim(head_dim: usize) -> Option<Self> {
        match head_dim {
            1..=32 => Some(HeadDimBucket::D32),
            33..=64 => Some(HeadDimBucket::D64),
            65..=128 => Some(HeadDimBucket::D128),
            _ => None,
        }
    }

    pub const fn max_head_dim(&self) -> usize {
        match self {
            HeadDimBucket::D32 => 32,
            HeadDimBucket::D64 => 64,
            HeadDimBucket::D128 => 128,
        }
    }

    pub fn fits(
        &self,
        head_dim: usize,
    ) -> bool {
        head_dim > 0 && head_dim <= self.max_head_dim()
    }
}

/// Engine variant a launcher drives.
///
/// Grouped variants take one problem per batch element and accept unequal
/// sequence lengths. Batched variants take a single problem whose outer
/// group axis spans the batch, so every element must share its lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelVariant {
    Grouped(HeadDimBucket),
    Batched(HeadDimBucket),
}

impl KernelVariant {
    pub fn grouped_for(head_dim: usize) -> Option<Self> {
        HeadDimBucket::for_head_dim(head_dim).map(KernelVariant::Grouped)
    }

    pub fn batched_for(head_dim: usize) -> Option<Self> {
        HeadDimBucket::for_head_dim(head_dim).map(KernelVariant::Batched)
    }

    pub fn head_dim_bucket(&self) -> HeadDimBucket {
        match self {
            KernelVariant::Grouped(bucket) | KernelVariant::Batched(bucket) => *bucket,
        }
    }

    pub fn is_grouped(&self) -> bool {
        matches!(self, KernelVariant::Grouped(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            KernelVariant::Grouped(HeadDimBucket::D32) => "DeviceGroupedMultiheadAttentionBackward_HeadDim32",
            KernelVariant::Grouped(HeadDimBucket::D64) => "DeviceGroupedMultiheadAttentionBackward_HeadDim64",
            KernelVariant::Grouped(HeadDimBucket::D128) => "DeviceGroupedMultiheadAttentionBackward_HeadDim128",
            KernelVariant::Batched(HeadDimBucket::D32) => "DeviceBatchedMultiheadAttentionBackward_HeadDim32",
            KernelVariant::Batched(HeadDimBucket::D64) => "DeviceBatchedMultiheadAttentionBackward_HeadDim64",
            KernelVariant::Batched(HeadDimBucket::D128) => "DeviceBatchedMultiheadAttentionBackward_HeadDim128",
        }
    }
}

impl fmt::Display for KernelVariant {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}
