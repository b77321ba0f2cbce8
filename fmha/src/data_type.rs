use bytemuck::Pod;
use half::{bf16, f16};
use num_traits::NumCast;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    // Floating point
    BF16,
    F16,
    F32,
    // Dropout mask storage
    U16,
}

impl DataType {
    pub const fn size_in_bits(&self) -> usize {
        match self {
            DataType::BF16 | DataType::F16 | DataType::U16 => 16,
            DataType::F32 => 32,
        }
    }

    pub const fn size_in_bytes(&self) -> usize {
        self.size_in_bits().div_ceil(8)
    }

    pub const fn is_floating_point(&self) -> bool {
        matches!(self, DataType::BF16 | DataType::F16 | DataType::F32)
    }

    pub const fn short_name(&self) -> &'static str {
        match self {
            DataType::BF16 => "bf16",
            DataType::F16 => "fp16",
            DataType::F32 => "fp32",
            DataType::U16 => "u16",
        }
    }
}

/// Element type of the softmax log-sum-exp statistic and of the delta buffer.
pub const STATISTIC_DATA_TYPE: DataType = DataType::F32;

/// Element type of a materialized dropout mask.
pub const DROPOUT_MASK_DATA_TYPE: DataType = DataType::U16;

pub trait ArrayElement: NumCast + Pod {
    fn data_type() -> DataType;
}

macro_rules! impl_array_element {
    ($($type:ty => $variant:ident),+ $(,)?) => {
        $(
            impl ArrayElement for $type {
                fn data_type() -> DataType {
                    DataType::$variant
                }
            }
        )+
    };
}

impl_array_element! {
    f16 => F16,
    bf16 => BF16,
    f32 => F32,
    u16 => U16,
}
