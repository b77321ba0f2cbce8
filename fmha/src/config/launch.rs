use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::utils::FmhaEnvVar;

/// Launch-time knobs for the attention backward launcher.
///
/// `input_permute` selects the `[batch, seq, head, feature]` layout for
/// query/key/value/dropout-mask tensors (`[batch, head, seq, feature]` when
/// false); `output_permute` does the same for the output tensor.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(default)]
pub struct LaunchConfig {
    pub input_permute: bool,
    pub output_permute: bool,
    /// Scales the sequence/batch strides of the query role under `input_permute`.
    pub q_stride_multiplier: usize,
    /// Scales the sequence/batch strides of the key and value roles under `input_permute`.
    pub kv_stride_multiplier: usize,
    pub time_kernel: bool,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            input_permute: true,
            output_permute: true,
            q_stride_multiplier: 1,
            kv_stride_multiplier: 1,
            time_kernel: false,
        }
    }
}

impl LaunchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.q_stride_multiplier == 0 {
            return Err(ConfigError::InvalidStrideMultiplier("q_stride_multiplier"));
        }
        if self.kv_stride_multiplier == 0 {
            return Err(ConfigError::InvalidStrideMultiplier("kv_stride_multiplier"));
        }
        Ok(())
    }

    /// Turns on kernel timing when `FMHA_TIME_KERNEL` is set.
    pub fn with_env_overrides(mut self) -> Self {
        if FmhaEnvVar::TimeKernel.is_enabled() {
            self.time_kernel = true;
        }
        self
    }
}
