use itertools::Itertools;

use super::{ElementwiseOperations, RequestError, problem::RoleExtents};
use crate::{
    DROPOUT_MASK_DATA_TYPE, DataType, LaunchConfig, STATISTIC_DATA_TYPE, backends::common::DeviceBuffer,
};

/// Device buffers read and written by one attention backward launch.
///
/// Gradient buffers share the layout of the tensor they differentiate and the
/// delta buffer (row sums of `output * grad_output`) shares the log-sum-exp
/// layout. `dropout_mask` is absent when no mask is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttentionBackwardBuffers {
    pub query: DeviceBuffer,
    pub key: DeviceBuffer,
    pub value: DeviceBuffer,
    pub dropout_mask: Option<DeviceBuffer>,
    pub output: DeviceBuffer,
    pub softmax_lse: DeviceBuffer,
    pub delta: DeviceBuffer,
    pub grad_output: DeviceBuffer,
    pub grad_query: DeviceBuffer,
    pub grad_key: DeviceBuffer,
    pub grad_value: DeviceBuffer,
}

/// Philox seed and offset forwarded to the engine's dropout generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RngSeeds {
    pub seed: u64,
    pub offset: u64,
}

#[derive(Debug, Clone)]
pub struct AttentionBackwardRequest<'a> {
    pub batch_size: usize,
    pub num_heads: usize,
    pub head_dim: usize,
    pub scale_softmax: f32,
    pub data_type: DataType,
    pub buffers: AttentionBackwardBuffers,
    /// Cumulative query offsets, `batch_size + 1` entries starting at 0.
    pub host_seqlens_q: &'a [i32],
    /// Cumulative key/value offsets, `batch_size + 1` entries starting at 0.
    pub host_seqlens_k: &'a [i32],
    pub dropout_probability: f32,
    pub rng_seeds: RngSeeds,
    pub config: LaunchConfig,
}

impl<'a> AttentionBackwardRequest<'a> {
    pub fn input_permute(&self) -> bool {
        self.config.input_permute
    }

    pub fn output_permute(&self) -> bool {
        self.config.output_permute
    }

    pub fn element_ops(&self) -> ElementwiseOperations {
        ElementwiseOperations::with_softmax_scale(self.scale_softmax)
    }

    /// Checks every scalar and both cumulative offset arrays.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.batch_size == 0 {
            return Err(RequestError::new("batch_size", "must be positive"));
        }
        if self.num_heads == 0 {
            return Err(RequestError::new("num_heads", "must be positive"));
        }
        if self.head_dim == 0 {
            return Err(RequestError::new("head_dim", "must be positive"));
        }
        if !self.scale_softmax.is_finite() {
            return Err(RequestError::new("scale_softmax", format!("must be finite, got {}", self.scale_softmax)));
        }
        if !(0.0..1.0).contains(&self.dropout_probability) {
            return Err(RequestError::new(
                "dropout_probability",
                format!("must be in [0, 1), got {}", self.dropout_probability),
            ));
        }
        if !self.data_type.is_floating_point() {
            return Err(RequestError::new(
                "data_type",
                format!("{} is not a floating point type", self.data_type.short_name()),
            ));
        }
        self.config.validate().map_err(|error| RequestError::new("config", error.to_string()))?;
        self.check_extents()
    }

    /// Checks that every role's region, in elements and in bytes, fits the
    /// `i64` descriptors and offsets handed to the engine.
    ///
    /// Every stride, length and offset of an assembled problem is bounded by
    /// its role's total here, with empty sequences counted as length 1.
    pub fn check_extents(&self) -> Result<(), RequestError> {
        let lengths = self.sequence_lengths()?;
        let total_q = lengths.iter().map(|&(seq_len_q, _)| seq_len_q).sum::<usize>().max(1);
        let total_k = lengths.iter().map(|&(_, seq_len_k)| seq_len_k).sum::<usize>().max(1);
        let (q_multiplier, kv_multiplier) = if self.config.input_permute {
            (self.config.q_stride_multiplier, self.config.kv_stride_multiplier)
        } else {
            (1, 1)
        };
        let heads = self.num_heads;
        let head_dim = self.head_dim;
        let dropout_mask = lengths.iter().try_fold(0usize, |total, &(seq_len_q, seq_len_k)| {
            checked_product(&[heads, seq_len_q.max(1), seq_len_k.max(1)]).and_then(|region| total.checked_add(region))
        });

        let io_size = self.data_type.size_in_bytes();
        let roles = [
            ("query", checked_product(&[total_q, heads, head_dim, q_multiplier]), io_size),
            ("key", checked_product(&[total_k, heads, head_dim, kv_multiplier]), io_size),
            ("value", checked_product(&[total_k, heads, head_dim, kv_multiplier]), io_size),
            ("output", checked_product(&[total_q, heads, head_dim]), io_size),
            ("dropout_mask", dropout_mask, DROPOUT_MASK_DATA_TYPE.size_in_bytes()),
            ("softmax_lse", checked_product(&[total_q, heads]), STATISTIC_DATA_TYPE.size_in_bytes()),
        ];
        for (arg, elements, element_size) in roles {
            let bytes = elements.and_then(|elements| elements.checked_mul(element_size));
            if !bytes.is_some_and(|bytes| bytes <= MAX_ADDRESSABLE_BYTES) {
                return Err(RequestError::new(
                    arg,
                    format!("region of {heads} heads with head dim {head_dim} exceeds {MAX_ADDRESSABLE_BYTES} bytes"),
                ));
            }
        }
        Ok(())
    }

    /// Cumulative query and key offsets as validated `usize` sequences.
    pub fn cumulative_offsets(&self) -> Result<(Vec<usize>, Vec<usize>), RequestError> {
        let q = cumulative_offsets("host_seqlens_q", self.host_seqlens_q, self.batch_size)?;
        let k = cumulative_offsets("host_seqlens_k", self.host_seqlens_k, self.batch_size)?;
        Ok((q, k))
    }

    /// `(M, N)` of every batch element, in batch order.
    pub fn sequence_lengths(&self) -> Result<Vec<(usize, usize)>, RequestError> {
        let (q, k) = self.cumulative_offsets()?;
        Ok(q.iter().tuple_windows().zip(k.iter().tuple_windows()).map(|((q0, q1), (k0, k1))| (q1 - q0, k1 - k0)).collect())
    }

    /// Checks that every buffer lives on `device_id` and covers `extents`.
    pub fn validate_buffers(
        &self,
        extents: &RoleExtents,
        device_id: u32,
    ) -> Result<(), RequestError> {
        let io_size = self.data_type.size_in_bytes();
        let statistic_size = STATISTIC_DATA_TYPE.size_in_bytes();
        let buffers = &self.buffers;

        let mut required = vec![
            ("query", buffers.query, extents.query, io_size),
            ("grad_query", buffers.grad_query, extents.query, io_size),
            ("key", buffers.key, extents.key, io_size),
            ("grad_key", buffers.grad_key, extents.key, io_size),
            ("value", buffers.value, extents.value, io_size),
            ("grad_value", buffers.grad_value, extents.value, io_size),
            ("output", buffers.output, extents.output, io_size),
            ("grad_output", buffers.grad_output, extents.output, io_size),
            ("softmax_lse", buffers.softmax_lse, extents.softmax_lse, statistic_size),
            ("delta", buffers.delta, extents.softmax_lse, statistic_size),
        ];
        if let Some(dropout_mask) = buffers.dropout_mask {
            required.push((
                "dropout_mask",
                dropout_mask,
                extents.dropout_mask,
                DROPOUT_MASK_DATA_TYPE.size_in_bytes(),
            ));
        }

        for (arg, buffer, elements, element_size) in required {
            let required_bytes = elements.checked_mul(element_size).ok_or_else(|| {
                RequestError::new(arg, format!("{elements} elements of {element_size} bytes overflow a byte length"))
            })?;
            if buffer.device_id != device_id {
                return Err(RequestError::new(
                    arg,
                    format!("buffer lives on device {} but the launch targets device {device_id}", buffer.device_id),
                ));
            }
            if required_bytes > 0 && buffer.is_null() {
                return Err(RequestError::new(arg, "buffer is null"));
            }
            if buffer.byte_length < required_bytes {
                return Err(RequestError::new(
                    arg,
                    format!("buffer holds {} bytes but the descriptors address {required_bytes}", buffer.byte_length),
                ));
            }
        }
        Ok(())
    }
}

const MAX_ADDRESSABLE_BYTES: usize = i64::MAX as usize;

fn checked_product(factors: &[usize]) -> Option<usize> {
    factors.iter().try_fold(1usize, |product, &factor| product.checked_mul(factor))
}

fn cumulative_offsets(
    arg: &'static str,
    offsets: &[i32],
    batch_size: usize,
) -> Result<Vec<usize>, RequestError> {
    if batch_size.checked_add(1) != Some(offsets.len()) {
        return Err(RequestError::new(
            arg,
            format!("expected one entry more than batch size {batch_size}, got {}", offsets.len()),
        ));
    }
    if offsets[0] != 0 {
        return Err(RequestError::new(arg, format!("first offset must be 0, got {}", offsets[0])));
    }
    if let Some((index, (previous, next))) = offsets.iter().tuple_windows().enumerate().find(|(_, (a, b))| b < a) {
        return Err(RequestError::new(
            arg,
            format!("offsets must be non-decreasing, entry {} is {next} after {previous}", index + 1),
        ));
    }
    // Non-decreasing from 0, so every entry is non-negative.
    Ok(offsets.iter().map(|&offset| offset as usize).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cumulative_offsets() {
        assert_eq!(cumulative_offsets("q", &[0, 3, 7], 2).unwrap(), vec![0, 3, 7]);
        assert_eq!(cumulative_offsets("q", &[0, 0, 5], 2).unwrap(), vec![0, 0, 5]);
    }

    #[test]
    fn test_malformed_offsets() {
        assert_eq!(cumulative_offsets("q", &[0, 3], 2).unwrap_err().arg, "q");
        assert!(cumulative_offsets("q", &[1, 3, 7], 2).unwrap_err().reason.contains("first offset"));
        assert!(cumulative_offsets("q", &[0, 5, 3], 2).unwrap_err().reason.contains("entry 2 is 3 after 5"));
        assert!(cumulative_offsets("q", &[0, -1, 3], 2).is_err());
        assert!(cumulative_offsets("q", &[0], usize::MAX).is_err());
    }

    #[test]
    fn test_checked_product() {
        assert_eq!(checked_product(&[2, 3, 4]), Some(24));
        assert_eq!(checked_product(&[1 << 32, 1 << 32]), None);
        assert_eq!(checked_product(&[]), Some(1));
    }
}
