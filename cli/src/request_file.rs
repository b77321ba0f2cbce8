//! JSON description of a launch, used by every subcommand.

use std::{fs, path::PathBuf};

use fmha::{
    DataType, LaunchConfig,
    backends::common::{
        DeviceBuffer,
        kernel::attention_backward::{AttentionBackwardBuffers, AttentionBackwardRequest, KernelVariant, RngSeeds},
    },
};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    #[default]
    Grouped,
    Batched,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFile {
    pub num_heads: usize,
    pub head_dim: usize,
    /// Defaults to `1 / sqrt(head_dim)`.
    #[serde(default)]
    pub scale_softmax: Option<f32>,
    #[serde(default = "default_data_type")]
    pub data_type: DataType,
    pub host_seqlens_q: Vec<i32>,
    pub host_seqlens_k: Vec<i32>,
    #[serde(default)]
    pub dropout_probability: f32,
    #[serde(default)]
    pub with_dropout_mask: bool,
    #[serde(default)]
    pub rng_seed: u64,
    #[serde(default)]
    pub rng_offset: u64,
    #[serde(default)]
    pub variant: VariantKind,
    #[serde(default)]
    pub config: LaunchConfig,
}

fn default_data_type() -> DataType {
    DataType::F16
}

/// Where a subcommand reads its request from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestSource {
    File(PathBuf),
    Inline(String),
}

impl RequestSource {
    pub fn from_args(
        request_path: Option<PathBuf>,
        json: Option<String>,
    ) -> Result<Self, CliError> {
        match (request_path, json) {
            (Some(path), None) => Ok(RequestSource::File(path)),
            (None, Some(json)) => Ok(RequestSource::Inline(json)),
            _ => Err(CliError::MissingRequest),
        }
    }

    pub fn load(&self) -> Result<RequestFile, CliError> {
        let request_file = match self {
            RequestSource::File(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            RequestSource::Inline(json) => serde_json::from_str(json)?,
        };
        Ok(request_file)
    }
}

impl RequestFile {

    pub fn kernel_variant(&self) -> Result<KernelVariant, CliError> {
        let variant = match self.variant {
            VariantKind::Grouped => KernelVariant::grouped_for(self.head_dim),
            VariantKind::Batched => KernelVariant::batched_for(self.head_dim),
        };
        variant.ok_or(CliError::UnsupportedHeadDim(self.head_dim))
    }

    /// Launch request over `buffers`, with environment overrides applied to the config.
    pub fn request(
        &self,
        buffers: AttentionBackwardBuffers,
    ) -> AttentionBackwardRequest<'_> {
        AttentionBackwardRequest {
            batch_size: self.host_seqlens_q.len().saturating_sub(1),
            num_heads: self.num_heads,
            head_dim: self.head_dim,
            scale_softmax: self.scale_softmax.unwrap_or_else(|| 1.0 / (self.head_dim as f32).sqrt()),
            data_type: self.data_type,
            buffers,
            host_seqlens_q: &self.host_seqlens_q,
            host_seqlens_k: &self.host_seqlens_k,
            dropout_probability: self.dropout_probability,
            rng_seeds: RngSeeds {
                seed: self.rng_seed,
                offset: self.rng_offset,
            },
            config: self.config.with_env_overrides(),
        }
    }
}

/// Null handles on `device_id`, enough for shape-only work.
pub fn unbound_buffers(device_id: u32) -> AttentionBackwardBuffers {
    let null = DeviceBuffer::new(0, 0, device_id);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_request_file() {
        let file: RequestFile = serde_json::from_str(
            r#"{
                "num_heads": 2,
                "head_dim": 64,
                "host_seqlens_q": [0, 3, 7],
                "host_seqlens_k": [0, 3, 7],
                "config": { "time_kernel": true }
            }"#,
        )
        .unwrap();
        assert_eq!(file.data_type, DataType::F16);
        assert_eq!(file.variant, VariantKind::Grouped);
        assert!(file.config.input_permute);
        assert!(file.config.time_kernel);
        assert_eq!(file.kernel_variant().unwrap().to_string(), "DeviceGroupedMultiheadAttentionBackward_HeadDim64");

        let request = file.request(unbound_buffers(0));
        assert_eq!(request.batch_size, 2);
        assert_eq!(request.scale_softmax, 0.125);
    }

    #[test]
    fn test_request_source() {
        assert!(matches!(RequestSource::from_args(None, None), Err(CliError::MissingRequest)));
        let source = RequestSource::from_args(
            None,
            Some(r#"{"num_heads": 4, "head_dim": 32, "host_seqlens_q": [0, 8], "host_seqlens_k": [0, 8]}"#.into()),
        )
        .unwrap();
        let file = source.load().unwrap();
        assert_eq!(file.num_heads, 4);
        assert!(!file.with_dropout_mask);
    }

    #[test]
    fn test_head_dim_without_variant() {
        let file: RequestFile = serde_json::from_str(
            r#"{ "num_heads": 1, "head_dim": 256, "variant": "batched",
                 "host_seqlens_q": [0, 1], "host_seqlens_k": [0, 1] }"#,
        )
        .unwrap();
        assert!(matches!(file.kernel_variant(), Err(CliError::UnsupportedHeadDim(256))));
    }
}
