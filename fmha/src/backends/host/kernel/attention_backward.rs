use std::time::Instant;

use crate::{
    DataType,
    backends::{
        common::{
            DeviceBuffer, Stream,
            gpu_types::{AttentionBackwardGroupRecord, ProblemDescriptor, ProblemOffsets},
            kernel::attention_backward::{AttentionBackwardEngine, EngineInputs, KernelVariant, StreamConfig},
        },
        host::{Host, HostError, HostLaunchRecord, HostStream},
    },
};

const GROUP_RECORD_SIZE: usize = size_of::<AttentionBackwardGroupRecord>();

pub struct HostAttentionBackwardArgument {
    inputs: EngineInputs,
    workspace: Option<DeviceBuffer>,
}

impl HostAttentionBackwardArgument {
    pub fn inputs(&self) -> &EngineInputs {
        &self.inputs
    }

    pub fn workspace(&self) -> Option<DeviceBuffer> {
        self.workspace
    }
}

/// Host engine that packs one group record per problem into the workspace
/// layout and records the launch on a [`HostStream`].
pub struct HostAttentionBackwardEngine {
    variant: KernelVariant,
}

impl HostAttentionBackwardEngine {
    fn supports_problem(
        &self,
        problem: &ProblemDescriptor,
    ) -> bool {
        let ranks_match = [&problem.query, &problem.key, &problem.dropout_mask, &problem.value, &problem.output]
            .iter()
            .all(|descriptor| descriptor.rank() == 4)
            && problem.softmax_lse.rank() == 3;
        if !ranks_match || !problem.acc0_bias.is_empty() || !problem.acc1_bias.is_empty() {
            return false;
        }
        if !self.variant.head_dim_bucket().fits(problem.head_dim()) {
            return false;
        }
        !self.variant.is_grouped() || problem.group_count() == 1
    }
}

impl AttentionBackwardEngine for HostAttentionBackwardEngine {
    type Backend = Host;
    type Argument = HostAttentionBackwardArgument;

    fn new(variant: KernelVariant) -> Result<Self, HostError> {
        Ok(Self {
            variant,
        })
    }

    fn variant(&self) -> KernelVariant {
        self.variant
    }

    fn type_string(&self) -> String {
        format!("Host::{}", self.variant.name())
    }

    fn build_argument(
        &self,
        inputs: EngineInputs,
    ) -> Result<Self::Argument, HostError> {
        if inputs.problems.len() != inputs.offsets.len() {
            return Err(HostError::MalformedDescriptor(format!(
                "{} problems with {} offset entries",
                inputs.problems.len(),
                inputs.offsets.len()
            )));
        }
        Ok(HostAttentionBackwardArgument {
            inputs,
            workspace: None,
        })
    }

    fn workspace_size(
        &self,
        argument: &Self::Argument,
    ) -> usize {
        argument.inputs.problems.len() * GROUP_RECORD_SIZE
    }

    fn set_workspace(
        &self,
        argument: &mut Self::Argument,
        workspace: DeviceBuffer,
    ) {
        argument.workspace = Some(workspace);
    }

    fn is_supported(
        &self,
        argument: &Self::Argument,
    ) -> bool {
        let inputs = &argument.inputs;
        if !matches!(inputs.data_type, DataType::F16 | DataType::BF16 | DataType::F32) {
            log::debug!("{}: unsupported data type {:?}", self.type_string(), inputs.data_type);
            return false;
        }
        if !(0.0..1.0).contains(&inputs.dropout_probability) {
            return false;
        }
        if !self.variant.is_grouped() && inputs.problems.len() != 1 {
            return false;
        }
        inputs.problems.iter().all(|problem| self.supports_problem(problem))
    }

    fn run(
        &self,
        argument: &Self::Argument,
        stream: &HostStream,
        config: StreamConfig,
    ) -> Result<f32, HostError> {
        let start = Instant::now();
        let workspace = argument.workspace.ok_or(HostError::WorkspaceNotBound)?;
        let required = self.workspace_size(argument);
        if workspace.byte_length < required {
            return Err(HostError::WorkspaceTooSmall {
                required,
                actual: workspace.byte_length,
            });
        }
        let inputs = &argument.inputs;
        if workspace.device_id != stream.device_id() {
            return Err(HostError::DeviceMismatch {
                stream: stream.device_id(),
                buffers: workspace.device_id,
            });
        }

        let groups = inputs
            .problems
            .iter()
            .zip(&inputs.offsets)
            .map(|(problem, offsets)| group_record(problem, offsets))
            .collect::<Result<Vec<_>, _>>()?;

        stream.enqueue(HostLaunchRecord {
            sequence: 0,
            engine: self.type_string(),
            data_type: inputs.data_type,
            groups,
            workspace,
            buffers: inputs.buffers,
            element_ops: inputs.element_ops,
            dropout_probability: inputs.dropout_probability,
            rng_seeds: inputs.rng_seeds,
        });

        if config.time_kernel {
            Ok(start.elapsed().as_secs_f32() * 1000.0)
        } else {
            Ok(0.0)
        }
    }
}

fn widen(value: usize) -> Result<i64, HostError> {
    i64::try_from(value).map_err(|_| HostError::DescriptorOverflow(value))
}

fn widen_all<const N: usize>(values: &[usize]) -> Result<[i64; N], HostError> {
    if values.len() != N {
        return Err(HostError::MalformedDescriptor(format!("expected rank {N}, got {}", values.len())));
    }
    let mut widened = [0i64; N];
    for (slot, &value) in widened.iter_mut().zip(values) {
        *slot = widen(value)?;
    }
    Ok(widened)
}

fn group_record(
    problem: &ProblemDescriptor,
    offsets: &ProblemOffsets,
) -> Result<AttentionBackwardGroupRecord, HostError> {
    Ok(AttentionBackwardGroupRecord {
        q_lengths: widen_all(problem.query.lengths())?,
        q_strides: widen_all(problem.query.strides())?,
        k_lengths: widen_all(problem.key.lengths())?,
        k_strides: widen_all(problem.key.strides())?,
        z_lengths: widen_all(problem.dropout_mask.lengths())?,
        z_strides: widen_all(problem.dropout_mask.strides())?,
        v_lengths: widen_all(problem.value.lengths())?,
        v_strides: widen_all(problem.value.strides())?,
        y_lengths: widen_all(problem.output.lengths())?,
        y_strides: widen_all(problem.output.strides())?,
        lse_lengths: widen_all(problem.softmax_lse.lengths())?,
        lse_strides: widen_all(problem.softmax_lse.strides())?,
        q_offset: widen(offsets.query)?,
        k_offset: widen(offsets.key)?,
        v_offset: widen(offsets.value)?,
        y_offset: widen(offsets.output)?,
        z_offset: widen(offsets.dropout_mask)?,
        lse_offset: widen(offsets.softmax_lse)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::common::kernel::attention_backward::{
        AttentionShape, HeadDimBucket, TensorRole, compute_layout,
    };

    fn problem(shape: &AttentionShape) -> ProblemDescriptor {
        let layout = |role| compute_layout(role, shape, true, 1);
        ProblemDescriptor {
            query: layout(TensorRole::Query),
            key: layout(TensorRole::Key),
            dropout_mask: layout(TensorRole::DropoutMask),
            value: layout(TensorRole::Value),
            output: layout(TensorRole::Output),
            softmax_lse: layout(TensorRole::SoftmaxLse),
            acc0_bias: Default::default(),
            acc1_bias: Default::default(),
        }
    }

    #[test]
    fn test_group_record_widening() {
        let shape = AttentionShape::new(3, 4, 8, 2);
        let offsets = ProblemOffsets {
            query: 48,
            key: 64,
            value: 64,
            output: 48,
            dropout_mask: 24,
            softmax_lse: 6,
        };
        let record = group_record(&problem(&shape), &offsets).unwrap();
        assert_eq!(record.q_lengths, [1, 2, 3, 8]);
        assert_eq!(record.q_strides, [48, 8, 16, 1]);
        assert_eq!(record.v_lengths, [1, 2, 8, 4]);
        assert_eq!(record.lse_lengths, [1, 2, 3]);
        assert_eq!(record.z_offset, 24);
        assert_eq!(record.lse_offset, 6);
    }

    #[test]
    fn test_support_follows_head_dim_bucket() {
        let engine = HostAttentionBackwardEngine::new(KernelVariant::Grouped(HeadDimBucket::D32)).unwrap();
        assert!(engine.supports_problem(&problem(&AttentionShape::new(3, 4, 32, 2))));
        assert!(!engine.supports_problem(&problem(&AttentionShape::new(3, 4, 40, 2))));
        assert!(!engine.supports_problem(&problem(&AttentionShape::new(3, 4, 8, 2).with_group_count(2))));
    }

    #[test]
    fn test_record_layout_size() {
        assert_eq!(GROUP_RECORD_SIZE, (4 * 10 + 3 * 2 + 6) * size_of::<i64>());
    }
}
