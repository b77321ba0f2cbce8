use super::{AttentionBackwardBuffers, ElementwiseOperations, KernelVariant, RngSeeds};
use crate::{
    DataType,
    backends::common::{
        Backend, DeviceBuffer,
        gpu_types::{ProblemDescriptor, ProblemOffsets},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamConfig {
    pub time_kernel: bool,
}

/// Everything bound into one engine argument.
#[derive(Debug, Clone)]
pub struct EngineInputs {
    pub data_type: DataType,
    pub buffers: AttentionBackwardBuffers,
    pub problems: Vec<ProblemDescriptor>,
    pub offsets: Vec<ProblemOffsets>,
    pub element_ops: ElementwiseOperations,
    pub dropout_probability: f32,
    pub rng_seeds: RngSeeds,
}

/// Capability interface of a grouped attention backward GEMM engine.
///
/// Callers go through the methods in declaration order: build the argument,
/// size and bind a workspace, check support, then run.
pub trait AttentionBackwardEngine: Sized {
    type Backend: Backend;
    type Argument;

    fn new(variant: KernelVariant) -> Result<Self, <Self::Backend as Backend>::Error>;

    fn variant(&self) -> KernelVariant;

    /// Identifies the engine instance in diagnostics.
    fn type_string(&self) -> String;

    fn build_argument(
        &self,
        inputs: EngineInputs,
    ) -> Result<Self::Argument, <Self::Backend as Backend>::Error>;

    /// Scratch bytes `argument` needs on the device.
    fn workspace_size(
        &self,
        argument: &Self::Argument,
    ) -> usize;

    fn set_workspace(
        &self,
        argument: &mut Self::Argument,
        workspace: DeviceBuffer,
    );

    fn is_supported(
        &self,
        argument: &Self::Argument,
    ) -> bool;

    /// Enqueues the computation on `stream` without waiting for it.
    ///
    /// Returns the average kernel time in milliseconds when
    /// `config.time_kernel` is set, 0 otherwise.
    fn run(
        &self,
        argument: &Self::Argument,
        stream: &<Self::Backend as Backend>::Stream,
        config: StreamConfig,
    ) -> Result<f32, <Self::Backend as Backend>::Error>;
}
