use std::rc::Rc;

use super::{
    AttentionBackwardEngine, AttentionBackwardError, AttentionBackwardRequest, EngineInputs, KernelVariant, ProblemSet,
    RequestError, StreamConfig,
};
use crate::{
    backends::common::{Backend, Context, Kernels, Stream},
    utils::TraceRange,
};

type EngineOf<B> = <<B as Backend>::Kernels as Kernels>::AttentionBackwardEngine;
type LaunchResult<B, T> = Result<T, AttentionBackwardError<<B as Backend>::Error>>;

/// Where the most recent launch stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Idle,
    ArgumentBuilt,
    WorkspaceBound,
    /// The engine rejected the argument; nothing was enqueued.
    Unsupported,
    Dispatched,
    /// The launch call returned after dispatch. Device completion is observed
    /// through the stream.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchOutcome {
    pub variant: KernelVariant,
    pub problem_count: usize,
    pub workspace_bytes: usize,
    /// Average kernel time, present when the launch was timed.
    pub average_time_ms: Option<f32>,
}

/// Drives one attention backward engine instance on a context.
pub struct AttentionBackwardLauncher<B: Backend> {
    context: Rc<B::Context>,
    engine: EngineOf<B>,
    state: LaunchState,
}

impl<B: Backend> AttentionBackwardLauncher<B> {
    pub fn new(
        context: Rc<B::Context>,
        variant: KernelVariant,
    ) -> Result<Self, B::Error> {
        Ok(Self {
            context,
            engine: <EngineOf<B>>::new(variant)?,
            state: LaunchState::Idle,
        })
    }

    /// Launcher for the grouped variant covering `head_dim`.
    pub fn grouped(
        context: Rc<B::Context>,
        head_dim: usize,
    ) -> LaunchResult<B, Self> {
        let variant = KernelVariant::grouped_for(head_dim)
            .ok_or_else(|| RequestError::new("head_dim", format!("no kernel variant covers head dim {head_dim}")))?;
        Self::new(context, variant).map_err(AttentionBackwardError::Engine)
    }

    pub fn variant(&self) -> KernelVariant {
        self.engine.variant()
    }

    pub fn engine(&self) -> &EngineOf<B> {
        &self.engine
    }

    pub fn state(&self) -> LaunchState {
        self.state
    }

    fn transition(
        &mut self,
        state: LaunchState,
    ) {
        log::trace!("{}: {:?} -> {:?}", self.engine.type_string(), self.state, state);
        self.state = state;
    }

    /// Validates `request` and builds the problem list this launcher's variant expects.
    pub fn prepare(
        &self,
        request: &AttentionBackwardRequest,
    ) -> LaunchResult<B, ProblemSet> {
        request.validate()?;
        Ok(ProblemSet::for_variant(request, self.variant())?)
    }

    /// Validates, assembles and launches in one call.
    pub fn run(
        &mut self,
        request: &AttentionBackwardRequest,
        stream: &B::Stream,
    ) -> LaunchResult<B, LaunchOutcome> {
        let problem_set = self.prepare(request)?;
        self.launch(request, problem_set, stream)
    }

    /// Binds `problem_set` and the request's buffers into an engine argument,
    /// backs it with a workspace and enqueues it on `stream`.
    ///
    /// `request` is validated again and its buffers must cover every region
    /// `problem_set` addresses, so caller-built problem sets get the same
    /// checks as [`Self::run`]. The workspace is released before returning
    /// on every path. An unsupported argument enqueues nothing.
    pub fn launch(
        &mut self,
        request: &AttentionBackwardRequest,
        problem_set: ProblemSet,
        stream: &B::Stream,
    ) -> LaunchResult<B, LaunchOutcome> {
        let _range = TraceRange::new("attention_backward_launch");
        self.transition(LaunchState::Idle);

        if stream.device_id() != self.context.device_id() {
            return Err(RequestError::new(
                "stream",
                format!(
                    "stream belongs to device {} but the context to device {}",
                    stream.device_id(),
                    self.context.device_id()
                ),
            )
            .into());
        }
        if problem_set.is_empty() || problem_set.problems.len() != problem_set.offsets.len() {
            return Err(RequestError::new(
                "problem_set",
                format!("{} problems with {} offset entries", problem_set.problems.len(), problem_set.offsets.len()),
            )
            .into());
        }
        request.validate()?;
        request.validate_buffers(&problem_set.required_elements(), self.context.device_id())?;

        let problem_count = problem_set.len();
        let inputs = EngineInputs {
            data_type: request.data_type,
            buffers: request.buffers,
            problems: problem_set.problems,
            offsets: problem_set.offsets,
            element_ops: request.element_ops(),
            dropout_probability: request.dropout_probability,
            rng_seeds: request.rng_seeds,
        };
        let mut argument = self.engine.build_argument(inputs).map_err(AttentionBackwardError::Engine)?;
        self.transition(LaunchState::ArgumentBuilt);

        let workspace_bytes = self.engine.workspace_size(&argument);
        let workspace = self.context.create_scoped_buffer(workspace_bytes)?;
        log::debug!("bound {} byte workspace for {workspace_bytes} requested bytes", workspace.length());
        self.engine.set_workspace(&mut argument, workspace.handle());
        self.transition(LaunchState::WorkspaceBound);

        if !self.engine.is_supported(&argument) {
            let engine = self.engine.type_string();
            log::warn!("{engine} does not support this problem");
            self.transition(LaunchState::Unsupported);
            return Err(AttentionBackwardError::UnsupportedConfiguration {
                engine,
            });
        }

        let time_kernel = request.config.time_kernel;
        let average_time_ms = self
            .engine
            .run(
                &argument,
                stream,
                StreamConfig {
                    time_kernel,
                },
            )
            .map_err(AttentionBackwardError::Engine)?;
        self.transition(LaunchState::Dispatched);

        if time_kernel {
            log::info!("time elapsed is {average_time_ms} ms");
        }

        drop(workspace);
        self.transition(LaunchState::Completed);

        Ok(LaunchOutcome {
            variant: self.variant(),
            problem_count,
            workspace_bytes,
            average_time_ms: time_kernel.then_some(average_time_ms),
        })
    }
}
