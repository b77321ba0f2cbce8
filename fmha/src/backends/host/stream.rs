use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    time::Instant,
};

use super::Host;
use crate::{
    DataType,
    backends::common::{
        DeviceBuffer, Stream,
        gpu_types::AttentionBackwardGroupRecord,
        kernel::attention_backward::{AttentionBackwardBuffers, ElementwiseOperations, RngSeeds},
    },
};

/// One attention backward launch as the host stream received it.
#[derive(Debug, Clone)]
pub struct HostLaunchRecord {
    /// Position in submission order, assigned by the stream.
    pub sequence: u64,
    pub engine: String,
    pub data_type: DataType,
    pub groups: Vec<AttentionBackwardGroupRecord>,
    pub workspace: DeviceBuffer,
    pub buffers: AttentionBackwardBuffers,
    pub element_ops: ElementwiseOperations,
    pub dropout_probability: f32,
    pub rng_seeds: RngSeeds,
}

/// In-order queue of submitted launches.
///
/// Submissions stay pending until [`Stream::wait_until_completed`] retires
/// them, so callers can observe that launching does not block.
pub struct HostStream {
    device_id: u32,
    next_sequence: Cell<u64>,
    pending: RefCell<VecDeque<HostLaunchRecord>>,
    completed: RefCell<Vec<HostLaunchRecord>>,
    last_execution_time_ms: Cell<Option<f64>>,
}

impl HostStream {
    pub fn new(device_id: u32) -> Self {
        Self {
            device_id,
            next_sequence: Cell::new(0),
            pending: RefCell::new(VecDeque::new()),
            completed: RefCell::new(Vec::new()),
            last_execution_time_ms: Cell::new(None),
        }
    }

    /// Appends `record` to the queue and returns its sequence number.
    pub fn enqueue(
        &self,
        mut record: HostLaunchRecord,
    ) -> u64 {
        let sequence = self.next_sequence.get();
        self.next_sequence.set(sequence + 1);
        record.sequence = sequence;
        log::trace!("enqueue #{sequence} {} ({} groups)", record.engine, record.groups.len());
        self.pending.borrow_mut().push_back(record);
        sequence
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn submitted_count(&self) -> u64 {
        self.next_sequence.get()
    }

    /// Launches retired so far, in completion order.
    pub fn completed(&self) -> Vec<HostLaunchRecord> {
        self.completed.borrow().clone()
    }
}

impl Stream for HostStream {
    type Backend = Host;

    fn device_id(&self) -> u32 {
        self.device_id
    }

    fn wait_until_completed(&self) {
        let start = Instant::now();
        let mut pending = self.pending.borrow_mut();
        let mut completed = self.completed.borrow_mut();
        let retired = pending.len();
        completed.extend(pending.drain(..));
        if retired > 0 {
            self.last_execution_time_ms.set(Some(start.elapsed().as_secs_f64() * 1000.0));
        }
    }

    fn gpu_execution_time_ms(&self) -> Option<f64> {
        self.last_execution_time_ms.get()
    }
}
