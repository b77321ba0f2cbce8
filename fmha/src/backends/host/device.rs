use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use super::{Host, HostBuffer};
use crate::backends::common::{AllocError, Device};

/// Host memory standing in for a device, with an optional capacity.
pub struct HostDevice {
    id: u32,
    memory_limit: Option<usize>,
    live_bytes: Arc<AtomicUsize>,
    next_buffer_id: AtomicUsize,
}

impl HostDevice {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            memory_limit: None,
            live_bytes: Arc::new(AtomicUsize::new(0)),
            next_buffer_id: AtomicUsize::new(1),
        }
    }

    pub fn with_memory_limit(
        id: u32,
        memory_limit: usize,
    ) -> Self {
        Self {
            memory_limit: Some(memory_limit),
            ..Self::new(id)
        }
    }

    pub fn memory_limit(&self) -> Option<usize> {
        self.memory_limit
    }

    /// Bytes held by buffers that have not been dropped yet.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Relaxed)
    }

    fn reserve(
        &self,
        size: usize,
    ) -> Result<(), AllocError> {
        let Some(limit) = self.memory_limit else {
            self.live_bytes.fetch_add(size, Ordering::Relaxed);
            return Ok(());
        };
        self.live_bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |live| {
                live.checked_add(size).filter(|&total| total <= limit)
            })
            .map(|_| ())
            .map_err(|live| AllocError::OutOfMemory {
                requested: size,
                available: limit.saturating_sub(live),
            })
    }
}

impl Device for HostDevice {
    type Backend = Host;

    fn id(&self) -> u32 {
        self.id
    }

    fn create_buffer(
        &self,
        size: usize,
    ) -> Result<HostBuffer, AllocError> {
        self.reserve(size)?;
        let id = self.next_buffer_id.fetch_add(1, Ordering::Relaxed);
        Ok(HostBuffer::new(id, self.id, vec![0u8; size].into_boxed_slice(), self.live_bytes.clone()))
    }
}
