use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use super::Host;
use crate::{ArrayElement, backends::common::NativeBuffer};

pub struct HostBuffer {
    id: usize,
    device_id: u32,
    storage: Box<[u8]>,
    live_bytes: Arc<AtomicUsize>,
}

impl HostBuffer {
    pub(super) fn new(
        id: usize,
        device_id: u32,
        storage: Box<[u8]>,
        live_bytes: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            id,
            device_id,
            storage,
            live_bytes,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.storage
    }

    /// Copies `data` to the start of the buffer.
    pub fn write<T: ArrayElement>(
        &mut self,
        data: &[T],
    ) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.storage[..bytes.len()].copy_from_slice(bytes);
    }

    /// Reads the whole buffer as elements of `T`.
    pub fn read<T: ArrayElement>(&self) -> Vec<T> {
        let whole_elements = self.storage.len() / size_of::<T>() * size_of::<T>();
        bytemuck::pod_collect_to_vec(&self.storage[..whole_elements])
    }
}

impl NativeBuffer for HostBuffer {
    type Backend = Host;

    fn length(&self) -> usize {
        self.storage.len()
    }

    fn id(&self) -> usize {
        self.id
    }

    fn device_id(&self) -> u32 {
        self.device_id
    }

    fn device_address(&self) -> u64 {
        self.storage.as_ptr() as usize as u64
    }
}

impl Drop for HostBuffer {
    fn drop(&mut self) {
        self.live_bytes.fetch_sub(self.storage.len(), Ordering::Relaxed);
    }
}
