use std::sync::{
    Mutex,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use super::{
    AllocError,
    scratch_pool::{PAGE_SIZE, ScratchPool},
};
use crate::backends::common::{Backend, Device, NativeBuffer};

/// Workspace allocator with a reuse pool for released scratch buffers.
pub struct Allocator<B: Backend> {
    device: B::Device,
    scratch_pool: Mutex<ScratchPool<B::NativeBuffer>>,
    active_memory: AtomicUsize,
    peak_memory: AtomicUsize,
    allocation_count: AtomicU64,
    release_count: AtomicU64,
    eviction_threshold: AtomicU64,
}

impl<B: Backend> Allocator<B> {
    pub fn new(device: B::Device) -> Self {
        Self {
            device,
            scratch_pool: Mutex::new(ScratchPool::new()),
            active_memory: AtomicUsize::new(0),
            peak_memory: AtomicUsize::new(0),
            allocation_count: AtomicU64::new(0),
            release_count: AtomicU64::new(0),
            eviction_threshold: AtomicU64::new(1000),
        }
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn set_eviction_threshold(
        &self,
        max_age: u64,
    ) {
        self.eviction_threshold.store(max_age, Ordering::Relaxed);
    }

    pub fn evict_stale_buffers(&self) -> usize {
        let threshold = self.eviction_threshold.load(Ordering::Relaxed);
        self.scratch_pool.lock().map(|mut pool| pool.evict_stale(threshold)).unwrap_or(0)
    }

    fn align_to_page(size: usize) -> usize {
        (size + PAGE_SIZE - 1) & !(PAGE_SIZE - 1)
    }

    fn track_allocation(
        &self,
        size: usize,
    ) {
        let new_active = self.active_memory.fetch_add(size, Ordering::Relaxed) + size;
        self.peak_memory.fetch_max(new_active, Ordering::Relaxed);
        self.allocation_count.fetch_add(1, Ordering::Relaxed);
    }

    fn track_release(
        &self,
        size: usize,
    ) {
        self.active_memory.fetch_sub(size, Ordering::Relaxed);
        self.release_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn alloc(
        &self,
        size: usize,
    ) -> Result<B::NativeBuffer, AllocError> {
        let aligned_size = Self::align_to_page(size);

        let cached = self.scratch_pool.lock().ok().and_then(|mut pool| {
            pool.tick();
            pool.take(aligned_size)
        });
        if let Some((buffer, actual_size)) = cached {
            log::trace!("reusing {actual_size} byte scratch buffer for {size} byte request");
            self.track_allocation(actual_size);
            return Ok(buffer);
        }

        let allocation_size = ScratchPool::<B::NativeBuffer>::allocation_size(aligned_size);
        let buffer = self.device.create_buffer(allocation_size)?;
        self.track_allocation(buffer.length());
        Ok(buffer)
    }

    pub fn free(
        &self,
        buffer: B::NativeBuffer,
    ) {
        let size = buffer.length();
        self.track_release(size);

        if let Ok(mut pool) = self.scratch_pool.lock() {
            pool.give_back(buffer, size);
        }
    }

    pub fn active_memory(&self) -> usize {
        self.active_memory.load(Ordering::Relaxed)
    }

    pub fn peak_memory(&self) -> usize {
        self.peak_memory.load(Ordering::Relaxed)
    }

    pub fn reset_peak_memory(&self) {
        self.peak_memory.store(self.active_memory.load(Ordering::Relaxed), Ordering::Relaxed);
    }

    pub fn allocation_count(&self) -> u64 {
        self.allocation_count.load(Ordering::Relaxed)
    }

    pub fn release_count(&self) -> u64 {
        self.release_count.load(Ordering::Relaxed)
    }

    pub fn cache_memory(&self) -> usize {
        self.scratch_pool.lock().map(|pool| pool.available_size()).unwrap_or(0)
    }

    pub fn clear_cache(&self) -> usize {
        self.scratch_pool.lock().map(|mut pool| pool.clear()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::host::{Host, HostDevice};

    #[test]
    fn test_released_buffer_is_reused() {
        let allocator = Allocator::<Host>::new(HostDevice::new(0));
        let first = allocator.alloc(1000).unwrap();
        assert_eq!(first.length(), PAGE_SIZE);
        let first_id = first.id();
        assert_eq!(allocator.active_memory(), PAGE_SIZE);

        allocator.free(first);
        assert_eq!(allocator.active_memory(), 0);
        assert_eq!(allocator.cache_memory(), PAGE_SIZE);

        let second = allocator.alloc(PAGE_SIZE).unwrap();
        assert_eq!(second.id(), first_id);
        assert_eq!(allocator.allocation_count(), 2);
        allocator.free(second);
        assert_eq!(allocator.release_count(), 2);

        assert_eq!(allocator.peak_memory(), PAGE_SIZE);
        allocator.reset_peak_memory();
        assert_eq!(allocator.peak_memory(), 0);
        assert_eq!(allocator.clear_cache(), 1);
        assert_eq!(allocator.device().live_bytes(), 0);
    }

    #[test]
    fn test_stale_buffers_are_evicted() {
        let allocator = Allocator::<Host>::new(HostDevice::new(0));
        allocator.set_eviction_threshold(2);
        let stale = allocator.alloc(PAGE_SIZE).unwrap();
        allocator.free(stale);
        for _ in 0..3 {
            let buffer = allocator.alloc(1 << 20).unwrap();
            allocator.free(buffer);
        }
        assert_eq!(allocator.evict_stale_buffers(), 1);
        assert_eq!(allocator.cache_memory(), 1 << 20);
        assert_eq!(allocator.device().live_bytes(), 1 << 20);
    }

    #[test]
    fn test_device_exhaustion_is_reported() {
        let allocator = Allocator::<Host>::new(HostDevice::with_memory_limit(0, PAGE_SIZE));
        let _held = allocator.alloc(PAGE_SIZE).unwrap();
        assert_eq!(
            allocator.alloc(1).err(),
            Some(AllocError::OutOfMemory {
                requested: PAGE_SIZE,
                available: 0
            })
        );
    }
}
