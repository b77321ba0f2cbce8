use std::collections::BTreeMap;

pub(super) const PAGE_SIZE: usize = 4096;
const SMALL_BUFFER_THRESHOLD: usize = 64 * 1024;
const SIZE_TOLERANCE: f64 = 0.1;

pub(super) fn next_power_of_two(size: usize) -> usize {
    if size <= PAGE_SIZE {
        return PAGE_SIZE;
    }
    size.next_power_of_two()
}

struct CachedBuffer<B> {
    buffer: B,
    last_used_tick: u64,
}

/// Released workspaces kept for reuse.
///
/// Small requests are rounded up to power-of-two buckets; large requests
/// reuse any cached buffer no more than `SIZE_TOLERANCE` larger.
pub(super) struct ScratchPool<B> {
    small_buckets: BTreeMap<usize, Vec<CachedBuffer<B>>>,
    large_buffers: BTreeMap<usize, Vec<CachedBuffer<B>>>,
    current_tick: u64,
}

impl<B> ScratchPool<B> {
    pub(super) fn new() -> Self {
        Self {
            small_buckets: BTreeMap::new(),
            large_buffers: BTreeMap::new(),
            current_tick: 0,
        }
    }

    pub(super) fn is_small(size: usize) -> bool {
        size < SMALL_BUFFER_THRESHOLD
    }

    /// Size actually allocated for a request of `size` bytes.
    pub(super) fn allocation_size(size: usize) -> usize {
        if Self::is_small(size) {
            next_power_of_two(size)
        } else {
            size
        }
    }

    pub(super) fn tick(&mut self) -> u64 {
        self.current_tick += 1;
        self.current_tick
    }

    /// Takes a cached buffer able to hold `size` bytes, returning it with its length.
    pub(super) fn take(
        &mut self,
        size: usize,
    ) -> Option<(B, usize)> {
        let (buckets, key) = if Self::is_small(size) {
            let bucket_size = next_power_of_two(size);
            (&mut self.small_buckets, bucket_size)
        } else {
            let max_size = ((size as f64) * (1.0 + SIZE_TOLERANCE)).ceil() as usize;
            let key = self
                .large_buffers
                .range(size..=max_size)
                .find(|(_, buffers)| !buffers.is_empty())
                .map(|(&key, _)| key)?;
            (&mut self.large_buffers, key)
        };

        let buffers = buckets.get_mut(&key)?;
        let cached = buffers.pop()?;
        if buffers.is_empty() {
            buckets.remove(&key);
        }
        Some((cached.buffer, key))
    }

    pub(super) fn give_back(
        &mut self,
        buffer: B,
        size: usize,
    ) {
        let cached = CachedBuffer {
            buffer,
            last_used_tick: self.current_tick,
        };
        let buckets = if Self::is_small(size) {
            &mut self.small_buckets
        } else {
            &mut self.large_buffers
        };
        buckets.entry(size).or_default().push(cached);
    }

    pub(super) fn evict_stale(
        &mut self,
        max_age: u64,
    ) -> usize {
        let threshold = self.current_tick.saturating_sub(max_age);
        let mut evicted = 0;
        for buckets in [&mut self.small_buckets, &mut self.large_buffers] {
            buckets.retain(|_, buffers| {
                let before = buffers.len();
                buffers.retain(|cached| cached.last_used_tick >= threshold);
                evicted += before - buffers.len();
                !buffers.is_empty()
            });
        }
        evicted
    }

    pub(super) fn available_size(&self) -> usize {
        self.small_buckets
            .iter()
            .chain(self.large_buffers.iter())
            .map(|(size, buffers)| size * buffers.len())
            .sum()
    }

    pub(super) fn clear(&mut self) -> usize {
        let count: usize = self.small_buckets.values().chain(self.large_buffers.values()).map(Vec::len).sum();
        self.small_buckets.clear();
        self.large_buffers.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_requests_share_a_bucket() {
        let mut pool = ScratchPool::new();
        pool.give_back("a", next_power_of_two(5000));
        let (buffer, size) = pool.take(6000).unwrap();
        assert_eq!(buffer, "a");
        assert_eq!(size, 8192);
        assert!(pool.take(6000).is_none());
    }

    #[test]
    fn test_large_requests_respect_tolerance() {
        let mut pool = ScratchPool::new();
        pool.give_back("large", 1 << 20);
        assert!(pool.take((1 << 20) / 2).is_none());
        assert_eq!(pool.take((1 << 20) - 1000), Some(("large", 1 << 20)));
    }

    #[test]
    fn test_evict_stale() {
        let mut pool = ScratchPool::new();
        pool.give_back(1u32, PAGE_SIZE);
        for _ in 0..10 {
            pool.tick();
        }
        pool.give_back(2u32, 1 << 20);
        assert_eq!(pool.evict_stale(5), 1);
        assert_eq!(pool.available_size(), 1 << 20);
        assert_eq!(pool.clear(), 1);
        assert_eq!(pool.available_size(), 0);
    }
}
