use std::{mem::ManuallyDrop, rc::Weak};

use super::{Backend, Context, DeviceBuffer, NativeBuffer};

pub struct ScopedBuffer<B: Backend> {
    inner: ManuallyDrop<B::NativeBuffer>,
    context: Weak<B::Context>,
}

impl<B: Backend> ScopedBuffer<B> {
    pub fn new(
        inner: B::NativeBuffer,
        context: Weak<B::Context>,
    ) -> Self {
        Self {
            inner: ManuallyDrop::new(inner),
            context,
        }
    }

    pub fn length(&self) -> usize {
        self.inner.length()
    }

    pub fn handle(&self) -> DeviceBuffer {
        self.inner.handle()
    }
}

impl<B: Backend> Drop for ScopedBuffer<B> {
    fn drop(&mut self) {
        // Safety: drop is only called once, inner is valid
        let inner = unsafe { ManuallyDrop::take(&mut self.inner) };
        if let Some(context) = self.context.upgrade() {
            context.allocator().free(inner);
        }
        // If context is gone, inner drops naturally here
    }
}
