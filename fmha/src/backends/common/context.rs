use std::rc::Rc;

use super::{AllocError, Allocator, Backend, Device, ScopedBuffer};

pub trait Context: Sized {
    type Backend: Backend<Context = Self>;

    fn allocator(&self) -> &Allocator<Self::Backend>;

    fn device_id(&self) -> u32 {
        self.allocator().device().id()
    }

    /// Allocates scratch memory that goes back to the allocator when the
    /// returned buffer is dropped.
    fn create_scoped_buffer(
        self: &Rc<Self>,
        size: usize,
    ) -> Result<ScopedBuffer<Self::Backend>, AllocError> {
        let inner = self.allocator().alloc(size)?;
        Ok(ScopedBuffer::new(inner, Rc::downgrade(self)))
    }
}
