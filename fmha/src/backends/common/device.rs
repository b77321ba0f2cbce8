use super::{AllocError, Backend};

pub trait Device: Send + Sync {
    type Backend: Backend;

    fn id(&self) -> u32;

    fn create_buffer(
        &self,
        size: usize,
    ) -> Result<<Self::Backend as Backend>::NativeBuffer, AllocError>;
}
