use super::{Backend, DeviceBuffer};

pub trait NativeBuffer: Send + Sync {
    type Backend: Backend;

    fn length(&self) -> usize;
    fn id(&self) -> usize;
    fn device_id(&self) -> u32;
    fn device_address(&self) -> u64;

    fn handle(&self) -> DeviceBuffer {
        DeviceBuffer::new(self.device_address(), self.length(), self.device_id())
    }
}
