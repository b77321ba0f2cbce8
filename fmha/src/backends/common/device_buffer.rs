/// Borrowed handle to a region of device memory.
///
/// The handle carries no ownership: whoever allocated the memory frees it.
/// The host never dereferences `address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceBuffer {
    pub address: u64,
    pub byte_length: usize,
    pub device_id: u32,
}

impl DeviceBuffer {
    pub const fn new(
        address: u64,
        byte_length: usize,
        device_id: u32,
    ) -> Self {
        Self {
            address,
            byte_length,
            device_id,
        }
    }

    pub const fn is_null(&self) -> bool {
        self.address == 0
    }
}
