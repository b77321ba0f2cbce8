use std::rc::Rc;

use super::{Host, HostBuffer, HostDevice, HostStream};
use crate::{
    ArrayElement, DROPOUT_MASK_DATA_TYPE, DataType, STATISTIC_DATA_TYPE,
    backends::common::{
        AllocError, Allocator, Context, Device, NativeBuffer,
        kernel::attention_backward::{AttentionBackwardBuffers, RoleExtents},
    },
};

pub struct HostContext {
    allocator: Allocator<Host>,
}

impl HostContext {
    pub fn new(device: HostDevice) -> Rc<Self> {
        Rc::new(Self {
            allocator: Allocator::new(device),
        })
    }

    pub fn device(&self) -> &HostDevice {
        self.allocator.device()
    }

    /// Caller-owned buffer outside the workspace pool.
    pub fn create_buffer(
        &self,
        size: usize,
    ) -> Result<HostBuffer, AllocError> {
        self.device().create_buffer(size)
    }

    pub fn create_buffer_with_data<T: ArrayElement>(
        &self,
        data: &[T],
    ) -> Result<HostBuffer, AllocError> {
        let mut buffer = self.create_buffer(size_of_val(data))?;
        buffer.write(data);
        Ok(buffer)
    }

    /// Zeroed operand, gradient and statistic buffers sized for `extents`.
    ///
    /// The returned buffers own the memory behind the handles and must
    /// outlive every launch that reads them.
    pub fn create_attention_backward_buffers(
        &self,
        data_type: DataType,
        extents: &RoleExtents,
        with_dropout_mask: bool,
    ) -> Result<(Vec<HostBuffer>, AttentionBackwardBuffers), AllocError> {
        let io_size = data_type.size_in_bytes();
        let statistic_size = STATISTIC_DATA_TYPE.size_in_bytes();
        let mut owned = Vec::with_capacity(11);
        let mut allocate = |bytes: usize| -> Result<_, AllocError> {
            let buffer = self.create_buffer(bytes)?;
            let handle = buffer.handle();
            owned.push(buffer);
            Ok(handle)
        };

        let handles = AttentionBackwardBuffers {
            query: allocate(extents.query * io_size)?,
            key: allocate(extents.key * io_size)?,
            value: allocate(extents.value * io_size)?,
            dropout_mask: if with_dropout_mask {
                Some(allocate(extents.dropout_mask * DROPOUT_MASK_DATA_TYPE.size_in_bytes())?)
            } else {
                None
            },
            output: allocate(extents.output * io_size)?,
            softmax_lse: allocate(extents.softmax_lse * statistic_size)?,
            delta: allocate(extents.softmax_lse * statistic_size)?,
            grad_output: allocate(extents.output * io_size)?,
            grad_query: allocate(extents.query * io_size)?,
            grad_key: allocate(extents.key * io_size)?,
            grad_value: allocate(extents.value * io_size)?,
        };
        Ok((owned, handles))
    }

    pub fn create_stream(&self) -> HostStream {
        HostStream::new(self.device().id())
    }
}

impl Context for HostContext {
    type Backend = Host;

    fn allocator(&self) -> &Allocator<Self::Backend> {
        &self.allocator
    }
}

#[cfg(test)]
mod tests {
    use half::f16;

    use super::*;

    #[test]
    fn test_buffer_contents() {
        let context = HostContext::new(HostDevice::new(0));
        let data = [f16::from_f32(1.5), f16::from_f32(-2.0), f16::ZERO];
        let buffer = context.create_buffer_with_data(&data).unwrap();
        assert_eq!(buffer.length(), 6);
        assert_eq!(buffer.read::<f16>(), data);
        assert_eq!(context.device().live_bytes(), 6);
        drop(buffer);
        assert_eq!(context.device().live_bytes(), 0);
    }

    #[test]
    fn test_memory_limit() {
        let context = HostContext::new(HostDevice::with_memory_limit(0, 100));
        let _held = context.create_buffer(60).unwrap();
        assert_eq!(
            context.create_buffer(50).err(),
            Some(AllocError::OutOfMemory {
                requested: 50,
                available: 40
            })
        );
    }

    #[test]
    fn test_attention_backward_buffers() {
        let context = HostContext::new(HostDevice::new(3));
        let extents = RoleExtents {
            query: 8,
            key: 4,
            value: 4,
            output: 8,
            dropout_mask: 6,
            softmax_lse: 2,
        };
        let (owned, handles) = context.create_attention_backward_buffers(DataType::F32, &extents, false).unwrap();
        assert_eq!(owned.len(), 10);
        assert_eq!(handles.dropout_mask, None);
        assert_eq!(handles.grad_query.byte_length, 32);
        assert_eq!(handles.delta.byte_length, 8);
        assert_eq!(handles.key.device_id, 3);
    }
}
