use crate::backends::{
    common::Backend,
    host::{
        buffer::HostBuffer, context::HostContext, device::HostDevice, error::HostError, kernel::HostKernels,
        stream::HostStream,
    },
};

#[derive(Debug, Clone)]
pub struct Host;

impl Backend for Host {
    type Device = HostDevice;
    type NativeBuffer = HostBuffer;
    type Context = HostContext;
    type Stream = HostStream;
    type Kernels = HostKernels;
    type Error = HostError;
}
