use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Workspace is not bound")]
    WorkspaceNotBound,
    #[error("Workspace holds {actual} bytes but {required} are required")]
    WorkspaceTooSmall {
        required: usize,
        actual: usize,
    },
    #[error("Stream belongs to device {stream} but the argument's buffers to device {buffers}")]
    DeviceMismatch {
        stream: u32,
        buffers: u32,
    },
    #[error("Descriptor value {0} does not fit a group record")]
    DescriptorOverflow(usize),
    #[error("Malformed problem descriptor: {0}")]
    MalformedDescriptor(String),
}
