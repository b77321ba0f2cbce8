use super::Backend;

/// Caller-owned execution stream. Work submitted to one stream executes in
/// submission order; submission never blocks the host.
pub trait Stream {
    type Backend: Backend;

    fn device_id(&self) -> u32;
    fn wait_until_completed(&self);
    fn gpu_execution_time_ms(&self) -> Option<f64>;
}
