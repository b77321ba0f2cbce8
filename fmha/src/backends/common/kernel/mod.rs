pub mod attention_backward;

pub use attention_backward::AttentionBackwardEngine;

use super::Backend;

pub trait Kernels: Sized {
    type Backend: Backend<Kernels = Self>;

    type AttentionBackwardEngine: AttentionBackwardEngine<Backend = Self::Backend>;
}
