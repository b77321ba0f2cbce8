//! Descriptor types handed to attention backward engines.

mod attention_backward;
mod problem_descriptor;
mod tensor_descriptor;

pub use attention_backward::*;
pub use problem_descriptor::*;
pub use tensor_descriptor::*;
