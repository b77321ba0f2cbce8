/// Elementwise functor applied by the engine to one operand or accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ElementwiseOperation {
    #[default]
    PassThrough,
    Scale {
        scale: f32,
    },
}

impl ElementwiseOperation {
    pub fn apply(
        &self,
        value: f32,
    ) -> f32 {
        match self {
            ElementwiseOperation::PassThrough => value,
            ElementwiseOperation::Scale {
                scale,
            } => value * scale,
        }
    }
}

/// Functors for the query (`a`), key (`b0`), pre-softmax accumulation
/// (`acc0`), value (`b1`) and output (`c`) roles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementwiseOperations {
    pub a: ElementwiseOperation,
    pub b0: ElementwiseOperation,
    pub acc0: ElementwiseOperation,
    pub b1: ElementwiseOperation,
    pub c: ElementwiseOperation,
}

impl ElementwiseOperations {
    pub fn with_softmax_scale(scale_softmax: f32) -> Self {
        Self {
            acc0: ElementwiseOperation::Scale {
                scale: scale_softmax,
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_acc0_is_scaled() {
        let operations = ElementwiseOperations::with_softmax_scale(0.125);
        assert_eq!(operations.a, ElementwiseOperation::PassThrough);
        assert_eq!(operations.b0, ElementwiseOperation::PassThrough);
        assert_eq!(operations.b1, ElementwiseOperation::PassThrough);
        assert_eq!(operations.c, ElementwiseOperation::PassThrough);
        assert_eq!(operations.acc0.apply(8.0), 1.0);
    }
}
