use crate::error::Trap;
use crate::instruction::Instruction;

/// Maximum number of open `{` groups.
pub const EVAL_STACK_DEPTH: usize = 20;

/// Maximum number of nested subroutine calls.
pub const CALL_STACK_DEPTH: usize = 20;

/// An operation deferred by the `{` flag until its closing `}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeferredOp {
    pub instruction: Instruction,
    pub accumulator: u16,
}

/// Fixed-capacity LIFO stack.
///
/// A push onto a full stack is rejected and leaves the stack unchanged.
pub struct BoundedStack<T> {
    data: Vec<T>,
    max_depth: usize,
}

impl<T> BoundedStack<T> {
    /// Creates a new stack with the given maximum depth.
    pub fn new(max_depth: usize) -> Self {
        BoundedStack {
            data: Vec::with_capacity(max_depth),
            max_depth,
        }
    }

    /// Pushes a value onto the stack.
    pub fn push(&mut self, value: T) -> Result<(), Trap> {
        if self.data.len() >= self.max_depth {
            return Err(Trap::StackOverflow);
        }
        self.data.push(value);
        Ok(())
    }

    /// Pops a value from the stack.
    pub fn pop(&mut self) -> Result<T, Trap> {
        self.data.pop().ok_or(Trap::StackUnderflow)
    }

    pub fn depth(&self) -> usize {
        self.data.len()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

/// Pending `{` groups.
pub type EvalStack = BoundedStack<DeferredOp>;

/// Return line numbers of active CALLs.
pub type CallStack = BoundedStack<u16>;
