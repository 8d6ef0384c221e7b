//! Construction-time sizing for an [`crate::context::ExecutionContext`].

/// Sizing knobs for a run, replacing the original runtime's hardcoded
/// constants (a fixed 128 KiB dynamic memory block, a 24-deep call stack)
/// with values a host can tune to its workload.
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    /// Bytes reserved for the per-invocation stack buffer.
    pub stack_capacity: usize,
    /// Bytes reserved for the per-invocation dynamic (bump) arena.
    pub dynamic_arena_capacity: usize,
    /// Maximum call-stack depth before a run fails with
    /// [`crate::error::RuntimeError::StackOverflow`].
    pub max_call_depth: usize,
}

impl Default for RunConfig {
    /// Matches the original runtime's own constants: a 128 KiB dynamic
    /// arena and a 24-deep call stack.
    fn default() -> Self {
        RunConfig {
            stack_capacity: 64 * 1024,
            dynamic_arena_capacity: 128 * 1024,
            max_call_depth: 24,
        }
    }
}
