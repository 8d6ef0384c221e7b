//! The execution context: everything a single interpreter invocation needs
//! besides the opcode stream itself.

use crate::config::RunConfig;
use crate::error::RuntimeError;
use crate::value::{SwampFunc, SwampUnmanaged};
use swamp_mem::{DynamicArena, StackMemory, StaticMemory};

/// One entry in the call stack: where to resume, the base pointer to
/// restore, and the function whose frame this is (used by `tail_call`,
/// which jumps back to the current frame's own function).
#[derive(Debug, Clone, Copy)]
pub struct CallFrame {
    pub return_pc: *const u8,
    pub base_pointer: usize,
    pub func: *const SwampFunc,
}

/// A fixed-capacity call stack. Depth is bounded by
/// [`RunConfig::max_call_depth`]; exceeding it is a
/// [`RuntimeError::StackOverflow`], not a growable `Vec`, because an
/// unbounded call stack here almost always means a runaway recursive
/// program rather than legitimate depth.
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: usize,
}

impl CallStack {
    fn new(max_depth: usize) -> Self {
        CallStack {
            frames: Vec::with_capacity(max_depth),
            max_depth,
        }
    }

    pub fn push(&mut self, frame: CallFrame) -> Result<(), RuntimeError> {
        if self.frames.len() >= self.max_depth {
            return Err(RuntimeError::StackOverflow);
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<CallFrame> {
        self.frames.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// A fixed-capacity registry of host ("unmanaged") objects a context owns,
/// matching `SWAMP_MACHINE_CONTEXT_UNMANAGED_CONTAINER_COUNT (32)` in the
/// original runtime. Used to validate that a value being moved between
/// contexts (e.g. into a re-entrant temp context) is actually owned by the
/// context it claims to come from.
pub struct UnmanagedRegistry {
    entries: Vec<*const SwampUnmanaged>,
    capacity: usize,
}

impl UnmanagedRegistry {
    fn new(capacity: usize) -> Self {
        UnmanagedRegistry {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn register(&mut self, ptr: *const SwampUnmanaged) -> bool {
        if self.entries.len() >= self.capacity {
            return false;
        }
        self.entries.push(ptr);
        true
    }

    pub fn owns(&self, ptr: *const SwampUnmanaged) -> bool {
        self.entries.contains(&ptr)
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

/// Default capacity of a context's [`UnmanagedRegistry`], matching the
/// original runtime's `SWAMP_MACHINE_CONTEXT_UNMANAGED_CONTAINER_COUNT`.
pub const UNMANAGED_CONTAINER_COUNT: usize = 32;

/// Everything the interpreter needs to run a function, minus the function
/// itself: the stack buffer and its current base pointer, a dynamic arena
/// for runtime-materialized values, a handle to the package's static
/// memory, the call stack, and bookkeeping for host (unmanaged) objects.
///
/// An `ExecutionContext` can be re-entered: a host callback invoked via
/// `call_external` may need to run Swamp code itself (e.g. a callback
/// argument), and does so in a *temp context* that borrows this one's
/// static memory and type info but gets its own stack and dynamic arena.
/// `parent` records that relationship so a temp context's unmanaged moves
/// can still be validated against the context that actually owns them.
pub struct ExecutionContext<'a> {
    stack: StackMemory,
    bp: usize,
    dynamic: DynamicArena,
    static_memory: &'a StaticMemory,
    call_stack: CallStack,
    unmanaged: UnmanagedRegistry,
    parent: Option<&'a ExecutionContext<'a>>,
}

impl<'a> ExecutionContext<'a> {
    #[must_use]
    pub fn new(static_memory: &'a StaticMemory, config: RunConfig) -> Self {
        ExecutionContext {
            stack: StackMemory::new(config.stack_capacity),
            bp: 0,
            dynamic: DynamicArena::new(config.dynamic_arena_capacity),
            static_memory,
            call_stack: CallStack::new(config.max_call_depth),
            unmanaged: UnmanagedRegistry::new(UNMANAGED_CONTAINER_COUNT),
            parent: None,
        }
    }

    /// Creates a re-entrant temp context for a nested invocation (e.g. a
    /// callback fired from `call_external`), sharing this context's static
    /// memory but with a fresh stack and dynamic arena.
    #[must_use]
    pub fn create_temp(&'a self, config: RunConfig) -> Self {
        ExecutionContext {
            stack: StackMemory::new(config.stack_capacity),
            bp: 0,
            dynamic: DynamicArena::new(config.dynamic_arena_capacity),
            static_memory: self.static_memory,
            call_stack: CallStack::new(config.max_call_depth),
            unmanaged: UnmanagedRegistry::new(UNMANAGED_CONTAINER_COUNT),
            parent: Some(self),
        }
    }

    /// Resets per-invocation state so the context can be reused for the
    /// next top-level call without reallocating its buffers.
    pub fn reset(&mut self) {
        self.bp = 0;
        self.dynamic.reset();
        self.unmanaged.reset();
    }

    #[must_use]
    pub fn stack(&self) -> &StackMemory {
        &self.stack
    }

    #[must_use]
    pub fn bp(&self) -> usize {
        self.bp
    }

    pub fn set_bp(&mut self, bp: usize) {
        self.bp = bp;
    }

    #[must_use]
    pub fn dynamic_mut(&mut self) -> &mut DynamicArena {
        &mut self.dynamic
    }

    #[must_use]
    pub fn static_memory(&self) -> &'a StaticMemory {
        self.static_memory
    }

    #[must_use]
    pub fn call_stack_mut(&mut self) -> &mut CallStack {
        &mut self.call_stack
    }

    #[must_use]
    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    #[must_use]
    pub fn unmanaged_mut(&mut self) -> &mut UnmanagedRegistry {
        &mut self.unmanaged
    }

    #[must_use]
    pub fn parent(&self) -> Option<&'a ExecutionContext<'a>> {
        self.parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_stack_enforces_max_depth() {
        let mut stack = CallStack::new(2);
        let frame = CallFrame {
            return_pc: std::ptr::null(),
            base_pointer: 0,
            func: std::ptr::null(),
        };
        assert!(stack.push(frame).is_ok());
        assert!(stack.push(frame).is_ok());
        assert!(matches!(stack.push(frame), Err(RuntimeError::StackOverflow)));
    }

    #[test]
    fn unmanaged_registry_tracks_ownership() {
        let mut registry = UnmanagedRegistry::new(1);
        let ptr = std::ptr::null::<SwampUnmanaged>();
        let other = 1usize as *const SwampUnmanaged;
        assert!(registry.register(ptr));
        assert!(registry.owns(ptr));
        assert!(!registry.owns(other));
        assert!(!registry.register(other)); // capacity 1, already full
    }

    #[test]
    fn reset_clears_dynamic_arena_and_bp() {
        let static_mem = StaticMemory::from_bytes(vec![0; 16]);
        let mut ctx = ExecutionContext::new(&static_mem, RunConfig::default());
        ctx.set_bp(8);
        ctx.dynamic_mut().alloc(16, 1, 1).unwrap();
        ctx.reset();
        assert_eq!(ctx.bp(), 0);
        assert_eq!(ctx.dynamic_mut().used(), 0);
    }
}
