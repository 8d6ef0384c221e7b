//! A bytecode virtual machine and package loader for the Swamp language
//! runtime.
//!
//! A host embeds this crate in three steps:
//!
//! 1. [`loader::Package::load`] a RAFF-encoded package image, supplying an
//!    [`fixup::ExternalResolver`] that binds the package's external
//!    function names to host implementations.
//! 2. Build a [`context::ExecutionContext`] sized by a [`config::RunConfig`]
//!    over the package's [`swamp_mem::StaticMemory`].
//! 3. Look up a function with [`loader::Package::find_function`] and hand
//!    it to [`interpreter::run`] along with packed parameter bytes and a
//!    result slot.
//!
//! The three memory regions a run touches (static, stack, dynamic) live in
//! the sibling `swamp-mem` crate; this crate owns everything that knows
//! what a Swamp *value* is: the `#[repr(C)]` records in [`value`], the
//! opcode encoding in [`opcodes`], the structural walker in [`walker`], and
//! the dispatch loop in [`interpreter`].

pub mod config;
pub mod context;
pub mod debuginfo;
pub mod error;
pub mod fixup;
pub mod interpreter;
pub mod ledger;
pub mod loader;
pub mod opcodes;
pub mod raff;
pub mod typedesc;
pub mod value;
pub mod walker;

pub use config::RunConfig;
pub use context::ExecutionContext;
pub use error::{Error, LinkError, LoadError, Result, RuntimeError, WalkError};
pub use fixup::ExternalResolver;
pub use interpreter::{run, Params, ResultSlot};
pub use loader::Package;
pub use typedesc::TypeDescriptor;
pub use value::FuncRef;
