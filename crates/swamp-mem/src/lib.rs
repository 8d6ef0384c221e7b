//! Memory regions backing the Swamp bytecode runtime.
//!
//! This crate is the "arena" layer described by the runtime's memory model:
//! bump-allocated, addressable byte regions with no per-object free. It
//! knows nothing about Swamp values, opcodes, or packages — those live in
//! `swamp-vm`, which composes three regions from this crate into a single
//! execution context.
//!
//! - [`arena::StaticMemory`]: the immutable constant blob loaded from a
//!   package image.
//! - [`arena::StackMemory`]: the per-invocation stack buffer.
//! - [`arena::DynamicArena`]: the per-invocation bump allocator for
//!   runtime-materialized values.

pub mod arena;
pub mod error;

pub use arena::{DynamicArena, StackMemory, StaticMemory};
pub use error::{Error, Result};
