//! Debug-info records carried alongside a [`crate::value::SwampFunc`].
//!
//! `swamp-vm` fixes these up (they contain the same file-offset-as-pointer
//! fields every other ledger entry does) and exposes them as inert data.
//! Nothing in the interpreter reads them; a separate tool is expected to
//! walk them to print source locations or variable names, matching this
//! crate's "no debug-info dumpers" scope.

/// One opcode-position-to-source-location mapping.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DebugInfoLinesEntry {
    pub opcode_position: u16,
    pub source_file_id: u16,
    pub line: u16,
    pub column: u16,
}

/// A function's full opcode-to-source-line table.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DebugInfoLines {
    pub count: u32,
    pub lines: *const DebugInfoLinesEntry,
}

/// One named local variable's live range within a function.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DebugInfoVariablesEntry {
    pub start_opcode_position: u16,
    pub end_opcode_position: u16,
    pub type_id: u16,
    pub scope_id: u16,
    pub stack_position: u16,
    pub stack_range: u16,
    pub name: *const u8,
    pub name_len: usize,
}

/// A function's full set of named local variables.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DebugInfoVariables {
    pub count: u32,
    pub variables: *const DebugInfoVariablesEntry,
}

/// Source filenames referenced by `DebugInfoLinesEntry::source_file_id`,
/// one package-wide table shared by every function.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DebugInfoFiles {
    pub count: u32,
    pub filenames: *const *const u8,
}

/// A chunk of named resources (e.g. asset paths) a package can embed.
/// `ResourceName` ledger entries point at a single name already owned by
/// one of these chunks, so fixing one up is a no-op — the containing
/// chunk's own fixup already rewrote it.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ResourceNameChunk {
    pub resource_count: u32,
    pub resource_names: *const *const u8,
}
