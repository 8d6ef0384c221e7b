//! The ledger fixup pass: rewriting a loaded package's pointer-shaped
//! fields from file offsets into runtime addresses, and binding external
//! functions to host-provided implementations.
//!
//! Every pointer field inside static memory starts life holding a plain
//! byte offset relative to the start of the region (that's all a package
//! file can record — it doesn't know where the region will end up once
//! loaded). The ledger names every such field; this pass visits each one
//! exactly once and turns `field` into `static_base + field`.

use crate::debuginfo::{DebugInfoFiles, DebugInfoLines, DebugInfoVariables, DebugInfoVariablesEntry};
use crate::error::LinkError;
use crate::ledger::{
    Ledger, KIND_DEBUG_INFO_FILES, KIND_EXTERNAL_FUNC, KIND_FUNC, KIND_RESOURCE_NAME,
    KIND_RESOURCE_NAME_CHUNK, KIND_STRING,
};
use crate::value::{SwampFunc, SwampFunctionExternal, SwampString};
use swamp_log::{debug, warn};
use swamp_mem::StaticMemory;

/// Resolves an external function's fully-qualified name to a host
/// implementation. A trait rather than a bare function pointer so a host
/// can carry its own resolution state (a registry, a map) without a global.
pub trait ExternalResolver {
    fn resolve(&mut self, fully_qualified_name: &str) -> Option<crate::value::ExternFn>;
}

/// The result of a successful fixup pass.
pub struct FixupOutcome {
    /// The function named `main`, if one was found.
    pub entry_function: Option<*const SwampFunc>,
    /// Every `Func` ledger entry's debug name paired with its fixed-up
    /// address, so a loader can answer `find_function` for names other than
    /// `main` too.
    pub functions: Vec<(String, *const SwampFunc)>,
    /// Fully-qualified names the resolver could not bind. A non-empty list
    /// means [`entry_function`](Self::entry_function) must be treated as
    /// unusable even if it is `Some` — the package has unresolved
    /// dependencies.
    pub unresolved: Vec<String>,
}

/// Reads the usize-sized file offset stored at `struct_ptr + field_offset`
/// and overwrites it with `base + offset`, returning the new pointer value
/// so callers can follow it to fix up nested records.
///
/// # Safety
///
/// `struct_ptr + field_offset` must be valid for a `usize`-sized
/// read-then-write, and must currently hold a byte offset produced by the
/// package writer (not yet a real pointer).
unsafe fn fixup_ptr_field(struct_ptr: *mut u8, field_offset: usize, base: *const u8) -> *mut u8 {
    let field_ptr = struct_ptr.add(field_offset).cast::<usize>();
    let file_offset = field_ptr.read_unaligned();
    let resolved = (base as usize) + file_offset;
    field_ptr.write_unaligned(resolved);
    resolved as *mut u8
}

fn read_str_at(ptr: *const u8, len: usize) -> String {
    // SAFETY: caller (the fixup loop) only calls this with pointers it just
    // fixed up to point `len` readable bytes into static memory.
    let slice = unsafe { std::slice::from_raw_parts(ptr, len) };
    String::from_utf8_lossy(slice).into_owned()
}

unsafe fn fixup_string(str_ptr: *mut u8, base: *const u8) {
    // SAFETY: caller guarantees `str_ptr` addresses a `SwampString`.
    fixup_ptr_field(str_ptr, std::mem::offset_of!(SwampString, characters), base);
}

unsafe fn fixup_func(func_ptr: *mut u8, base: *const u8) -> String {
    let debug_name_ptr = fixup_ptr_field(func_ptr, std::mem::offset_of!(SwampFunc, debug_name), base);
    fixup_ptr_field(func_ptr, std::mem::offset_of!(SwampFunc, opcodes), base);

    let lines_ptr = fixup_ptr_field(func_ptr, std::mem::offset_of!(SwampFunc, debug_info_lines), base);
    if !lines_ptr.is_null() {
        fixup_ptr_field(lines_ptr, std::mem::offset_of!(DebugInfoLines, lines), base);
    }

    let vars_ptr = fixup_ptr_field(func_ptr, std::mem::offset_of!(SwampFunc, debug_info_variables), base);
    if !vars_ptr.is_null() {
        let entries_ptr = fixup_ptr_field(vars_ptr, std::mem::offset_of!(DebugInfoVariables, variables), base);
        // SAFETY: `vars_ptr` was just fixed up to point at a valid
        // `DebugInfoVariables`.
        let count = unsafe { (*vars_ptr.cast::<DebugInfoVariables>()).count };
        for i in 0..count as usize {
            let entry_ptr = entries_ptr.add(i * std::mem::size_of::<DebugInfoVariablesEntry>());
            fixup_ptr_field(entry_ptr, std::mem::offset_of!(DebugInfoVariablesEntry, name), base);
        }
    }

    // SAFETY: `func_ptr` addresses a `SwampFunc`; `debug_name_ptr` and the
    // length field were just fixed up / are already a plain value field.
    let debug_name_len = unsafe { (*func_ptr.cast::<SwampFunc>()).debug_name_len };
    read_str_at(debug_name_ptr, debug_name_len)
}

unsafe fn fixup_external_func<R: ExternalResolver>(
    func_ptr: *mut u8,
    base: *const u8,
    resolver: &mut R,
) -> Result<(), String> {
    let name_ptr = fixup_ptr_field(func_ptr, std::mem::offset_of!(SwampFunctionExternal, fully_qualified_name), base);
    // SAFETY: `func_ptr` addresses a `SwampFunctionExternal`.
    let name_len = unsafe { (*func_ptr.cast::<SwampFunctionExternal>()).fully_qualified_name_len };
    let name = read_str_at(name_ptr, name_len);

    match resolver.resolve(&name) {
        Some(f) => {
            // SAFETY: `func_ptr` addresses a `SwampFunctionExternal`.
            unsafe {
                (*func_ptr.cast::<SwampFunctionExternal>()).function = Some(f);
            }
            debug!("bound external function '{}'", name);
            Ok(())
        }
        None => {
            warn!("unresolved external function '{}'", name);
            Err(name)
        }
    }
}

unsafe fn fixup_resource_name_chunk(chunk_ptr: *mut u8, base: *const u8) {
    let names_ptr = fixup_ptr_field(
        chunk_ptr,
        std::mem::offset_of!(crate::debuginfo::ResourceNameChunk, resource_names),
        base,
    );
    // SAFETY: `chunk_ptr` addresses a `ResourceNameChunk`.
    let count = unsafe { (*chunk_ptr.cast::<crate::debuginfo::ResourceNameChunk>()).resource_count };
    let slots = names_ptr.cast::<*mut u8>();
    for i in 0..count as usize {
        // SAFETY: `slots` points to `count` pointer-sized slots, each
        // itself holding a file offset to a string's bytes (not yet a
        // length-prefixed `SwampString`, just raw NUL-free bytes this
        // fixup only needs the address of).
        unsafe {
            let slot = slots.add(i).cast::<u8>();
            fixup_ptr_field(slot, 0, base);
        }
    }
}

unsafe fn fixup_debug_info_files(files_ptr: *mut u8, base: *const u8) {
    let names_ptr = fixup_ptr_field(files_ptr, std::mem::offset_of!(DebugInfoFiles, filenames), base);
    // SAFETY: `files_ptr` addresses a `DebugInfoFiles`.
    let count = unsafe { (*files_ptr.cast::<DebugInfoFiles>()).count };
    let slots = names_ptr.cast::<*mut u8>();
    for i in 0..count as usize {
        // SAFETY: same reasoning as `fixup_resource_name_chunk`.
        unsafe {
            let slot = slots.add(i).cast::<u8>();
            fixup_ptr_field(slot, 0, base);
        }
    }
}

/// Runs the fixup pass over every entry in `ledger`, rewriting pointer
/// fields inside `memory` in place and resolving external functions
/// through `resolver`.
///
/// Mirrors the original pass's soft-error behavior: an unresolved external
/// function does not abort the walk early. Every remaining entry is still
/// visited (so static memory ends up fully and consistently fixed up), and
/// the unresolved names are collected for the caller to report as a link
/// error once the whole ledger has been processed.
pub fn fixup_ledger<R: ExternalResolver>(
    memory: &mut StaticMemory,
    ledger: &Ledger,
    resolver: &mut R,
) -> Result<FixupOutcome, LinkError> {
    let base = memory.base_ptr();
    let mut entry_function: Option<*const SwampFunc> = None;
    let mut functions = Vec::new();
    let mut unresolved = Vec::new();

    for entry in ledger.entries() {
        let struct_ptr = memory.get_mut(entry.offset).map_err(|_| LinkError::UnknownLedgerKind(entry.kind))?;

        match entry.kind {
            KIND_FUNC => {
                // SAFETY: the ledger entry names a valid `SwampFunc` at this offset.
                let name = unsafe { fixup_func(struct_ptr, base) };
                let func_ptr = struct_ptr.cast::<SwampFunc>();
                if name == "main" {
                    entry_function = Some(func_ptr);
                }
                functions.push((name, func_ptr as *const SwampFunc));
            }
            KIND_EXTERNAL_FUNC => {
                // SAFETY: the ledger entry names a valid `SwampFunctionExternal`.
                if let Err(name) = unsafe { fixup_external_func(struct_ptr, base, resolver) } {
                    unresolved.push(name);
                }
            }
            KIND_STRING => {
                // SAFETY: the ledger entry names a valid `SwampString`.
                unsafe { fixup_string(struct_ptr, base) };
            }
            KIND_RESOURCE_NAME_CHUNK => {
                // SAFETY: the ledger entry names a valid `ResourceNameChunk`.
                unsafe { fixup_resource_name_chunk(struct_ptr, base) };
            }
            KIND_RESOURCE_NAME => {
                // Intentionally a no-op: the owning chunk already fixed this up.
            }
            KIND_DEBUG_INFO_FILES => {
                // SAFETY: the ledger entry names a valid `DebugInfoFiles`.
                unsafe { fixup_debug_info_files(struct_ptr, base) };
            }
            other => return Err(LinkError::UnknownLedgerKind(other)),
        }
    }

    Ok(FixupOutcome {
        entry_function,
        functions,
        unresolved,
    })
}
