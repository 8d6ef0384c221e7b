//! Fixed-layout value records materialized in [`swamp_mem`] arenas.
//!
//! Every record here is `#[repr(C)]` and describes bytes the interpreter
//! addresses directly — none of them carry a Rust destructor, because the
//! runtime never frees an individual value; arenas are released as a unit.
//! Ownership of anything heavier than bytes (an [`Unmanaged`] host object)
//! is tracked separately by the execution context's unmanaged registry.

use swamp_mem::DynamicArena;

/// `1000`: the scale factor separating a [`Fixed`] value's integer and
/// fractional parts. `3.5` is stored as the `Int` `3500`.
pub const FIXED_FACTOR: i32 = 1000;

/// A 32-bit signed integer, as it appears on the stack or in static memory.
pub type Int = i32;

/// A fixed-point number: an `Int` scaled by [`FIXED_FACTOR`].
pub type Fixed = i32;

/// A single Unicode scalar value stored as a 32-bit integer, matching
/// `SwampCharacter`'s underlying representation.
pub type Character = i32;

/// A boolean stored as a single byte (`0` or `1`), matching `SwampBool`.
pub type Bool = u8;

pub const SWAMP_TRUE: Bool = 1;
pub const SWAMP_FALSE: Bool = 0;

/// An immutable, counted run of UTF-8 bytes.
///
/// `characters` points into either [`swamp_mem::StaticMemory`] (string
/// literals) or a [`swamp_mem::DynamicArena`] (runtime-constructed
/// strings); `swamp-vm` never distinguishes the two once fixed up, since
/// both are just addressable bytes by the time the interpreter runs.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SwampString {
    pub characters: *const u8,
    pub character_count: usize,
}

/// An immutable, counted run of raw bytes with no string semantics.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SwampBlob {
    pub octets: *const u8,
    pub octet_count: usize,
}

/// A contiguous, counted run of fixed-size items.
///
/// `SwampArray` and `SwampList` share this one layout: a list is simply an
/// array the bytecode happens to call `conj`/`length` on. There is no
/// `next` pointer anywhere in this record — appending to a list allocates a
/// fresh buffer one item longer and copies into it (see [`list_conj`]).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SwampArray {
    pub value: *const u8,
    pub count: usize,
    pub item_size: usize,
    pub item_align: usize,
}

pub type SwampList = SwampArray;

/// Discriminant shared by every callable value, mirroring
/// `SwampFunctionType`. Lets the interpreter inspect a function pointer's
/// first field to decide which of the three records follows it.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwampFunctionType {
    Internal = 0,
    External = 1,
    Curry = 2,
}

/// Header common to every callable record; always the first field.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SwampFunction {
    pub kind: SwampFunctionType,
}

/// An interpreted function: a fixed opcode stream plus the calling
/// convention the interpreter needs to set up its frame.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SwampFunc {
    pub func: SwampFunction,
    pub parameter_count: usize,
    pub parameters_octet_size: usize,
    pub opcodes: *const u8,
    pub opcode_count: usize,
    pub return_octet_size: usize,
    pub return_align: usize,
    pub debug_name: *const u8,
    pub debug_name_len: usize,
    pub type_index: u16,
    pub debug_info_lines: *const u8,
    pub debug_info_lines_octet_count: usize,
    pub debug_info_variables: *const u8,
    pub debug_info_variables_octet_count: usize,
}

/// A partially-applied function: a source function plus the octets already
/// bound for its leading parameters.
///
/// At call time, `call`'s curry-splice copies `captured_octets` ahead of
/// whatever parameters the caller supplies, so `curry_function`'s opcode
/// stream sees one contiguous parameter block regardless of how many times
/// the call was curried.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SwampCurryFunc {
    pub func: SwampFunction,
    pub curry_octet_size: usize,
    pub curry_octets: *const u8,
    pub curry_function: *const SwampFunc,
    pub type_id_index: u16,
    pub first_parameter_align: u8,
}

/// The single external-function ABI this runtime exposes to host code.
///
/// The original runtime carries five arity-specific function-pointer slots
/// (`SwampExternalFunction0`..`SwampExternalFunction5`); this crate
/// collapses them to one signature that always receives a packed argument
/// buffer, which is plain, idiomatic Rust and loses nothing the bytecode
/// can observe (arity is still checked against `parameter_count` at fixup
/// time, just against one function pointer instead of a choice of five).
pub type ExternFn =
    unsafe extern "C" fn(context: *mut std::ffi::c_void, args: *const u8, result: *mut u8, result_size: usize);

/// A host-provided function, bound by name during the fixup pass.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct SwampFunctionExternal {
    pub func: SwampFunction,
    pub parameter_count: usize,
    pub return_octet_size: usize,
    pub fully_qualified_name: *const u8,
    pub fully_qualified_name_len: usize,
    pub function: Option<ExternFn>,
}

impl std::fmt::Debug for SwampFunctionExternal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwampFunctionExternal")
            .field("parameter_count", &self.parameter_count)
            .field("return_octet_size", &self.return_octet_size)
            .field("resolved", &self.function.is_some())
            .finish()
    }
}

/// A host object opaque to the interpreter, reachable through a vtable of
/// four operations the walker and diagnostics call into.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct SwampUnmanaged {
    pub ptr: *const std::ffi::c_void,
    pub debug_name: *const u8,
    pub debug_name_len: usize,
    pub serialize: Option<unsafe extern "C" fn(*const std::ffi::c_void, *mut u8, usize) -> usize>,
    pub to_string: Option<unsafe extern "C" fn(*const std::ffi::c_void, i32, *mut u8, usize) -> usize>,
    pub compact: Option<unsafe extern "C" fn(*mut *mut SwampUnmanaged, *mut std::ffi::c_void) -> i32>,
    pub clone: Option<unsafe extern "C" fn(*mut *mut SwampUnmanaged, *mut std::ffi::c_void) -> i32>,
}

impl std::fmt::Debug for SwampUnmanaged {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwampUnmanaged").field("ptr", &self.ptr).finish()
    }
}

/// A borrowed handle to one function living inside a loaded package's
/// static memory, returned by `Package::find_function` and consumed by
/// [`crate::interpreter::run`].
#[derive(Clone, Copy)]
pub struct FuncRef<'p>(pub &'p SwampFunc);

impl<'p> std::ops::Deref for FuncRef<'p> {
    type Target = SwampFunc;
    fn deref(&self) -> &SwampFunc {
        self.0
    }
}

/// Allocates a `SwampString` in `arena`, copying `bytes` and appending a
/// trailing NUL the way the original runtime's string constant pool does
/// (so a `SwampString`'s `characters` pointer can also be handed to C-style
/// consumers without a second copy).
pub fn alloc_string(arena: &mut DynamicArena, bytes: &[u8]) -> swamp_mem::Result<SwampString> {
    let mut owned = Vec::with_capacity(bytes.len() + 1);
    owned.extend_from_slice(bytes);
    owned.push(0);
    let ptr = arena.alloc_copy(&owned, 1)?;
    Ok(SwampString {
        characters: ptr.as_ptr(),
        character_count: bytes.len(),
    })
}

/// Returns the canonical empty list: zero count, dangling-but-aligned
/// value pointer, the item layout the caller still supplies so future
/// `conj`s onto this list know what they're appending.
pub fn empty_list(item_size: usize, item_align: usize) -> SwampList {
    SwampArray {
        value: std::ptr::NonNull::dangling().as_ptr(),
        count: 0,
        item_size,
        item_align,
    }
}

/// Allocates a list/array of `count` items of `item_size` bytes, copying
/// `source` (which must be exactly `count * item_size` bytes) into the
/// fresh buffer.
pub fn alloc_array_copy(
    arena: &mut DynamicArena,
    source: &[u8],
    count: usize,
    item_size: usize,
    item_align: usize,
) -> swamp_mem::Result<SwampArray> {
    debug_assert_eq!(source.len(), count * item_size);
    let ptr = arena.alloc_copy(source, item_align.max(1))?;
    Ok(SwampArray {
        value: ptr.as_ptr(),
        count,
        item_size,
        item_align,
    })
}

/// Implements `list_conj`: returns a fresh list holding `list`'s items
/// followed by one more, `item`. Always contiguous — there is no
/// cons-style prepend anywhere in this runtime's list representation.
///
/// # Safety
///
/// `list.value` must point to `list.count * list.item_size` readable bytes,
/// and `item` must be exactly `list.item_size` bytes.
pub unsafe fn list_conj(
    arena: &mut DynamicArena,
    list: &SwampList,
    item: &[u8],
) -> swamp_mem::Result<SwampList> {
    debug_assert_eq!(item.len(), list.item_size);
    let new_count = list.count + 1;
    let new_ptr = arena.alloc(new_count, list.item_size, list.item_align.max(1))?;
    // SAFETY: `new_ptr` was just reserved for exactly `new_count * item_size`
    // bytes; `list.value` is valid for `list.count * item_size` bytes per
    // this function's precondition, and the two regions cannot overlap
    // because `new_ptr` came from a fresh bump allocation.
    unsafe {
        std::ptr::copy_nonoverlapping(list.value, new_ptr.as_ptr(), list.count * list.item_size);
        std::ptr::copy_nonoverlapping(
            item.as_ptr(),
            new_ptr.as_ptr().add(list.count * list.item_size),
            list.item_size,
        );
    }
    Ok(SwampArray {
        value: new_ptr.as_ptr(),
        count: new_count,
        item_size: list.item_size,
        item_align: list.item_align,
    })
}

/// Allocates a `SwampBlob`, copying `bytes`.
pub fn alloc_blob(arena: &mut DynamicArena, bytes: &[u8]) -> swamp_mem::Result<SwampBlob> {
    let ptr = arena.alloc_copy(bytes, 1)?;
    Ok(SwampBlob {
        octets: ptr.as_ptr(),
        octet_count: bytes.len(),
    })
}

/// Allocates the captured-octets buffer for a curry, copying `captured`.
pub fn alloc_curry_octets(arena: &mut DynamicArena, captured: &[u8], align: usize) -> swamp_mem::Result<*const u8> {
    Ok(arena.alloc_copy(captured, align.max(1))?.as_ptr())
}

/// Builds a `SwampCurryFunc` closing over `captured` and pointing at
/// `curry_function`, allocating both the captured-octets buffer and the
/// record itself in `arena`.
pub fn alloc_curry(
    arena: &mut DynamicArena,
    curry_function: *const SwampFunc,
    captured: &[u8],
    first_parameter_align: u8,
) -> swamp_mem::Result<*const SwampCurryFunc> {
    let curry_octets = alloc_curry_octets(arena, captured, first_parameter_align as usize)?;
    let record = SwampCurryFunc {
        func: SwampFunction {
            kind: SwampFunctionType::Curry,
        },
        curry_octet_size: captured.len(),
        curry_octets,
        curry_function,
        type_id_index: 0,
        first_parameter_align,
    };
    // SAFETY: `record` is a plain `#[repr(C)]` value; its bytes are read
    // here only to copy them, never interpreted as anything else.
    let bytes = unsafe {
        std::slice::from_raw_parts(
            (&record as *const SwampCurryFunc).cast::<u8>(),
            std::mem::size_of::<SwampCurryFunc>(),
        )
    };
    let ptr = arena.alloc_copy(bytes, std::mem::align_of::<SwampCurryFunc>())?;
    Ok(ptr.as_ptr().cast::<SwampCurryFunc>())
}

/// Implements `string_append`: concatenates two strings into a fresh
/// allocation, NUL-terminated like every other string this runtime
/// allocates (see [`alloc_string`]).
///
/// # Safety
///
/// `a.characters` and `b.characters` must be valid for their respective
/// `character_count` bytes.
pub unsafe fn string_append(
    arena: &mut DynamicArena,
    a: &SwampString,
    b: &SwampString,
) -> swamp_mem::Result<SwampString> {
    // SAFETY: caller guarantees both strings' backing bytes are valid.
    let (a_bytes, b_bytes) = unsafe {
        (
            std::slice::from_raw_parts(a.characters, a.character_count),
            std::slice::from_raw_parts(b.characters, b.character_count),
        )
    };
    let mut combined = Vec::with_capacity(a_bytes.len() + b_bytes.len());
    combined.extend_from_slice(a_bytes);
    combined.extend_from_slice(b_bytes);
    alloc_string(arena, &combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_string_appends_nul_but_excludes_it_from_count() {
        let mut arena = DynamicArena::new(256);
        let s = alloc_string(&mut arena, b"hello").unwrap();
        assert_eq!(s.character_count, 5);
        // SAFETY: alloc_string wrote 6 bytes (5 + NUL) at this pointer.
        let nul = unsafe { *s.characters.add(5) };
        assert_eq!(nul, 0);
    }

    #[test]
    fn list_conj_is_contiguous_and_append_only() {
        let mut arena = DynamicArena::new(1024);
        let items: [i32; 3] = [1, 2, 3];
        let bytes = unsafe {
            std::slice::from_raw_parts(items.as_ptr().cast::<u8>(), std::mem::size_of_val(&items))
        };
        let list = alloc_array_copy(&mut arena, bytes, 3, 4, 4).unwrap();
        let four = 4i32.to_ne_bytes();
        // SAFETY: list.value points to 3*4 valid bytes just allocated above.
        let grown = unsafe { list_conj(&mut arena, &list, &four).unwrap() };
        assert_eq!(grown.count, 4);
        // SAFETY: grown.value points to 4*4 valid bytes just allocated.
        let slice: &[i32] = unsafe { std::slice::from_raw_parts(grown.value.cast::<i32>(), 4) };
        assert_eq!(slice, &[1, 2, 3, 4]);
        // original list must be untouched
        assert_eq!(list.count, 3);
    }
}
