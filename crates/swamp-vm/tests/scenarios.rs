//! End-to-end scenarios for the opcode dispatch loop, each hand-assembling
//! the smallest byte image that exercises one behavior rather than
//! depending on an external compiler.

use swamp_mem::StaticMemory;
use swamp_vm::config::RunConfig;
use swamp_vm::context::ExecutionContext;
use swamp_vm::interpreter::{self, Params, ResultSlot};
use swamp_vm::value::{FuncRef, SwampArray, SwampFunc, SwampFunction, SwampFunctionType, SwampString};

fn make_func(
    opcodes: &[u8],
    parameter_count: usize,
    parameters_octet_size: usize,
    return_octet_size: usize,
    return_align: usize,
) -> SwampFunc {
    SwampFunc {
        func: SwampFunction {
            kind: SwampFunctionType::Internal,
        },
        parameter_count,
        parameters_octet_size,
        opcodes: opcodes.as_ptr(),
        opcode_count: opcodes.len(),
        return_octet_size,
        return_align,
        debug_name: std::ptr::null(),
        debug_name_len: 0,
        type_index: 0,
        debug_info_lines: std::ptr::null(),
        debug_info_lines_octet_count: 0,
        debug_info_variables: std::ptr::null(),
        debug_info_variables_octet_count: 0,
    }
}

#[test]
fn identity_on_int() {
    // mem_cpy(dst=0, src=return_size, size=4); return
    let mut opcodes = Vec::new();
    opcodes.push(1); // MemCopy
    opcodes.extend_from_slice(&0u32.to_le_bytes()); // dst
    opcodes.extend_from_slice(&4u32.to_le_bytes()); // src (right after the 4-byte return slot)
    opcodes.extend_from_slice(&4u16.to_le_bytes()); // range
    opcodes.push(16); // Return

    let func = make_func(&opcodes, 1, 4, 4, 4);
    let static_mem = StaticMemory::from_bytes(Vec::new());
    let mut ctx = ExecutionContext::new(&static_mem, RunConfig::default());

    let arg = 42i32.to_le_bytes();
    let params = Params {
        source: arg.as_ptr(),
        octet_size: 4,
        parameter_count: 1,
    };
    let mut result = ResultSlot {
        expected_octet_size: 4,
        target: std::ptr::null_mut(),
    };

    interpreter::run(&mut ctx, FuncRef(&func), params, &mut result).unwrap();
    // SAFETY: `run` set `result.target` to a live 4-byte `Int` slot on return.
    let got = unsafe { result.target.cast::<i32>().read_unaligned() };
    assert_eq!(got, 42);
}

#[test]
fn int_add() {
    // int_add(dst=0, a=return_size, b=return_size+4); return
    let mut opcodes = Vec::new();
    opcodes.push(21); // IntAdd
    opcodes.extend_from_slice(&0u32.to_le_bytes());
    opcodes.extend_from_slice(&4u32.to_le_bytes());
    opcodes.extend_from_slice(&8u32.to_le_bytes());
    opcodes.push(16); // Return

    let func = make_func(&opcodes, 2, 8, 4, 4);
    let static_mem = StaticMemory::from_bytes(Vec::new());
    let mut ctx = ExecutionContext::new(&static_mem, RunConfig::default());

    let mut args = Vec::new();
    args.extend_from_slice(&7i32.to_le_bytes());
    args.extend_from_slice(&5i32.to_le_bytes());
    let params = Params {
        source: args.as_ptr(),
        octet_size: 8,
        parameter_count: 2,
    };
    let mut result = ResultSlot {
        expected_octet_size: 4,
        target: std::ptr::null_mut(),
    };

    interpreter::run(&mut ctx, FuncRef(&func), params, &mut result).unwrap();
    let got = unsafe { result.target.cast::<i32>().read_unaligned() };
    assert_eq!(got, 12);
}

#[test]
fn list_conj_then_length() {
    // Builds [1, 2, 3] from an empty list via three list_conj opcodes, then
    // copies the list header's `count` field into the return slot.
    const LIST_SLOT: u32 = 16; // room for one SwampArray header (32 bytes on a 64-bit target)
    const TEMP_ITEM: u32 = 48;
    let count_field_offset = LIST_SLOT + std::mem::offset_of!(SwampArray, count) as u32;

    let mut opcodes = Vec::new();
    opcodes.push(7); // CreateList
    opcodes.extend_from_slice(&LIST_SLOT.to_le_bytes());
    opcodes.extend_from_slice(&0u16.to_le_bytes()); // count = 0
    opcodes.extend_from_slice(&4u16.to_le_bytes()); // item_size = 4

    for zero_page_value_offset in [0u32, 4, 8] {
        opcodes.push(2); // MemCopyFromZeroPage
        opcodes.extend_from_slice(&TEMP_ITEM.to_le_bytes());
        opcodes.extend_from_slice(&zero_page_value_offset.to_le_bytes());
        opcodes.extend_from_slice(&4u16.to_le_bytes());

        opcodes.push(6); // ListConj
        opcodes.extend_from_slice(&LIST_SLOT.to_le_bytes());
        opcodes.extend_from_slice(&LIST_SLOT.to_le_bytes());
        opcodes.extend_from_slice(&TEMP_ITEM.to_le_bytes());
        opcodes.extend_from_slice(&4u16.to_le_bytes());
    }

    opcodes.push(1); // MemCopy
    opcodes.extend_from_slice(&0u32.to_le_bytes()); // dst: return slot
    opcodes.extend_from_slice(&count_field_offset.to_le_bytes());
    opcodes.extend_from_slice(&(std::mem::size_of::<usize>() as u16).to_le_bytes());
    opcodes.push(16); // Return

    let mut static_bytes = Vec::new();
    static_bytes.extend_from_slice(&1i32.to_le_bytes());
    static_bytes.extend_from_slice(&2i32.to_le_bytes());
    static_bytes.extend_from_slice(&3i32.to_le_bytes());
    let static_mem = StaticMemory::from_bytes(static_bytes);

    let return_size = std::mem::size_of::<usize>();
    let func = make_func(&opcodes, 0, 0, return_size, std::mem::align_of::<usize>());
    let mut ctx = ExecutionContext::new(&static_mem, RunConfig::default());

    let params = Params {
        source: std::ptr::null(),
        octet_size: 0,
        parameter_count: 0,
    };
    let mut result = ResultSlot {
        expected_octet_size: return_size,
        target: std::ptr::null_mut(),
    };

    interpreter::run(&mut ctx, FuncRef(&func), params, &mut result).unwrap();
    let got = unsafe { result.target.cast::<usize>().read_unaligned() };
    assert_eq!(got, 3);
}

#[test]
fn string_append() {
    const A_SLOT: u32 = 16;
    const B_SLOT: u32 = 32;

    let mut opcodes = Vec::new();
    opcodes.push(20); // StringAppend
    opcodes.extend_from_slice(&0u32.to_le_bytes()); // dst: return slot
    opcodes.extend_from_slice(&A_SLOT.to_le_bytes());
    opcodes.extend_from_slice(&B_SLOT.to_le_bytes());
    opcodes.push(16); // Return

    let static_mem = StaticMemory::from_bytes(b"abcd".to_vec());
    let return_size = std::mem::size_of::<SwampString>();
    let func = make_func(&opcodes, 0, 0, return_size, std::mem::align_of::<SwampString>());
    let mut ctx = ExecutionContext::new(&static_mem, RunConfig::default());

    let a = SwampString {
        characters: static_mem.base_ptr(),
        character_count: 2,
    };
    // SAFETY: offset 2 is within the 4-byte static region just constructed.
    let b = SwampString {
        characters: unsafe { static_mem.base_ptr().add(2) },
        character_count: 2,
    };
    // SAFETY: both slots are within the default 64KB stack, well clear of
    // the return slot at offset 0.
    unsafe {
        ctx.stack().ptr_at(A_SLOT as usize).unwrap().cast::<SwampString>().write_unaligned(a);
        ctx.stack().ptr_at(B_SLOT as usize).unwrap().cast::<SwampString>().write_unaligned(b);
    }

    let params = Params {
        source: std::ptr::null(),
        octet_size: 0,
        parameter_count: 0,
    };
    let mut result = ResultSlot {
        expected_octet_size: return_size,
        target: std::ptr::null_mut(),
    };

    interpreter::run(&mut ctx, FuncRef(&func), params, &mut result).unwrap();
    // SAFETY: `run` wrote a live `SwampString` header into the return slot.
    let appended = unsafe { result.target.cast::<SwampString>().read_unaligned() };
    assert_eq!(appended.character_count, 4);
    // SAFETY: `string_append` NUL-terminates its allocation.
    let bytes = unsafe { std::slice::from_raw_parts(appended.characters, 5) };
    assert_eq!(bytes, b"abcd\0");
}

#[test]
fn enum_case_dispatch_with_wildcard() {
    // Table [(0, j0), (1, j1), (0xFF, jd)] with source tag 2: only the
    // wildcard matches, so execution must land in the third block.
    let mut opcodes = Vec::new();
    opcodes.push(10); // EnumCase
    opcodes.extend_from_slice(&4u32.to_le_bytes()); // source: the one-byte tag parameter
    opcodes.push(3); // case_count
    opcodes.push(0);
    opcodes.push(6); // j0: lands on the block at offset 12
    opcodes.push(1);
    opcodes.push(12); // j1: 12 past j0's target, offset 24
    opcodes.push(0xFF);
    opcodes.push(12); // jd: 12 past j1's target, offset 36
    assert_eq!(opcodes.len(), 12);

    for zero_page_offset in [0u32, 4, 8] {
        opcodes.push(2); // MemCopyFromZeroPage
        opcodes.extend_from_slice(&0u32.to_le_bytes()); // dst: return slot
        opcodes.extend_from_slice(&zero_page_offset.to_le_bytes());
        opcodes.extend_from_slice(&4u16.to_le_bytes());
        opcodes.push(16); // Return
    }
    assert_eq!(opcodes.len(), 48);

    let mut static_bytes = Vec::new();
    static_bytes.extend_from_slice(&100i32.to_le_bytes());
    static_bytes.extend_from_slice(&200i32.to_le_bytes());
    static_bytes.extend_from_slice(&300i32.to_le_bytes());
    let static_mem = StaticMemory::from_bytes(static_bytes);

    let func = make_func(&opcodes, 1, 1, 4, 4);
    let mut ctx = ExecutionContext::new(&static_mem, RunConfig::default());

    let tag = [2u8];
    let params = Params {
        source: tag.as_ptr(),
        octet_size: 1,
        parameter_count: 1,
    };
    let mut result = ResultSlot {
        expected_octet_size: 4,
        target: std::ptr::null_mut(),
    };

    interpreter::run(&mut ctx, FuncRef(&func), params, &mut result).unwrap();
    let got = unsafe { result.target.cast::<i32>().read_unaligned() };
    assert_eq!(got, 300);
}
