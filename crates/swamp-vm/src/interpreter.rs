//! The opcode dispatch loop: the one function that actually runs a Swamp
//! program once it has been loaded and fixed up.
//!
//! Every instruction is one byte followed by a fixed sequence of operands
//! decoded through [`opcodes::Reader`]; the loop never backtracks and never
//! inspects an opcode it hasn't already dispatched on, matching the
//! original runtime's `swampRun` switch one case at a time.

use crate::context::{CallFrame, ExecutionContext};
use crate::error::RuntimeError;
use crate::opcodes::{Opcode, Reader};
use crate::value::{
    self, FuncRef, SwampCurryFunc, SwampFunc, SwampFunctionExternal, SwampFunctionType,
    SwampList, SwampString,
};
use swamp_log::trace;

/// The caller-supplied argument block for a top-level invocation: a byte
/// buffer holding exactly `parameter_count` arguments' worth of octets,
/// packed the same way the compiler packs them inside a function body.
pub struct Params {
    pub source: *const u8,
    pub octet_size: usize,
    pub parameter_count: usize,
}

/// Where the caller wants the return value written, and how big it must
/// be — checked against the callee's own `return_octet_size` before a
/// single opcode runs.
pub struct ResultSlot {
    pub expected_octet_size: usize,
    pub target: *mut u8,
}

#[inline]
fn round_up_to_align(value: usize, align: usize) -> usize {
    let align = align.max(1);
    (value + align - 1) & !(align - 1)
}

/// Where a plain function's parameters begin, relative to its own base
/// pointer: right after the (possibly padded) return slot. Grounded on
/// `swampExecutePrepare`, which computes this same offset for a directly
/// invoked (non-curried) function with no further adjustment.
#[inline]
fn params_offset(func: &SwampFunc) -> usize {
    round_up_to_align(func.return_octet_size, func.return_align)
}

fn stack_addr(ctx: &ExecutionContext, bp: usize, offset: u32) -> Result<*mut u8, RuntimeError> {
    Ok(ctx.stack().ptr_at(bp + offset as usize)?)
}

fn zero_page_addr(ctx: &ExecutionContext, offset: u32) -> Result<*const u8, RuntimeError> {
    Ok(ctx.static_memory().get(offset)?)
}

/// Builds a `Reader` over `func`'s opcode stream, starting at the byte
/// `pc` currently points to.
///
/// # Safety
///
/// `pc` must lie within `[func.opcodes, func.opcodes + func.opcode_count]`.
unsafe fn reader_at<'f>(func: &'f SwampFunc, pc: *const u8) -> Reader<'f> {
    // SAFETY: caller guarantees `pc` is within the opcode buffer, so the
    // offset is non-negative and no larger than `opcode_count`.
    let consumed = unsafe { pc.offset_from(func.opcodes) } as usize;
    // SAFETY: `func.opcodes` is valid for `func.opcode_count` bytes — every
    // `SwampFunc` the loader hands the interpreter has already been fixed up.
    let slice = unsafe { std::slice::from_raw_parts(func.opcodes, func.opcode_count) };
    Reader::new(slice, consumed)
}

/// Runs `func` to completion with `params` as its arguments, writing the
/// result into `result`.
///
/// `ctx` is reused across calls; its base pointer and dynamic arena are
/// whatever the caller left them at (a fresh top-level call should
/// `ctx.reset()` first if it wants a clean dynamic arena).
pub fn run(
    ctx: &mut ExecutionContext,
    func: FuncRef,
    params: Params,
    result: &mut ResultSlot,
) -> Result<(), RuntimeError> {
    let func: &SwampFunc = &func;
    if params.parameter_count != func.parameter_count {
        return Err(RuntimeError::ParameterCountMismatch);
    }
    if result.expected_octet_size != func.return_octet_size {
        return Err(RuntimeError::ReturnSizeMismatch);
    }

    let entry_bp = ctx.bp();
    let param_dst = stack_addr(ctx, entry_bp, params_offset(func) as u32)?;
    // SAFETY: `params.source` is valid for `params.octet_size` bytes per
    // this function's contract; `param_dst` was just bounds-checked for a
    // write of at least that size (the compiler sized the frame to fit).
    unsafe {
        std::ptr::copy_nonoverlapping(params.source, param_dst, params.octet_size);
    }

    let mut bp = entry_bp;
    let mut current_func: *const SwampFunc = func;
    // SAFETY: `func` is a live, fixed-up `SwampFunc`; its opcode stream is
    // the loop's starting point.
    let mut pc: *const u8 = func.opcodes;

    loop {
        // SAFETY: `current_func` always points at a live `SwampFunc` (either
        // the one `run` was called with, or one reached via `call`/
        // `tail_call`, which only ever install functions fixed up by the
        // loader) and `pc` always lies within its opcode buffer by the loop
        // invariant maintained at every branch/call/return below.
        let func_ref: &SwampFunc = unsafe { &*current_func };

        if pc as usize >= unsafe { func_ref.opcodes.add(func_ref.opcode_count) } as usize {
            // Ran off the end of a function with no explicit `return` —
            // only possible with malformed bytecode, since every
            // well-formed function body ends in `return` or `tail_call`.
            return Err(RuntimeError::IllegalOpcode(0));
        }

        // SAFETY: just checked `pc` is strictly before the opcode buffer's end.
        let opcode_byte = unsafe { *pc };
        // SAFETY: advancing by one byte, still within or one-past the buffer.
        let mut reader = unsafe { reader_at(func_ref, pc.add(1)) };
        let opcode = Opcode::decode(opcode_byte)?;

        trace!("pc={:?} op={:?}", pc, opcode);

        match opcode {
            Opcode::MemCopy | Opcode::RegToReg => {
                let dst_off = reader.read_stack_offset();
                let src_off = reader.read_stack_offset();
                let range = reader.read_range();
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                let dst = stack_addr(ctx, bp, dst_off)?;
                let src = stack_addr(ctx, bp, src_off)?;
                // SAFETY: both addresses were bounds-checked against the
                // stack region; the compiler never emits overlapping
                // mem_cpy/reg_to_reg ranges.
                unsafe { std::ptr::copy_nonoverlapping(src, dst, range as usize) };
            }

            Opcode::MemCopyFromZeroPage => {
                let dst_off = reader.read_stack_offset();
                let src_off = reader.read_zero_page_offset();
                let range = reader.read_range();
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                let dst = stack_addr(ctx, bp, dst_off)?;
                let src = zero_page_addr(ctx, src_off)?;
                // SAFETY: `dst` is a bounds-checked stack address and `src`
                // a bounds-checked static-memory address; `range` bytes were
                // reserved for this constant by the compiler.
                unsafe { std::ptr::copy_nonoverlapping(src, dst, range as usize) };
            }

            Opcode::CreateStruct => {
                let dst_off = reader.read_stack_offset();
                let count = reader.read_count();
                let mut dst_cursor = 0usize;
                let mut items = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let item_src = reader.read_stack_offset();
                    let item_size = reader.read_range();
                    items.push((item_src, item_size));
                }
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                let dst = stack_addr(ctx, bp, dst_off)?;
                for (item_src, item_size) in items {
                    let src = stack_addr(ctx, bp, item_src)?;
                    // SAFETY: `dst + dst_cursor` stays inside the struct's
                    // reserved stack slot, whose total size the compiler
                    // already accounted for; `src` is a bounds-checked
                    // stack address for exactly `item_size` bytes.
                    unsafe {
                        std::ptr::copy_nonoverlapping(src, dst.add(dst_cursor), item_size as usize);
                    }
                    dst_cursor += item_size as usize;
                }
            }

            Opcode::UpdateStruct => {
                let dst_off = reader.read_stack_offset();
                let template_off = reader.read_stack_offset();
                let total_size = reader.read_range();
                let count = reader.read_count();
                let mut fields = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let field_src = reader.read_stack_offset();
                    let field_size = reader.read_range();
                    let field_offset = reader.read_count();
                    fields.push((field_src, field_size, field_offset));
                }
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                let dst = stack_addr(ctx, bp, dst_off)?;
                let template = stack_addr(ctx, bp, template_off)?;
                // SAFETY: `dst` and `template` are both bounds-checked stack
                // addresses for at least `total_size` bytes.
                unsafe { std::ptr::copy_nonoverlapping(template, dst, total_size as usize) };
                for (field_src, field_size, field_offset) in fields {
                    let src = stack_addr(ctx, bp, field_src)?;
                    // SAFETY: `field_offset + field_size` stays within the
                    // struct the compiler sized as `total_size`.
                    unsafe {
                        std::ptr::copy_nonoverlapping(
                            src,
                            dst.add(field_offset as usize),
                            field_size as usize,
                        );
                    }
                }
            }

            Opcode::ListConj => {
                let dst_off = reader.read_stack_offset();
                let src_list_off = reader.read_stack_offset();
                let src_item_off = reader.read_stack_offset();
                let range = reader.read_range();
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                let dst = stack_addr(ctx, bp, dst_off)?;
                let src_list = stack_addr(ctx, bp, src_list_off)?;
                let src_item = stack_addr(ctx, bp, src_item_off)?;

                // SAFETY: `src_list` addresses a live `SwampList` header on
                // the stack (every list value is stored inline there).
                let list = unsafe { *src_list.cast::<SwampList>() };
                // SAFETY: `src_item` is valid for `range` bytes: the item's
                // own stack slot, sized by the compiler to match the list's
                // item size.
                let item_bytes = unsafe { std::slice::from_raw_parts(src_item, range as usize) };
                // SAFETY: `list.value` is valid for `list.count *
                // list.item_size` bytes, an invariant every list
                // constructor (`create_list`, a prior `list_conj`) upholds.
                let grown = unsafe { value::list_conj(ctx.dynamic_mut(), &list, item_bytes)? };
                // SAFETY: `dst` has room for a `SwampList` header — the
                // compiler reserves that much for any list-typed slot.
                unsafe { dst.cast::<SwampList>().write_unaligned(grown) };
            }

            Opcode::CreateList | Opcode::CreateArray => {
                let dst_off = reader.read_stack_offset();
                let count = reader.read_count();
                let item_size = reader.read_range();
                let mut item_offsets = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    item_offsets.push(reader.read_stack_offset());
                }
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                let mut bytes = Vec::with_capacity(count as usize * item_size as usize);
                for off in item_offsets {
                    let src = stack_addr(ctx, bp, off)?;
                    // SAFETY: `src` is a bounds-checked stack address valid
                    // for `item_size` bytes (the item's own reserved slot).
                    let slice = unsafe { std::slice::from_raw_parts(src, item_size as usize) };
                    bytes.extend_from_slice(slice);
                }
                // No alignment operand exists in either opcode's encoding
                // (the original C has the same gap); 1 is always valid, at
                // the cost of `walker::compact`/`clone` re-aligning to 1
                // too when it later copies this list.
                let array = value::alloc_array_copy(
                    ctx.dynamic_mut(),
                    &bytes,
                    count as usize,
                    item_size as usize,
                    1,
                )?;
                let dst = stack_addr(ctx, bp, dst_off)?;
                // SAFETY: `dst` has room for a `SwampArray`/`SwampList`
                // header, same reasoning as `ListConj`.
                unsafe { dst.cast::<SwampList>().write_unaligned(array) };
            }

            Opcode::EnumCase => {
                let source_off = reader.read_stack_offset();
                let case_count = reader.read_u8();
                // The running jump target starts just past the table
                // header (source + case_count), mirroring the original's
                // `previous_jump_target_pc` accumulator.
                let mut previous_target = unsafe { func_ref.opcodes.add(reader.position()) };

                let source = stack_addr(ctx, bp, source_off)?;
                // SAFETY: `source` addresses a live enum's tag byte.
                let tag = unsafe { *source };

                let mut jump_to_use: Option<*const u8> = None;
                for _ in 0..case_count {
                    let case_tag = reader.read_u8();
                    let rel_jump = reader.read_jump();
                    let target = unsafe { previous_target.add(rel_jump as usize) };
                    if jump_to_use.is_none() && (case_tag == tag || case_tag == 0xFF) {
                        jump_to_use = Some(target);
                    }
                    previous_target = target;
                }
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                match jump_to_use {
                    Some(target) => pc = target,
                    None => return Err(RuntimeError::NoMatchingCase),
                }
            }

            Opcode::CasePatternMatching => {
                let source_off = reader.read_stack_offset();
                let range = reader.read_range();
                let case_count = reader.read_u8();
                let mut previous_target = unsafe { func_ref.opcodes.add(reader.position()) };

                let source = stack_addr(ctx, bp, source_off)?;

                let mut jump_to_use: Option<*const u8> = None;
                for _ in 0..case_count {
                    let case_src_off = reader.read_stack_offset();
                    let rel_jump = reader.read_jump();
                    let target = unsafe { previous_target.add(rel_jump as usize) };
                    if jump_to_use.is_none() {
                        let case_src = stack_addr(ctx, bp, case_src_off)?;
                        // SAFETY: both addresses are bounds-checked stack
                        // addresses valid for `range` bytes (the compiler
                        // gives every case arm the same pattern width).
                        let matches = unsafe {
                            std::slice::from_raw_parts(source, range as usize)
                                == std::slice::from_raw_parts(case_src, range as usize)
                        };
                        if matches {
                            jump_to_use = Some(target);
                        }
                    }
                    previous_target = target;
                }
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                match jump_to_use {
                    Some(target) => pc = target,
                    None => return Err(RuntimeError::NoMatchingCase),
                }
            }

            Opcode::BranchTrue | Opcode::BranchFalse => {
                let cond_off = reader.read_stack_offset();
                let jump = reader.read_jump();
                let after_operands = unsafe { func_ref.opcodes.add(reader.position()) };

                let cond_ptr = stack_addr(ctx, bp, cond_off)?;
                // SAFETY: `cond_ptr` addresses a live `Bool` byte.
                let cond = unsafe { *cond_ptr } != 0;
                let take = if opcode == Opcode::BranchTrue { cond } else { !cond };

                pc = if take {
                    unsafe { after_operands.add(jump as usize) }
                } else {
                    after_operands
                };
            }

            Opcode::Jump => {
                let jump = reader.read_jump();
                let after_operands = unsafe { func_ref.opcodes.add(reader.position()) };
                pc = unsafe { after_operands.add(jump as usize) };
            }

            Opcode::Call => {
                let callee_off = reader.read_zero_page_offset();
                let params_src_off = reader.read_stack_offset();
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                let callee_ptr = zero_page_addr(ctx, callee_off)?;
                // SAFETY: `callee_ptr` addresses a live callable record,
                // whose first field is always the shared `SwampFunction`
                // discriminant.
                let kind = unsafe { (*callee_ptr.cast::<SwampFunctionType>()) };

                let new_bp = bp + params_src_off as usize;

                let callee_func: *const SwampFunc = match kind {
                    SwampFunctionType::Internal => callee_ptr.cast::<SwampFunc>(),
                    SwampFunctionType::Curry => {
                        // SAFETY: `callee_ptr` addresses a live `SwampCurryFunc`.
                        let curry = unsafe { &*callee_ptr.cast::<SwampCurryFunc>() };
                        // SAFETY: `curry.curry_function` always points at a
                        // plain `Func`, never another curry, by construction
                        // (`curry`'s own invariant).
                        let underlying = unsafe { &*curry.curry_function };
                        let start = new_bp + params_offset(underlying);
                        let remaining = underlying
                            .parameters_octet_size
                            .saturating_sub(curry.curry_octet_size);

                        let start_ptr = stack_addr(ctx, 0, start as u32)?;
                        // SAFETY: `start_ptr` and the shifted destination
                        // both lie within the stack region (the compiler
                        // sized the callee's frame for the full, uncurried
                        // parameter block); the regions may overlap, hence
                        // `copy` rather than `copy_nonoverlapping`.
                        unsafe {
                            std::ptr::copy(
                                start_ptr,
                                start_ptr.add(curry.curry_octet_size),
                                remaining,
                            );
                            std::ptr::copy_nonoverlapping(
                                curry.curry_octets,
                                start_ptr,
                                curry.curry_octet_size,
                            );
                        }
                        curry.curry_function
                    }
                    SwampFunctionType::External => return Err(RuntimeError::NotCallable),
                };

                ctx.call_stack_mut().push(CallFrame {
                    return_pc: pc,
                    base_pointer: bp,
                    func: current_func,
                })?;

                bp = new_bp;
                current_func = callee_func;
                // SAFETY: `callee_func` was just validated above (either a
                // plain internal function or a curry's underlying plain
                // function), so it is a live, fixed-up `SwampFunc`.
                pc = unsafe { (*callee_func).opcodes };
            }

            Opcode::TailCall => {
                // SAFETY: `func_ref` is the currently executing function.
                pc = func_ref.opcodes;
            }

            Opcode::Return => match ctx.call_stack_mut().pop() {
                Some(frame) => {
                    pc = frame.return_pc;
                    bp = frame.base_pointer;
                    current_func = frame.func;
                }
                None => {
                    result.target = stack_addr(ctx, bp, 0)?;
                    return Ok(());
                }
            },

            Opcode::CallExternal => {
                let dst_off = reader.read_stack_offset();
                let dst_range = reader.read_range();
                let extern_off = reader.read_zero_page_offset();
                let args_off = reader.read_stack_offset();
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                let extern_ptr = zero_page_addr(ctx, extern_off)?;
                // SAFETY: `extern_ptr` addresses a live, fixed-up
                // `SwampFunctionExternal`.
                let external = unsafe { &*extern_ptr.cast::<SwampFunctionExternal>() };
                let Some(function) = external.function else {
                    return Err(RuntimeError::NotCallable);
                };

                let dst = stack_addr(ctx, bp, dst_off)?;
                let args = stack_addr(ctx, bp, args_off)?;
                // SAFETY: `args` is a bounds-checked stack address holding
                // the packed argument block the host ABI expects; `dst` has
                // room for `dst_range` bytes; `ctx` is reborrowed as an
                // opaque host-context pointer only for the duration of this
                // call, matching the external ABI's contract.
                unsafe {
                    function(
                        (ctx as *mut ExecutionContext).cast::<std::ffi::c_void>(),
                        args,
                        dst,
                        dst_range as usize,
                    );
                }
            }

            Opcode::Curry => {
                let dst_off = reader.read_stack_offset();
                let src_func_off = reader.read_zero_page_offset();
                let captured_off = reader.read_stack_offset();
                let captured_range = reader.read_range();
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                let source_func_ptr = zero_page_addr(ctx, src_func_off)?.cast::<SwampFunc>();
                let captured_ptr = stack_addr(ctx, bp, captured_off)?;
                // SAFETY: `captured_ptr` is a bounds-checked stack address
                // valid for `captured_range` bytes (the compiler reserves
                // exactly that much for the captured arguments).
                let captured = unsafe { std::slice::from_raw_parts(captured_ptr, captured_range as usize) };

                // SAFETY: `source_func_ptr` addresses a live, fixed-up
                // `SwampFunc`.
                let first_parameter_align = unsafe { (*source_func_ptr).return_align.max(1) as u8 };
                let curry_ptr = value::alloc_curry(
                    ctx.dynamic_mut(),
                    source_func_ptr,
                    captured,
                    first_parameter_align,
                )?;

                let dst = stack_addr(ctx, bp, dst_off)?;
                // SAFETY: `dst` has room for a pointer-sized function value
                // slot; callable values are always represented as a single
                // pointer on the stack.
                unsafe { dst.cast::<*const SwampCurryFunc>().write_unaligned(curry_ptr) };
            }

            Opcode::StringAppend => {
                let dst_off = reader.read_stack_offset();
                let a_off = reader.read_stack_offset();
                let b_off = reader.read_stack_offset();
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                let a_ptr = stack_addr(ctx, bp, a_off)?;
                let b_ptr = stack_addr(ctx, bp, b_off)?;
                // SAFETY: both addresses hold live, inline `SwampString`
                // headers.
                let (a, b) = unsafe { (*a_ptr.cast::<SwampString>(), *b_ptr.cast::<SwampString>()) };
                // SAFETY: both strings' backing bytes are valid per their
                // own `character_count`, an invariant every string
                // constructor upholds.
                let appended = unsafe { value::string_append(ctx.dynamic_mut(), &a, &b)? };

                let dst = stack_addr(ctx, bp, dst_off)?;
                // SAFETY: `dst` has room for a `SwampString` header.
                unsafe { dst.cast::<SwampString>().write_unaligned(appended) };
            }

            Opcode::IntAdd
            | Opcode::IntSub
            | Opcode::IntMul
            | Opcode::IntDiv
            | Opcode::IntMod
            | Opcode::FixedMul
            | Opcode::FixedDiv
            | Opcode::IntAnd
            | Opcode::IntOr
            | Opcode::IntXor
            | Opcode::IntShl
            | Opcode::IntShr => {
                let dst_off = reader.read_stack_offset();
                let a_off = reader.read_stack_offset();
                let b_off = reader.read_stack_offset();
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                let dst = stack_addr(ctx, bp, dst_off)?;
                let a_ptr = stack_addr(ctx, bp, a_off)?;
                let b_ptr = stack_addr(ctx, bp, b_off)?;
                // SAFETY: all three addresses hold live 32-bit `Int` values.
                let (a, b) = unsafe { (*a_ptr.cast::<i32>(), *b_ptr.cast::<i32>()) };

                let result_value = match opcode {
                    Opcode::IntAdd => a.wrapping_add(b),
                    Opcode::IntSub => a.wrapping_sub(b),
                    Opcode::IntMul => a.wrapping_mul(b),
                    Opcode::IntDiv => {
                        if b == 0 {
                            return Err(RuntimeError::DivideByZero);
                        }
                        a.wrapping_div(b)
                    }
                    Opcode::IntMod => {
                        if b == 0 {
                            return Err(RuntimeError::DivideByZero);
                        }
                        a.wrapping_rem(b)
                    }
                    Opcode::FixedMul => {
                        (((a as i64) * (b as i64)) / value::FIXED_FACTOR as i64) as i32
                    }
                    Opcode::FixedDiv => {
                        if b == 0 {
                            return Err(RuntimeError::DivideByZero);
                        }
                        (((a as i64) * value::FIXED_FACTOR as i64) / b as i64) as i32
                    }
                    Opcode::IntAnd => a & b,
                    Opcode::IntOr => a | b,
                    Opcode::IntXor => a ^ b,
                    Opcode::IntShl => a.wrapping_shl(b as u32),
                    Opcode::IntShr => a.wrapping_shr(b as u32),
                    _ => unreachable!(),
                };
                // SAFETY: `dst` holds a live 32-bit `Int`/`Fixed` slot.
                unsafe { dst.cast::<i32>().write_unaligned(result_value) };
            }

            Opcode::IntEqual
            | Opcode::IntNotEqual
            | Opcode::IntLess
            | Opcode::IntLessEqual
            | Opcode::IntGreater
            | Opcode::IntGreaterEqual => {
                let dst_off = reader.read_stack_offset();
                let a_off = reader.read_stack_offset();
                let b_off = reader.read_stack_offset();
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                let dst = stack_addr(ctx, bp, dst_off)?;
                let a_ptr = stack_addr(ctx, bp, a_off)?;
                let b_ptr = stack_addr(ctx, bp, b_off)?;
                // SAFETY: both addresses hold live 32-bit `Int` values.
                let (a, b) = unsafe { (*a_ptr.cast::<i32>(), *b_ptr.cast::<i32>()) };

                let result_bool = match opcode {
                    Opcode::IntEqual => a == b,
                    Opcode::IntNotEqual => a != b,
                    Opcode::IntLess => a < b,
                    Opcode::IntLessEqual => a <= b,
                    Opcode::IntGreater => a > b,
                    Opcode::IntGreaterEqual => a >= b,
                    _ => unreachable!(),
                };
                // SAFETY: `dst` holds a live `Bool` byte slot.
                unsafe { *dst = result_bool as u8 };
            }

            Opcode::IntNot | Opcode::IntNegate | Opcode::BoolNot => {
                let dst_off = reader.read_stack_offset();
                let a_off = reader.read_stack_offset();
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                let dst = stack_addr(ctx, bp, dst_off)?;
                let a_ptr = stack_addr(ctx, bp, a_off)?;

                match opcode {
                    Opcode::IntNot => {
                        // SAFETY: `a_ptr`/`dst` hold live 32-bit `Int` values.
                        let a = unsafe { *a_ptr.cast::<i32>() };
                        unsafe { dst.cast::<i32>().write_unaligned(!a) };
                    }
                    Opcode::IntNegate => {
                        // SAFETY: same as above.
                        let a = unsafe { *a_ptr.cast::<i32>() };
                        unsafe { dst.cast::<i32>().write_unaligned(a.wrapping_neg()) };
                    }
                    Opcode::BoolNot => {
                        // SAFETY: `a_ptr`/`dst` hold live `Bool` bytes.
                        let a = unsafe { *a_ptr };
                        unsafe { *dst = if a != 0 { 0 } else { 1 } };
                    }
                    _ => unreachable!(),
                }
            }

            Opcode::CmpEqual | Opcode::CmpNotEqual => {
                let dst_off = reader.read_stack_offset();
                let a_off = reader.read_stack_offset();
                let b_off = reader.read_stack_offset();
                let range = reader.read_range();
                pc = unsafe { func_ref.opcodes.add(reader.position()) };

                let dst = stack_addr(ctx, bp, dst_off)?;
                let a_ptr = stack_addr(ctx, bp, a_off)?;
                let b_ptr = stack_addr(ctx, bp, b_off)?;
                // SAFETY: both addresses are bounds-checked stack addresses
                // valid for `range` bytes (the compiler gives both operands
                // of a comparison the same width).
                let equal = unsafe {
                    std::slice::from_raw_parts(a_ptr, range as usize)
                        == std::slice::from_raw_parts(b_ptr, range as usize)
                };
                let result_bool = if opcode == Opcode::CmpEqual { equal } else { !equal };
                // SAFETY: `dst` holds a live `Bool` byte slot.
                unsafe { *dst = result_bool as u8 };
            }
        }
    }
}
