//! The structural walker: `clone`/`compact` over a value guided entirely by
//! a [`TypeDescriptor`], plus the `is_blittable_or_ecs` pre-check that
//! decides whether a value needs walking at all.
//!
//! Both operations share one recursive traversal (`walk`); the only
//! difference between them is which [`SwampUnmanaged`] vtable entry fires
//! at a leaf. "Compact" is a deep copy into fresh memory with no further
//! semantics attached to the host objects it meets along the way; "clone"
//! asks each host object to duplicate itself.

use crate::error::WalkError;
use crate::typedesc::TypeDescriptor;
use crate::value::{SwampArray, SwampBlob, SwampString, SwampUnmanaged};
use swamp_mem::DynamicArena;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkMode {
    Clone,
    Compact,
}

/// Returns whether `ty` can be walked by [`compact`]/[`clone`] without
/// running into a type this runtime declines to support in this version
/// (`Function`'s return type, `Any`, `AnyMatchingTypes`, `ResourceName`).
///
/// `Unmanaged` is blittable only if it is named `"EcsWorld"` — the one
/// escape hatch this runtime's walker knows about; every other unmanaged
/// type makes its enclosing value non-blittable.
pub fn is_blittable_or_ecs(ty: &TypeDescriptor) -> bool {
    match ty.resolved() {
        TypeDescriptor::Array { item } | TypeDescriptor::List { item } => is_blittable_or_ecs(item),
        TypeDescriptor::ResourceName => false,
        TypeDescriptor::Unmanaged { name } => name == "EcsWorld",
        TypeDescriptor::Function { params, .. } => params.iter().all(is_blittable_or_ecs),
        TypeDescriptor::Tuple { fields } => fields.iter().all(|f| is_blittable_or_ecs(&f.ty)),
        TypeDescriptor::Custom { variants, .. } => variants
            .iter()
            .all(|v| v.fields.iter().all(|f| is_blittable_or_ecs(&f.ty))),
        TypeDescriptor::Record { fields, .. } => fields.iter().all(|f| is_blittable_or_ecs(&f.ty)),
        TypeDescriptor::Alias { .. } => unreachable!("resolved() already follows aliases"),
        _ => true,
    }
}

/// Deep-copies `value` (`size` bytes, shaped by `ty`) into `target`,
/// producing an independent value with no host object sharing except
/// whatever the host's own [`SwampUnmanaged::compact`] implementation
/// chooses to keep. `target` must be freshly reset (this mirrors the
/// source runtime's own precondition — compacting into a partially-used
/// arena would leave the result's internal pointers pointing at memory
/// that may later be reused).
///
/// Refuses to run on a non-blittable tree: `compact` only ever deep-copies,
/// never asks a host object for permission, so a type that is not
/// [`is_blittable_or_ecs`] must be rejected up front rather than discovered
/// leaf-by-leaf (an `Unmanaged` leaf with its own `compact` vtable entry
/// would otherwise succeed despite not being blittable).
///
/// # Safety
///
/// `value` must point to `size` readable bytes laid out exactly as `ty`
/// describes.
pub unsafe fn compact(
    target: &mut DynamicArena,
    value: *const u8,
    size: usize,
    ty: &TypeDescriptor,
) -> Result<*const u8, WalkError> {
    if !is_blittable_or_ecs(ty) {
        return Err(WalkError::UnsupportedShape);
    }
    walk(target, value, size, ty, WalkMode::Compact)
}

/// Deep-copies `value` into `target`, asking every host object reachable
/// from it to clone itself via [`SwampUnmanaged::clone`]. Same
/// reset-target precondition as [`compact`].
///
/// # Safety
///
/// Same as [`compact`].
pub unsafe fn clone_value(
    target: &mut DynamicArena,
    value: *const u8,
    size: usize,
    ty: &TypeDescriptor,
) -> Result<*const u8, WalkError> {
    walk(target, value, size, ty, WalkMode::Clone)
}

unsafe fn walk(
    target: &mut DynamicArena,
    value: *const u8,
    size: usize,
    ty: &TypeDescriptor,
    mode: WalkMode,
) -> Result<*const u8, WalkError> {
    let copy_ptr = target
        .alloc_copy(
            // SAFETY: caller guarantees `value` is valid for `size` bytes.
            unsafe { std::slice::from_raw_parts(value, size) },
            8,
        )
        .map_err(|_| WalkError::ArenaExhausted)?
        .as_ptr();

    // SAFETY: `copy_ptr` was just written with `size` bytes matching `ty`'s
    // shape, since it is a byte-for-byte copy of `value`.
    unsafe {
        walk_in_place(target, copy_ptr, ty, mode)?;
    }

    Ok(copy_ptr.cast_const())
}

unsafe fn walk_in_place(
    target: &mut DynamicArena,
    v: *mut u8,
    ty: &TypeDescriptor,
    mode: WalkMode,
) -> Result<(), WalkError> {
    match ty.resolved() {
        TypeDescriptor::Bool | TypeDescriptor::Int | TypeDescriptor::Fixed | TypeDescriptor::Char => Ok(()),

        TypeDescriptor::Record { fields, .. } => {
            for field in fields {
                // SAFETY: `field.offset` is within the record `v` points at.
                unsafe { walk_in_place(target, v.add(field.offset), &field.ty, mode)? };
            }
            Ok(())
        }

        TypeDescriptor::Custom { variants, .. } => {
            // SAFETY: `v` points at a tagged union whose first byte is the
            // variant tag, per this runtime's `Custom` layout.
            let tag = unsafe { *v };
            let variant = variants
                .iter()
                .find(|variant| variant.tag == tag)
                .ok_or(WalkError::UnsupportedShape)?;
            // SAFETY: fields are addressed relative to the byte right after
            // the tag.
            let payload = unsafe { v.add(1) };
            for field in &variant.fields {
                // SAFETY: `field.offset` is within the variant payload.
                unsafe { walk_in_place(target, payload.add(field.offset), &field.ty, mode)? };
            }
            Ok(())
        }

        TypeDescriptor::Array { item } | TypeDescriptor::List { item } => {
            // SAFETY: `v` points at a `SwampArray`/`SwampList` header.
            let array = unsafe { &*v.cast::<SwampArray>() };
            let bytes = array.count * array.item_size;
            let new_items = target
                .alloc(array.count, array.item_size, array.item_align.max(1))
                .map_err(|_| WalkError::ArenaExhausted)?;
            // SAFETY: `array.value` is valid for `bytes` readable bytes,
            // `new_items` was just reserved for exactly `bytes` writable
            // bytes, and the two cannot overlap (fresh bump allocation).
            unsafe {
                std::ptr::copy_nonoverlapping(array.value, new_items.as_ptr(), bytes);
            }
            // SAFETY: `v` points at a `SwampArray`/`SwampList` header.
            unsafe {
                (*v.cast::<SwampArray>()).value = new_items.as_ptr();
            }
            let mut p = new_items.as_ptr();
            for _ in 0..array.count {
                // SAFETY: `p` walks exactly `array.count` items, each
                // `array.item_size` bytes, inside the buffer just copied.
                unsafe { walk_in_place(target, p, item, mode)? };
                // SAFETY: advancing within the same buffer, staying in bounds.
                p = unsafe { p.add(array.item_size) };
            }
            Ok(())
        }

        TypeDescriptor::String => {
            // SAFETY: `v` points at a `SwampString`.
            let s = unsafe { &*v.cast::<SwampString>() };
            let with_nul = s.character_count + 1;
            // SAFETY: the runtime always keeps a trailing NUL after a
            // string's characters (see `value::alloc_string`).
            let source = unsafe { std::slice::from_raw_parts(s.characters, with_nul) };
            let new_chars = target.alloc_copy(source, 1).map_err(|_| WalkError::ArenaExhausted)?;
            // SAFETY: `v` points at a `SwampString`.
            unsafe {
                (*v.cast::<SwampString>()).characters = new_chars.as_ptr();
            }
            Ok(())
        }

        TypeDescriptor::Blob => {
            // SAFETY: `v` points at a `SwampBlob`.
            let b = unsafe { &*v.cast::<SwampBlob>() };
            // SAFETY: `b.octets` is valid for `b.octet_count` bytes.
            let source = unsafe { std::slice::from_raw_parts(b.octets, b.octet_count) };
            let new_octets = target.alloc_copy(source, 1).map_err(|_| WalkError::ArenaExhausted)?;
            // SAFETY: `v` points at a `SwampBlob`.
            unsafe {
                (*v.cast::<SwampBlob>()).octets = new_octets.as_ptr();
            }
            Ok(())
        }

        TypeDescriptor::Unmanaged { .. } => {
            // SAFETY: `v` points at a `*mut SwampUnmanaged` (a value of
            // unmanaged type is always represented as a pointer).
            let slot = v.cast::<*mut SwampUnmanaged>();
            // SAFETY: dereferencing a valid pointer slot just copied above.
            let unmanaged = unsafe { *slot };
            // SAFETY: `unmanaged` is a live `SwampUnmanaged` whose vtable
            // entries are valid function pointers supplied by the host.
            let vtable_fn = unsafe { &*unmanaged };
            let f = match mode {
                WalkMode::Clone => vtable_fn.clone,
                WalkMode::Compact => vtable_fn.compact,
            };
            let Some(f) = f else {
                return Err(WalkError::UnsupportedShape);
            };
            // SAFETY: the host's vtable function takes ownership of
            // rewriting `*slot` and may allocate from the host's own
            // memory; this crate only forwards the call.
            let code = unsafe { f(slot, std::ptr::null_mut()) };
            if code != 0 {
                return Err(WalkError::UnsupportedShape);
            }
            Ok(())
        }

        TypeDescriptor::Function { .. } => Err(WalkError::UnsupportedShape),
        TypeDescriptor::ResourceName | TypeDescriptor::Any => Err(WalkError::UnsupportedShape),

        TypeDescriptor::Tuple { fields } => {
            for field in fields {
                // SAFETY: `field.offset` is within the tuple `v` points at.
                unsafe { walk_in_place(target, v.add(field.offset), &field.ty, mode)? };
            }
            Ok(())
        }

        TypeDescriptor::Alias { .. } => unreachable!("resolved() already follows aliases"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typedesc::FieldDescriptor;

    #[test]
    fn blittable_list_of_int_is_blittable() {
        let ty = TypeDescriptor::List {
            item: Box::new(TypeDescriptor::Int),
        };
        assert!(is_blittable_or_ecs(&ty));
    }

    #[test]
    fn resource_name_is_never_blittable() {
        assert!(!is_blittable_or_ecs(&TypeDescriptor::ResourceName));
    }

    #[test]
    fn unmanaged_only_ecsworld_is_blittable() {
        assert!(is_blittable_or_ecs(&TypeDescriptor::Unmanaged {
            name: "EcsWorld".to_string()
        }));
        assert!(!is_blittable_or_ecs(&TypeDescriptor::Unmanaged {
            name: "SomeOtherHandle".to_string()
        }));
    }

    #[test]
    fn compact_record_of_ints_copies_bytes() {
        let mut arena = DynamicArena::new(1024);
        let original: [i32; 2] = [10, 20];
        let ty = TypeDescriptor::Record {
            size: 8,
            fields: vec![
                FieldDescriptor { offset: 0, ty: TypeDescriptor::Int },
                FieldDescriptor { offset: 4, ty: TypeDescriptor::Int },
            ],
        };
        // SAFETY: `original` is exactly 8 bytes, matching `ty`.
        let result = unsafe {
            compact(&mut arena, original.as_ptr().cast::<u8>(), 8, &ty).unwrap()
        };
        // SAFETY: `result` points at an 8-byte record just written by `compact`.
        let copied: &[i32] = unsafe { std::slice::from_raw_parts(result.cast::<i32>(), 2) };
        assert_eq!(copied, &[10, 20]);
        assert_ne!(result, original.as_ptr().cast::<u8>());
    }
}
