//! End-to-end scenario for package loading: an external function the
//! resolver cannot bind must fail the whole load with a link error, and no
//! `run` is ever attempted.

use swamp_vm::ledger::KIND_EXTERNAL_FUNC;
use swamp_vm::raff::{ChunkTag, DYNAMIC_MEMORY, HEADER_LEN, LEDGER, MAGIC, OUTER_PACKAGE, TYPE_INFO};
use swamp_vm::value::{ExternFn, SwampFunction, SwampFunctionExternal, SwampFunctionType};
use swamp_vm::{Error, ExternalResolver, LinkError, Package};

struct NeverResolves;

impl ExternalResolver for NeverResolves {
    fn resolve(&mut self, _fully_qualified_name: &str) -> Option<ExternFn> {
        None
    }
}

fn chunk(tag: ChunkTag, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&tag.icon);
    out.extend_from_slice(&tag.name);
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    out
}

/// Builds a minimal static-memory image holding one `SwampFunctionExternal`
/// record whose name points at `name`, plus the ledger entry that tells the
/// fixup pass where to find it.
fn build_unresolved_external_image(name: &[u8]) -> Vec<u8> {
    let mut static_bytes = Vec::new();
    static_bytes.extend_from_slice(name); // file offset 0

    let align = std::mem::align_of::<SwampFunctionExternal>();
    while static_bytes.len() % align != 0 {
        static_bytes.push(0);
    }
    let struct_offset = static_bytes.len() as u32;

    let record = SwampFunctionExternal {
        func: SwampFunction {
            kind: SwampFunctionType::External,
        },
        parameter_count: 0,
        return_octet_size: 0,
        fully_qualified_name: 0usize as *const u8, // file offset 0, same convention fixup expects
        fully_qualified_name_len: name.len(),
        function: None,
    };
    // SAFETY: `record` is a plain `#[repr(C)]` value read only to copy its bytes.
    let record_bytes = unsafe {
        std::slice::from_raw_parts(
            (&record as *const SwampFunctionExternal).cast::<u8>(),
            std::mem::size_of::<SwampFunctionExternal>(),
        )
    };
    static_bytes.extend_from_slice(record_bytes);

    let mut ledger_bytes = Vec::new();
    ledger_bytes.extend_from_slice(&KIND_EXTERNAL_FUNC.to_le_bytes());
    ledger_bytes.extend_from_slice(&struct_offset.to_le_bytes());
    ledger_bytes.extend_from_slice(&0u32.to_le_bytes()); // terminator kind
    ledger_bytes.extend_from_slice(&0u32.to_le_bytes());

    let mut image = Vec::new();
    image.extend_from_slice(&MAGIC);
    image.extend_from_slice(&[1, 0, 0, 0, 0]);
    debug_assert_eq!(image.len(), HEADER_LEN);
    image.extend_from_slice(&chunk(OUTER_PACKAGE, &[]));
    image.extend_from_slice(&chunk(TYPE_INFO, &[]));
    image.extend_from_slice(&chunk(DYNAMIC_MEMORY, &static_bytes));
    image.extend_from_slice(&chunk(LEDGER, &ledger_bytes));
    image
}

#[test]
fn unresolved_external_fails_the_whole_load() {
    let name = b"external:nonexistent";
    let image = build_unresolved_external_image(name);

    let mut resolver = NeverResolves;
    let err = Package::load(&image, &mut resolver).expect_err("resolver never binds this name");

    match &err {
        Error::Link(LinkError::UnresolvedExternalFunctions(names)) => {
            assert_eq!(names, &[String::from_utf8(name.to_vec()).unwrap()]);
        }
        other => panic!("expected an unresolved-external link error, got {other:?}"),
    }
    assert_eq!(i32::from(&err), -2);
}
