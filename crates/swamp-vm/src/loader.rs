//! Ties [`raff`](crate::raff), [`ledger`](crate::ledger), and
//! [`fixup`](crate::fixup) together into the one host-facing entry point:
//! [`Package::load`].
//!
//! Mirrors `swampUnpackSwampOctetStream`'s chunk order exactly: header, then
//! the outer package chunk wrapping type-info, dynamic memory, and the
//! ledger, in that fixed sequence.

use crate::error::{Error, LinkError, Result};
use crate::fixup::{fixup_ledger, ExternalResolver};
use crate::ledger::Ledger;
use crate::raff::{OctetStream, DYNAMIC_MEMORY, LEDGER, OUTER_PACKAGE, TYPE_INFO};
use crate::value::{FuncRef, SwampFunc};
use fxhash::FxHashMap;
use swamp_log::info;
use swamp_mem::StaticMemory;

/// The type-info chunk's raw bytes, opaque to this crate. Parsing it into a
/// [`crate::typedesc::TypeDescriptor`] tree is the host's job — `swamp-vm`
/// only carries the bytes far enough for the host to do that.
pub struct TypeInfoChunk(Vec<u8>);

impl TypeInfoChunk {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A fully loaded and fixed-up Swamp package: its static (constant) memory,
/// its type-info chunk, and a name-indexed table of every function it
/// defines.
pub struct Package {
    static_memory: StaticMemory,
    type_info: TypeInfoChunk,
    functions: FxHashMap<String, *const SwampFunc>,
}

// SAFETY: `Package` owns its `StaticMemory` outright; every pointer in
// `functions` addresses bytes inside that owned buffer, so the pointers
// stay valid for exactly as long as the `Package` that produced them does,
// regardless of which thread holds it.
unsafe impl Send for Package {}

impl Package {
    /// Parses and fixes up a RAFF-encoded package image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if the container is malformed,
    /// [`Error::Link`] if the ledger names an unknown entry kind or any
    /// external function the resolver can't bind (matching the
    /// "unresolved external prevents any run" scenario: no `Package` is
    /// produced at all in that case).
    pub fn load(bytes: &[u8], resolver: &mut dyn ExternalResolver) -> Result<Package> {
        let mut stream = OctetStream::new(bytes);
        stream.read_header()?;

        let _outer_len = stream.read_chunk_header(OUTER_PACKAGE, "package")?;

        let type_info_len = stream.read_chunk_header(TYPE_INFO, "type info")?;
        let type_info = TypeInfoChunk(stream.read_chunk_body(type_info_len)?.to_vec());

        let dynamic_memory_len = stream.read_chunk_header(DYNAMIC_MEMORY, "dynamic memory")?;
        let mut static_memory =
            StaticMemory::from_bytes(stream.read_chunk_body(dynamic_memory_len)?.to_vec());

        let ledger_len = stream.read_chunk_header(LEDGER, "ledger")?;
        let ledger = Ledger::parse(stream.read_chunk_body(ledger_len)?);

        let outcome = fixup_ledger(&mut static_memory, &ledger, resolver)
            .map_err(Error::Link)?;

        if !outcome.unresolved.is_empty() {
            return Err(Error::Link(LinkError::UnresolvedExternalFunctions(outcome.unresolved)));
        }

        info!(
            "loaded package: {} function(s), {} byte(s) of static memory",
            outcome.functions.len(),
            static_memory.len()
        );

        let functions = outcome.functions.into_iter().collect();

        Ok(Package {
            static_memory,
            type_info,
            functions,
        })
    }

    /// The package's static (constant) memory region.
    #[must_use]
    pub fn static_memory(&self) -> &StaticMemory {
        &self.static_memory
    }

    /// The package's raw type-info chunk, for a host that wants to parse it
    /// into a [`crate::typedesc::TypeDescriptor`] tree.
    #[must_use]
    pub fn type_info(&self) -> &TypeInfoChunk {
        &self.type_info
    }

    /// Looks up a function by its debug name.
    #[must_use]
    pub fn find_function(&self, name: &str) -> Option<FuncRef<'_>> {
        let ptr = *self.functions.get(name)?;
        // SAFETY: every pointer in `functions` was fixed up by
        // `fixup_ledger` to address a live `SwampFunc` inside
        // `self.static_memory`, which outlives this borrow.
        Some(FuncRef(unsafe { &*ptr }))
    }

    /// The package's designated entry point: the function named `main`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NoEntryFunction`] if the package defines no
    /// function named `main`.
    pub fn entry_function(&self) -> std::result::Result<FuncRef<'_>, LinkError> {
        self.find_function("main").ok_or(LinkError::NoEntryFunction)
    }
}
