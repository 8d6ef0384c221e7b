//! The narrow type-descriptor interface the walker consumes.
//!
//! `swamp-vm` never parses the type-info chunk a package carries; it only
//! accepts a [`TypeDescriptor`] tree built by whoever *does* understand that
//! format. This keeps type-info parsing out of this crate's scope while
//! still letting the structural walker (`walker.rs`) and the blittability
//! check (`is_blittable_or_ecs`) make type-driven decisions.

/// One field of a [`TypeDescriptor::Record`] or a [`TypeDescriptor::Custom`]
/// variant: its byte offset within the enclosing record/variant, and the
/// type of the value stored there.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub offset: usize,
    pub ty: TypeDescriptor,
}

/// One variant of a tagged union (`Custom` in the original runtime's
/// vocabulary — what a Swamp program calls an enum/union type).
#[derive(Debug, Clone)]
pub struct VariantDescriptor {
    pub tag: u8,
    pub fields: Vec<FieldDescriptor>,
}

/// The shape of a value, as needed by the structural walker and the
/// blittability check. This is intentionally a small, closed set: it names
/// every shape `compact`/`clone`/`is_blittable_or_ecs` branch on, nothing
/// more.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Bool,
    Int,
    Fixed,
    Char,
    String,
    Blob,
    ResourceName,
    Any,
    Record {
        size: usize,
        fields: Vec<FieldDescriptor>,
    },
    Custom {
        size: usize,
        variants: Vec<VariantDescriptor>,
    },
    Array {
        item: Box<TypeDescriptor>,
    },
    List {
        item: Box<TypeDescriptor>,
    },
    Tuple {
        fields: Vec<FieldDescriptor>,
    },
    Function {
        params: Vec<TypeDescriptor>,
        return_type: Box<TypeDescriptor>,
    },
    Unmanaged {
        name: String,
    },
    Alias {
        target: Box<TypeDescriptor>,
    },
}

impl TypeDescriptor {
    /// Follows `Alias` links to the underlying shape. Every walker and
    /// blittability match starts here so an alias never has to be handled
    /// as its own case at every call site.
    pub fn resolved(&self) -> &TypeDescriptor {
        let mut current = self;
        while let TypeDescriptor::Alias { target } = current {
            current = target;
        }
        current
    }
}
