//! Error taxonomy for the package loader, fixup pass, walker, and interpreter.
//!
//! Each stage gets its own enum so a caller can match on exactly the family
//! of failure it cares about; [`Error`] composes all four for callers that
//! just want one type to propagate with `?`.

use std::fmt;

/// Failures while reading a RAFF package image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The outer container's magic bytes didn't match.
    BadMagic,
    /// A chunk's icon/name tag didn't match what was expected at that
    /// position in the container.
    BadChunkTag {
        /// What the loader expected to find.
        expected: &'static str,
    },
    /// A chunk header or body ran past the end of the input.
    Truncated,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::BadMagic => write!(f, "not a RAFF package: bad magic"),
            LoadError::BadChunkTag { expected } => {
                write!(f, "malformed package: expected {expected} chunk")
            }
            LoadError::Truncated => write!(f, "malformed package: truncated"),
        }
    }
}

impl std::error::Error for LoadError {}

/// Failures while fixing up a loaded package's ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// A ledger entry named a kind the fixup pass doesn't recognize.
    UnknownLedgerKind(u32),
    /// One or more external functions could not be resolved by the host.
    UnresolvedExternalFunctions(Vec<String>),
    /// No function named `main` was found, so there is no entry point.
    NoEntryFunction,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::UnknownLedgerKind(kind) => {
                write!(f, "unknown ledger entry kind {kind}")
            }
            LinkError::UnresolvedExternalFunctions(names) => {
                write!(f, "unresolved external functions: {}", names.join(", "))
            }
            LinkError::NoEntryFunction => write!(f, "package has no \"main\" function"),
        }
    }
}

impl std::error::Error for LinkError {}

/// Failures raised while the interpreter is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The call stack grew past its configured maximum depth.
    StackOverflow,
    /// An opcode byte didn't decode to a known instruction.
    IllegalOpcode(u8),
    /// Division or modulo by zero.
    DivideByZero,
    /// A `case`/`enum_case` dispatch found no matching arm and no wildcard.
    NoMatchingCase,
    /// A memory access (stack, dynamic arena, or static memory) fell outside
    /// its region's bounds.
    OutOfBounds,
    /// The arena backing the current invocation was exhausted.
    ArenaExhausted,
    /// Attempted to call through a function reference that wasn't callable.
    NotCallable,
    /// The caller's parameter block size didn't match the callee's
    /// declared parameter count.
    ParameterCountMismatch,
    /// The caller's result slot size didn't match the callee's declared
    /// return size.
    ReturnSizeMismatch,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::StackOverflow => write!(f, "call stack overflow"),
            RuntimeError::IllegalOpcode(b) => write!(f, "illegal opcode 0x{b:02x}"),
            RuntimeError::DivideByZero => write!(f, "divide by zero"),
            RuntimeError::NoMatchingCase => write!(f, "no matching case and no wildcard"),
            RuntimeError::OutOfBounds => write!(f, "memory access out of bounds"),
            RuntimeError::ArenaExhausted => write!(f, "dynamic arena exhausted"),
            RuntimeError::NotCallable => write!(f, "value is not callable"),
            RuntimeError::ParameterCountMismatch => write!(f, "parameter count mismatch"),
            RuntimeError::ReturnSizeMismatch => write!(f, "return size mismatch"),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Lets interpreter code propagate a `swamp_mem` arena/bounds failure with
/// `?` by folding it into the two `RuntimeError` variants spec.md's fault
/// list actually distinguishes for memory problems.
impl From<swamp_mem::Error> for RuntimeError {
    fn from(e: swamp_mem::Error) -> Self {
        match e {
            swamp_mem::Error::ArenaExhausted { .. } | swamp_mem::Error::OutOfMemory => {
                RuntimeError::ArenaExhausted
            }
            swamp_mem::Error::OutOfBounds { .. } | swamp_mem::Error::InvalidAlignment { .. } => {
                RuntimeError::OutOfBounds
            }
        }
    }
}

/// Failures raised by the structural walker (`clone`/`compact`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkError {
    /// The target arena ran out of space mid-walk.
    ArenaExhausted,
    /// A type descriptor referenced a shape the walker doesn't know how to
    /// traverse (should not happen for well-formed descriptors).
    UnsupportedShape,
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkError::ArenaExhausted => write!(f, "target arena exhausted during walk"),
            WalkError::UnsupportedShape => write!(f, "unsupported type shape"),
        }
    }
}

impl std::error::Error for WalkError {}

/// The union of every failure family this crate can raise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Load(LoadError),
    Link(LinkError),
    Runtime(RuntimeError),
    Walk(WalkError),
    Mem(swamp_mem::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Load(e) => write!(f, "{e}"),
            Error::Link(e) => write!(f, "{e}"),
            Error::Runtime(e) => write!(f, "{e}"),
            Error::Walk(e) => write!(f, "{e}"),
            Error::Mem(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<LoadError> for Error {
    fn from(e: LoadError) -> Self {
        Error::Load(e)
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Error::Link(e)
    }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Self {
        Error::Runtime(e)
    }
}

impl From<WalkError> for Error {
    fn from(e: WalkError) -> Self {
        Error::Walk(e)
    }
}

impl From<swamp_mem::Error> for Error {
    fn from(e: swamp_mem::Error) -> Self {
        Error::Mem(e)
    }
}

/// Maps an [`Error`] to the stable negative-code convention the host API
/// uses at its boundary; `0` always means success and is never produced by
/// this conversion.
impl From<&Error> for i32 {
    fn from(err: &Error) -> i32 {
        match err {
            Error::Load(_) => -1,
            Error::Link(LinkError::UnresolvedExternalFunctions(_)) => -2,
            Error::Link(LinkError::NoEntryFunction) => -3,
            Error::Link(LinkError::UnknownLedgerKind(_)) => -4,
            Error::Runtime(RuntimeError::StackOverflow) => -10,
            Error::Runtime(RuntimeError::IllegalOpcode(_)) => -11,
            Error::Runtime(RuntimeError::DivideByZero) => -12,
            Error::Runtime(RuntimeError::NoMatchingCase) => -13,
            Error::Runtime(RuntimeError::OutOfBounds) => -14,
            Error::Runtime(RuntimeError::ArenaExhausted) => -15,
            Error::Runtime(RuntimeError::NotCallable) => -16,
            Error::Runtime(RuntimeError::ParameterCountMismatch) => -17,
            Error::Runtime(RuntimeError::ReturnSizeMismatch) => -18,
            Error::Walk(_) => -20,
            Error::Mem(_) => -30,
        }
    }
}

/// Result type used throughout `swamp-vm`.
pub type Result<T> = std::result::Result<T, Error>;
