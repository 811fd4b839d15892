//! Runtime fault types

use thiserror::Error;

/// Errors surfaced by the platform primitives.
///
/// The platform is treated as an already-correct foreign interface; these
/// errors exist so simulated platforms can signal conditions like script
/// exhaustion, and so misuse of the register file is reportable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlatformError {
    /// A receive had nothing to deliver. Real platforms block instead;
    /// simulated platforms report this when their event script runs out.
    #[error("receive would block: no further events")]
    WouldBlock,

    /// A primitive was invoked with a channel the platform does not know.
    #[error("invalid channel {0}")]
    InvalidChannel(u8),

    /// A message register index outside the register file.
    #[error("message register index {0} out of range")]
    InvalidRegister(u8),
}

/// Violations of the single-use capability discipline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DisciplineError {
    /// A capability was discharged twice. Unreachable through the typed
    /// capability API (consuming operations move the value); reachable
    /// only through the ledger itself.
    #[error("capability '{resource}' was already discharged")]
    AlreadyDischarged { resource: String },

    /// A mint id the current iteration's ledger never issued, e.g. a
    /// capability smuggled across iterations.
    #[error("unknown capability mint")]
    UnknownMint,

    /// A handler returned while capabilities were still live.
    #[error("handler leaked capabilities: {resources:?}")]
    Leaked { resources: Vec<String> },
}

/// Rejected capability mint requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MintError {
    /// The unit declares no notify-capable end with this id.
    #[error("unit '{unit}' declares no notify-capable channel {channel}")]
    NotifyNotDeclared { unit: String, channel: u8 },

    /// The unit declares no call-capable end with this id.
    #[error("unit '{unit}' declares no call-capable channel {channel}")]
    CallNotDeclared { unit: String, channel: u8 },

    /// The unit declares no interrupt binding with this id.
    #[error("unit '{unit}' declares no interrupt on channel {channel}")]
    IrqNotDeclared { unit: String, channel: u8 },

    /// The user capability was already taken this invocation.
    #[error("user capability already taken this invocation")]
    UserAlreadyTaken,

    /// The memory aggregate was already taken this invocation.
    #[error("memory capabilities already taken this invocation")]
    MemoryAlreadyTaken,

    /// The presented user capability is not live in this invocation,
    /// either already surrendered or minted in an earlier iteration.
    #[error("user capability is not live in this invocation")]
    UserNotLive,

    /// No mapping with the requested name.
    #[error("no mapping named '{name}'")]
    UnknownMapping { name: String },

    /// The mapping exists but with the other permission.
    #[error("mapping '{name}' does not provide a {requested} capability")]
    MappingPermission { name: String, requested: &'static str },
}

/// Resource-bounds faults on memory views.
///
/// Out-of-bounds access is reported, never silently clamped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryFault {
    /// An access beyond the declared length of the mapping.
    #[error(
        "out-of-bounds access on mapping '{mapping}': \
         offset {offset} + len {len} exceeds declared length {length}"
    )]
    OutOfBounds {
        mapping: String,
        offset: u64,
        len: u64,
        length: u64,
    },

    /// A backing-store operation named an unknown mapping.
    #[error("no mapping named '{mapping}'")]
    UnknownMapping { mapping: String },
}

/// A unit-runtime failure that terminates the dispatch loop.
///
/// The unmatched-event variant is the structured rendition of the
/// fail-safe disposition for events with no declared endpoint: handlers
/// that match the catch-all variant may return it, or act on the raw id
/// instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitFault {
    #[error("platform: {0}")]
    Platform(#[from] PlatformError),

    #[error("capability discipline: {0}")]
    Discipline(#[from] DisciplineError),

    #[error("mint rejected: {0}")]
    Mint(#[from] MintError),

    #[error("memory: {0}")]
    Memory(#[from] MemoryFault),

    /// An event arrived for an id with no declared endpoint.
    #[error("unexpected event with no declared endpoint: raw id {raw}")]
    UnexpectedEvent { raw: u64 },
}
