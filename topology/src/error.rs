//! Topology validation errors

use thiserror::Error;

/// Errors detected while validating a topology description.
///
/// All of these abort generation atomically: no output is produced for a
/// topology that raises any of them. Diagnostics name the offending unit
/// and id so the description can be fixed directly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    /// A unit or region name contains characters outside the allowed set
    /// (letters, digits, underscores; must start with a letter).
    #[error("invalid name '{name}': names are letters, digits and underscores, starting with a letter")]
    InvalidName { name: String },

    /// Two units share a name.
    #[error("unit '{unit}' is declared more than once")]
    DuplicateUnit { unit: String },

    /// Two regions share a name.
    #[error("memory region '{region}' is declared more than once")]
    DuplicateRegion { region: String },

    /// Two channel ends or interrupt bindings of the same unit share a
    /// local id. Channel and interrupt ids live in one namespace.
    #[error("unit '{unit}' declares local id {id} more than once")]
    DuplicateLocalId { unit: String, id: u64 },

    /// A local id exceeds the addressable range of the wire format.
    #[error("unit '{unit}' declares local id {id}, outside the supported range 0..=63")]
    LocalIdOutOfRange { unit: String, id: u64 },

    /// A notification-capable endpoint (channel end or interrupt binding)
    /// uses id 63, which the wire format reserves for the call
    /// discriminator bit.
    #[error(
        "unit '{unit}' declares notification-capable id {id}; \
         ids above 62 cannot appear in a notification badge"
    )]
    NotificationIdReservesCallBit { unit: String, id: u64 },

    /// A channel does not have exactly two ends.
    #[error("channel #{index} has {count} ends; channels connect exactly two units")]
    BadChannelEndCount { index: usize, count: usize },

    /// A channel end names a unit that is not declared.
    #[error("channel #{index} references undeclared unit '{unit}'")]
    UnknownUnit { index: usize, unit: String },

    /// A memory mapping references a region that is not declared.
    #[error("unit '{unit}' maps undeclared region '{region}'")]
    UnknownRegion { unit: String, region: String },

    /// A unit's scheduling priority is outside the supported range.
    #[error("unit '{unit}' has priority {priority}, outside the supported range 0..=254")]
    PriorityOutOfRange { unit: String, priority: u32 },

    /// The same hardware interrupt line is bound more than once.
    #[error("interrupt line {line} is bound more than once")]
    DuplicateInterruptLine { line: u32 },

    /// Two mappings of the same unit share a local variable name.
    #[error("unit '{unit}' declares mapping name '{name}' more than once")]
    DuplicateMappingName { unit: String, name: String },
}
