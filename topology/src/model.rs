//! Validated topology model types

use crate::TopologyError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A unit name: letters, digits and underscores, starting with a letter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitName(String);

impl UnitName {
    /// Creates a unit name, rejecting names the generator cannot turn into
    /// identifiers.
    pub fn new(name: impl Into<String>) -> Result<Self, TopologyError> {
        let name = name.into();
        if valid_name(&name) {
            Ok(Self(name))
        } else {
            Err(TopologyError::InvalidName { name })
        }
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks the shared naming rule for units, regions and mapping names.
pub(crate) fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A local channel/interrupt id within one unit.
///
/// Channel ends and interrupt bindings share this id namespace. The wire
/// format addresses ids 0..=63; id 63 can never receive notifications
/// because bit 63 of a badge is the call discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(u8);

impl ChannelId {
    /// Largest declarable local id.
    pub const MAX: u8 = 63;

    /// Largest id that can appear in a notification badge.
    pub const MAX_NOTIFIABLE: u8 = 62;

    /// Creates a channel id, or `None` if `raw` exceeds [`ChannelId::MAX`].
    pub const fn new(raw: u8) -> Option<Self> {
        if raw <= Self::MAX {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Returns the raw id value.
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The operations a channel end is entitled to.
///
/// The kind is fixed at generation time; the generated capability type for
/// an end exposes exactly the operations its kind permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    /// The end may send notifications, not protected calls.
    Notify,
    /// The end may make protected calls, not notifications.
    Call,
    /// The end may do both.
    Both,
}

impl CapabilityKind {
    /// Whether the end exposes the notify operation.
    pub fn can_notify(self) -> bool {
        matches!(self, CapabilityKind::Notify | CapabilityKind::Both)
    }

    /// Whether the end exposes the call operation and appears in the call
    /// source union.
    pub fn can_call(self) -> bool {
        matches!(self, CapabilityKind::Call | CapabilityKind::Both)
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityKind::Notify => write!(f, "notify"),
            CapabilityKind::Call => write!(f, "call"),
            CapabilityKind::Both => write!(f, "notify+call"),
        }
    }
}

/// Access permission of a memory mapping, immutable post-generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Read-only mapping.
    Read,
    /// Read-write mapping.
    ReadWrite,
}

impl Permission {
    /// Whether the mapping permits writes.
    pub fn is_writable(self) -> bool {
        matches!(self, Permission::ReadWrite)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Read => write!(f, "read"),
            Permission::ReadWrite => write!(f, "read-write"),
        }
    }
}

/// Cacheability of a memory mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cacheability {
    Cached,
    Uncached,
}

/// One endpoint of a bidirectional channel, owned by a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEnd {
    /// Local id within the owning unit.
    pub local_id: ChannelId,
    /// The unit at the other end of the channel.
    pub peer_unit: UnitName,
    /// The peer's local id for the same channel.
    pub peer_id: ChannelId,
    /// Operations this end is entitled to.
    pub kind: CapabilityKind,
}

/// A hardware interrupt routed to a unit as a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptBinding {
    /// Local id within the owning unit; shares the channel-id namespace.
    pub local_id: ChannelId,
    /// Hardware interrupt line number.
    pub line: u32,
}

/// A virtual-address window backed by a named region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMapping {
    /// Local variable name the generated aggregate uses for this mapping.
    pub name: String,
    /// The declared region backing the window.
    pub region: String,
    /// Virtual base address within the unit.
    pub vaddr: u64,
    /// Window length in bytes (the declared region size).
    pub length: u64,
    /// Access permission, immutable post-generation.
    pub permission: Permission,
    /// Cacheability flag.
    pub cacheability: Cacheability,
}

/// An isolated execution context and everything declared for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Display name.
    pub name: UnitName,
    /// Scheduling priority, 0..=254.
    pub priority: u8,
    /// Channel ends owned by this unit.
    pub channel_ends: Vec<ChannelEnd>,
    /// Interrupt bindings owned by this unit.
    pub interrupts: Vec<InterruptBinding>,
    /// Memory mappings, in declaration order.
    pub mappings: Vec<MemoryMapping>,
}

impl Unit {
    /// Looks up a channel end by local id.
    pub fn channel_end(&self, id: ChannelId) -> Option<&ChannelEnd> {
        self.channel_ends.iter().find(|e| e.local_id == id)
    }

    /// Looks up an interrupt binding by local id.
    pub fn interrupt(&self, id: ChannelId) -> Option<&InterruptBinding> {
        self.interrupts.iter().find(|i| i.local_id == id)
    }

    /// All local ids declared by this unit, channel ends and interrupts
    /// together, in declaration order.
    pub fn local_ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.channel_ends
            .iter()
            .map(|e| e.local_id)
            .chain(self.interrupts.iter().map(|i| i.local_id))
    }
}

/// The validated topology: one [`Unit`] per isolated execution context.
///
/// Constructed through [`Topology::new`] or
/// [`crate::TopologyDoc::into_topology`], both of which enforce the
/// structural invariants; the model is immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    units: Vec<Unit>,
}

impl Topology {
    /// Assembles a topology from already-built units, enforcing the
    /// unit-level invariants: unique unit names, unique local ids per
    /// unit, unique interrupt lines, unique mapping names, priorities in
    /// range.
    pub fn new(units: Vec<Unit>) -> Result<Self, TopologyError> {
        let mut unit_names = HashSet::new();
        let mut irq_lines = HashSet::new();
        for unit in &units {
            if !unit_names.insert(unit.name.clone()) {
                return Err(TopologyError::DuplicateUnit {
                    unit: unit.name.to_string(),
                });
            }
            if unit.priority > 254 {
                return Err(TopologyError::PriorityOutOfRange {
                    unit: unit.name.to_string(),
                    priority: u32::from(unit.priority),
                });
            }
            let mut local_ids = HashSet::new();
            for id in unit.local_ids() {
                if !local_ids.insert(id) {
                    return Err(TopologyError::DuplicateLocalId {
                        unit: unit.name.to_string(),
                        id: u64::from(id.value()),
                    });
                }
            }
            let mut mapping_names = HashSet::new();
            for mapping in &unit.mappings {
                if !mapping_names.insert(mapping.name.as_str()) {
                    return Err(TopologyError::DuplicateMappingName {
                        unit: unit.name.to_string(),
                        name: mapping.name.clone(),
                    });
                }
            }
            for irq in &unit.interrupts {
                if !irq_lines.insert(irq.line) {
                    return Err(TopologyError::DuplicateInterruptLine { line: irq.line });
                }
            }
        }
        Ok(Self { units })
    }

    /// Returns all units.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Looks up a unit by name.
    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.name.as_str() == name)
    }

    /// Names of all units, in declaration order.
    pub fn unit_names(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|u| u.name.as_str())
    }
}
