//! Unit endpoint tables
//!
//! A [`UnitProfile`] is the runtime description of everything one unit
//! declares: its channel ends and their entitlements, its interrupt
//! bindings, and its memory mappings. Generated interface code builds the
//! profile for its unit; the dispatcher uses it to gate capability minting
//! and to size unit memory.

use serde::{Deserialize, Serialize};

/// One channel end and the operations it is entitled to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointProfile {
    /// Local id in 0..=63.
    pub id: u8,
    /// Whether the end may send notifications.
    pub can_notify: bool,
    /// Whether the end may make and receive protected calls.
    pub can_call: bool,
}

/// One interrupt binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrqProfile {
    /// Local id; shares the channel-id namespace.
    pub id: u8,
    /// Hardware interrupt line number.
    pub line: u32,
}

/// One memory mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingProfile {
    /// Local variable name of the mapping.
    pub name: String,
    /// Declared window length in bytes.
    pub length: u64,
    /// Whether the mapping is read-write.
    pub writable: bool,
}

/// Everything one unit declares, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitProfile {
    unit: String,
    ends: Vec<EndpointProfile>,
    irqs: Vec<IrqProfile>,
    mappings: Vec<MappingProfile>,
}

impl UnitProfile {
    /// Creates an empty profile for the named unit.
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            ends: Vec::new(),
            irqs: Vec::new(),
            mappings: Vec::new(),
        }
    }

    /// Adds a notify-only channel end.
    pub fn with_notify_end(mut self, id: u8) -> Self {
        self.ends.push(EndpointProfile {
            id,
            can_notify: true,
            can_call: false,
        });
        self
    }

    /// Adds a call-only channel end.
    pub fn with_call_end(mut self, id: u8) -> Self {
        self.ends.push(EndpointProfile {
            id,
            can_notify: false,
            can_call: true,
        });
        self
    }

    /// Adds a notify+call channel end.
    pub fn with_duplex_end(mut self, id: u8) -> Self {
        self.ends.push(EndpointProfile {
            id,
            can_notify: true,
            can_call: true,
        });
        self
    }

    /// Adds an interrupt binding.
    pub fn with_irq(mut self, id: u8, line: u32) -> Self {
        self.irqs.push(IrqProfile { id, line });
        self
    }

    /// Adds a read-only memory mapping.
    pub fn with_read_mapping(mut self, name: impl Into<String>, length: u64) -> Self {
        self.mappings.push(MappingProfile {
            name: name.into(),
            length,
            writable: false,
        });
        self
    }

    /// Adds a read-write memory mapping.
    pub fn with_write_mapping(mut self, name: impl Into<String>, length: u64) -> Self {
        self.mappings.push(MappingProfile {
            name: name.into(),
            length,
            writable: true,
        });
        self
    }

    /// The unit's name.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Channel ends in declaration order.
    pub fn ends(&self) -> &[EndpointProfile] {
        &self.ends
    }

    /// Interrupt bindings in declaration order.
    pub fn irqs(&self) -> &[IrqProfile] {
        &self.irqs
    }

    /// Memory mappings in declaration order.
    pub fn mappings(&self) -> &[MappingProfile] {
        &self.mappings
    }

    /// All ids that can appear in a notification badge: every channel end
    /// plus every interrupt binding, ascending.
    pub fn notification_ids(&self) -> Vec<u8> {
        let mut ids: Vec<u8> = self
            .ends
            .iter()
            .map(|e| e.id)
            .chain(self.irqs.iter().map(|i| i.id))
            .collect();
        ids.sort_unstable();
        ids
    }

    /// All ids that can appear as a call event, ascending.
    pub fn call_ids(&self) -> Vec<u8> {
        let mut ids: Vec<u8> = self
            .ends
            .iter()
            .filter(|e| e.can_call)
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Whether the unit may send notifications on this id.
    pub fn allows_notify(&self, id: u8) -> bool {
        self.ends.iter().any(|e| e.id == id && e.can_notify)
    }

    /// Whether the unit may make protected calls on this id.
    pub fn allows_call(&self, id: u8) -> bool {
        self.ends.iter().any(|e| e.id == id && e.can_call)
    }

    /// Looks up an interrupt binding by local id.
    pub fn irq(&self, id: u8) -> Option<&IrqProfile> {
        self.irqs.iter().find(|i| i.id == id)
    }

    /// Looks up a mapping by name.
    pub fn mapping(&self, name: &str) -> Option<&MappingProfile> {
        self.mappings.iter().find(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_profile() -> UnitProfile {
        UnitProfile::new("auth")
            .with_irq(0, 212)
            .with_duplex_end(1)
            .with_call_end(2)
            .with_write_mapping("mailbox", 4096)
            .with_read_mapping("config", 256)
    }

    #[test]
    fn test_notification_ids_cover_all_endpoints() {
        assert_eq!(auth_profile().notification_ids(), vec![0, 1, 2]);
    }

    #[test]
    fn test_call_ids_filtered_by_entitlement() {
        assert_eq!(auth_profile().call_ids(), vec![1, 2]);
    }

    #[test]
    fn test_entitlement_checks() {
        let profile = auth_profile();
        assert!(profile.allows_notify(1));
        assert!(!profile.allows_notify(2));
        assert!(profile.allows_call(2));
        assert!(!profile.allows_call(0));
        assert_eq!(profile.irq(0).map(|i| i.line), Some(212));
        assert!(profile.irq(1).is_none());
    }

    #[test]
    fn test_profile_serde_round_trip() {
        let profile = auth_profile();
        let text = serde_json::to_string(&profile).unwrap();
        assert!(text.contains("\"mailbox\""));
        let back: UnitProfile = serde_json::from_str(&text).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_mapping_lookup() {
        let profile = auth_profile();
        let mailbox = profile.mapping("mailbox").unwrap();
        assert!(mailbox.writable);
        assert_eq!(mailbox.length, 4096);
        assert!(!profile.mapping("config").unwrap().writable);
        assert!(profile.mapping("missing").is_none());
    }
}
