//! Topology description documents
//!
//! The serde-facing document types mirror the user-written JSON topology
//! description. A document is cheap to deserialize and may be arbitrarily
//! malformed; [`TopologyDoc::validate`] reports every structural violation
//! and [`TopologyDoc::into_topology`] produces the validated model only
//! when there are none.

use crate::error::TopologyError;
use crate::model::{
    valid_name, Cacheability, CapabilityKind, ChannelEnd, ChannelId, InterruptBinding,
    MemoryMapping, Permission, Topology, Unit, UnitName,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A named backing region with a declared size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDoc {
    pub name: String,
    pub size: u64,
}

/// A memory mapping declaration within a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDoc {
    /// Region reference; must name a declared region.
    pub region: String,
    /// Target local variable name.
    pub name: String,
    /// Virtual base address.
    pub vaddr: u64,
    /// Access permission; defaults to read-write.
    #[serde(default = "default_permission")]
    pub permission: Permission,
    /// Cacheability flag; defaults to cached.
    #[serde(default = "default_cached")]
    pub cached: bool,
}

fn default_permission() -> Permission {
    Permission::ReadWrite
}

fn default_cached() -> bool {
    true
}

/// An interrupt binding declaration within a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrqDoc {
    /// Hardware interrupt line number.
    pub line: u32,
    /// Local id; shares the channel-id namespace.
    pub id: u64,
}

/// A unit declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDoc {
    pub name: String,
    /// Scheduling priority; defaults to 0.
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub maps: Vec<MapDoc>,
    #[serde(default)]
    pub irqs: Vec<IrqDoc>,
}

/// One end of a channel declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndDoc {
    /// Owning unit name.
    pub unit: String,
    /// Local id within the owning unit.
    pub id: u64,
    /// Operations the end is entitled to; defaults to notify-only.
    #[serde(default = "default_kind")]
    pub kind: CapabilityKind,
}

fn default_kind() -> CapabilityKind {
    CapabilityKind::Notify
}

/// A channel declaration: exactly two ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDoc {
    pub ends: Vec<EndDoc>,
}

/// The whole topology description document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyDoc {
    #[serde(default)]
    pub regions: Vec<RegionDoc>,
    pub units: Vec<UnitDoc>,
    #[serde(default)]
    pub channels: Vec<ChannelDoc>,
}

impl TopologyDoc {
    /// Checks every structural invariant and returns all violations.
    ///
    /// An empty result means [`TopologyDoc::into_topology`] will succeed.
    pub fn validate(&self) -> Vec<TopologyError> {
        let mut errors = Vec::new();

        let mut region_names = HashSet::new();
        for region in &self.regions {
            if !valid_name(&region.name) {
                errors.push(TopologyError::InvalidName {
                    name: region.name.clone(),
                });
            }
            if !region_names.insert(region.name.as_str()) {
                errors.push(TopologyError::DuplicateRegion {
                    region: region.name.clone(),
                });
            }
        }

        let mut unit_names = HashSet::new();
        let mut irq_lines = HashSet::new();
        for unit in &self.units {
            if !valid_name(&unit.name) {
                errors.push(TopologyError::InvalidName {
                    name: unit.name.clone(),
                });
            }
            if !unit_names.insert(unit.name.as_str()) {
                errors.push(TopologyError::DuplicateUnit {
                    unit: unit.name.clone(),
                });
            }
            if unit.priority > 254 {
                errors.push(TopologyError::PriorityOutOfRange {
                    unit: unit.name.clone(),
                    priority: unit.priority,
                });
            }
            let mut mapping_names = HashSet::new();
            for map in &unit.maps {
                if !valid_name(&map.name) {
                    errors.push(TopologyError::InvalidName {
                        name: map.name.clone(),
                    });
                }
                if !mapping_names.insert(map.name.as_str()) {
                    errors.push(TopologyError::DuplicateMappingName {
                        unit: unit.name.clone(),
                        name: map.name.clone(),
                    });
                }
                if !region_names.contains(map.region.as_str()) {
                    errors.push(TopologyError::UnknownRegion {
                        unit: unit.name.clone(),
                        region: map.region.clone(),
                    });
                }
            }
            for irq in &unit.irqs {
                if !irq_lines.insert(irq.line) {
                    errors.push(TopologyError::DuplicateInterruptLine { line: irq.line });
                }
            }
        }

        for (index, channel) in self.channels.iter().enumerate() {
            if channel.ends.len() != 2 {
                errors.push(TopologyError::BadChannelEndCount {
                    index,
                    count: channel.ends.len(),
                });
            }
            for end in &channel.ends {
                if !unit_names.contains(end.unit.as_str()) {
                    errors.push(TopologyError::UnknownUnit {
                        index,
                        unit: end.unit.clone(),
                    });
                }
            }
        }

        // Local ids are checked across both namespaces: a unit's interrupt
        // bindings and its channel ends from every channel declaration.
        let mut ids_by_unit: HashMap<&str, Vec<u64>> = HashMap::new();
        for unit in &self.units {
            let ids = ids_by_unit.entry(unit.name.as_str()).or_default();
            for irq in &unit.irqs {
                ids.push(irq.id);
            }
        }
        for channel in &self.channels {
            for end in &channel.ends {
                if let Some(ids) = ids_by_unit.get_mut(end.unit.as_str()) {
                    ids.push(end.id);
                }
            }
        }
        for unit in &self.units {
            let Some(ids) = ids_by_unit.get(unit.name.as_str()) else {
                continue;
            };
            let mut seen = HashSet::new();
            for &id in ids {
                if id > u64::from(ChannelId::MAX) {
                    errors.push(TopologyError::LocalIdOutOfRange {
                        unit: unit.name.clone(),
                        id,
                    });
                } else if !seen.insert(id) {
                    errors.push(TopologyError::DuplicateLocalId {
                        unit: unit.name.clone(),
                        id,
                    });
                }
            }
        }

        errors
    }

    /// Validates the document and assembles the model.
    ///
    /// Returns the first violation if any exist; the conversion is atomic
    /// and produces no partial model.
    pub fn into_topology(self) -> Result<Topology, TopologyError> {
        let mut errors = self.validate();
        if !errors.is_empty() {
            return Err(errors.remove(0));
        }
        self.assemble()
    }

    fn assemble(self) -> Result<Topology, TopologyError> {
        let region_sizes: HashMap<&str, u64> = self
            .regions
            .iter()
            .map(|r| (r.name.as_str(), r.size))
            .collect();

        let mut units = Vec::with_capacity(self.units.len());
        for unit in &self.units {
            let mut mappings = Vec::with_capacity(unit.maps.len());
            for map in &unit.maps {
                let length =
                    region_sizes
                        .get(map.region.as_str())
                        .copied()
                        .ok_or_else(|| TopologyError::UnknownRegion {
                            unit: unit.name.clone(),
                            region: map.region.clone(),
                        })?;
                mappings.push(MemoryMapping {
                    name: map.name.clone(),
                    region: map.region.clone(),
                    vaddr: map.vaddr,
                    length,
                    permission: map.permission,
                    cacheability: if map.cached {
                        Cacheability::Cached
                    } else {
                        Cacheability::Uncached
                    },
                });
            }

            let mut interrupts = Vec::with_capacity(unit.irqs.len());
            for irq in &unit.irqs {
                interrupts.push(InterruptBinding {
                    local_id: checked_id(&unit.name, irq.id)?,
                    line: irq.line,
                });
            }

            let mut channel_ends = Vec::new();
            for (index, channel) in self.channels.iter().enumerate() {
                if channel.ends.len() != 2 {
                    return Err(TopologyError::BadChannelEndCount {
                        index,
                        count: channel.ends.len(),
                    });
                }
                for (this, peer) in [
                    (&channel.ends[0], &channel.ends[1]),
                    (&channel.ends[1], &channel.ends[0]),
                ] {
                    if this.unit == unit.name {
                        channel_ends.push(ChannelEnd {
                            local_id: checked_id(&unit.name, this.id)?,
                            peer_unit: UnitName::new(peer.unit.clone())?,
                            peer_id: checked_id(&peer.unit, peer.id)?,
                            kind: this.kind,
                        });
                    }
                }
            }

            units.push(Unit {
                name: UnitName::new(unit.name.clone())?,
                priority: u8::try_from(unit.priority).map_err(|_| {
                    TopologyError::PriorityOutOfRange {
                        unit: unit.name.clone(),
                        priority: unit.priority,
                    }
                })?,
                channel_ends,
                interrupts,
                mappings,
            });
        }

        Topology::new(units)
    }
}

fn checked_id(unit: &str, id: u64) -> Result<ChannelId, TopologyError> {
    u8::try_from(id)
        .ok()
        .and_then(ChannelId::new)
        .ok_or_else(|| TopologyError::LocalIdOutOfRange {
            unit: unit.to_string(),
            id,
        })
}
