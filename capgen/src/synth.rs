//! Capability API synthesis
//!
//! Turns one unit's slice of a validated [`Topology`] into a [`UnitApi`]:
//! the discriminated unions over its event sources, the capability specs
//! for its channel ends, interrupts and mappings, and the endpoint profile
//! the generated code hands to the dispatcher. Synthesis is atomic: any
//! invariant failure yields an error and no partial model.

use std::collections::HashSet;

use topology::{ChannelId, Topology, TopologyError, Unit};
use unit_runtime::UnitProfile;

use crate::error::GenerateError;

/// Where a union variant comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantOrigin {
    /// A channel end toward the named peer unit.
    Channel { peer: String },
    /// An interrupt binding on the given hardware line.
    Irq { line: u32 },
}

/// One variant of a synthesized discriminated union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Rust identifier of the variant.
    pub ident: String,
    /// The local id the variant discriminates.
    pub id: u8,
    pub origin: VariantOrigin,
}

/// One channel end and the capability operations its kind grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndSpec {
    pub id: u8,
    pub peer: String,
    pub can_notify: bool,
    pub can_call: bool,
}

/// One interrupt binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrqSpec {
    pub id: u8,
    pub line: u32,
}

/// One memory mapping and its capability flavor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingSpec {
    pub name: String,
    pub vaddr: u64,
    pub length: u64,
    pub writable: bool,
}

/// The synthesized capability API for one unit.
///
/// Variant lists are in ascending local-id order; the emitted unions
/// append their catch-all variant after these. Mapping specs keep
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitApi {
    unit: String,
    notification_variants: Vec<Variant>,
    call_variants: Vec<Variant>,
    ends: Vec<EndSpec>,
    irqs: Vec<IrqSpec>,
    mappings: Vec<MappingSpec>,
}

impl UnitApi {
    /// The unit this API was synthesized for.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Notification union variants, ascending by id, catch-all excluded.
    pub fn notification_variants(&self) -> &[Variant] {
        &self.notification_variants
    }

    /// Call union variants, ascending by id, catch-all excluded.
    pub fn call_variants(&self) -> &[Variant] {
        &self.call_variants
    }

    /// Channel-end capability specs, ascending by id.
    pub fn ends(&self) -> &[EndSpec] {
        &self.ends
    }

    /// Interrupt capability specs, ascending by id.
    pub fn irqs(&self) -> &[IrqSpec] {
        &self.irqs
    }

    /// Memory capability specs, in declaration order.
    pub fn mappings(&self) -> &[MappingSpec] {
        &self.mappings
    }

    /// The runtime endpoint table the generated `profile()` fn builds.
    pub fn profile(&self) -> UnitProfile {
        let mut profile = UnitProfile::new(&self.unit);
        for end in &self.ends {
            profile = match (end.can_notify, end.can_call) {
                (true, true) => profile.with_duplex_end(end.id),
                (true, false) => profile.with_notify_end(end.id),
                (false, true) => profile.with_call_end(end.id),
                (false, false) => profile,
            };
        }
        for irq in &self.irqs {
            profile = profile.with_irq(irq.id, irq.line);
        }
        for mapping in &self.mappings {
            profile = if mapping.writable {
                profile.with_write_mapping(&mapping.name, mapping.length)
            } else {
                profile.with_read_mapping(&mapping.name, mapping.length)
            };
        }
        profile
    }
}

/// Synthesizes the capability API for the named unit.
///
/// Unit-level invariants are re-checked here so the synthesized model is
/// sound even when a [`Topology`] was assembled by hand rather than
/// through document validation.
pub fn synthesize(topology: &Topology, unit_name: &str) -> Result<UnitApi, GenerateError> {
    let unit = match topology.unit(unit_name) {
        Some(unit) => unit,
        None => {
            return Err(GenerateError::UnknownUnit {
                name: unit_name.to_string(),
                suggestions: suggest_units(topology, unit_name),
            })
        }
    };
    check_unit(unit)?;

    let mut notification_variants = Vec::new();
    let mut call_variants = Vec::new();
    let mut ends = Vec::new();

    for end in &unit.channel_ends {
        let spec = EndSpec {
            id: end.local_id.value(),
            peer: end.peer_unit.as_str().to_string(),
            can_notify: end.kind.can_notify(),
            can_call: end.kind.can_call(),
        };
        let variant = Variant {
            ident: format!("{}{}", camel(&spec.peer), spec.id),
            id: spec.id,
            origin: VariantOrigin::Channel {
                peer: spec.peer.clone(),
            },
        };
        notification_variants.push(variant.clone());
        if spec.can_call {
            call_variants.push(variant);
        }
        ends.push(spec);
    }

    let mut irqs = Vec::new();
    for irq in &unit.interrupts {
        let id = irq.local_id.value();
        notification_variants.push(Variant {
            ident: format!("Irq{}", irq.line),
            id,
            origin: VariantOrigin::Irq { line: irq.line },
        });
        irqs.push(IrqSpec { id, line: irq.line });
    }

    notification_variants.sort_by_key(|v| v.id);
    call_variants.sort_by_key(|v| v.id);
    ends.sort_by_key(|e| e.id);
    irqs.sort_by_key(|i| i.id);

    let mappings = unit
        .mappings
        .iter()
        .map(|m| MappingSpec {
            name: m.name.clone(),
            vaddr: m.vaddr,
            length: m.length,
            writable: m.permission.is_writable(),
        })
        .collect();

    Ok(UnitApi {
        unit: unit.name.as_str().to_string(),
        notification_variants,
        call_variants,
        ends,
        irqs,
        mappings,
    })
}

fn check_unit(unit: &Unit) -> Result<(), GenerateError> {
    let mut seen = HashSet::new();
    for id in unit.local_ids() {
        if !seen.insert(id) {
            return Err(TopologyError::DuplicateLocalId {
                unit: unit.name.as_str().to_string(),
                id: u64::from(id.value()),
            }
            .into());
        }
    }
    let notifiable = unit
        .channel_ends
        .iter()
        .filter(|e| e.kind.can_notify())
        .map(|e| e.local_id)
        .chain(unit.interrupts.iter().map(|i| i.local_id));
    for id in notifiable {
        if id.value() > ChannelId::MAX_NOTIFIABLE {
            return Err(TopologyError::NotificationIdReservesCallBit {
                unit: unit.name.as_str().to_string(),
                id: u64::from(id.value()),
            }
            .into());
        }
    }
    Ok(())
}

/// Nearest declared unit names, closest length first, declaration order
/// breaking ties.
fn suggest_units(topology: &Topology, target: &str) -> Vec<String> {
    let mut names: Vec<&str> = topology.unit_names().collect();
    names.sort_by_key(|name| (name.len() as i64 - target.len() as i64).abs());
    names.into_iter().take(3).map(String::from).collect()
}

fn camel(name: &str) -> String {
    name.split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
