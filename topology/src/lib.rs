//! # Topology Model
//!
//! This crate defines the validated in-memory representation of a
//! partitioned-system topology: isolated units, the channels between them,
//! interrupt bindings, and shared-memory mappings.
//!
//! ## Philosophy
//!
//! - **Pure data**: the model carries no behavior beyond invariant checks.
//! - **Validated by construction**: a [`Topology`] can only be obtained
//!   through a path that enforces the structural invariants; downstream
//!   consumers (the generator, the runtime) never re-discover malformed
//!   input.
//! - **Diagnostics name the culprit**: every [`TopologyError`] identifies
//!   the offending unit and id, because topology errors are fixed by
//!   editing the description, not the code.
//!
//! ## Key Types
//!
//! - [`TopologyDoc`]: the serde-facing document, deserialized from JSON
//! - [`Topology`]: the validated model, one [`Unit`] per execution context
//! - [`TopologyError`]: every structural-validation failure

pub mod doc;
pub mod error;
pub mod model;

pub use doc::{ChannelDoc, EndDoc, IrqDoc, MapDoc, RegionDoc, TopologyDoc, UnitDoc};
pub use error::TopologyError;
pub use model::{
    Cacheability, CapabilityKind, ChannelEnd, ChannelId, InterruptBinding, MemoryMapping,
    Permission, Topology, Unit, UnitName,
};
