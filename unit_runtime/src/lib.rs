//! # Unit Runtime
//!
//! This crate is what a unit's application code links against: the wire
//! codecs for the multiplexed kernel badge, the runtime capability types,
//! and the event dispatcher that routes decoded events to unit-supplied
//! handlers.
//!
//! ## Philosophy
//!
//! - **No ambient authority**: a handler can only act through capabilities
//!   minted for that one invocation; the platform primitives are never
//!   reachable directly.
//! - **Use exactly once**: every minted capability must be consumed by an
//!   operation that legitimately discharges it, or surrendered explicitly.
//!   Consuming operations take the capability by move, so double use does
//!   not compile; forgetting one is caught by the per-invocation ledger
//!   audit and surfaces as a [`UnitFault`].
//! - **Stateless between iterations**: the dispatcher carries nothing from
//!   one receive to the next except the single pending reply. State a unit
//!   wants to keep lives in a read-write memory mapping, nowhere else.
//!
//! ## Key Types
//!
//! - [`Badge`]: the multiplexed 64-bit wire value and its decoder
//! - [`MessageInfo`]: the packed label/count message word
//! - [`Platform`]: the opaque kernel primitive interface
//! - [`Dispatcher`]: the per-unit event loop
//! - [`HandlerContext`]: the per-invocation capability mint

pub mod badge;
pub mod caps;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod message;
pub mod platform;
pub mod profile;

pub use badge::{Badge, BadgeEvents, NotificationBits, SetBits, CALL_FLAG};
pub use caps::{
    CallCap, HandlerContext, IrqCap, MemCap, MemoryCaps, NotifyCap, ReadMemCap, UserCap,
    WriteMemCap,
};
pub use dispatch::{CallSet, Dispatcher, EventHandlers, NotificationSet};
pub use error::{DisciplineError, MemoryFault, MintError, PlatformError, UnitFault};
pub use ledger::{CapLedger, MintId};
pub use memory::{ReadView, UnitMemory, WriteView};
pub use message::{MessageError, MessageInfo, MAX_COUNT, MAX_LABEL};
pub use platform::{Platform, MESSAGE_REGISTERS};
pub use profile::{EndpointProfile, IrqProfile, MappingProfile, UnitProfile};
