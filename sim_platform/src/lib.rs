//! # Simulated Platform
//!
//! A deterministic, fully inspectable implementation of the
//! `unit_runtime::Platform` primitives for driving dispatch loops in
//! tests: scripted events in, an ordered operation log out.

pub mod oplog;
pub mod sim;

pub use oplog::{OpLog, PlatformOp};
pub use sim::SimPlatform;
