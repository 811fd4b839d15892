//! Capability-discipline conformance: exactly-once use, leak detection,
//! read-vs-write view multiplicity, bounds faults, and memory as the only
//! state that survives an iteration.
