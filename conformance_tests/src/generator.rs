//! Generator-surface conformance: atomic failure, diagnostics, and the
//! validate-only mode.
