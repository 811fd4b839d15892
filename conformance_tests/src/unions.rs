//! Union-shape conformance: synthesized discriminated unions.
