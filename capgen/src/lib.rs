//! # Capability API Generator
//!
//! Synthesizes per-unit capability interfaces from a validated topology
//! description: for each unit, a discriminated union over its notification
//! sources, one over its call sources, mint helpers for the operations its
//! channel kinds grant, and a named memory-capability aggregate.
//!
//! ## Philosophy
//!
//! - **Atomic output**: a topology that fails any structural check
//!   produces no output files at all. Rendering completes in memory before
//!   the first write.
//! - **Closed unions**: generated enums always carry a catch-all variant,
//!   so decoding an event id is total and an undeclared id is an explicit,
//!   matchable case rather than a panic.
//! - **Deterministic text**: emission is plain string assembly; the same
//!   topology always renders byte-identical artifacts.

pub mod emit;
pub mod error;
pub mod synth;

pub use emit::{render_api, render_sys};
pub use error::GenerateError;
pub use synth::{synthesize, EndSpec, IrqSpec, MappingSpec, UnitApi, Variant, VariantOrigin};

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use topology::{TopologyDoc, TopologyError};

/// What one generator run should do.
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    /// Path of the JSON topology description.
    pub input: PathBuf,
    /// Unit to generate for; absent means validate-only.
    pub unit: Option<String>,
    /// Where to write the typed interface module.
    pub out_api: Option<PathBuf>,
    /// Where to write the low-level declarations file.
    pub out_sys: Option<PathBuf>,
}

/// Errors of one generator run, formatted for the command line.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read '{path}': {message}")]
    Read { path: String, message: String },

    #[error("failed to parse '{path}': {message}")]
    Parse { path: String, message: String },

    /// Structural validation failed; all violations are listed.
    #[error("{}", format_validation(.errors))]
    Invalid { errors: Vec<TopologyError> },

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error("failed to write '{path}': {message}")]
    Write { path: String, message: String },
}

fn format_validation(errors: &[TopologyError]) -> String {
    let mut out = format!("topology validation failed with {} error(s):", errors.len());
    for error in errors {
        out.push_str(&format!("\n  - {error}"));
    }
    out
}

/// Runs one generator invocation.
///
/// Without a target unit this validates the topology and reports. With
/// one, both artifacts are rendered in memory first; output files are
/// only written once nothing can fail anymore.
pub fn run_generator(config: &GeneratorConfig) -> Result<(), CliError> {
    let path = config.input.display().to_string();
    let text = fs::read_to_string(&config.input).map_err(|e| CliError::Read {
        path: path.clone(),
        message: e.to_string(),
    })?;
    let doc: TopologyDoc = serde_json::from_str(&text).map_err(|e| CliError::Parse {
        path: path.clone(),
        message: e.to_string(),
    })?;

    let errors = doc.validate();
    if !errors.is_empty() {
        return Err(CliError::Invalid { errors });
    }
    let topology = doc.into_topology().map_err(GenerateError::from)?;

    let Some(unit) = &config.unit else {
        println!("topology '{}' OK: {} unit(s)", path, topology.units().len());
        return Ok(());
    };

    let api = synthesize(&topology, unit)?;
    let api_text = render_api(&api);
    let sys_text = render_sys(&api);

    if config.out_api.is_none() && config.out_sys.is_none() {
        eprintln!(
            "warning: generated the API for '{}' but no output file was requested",
            api.unit()
        );
    }
    if let Some(out) = &config.out_api {
        fs::write(out, api_text).map_err(|e| CliError::Write {
            path: out.display().to_string(),
            message: e.to_string(),
        })?;
    }
    if let Some(out) = &config.out_sys {
        fs::write(out, sys_text).map_err(|e| CliError::Write {
            path: out.display().to_string(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const GOOD: &str = r#"{
        "units": [
            { "name": "auth" },
            { "name": "net" }
        ],
        "channels": [
            {
                "ends": [
                    { "unit": "auth", "id": 1, "kind": "both" },
                    { "unit": "net", "id": 2, "kind": "both" }
                ]
            }
        ]
    }"#;

    // Two auth ends share local id 1.
    const DUPLICATE_ID: &str = r#"{
        "units": [
            { "name": "auth" },
            { "name": "net" }
        ],
        "channels": [
            {
                "ends": [
                    { "unit": "auth", "id": 1 },
                    { "unit": "net", "id": 2 }
                ]
            },
            {
                "ends": [
                    { "unit": "auth", "id": 1 },
                    { "unit": "net", "id": 3 }
                ]
            }
        ]
    }"#;

    fn write_input(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("topology.json");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_generate_writes_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            input: write_input(dir.path(), GOOD),
            unit: Some("auth".to_string()),
            out_api: Some(dir.path().join("auth_api.rs")),
            out_sys: Some(dir.path().join("auth_sys.rs")),
        };
        run_generator(&config).unwrap();
        let api = fs::read_to_string(dir.path().join("auth_api.rs")).unwrap();
        assert!(api.contains("pub enum Notification"));
        assert!(fs::read_to_string(dir.path().join("auth_sys.rs"))
            .unwrap()
            .contains("extern \"C\""));
    }

    #[test]
    fn test_validation_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out_api = dir.path().join("auth_api.rs");
        let out_sys = dir.path().join("auth_sys.rs");
        let config = GeneratorConfig {
            input: write_input(dir.path(), DUPLICATE_ID),
            unit: Some("auth".to_string()),
            out_api: Some(out_api.clone()),
            out_sys: Some(out_sys.clone()),
        };
        let err = run_generator(&config).unwrap_err();
        assert!(matches!(err, CliError::Invalid { .. }));
        assert!(!out_api.exists());
        assert!(!out_sys.exists());
    }

    #[test]
    fn test_unknown_unit_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out_api = dir.path().join("api.rs");
        let config = GeneratorConfig {
            input: write_input(dir.path(), GOOD),
            unit: Some("ghost".to_string()),
            out_api: Some(out_api.clone()),
            out_sys: None,
        };
        let err = run_generator(&config).unwrap_err();
        assert!(matches!(
            err,
            CliError::Generate(GenerateError::UnknownUnit { .. })
        ));
        assert!(!out_api.exists());
    }

    #[test]
    fn test_validate_only_mode() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            input: write_input(dir.path(), GOOD),
            ..GeneratorConfig::default()
        };
        run_generator(&config).unwrap();
    }

    #[test]
    fn test_invalid_lists_every_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            input: write_input(dir.path(), DUPLICATE_ID),
            ..GeneratorConfig::default()
        };
        match run_generator(&config).unwrap_err() {
            CliError::Invalid { errors } => assert!(!errors.is_empty()),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }
}
