//! Generator errors

use thiserror::Error;
use topology::TopologyError;

/// Errors raised while synthesizing a unit's capability API.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    /// A structural invariant of the topology failed.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// The requested unit is not declared in the topology.
    #[error("unknown unit '{name}'{}", format_suggestions(.suggestions))]
    UnknownUnit {
        name: String,
        suggestions: Vec<String>,
    },
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (closest declared units: {})", suggestions.join(", "))
    }
}
