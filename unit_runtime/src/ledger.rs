//! Per-invocation capability mint ledger
//!
//! The ledger is the runtime rendition of the single-use discipline: every
//! capability minted for a handler invocation is recorded here, and every
//! consuming or surrendering operation discharges its record. After the
//! handler returns, the dispatcher audits the ledger; anything still live
//! was leaked.
//!
//! The typed capability layer makes double discharge unrepresentable
//! (consuming operations move the capability), so the ledger's job is the
//! other half: reliably catching the path where a capability is neither
//! consumed nor explicitly discarded.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::DisciplineError;

static NEXT_LEDGER: AtomicU64 = AtomicU64::new(0);

/// Identity of one minted capability.
///
/// Carries the issuing ledger's nonce, so a mint smuggled into a later
/// invocation is rejected as unknown even when its index happens to line
/// up with a fresh entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintId {
    ledger: u64,
    index: usize,
}

#[derive(Debug)]
struct MintEntry {
    resource: String,
    discharged: bool,
}

/// The mint record for a single handler invocation.
///
/// A fresh ledger is created for every invocation and audited when it
/// returns; nothing in it survives to the next iteration.
#[derive(Debug)]
pub struct CapLedger {
    id: u64,
    entries: Vec<MintEntry>,
}

impl Default for CapLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl CapLedger {
    /// Creates an empty ledger with a fresh nonce.
    pub fn new() -> Self {
        Self {
            id: NEXT_LEDGER.fetch_add(1, Ordering::Relaxed),
            entries: Vec::new(),
        }
    }

    /// Records a freshly minted capability for the named resource.
    pub fn mint(&mut self, resource: impl Into<String>) -> MintId {
        let id = MintId {
            ledger: self.id,
            index: self.entries.len(),
        };
        self.entries.push(MintEntry {
            resource: resource.into(),
            discharged: false,
        });
        id
    }

    /// Marks a mint as discharged, exactly once.
    pub fn discharge(&mut self, id: MintId) -> Result<(), DisciplineError> {
        let entry = self
            .entry_mut(id)
            .ok_or(DisciplineError::UnknownMint)?;
        if entry.discharged {
            return Err(DisciplineError::AlreadyDischarged {
                resource: entry.resource.clone(),
            });
        }
        entry.discharged = true;
        Ok(())
    }

    /// Whether a mint was issued by this ledger and has not been
    /// discharged.
    pub fn is_live(&self, id: MintId) -> bool {
        id.ledger == self.id && self.entries.get(id.index).is_some_and(|e| !e.discharged)
    }

    fn entry_mut(&mut self, id: MintId) -> Option<&mut MintEntry> {
        if id.ledger != self.id {
            return None;
        }
        self.entries.get_mut(id.index)
    }

    /// Resources that were minted and never discharged.
    pub fn outstanding(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !e.discharged)
            .map(|e| e.resource.clone())
            .collect()
    }

    /// Verifies that every mint was discharged.
    pub fn audit(&self) -> Result<(), DisciplineError> {
        let resources = self.outstanding();
        if resources.is_empty() {
            Ok(())
        } else {
            Err(DisciplineError::Leaked { resources })
        }
    }

    /// Number of mints recorded this invocation.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was minted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_and_discharge() {
        let mut ledger = CapLedger::new();
        let id = ledger.mint("notify:1");
        assert!(ledger.is_live(id));
        ledger.discharge(id).unwrap();
        assert!(!ledger.is_live(id));
        ledger.audit().unwrap();
    }

    #[test]
    fn test_forgotten_mint_fails_audit() {
        let mut ledger = CapLedger::new();
        let a = ledger.mint("user");
        ledger.mint("memory:mailbox");
        ledger.discharge(a).unwrap();
        let err = ledger.audit().unwrap_err();
        assert_eq!(
            err,
            DisciplineError::Leaked {
                resources: vec!["memory:mailbox".to_string()],
            }
        );
    }

    #[test]
    fn test_double_discharge_rejected() {
        let mut ledger = CapLedger::new();
        let id = ledger.mint("irq:0");
        ledger.discharge(id).unwrap();
        let err = ledger.discharge(id).unwrap_err();
        assert_eq!(
            err,
            DisciplineError::AlreadyDischarged {
                resource: "irq:0".to_string(),
            }
        );
    }

    #[test]
    fn test_stale_mint_rejected() {
        let mut previous = CapLedger::new();
        let stale = previous.mint("user");
        let mut fresh = CapLedger::new();
        // Same index as the stale mint; the nonce still tells them apart.
        let current = fresh.mint("user");
        assert_eq!(fresh.discharge(stale), Err(DisciplineError::UnknownMint));
        assert!(!fresh.is_live(stale));
        assert!(fresh.is_live(current));
        fresh.discharge(current).unwrap();
    }

    #[test]
    fn test_empty_ledger_audits_clean() {
        let ledger = CapLedger::new();
        assert!(ledger.is_empty());
        ledger.audit().unwrap();
    }
}
