//! Ordered operation log
//!
//! Every platform primitive the simulated platform executes is appended
//! here, in order. Tests assert against the log to verify not just what a
//! unit did but the order it did it in.

/// One recorded platform operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformOp {
    Receive,
    ReplyReceive { label: u64, count: u8 },
    Notify { channel: u8 },
    IrqAck { channel: u8 },
    Call { channel: u8, label: u64 },
    MrRead { index: u8 },
    MrWrite { index: u8, value: u64 },
}

/// An append-only, queryable record of platform operations.
#[derive(Debug, Default)]
pub struct OpLog {
    ops: Vec<PlatformOp>,
}

impl OpLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, op: PlatformOp) {
        self.ops.push(op);
    }

    /// All operations, oldest first.
    pub fn ops(&self) -> &[PlatformOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Whether the given operation was recorded at least once.
    pub fn contains(&self, op: &PlatformOp) -> bool {
        self.ops.contains(op)
    }

    /// Channels notified, in order.
    pub fn notified_channels(&self) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PlatformOp::Notify { channel } => Some(*channel),
                _ => None,
            })
            .collect()
    }

    /// Discards the recorded history.
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}
