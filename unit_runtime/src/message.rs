//! Message word format
//!
//! Call and reply messages travel as a single packed machine word: a
//! 52-bit label (opaque to the dispatcher, meaningful only to application
//! protocol) in bits 12..=63 and a 7-bit register count in bits 0..=6.
//! Bits 7..=11 are reserved and zero.

use thiserror::Error;

const LABEL_SHIFT: u32 = 12;
const COUNT_MASK: u64 = 0x7f;

/// Largest representable label (52 bits).
pub const MAX_LABEL: u64 = (1 << 52) - 1;

/// Largest representable register count (7 bits).
pub const MAX_COUNT: u8 = 0x7f;

/// Errors constructing a message word.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("label {label} exceeds the 52-bit label field")]
    LabelTooLarge { label: u64 },

    #[error("register count {count} exceeds the 7-bit count field")]
    CountTooLarge { count: u8 },
}

/// A label/count pair packed into one machine word on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageInfo {
    label: u64,
    count: u8,
}

impl MessageInfo {
    /// Creates a message word, rejecting out-of-range fields.
    pub fn new(label: u64, count: u8) -> Result<Self, MessageError> {
        if label > MAX_LABEL {
            return Err(MessageError::LabelTooLarge { label });
        }
        if count > MAX_COUNT {
            return Err(MessageError::CountTooLarge { count });
        }
        Ok(Self { label, count })
    }

    /// The empty message: label 0, count 0.
    pub const fn empty() -> Self {
        Self { label: 0, count: 0 }
    }

    /// Returns the protocol label.
    pub const fn label(self) -> u64 {
        self.label
    }

    /// Returns the register count.
    pub const fn count(self) -> u8 {
        self.count
    }

    /// Packs into the wire word. Reserved bits 7..=11 are zero.
    pub const fn pack(self) -> u64 {
        (self.label << LABEL_SHIFT) | (self.count as u64)
    }

    /// Unpacks a wire word, extracting label and count fields.
    pub const fn unpack(word: u64) -> Self {
        Self {
            label: word >> LABEL_SHIFT,
            count: (word & COUNT_MASK) as u8,
        }
    }
}
