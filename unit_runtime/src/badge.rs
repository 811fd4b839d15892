//! Badge wire format
//!
//! A badge is the 64-bit multiplexed value a receive returns. Bit 63 is
//! the discriminator: set means a call event whose caller id occupies the
//! low 63 bits; clear means a notification bitmask where bit *i* signals a
//! pending notification on local id *i*.

use std::fmt;

/// Bit 63: distinguishes call events from notification bitmasks.
pub const CALL_FLAG: u64 = 1 << 63;

/// The raw multiplexed wire value returned by a receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Badge(u64);

impl Badge {
    /// Wraps a raw wire value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Builds the badge a call event from `id` produces.
    pub const fn from_call_id(id: u64) -> Self {
        Self(CALL_FLAG | (id & !CALL_FLAG))
    }

    /// Builds the badge a set of pending notifications produces.
    pub const fn from_notifications(mask: u64) -> Self {
        Self(mask & !CALL_FLAG)
    }

    /// Returns the raw wire value.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Splits the badge into its event representation.
    pub const fn decode(self) -> BadgeEvents {
        if self.0 & CALL_FLAG != 0 {
            BadgeEvents::Call(self.0 & !CALL_FLAG)
        } else {
            BadgeEvents::Notifications(NotificationBits(self.0))
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "badge:{:#018x}", self.0)
    }
}

/// A decoded badge: either one call event or a set of notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeEvents {
    /// A protected call from the endpoint with this numeric id.
    Call(u64),
    /// Zero or more pending notifications, one per set bit.
    Notifications(NotificationBits),
}

impl BadgeEvents {
    /// Rebuilds the badge this event set decodes from.
    pub const fn reconstruct(self) -> Badge {
        match self {
            BadgeEvents::Call(id) => Badge::from_call_id(id),
            BadgeEvents::Notifications(bits) => Badge(bits.0),
        }
    }
}

/// The notification half of a badge: a bitmask over bits 0..=62.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationBits(u64);

impl NotificationBits {
    /// Returns the raw bitmask.
    pub const fn mask(self) -> u64 {
        self.0
    }

    /// Whether no notification is pending.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of pending notifications.
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }
}

impl IntoIterator for NotificationBits {
    type Item = u32;
    type IntoIter = SetBits;

    fn into_iter(self) -> SetBits {
        SetBits(self.0)
    }
}

/// Iterates set bit indices in strictly ascending order.
///
/// The ascending order is a dispatch contract, not a convenience: handlers
/// for lower ids always run before handlers for higher ids within one
/// badge.
#[derive(Debug, Clone, Copy)]
pub struct SetBits(u64);

impl Iterator for SetBits {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.0 == 0 {
            return None;
        }
        let bit = self.0.trailing_zeros();
        self.0 &= self.0 - 1;
        Some(bit)
    }
}
