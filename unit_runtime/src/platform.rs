//! The platform primitive interface

use crate::badge::Badge;
use crate::error::PlatformError;
use crate::message::MessageInfo;

/// Size of the message register file.
pub const MESSAGE_REGISTERS: u8 = 64;

/// The kernel primitives the dispatcher is built on.
///
/// This is the seam between the capability layer and the platform: the
/// dispatcher and the runtime capabilities treat these operations as an
/// opaque, already-correct foreign interface. Multiple implementations are
/// possible:
/// - a simulated platform (deterministic, for tests)
/// - the real kernel bindings emitted by the generator
///
/// All operations are synchronous with immediate effect; `receive` and
/// `reply_receive` are the only blocking points in a unit.
pub trait Platform {
    /// Sends a notification on a local channel id.
    fn notify(&mut self, channel: u8) -> Result<(), PlatformError>;

    /// Acknowledges the interrupt bound to a local channel id.
    fn irq_ack(&mut self, channel: u8) -> Result<(), PlatformError>;

    /// Makes a protected call on a local channel id and returns the
    /// callee's reply word.
    fn protected_call(
        &mut self,
        channel: u8,
        message: MessageInfo,
    ) -> Result<MessageInfo, PlatformError>;

    /// Blocks until the next event and returns its badge and, for call
    /// events, the inbound message word.
    fn receive(&mut self) -> Result<(Badge, MessageInfo), PlatformError>;

    /// Replies to the previous call event and blocks for the next event
    /// in one primitive (the platform's reply-then-wait convention).
    fn reply_receive(&mut self, reply: MessageInfo) -> Result<(Badge, MessageInfo), PlatformError>;

    /// Reads a message register.
    fn mr_read(&mut self, index: u8) -> Result<u64, PlatformError>;

    /// Writes a message register.
    fn mr_write(&mut self, index: u8, value: u64) -> Result<(), PlatformError>;
}
