//! The simulated platform

use std::collections::VecDeque;

use unit_runtime::{Badge, MessageInfo, Platform, PlatformError, MESSAGE_REGISTERS};

use crate::oplog::{OpLog, PlatformOp};

/// A deterministic in-process [`Platform`].
///
/// Events are scripted up front as `(Badge, MessageInfo)` pairs and
/// consumed in order by `receive` and `reply_receive`; protected-call
/// replies are scripted the same way. Every primitive is recorded in the
/// [`OpLog`]. Script exhaustion surfaces
/// [`PlatformError::WouldBlock`] so test dispatch loops terminate instead
/// of blocking.
#[derive(Debug)]
pub struct SimPlatform {
    script: VecDeque<(Badge, MessageInfo)>,
    call_replies: VecDeque<MessageInfo>,
    registers: [u64; MESSAGE_REGISTERS as usize],
    log: OpLog,
}

impl Default for SimPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SimPlatform {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            call_replies: VecDeque::new(),
            registers: [0; MESSAGE_REGISTERS as usize],
            log: OpLog::new(),
        }
    }

    /// Appends an event the next receive will deliver.
    pub fn push_event(&mut self, badge: Badge, message: MessageInfo) {
        self.script.push_back((badge, message));
    }

    /// Appends the reply the next `protected_call` will return.
    ///
    /// Calls beyond the scripted replies return the empty message.
    pub fn push_call_reply(&mut self, reply: MessageInfo) {
        self.call_replies.push_back(reply);
    }

    /// Events not yet delivered.
    pub fn pending_events(&self) -> usize {
        self.script.len()
    }

    /// The recorded operation history.
    pub fn log(&self) -> &OpLog {
        &self.log
    }

    /// Discards the recorded history, keeping the script.
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Current value of a message register.
    pub fn register(&self, index: u8) -> Option<u64> {
        self.registers.get(usize::from(index)).copied()
    }

    fn next_event(&mut self) -> Result<(Badge, MessageInfo), PlatformError> {
        self.script.pop_front().ok_or(PlatformError::WouldBlock)
    }
}

impl Platform for SimPlatform {
    fn notify(&mut self, channel: u8) -> Result<(), PlatformError> {
        self.log.record(PlatformOp::Notify { channel });
        Ok(())
    }

    fn irq_ack(&mut self, channel: u8) -> Result<(), PlatformError> {
        self.log.record(PlatformOp::IrqAck { channel });
        Ok(())
    }

    fn protected_call(
        &mut self,
        channel: u8,
        message: MessageInfo,
    ) -> Result<MessageInfo, PlatformError> {
        self.log.record(PlatformOp::Call {
            channel,
            label: message.label(),
        });
        Ok(self.call_replies.pop_front().unwrap_or_default())
    }

    fn receive(&mut self) -> Result<(Badge, MessageInfo), PlatformError> {
        self.log.record(PlatformOp::Receive);
        self.next_event()
    }

    fn reply_receive(&mut self, reply: MessageInfo) -> Result<(Badge, MessageInfo), PlatformError> {
        self.log.record(PlatformOp::ReplyReceive {
            label: reply.label(),
            count: reply.count(),
        });
        self.next_event()
    }

    fn mr_read(&mut self, index: u8) -> Result<u64, PlatformError> {
        let value = self
            .registers
            .get(usize::from(index))
            .copied()
            .ok_or(PlatformError::InvalidRegister(index))?;
        self.log.record(PlatformOp::MrRead { index });
        Ok(value)
    }

    fn mr_write(&mut self, index: u8, value: u64) -> Result<(), PlatformError> {
        let slot = self
            .registers
            .get_mut(usize::from(index))
            .ok_or(PlatformError::InvalidRegister(index))?;
        *slot = value;
        self.log.record(PlatformOp::MrWrite { index, value });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_events_delivered_in_order() {
        let mut sim = SimPlatform::new();
        sim.push_event(Badge::from_notifications(0b1), MessageInfo::empty());
        sim.push_event(Badge::from_call_id(2), MessageInfo::unpack(0x1000));
        assert_eq!(
            sim.receive().unwrap(),
            (Badge::from_notifications(0b1), MessageInfo::empty())
        );
        assert_eq!(
            sim.receive().unwrap(),
            (Badge::from_call_id(2), MessageInfo::unpack(0x1000))
        );
        assert_eq!(sim.receive(), Err(PlatformError::WouldBlock));
    }

    #[test]
    fn test_reply_receive_records_the_reply() {
        let mut sim = SimPlatform::new();
        sim.push_event(Badge::from_notifications(0b1), MessageInfo::empty());
        let reply = MessageInfo::new(7, 2).unwrap();
        sim.reply_receive(reply).unwrap();
        assert_eq!(
            sim.log().ops(),
            &[PlatformOp::ReplyReceive { label: 7, count: 2 }]
        );
    }

    #[test]
    fn test_call_reply_script() {
        let mut sim = SimPlatform::new();
        sim.push_call_reply(MessageInfo::new(9, 0).unwrap());
        let first = sim.protected_call(2, MessageInfo::empty()).unwrap();
        assert_eq!(first.label(), 9);
        // Unscripted calls fall back to the empty reply.
        let second = sim.protected_call(2, MessageInfo::empty()).unwrap();
        assert_eq!(second, MessageInfo::empty());
    }

    #[test]
    fn test_registers_round_trip() {
        let mut sim = SimPlatform::new();
        sim.mr_write(3, 0xdead).unwrap();
        assert_eq!(sim.mr_read(3).unwrap(), 0xdead);
        assert_eq!(
            sim.mr_write(64, 0),
            Err(PlatformError::InvalidRegister(64))
        );
        assert_eq!(sim.mr_read(64), Err(PlatformError::InvalidRegister(64)));
    }

    #[test]
    fn test_log_survives_script_exhaustion() {
        let mut sim = SimPlatform::new();
        let _ = sim.receive();
        assert_eq!(sim.log().ops(), &[PlatformOp::Receive]);
    }
}
