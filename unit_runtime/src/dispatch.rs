//! The single-threaded event dispatcher
//!
//! The dispatcher owns the platform, the unit's endpoint table, and its
//! mapped memory. Each iteration it blocks on the platform (replying to
//! the previous call first if one is outstanding), decodes the badge, and
//! invokes the unit's handlers once per event: ascending id order for
//! notifications, a single invocation for a call. Every invocation gets a
//! fresh capability ledger, audited when the handler returns.

use crate::badge::BadgeEvents;
use crate::caps::{HandlerContext, UserCap};
use crate::error::UnitFault;
use crate::ledger::CapLedger;
use crate::memory::UnitMemory;
use crate::message::MessageInfo;
use crate::platform::Platform;
use crate::profile::UnitProfile;

/// A generated discriminated union over a unit's notification sources.
///
/// `from_bit` is total: ids with no declared endpoint map to the union's
/// catch-all variant.
pub trait NotificationSet {
    fn from_bit(bit: u32) -> Self;
}

/// A generated discriminated union over a unit's call sources.
///
/// `from_call_id` is total: ids with no declared call-capable endpoint map
/// to the union's catch-all variant.
pub trait CallSet {
    fn from_call_id(id: u64) -> Self;
}

/// The unit-supplied event handlers.
///
/// Handlers act only through the per-invocation [`HandlerContext`]; state
/// a unit wants to keep between events belongs in a writable memory
/// mapping.
pub trait EventHandlers<P: Platform> {
    type Notification: NotificationSet;
    type Call: CallSet;

    /// Handles one pending notification.
    fn on_notification(
        &mut self,
        source: Self::Notification,
        ctx: &mut HandlerContext<'_, P>,
    ) -> Result<(), UnitFault>;

    /// Handles one protected call and produces the reply word.
    fn on_call(
        &mut self,
        source: Self::Call,
        message: MessageInfo,
        ctx: &mut HandlerContext<'_, P>,
    ) -> Result<MessageInfo, UnitFault>;
}

/// The per-unit event loop.
pub struct Dispatcher<P, H> {
    platform: P,
    handlers: H,
    profile: UnitProfile,
    memory: UnitMemory,
    pending_reply: Option<MessageInfo>,
}

impl<P, H> Dispatcher<P, H>
where
    P: Platform,
    H: EventHandlers<P>,
{
    /// Builds a dispatcher, allocating memory per the profile.
    pub fn new(platform: P, handlers: H, profile: UnitProfile) -> Self {
        let memory = UnitMemory::from_profile(&profile);
        Self {
            platform,
            handlers,
            profile,
            memory,
            pending_reply: None,
        }
    }

    /// The unit's endpoint table.
    pub fn profile(&self) -> &UnitProfile {
        &self.profile
    }

    /// The unit's mapped memory, for seeding and assertions.
    pub fn memory(&self) -> &UnitMemory {
        &self.memory
    }

    /// Mutable access to the mapped memory, for seeding test scenarios.
    pub fn memory_mut(&mut self) -> &mut UnitMemory {
        &mut self.memory
    }

    /// The platform, for inspecting simulated state.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// The handlers, for inspecting recorded state after stepping.
    pub fn handlers(&self) -> &H {
        &self.handlers
    }

    /// Runs one iteration: block for the next badge, dispatch every event
    /// it carries.
    pub fn step(&mut self) -> Result<(), UnitFault> {
        let (badge, message) = match self.pending_reply.take() {
            Some(reply) => self.platform.reply_receive(reply)?,
            None => self.platform.receive()?,
        };
        match badge.decode() {
            BadgeEvents::Call(id) => {
                let reply = self.dispatch_call(id, message)?;
                self.pending_reply = Some(reply);
            }
            BadgeEvents::Notifications(bits) => {
                for bit in bits {
                    self.dispatch_notification(bit)?;
                }
            }
        }
        Ok(())
    }

    /// Runs the loop until a fault terminates it.
    pub fn run(&mut self) -> Result<(), UnitFault> {
        loop {
            self.step()?;
        }
    }

    fn dispatch_notification(&mut self, bit: u32) -> Result<(), UnitFault> {
        let Self {
            platform,
            handlers,
            profile,
            memory,
            ..
        } = self;
        let mut ledger = CapLedger::new();
        let user = UserCap::new(ledger.mint("user"));
        let caps = memory.mint_caps(&mut ledger);
        let mut ctx = HandlerContext::new(platform, profile, &mut ledger, user, caps);
        let outcome = handlers.on_notification(H::Notification::from_bit(bit), &mut ctx);
        ctx.surrender_unused()?;
        drop(ctx);
        outcome?;
        ledger.audit()?;
        Ok(())
    }

    fn dispatch_call(&mut self, id: u64, message: MessageInfo) -> Result<MessageInfo, UnitFault> {
        let Self {
            platform,
            handlers,
            profile,
            memory,
            ..
        } = self;
        let mut ledger = CapLedger::new();
        let user = UserCap::new(ledger.mint("user"));
        let caps = memory.mint_caps(&mut ledger);
        let mut ctx = HandlerContext::new(platform, profile, &mut ledger, user, caps);
        let outcome = handlers.on_call(H::Call::from_call_id(id), message, &mut ctx);
        ctx.surrender_unused()?;
        drop(ctx);
        let reply = outcome?;
        ledger.audit()?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::Badge;
    use crate::error::{DisciplineError, MintError, PlatformError};
    use std::collections::VecDeque;

    struct TestPlatform {
        script: VecDeque<(Badge, MessageInfo)>,
        ops: Vec<String>,
    }

    impl TestPlatform {
        fn with_script(events: Vec<(Badge, MessageInfo)>) -> Self {
            Self {
                script: events.into(),
                ops: Vec::new(),
            }
        }
    }

    impl Platform for TestPlatform {
        fn notify(&mut self, channel: u8) -> Result<(), PlatformError> {
            self.ops.push(format!("notify {channel}"));
            Ok(())
        }

        fn irq_ack(&mut self, channel: u8) -> Result<(), PlatformError> {
            self.ops.push(format!("irq_ack {channel}"));
            Ok(())
        }

        fn protected_call(
            &mut self,
            channel: u8,
            message: MessageInfo,
        ) -> Result<MessageInfo, PlatformError> {
            self.ops.push(format!("call {channel} label {}", message.label()));
            Ok(MessageInfo::empty())
        }

        fn receive(&mut self) -> Result<(Badge, MessageInfo), PlatformError> {
            self.ops.push("receive".to_string());
            self.script.pop_front().ok_or(PlatformError::WouldBlock)
        }

        fn reply_receive(
            &mut self,
            reply: MessageInfo,
        ) -> Result<(Badge, MessageInfo), PlatformError> {
            self.ops.push(format!("reply label {}", reply.label()));
            self.script.pop_front().ok_or(PlatformError::WouldBlock)
        }

        fn mr_read(&mut self, _index: u8) -> Result<u64, PlatformError> {
            Ok(0)
        }

        fn mr_write(&mut self, _index: u8, _value: u64) -> Result<(), PlatformError> {
            Ok(())
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    enum TestNotification {
        Timer,
        Net,
        Other(u32),
    }

    impl NotificationSet for TestNotification {
        fn from_bit(bit: u32) -> Self {
            match bit {
                0 => TestNotification::Timer,
                1 => TestNotification::Net,
                other => TestNotification::Other(other),
            }
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    enum TestCall {
        Net,
        Other(u64),
    }

    impl CallSet for TestCall {
        fn from_call_id(id: u64) -> Self {
            match id {
                1 => TestCall::Net,
                other => TestCall::Other(other),
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
        leak_user: bool,
        notify_on: Option<u8>,
    }

    impl EventHandlers<TestPlatform> for Recorder {
        type Notification = TestNotification;
        type Call = TestCall;

        fn on_notification(
            &mut self,
            source: TestNotification,
            ctx: &mut HandlerContext<'_, TestPlatform>,
        ) -> Result<(), UnitFault> {
            self.seen.push(format!("{source:?}"));
            if self.leak_user {
                let user = ctx.take_user()?;
                std::mem::forget(user);
            }
            if let Some(channel) = self.notify_on {
                let user = ctx.take_user()?;
                let cap = ctx.mint_notify(&user, channel)?;
                cap.notify(ctx)?;
                user.surrender(ctx)?;
            }
            Ok(())
        }

        fn on_call(
            &mut self,
            source: TestCall,
            message: MessageInfo,
            _ctx: &mut HandlerContext<'_, TestPlatform>,
        ) -> Result<MessageInfo, UnitFault> {
            self.seen.push(format!("{source:?} label {}", message.label()));
            MessageInfo::new(message.label() + 1, 0).map_err(|_| UnitFault::UnexpectedEvent {
                raw: message.label(),
            })
        }
    }

    fn profile() -> UnitProfile {
        UnitProfile::new("auth")
            .with_irq(0, 212)
            .with_duplex_end(1)
            .with_call_end(2)
    }

    #[test]
    fn test_notifications_dispatch_in_ascending_order() {
        let platform = TestPlatform::with_script(vec![(
            Badge::from_notifications(0b11),
            MessageInfo::empty(),
        )]);
        let mut dispatcher = Dispatcher::new(platform, Recorder::default(), profile());
        dispatcher.step().unwrap();
        assert_eq!(dispatcher.handlers().seen, vec!["Timer", "Net"]);
    }

    #[test]
    fn test_undeclared_bit_reaches_catch_all() {
        let platform = TestPlatform::with_script(vec![(
            Badge::from_notifications(1 << 7),
            MessageInfo::empty(),
        )]);
        let mut dispatcher = Dispatcher::new(platform, Recorder::default(), profile());
        dispatcher.step().unwrap();
        assert_eq!(dispatcher.handlers().seen, vec!["Other(7)"]);
    }

    #[test]
    fn test_call_reply_goes_out_on_next_iteration() {
        let platform = TestPlatform::with_script(vec![
            (Badge::from_call_id(1), MessageInfo::unpack(0x5000)),
            (Badge::from_notifications(0b1), MessageInfo::empty()),
        ]);
        let mut dispatcher = Dispatcher::new(platform, Recorder::default(), profile());
        dispatcher.step().unwrap();
        dispatcher.step().unwrap();
        assert_eq!(
            dispatcher.handlers().seen,
            vec!["Net label 5", "Timer"]
        );
        assert_eq!(
            dispatcher.platform().ops,
            vec!["receive", "reply label 6"]
        );
    }

    #[test]
    fn test_leaked_user_capability_faults() {
        let platform = TestPlatform::with_script(vec![(
            Badge::from_notifications(0b1),
            MessageInfo::empty(),
        )]);
        let handlers = Recorder {
            leak_user: true,
            ..Recorder::default()
        };
        let mut dispatcher = Dispatcher::new(platform, handlers, profile());
        let err = dispatcher.step().unwrap_err();
        assert_eq!(
            err,
            UnitFault::Discipline(DisciplineError::Leaked {
                resources: vec!["user".to_string()],
            })
        );
    }

    #[test]
    fn test_minted_notify_capability_reaches_platform() {
        let platform = TestPlatform::with_script(vec![(
            Badge::from_notifications(0b1),
            MessageInfo::empty(),
        )]);
        let handlers = Recorder {
            notify_on: Some(1),
            ..Recorder::default()
        };
        let mut dispatcher = Dispatcher::new(platform, handlers, profile());
        dispatcher.step().unwrap();
        assert_eq!(dispatcher.platform().ops, vec!["receive", "notify 1"]);
    }

    #[test]
    fn test_mint_on_undeclared_channel_rejected() {
        let platform = TestPlatform::with_script(vec![(
            Badge::from_notifications(0b1),
            MessageInfo::empty(),
        )]);
        let handlers = Recorder {
            notify_on: Some(9),
            ..Recorder::default()
        };
        let mut dispatcher = Dispatcher::new(platform, handlers, profile());
        let err = dispatcher.step().unwrap_err();
        assert_eq!(
            err,
            UnitFault::Mint(MintError::NotifyNotDeclared {
                unit: "auth".to_string(),
                channel: 9,
            })
        );
    }

    #[test]
    fn test_exhausted_script_reports_would_block() {
        let platform = TestPlatform::with_script(vec![]);
        let mut dispatcher = Dispatcher::new(platform, Recorder::default(), profile());
        assert_eq!(
            dispatcher.step().unwrap_err(),
            UnitFault::Platform(PlatformError::WouldBlock)
        );
    }
}
