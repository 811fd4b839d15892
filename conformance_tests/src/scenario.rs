//! The reference `auth` scenario end to end: interrupt on id 0,
//! notifications from both peers, a protected call, and undeclared ids.

#[cfg(test)]
mod tests {
    use crate::test_helpers::{auth_dispatcher, auth_profile, AuthCall, AuthNotification};
    use sim_platform::{PlatformOp, SimPlatform};
    use unit_runtime::{
        Badge, Dispatcher, EventHandlers, HandlerContext, MessageInfo, Platform, UnitFault,
        CALL_FLAG,
    };

    #[test]
    fn test_badge_0b001_is_one_interrupt_event() {
        let mut dispatcher = auth_dispatcher(&[(
            Badge::from_notifications(0b001),
            MessageInfo::empty(),
        )]);
        dispatcher.step().unwrap();
        assert_eq!(dispatcher.handlers().events, vec!["Irq212"]);
        assert!(dispatcher
            .platform()
            .log()
            .contains(&PlatformOp::IrqAck { channel: 0 }));
    }

    #[test]
    fn test_badge_0b110_is_two_channel_events() {
        let mut dispatcher = auth_dispatcher(&[(
            Badge::from_notifications(0b110),
            MessageInfo::empty(),
        )]);
        dispatcher.step().unwrap();
        assert_eq!(dispatcher.handlers().events, vec!["Net1", "Storage2"]);
    }

    #[test]
    fn test_call_from_net_replies_with_incremented_label() {
        let mut dispatcher = auth_dispatcher(&[
            (Badge::new(CALL_FLAG | 0x1), MessageInfo::unpack(0x1000)),
            (Badge::from_notifications(0b001), MessageInfo::empty()),
        ]);
        dispatcher.step().unwrap();
        assert_eq!(dispatcher.handlers().events, vec!["Net1 label 1"]);
        // The reply leaves with the next blocking receive.
        dispatcher.step().unwrap();
        assert!(dispatcher
            .platform()
            .log()
            .contains(&PlatformOp::ReplyReceive { label: 2, count: 0 }));
    }

    /// A call handler that moves its argument through the message
    /// registers: reads the staged argument from register 0, writes the
    /// doubled result back, and replies with one payload register.
    struct Doubler;

    impl EventHandlers<SimPlatform> for Doubler {
        type Notification = AuthNotification;
        type Call = AuthCall;

        fn on_notification(
            &mut self,
            _source: AuthNotification,
            _ctx: &mut HandlerContext<'_, SimPlatform>,
        ) -> Result<(), UnitFault> {
            Ok(())
        }

        fn on_call(
            &mut self,
            _source: AuthCall,
            message: MessageInfo,
            ctx: &mut HandlerContext<'_, SimPlatform>,
        ) -> Result<MessageInfo, UnitFault> {
            let argument = ctx.mr_read(0)?;
            ctx.mr_write(0, argument * 2)?;
            Ok(MessageInfo::new(message.label(), 1).unwrap())
        }
    }

    #[test]
    fn test_call_handler_moves_argument_registers() {
        let mut sim = SimPlatform::new();
        sim.mr_write(0, 21).unwrap();
        sim.clear_log();
        sim.push_event(Badge::new(CALL_FLAG | 0x1), MessageInfo::new(5, 1).unwrap());
        sim.push_event(Badge::from_notifications(0b010), MessageInfo::empty());
        let mut dispatcher = Dispatcher::new(sim, Doubler, auth_profile());
        dispatcher.step().unwrap();
        // The reply header leaves with the next receive; the payload is
        // already staged in register 0.
        dispatcher.step().unwrap();
        assert_eq!(dispatcher.platform().register(0), Some(42));
        let log = dispatcher.platform().log();
        assert!(log.contains(&PlatformOp::MrRead { index: 0 }));
        assert!(log.contains(&PlatformOp::MrWrite { index: 0, value: 42 }));
        assert!(log.contains(&PlatformOp::ReplyReceive { label: 5, count: 1 }));
    }

    #[test]
    fn test_undeclared_notification_id_faults() {
        let mut dispatcher = auth_dispatcher(&[(
            Badge::from_notifications(1 << 9),
            MessageInfo::empty(),
        )]);
        assert_eq!(
            dispatcher.step().unwrap_err(),
            UnitFault::UnexpectedEvent { raw: 9 }
        );
        // The handler still saw the decoded catch-all before faulting.
        assert_eq!(dispatcher.handlers().events, vec!["Unknown(9)"]);
    }

    #[test]
    fn test_undeclared_call_id_faults() {
        let mut dispatcher = auth_dispatcher(&[(
            Badge::from_call_id(17),
            MessageInfo::empty(),
        )]);
        assert_eq!(
            dispatcher.step().unwrap_err(),
            UnitFault::UnexpectedEvent { raw: 17 }
        );
    }

    #[test]
    fn test_faulting_step_sends_no_reply() {
        let mut dispatcher = auth_dispatcher(&[
            (Badge::from_call_id(17), MessageInfo::empty()),
            (Badge::from_notifications(0b001), MessageInfo::empty()),
        ]);
        assert!(dispatcher.step().is_err());
        // A failed call handler leaves no pending reply behind.
        dispatcher.step().unwrap();
        assert_eq!(
            dispatcher.platform().log().ops(),
            &[PlatformOp::Receive, PlatformOp::Receive, PlatformOp::IrqAck { channel: 0 }]
        );
    }
}
