//! Dispatch-ordering conformance: ascending ids within a badge, event
//! order across badges, reply-then-wait sequencing.

#[cfg(test)]
mod tests {
    use crate::test_helpers::auth_dispatcher;
    use sim_platform::PlatformOp;
    use unit_runtime::{Badge, MessageInfo};

    #[test]
    fn test_multi_bit_badge_dispatches_ascending() {
        let mut dispatcher = auth_dispatcher(&[(
            Badge::from_notifications(0b110),
            MessageInfo::empty(),
        )]);
        dispatcher.step().unwrap();
        assert_eq!(dispatcher.handlers().events, vec!["Net1", "Storage2"]);
    }

    #[test]
    fn test_descending_arrival_still_dispatches_ascending() {
        // Bits 2 and 0 pending in one badge: id 0 runs first regardless of
        // which notification arrived first at the platform.
        let mut dispatcher = auth_dispatcher(&[(
            Badge::from_notifications(0b101),
            MessageInfo::empty(),
        )]);
        dispatcher.step().unwrap();
        assert_eq!(dispatcher.handlers().events, vec!["Irq212", "Storage2"]);
    }

    #[test]
    fn test_order_across_consecutive_badges_is_arrival_order() {
        let mut dispatcher = auth_dispatcher(&[
            (Badge::from_notifications(0b100), MessageInfo::empty()),
            (Badge::from_notifications(0b010), MessageInfo::empty()),
        ]);
        dispatcher.step().unwrap();
        dispatcher.step().unwrap();
        assert_eq!(dispatcher.handlers().events, vec!["Storage2", "Net1"]);
    }

    #[test]
    fn test_call_reply_rides_the_next_receive() {
        let mut dispatcher = auth_dispatcher(&[
            (Badge::from_call_id(1), MessageInfo::new(5, 0).unwrap()),
            (Badge::from_notifications(0b010), MessageInfo::empty()),
        ]);
        dispatcher.step().unwrap();
        dispatcher.step().unwrap();
        assert_eq!(
            dispatcher.platform().log().ops(),
            &[
                PlatformOp::Receive,
                PlatformOp::ReplyReceive { label: 6, count: 0 },
            ]
        );
        assert_eq!(dispatcher.handlers().events, vec!["Net1 label 5", "Net1"]);
    }

    #[test]
    fn test_no_reply_pending_uses_plain_receive() {
        let mut dispatcher = auth_dispatcher(&[
            (Badge::from_notifications(0b010), MessageInfo::empty()),
            (Badge::from_notifications(0b010), MessageInfo::empty()),
        ]);
        dispatcher.step().unwrap();
        dispatcher.step().unwrap();
        assert_eq!(
            dispatcher.platform().log().ops(),
            &[PlatformOp::Receive, PlatformOp::Receive]
        );
    }
}
