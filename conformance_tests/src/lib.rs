//! # Conformance Tests
//!
//! End-to-end tests over the synthesized capability APIs and the unit
//! runtime, driven through the simulated platform.
//!
//! ## Philosophy
//!
//! - **Properties as code**: the wire-format, union-shape, ordering and
//!   discipline guarantees are written as executable assertions so they
//!   cannot drift silently.
//! - **Whole pipeline**: scenarios go topology description -> synthesis ->
//!   endpoint profile -> dispatcher -> operation log, the same path a real
//!   unit takes.

pub mod discipline;
pub mod generator;
pub mod ordering;
pub mod scenario;
pub mod unions;
pub mod wire;

/// Shared fixtures: the reference `auth` unit and its hand-written
/// generated-interface doubles.
pub mod test_helpers {
    use sim_platform::SimPlatform;
    use topology::{Topology, TopologyDoc};
    use unit_runtime::{
        Badge, CallSet, Dispatcher, EventHandlers, HandlerContext, MessageInfo, NotificationSet,
        UnitFault, UnitProfile,
    };

    /// The reference topology: `auth` holds interrupt line 212 on id 0, a
    /// notify+call channel to `net` on id 1, a call-only channel to
    /// `storage` on id 2, a writable mailbox and a read-only config page.
    pub const AUTH_TOPOLOGY: &str = r#"{
        "regions": [
            { "name": "mailbox_buf", "size": 4096 },
            { "name": "config_buf", "size": 256 }
        ],
        "units": [
            {
                "name": "auth",
                "priority": 10,
                "maps": [
                    { "region": "mailbox_buf", "name": "mailbox", "vaddr": 20971520 },
                    { "region": "config_buf", "name": "config", "vaddr": 20979712, "permission": "read" }
                ],
                "irqs": [{ "line": 212, "id": 0 }]
            },
            { "name": "net", "priority": 20 },
            { "name": "storage", "priority": 30 }
        ],
        "channels": [
            {
                "ends": [
                    { "unit": "auth", "id": 1, "kind": "both" },
                    { "unit": "net", "id": 5, "kind": "both" }
                ]
            },
            {
                "ends": [
                    { "unit": "auth", "id": 2, "kind": "call" },
                    { "unit": "storage", "id": 3, "kind": "call" }
                ]
            }
        ]
    }"#;

    pub fn auth_topology() -> Topology {
        let doc: TopologyDoc =
            serde_json::from_str(AUTH_TOPOLOGY).expect("reference topology parses");
        doc.into_topology().expect("reference topology validates")
    }

    pub fn auth_profile() -> UnitProfile {
        capgen::synthesize(&auth_topology(), "auth")
            .expect("reference synthesis succeeds")
            .profile()
    }

    /// What the generator emits for `auth`'s notification sources.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum AuthNotification {
        Irq212,
        Net1,
        Storage2,
        Unknown(u32),
    }

    impl NotificationSet for AuthNotification {
        fn from_bit(bit: u32) -> Self {
            match bit {
                0 => AuthNotification::Irq212,
                1 => AuthNotification::Net1,
                2 => AuthNotification::Storage2,
                _ => AuthNotification::Unknown(bit),
            }
        }
    }

    /// What the generator emits for `auth`'s call sources.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum AuthCall {
        Net1,
        Storage2,
        Unknown(u64),
    }

    impl CallSet for AuthCall {
        fn from_call_id(id: u64) -> Self {
            match id {
                1 => AuthCall::Net1,
                2 => AuthCall::Storage2,
                _ => AuthCall::Unknown(id),
            }
        }
    }

    /// Reference handlers: record every event, acknowledge interrupts,
    /// reply to calls with `label + 1`, fault on undeclared ids.
    #[derive(Debug, Default)]
    pub struct Recorder {
        pub events: Vec<String>,
    }

    impl EventHandlers<SimPlatform> for Recorder {
        type Notification = AuthNotification;
        type Call = AuthCall;

        fn on_notification(
            &mut self,
            source: AuthNotification,
            ctx: &mut HandlerContext<'_, SimPlatform>,
        ) -> Result<(), UnitFault> {
            self.events.push(format!("{source:?}"));
            match source {
                AuthNotification::Irq212 => {
                    let user = ctx.take_user()?;
                    let irq = ctx.mint_irq(&user, 0)?;
                    irq.acknowledge(ctx)?;
                    user.surrender(ctx)
                }
                AuthNotification::Unknown(bit) => Err(UnitFault::UnexpectedEvent {
                    raw: u64::from(bit),
                }),
                _ => Ok(()),
            }
        }

        fn on_call(
            &mut self,
            source: AuthCall,
            message: MessageInfo,
            _ctx: &mut HandlerContext<'_, SimPlatform>,
        ) -> Result<MessageInfo, UnitFault> {
            self.events
                .push(format!("{source:?} label {}", message.label()));
            match source {
                AuthCall::Unknown(id) => Err(UnitFault::UnexpectedEvent { raw: id }),
                _ => Ok(MessageInfo::new(message.label() + 1, 0).expect("reply label in range")),
            }
        }
    }

    /// A dispatcher for the reference unit with a scripted event sequence.
    pub fn auth_dispatcher(events: &[(Badge, MessageInfo)]) -> Dispatcher<SimPlatform, Recorder> {
        let mut sim = SimPlatform::new();
        for (badge, message) in events {
            sim.push_event(*badge, *message);
        }
        Dispatcher::new(sim, Recorder::default(), auth_profile())
    }
}
