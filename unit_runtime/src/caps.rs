//! Single-use runtime capabilities and the per-invocation mint
//!
//! Every operation a handler performs flows through a capability minted by
//! its [`HandlerContext`]. Consuming operations take the capability by
//! value, so using one twice is a compile error; surrendering discharges a
//! capability without exercising it. Whatever is neither consumed nor
//! surrendered fails the ledger audit after the handler returns.

use crate::error::{MintError, UnitFault};
use crate::ledger::{CapLedger, MintId};
use crate::memory::{ReadView, WriteView};
use crate::message::MessageInfo;
use crate::platform::Platform;
use crate::profile::UnitProfile;

/// Proof that the holder is inside a live handler invocation.
///
/// The user capability is the root authority: outbound capabilities can
/// only be minted against a live one. It is minted once per invocation and
/// must be surrendered like any other capability.
#[derive(Debug)]
pub struct UserCap {
    mint: MintId,
}

impl UserCap {
    pub(crate) fn new(mint: MintId) -> Self {
        Self { mint }
    }

    /// Discharges the capability without exercising it.
    pub fn surrender<P: Platform>(self, ctx: &mut HandlerContext<'_, P>) -> Result<(), UnitFault> {
        ctx.ledger.discharge(self.mint)?;
        Ok(())
    }
}

/// The right to send exactly one notification on a channel end.
#[derive(Debug)]
pub struct NotifyCap {
    channel: u8,
    mint: MintId,
}

impl NotifyCap {
    /// The local channel id this capability notifies.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Sends the notification, consuming the capability.
    pub fn notify<P: Platform>(self, ctx: &mut HandlerContext<'_, P>) -> Result<(), UnitFault> {
        ctx.ledger.discharge(self.mint)?;
        ctx.platform.notify(self.channel)?;
        Ok(())
    }

    /// Discharges the capability without sending.
    pub fn surrender<P: Platform>(self, ctx: &mut HandlerContext<'_, P>) -> Result<(), UnitFault> {
        ctx.ledger.discharge(self.mint)?;
        Ok(())
    }
}

/// The right to make exactly one protected call on a channel end.
#[derive(Debug)]
pub struct CallCap {
    channel: u8,
    mint: MintId,
}

impl CallCap {
    /// The local channel id this capability calls.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Makes the call and returns the callee's reply, consuming the
    /// capability.
    pub fn call<P: Platform>(
        self,
        ctx: &mut HandlerContext<'_, P>,
        message: MessageInfo,
    ) -> Result<MessageInfo, UnitFault> {
        ctx.ledger.discharge(self.mint)?;
        let reply = ctx.platform.protected_call(self.channel, message)?;
        Ok(reply)
    }

    /// Discharges the capability without calling.
    pub fn surrender<P: Platform>(self, ctx: &mut HandlerContext<'_, P>) -> Result<(), UnitFault> {
        ctx.ledger.discharge(self.mint)?;
        Ok(())
    }
}

/// The obligation to resolve one pending interrupt.
///
/// Acknowledging re-arms the line; postponing discharges the capability
/// and leaves the interrupt masked until some later invocation
/// acknowledges it.
#[derive(Debug)]
pub struct IrqCap {
    channel: u8,
    line: u32,
    mint: MintId,
}

impl IrqCap {
    /// The local channel id the interrupt is bound to.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// The hardware interrupt line.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Acknowledges the interrupt, re-arming the line.
    pub fn acknowledge<P: Platform>(
        self,
        ctx: &mut HandlerContext<'_, P>,
    ) -> Result<(), UnitFault> {
        ctx.ledger.discharge(self.mint)?;
        ctx.platform.irq_ack(self.channel)?;
        Ok(())
    }

    /// Discharges the capability without acknowledging. The line stays
    /// masked.
    pub fn postpone<P: Platform>(self, ctx: &mut HandlerContext<'_, P>) -> Result<(), UnitFault> {
        ctx.ledger.discharge(self.mint)?;
        Ok(())
    }
}

/// A read capability over one memory mapping.
///
/// Views may be taken any number of times; the capability itself is still
/// discharged exactly once, by surrender.
#[derive(Debug)]
pub struct ReadMemCap<'a> {
    name: &'a str,
    data: &'a [u8],
    mint: MintId,
}

impl<'a> ReadMemCap<'a> {
    pub(crate) fn new(name: &'a str, data: &'a [u8], mint: MintId) -> Self {
        Self { name, data, mint }
    }

    /// The mapping's declared name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Takes a read view. Does not discharge the capability.
    pub fn read_view(&self) -> ReadView<'a> {
        ReadView::new(self.name, self.data)
    }

    /// Discharges the capability.
    pub fn surrender<P: Platform>(self, ctx: &mut HandlerContext<'_, P>) -> Result<(), UnitFault> {
        ctx.ledger.discharge(self.mint)?;
        Ok(())
    }
}

/// A write capability over one memory mapping.
#[derive(Debug)]
pub struct WriteMemCap<'a> {
    name: &'a str,
    data: &'a mut [u8],
    mint: MintId,
}

impl<'a> WriteMemCap<'a> {
    pub(crate) fn new(name: &'a str, data: &'a mut [u8], mint: MintId) -> Self {
        Self { name, data, mint }
    }

    /// The mapping's declared name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Consumes the capability for this invocation's one write view.
    pub fn write_view<P: Platform>(
        self,
        ctx: &mut HandlerContext<'_, P>,
    ) -> Result<WriteView<'a>, UnitFault> {
        ctx.ledger.discharge(self.mint)?;
        Ok(WriteView::new(self.name, self.data))
    }

    /// Discharges the capability without taking a view.
    pub fn surrender<P: Platform>(self, ctx: &mut HandlerContext<'_, P>) -> Result<(), UnitFault> {
        ctx.ledger.discharge(self.mint)?;
        Ok(())
    }
}

/// One memory capability, read-only or read-write per the declared
/// mapping permission.
#[derive(Debug)]
pub enum MemCap<'a> {
    Read(ReadMemCap<'a>),
    Write(WriteMemCap<'a>),
}

impl MemCap<'_> {
    fn name(&self) -> &str {
        match self {
            MemCap::Read(cap) => cap.name(),
            MemCap::Write(cap) => cap.name(),
        }
    }

    fn mint(&self) -> MintId {
        match self {
            MemCap::Read(cap) => cap.mint,
            MemCap::Write(cap) => cap.mint,
        }
    }
}

/// The aggregate of all memory capabilities minted for one invocation.
///
/// Individual capabilities taken out of the aggregate must be discharged
/// by their holder; surrendering the aggregate discharges everything still
/// inside it.
#[derive(Debug)]
pub struct MemoryCaps<'a> {
    caps: Vec<MemCap<'a>>,
}

impl<'a> MemoryCaps<'a> {
    pub(crate) fn new(caps: Vec<MemCap<'a>>) -> Self {
        Self { caps }
    }

    /// Names of the capabilities still held, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.caps.iter().map(|c| c.name()).collect()
    }

    /// Takes the read capability for the named mapping.
    pub fn take_read(&mut self, name: &str) -> Result<ReadMemCap<'a>, UnitFault> {
        let index = self.position(name)?;
        match self.caps.remove(index) {
            MemCap::Read(cap) => Ok(cap),
            cap @ MemCap::Write(_) => {
                self.caps.insert(index, cap);
                Err(MintError::MappingPermission {
                    name: name.to_string(),
                    requested: "read",
                }
                .into())
            }
        }
    }

    /// Takes the write capability for the named mapping.
    pub fn take_write(&mut self, name: &str) -> Result<WriteMemCap<'a>, UnitFault> {
        let index = self.position(name)?;
        match self.caps.remove(index) {
            MemCap::Write(cap) => Ok(cap),
            cap @ MemCap::Read(_) => {
                self.caps.insert(index, cap);
                Err(MintError::MappingPermission {
                    name: name.to_string(),
                    requested: "write",
                }
                .into())
            }
        }
    }

    /// Discharges every capability still in the aggregate.
    pub fn surrender<P: Platform>(self, ctx: &mut HandlerContext<'_, P>) -> Result<(), UnitFault> {
        for cap in self.caps {
            ctx.ledger.discharge(cap.mint())?;
        }
        Ok(())
    }

    fn position(&self, name: &str) -> Result<usize, UnitFault> {
        self.caps
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| {
                MintError::UnknownMapping {
                    name: name.to_string(),
                }
                .into()
            })
    }
}

/// The per-invocation capability mint handed to every handler.
///
/// The context is the only path from a handler to the platform: outbound
/// capabilities are minted here against the unit's declared endpoints, and
/// the invocation's user and memory capabilities are taken from it.
pub struct HandlerContext<'a, P: Platform> {
    platform: &'a mut P,
    profile: &'a UnitProfile,
    ledger: &'a mut CapLedger,
    user: Option<UserCap>,
    memory: Option<MemoryCaps<'a>>,
}

impl<'a, P: Platform> HandlerContext<'a, P> {
    pub(crate) fn new(
        platform: &'a mut P,
        profile: &'a UnitProfile,
        ledger: &'a mut CapLedger,
        user: UserCap,
        memory: MemoryCaps<'a>,
    ) -> Self {
        Self {
            platform,
            profile,
            ledger,
            user: Some(user),
            memory: Some(memory),
        }
    }

    /// The unit's declared endpoint table.
    pub fn profile(&self) -> &UnitProfile {
        self.profile
    }

    /// Takes this invocation's user capability.
    pub fn take_user(&mut self) -> Result<UserCap, UnitFault> {
        self.user
            .take()
            .ok_or_else(|| MintError::UserAlreadyTaken.into())
    }

    /// Takes this invocation's memory capability aggregate.
    pub fn take_memory(&mut self) -> Result<MemoryCaps<'a>, UnitFault> {
        self.memory
            .take()
            .ok_or_else(|| MintError::MemoryAlreadyTaken.into())
    }

    /// Mints a notify capability against a live user capability.
    pub fn mint_notify(&mut self, user: &UserCap, channel: u8) -> Result<NotifyCap, UnitFault> {
        self.check_user(user)?;
        if !self.profile.allows_notify(channel) {
            return Err(MintError::NotifyNotDeclared {
                unit: self.profile.unit().to_string(),
                channel,
            }
            .into());
        }
        let mint = self.ledger.mint(format!("notify:{channel}"));
        Ok(NotifyCap { channel, mint })
    }

    /// Mints a call capability against a live user capability.
    pub fn mint_call(&mut self, user: &UserCap, channel: u8) -> Result<CallCap, UnitFault> {
        self.check_user(user)?;
        if !self.profile.allows_call(channel) {
            return Err(MintError::CallNotDeclared {
                unit: self.profile.unit().to_string(),
                channel,
            }
            .into());
        }
        let mint = self.ledger.mint(format!("call:{channel}"));
        Ok(CallCap { channel, mint })
    }

    /// Mints an interrupt capability against a live user capability.
    pub fn mint_irq(&mut self, user: &UserCap, channel: u8) -> Result<IrqCap, UnitFault> {
        self.check_user(user)?;
        let line = match self.profile.irq(channel) {
            Some(irq) => irq.line,
            None => {
                return Err(MintError::IrqNotDeclared {
                    unit: self.profile.unit().to_string(),
                    channel,
                }
                .into())
            }
        };
        let mint = self.ledger.mint(format!("irq:{channel}"));
        Ok(IrqCap {
            channel,
            line,
            mint,
        })
    }

    /// Reads a message register, for unpacking call payloads.
    pub fn mr_read(&mut self, index: u8) -> Result<u64, UnitFault> {
        Ok(self.platform.mr_read(index)?)
    }

    /// Writes a message register, for staging call and reply payloads.
    pub fn mr_write(&mut self, index: u8, value: u64) -> Result<(), UnitFault> {
        Ok(self.platform.mr_write(index, value)?)
    }

    /// Discharges the user and memory capabilities the handler never took.
    pub(crate) fn surrender_unused(&mut self) -> Result<(), UnitFault> {
        if let Some(user) = self.user.take() {
            self.ledger.discharge(user.mint)?;
        }
        if let Some(memory) = self.memory.take() {
            for cap in memory.caps {
                self.ledger.discharge(cap.mint())?;
            }
        }
        Ok(())
    }

    fn check_user(&self, user: &UserCap) -> Result<(), UnitFault> {
        if self.ledger.is_live(user.mint) {
            Ok(())
        } else {
            Err(MintError::UserNotLive.into())
        }
    }
}
