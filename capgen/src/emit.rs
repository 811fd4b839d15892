//! Source emission
//!
//! Deterministic text assembly of the two generated artifacts: the typed
//! interface module a unit's application code imports, and the companion
//! low-level declarations for a real-platform build. Both carry a
//! do-not-edit banner.

use std::collections::BTreeSet;

use crate::synth::{UnitApi, VariantOrigin};

const BANNER: &str = "// @generated by capgen; do not edit.\n";

/// Renders the typed interface module for a unit.
///
/// Emitted items: the notification and call unions (ascending id, with a
/// trailing catch-all), their decoding impls, the `profile()` endpoint
/// table, one mint helper per granted operation, and the named memory
/// aggregate when the unit declares mappings.
pub fn render_api(api: &UnitApi) -> String {
    let mut out = String::from(BANNER);
    out.push_str(&format!(
        "//! Typed capability interface for unit `{}`.\n\n",
        api.unit()
    ));
    out.push_str(&render_imports(api));
    out.push_str(&render_notification_enum(api));
    out.push_str(&render_call_enum(api));
    out.push_str(&render_profile_fn(api));
    out.push_str(&render_mint_helpers(api));
    out.push_str(&render_memory_struct(api));
    out
}

fn render_imports(api: &UnitApi) -> String {
    let mut items: BTreeSet<&str> = ["CallSet", "NotificationSet", "UnitProfile"].into();
    let mints = api.ends().iter().any(|e| e.can_notify || e.can_call) || !api.irqs().is_empty();
    if mints {
        items.extend(["HandlerContext", "Platform", "UnitFault", "UserCap"]);
    }
    if api.ends().iter().any(|e| e.can_notify) {
        items.insert("NotifyCap");
    }
    if api.ends().iter().any(|e| e.can_call) {
        items.insert("CallCap");
    }
    if !api.irqs().is_empty() {
        items.insert("IrqCap");
    }
    if !api.mappings().is_empty() {
        items.extend(["MemoryCaps", "UnitFault"]);
        if api.mappings().iter().any(|m| !m.writable) {
            items.insert("ReadMemCap");
        }
        if api.mappings().iter().any(|m| m.writable) {
            items.insert("WriteMemCap");
        }
    }
    let list: Vec<&str> = items.into_iter().collect();
    format!("use unit_runtime::{{{}}};\n\n", list.join(", "))
}

fn variant_doc(origin: &VariantOrigin, id: u8) -> String {
    match origin {
        VariantOrigin::Channel { peer } => {
            format!("    /// Channel end {id} toward `{peer}`.\n")
        }
        VariantOrigin::Irq { line } => {
            format!("    /// Interrupt line {line}, bound to id {id}.\n")
        }
    }
}

fn render_notification_enum(api: &UnitApi) -> String {
    let mut out = format!(
        "/// Notification sources declared by `{}`.\n\
         #[derive(Debug, Clone, Copy, PartialEq, Eq)]\n\
         pub enum Notification {{\n",
        api.unit()
    );
    for variant in api.notification_variants() {
        out.push_str(&variant_doc(&variant.origin, variant.id));
        out.push_str(&format!("    {},\n", variant.ident));
    }
    out.push_str(
        "    /// An id with no declared endpoint.\n    Unknown(u32),\n}\n\n\
         impl NotificationSet for Notification {\n    fn from_bit(bit: u32) -> Self {\n        match bit {\n",
    );
    for variant in api.notification_variants() {
        out.push_str(&format!(
            "            {} => Notification::{},\n",
            variant.id, variant.ident
        ));
    }
    out.push_str("            _ => Notification::Unknown(bit),\n        }\n    }\n}\n\n");
    out
}

fn render_call_enum(api: &UnitApi) -> String {
    let mut out = format!(
        "/// Call sources declared by `{}`.\n\
         #[derive(Debug, Clone, Copy, PartialEq, Eq)]\n\
         pub enum Call {{\n",
        api.unit()
    );
    for variant in api.call_variants() {
        out.push_str(&variant_doc(&variant.origin, variant.id));
        out.push_str(&format!("    {},\n", variant.ident));
    }
    out.push_str(
        "    /// An id with no declared call-capable endpoint.\n    Unknown(u64),\n}\n\n\
         impl CallSet for Call {\n    fn from_call_id(id: u64) -> Self {\n        match id {\n",
    );
    for variant in api.call_variants() {
        out.push_str(&format!(
            "            {} => Call::{},\n",
            variant.id, variant.ident
        ));
    }
    out.push_str("            _ => Call::Unknown(id),\n        }\n    }\n}\n\n");
    out
}

fn render_profile_fn(api: &UnitApi) -> String {
    let mut out = format!(
        "/// The endpoint table for `{}`.\n\
         pub fn profile() -> UnitProfile {{\n    UnitProfile::new(\"{}\")\n",
        api.unit(),
        api.unit()
    );
    for end in api.ends() {
        let builder = match (end.can_notify, end.can_call) {
            (true, true) => format!("with_duplex_end({})", end.id),
            (true, false) => format!("with_notify_end({})", end.id),
            _ => format!("with_call_end({})", end.id),
        };
        out.push_str(&format!("        .{builder}\n"));
    }
    for irq in api.irqs() {
        out.push_str(&format!("        .with_irq({}, {})\n", irq.id, irq.line));
    }
    for mapping in api.mappings() {
        let builder = if mapping.writable {
            "with_write_mapping"
        } else {
            "with_read_mapping"
        };
        out.push_str(&format!(
            "        .{}(\"{}\", {})\n",
            builder, mapping.name, mapping.length
        ));
    }
    out.push_str("}\n\n");
    out
}

fn render_mint_helpers(api: &UnitApi) -> String {
    let mut out = String::new();
    for end in api.ends() {
        if end.can_notify {
            out.push_str(&format!(
                "/// Mints the one-shot notify capability toward `{peer}` (channel {id}).\n\
                 pub fn notify_{peer}_{id}<P: Platform>(\n\
                 \x20   ctx: &mut HandlerContext<'_, P>,\n\
                 \x20   user: &UserCap,\n\
                 ) -> Result<NotifyCap, UnitFault> {{\n\
                 \x20   ctx.mint_notify(user, {id})\n\
                 }}\n\n",
                peer = end.peer,
                id = end.id
            ));
        }
        if end.can_call {
            out.push_str(&format!(
                "/// Mints the one-shot call capability toward `{peer}` (channel {id}).\n\
                 pub fn call_{peer}_{id}<P: Platform>(\n\
                 \x20   ctx: &mut HandlerContext<'_, P>,\n\
                 \x20   user: &UserCap,\n\
                 ) -> Result<CallCap, UnitFault> {{\n\
                 \x20   ctx.mint_call(user, {id})\n\
                 }}\n\n",
                peer = end.peer,
                id = end.id
            ));
        }
    }
    for irq in api.irqs() {
        out.push_str(&format!(
            "/// Mints the acknowledge capability for interrupt line {line} (id {id}).\n\
             pub fn irq_{line}<P: Platform>(\n\
             \x20   ctx: &mut HandlerContext<'_, P>,\n\
             \x20   user: &UserCap,\n\
             ) -> Result<IrqCap, UnitFault> {{\n\
             \x20   ctx.mint_irq(user, {id})\n\
             }}\n\n",
            line = irq.line,
            id = irq.id
        ));
    }
    out
}

fn render_memory_struct(api: &UnitApi) -> String {
    if api.mappings().is_empty() {
        return String::new();
    }
    let mut out = String::from(
        "/// The unit's memory capabilities, one field per mapping.\npub struct Memory<'a> {\n",
    );
    for mapping in api.mappings() {
        let ty = if mapping.writable {
            "WriteMemCap"
        } else {
            "ReadMemCap"
        };
        out.push_str(&format!("    pub {}: {}<'a>,\n", mapping.name, ty));
    }
    out.push_str(
        "}\n\nimpl<'a> Memory<'a> {\n\
         \x20   /// Splits the invocation's aggregate into named capabilities.\n\
         \x20   pub fn from_caps(mut caps: MemoryCaps<'a>) -> Result<Self, UnitFault> {\n\
         \x20       Ok(Self {\n",
    );
    for mapping in api.mappings() {
        let taker = if mapping.writable {
            "take_write"
        } else {
            "take_read"
        };
        out.push_str(&format!(
            "            {}: caps.{}(\"{}\")?,\n",
            mapping.name, taker, mapping.name
        ));
    }
    out.push_str("        })\n    }\n}\n");
    out
}

/// Renders the companion low-level declarations file: mapping base-address
/// constants and the extern kernel primitives a real-platform build links
/// against.
pub fn render_sys(api: &UnitApi) -> String {
    let mut out = String::from(BANNER);
    out.push_str(&format!(
        "//! Low-level kernel bindings for unit `{}`.\n\
         //!\n\
         //! The simulated platform never links this file.\n\n",
        api.unit()
    ));
    for mapping in api.mappings() {
        let upper = mapping.name.to_ascii_uppercase();
        out.push_str(&format!(
            "/// Base virtual address of mapping `{}`.\n\
             pub const {}_VADDR: u64 = {:#x};\n\
             /// Declared length of mapping `{}`.\n\
             pub const {}_LENGTH: u64 = {};\n\n",
            mapping.name, upper, mapping.vaddr, mapping.name, upper, mapping.length
        ));
    }
    out.push_str(
        "extern \"C\" {\n\
         \x20   pub fn sys_notify(channel: u8);\n\
         \x20   pub fn sys_irq_ack(channel: u8);\n\
         \x20   pub fn sys_ppcall(channel: u8, msginfo: u64) -> u64;\n\
         \x20   pub fn sys_recv(msginfo: *mut u64) -> u64;\n\
         \x20   pub fn sys_replyrecv(reply: u64, msginfo: *mut u64) -> u64;\n\
         \x20   pub fn sys_mr_set(index: u8, value: u64);\n\
         \x20   pub fn sys_mr_get(index: u8) -> u64;\n\
         }\n",
    );
    out
}
