//! Lark card rendering for firing and resolved alerts.
//!
//! The firing card embeds a [`CardActionPayload`] in its resolve button. The
//! callback path rebuilds the resolved card from that payload alone, so the
//! resolved render is a pure function of the payload and repeated clicks
//! converge on the same message content.

pub mod elements;
pub mod format;
mod renderer;

pub use elements::{HeaderTemplate, LarkCard};
pub use renderer::{
    render_resolved, ActionKind, AlertCard, CardActionPayload, RenderedCard, RESOLVE_ACTION,
};
