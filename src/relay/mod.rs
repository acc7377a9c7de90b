//! The translation decision path shared by the hook and the on-demand API.
//!
//! - `resolve`: pick the effective source language, detecting only for `auto`
//! - `dispatch`: call the translator, apply the skip rules, build the
//!   annotated message

mod dispatch;
mod resolve;

pub use dispatch::{format_annotated, Dispatcher, SkipReason, Translation};
pub use resolve::resolve_source_language;
