//! `vtobj` memory management infrastructure
//!
//! This crate provides the two storage primitives the runtime is built on:
//!
//! - **Static arena**: program-lifetime storage for class descriptors, which
//!   are never freed (requires `static-arena` feature)
//! - **Slot arena**: a generational slot map used as the object heap, where
//!   every handle carries the generation of the slot it was issued for
//!   (requires `slots` feature)

#[cfg(feature = "static-arena")]
pub mod arena;

#[cfg(feature = "slots")]
pub mod slots;

#[cfg(feature = "static-arena")]
pub use arena::{ArenaStats, StaticArena, global_arena};

#[cfg(feature = "slots")]
pub use slots::{SlotArena, SlotId, SlotStats};
