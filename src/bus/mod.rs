//! Bus module orchestrator following the RSB module specification.
//!
//! The seam to the engine's pub/sub transport. The session never talks to
//! the engine directly — only through the [`Bus`] trait defined here.

mod core;

pub use core::{channel_bus, Bus, ChannelBus, EnginePort, ScriptedBus};
