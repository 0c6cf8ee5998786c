//! Chat-style terminal surface for the RustyZ interactive-fiction engine.
//!
//! The engine pushes `{source, content}` update records over a bus; this
//! crate routes each record to one of three render regions — a main content
//! stream and two header slots — sends the player's typed input back, and
//! keeps the header overlay from obscuring appended content as the stream
//! grows. The modules follow the RSB `MODULE_SPEC` pattern: a `mod.rs`
//! orchestrator re-exporting from a private `core` module.

pub mod bus;
pub mod cursor;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod input;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod reconcile;
pub mod region;
pub mod render;
pub mod runtime;
pub mod update;
pub mod width;

pub use bus::{channel_bus, Bus, ChannelBus, EnginePort, ScriptedBus};
pub use dispatch::OutputDispatcher;
pub use error::{Result, UiError};
pub use geometry::{Rect, Size};
pub use input::{Focus, InputLine, PROMPT};
pub use layout::{solve, ScreenPlan, HEADER_ROWS, INPUT_ROWS, MIN_HEIGHT, MIN_WIDTH};
pub use logging::{
    LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult, MemorySink,
};
pub use metrics::{MetricSnapshot, SessionMetrics};
pub use reconcile::{reconcile, Correction, Measure};
pub use region::{Node, Region, RegionSet, RegionSnapshot, Slot};
pub use render::{AnsiRenderer, RendererSettings};
pub use runtime::driver::{CliDriver, CliDriverError, DriverResult};
pub use runtime::{
    EventFlow, SessionConfig, SessionContext, SessionEvent, SessionRuntime,
};
pub use update::{Source, Update};
pub use width::display_width;
