use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::error::{Result, UiError};
use crate::update::Update;

/// Session-side handle to the engine transport.
///
/// Delivery contract: every record the engine emits arrives exactly once,
/// in emission order, to the single holder of this handle. `notify_input`
/// is the producer direction — the player's submitted text travelling back
/// to the engine.
pub trait Bus {
    /// Next pending update record, if any. Never blocks.
    fn try_recv(&mut self) -> Option<Update>;

    /// Tell the engine that new text was authored locally.
    fn notify_input(&mut self, text: &str) -> Result<()>;
}

/// Engine-side ports of a [`channel_bus`] pair.
pub struct EnginePort {
    updates: Sender<Update>,
    input: Receiver<String>,
}

impl EnginePort {
    /// Publish one update record to the session.
    pub fn send(&self, update: Update) -> Result<()> {
        self.updates.send(update).map_err(|_| UiError::BusClosed)
    }

    /// Publish story text to the content stream.
    pub fn send_main(&self, content: impl Into<String>) -> Result<()> {
        self.send(Update::main(content))
    }

    /// Publish the status line the way the engine does: left slot first,
    /// then right, as two separate records.
    pub fn send_header(&self, left: &str, right: &str) -> Result<()> {
        self.send(Update::left(left))?;
        self.send(Update::right(right))
    }

    /// Ask the session to move focus back to the input line.
    pub fn request_input_focus(&self) -> Result<()> {
        self.send(Update::input())
    }

    /// Next line of player input, if one has been submitted. Never blocks.
    pub fn try_recv_input(&self) -> Option<String> {
        self.input.try_recv().ok()
    }

    /// Block until the player submits a line. `None` once the session hangs up.
    pub fn recv_input(&self) -> Option<String> {
        self.input.recv().ok()
    }
}

/// Session half of a connected channel pair.
///
/// Owning this value *is* the subscription: the receiver cannot be shared,
/// so exactly one consumer sees the update stream for the session lifetime.
pub struct ChannelBus {
    updates: Receiver<Update>,
    input: Sender<String>,
}

/// Create a connected engine/session pair backed by std channels.
pub fn channel_bus() -> (EnginePort, ChannelBus) {
    let (update_tx, update_rx) = mpsc::channel();
    let (input_tx, input_rx) = mpsc::channel();
    (
        EnginePort {
            updates: update_tx,
            input: input_rx,
        },
        ChannelBus {
            updates: update_rx,
            input: input_tx,
        },
    )
}

impl Bus for ChannelBus {
    fn try_recv(&mut self) -> Option<Update> {
        // A hung-up engine simply stops producing; that is not an error
        // surface the session needs to see.
        self.updates.try_recv().ok()
    }

    fn notify_input(&mut self, text: &str) -> Result<()> {
        self.input
            .send(text.to_string())
            .map_err(|_| UiError::BusClosed)
    }
}

/// Canned update feed for tests and scripted sessions.
///
/// Pops records in insertion order and records every input notification so
/// assertions can inspect what the engine would have received.
#[derive(Debug, Default)]
pub struct ScriptedBus {
    feed: VecDeque<Update>,
    notified: Vec<String>,
}

impl ScriptedBus {
    pub fn new(feed: impl IntoIterator<Item = Update>) -> Self {
        Self {
            feed: feed.into_iter().collect(),
            notified: Vec::new(),
        }
    }

    pub fn notified(&self) -> &[String] {
        &self.notified
    }
}

impl Bus for ScriptedBus {
    fn try_recv(&mut self) -> Option<Update> {
        self.feed.pop_front()
    }

    fn notify_input(&mut self, text: &str) -> Result<()> {
        self.notified.push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::Source;

    #[test]
    fn channel_pair_delivers_in_order() {
        let (engine, mut bus) = channel_bus();
        engine.send_header("West of House", "Score: 0").unwrap();
        engine.send_main("You are standing in an open field.").unwrap();

        assert_eq!(bus.try_recv().unwrap().source, Source::Left);
        assert_eq!(bus.try_recv().unwrap().source, Source::Right);
        assert_eq!(bus.try_recv().unwrap().source, Source::Main);
        assert!(bus.try_recv().is_none());
    }

    #[test]
    fn input_notifications_reach_the_engine() {
        let (engine, mut bus) = channel_bus();
        bus.notify_input("open mailbox").unwrap();
        assert_eq!(engine.try_recv_input().as_deref(), Some("open mailbox"));
        assert!(engine.try_recv_input().is_none());
    }

    #[test]
    fn hung_up_session_surfaces_bus_closed() {
        let (engine, bus) = channel_bus();
        drop(bus);
        assert!(matches!(
            engine.send_main("anyone there?"),
            Err(UiError::BusClosed)
        ));
    }

    #[test]
    fn scripted_bus_records_notifications() {
        let mut bus = ScriptedBus::new([Update::main("hello")]);
        assert!(bus.try_recv().is_some());
        assert!(bus.try_recv().is_none());
        bus.notify_input("go north").unwrap();
        assert_eq!(bus.notified(), ["go north"]);
    }
}
