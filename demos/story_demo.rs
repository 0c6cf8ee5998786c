//! Parlor Story Demo
//!
//! A small fake engine runs on its own thread behind the channel bus,
//! publishing a status line and room text, then answering each submitted
//! command from a canned table. The session side is the real runtime:
//! typed input is appended with its paragraph break, engine updates are
//! routed to the content stream and header slots, and the header tracks the
//! stream once it outgrows the screen.
//!
//! ```bash
//! cargo run --example story_demo
//! ```

use std::thread;

use parlor::{
    channel_bus, CliDriver, CliDriverError, EnginePort, Result, SessionRuntime, Size, UiError,
};

const ROOM: &str = "West of House";

fn main() -> Result<()> {
    let (engine, ui) = channel_bus();
    let runtime = SessionRuntime::new(ui, Size::new(80, 24))?;

    let engine_thread = thread::spawn(move || run_engine(engine));

    let result = CliDriver::new(runtime).run().map_err(|err| match err {
        CliDriverError::Session(session_err) => session_err,
        other => UiError::Backend(other.to_string()),
    });

    // The bus hangs up when the runtime drops, which ends the engine loop.
    let _ = engine_thread.join();
    result
}

fn run_engine(engine: EnginePort) {
    let mut moves = 0u32;

    if engine.send_header(ROOM, "Score: 0  Moves: 0").is_err() {
        return;
    }
    let _ = engine.send_main(
        "You are standing in an open field west of a white house, \
         with a boarded front door.\nThere is a small mailbox here.\n",
    );

    while let Some(command) = engine.recv_input() {
        moves += 1;
        let reply = respond(command.trim());
        if engine.send_main(format!("{reply}\n")).is_err() {
            break;
        }
        if engine
            .send_header(ROOM, &format!("Score: 0  Moves: {moves}"))
            .is_err()
        {
            break;
        }
        if engine.request_input_focus().is_err() {
            break;
        }
    }
}

fn respond(command: &str) -> &'static str {
    match command.to_ascii_lowercase().as_str() {
        "open mailbox" => "Opening the small mailbox reveals a leaflet.",
        "read leaflet" => {
            "(Taken)\nWELCOME TO THE PARLOR DEMO!\nThis transcript is canned, \
             but the surface rendering it is not."
        }
        "look" => {
            "You are standing in an open field west of a white house, \
             with a boarded front door."
        }
        "" => "I beg your pardon?",
        _ => "Nothing happens.",
    }
}
