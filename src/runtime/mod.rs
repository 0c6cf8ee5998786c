//! The session loop: terminal events in, engine updates routed, dirty
//! regions painted, overlap reconciled after every frame that grew the
//! content stream.

use std::io::Write;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use serde_json::json;

use crate::bus::Bus;
use crate::dispatch::OutputDispatcher;
use crate::error::Result;
use crate::geometry::Size;
use crate::input::{Focus, InputLine};
use crate::layout::{self, ScreenPlan, HEADER_ROWS};
use crate::logging::{event_with_fields, json_kv, LogLevel, Logger};
use crate::metrics::SessionMetrics;
use crate::reconcile::{reconcile, Correction, Measure};
use crate::region::RegionSet;
use crate::render::{wrap_to_width, AnsiRenderer};
use crate::update::Update;

pub mod driver;

/// Configuration knobs for the session loop.
#[derive(Clone)]
pub struct SessionConfig {
    /// Interval between synthetic tick events.
    pub tick_interval: Duration,
    /// Optional structured logger used by the session and the dispatcher.
    pub logger: Option<Logger>,
    /// Interval between metrics snapshot emissions. Zero disables snapshots.
    pub metrics_interval: Duration,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            logger: None,
            metrics_interval: Duration::from_secs(5),
            metrics_target: "parlor::session.metrics".to_string(),
        }
    }
}

/// High-level events driving the session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Tick { elapsed: Duration },
    Key(KeyEvent),
    Mouse(MouseEvent),
    Paste(String),
    FocusGained,
    FocusLost,
    Resize(Size),
    /// An update record from the engine bus.
    Engine(Update),
}

/// Whether an event was absorbed by its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Continue,
    Consumed,
}

/// Mutable view of the session handed to the input handler and the
/// dispatcher for the duration of one event. Constructed by the runtime;
/// there is no ambient state to look up.
pub struct SessionContext<'a> {
    regions: &'a mut RegionSet,
    focus: &'a mut Focus,
    bus: &'a mut dyn Bus,
    metrics: &'a mut SessionMetrics,
    reconcile_requested: bool,
    exit_requested: bool,
    input_changed: bool,
}

impl<'a> SessionContext<'a> {
    pub(crate) fn new(
        regions: &'a mut RegionSet,
        focus: &'a mut Focus,
        bus: &'a mut dyn Bus,
        metrics: &'a mut SessionMetrics,
    ) -> Self {
        Self {
            regions,
            focus,
            bus,
            metrics,
            reconcile_requested: false,
            exit_requested: false,
            input_changed: false,
        }
    }

    pub fn regions(&mut self) -> &mut RegionSet {
        self.regions
    }

    pub fn metrics(&mut self) -> &mut SessionMetrics {
        self.metrics
    }

    pub fn focus_input(&mut self) {
        self.focus.focus();
        self.input_changed = true;
    }

    pub fn blur_input(&mut self) {
        self.focus.blur();
        self.input_changed = true;
    }

    /// Forward locally authored text to the engine.
    pub fn notify_input(&mut self, text: &str) -> Result<()> {
        self.bus.notify_input(text)
    }

    /// Ask for a reconcile pass after the next frame is flushed.
    pub fn request_reconcile(&mut self) {
        self.reconcile_requested = true;
    }

    /// Terminate the session at the end of the current frame.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Flag the input line for repaint.
    pub fn mark_input_changed(&mut self) {
        self.input_changed = true;
    }

    pub fn reconcile_requested(&self) -> bool {
        self.reconcile_requested
    }

    pub fn input_changed(&self) -> bool {
        self.input_changed
    }

    fn into_outcome(self) -> ContextOutcome {
        ContextOutcome {
            reconcile_requested: self.reconcile_requested,
            exit_requested: self.exit_requested,
            input_changed: self.input_changed,
        }
    }
}

struct ContextOutcome {
    reconcile_requested: bool,
    exit_requested: bool,
    input_changed: bool,
}

/// The session runtime: owns the screen plan, the render regions, the two
/// event-driven components, and the bus half of the engine transport.
pub struct SessionRuntime {
    plan: ScreenPlan,
    regions: RegionSet,
    renderer: AnsiRenderer,
    dispatcher: OutputDispatcher,
    input: InputLine,
    focus: Focus,
    bus: Box<dyn Bus>,
    config: SessionConfig,
    metrics: SessionMetrics,
    correction: Correction,
    reconcile_requested: bool,
    input_dirty: bool,
    should_exit: bool,
    start_instant: Option<Instant>,
    last_metrics_emit: Option<Instant>,
}

impl SessionRuntime {
    pub fn new(bus: impl Bus + 'static, initial_size: Size) -> Result<Self> {
        Self::with_config(bus, initial_size, SessionConfig::default())
    }

    pub fn with_config(
        bus: impl Bus + 'static,
        initial_size: Size,
        config: SessionConfig,
    ) -> Result<Self> {
        let plan = layout::solve(initial_size)?;
        let mut regions = RegionSet::new();
        regions.sync_layout(&plan);
        let dispatcher = OutputDispatcher::with_logger(config.logger.clone());

        Ok(Self {
            plan,
            regions,
            renderer: AnsiRenderer::with_default(),
            dispatcher,
            input: InputLine::new(),
            focus: Focus::default(),
            bus: Box::new(bus),
            config,
            metrics: SessionMetrics::new(),
            correction: Correction::default(),
            reconcile_requested: false,
            input_dirty: false,
            should_exit: false,
            start_instant: None,
            last_metrics_emit: None,
        })
    }

    pub fn config_mut(&mut self) -> &mut SessionConfig {
        &mut self.config
    }

    pub fn plan(&self) -> ScreenPlan {
        self.plan
    }

    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    pub fn input(&self) -> &InputLine {
        &self.input
    }

    pub fn is_input_focused(&self) -> bool {
        self.focus.is_focused()
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// The correction currently applied at draw time. Forward-only: it
    /// changes when a pass finds overflow and persists otherwise.
    pub fn correction(&self) -> Correction {
        self.correction
    }

    /// Re-solve the plan for a new terminal size.
    pub fn resize(&mut self, size: Size) -> Result<()> {
        self.handle_resize(size)
    }

    /// Run against the live terminal until exit is requested.
    pub fn run(&mut self, stdout: &mut impl Write) -> Result<()> {
        self.bootstrap(stdout)?;
        let mut last_tick = Instant::now();

        while !self.should_exit {
            self.drain_bus()?;
            self.render_if_needed(stdout)?;

            let timeout = self
                .config
                .tick_interval
                .checked_sub(last_tick.elapsed())
                .unwrap_or(Duration::ZERO);

            if event::poll(timeout)? {
                let raw = event::read()?;
                if let Some(session_event) = self.map_event(raw)? {
                    self.dispatch_event(session_event)?;
                    self.render_if_needed(stdout)?;
                }
                if self.should_exit {
                    break;
                }
            }

            if last_tick.elapsed() >= self.config.tick_interval {
                let now = Instant::now();
                let elapsed = now.duration_since(last_tick);
                last_tick = now;
                self.dispatch_event(SessionEvent::Tick { elapsed })?;
                self.render_if_needed(stdout)?;
            }

            self.maybe_emit_metrics();
        }

        self.finalize();
        Ok(())
    }

    /// Run a deterministic event script, draining the bus between events.
    /// Used by tests and the bench harness.
    pub fn run_scripted<I>(&mut self, stdout: &mut impl Write, events: I) -> Result<()>
    where
        I: IntoIterator<Item = SessionEvent>,
    {
        self.bootstrap(stdout)?;
        for session_event in events {
            self.drain_bus()?;
            if let SessionEvent::Resize(size) = session_event {
                self.handle_resize(size)?;
            }
            self.dispatch_event(session_event)?;
            self.render_if_needed(stdout)?;
            if self.should_exit {
                break;
            }
        }
        self.drain_bus()?;
        self.render_if_needed(stdout)?;
        self.finalize();
        Ok(())
    }

    fn drain_bus(&mut self) -> Result<()> {
        while let Some(update) = self.bus.try_recv() {
            self.dispatch_event(SessionEvent::Engine(update))?;
        }
        Ok(())
    }

    fn dispatch_event(&mut self, session_event: SessionEvent) -> Result<()> {
        let plan = self.plan;
        let (flow, outcome) = {
            let mut ctx = SessionContext::new(
                &mut self.regions,
                &mut self.focus,
                self.bus.as_mut(),
                &mut self.metrics,
            );

            let flow = match &session_event {
                SessionEvent::Key(key) => {
                    if is_exit_chord(key) {
                        ctx.request_exit();
                        EventFlow::Consumed
                    } else {
                        self.input.handle_key(&mut ctx, key)?
                    }
                }
                SessionEvent::Paste(data) => {
                    self.input.insert_paste(&mut ctx, data);
                    EventFlow::Consumed
                }
                SessionEvent::Mouse(mouse) => {
                    // A click anywhere in the display area puts the caret
                    // back on the input line.
                    if matches!(mouse.kind, MouseEventKind::Down(_))
                        && plan.container.contains(mouse.column, mouse.row)
                    {
                        ctx.focus_input();
                        EventFlow::Consumed
                    } else {
                        EventFlow::Continue
                    }
                }
                SessionEvent::FocusGained => {
                    ctx.focus_input();
                    EventFlow::Continue
                }
                SessionEvent::Engine(update) => {
                    self.dispatcher.handle(&mut ctx, update);
                    EventFlow::Consumed
                }
                SessionEvent::Tick { .. }
                | SessionEvent::FocusLost
                | SessionEvent::Resize(_) => EventFlow::Continue,
            };

            (flow, ctx.into_outcome())
        };

        self.apply_outcome(outcome);
        self.metrics.record_event();
        self.log_session_event(
            LogLevel::Debug,
            "event_dispatched",
            [
                json_kv("event", json!(Self::describe_event(&session_event))),
                json_kv("consumed", json!(flow == EventFlow::Consumed)),
            ],
        );
        Ok(())
    }

    fn apply_outcome(&mut self, outcome: ContextOutcome) {
        if outcome.reconcile_requested {
            self.reconcile_requested = true;
        }
        if outcome.input_changed {
            self.input_dirty = true;
        }
        if outcome.exit_requested {
            self.should_exit = true;
            self.log_session_event(LogLevel::Info, "exit_requested", std::iter::empty());
        }
    }

    fn render_if_needed(&mut self, stdout: &mut impl Write) -> Result<()> {
        let dirty = self.regions.take_dirty();
        if !dirty.is_empty() {
            self.renderer
                .render(stdout, self.plan.container, &dirty, self.correction)?;
            self.metrics.record_render(dirty.len());
            self.log_session_event(
                LogLevel::Debug,
                "render_completed",
                [json_kv("dirty_regions", json!(dirty.len()))],
            );
        }

        if self.input_dirty {
            self.input_dirty = false;
            let rect = self.plan.input;
            let caret = self.focus.is_focused().then(|| {
                let column = rect
                    .x
                    .saturating_add(self.input.caret_column())
                    .min(rect.right().saturating_sub(1));
                (rect.y, column)
            });
            let line = self.input.display(self.focus);
            self.renderer.render_input(stdout, rect, &line, caret)?;
        }

        // Post-render hook: geometry is settled once the frame above is
        // flushed, so this measures what is actually on screen.
        if self.reconcile_requested {
            self.reconcile_pass(stdout)?;
        }

        Ok(())
    }

    fn reconcile_pass(&mut self, stdout: &mut impl Write) -> Result<()> {
        self.reconcile_requested = false;

        let content_height =
            wrap_to_width(&self.regions.content_text(), self.plan.content.width).len();
        let measure = Measure::new(
            content_height as i32,
            i32::from(HEADER_ROWS),
            i32::from(self.plan.container.height),
        );
        self.metrics.record_reconcile();

        if let Some(correction) = reconcile(measure) {
            if correction != self.correction {
                self.correction = correction;
                self.log_session_event(
                    LogLevel::Debug,
                    "layout_reconciled",
                    [
                        json_kv("content_height", json!(measure.content_height)),
                        json_kv("content_padding", json!(correction.content_padding)),
                        json_kv("header_offset", json!(correction.header_offset)),
                    ],
                );
                self.regions.invalidate();
                let dirty = self.regions.take_dirty();
                self.renderer
                    .render(stdout, self.plan.container, &dirty, self.correction)?;
                self.metrics.record_render(dirty.len());
            }
        }

        Ok(())
    }

    fn map_event(&mut self, raw: CrosstermEvent) -> Result<Option<SessionEvent>> {
        match raw {
            CrosstermEvent::Key(key) => Ok(Some(SessionEvent::Key(key))),
            CrosstermEvent::Mouse(mouse) => Ok(Some(SessionEvent::Mouse(mouse))),
            CrosstermEvent::Paste(data) => Ok(Some(SessionEvent::Paste(data))),
            CrosstermEvent::FocusGained => Ok(Some(SessionEvent::FocusGained)),
            CrosstermEvent::FocusLost => Ok(Some(SessionEvent::FocusLost)),
            CrosstermEvent::Resize(width, height) => {
                let size = Size::new(width, height);
                self.handle_resize(size)?;
                Ok(Some(SessionEvent::Resize(size)))
            }
        }
    }

    fn handle_resize(&mut self, size: Size) -> Result<()> {
        self.plan = layout::solve(size)?;
        self.regions.sync_layout(&self.plan);
        self.regions.invalidate();
        self.input_dirty = true;
        self.reconcile_requested = true;
        self.log_session_event(
            LogLevel::Info,
            "resized",
            [
                json_kv("width", json!(size.width)),
                json_kv("height", json!(size.height)),
            ],
        );
        Ok(())
    }

    fn bootstrap(&mut self, stdout: &mut impl Write) -> Result<()> {
        self.should_exit = false;
        self.focus.focus();
        self.input_dirty = true;
        let now = Instant::now();
        self.start_instant = Some(now);
        self.last_metrics_emit = Some(now);
        self.log_session_event(
            LogLevel::Info,
            "session_started",
            [
                json_kv("width", json!(self.plan.container.width)),
                json_kv("height", json!(self.plan.container.height)),
            ],
        );
        self.render_if_needed(stdout)
    }

    fn finalize(&mut self) {
        let uptime_ms = self
            .start_instant
            .map(|start| start.elapsed().as_millis())
            .unwrap_or(0);
        self.log_session_event(
            LogLevel::Info,
            "session_stopped",
            [json_kv("uptime_ms", json!(uptime_ms))],
        );
    }

    fn maybe_emit_metrics(&mut self) {
        if self.config.metrics_interval.is_zero() {
            return;
        }

        let now = Instant::now();
        match self.last_metrics_emit {
            Some(last) if now.duration_since(last) < self.config.metrics_interval => return,
            _ => self.last_metrics_emit = Some(now),
        }

        if let Some(logger) = self.config.logger.as_ref() {
            let uptime = self
                .start_instant
                .map(|start| now.duration_since(start))
                .unwrap_or_default();
            let snapshot = self.metrics.snapshot(uptime);
            let _ = logger.log_event(snapshot.to_log_event(&self.config.metrics_target));
        }
    }

    fn log_session_event<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let log_event = event_with_fields(level, "parlor::session", message, fields);
            let _ = logger.log_event(log_event);
        }
    }

    fn describe_event(session_event: &SessionEvent) -> &'static str {
        match session_event {
            SessionEvent::Tick { .. } => "tick",
            SessionEvent::Key(_) => "key",
            SessionEvent::Mouse(_) => "mouse",
            SessionEvent::Paste(_) => "paste",
            SessionEvent::FocusGained => "focus_gained",
            SessionEvent::FocusLost => "focus_lost",
            SessionEvent::Resize(_) => "resize",
            SessionEvent::Engine(update) => update.source.as_str(),
        }
    }
}

fn is_exit_chord(key: &KeyEvent) -> bool {
    key.kind == KeyEventKind::Press
        && key.code == KeyCode::Char('c')
        && key.modifiers.contains(KeyModifiers::CONTROL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{channel_bus, ScriptedBus};
    use crate::region::Slot;
    use crate::update::Source;

    fn key_event(code: KeyCode) -> SessionEvent {
        SessionEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_line(text: &str) -> Vec<SessionEvent> {
        let mut events: Vec<SessionEvent> =
            text.chars().map(|ch| key_event(KeyCode::Char(ch))).collect();
        events.push(key_event(KeyCode::Enter));
        events
    }

    #[test]
    fn scripted_session_routes_updates_and_input() {
        let (engine, ui) = channel_bus();
        engine.send_header("West of House", "Score: 0").unwrap();
        engine
            .send_main("Welcome to the game.\nYou are standing in an open field.")
            .unwrap();

        let mut runtime = SessionRuntime::new(ui, Size::new(80, 24)).unwrap();
        let mut output = Vec::new();
        runtime
            .run_scripted(&mut output, type_line("open mailbox"))
            .unwrap();

        assert!(!output.is_empty());
        assert_eq!(runtime.regions().slot_value(Slot::Left), "West of House");
        assert_eq!(runtime.regions().slot_value(Slot::Right), "Score: 0");
        assert_eq!(
            runtime.regions().content_text(),
            "Welcome to the game.\nYou are standing in an open field.open mailbox\n\n"
        );
        assert_eq!(engine.try_recv_input().as_deref(), Some("open mailbox"));
        assert_eq!(runtime.input().last_value(), Some("open mailbox"));
        assert_eq!(runtime.input().buffer(), "");
        assert!(!runtime.is_input_focused());
        assert_eq!(runtime.metrics().submissions(), 1);
    }

    #[test]
    fn input_tagged_update_restores_focus_after_submit() {
        let mut runtime =
            SessionRuntime::new(ScriptedBus::default(), Size::new(80, 24)).unwrap();

        let mut events = type_line("look");
        events.push(SessionEvent::Engine(Update::input()));
        runtime.run_scripted(&mut Vec::new(), events).unwrap();

        // The submit blurred the line; the engine's record focused it again.
        assert!(runtime.is_input_focused());
    }

    #[test]
    fn exit_chord_stops_the_script_early() {
        let mut runtime =
            SessionRuntime::new(ScriptedBus::default(), Size::new(80, 24)).unwrap();
        let events = vec![
            SessionEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            key_event(KeyCode::Char('x')),
        ];
        runtime.run_scripted(&mut Vec::new(), events).unwrap();
        assert_eq!(runtime.input().buffer(), "");
    }

    #[test]
    fn unknown_records_change_nothing() {
        let stray = Update::new(Source::Unknown, "noise");
        let mut runtime = SessionRuntime::new(
            ScriptedBus::new([stray.clone(), stray]),
            Size::new(80, 24),
        )
        .unwrap();
        runtime
            .run_scripted(&mut Vec::new(), std::iter::empty())
            .unwrap();

        assert_eq!(runtime.regions().content_text(), "");
        assert_eq!(runtime.metrics().unknown_dropped(), 2);
        assert_eq!(runtime.correction(), Correction::default());
    }

    #[test]
    fn overflowing_content_applies_a_correction_after_render() {
        let size = Size::new(40, 10);
        let mut runtime =
            SessionRuntime::new(ScriptedBus::default(), size).unwrap();

        let events: Vec<SessionEvent> = (0..12)
            .map(|n| SessionEvent::Engine(Update::main(format!("line {n}\n"))))
            .collect();
        runtime.run_scripted(&mut Vec::new(), events).unwrap();

        // 12 lines of text plus a trailing blank row, a one-row header, and
        // a nine-row container: overflow = (13 + 1) - 9 = 5.
        let correction = runtime.correction();
        assert_eq!(correction.content_padding, -5);
        assert_eq!(correction.header_offset, 4);
    }

    #[test]
    fn correction_is_not_reset_when_content_fits_again() {
        let size = Size::new(40, 10);
        let mut runtime =
            SessionRuntime::new(ScriptedBus::default(), size).unwrap();

        let events: Vec<SessionEvent> = (0..12)
            .map(|n| SessionEvent::Engine(Update::main(format!("line {n}\n"))))
            .collect();
        runtime.run_scripted(&mut Vec::new(), events).unwrap();
        let applied = runtime.correction();
        assert_ne!(applied, Correction::default());

        // A taller terminal makes everything fit; the pass leaves the old
        // correction alone.
        runtime
            .run_scripted(
                &mut Vec::new(),
                [SessionEvent::Resize(Size::new(40, 40))],
            )
            .unwrap();
        assert_eq!(runtime.correction(), applied);
    }
}
