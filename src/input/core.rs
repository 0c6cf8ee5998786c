use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::error::Result;
use crate::runtime::{EventFlow, SessionContext};
use crate::width::display_width;

/// Prompt drawn ahead of the buffer on the input line.
pub const PROMPT: &str = "> ";

/// Focus state of the single input line.
///
/// Submission blurs the line; a click anywhere in the container, an
/// `input`-tagged update record, or the next keystroke focuses it again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Focus {
    focused: bool,
}

impl Focus {
    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }
}

/// The input line component.
#[derive(Debug, Default)]
pub struct InputLine {
    buffer: String,
    last_value: Option<String>,
}

impl InputLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Audit copy of the most recent submission. Kept for debugging only;
    /// nothing else reads it.
    pub fn last_value(&self) -> Option<&str> {
        self.last_value.as_deref()
    }

    /// Apply one key event. Keys always land here — the terminal has no
    /// other text target — so editing implicitly refocuses a blurred line.
    pub fn handle_key(
        &mut self,
        ctx: &mut SessionContext<'_>,
        key: &KeyEvent,
    ) -> Result<EventFlow> {
        if key.kind != KeyEventKind::Press {
            return Ok(EventFlow::Continue);
        }

        match key.code {
            KeyCode::Enter => {
                self.submit(ctx)?;
                Ok(EventFlow::Consumed)
            }
            KeyCode::Backspace => {
                ctx.focus_input();
                self.buffer.pop();
                ctx.mark_input_changed();
                Ok(EventFlow::Consumed)
            }
            KeyCode::Esc => {
                ctx.focus_input();
                self.buffer.clear();
                ctx.mark_input_changed();
                Ok(EventFlow::Consumed)
            }
            KeyCode::Char(ch) => {
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    || key.modifiers.contains(KeyModifiers::ALT)
                {
                    return Ok(EventFlow::Continue);
                }
                ctx.focus_input();
                self.buffer.push(ch);
                ctx.mark_input_changed();
                Ok(EventFlow::Consumed)
            }
            _ => Ok(EventFlow::Continue),
        }
    }

    /// Insert pasted text as-is.
    pub fn insert_paste(&mut self, ctx: &mut SessionContext<'_>, data: &str) {
        if data.is_empty() {
            return;
        }
        ctx.focus_input();
        self.buffer.push_str(data);
        ctx.mark_input_changed();
    }

    /// Submit the current buffer.
    ///
    /// Side effects run in a fixed order: the audit copy is taken before the
    /// buffer clears, the line blurs before the content append, the text and
    /// both paragraph breaks land on the stream, the engine is notified, and
    /// finally a reconcile pass is requested. An empty buffer is a legal
    /// submission — it appends nothing plus the two breaks.
    pub fn submit(&mut self, ctx: &mut SessionContext<'_>) -> Result<()> {
        self.last_value = Some(self.buffer.clone());
        let submitted = std::mem::take(&mut self.buffer);

        ctx.blur_input();
        ctx.regions().append_text(&submitted);
        ctx.regions().append_break();
        ctx.regions().append_break();
        ctx.notify_input(&submitted)?;
        ctx.metrics().record_submission();
        ctx.request_reconcile();
        ctx.mark_input_changed();
        Ok(())
    }

    /// Rendered input line, caret block included while focused.
    pub fn display(&self, focus: Focus) -> String {
        let mut line = String::from(PROMPT);
        line.push_str(&self.buffer);
        if focus.is_focused() {
            line.push('█');
        }
        line
    }

    /// 0-based caret column relative to the input rect.
    pub fn caret_column(&self) -> u16 {
        (display_width(PROMPT) + display_width(&self.buffer)) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::ScriptedBus;
    use crate::metrics::SessionMetrics;
    use crate::region::{Node, RegionSet};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    struct Fixture {
        regions: RegionSet,
        focus: Focus,
        bus: ScriptedBus,
        metrics: SessionMetrics,
    }

    impl Fixture {
        fn new() -> Self {
            let mut focus = Focus::default();
            focus.focus();
            Self {
                regions: RegionSet::new(),
                focus,
                bus: ScriptedBus::default(),
                metrics: SessionMetrics::new(),
            }
        }

        fn ctx(&mut self) -> SessionContext<'_> {
            SessionContext::new(
                &mut self.regions,
                &mut self.focus,
                &mut self.bus,
                &mut self.metrics,
            )
        }
    }

    #[test]
    fn typing_builds_the_buffer() {
        let mut fixture = Fixture::new();
        let mut input = InputLine::new();
        let mut ctx = fixture.ctx();
        input.handle_key(&mut ctx, &key(KeyCode::Char('g'))).unwrap();
        input.handle_key(&mut ctx, &key(KeyCode::Char('o'))).unwrap();
        input
            .handle_key(&mut ctx, &key(KeyCode::Backspace))
            .unwrap();
        assert_eq!(input.buffer(), "g");
        assert!(ctx.input_changed());
    }

    #[test]
    fn submission_runs_the_full_side_effect_sequence() {
        let mut fixture = Fixture::new();
        let mut input = InputLine::new();
        input.buffer = "hello\nworld".to_string();

        let mut ctx = fixture.ctx();
        input.submit(&mut ctx).unwrap();

        assert_eq!(input.last_value(), Some("hello\nworld"));
        assert_eq!(input.buffer(), "");
        assert!(ctx.reconcile_requested());
        drop(ctx);

        assert!(!fixture.focus.is_focused());
        assert_eq!(
            fixture.regions.nodes(),
            &[
                Node::Text("hello\nworld".to_string()),
                Node::Break,
                Node::Break,
            ]
        );
        assert_eq!(fixture.bus.notified(), ["hello\nworld"]);
        assert_eq!(fixture.metrics.submissions(), 1);
    }

    #[test]
    fn empty_submission_appends_only_the_breaks() {
        let mut fixture = Fixture::new();
        let mut input = InputLine::new();

        let mut ctx = fixture.ctx();
        input.submit(&mut ctx).unwrap();
        drop(ctx);

        assert_eq!(input.last_value(), Some(""));
        assert_eq!(
            fixture.regions.nodes(),
            &[Node::Text(String::new()), Node::Break, Node::Break]
        );
        assert_eq!(fixture.regions.content_text(), "\n\n");
        assert_eq!(fixture.bus.notified(), [""]);
    }

    #[test]
    fn caret_tracks_the_prompt_and_buffer() {
        let mut input = InputLine::new();
        input.buffer = "look".to_string();
        assert_eq!(input.caret_column(), 6);

        let mut focus = Focus::default();
        assert_eq!(input.display(focus), "> look");
        focus.focus();
        assert_eq!(input.display(focus), "> look█");
    }
}
