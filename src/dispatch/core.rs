use serde_json::json;

use crate::logging::{event_with_fields, json_kv, LogLevel, Logger};
use crate::region::Slot;
use crate::runtime::SessionContext;
use crate::update::{Source, Update};

/// Routes update records to the render regions.
///
/// One dispatcher subscribes to the bus for the session lifetime; records
/// arrive in emission order and are handled synchronously, so appends land
/// on the content stream exactly as emitted — never reordered or batched.
pub struct OutputDispatcher {
    logger: Option<Logger>,
}

impl OutputDispatcher {
    pub fn new() -> Self {
        Self { logger: None }
    }

    pub fn with_logger(logger: Option<Logger>) -> Self {
        Self { logger }
    }

    /// Handle one record. Total over its input domain: every source routes
    /// somewhere, and an unrecognised tag is a defined no-op.
    pub fn handle(&mut self, ctx: &mut SessionContext<'_>, update: &Update) {
        match update.source {
            Source::Main => {
                ctx.regions().append_markup(&update.content);
                ctx.metrics().record_main_append();
                ctx.request_reconcile();
            }
            Source::Left => {
                ctx.regions().replace_slot(Slot::Left, &update.content);
                ctx.metrics().record_header_write();
            }
            Source::Right => {
                ctx.regions().replace_slot(Slot::Right, &update.content);
                ctx.metrics().record_header_write();
            }
            Source::Input => {
                ctx.focus_input();
            }
            Source::Unknown => {
                ctx.metrics().record_unknown_dropped();
                self.log("update_dropped", update);
                return;
            }
        }
        self.log("update_routed", update);
    }

    fn log(&self, message: &str, update: &Update) {
        if let Some(logger) = self.logger.as_ref() {
            let event = event_with_fields(
                LogLevel::Debug,
                "parlor::dispatch",
                message,
                [
                    json_kv("source", json!(update.source.as_str())),
                    json_kv("chars", json!(update.content.chars().count())),
                ],
            );
            let _ = logger.log_event(event);
        }
    }
}

impl Default for OutputDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::ScriptedBus;
    use crate::input::Focus;
    use crate::metrics::SessionMetrics;
    use crate::region::RegionSet;

    struct Fixture {
        regions: RegionSet,
        focus: Focus,
        bus: ScriptedBus,
        metrics: SessionMetrics,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                regions: RegionSet::new(),
                focus: Focus::default(),
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
    fn main_updates_append_and_request_reconcile() {
        let mut fixture = Fixture::new();
        let mut dispatcher = OutputDispatcher::new();

        let mut ctx = fixture.ctx();
        dispatcher.handle(&mut ctx, &Update::main("a\nb\nc"));
        assert!(ctx.reconcile_requested());
        drop(ctx);

        assert_eq!(fixture.regions.content_text(), "a\nb\nc");
    }

    #[test]
    fn header_updates_overwrite_their_slot() {
        let mut fixture = Fixture::new();
        let mut dispatcher = OutputDispatcher::new();

        let mut ctx = fixture.ctx();
        dispatcher.handle(&mut ctx, &Update::left("West of House"));
        dispatcher.handle(&mut ctx, &Update::right("Score: 0"));
        dispatcher.handle(&mut ctx, &Update::left("Forest"));
        assert!(!ctx.reconcile_requested());
        drop(ctx);

        assert_eq!(fixture.regions.slot_value(Slot::Left), "Forest");
        assert_eq!(fixture.regions.slot_value(Slot::Right), "Score: 0");
    }

    #[test]
    fn input_updates_restore_focus() {
        let mut fixture = Fixture::new();
        let mut dispatcher = OutputDispatcher::new();

        let mut ctx = fixture.ctx();
        dispatcher.handle(&mut ctx, &Update::input());
        drop(ctx);

        assert!(fixture.focus.is_focused());
    }

    #[test]
    fn unknown_updates_are_idempotent_no_ops() {
        let mut fixture = Fixture::new();
        let mut dispatcher = OutputDispatcher::new();
        let stray = Update::new(Source::Unknown, "noise");

        let mut ctx = fixture.ctx();
        dispatcher.handle(&mut ctx, &stray);
        dispatcher.handle(&mut ctx, &stray);
        assert!(!ctx.reconcile_requested());
        drop(ctx);

        assert_eq!(fixture.regions.content_text(), "");
        assert_eq!(fixture.regions.slot_value(Slot::Left), "");
        assert_eq!(fixture.regions.slot_value(Slot::Right), "");
        assert!(!fixture.regions.has_dirty());
        assert!(!fixture.focus.is_focused());
        assert_eq!(fixture.metrics.unknown_dropped(), 2);
    }
}
