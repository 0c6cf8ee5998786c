//! Session counters, snapshotted periodically into the structured log.

use std::time::Duration;

use serde_json::json;

use crate::logging::{LogEvent, LogFields, LogLevel};

#[derive(Debug, Default, Clone)]
pub struct SessionMetrics {
    events: u64,
    renders: u64,
    dirty_regions: u64,
    main_appends: u64,
    header_writes: u64,
    submissions: u64,
    reconcile_passes: u64,
    unknown_dropped: u64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self) {
        self.events = self.events.saturating_add(1);
    }

    pub fn record_render(&mut self, dirty_count: usize) {
        self.renders = self.renders.saturating_add(1);
        self.dirty_regions = self.dirty_regions.saturating_add(dirty_count as u64);
    }

    pub fn record_main_append(&mut self) {
        self.main_appends = self.main_appends.saturating_add(1);
    }

    pub fn record_header_write(&mut self) {
        self.header_writes = self.header_writes.saturating_add(1);
    }

    pub fn record_submission(&mut self) {
        self.submissions = self.submissions.saturating_add(1);
    }

    pub fn record_reconcile(&mut self) {
        self.reconcile_passes = self.reconcile_passes.saturating_add(1);
    }

    pub fn record_unknown_dropped(&mut self) {
        self.unknown_dropped = self.unknown_dropped.saturating_add(1);
    }

    pub fn submissions(&self) -> u64 {
        self.submissions
    }

    pub fn unknown_dropped(&self) -> u64 {
        self.unknown_dropped
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            events: self.events,
            renders: self.renders,
            dirty_regions: self.dirty_regions,
            main_appends: self.main_appends,
            header_writes: self.header_writes,
            submissions: self.submissions,
            reconcile_passes: self.reconcile_passes,
            unknown_dropped: self.unknown_dropped,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub events: u64,
    pub renders: u64,
    pub dirty_regions: u64,
    pub main_appends: u64,
    pub header_writes: u64,
    pub submissions: u64,
    pub reconcile_passes: u64,
    pub unknown_dropped: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        let mut fields = LogFields::new();
        fields.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        fields.insert("events".to_string(), json!(self.events));
        fields.insert("renders".to_string(), json!(self.renders));
        fields.insert("dirty_regions".to_string(), json!(self.dirty_regions));
        fields.insert("main_appends".to_string(), json!(self.main_appends));
        fields.insert("header_writes".to_string(), json!(self.header_writes));
        fields.insert("submissions".to_string(), json!(self.submissions));
        fields.insert(
            "reconcile_passes".to_string(),
            json!(self.reconcile_passes),
        );
        fields.insert("unknown_dropped".to_string(), json!(self.unknown_dropped));
        LogEvent::with_fields(LogLevel::Info, target, "session_metrics", fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_carries_every_counter() {
        let mut metrics = SessionMetrics::new();
        metrics.record_event();
        metrics.record_render(3);
        metrics.record_main_append();
        metrics.record_header_write();
        metrics.record_header_write();
        metrics.record_submission();
        metrics.record_reconcile();
        metrics.record_unknown_dropped();

        let snapshot = metrics.snapshot(Duration::from_millis(1500));
        assert_eq!(snapshot.uptime_ms, 1500);
        assert_eq!(snapshot.events, 1);
        assert_eq!(snapshot.renders, 1);
        assert_eq!(snapshot.dirty_regions, 3);
        assert_eq!(snapshot.header_writes, 2);

        let event = snapshot.to_log_event("parlor::session.metrics");
        assert_eq!(event.target, "parlor::session.metrics");
        assert_eq!(event.fields.get("submissions"), Some(&json!(1u64)));
    }
}
