//! External sink contracts: operation log, trade history, pub-sub messages.
//!
//! The core only observes sink health and appends events after a mutation
//! has committed; persistence/transport of these sinks is out of scope (see
//! SPEC_FULL.md #1, #4.8). Grounded on the teacher's `OrderFlowOrchestrator`
//! (`services/matching/orchestrator.rs`): it calls the in-memory engine to
//! completion first, then spawns the async persistence step — the same
//! commit-then-notify sequencing, just against a trait object here instead
//! of a concrete `sqlx`/`redis` client.

use serde_json::Value;

/// A collaborator that durably records engine activity. The default,
/// `NullSinks`, is always healthy and simply logs via `tracing` — a host
/// wiring real operlog/history/message-queue storage implements this trait
/// instead.
pub trait ExternalSinks {
    fn append_operlog(&mut self, op_name: &str, params: &Value);
    fn append_history(&mut self, kind: &str, payload: &Value);
    fn push_message(&mut self, topic: &str, payload: &Value);

    fn is_operlog_block(&self) -> bool {
        false
    }
    fn is_history_block(&self) -> bool {
        false
    }
    fn is_message_block(&self) -> bool {
        false
    }
}

/// Always-healthy sinks that log at `debug` level. Suitable for tests and as
/// the demo binary's default; a production host swaps in sinks backed by
/// real storage.
#[derive(Debug, Default)]
pub struct NullSinks;

impl ExternalSinks for NullSinks {
    fn append_operlog(&mut self, op_name: &str, params: &Value) {
        tracing::debug!(op_name, %params, "operlog");
    }

    fn append_history(&mut self, kind: &str, payload: &Value) {
        tracing::debug!(kind, %payload, "history");
    }

    fn push_message(&mut self, topic: &str, payload: &Value) {
        tracing::debug!(topic, %payload, "message");
    }
}

/// In-memory sinks that record every emission, for use in tests that assert
/// on what was emitted without standing up real storage.
#[derive(Debug, Default)]
pub struct RecordingSinks {
    pub operlogs: Vec<(String, Value)>,
    pub history: Vec<(String, Value)>,
    pub messages: Vec<(String, Value)>,
    pub block_operlog: bool,
    pub block_history: bool,
    pub block_message: bool,
}

impl ExternalSinks for RecordingSinks {
    fn append_operlog(&mut self, op_name: &str, params: &Value) {
        self.operlogs.push((op_name.to_string(), params.clone()));
    }

    fn append_history(&mut self, kind: &str, payload: &Value) {
        self.history.push((kind.to_string(), payload.clone()));
    }

    fn push_message(&mut self, topic: &str, payload: &Value) {
        self.messages.push((topic.to_string(), payload.clone()));
    }

    fn is_operlog_block(&self) -> bool {
        self.block_operlog
    }

    fn is_history_block(&self) -> bool {
        self.block_history
    }

    fn is_message_block(&self) -> bool {
        self.block_message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sinks_capture_emissions() {
        let mut sinks = RecordingSinks::default();
        sinks.append_operlog("update_balance", &serde_json::json!({"a": 1}));
        sinks.append_history("deal", &serde_json::json!({"b": 2}));
        sinks.push_message("deals", &serde_json::json!({"c": 3}));

        assert_eq!(sinks.operlogs.len(), 1);
        assert_eq!(sinks.history.len(), 1);
        assert_eq!(sinks.messages.len(), 1);
    }

    #[test]
    fn blocking_flags_are_observable() {
        let mut sinks = RecordingSinks::default();
        sinks.block_history = true;
        assert!(sinks.is_history_block());
        assert!(!sinks.is_operlog_block());
    }
}
