//! Audit trail
//!
//! Append-only record of the capability invocations of one pipeline run.
//! Entries are numbered in completion order and cannot be changed once
//! appended; consumers only get shared references.

use chrono::{DateTime, Utc};
use sdk::errors::EngineError;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

/// One completed capability invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityInvocation {
    sequence_no: u64,
    capability_name: String,
    input_snapshot_ref: String,
    output: Value,
    success: bool,
    completed_at: DateTime<Utc>,
}

impl CapabilityInvocation {
    pub fn sequence_no(&self) -> u64 {
        self.sequence_no
    }

    pub fn capability_name(&self) -> &str {
        &self.capability_name
    }

    /// BLAKE3 digest of the context the capability was given
    pub fn input_snapshot_ref(&self) -> &str {
        &self.input_snapshot_ref
    }

    pub fn output(&self) -> &Value {
        &self.output
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// One-line form used when logging
    pub fn summary(&self) -> String {
        format!(
            "#{} {} success={} snapshot={} output={}",
            self.sequence_no, self.capability_name, self.success, self.input_snapshot_ref, self.output
        )
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditTrail {
    entries: Vec<CapabilityInvocation>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an invocation that has just completed
    pub fn record(
        &mut self,
        capability_name: &str,
        input_snapshot_ref: String,
        output: Value,
        success: bool,
    ) -> &CapabilityInvocation {
        let sequence_no = self.entries.len() as u64 + 1;
        self.entries.push(CapabilityInvocation {
            sequence_no,
            capability_name: capability_name.to_string(),
            input_snapshot_ref,
            output,
            success,
            completed_at: Utc::now(),
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[CapabilityInvocation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Capability names in invocation order
    pub fn capability_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.capability_name.as_str()).collect()
    }

    /// Log the trail of a run that ended in `cause`.
    ///
    /// An aborted run returns no report, so this is the only place its
    /// invocations surface.
    pub fn log_aborted(&self, cause: &EngineError) {
        error!(
            "Run aborted after {} invocation(s): {}",
            self.entries.len(),
            cause
        );
        for entry in &self.entries {
            error!("audit {}", entry.summary());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sequence_numbers_are_monotonic() {
        let mut trail = AuditTrail::new();
        trail.record("math_agent", "a".into(), json!({"reply": "4.0"}), true);
        trail.record("poetry_agent", "b".into(), json!({"reply": "no poem"}), true);
        trail.record("synthesizer_agent", "c".into(), json!({"error": {}}), false);

        let numbers: Vec<u64> = trail.entries().iter().map(|e| e.sequence_no()).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(
            trail.capability_names(),
            vec!["math_agent", "poetry_agent", "synthesizer_agent"]
        );
        assert!(!trail.entries()[2].success());
        assert!(trail.entries()[0].completed_at() <= trail.entries()[2].completed_at());
    }

    #[test]
    fn test_serializes_for_event_consumers() {
        let mut trail = AuditTrail::new();
        trail.record("math_agent", "abc".into(), json!({"reply": "4.0"}), true);
        let value = serde_json::to_value(&trail).unwrap();
        assert_eq!(value["entries"][0]["input_snapshot_ref"], "abc");
        assert_eq!(value["entries"][0]["sequence_no"], 1);
    }

    #[test]
    fn test_summary_names_outcome() {
        let mut trail = AuditTrail::new();
        let entry = trail.record(
            "math_agent",
            "d1g".into(),
            json!({"error": {"kind": "ArithmeticError"}}),
            false,
        );
        let summary = entry.summary();
        assert!(summary.starts_with("#1 math_agent success=false snapshot=d1g"));
        assert!(summary.contains("ArithmeticError"));
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_aborted_run_logs_every_entry() {
        let mut trail = AuditTrail::new();
        trail.record("math_agent", "s1".into(), json!({"reply": "2.0"}), true);
        trail.record("poetry_agent", "s2".into(), json!({"error": {}}), false);

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            trail.log_aborted(&EngineError::StageFailed {
                stage: "poetry_agent".to_string(),
                message: "rate limited".to_string(),
            });
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Run aborted after 2 invocation(s)"));
        assert!(output.contains("#1 math_agent success=true snapshot=s1"));
        assert!(output.contains("#2 poetry_agent success=false snapshot=s2"));
    }
}
