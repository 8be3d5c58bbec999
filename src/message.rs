use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    error::{OverlayError, Result},
    time_format::format_duration,
};

/// Lifecycle of a simulated task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Initial,
    Ready,
    Running,
    Finished,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Initial => "Initial",
            TaskState::Ready => "Ready",
            TaskState::Running => "Running",
            TaskState::Finished => "Finished",
        };
        f.write_str(name)
    }
}

/// A task status record as published on the telemetry bus.
///
/// Durations are non-negative by construction. On the wire they are encoded
/// as `{"secs": .., "nanos": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub name: String,
    pub state: TaskState,
    pub ready_time: Duration,
    pub running_time: Duration,
    pub elapsed_time: Duration,
    pub remaining_time: Duration,
    pub timed_out: bool,
    pub score: f64,
}

impl StatusMessage {
    /// Decodes a status message from its JSON wire form.
    ///
    /// # Errors
    /// Returns [`OverlayError::Decode`] if the payload is not valid JSON, misses
    /// a field, names an unknown state or carries a negative duration.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(OverlayError::Decode)
    }

    /// Encodes this message into its JSON wire form.
    ///
    /// # Errors
    /// Returns [`OverlayError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(OverlayError::Encode)
    }
}

/// Renders the multi-line block shown in the overlay.
impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Task Name: {}", self.name)?;
        writeln!(f, "Task State: {}", self.state)?;
        writeln!(f, "Ready Time: {}", format_duration(self.ready_time))?;
        writeln!(f, "Running Time: {}", format_duration(self.running_time))?;
        writeln!(f, "Elapsed Time: {}", format_duration(self.elapsed_time))?;
        writeln!(f, "Remaining Time: {}", format_duration(self.remaining_time))?;
        writeln!(f, "Timed out: {}", self.timed_out)?;
        writeln!(f, "Score: {}", self.score)
    }
}

/// Builds a fresh formatted status block for `msg`.
pub fn render_status(msg: &StatusMessage) -> String {
    msg.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StatusMessage {
        StatusMessage {
            name: "station_keeping".into(),
            state: TaskState::Running,
            ready_time: Duration::from_secs(10),
            running_time: Duration::from_secs(20),
            elapsed_time: Duration::from_millis(3_661_500),
            remaining_time: Duration::new(59, 999_999_600),
            timed_out: true,
            score: 42.5,
        }
    }

    #[test]
    fn renders_every_line_in_order() {
        let block = render_status(&sample());
        let lines: Vec<&str> = block.lines().collect();

        assert_eq!(
            lines,
            vec![
                "Task Name: station_keeping",
                "Task State: Running",
                "Ready Time: 00 00:00:10.000",
                "Running Time: 00 00:00:20.000",
                "Elapsed Time: 00 01:01:01.500",
                "Remaining Time: 00 00:01:00.000",
                "Timed out: true",
                "Score: 42.5",
            ]
        );
        assert!(block.ends_with('\n'));
    }

    #[test]
    fn score_uses_default_decimal_form() {
        let mut msg = sample();
        msg.score = 3.0;
        msg.timed_out = false;
        let block = render_status(&msg);

        assert!(block.contains("Score: 3\n"));
        assert!(block.contains("Timed out: false\n"));
    }

    #[test]
    fn state_renders_as_its_name() {
        let names: Vec<String> = [
            TaskState::Initial,
            TaskState::Ready,
            TaskState::Running,
            TaskState::Finished,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        assert_eq!(names, ["Initial", "Ready", "Running", "Finished"]);
    }

    #[test]
    fn decodes_wire_payload() {
        let payload = br#"{
            "name": "wayfinding",
            "state": "ready",
            "ready_time": {"secs": 5, "nanos": 0},
            "running_time": {"secs": 0, "nanos": 0},
            "elapsed_time": {"secs": 1, "nanos": 250000000},
            "remaining_time": {"secs": 300, "nanos": 0},
            "timed_out": false,
            "score": 0.0
        }"#;

        let msg = StatusMessage::decode(payload).unwrap();
        assert_eq!(msg.name, "wayfinding");
        assert_eq!(msg.state, TaskState::Ready);
        assert_eq!(msg.elapsed_time, Duration::from_millis(1_250));
        assert!(!msg.timed_out);
    }

    #[test]
    fn encode_then_decode_keeps_fields() {
        let msg = sample();
        let decoded = StatusMessage::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn rejects_malformed_payloads() {
        let missing_field = br#"{"name": "x", "state": "running"}"#;
        let unknown_state = br#"{
            "name": "x", "state": "paused",
            "ready_time": {"secs": 0, "nanos": 0},
            "running_time": {"secs": 0, "nanos": 0},
            "elapsed_time": {"secs": 0, "nanos": 0},
            "remaining_time": {"secs": 0, "nanos": 0},
            "timed_out": false, "score": 1.0
        }"#;
        let negative_time = br#"{
            "name": "x", "state": "running",
            "ready_time": {"secs": -1, "nanos": 0},
            "running_time": {"secs": 0, "nanos": 0},
            "elapsed_time": {"secs": 0, "nanos": 0},
            "remaining_time": {"secs": 0, "nanos": 0},
            "timed_out": false, "score": 1.0
        }"#;

        let payloads: [&[u8]; 4] = [b"not json", missing_field, unknown_state, negative_time];
        for payload in payloads {
            assert!(matches!(
                StatusMessage::decode(payload),
                Err(OverlayError::Decode(_))
            ));
        }
    }
}
