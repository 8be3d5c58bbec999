use std::{env, time::Duration};

use crate::{
    error::{OverlayError, Result},
    telemetry::TASK_INFO_TOPIC,
};

const DEFAULT_POLL_MS: u64 = 100;
const DEFAULT_TICK_MS: u64 = 250;

/// Settings for the overlay host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayConfig {
    /// Topic the presenter subscribes to.
    pub topic: String,
    /// How often the UI context drains the hand-off queue.
    pub poll_interval: Duration,
    /// Period of the simulated task publisher.
    pub tick_interval: Duration,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            topic: TASK_INFO_TOPIC.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_MS),
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
        }
    }
}

impl OverlayConfig {
    /// Reads `TASK_OVERLAY_TOPIC`, `TASK_OVERLAY_POLL_MS` and
    /// `TASK_OVERLAY_TICK_MS`, falling back to defaults for unset variables.
    ///
    /// # Errors
    /// Returns [`OverlayError::InvalidConfig`] for unparsable or zero intervals.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`OverlayConfig::from_env`] with a custom variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let topic = lookup("TASK_OVERLAY_TOPIC")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| TASK_INFO_TOPIC.to_string());

        Ok(Self {
            topic,
            poll_interval: millis(&lookup, "TASK_OVERLAY_POLL_MS", DEFAULT_POLL_MS)?,
            tick_interval: millis(&lookup, "TASK_OVERLAY_TICK_MS", DEFAULT_TICK_MS)?,
        })
    }
}

fn millis<F>(lookup: &F, key: &str, default: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(Duration::from_millis(default));
    };

    match raw.trim().parse::<u64>() {
        Ok(0) => Err(OverlayError::InvalidConfig(format!("{key} must be > 0"))),
        Ok(ms) => Ok(Duration::from_millis(ms)),
        Err(e) => Err(OverlayError::InvalidConfig(format!(
            "{key}={raw:?} is not a number of milliseconds: {e}"
        ))),
    }
}
