use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type TaskId = u64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,

    pub text: String,

    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// `text` is expected to come from [`normalize_text`].
    pub fn pending(id: TaskId, text: String) -> Self {
        Self {
            id,
            text,
            completed: false,
        }
    }
}

/// Trims user-supplied task text; blank input yields `None`.
pub fn normalize_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Issues task ids from the creation timestamp in milliseconds, bumping past
/// the last issued id whenever the clock has not moved forward.
#[derive(Debug, Clone, Default)]
pub struct IdClock {
    last: TaskId,
}

impl IdClock {
    pub fn seeded(tasks: &[Task]) -> Self {
        Self {
            last: tasks.iter().map(|t| t.id).max().unwrap_or(0),
        }
    }

    pub fn next_id(&mut self, now: DateTime<Utc>) -> anyhow::Result<TaskId> {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let bumped = self
            .last
            .checked_add(1)
            .ok_or_else(|| anyhow!("task id space exhausted after {}", self.last))?;
        let id = millis.max(bumped);
        self.last = id;
        Ok(id)
    }
}
