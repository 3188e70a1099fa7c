use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use clap::ValueEnum;
use tracing::debug;

use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FilterMode {
    #[default]
    All,
    Active,
    Completed,
}

impl FilterMode {
    pub const ALL_MODES: [FilterMode; 3] =
        [FilterMode::All, FilterMode::Active, FilterMode::Completed];

    pub fn matches(self, task: &Task) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Active => !task.completed,
            FilterMode::Completed => task.completed,
        }
    }

    pub fn empty_message(self) -> &'static str {
        match self {
            FilterMode::All => "No tasks yet!",
            FilterMode::Active => "No active tasks!",
            FilterMode::Completed => "No completed tasks!",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Active => "active",
            FilterMode::Completed => "completed",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        FilterMode::ALL_MODES
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| anyhow!("unknown filter: {s} (expected all, active or completed)"))
    }
}

/// One filter selector control; exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector {
    pub mode: FilterMode,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FilterController {
    current: FilterMode,
}

impl FilterController {
    pub fn current(&self) -> FilterMode {
        self.current
    }

    pub fn set_filter(&mut self, mode: FilterMode) {
        debug!(from = %self.current, to = %mode, "switching filter");
        self.current = mode;
    }

    pub fn selectors(&self) -> [Selector; 3] {
        FilterMode::ALL_MODES.map(|mode| Selector {
            mode,
            active: mode == self.current,
        })
    }
}
