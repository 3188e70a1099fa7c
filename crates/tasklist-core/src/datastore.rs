use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::task::Task;

pub const TASKS_KEY: &str = "tasks";

/// String key-value storage that survives across sessions.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Keeps each key in its own `<key>.json` file under the data directory.
#[derive(Debug)]
pub struct FileStorage {
    pub data_dir: PathBuf,
}

impl FileStorage {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        info!(data_dir = %data_dir.display(), "opened storage");
        Ok(Self { data_dir })
    }

    pub fn item_path(&self, key: &str) -> anyhow::Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(anyhow!("invalid storage key: {key:?}"));
        }
        Ok(self.data_dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStorage {
    #[tracing::instrument(skip(self))]
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.item_path(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => {
                debug!(file = %path.display(), bytes = raw.len(), "read item");
                Ok(Some(raw))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(file = %path.display(), "item not present");
                Ok(None)
            }
            Err(err) => Err(err).with_context(|| format!("failed reading {}", path.display())),
        }
    }

    #[tracing::instrument(skip(self, value))]
    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.item_path(key)?;
        debug!(file = %path.display(), bytes = value.len(), "writing item atomically");

        let mut temp = NamedTempFile::new_in(&self.data_dir)?;
        temp.write_all(value.as_bytes())?;
        temp.flush()?;
        temp.persist(&path)
            .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.items.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads the persisted task list. A missing, unparseable or inconsistent
/// `tasks` value is treated as an empty list.
#[tracing::instrument(skip(storage))]
pub fn load_tasks<S: KeyValueStore>(storage: &S) -> anyhow::Result<Vec<Task>> {
    let Some(raw) = storage.get_item(TASKS_KEY)? else {
        debug!("no stored tasks; starting empty");
        return Ok(vec![]);
    };

    let tasks = match serde_json::from_str::<Vec<Task>>(&raw) {
        Ok(tasks) => tasks,
        Err(err) => {
            warn!(error = %err, "stored tasks are malformed; starting empty");
            return Ok(vec![]);
        }
    };

    if let Err(problem) = check_tasks(&tasks) {
        warn!(%problem, "stored tasks are inconsistent; starting empty");
        return Ok(vec![]);
    }

    debug!(count = tasks.len(), "loaded tasks");
    Ok(tasks)
}

/// Ids must be unique and every text non-blank.
fn check_tasks(tasks: &[Task]) -> Result<(), String> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen.insert(task.id) {
            return Err(format!("duplicate task id {}", task.id));
        }
        if task.text.trim().is_empty() {
            return Err(format!("task {} has blank text", task.id));
        }
    }
    Ok(())
}

/// Overwrites the persisted task list with the full sequence.
#[tracing::instrument(skip(storage, tasks))]
pub fn save_tasks<S: KeyValueStore>(storage: &mut S, tasks: &[Task]) -> anyhow::Result<()> {
    let serialized = serde_json::to_string(tasks).context("failed to serialize tasks")?;
    storage
        .set_item(TASKS_KEY, &serialized)
        .context("failed to save tasks")?;
    debug!(count = tasks.len(), "saved tasks");
    Ok(())
}
