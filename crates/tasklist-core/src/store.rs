use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::datastore::{KeyValueStore, load_tasks, save_tasks};
use crate::interaction::Interaction;
use crate::task::{IdClock, Task, TaskId, normalize_text};

pub const EMPTY_TEXT_WARNING: &str = "Please enter a task!";
pub const EDIT_PROMPT: &str = "Edit your task:";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this task?";

/// Which branch a store operation took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Added(TaskId),
    Rejected,
    Updated,
    Removed,
    Unchanged,
    NotFound,
}

impl Outcome {
    pub fn changed(self) -> bool {
        matches!(self, Outcome::Added(_) | Outcome::Updated | Outcome::Removed)
    }
}

/// Ordered in-memory task list mirrored to storage after every mutation.
#[derive(Debug)]
pub struct TaskStore<S> {
    storage: S,
    tasks: Vec<Task>,
    ids: IdClock,
}

impl<S: KeyValueStore> TaskStore<S> {
    #[tracing::instrument(skip(storage))]
    pub fn load(storage: S) -> anyhow::Result<Self> {
        let tasks = load_tasks(&storage)?;
        let ids = IdClock::seeded(&tasks);
        info!(count = tasks.len(), "task store ready");
        Ok(Self {
            storage,
            tasks,
            ids,
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    #[tracing::instrument(skip(self, ui, text, now))]
    pub fn add<I: Interaction + ?Sized>(
        &mut self,
        ui: &mut I,
        text: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Outcome> {
        let Some(text) = normalize_text(text) else {
            debug!("rejected blank task text");
            ui.notify(EMPTY_TEXT_WARNING);
            return Ok(Outcome::Rejected);
        };

        let id = self.ids.next_id(now)?;
        self.tasks.push(Task::pending(id, text));
        self.persist()?;

        info!(id, count = self.tasks.len(), "task added");
        Ok(Outcome::Added(id))
    }

    #[tracing::instrument(skip(self))]
    pub fn toggle(&mut self, id: TaskId, completed: bool) -> anyhow::Result<Outcome> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "toggle on unknown task ignored");
            return Ok(Outcome::NotFound);
        };
        task.completed = completed;
        self.persist()?;

        info!(id, completed, "task toggled");
        Ok(Outcome::Updated)
    }

    #[tracing::instrument(skip(self, ui))]
    pub fn edit<I: Interaction + ?Sized>(
        &mut self,
        ui: &mut I,
        id: TaskId,
    ) -> anyhow::Result<Outcome> {
        let Some(idx) = self.tasks.iter().position(|t| t.id == id) else {
            debug!(id, "edit on unknown task ignored");
            return Ok(Outcome::NotFound);
        };

        let Some(answer) = ui.ask_text(EDIT_PROMPT, &self.tasks[idx].text) else {
            debug!(id, "edit cancelled");
            return Ok(Outcome::Unchanged);
        };
        let Some(text) = normalize_text(&answer) else {
            debug!(id, "blank replacement ignored");
            return Ok(Outcome::Unchanged);
        };

        self.tasks[idx].text = text;
        self.persist()?;

        info!(id, "task edited");
        Ok(Outcome::Updated)
    }

    #[tracing::instrument(skip(self, ui))]
    pub fn delete<I: Interaction + ?Sized>(
        &mut self,
        ui: &mut I,
        id: TaskId,
    ) -> anyhow::Result<Outcome> {
        if !ui.confirm(DELETE_PROMPT) {
            debug!(id, "delete not confirmed");
            return Ok(Outcome::Unchanged);
        }

        let Some(idx) = self.tasks.iter().position(|t| t.id == id) else {
            debug!(id, "delete on unknown task ignored");
            return Ok(Outcome::NotFound);
        };
        self.tasks.remove(idx);
        self.persist()?;

        info!(id, count = self.tasks.len(), "task deleted");
        Ok(Outcome::Removed)
    }

    fn persist(&mut self) -> anyhow::Result<()> {
        save_tasks(&mut self.storage, &self.tasks)
    }
}
