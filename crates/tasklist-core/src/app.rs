use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::datastore::KeyValueStore;
use crate::filter::{FilterController, FilterMode};
use crate::interaction::Interaction;
use crate::render::{View, render};
use crate::store::{Outcome, TaskStore};
use crate::task::TaskId;

/// A discrete user intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Add(String),
    Toggle { id: TaskId, completed: bool },
    Edit(TaskId),
    Delete(TaskId),
    SetFilter(FilterMode),
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    /// `None` for events that do not touch the task list.
    pub outcome: Option<Outcome>,
    pub view: View,
}

/// Owns the task list, the filter state and the dialog collaborator.
#[derive(Debug)]
pub struct App<S, I> {
    store: TaskStore<S>,
    filter: FilterController,
    ui: I,
}

impl<S: KeyValueStore, I: Interaction> App<S, I> {
    pub fn open(storage: S, ui: I) -> anyhow::Result<Self> {
        Ok(Self {
            store: TaskStore::load(storage)?,
            filter: FilterController::default(),
            ui,
        })
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    pub fn filter(&self) -> FilterMode {
        self.filter.current()
    }

    pub fn ui(&self) -> &I {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut I {
        &mut self.ui
    }

    pub fn dispatch(&mut self, event: Event) -> anyhow::Result<Dispatched> {
        self.dispatch_at(event, Utc::now())
    }

    #[instrument(skip(self, now))]
    pub fn dispatch_at(&mut self, event: Event, now: DateTime<Utc>) -> anyhow::Result<Dispatched> {
        let outcome = match event {
            Event::Add(text) => Some(self.store.add(&mut self.ui, &text, now)?),
            Event::Toggle { id, completed } => Some(self.store.toggle(id, completed)?),
            Event::Edit(id) => Some(self.store.edit(&mut self.ui, id)?),
            Event::Delete(id) => Some(self.store.delete(&mut self.ui, id)?),
            Event::SetFilter(mode) => {
                self.filter.set_filter(mode);
                None
            }
            Event::Refresh => None,
        };
        debug!(?outcome, filter = %self.filter.current(), "event handled");

        Ok(Dispatched {
            outcome,
            view: self.view(),
        })
    }

    pub fn view(&self) -> View {
        let tasks = self.store.tasks();
        View {
            selectors: self.filter.selectors(),
            rows: render(tasks, self.filter.current()),
            remaining: tasks.iter().filter(|t| !t.completed).count(),
            total: tasks.len(),
        }
    }
}
