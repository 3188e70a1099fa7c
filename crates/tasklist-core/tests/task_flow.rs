use std::fs;
use std::io::Cursor;

use tasklist_core::app::{App, Event};
use tasklist_core::datastore::{FileStorage, KeyValueStore, TASKS_KEY, load_tasks, save_tasks};
use tasklist_core::filter::FilterMode;
use tasklist_core::interaction::{ScriptedInteraction, TerminalInteraction};
use tasklist_core::render::{Renderer, Row, TaskRow};
use tasklist_core::shell::run_shell;
use tasklist_core::store::Outcome;
use tasklist_core::task::Task;
use tempfile::tempdir;

fn task(id: u64, text: &str, completed: bool) -> Task {
    Task {
        id,
        text: text.to_string(),
        completed,
    }
}

#[test]
fn file_storage_roundtrip_survives_reopen() {
    let temp = tempdir().expect("tempdir");
    let tasks = vec![
        task(1_700_000_000_002, "water plants", false),
        task(1_700_000_000_001, "buy milk", true),
    ];

    let mut storage = FileStorage::open(temp.path()).expect("open storage");
    save_tasks(&mut storage, &tasks).expect("save tasks");

    let reopened = FileStorage::open(temp.path()).expect("reopen storage");
    assert_eq!(load_tasks(&reopened).expect("load tasks"), tasks);
    assert!(temp.path().join("tasks.json").is_file());
}

#[test]
fn corrupt_file_starts_empty() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("tasks.json"), "{ not json").expect("write corrupt file");

    let storage = FileStorage::open(temp.path()).expect("open storage");
    let app = App::open(storage, ScriptedInteraction::new()).expect("open app");
    assert!(app.store().tasks().is_empty());
    assert_eq!(app.view().rows, vec![Row::Empty("No tasks yet!")]);
}

#[test]
fn storage_rejects_path_like_keys() {
    let temp = tempdir().expect("tempdir");
    let mut storage = FileStorage::open(temp.path()).expect("open storage");
    assert!(storage.set_item("../escape", "x").is_err());
    assert!(storage.get_item("").is_err());
    assert_eq!(storage.get_item(TASKS_KEY).expect("get"), None);
}

#[test]
fn completing_the_only_task_empties_the_active_view() {
    let temp = tempdir().expect("tempdir");
    let mut storage = FileStorage::open(temp.path()).expect("open storage");
    save_tasks(&mut storage, &[task(1, "buy milk", false)]).expect("seed");

    let mut app = App::open(storage, ScriptedInteraction::new()).expect("open app");
    let toggled = app
        .dispatch(Event::Toggle {
            id: 1,
            completed: true,
        })
        .expect("toggle");
    assert_eq!(toggled.outcome, Some(Outcome::Updated));
    assert_eq!(app.store().tasks(), &[task(1, "buy milk", true)]);

    let filtered = app
        .dispatch(Event::SetFilter(FilterMode::Active))
        .expect("filter");
    assert_eq!(filtered.view.rows, vec![Row::Empty("No active tasks!")]);

    let reopened = FileStorage::open(temp.path()).expect("reopen storage");
    assert_eq!(
        load_tasks(&reopened).expect("load"),
        vec![task(1, "buy milk", true)]
    );
}

#[test]
fn empty_store_shows_no_tasks_message() {
    let temp = tempdir().expect("tempdir");
    let storage = FileStorage::open(temp.path()).expect("open storage");
    let mut app = App::open(storage, ScriptedInteraction::new()).expect("open app");

    let shown = app
        .dispatch(Event::SetFilter(FilterMode::All))
        .expect("filter");
    assert_eq!(shown.view.rows, vec![Row::Empty("No tasks yet!")]);
}

#[test]
fn dialogs_drive_edit_and_delete() {
    let temp = tempdir().expect("tempdir");
    let storage = FileStorage::open(temp.path()).expect("open storage");
    let ui = ScriptedInteraction::new()
        .answer_text(Some("  call mom  "))
        .answer_confirm(false)
        .answer_confirm(true);
    let mut app = App::open(storage, ui).expect("open app");

    let mut ids = Vec::new();
    for text in ["call mum", "pay rent", "book dentist"] {
        match app.dispatch(Event::Add(text.to_string())).expect("add").outcome {
            Some(Outcome::Added(id)) => ids.push(id),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    app.dispatch(Event::Edit(ids[0])).expect("edit");
    app.dispatch(Event::Delete(ids[1])).expect("declined delete");
    assert_eq!(app.store().tasks().len(), 3);

    let deleted = app.dispatch(Event::Delete(ids[1])).expect("delete");
    assert_eq!(deleted.outcome, Some(Outcome::Removed));
    assert_eq!(
        deleted.view.rows,
        vec![
            Row::Task(TaskRow {
                id: ids[0],
                text: "call mom".to_string(),
                completed: false,
            }),
            Row::Task(TaskRow {
                id: ids[2],
                text: "book dentist".to_string(),
                completed: false,
            }),
        ]
    );

    let reopened = FileStorage::open(temp.path()).expect("reopen storage");
    let texts: Vec<String> = load_tasks(&reopened)
        .expect("load")
        .into_iter()
        .map(|t| t.text)
        .collect();
    assert_eq!(texts, vec!["call mom", "book dentist"]);
}

#[test]
fn shell_session_adds_completes_and_filters() {
    let temp = tempdir().expect("tempdir");
    let storage = FileStorage::open(temp.path()).expect("open storage");
    let input = "buy milk\n\nfilter completed\ndone 999\ndone abc\nquit\nnever read\n";
    let terminal = TerminalInteraction::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), false);
    let mut app = App::open(storage, terminal).expect("open app");

    run_shell(&mut app, &Renderer::plain()).expect("shell");

    assert_eq!(app.store().tasks().len(), 1);
    assert_eq!(app.store().tasks()[0].text, "buy milk");
    assert!(!app.store().tasks()[0].completed);
    assert_eq!(app.filter(), FilterMode::Completed);

    let transcript = String::from_utf8(app.ui_mut().output().clone()).expect("utf8");
    assert!(transcript.contains("No tasks yet!"));
    assert!(transcript.contains("Please enter a task!"));
    assert!(transcript.contains("No completed tasks!"));
    assert!(transcript.contains("invalid task id: abc"));
}

#[test]
fn shell_delete_asks_before_removing() {
    let temp = tempdir().expect("tempdir");
    let mut storage = FileStorage::open(temp.path()).expect("open storage");
    save_tasks(&mut storage, &[task(5, "a", false), task(6, "b", false)]).expect("seed");

    let input = "delete 5\nno\ndelete 6\nyes\n";
    let terminal = TerminalInteraction::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), false);
    let mut app = App::open(storage, terminal).expect("open app");

    run_shell(&mut app, &Renderer::plain()).expect("shell");
    assert_eq!(app.store().tasks(), &[task(5, "a", false)]);
}
