use std::io::{BufRead, Write};

use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::app::{App, Event};
use crate::datastore::KeyValueStore;
use crate::interaction::TerminalInteraction;
use crate::render::Renderer;
use crate::task::TaskId;

const HELP: &str = "\
commands:
  add <text>      add a task (a line that is not a command is added as-is)
  done <id>       mark a task completed
  reopen <id>     mark a task not completed
  edit <id>       replace a task's text
  delete <id>     remove a task
  filter <mode>   show all, active or completed tasks
  list            show the current view again
  help            show this help
  quit            leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Event(Event),
    Help,
    Quit,
}

/// Maps one input line to a command; anything unrecognized becomes an add.
pub fn parse_line(line: &str) -> anyhow::Result<ShellCommand> {
    let trimmed = line.trim();
    let (word, rest) = trimmed
        .split_once(char::is_whitespace)
        .map(|(word, rest)| (word, rest.trim()))
        .unwrap_or((trimmed, ""));

    let command = match word.to_ascii_lowercase().as_str() {
        "add" => ShellCommand::Event(Event::Add(rest.to_string())),
        "done" => ShellCommand::Event(Event::Toggle {
            id: parse_id(word, rest)?,
            completed: true,
        }),
        "reopen" => ShellCommand::Event(Event::Toggle {
            id: parse_id(word, rest)?,
            completed: false,
        }),
        "edit" => ShellCommand::Event(Event::Edit(parse_id(word, rest)?)),
        "delete" => ShellCommand::Event(Event::Delete(parse_id(word, rest)?)),
        "filter" => ShellCommand::Event(Event::SetFilter(rest.parse()?)),
        "list" if rest.is_empty() => ShellCommand::Event(Event::Refresh),
        "help" if rest.is_empty() => ShellCommand::Help,
        "quit" | "exit" if rest.is_empty() => ShellCommand::Quit,
        _ => ShellCommand::Event(Event::Add(trimmed.to_string())),
    };
    Ok(command)
}

fn parse_id(command: &str, raw: &str) -> anyhow::Result<TaskId> {
    if raw.is_empty() {
        return Err(anyhow!("{command} requires a task id"));
    }
    raw.parse::<TaskId>()
        .map_err(|_| anyhow!("invalid task id: {raw}"))
}

/// Runs the read-dispatch-render loop until `quit` or end of input.
#[instrument(skip_all)]
pub fn run_shell<S, R, W>(
    app: &mut App<S, TerminalInteraction<R, W>>,
    renderer: &Renderer,
) -> anyhow::Result<()>
where
    S: KeyValueStore,
    R: BufRead,
    W: Write,
{
    info!("starting shell");
    let view = app.view();
    renderer.print_view(app.ui_mut().output(), &view)?;

    loop {
        {
            let out = app.ui_mut().output();
            write!(out, "> ")?;
            out.flush()?;
        }
        let Some(line) = app
            .ui_mut()
            .read_line()
            .context("failed reading shell input")?
        else {
            debug!("end of input");
            writeln!(app.ui_mut().output())?;
            break;
        };

        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(err) => {
                warn!(error = %err, line = %line, "unparseable shell line");
                writeln!(app.ui_mut().output(), "{err}")?;
                continue;
            }
        };

        match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => writeln!(app.ui_mut().output(), "{HELP}")?,
            ShellCommand::Event(event) => {
                let dispatched = app.dispatch(event)?;
                renderer.print_view(app.ui_mut().output(), &dispatched.view)?;
            }
        }
    }

    info!("shell finished");
    Ok(())
}
