use std::io::{self, IsTerminal, Write};

use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::filter::{FilterMode, Selector};
use crate::task::{Task, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Empty(&'static str),
    Task(TaskRow),
}

/// Everything a front end needs to redraw after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub selectors: [Selector; 3],
    pub rows: Vec<Row>,
    pub remaining: usize,
    pub total: usize,
}

/// Rebuilds the visible rows from scratch for the given filter.
pub fn render(tasks: &[Task], mode: FilterMode) -> Vec<Row> {
    let rows: Vec<Row> = tasks
        .iter()
        .filter(|task| mode.matches(task))
        .map(|task| {
            Row::Task(TaskRow {
                id: task.id,
                text: task.text.clone(),
                completed: task.completed,
            })
        })
        .collect();

    if rows.is_empty() {
        vec![Row::Empty(mode.empty_message())]
    } else {
        rows
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.color()?;

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, out, view))]
    pub fn print_view<W: Write>(&self, mut out: W, view: &View) -> anyhow::Result<()> {
        let bar = view
            .selectors
            .iter()
            .map(|selector| {
                if selector.active {
                    self.paint(&format!("[{}]", selector.mode), "1")
                } else {
                    format!(" {} ", selector.mode)
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{bar}")?;
        writeln!(out)?;

        if let [Row::Empty(message)] = view.rows.as_slice() {
            writeln!(out, "{message}")?;
        } else {
            let headers = vec!["ID".to_string(), "Done".to_string(), "Task".to_string()];
            let rows = view
                .rows
                .iter()
                .filter_map(|row| match row {
                    Row::Task(task) => Some(self.task_cells(task)),
                    Row::Empty(_) => None,
                })
                .collect();
            write_table(&mut out, headers, rows)?;
        }

        writeln!(out)?;
        writeln!(out, "{} of {} tasks left", view.remaining, view.total)?;
        Ok(())
    }

    fn task_cells(&self, task: &TaskRow) -> Vec<String> {
        let id = self.paint(&task.id.to_string(), "33");
        let done = if task.completed { "[x]" } else { "[ ]" }.to_string();
        let text = if task.completed {
            self.paint(&task.text, "2;9")
        } else {
            task.text.clone()
        };
        vec![id, done, text]
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
