pub mod app;
pub mod cli;
pub mod config;
pub mod datastore;
pub mod filter;
pub mod interaction;
pub mod render;
pub mod shell;
pub mod store;
pub mod task;

use std::ffi::OsString;
use std::io::Write;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::app::{
  App,
  Event
};
use crate::cli::Command;
use crate::filter::FilterMode;
use crate::store::Outcome;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting tasklist"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let storage =
    datastore::FileStorage::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open storage at {}",
        data_dir.display()
      )
    })?;

  let assume_yes =
    cli.yes || !cfg.confirmation();
  let terminal =
    interaction::TerminalInteraction::stdio(
      assume_yes
    );
  let mut app =
    App::open(storage, terminal)?;
  let renderer =
    render::Renderer::new(&cfg)?;

  let event = match cli.command {
    | Some(Command::Shell) => {
      shell::run_shell(
        &mut app, &renderer
      )?;
      info!("done");
      return Ok(());
    }
    | Some(Command::Add {
      words
    }) => Event::Add(words.join(" ")),
    | Some(Command::Done {
      id
    }) => Event::Toggle {
      id,
      completed: true
    },
    | Some(Command::Reopen {
      id
    }) => Event::Toggle {
      id,
      completed: false
    },
    | Some(Command::Edit {
      id
    }) => Event::Edit(id),
    | Some(Command::Delete {
      id
    }) => Event::Delete(id),
    | Some(Command::List {
      filter
    }) => Event::SetFilter(filter),
    | None => {
      Event::SetFilter(FilterMode::All)
    }
  };

  let dispatched = app.dispatch(event)?;
  let out = app.ui_mut().output();
  if let Some(Outcome::Added(id)) =
    dispatched.outcome
  {
    writeln!(
      out,
      "Created task {id}."
    )?;
  }
  renderer
    .print_view(out, &dispatched.view)?;

  info!("done");
  Ok(())
}
