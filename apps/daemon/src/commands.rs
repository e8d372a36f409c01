//! Line commands read from stdin.

use flowclip_application::QueueSession;
use std::io::{BufRead, Write};
use std::str::FromStr;
use uuid::Uuid;

pub const HELP: &str = "\
commands:
  toggle            enter or leave queue mode
  clear             empty the queue
  paste-all         paste every queued item at once
  remove <id|n>     remove an item (id or list position)
  paste <id|n>      paste one item now
  order             switch between oldest-first and newest-first
  split             toggle one item per line for multi-line copies
  cycle on|off      restart from the beginning when the queue runs out
  list              show the queue
  quit              exit

paste and paste-all type into the frontmost app, which is this terminal
when run from one; switch to the target app first or use the shortcuts.";

/// An item reference: its id or its 1-based position in `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRef {
    Id(Uuid),
    Position(usize),
}

impl FromStr for ItemRef {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(position) = s.parse::<usize>() {
            if position == 0 {
                return Err(CommandError::InvalidItem(s.to_string()));
            }
            return Ok(ItemRef::Position(position));
        }
        Uuid::parse_str(s)
            .map(ItemRef::Id)
            .map_err(|_| CommandError::InvalidItem(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Clear,
    PasteAll,
    Remove(ItemRef),
    Paste(ItemRef),
    Order,
    Split,
    Cycle(bool),
    List,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("not an item id or position: {0}")]
    InvalidItem(String),
    #[error("expected `on` or `off`, got: {0}")]
    InvalidSwitch(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandError::Empty);
        };
        let arg = words.next();

        let command = match name.to_ascii_lowercase().as_str() {
            "toggle" => Command::Toggle,
            "clear" => Command::Clear,
            "paste-all" => Command::PasteAll,
            "remove" => Command::Remove(arg.ok_or(CommandError::MissingArgument("remove"))?.parse()?),
            "paste" => Command::Paste(arg.ok_or(CommandError::MissingArgument("paste"))?.parse()?),
            "order" => Command::Order,
            "split" => Command::Split,
            "cycle" => match arg {
                Some("on") => Command::Cycle(true),
                Some("off") => Command::Cycle(false),
                Some(other) => return Err(CommandError::InvalidSwitch(other.to_string())),
                None => return Err(CommandError::MissingArgument("cycle")),
            },
            "list" | "ls" => Command::List,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// Whether the command loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

fn resolve(session: &QueueSession, item: ItemRef) -> Option<Uuid> {
    match item {
        ItemRef::Id(id) => Some(id),
        ItemRef::Position(n) => session.snapshot().get(n - 1).map(|view| view.id),
    }
}

/// Run one command, writing any response to `out`.
pub fn execute(
    session: &QueueSession,
    command: Command,
    out: &mut impl Write,
) -> std::io::Result<Flow> {
    match command {
        Command::Toggle => match session.toggle_queue_mode() {
            Ok(true) => writeln!(out, "queue mode on")?,
            Ok(false) => writeln!(out, "queue mode off")?,
            Err(e) => writeln!(out, "queue mode on, but pastes are not intercepted: {e}")?,
        },
        Command::Clear => {
            session.clear_queue();
            writeln!(out, "queue cleared")?;
        }
        Command::PasteAll => session.paste_all(),
        Command::Remove(item) => match resolve(session, item) {
            Some(id) if session.remove_item(id) => writeln!(out, "removed {id}")?,
            _ => writeln!(out, "no such item")?,
        },
        Command::Paste(item) => match resolve(session, item) {
            Some(id) => session.paste_item(id),
            None => writeln!(out, "no such item")?,
        },
        Command::Order => {
            let order = session.toggle_paste_order();
            writeln!(out, "paste order: {}", order.label())?;
        }
        Command::Split => {
            let enabled = session.toggle_auto_split();
            writeln!(out, "split lines: {}", if enabled { "on" } else { "off" })?;
        }
        Command::Cycle(enabled) => {
            session.set_cycle(enabled);
            writeln!(out, "cycle: {}", if enabled { "on" } else { "off" })?;
        }
        Command::List => {
            let items = session.snapshot();
            if items.is_empty() {
                writeln!(out, "queue is empty")?;
            }
            for (i, item) in items.iter().enumerate() {
                let mark = if item.consumed { "x" } else { " " };
                let preview = item.preview.as_deref().unwrap_or("<image>");
                writeln!(out, "{:>3} [{mark}] {}  {preview}", i + 1, item.id)?;
            }
        }
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Read commands line by line until `quit` or end of input.
pub fn run(session: &QueueSession, input: impl BufRead, out: &mut impl Write) -> std::io::Result<()> {
    for line in input.lines() {
        let line = line?;
        match line.parse::<Command>() {
            Ok(command) => {
                tracing::debug!(?command, "command");
                if execute(session, command, out)? == Flow::Quit {
                    break;
                }
            }
            Err(CommandError::Empty) => {}
            Err(e) => writeln!(out, "{e}")?,
        }
        out.flush()?;
    }
    Ok(())
}
