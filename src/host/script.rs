//! A line-oriented host simulator.
//!
//! Each line is one thing the host editor (or the user) does:
//!
//! ```text
//! # comment
//! cursor 10 4            cursor moved to line 10, column 4 (zero-based)
//! edit 10 96 3 0         line 10 is now 96 chars long, 3 inserted, 0 removed
//! editor main.rs         another editor became active (no name: none)
//! select records         pick a mode from the selection surface
//! select none            pick "disable all"
//! command records.reset  run a bound command with optional arguments
//! status                 print the status bar
//! list                   print the selection surface
//! ```

use crate::host::HostEvent;
use crate::session::{SelectionTarget, Session};
use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};

/// One parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLine {
    Event(HostEvent),
    Select(SelectionTarget),
    Command { id: String, args: Vec<String> },
    Status,
    List,
}

/// Parses one line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ScriptLine>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let parsed = match verb {
        "cursor" => {
            let [line, column] = numbers::<2>(verb, &rest)?;
            ScriptLine::Event(HostEvent::CursorMoved { line, column })
        }
        "edit" => {
            let [line, line_length, inserted, removed] = numbers::<4>(verb, &rest)?;
            ScriptLine::Event(HostEvent::DocumentChanged {
                line,
                line_length,
                inserted,
                removed,
            })
        }
        "editor" => ScriptLine::Event(HostEvent::EditorChanged {
            name: (!rest.is_empty()).then(|| rest.join(" ")),
        }),
        "select" => match rest.as_slice() {
            [target] => ScriptLine::Select(SelectionTarget::parse(target)),
            _ => bail!("usage: select <mode id|none>"),
        },
        "command" => match rest.split_first() {
            Some((id, args)) => ScriptLine::Command {
                id: id.to_string(),
                args: args.iter().map(|arg| arg.to_string()).collect(),
            },
            None => bail!("usage: command <id> [args...]"),
        },
        "status" => ScriptLine::Status,
        "list" => ScriptLine::List,
        other => bail!("unknown script verb '{}'", other),
    };
    Ok(Some(parsed))
}

fn numbers<const N: usize>(verb: &str, words: &[&str]) -> Result<[usize; N]> {
    if words.len() != N {
        bail!("'{}' takes {} numbers, got {}", verb, N, words.len());
    }
    let mut out = [0usize; N];
    for (slot, word) in out.iter_mut().zip(words) {
        *slot = word
            .parse()
            .with_context(|| format!("'{}' is not a valid number for '{}'", word, verb))?;
    }
    Ok(out)
}

/// Feeds every line of `input` to `session`, writing `status`/`list` output
/// and notifications to `out`.
///
/// A malformed line is reported and skipped; it does not stop the script.
pub fn run_script<R: BufRead, W: Write>(session: &Session, input: R, out: &mut W) -> Result<()> {
    let width = session.config().status_width;

    for (idx, line) in input.lines().enumerate() {
        let line = line.context("Failed to read script")?;
        match parse_line(&line) {
            Ok(Some(step)) => apply(session, step, width, out)?,
            Ok(None) => {}
            Err(err) => {
                log::warn!("script line {}: {:#}", idx + 1, err);
                writeln!(out, "! line {}: {:#}", idx + 1, err)?;
            }
        }

        for message in session.notifications().drain() {
            writeln!(out, "[{}] {}", message.level, message.text)?;
        }
    }
    Ok(())
}

fn apply<W: Write>(session: &Session, step: ScriptLine, width: u16, out: &mut W) -> Result<()> {
    match step {
        ScriptLine::Event(event) => session.handle_event(&event),
        // Failures were already turned into notifications.
        ScriptLine::Select(target) => {
            let _ = session.select(&target);
        }
        ScriptLine::Command { id, args } => {
            let _ = session.execute_command(&id, &args);
        }
        ScriptLine::Status => writeln!(out, "{}", session.status_line(width))?,
        ScriptLine::List => {
            for item in session.selection_items() {
                let marker = if item.active { '*' } else { ' ' };
                match item.description {
                    Some(description) => writeln!(
                        out,
                        "{} {:<12} {} - {}",
                        marker, item.id, item.name, description
                    )?,
                    None => writeln!(out, "{} {:<12} {}", marker, item.id, item.name)?,
                }
            }
        }
    }
    Ok(())
}
