//! Parsing of REPL input lines.
//!
//! Lines starting with `/` are commands; everything else is a chat message.
//! List positions are 1-based, matching what `/threads` and `/docs` print.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(String),
    NewThread,
    Threads,
    Switch(Target),
    Delete(Target),
    Reset,
    Upload(PathBuf),
    Docs,
    Toggle(usize),
    RemoveDoc(usize),
    Pdfs,
    Health,
    Status,
    Help,
    Quit,
}

/// A thread picked by list position or by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Position(usize),
    Id(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command: /{0} (try /help)")]
    UnknownCommand(String),

    #[error("/{command} needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    #[error("Not a list position: {0}")]
    InvalidPosition(String),
}

pub const HELP: &str = "\
Commands:
  /new              start a new chat
  /threads          list chats
  /switch <n|id>    open a chat
  /delete <n|id>    delete a chat
  /reset            delete the current chat and start over
  /upload <path>    upload a PDF
  /docs             list uploaded PDFs
  /toggle <n>       attach or detach a PDF for the next messages
  /rmdoc <n>        forget an uploaded PDF
  /pdfs             list PDFs the server holds
  /health           check the server
  /status           show the current chat and attached PDFs
  /help             show this help
  /quit             exit
Anything else is sent as a message.";

/// Parse one input line; `Ok(None)` for blank lines
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Submit(line.to_string())));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "new" => Command::NewThread,
        "threads" => Command::Threads,
        "switch" => Command::Switch(target("switch", arg)?),
        "delete" => Command::Delete(target("delete", arg)?),
        "reset" => Command::Reset,
        "upload" => {
            if arg.is_empty() {
                return Err(ParseError::MissingArgument {
                    command: "upload",
                    what: "a file path",
                });
            }
            Command::Upload(PathBuf::from(arg))
        }
        "docs" => Command::Docs,
        "toggle" => Command::Toggle(position("toggle", arg)?),
        "rmdoc" => Command::RemoveDoc(position("rmdoc", arg)?),
        "pdfs" => Command::Pdfs,
        "health" => Command::Health,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

fn target(command: &'static str, arg: &str) -> Result<Target, ParseError> {
    if arg.is_empty() {
        return Err(ParseError::MissingArgument {
            command,
            what: "a chat number or id",
        });
    }
    Ok(match arg.parse::<usize>() {
        Ok(n) if n > 0 => Target::Position(n),
        _ => Target::Id(arg.to_string()),
    })
}

fn position(command: &'static str, arg: &str) -> Result<usize, ParseError> {
    if arg.is_empty() {
        return Err(ParseError::MissingArgument {
            command,
            what: "a document number",
        });
    }
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::InvalidPosition(arg.to_string())),
    }
}
