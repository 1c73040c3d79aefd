use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use docchat_client::ClientError;
use docchat_session::{
    DocumentId, ExchangeProgress, SessionController, SessionState, StreamEvent, StreamingExchange,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::commands::{self, Command, Target, HELP};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Line-oriented front-end over a `SessionController`
///
/// Input lines and stream items are interleaved, so every command stays usable
/// while a reply is arriving.
pub struct Repl<W: Write> {
    controller: SessionController,
    exchange: Option<StreamingExchange>,
    /// Bytes of the in-flight reply already written out
    printed: usize,
    out: W,
}

impl<W: Write> Repl<W> {
    pub fn new(controller: SessionController, out: W) -> Self {
        Self {
            controller,
            exchange: None,
            printed: 0,
            out,
        }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn is_streaming(&self) -> bool {
        self.exchange.is_some()
    }

    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<()> {
        let mut lines = input.lines();

        if !self.controller.refresh_threads().await {
            writeln!(self.out, "Could not reach the server; chat history is unavailable.")?;
        }
        writeln!(self.out, "Type a message to chat, or /help for commands.")?;
        self.prompt()?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line.context("Failed to read input")? {
                        Some(line) => {
                            if self.handle_line(&line).await? == Flow::Quit {
                                break;
                            }
                        }
                        None => {
                            self.finish_exchange().await?;
                            break;
                        }
                    }
                }
                item = next_item(&mut self.exchange), if self.exchange.is_some() => {
                    self.handle_item(item).await?;
                }
            }
        }

        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    /// Drive the in-flight reply, if any, to its end
    pub async fn finish_exchange(&mut self) -> Result<()> {
        while self.exchange.is_some() {
            let item = next_item(&mut self.exchange).await;
            self.handle_item(item).await?;
        }
        Ok(())
    }

    pub async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let command = match commands::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => {
                if !self.is_streaming() {
                    self.prompt()?;
                }
                return Ok(Flow::Continue);
            }
            Err(e) => {
                writeln!(self.out, "{}", e)?;
                return Ok(Flow::Continue);
            }
        };

        if self.is_streaming() {
            writeln!(self.out)?;
        }
        let flow = self.execute(command).await?;

        // Navigation leaves the controller idle; the old reply is abandoned
        if self.exchange.is_some() && self.controller.state() == SessionState::Idle {
            tracing::debug!("Dropping abandoned exchange");
            self.exchange = None;
            self.printed = 0;
        }
        self.show_notices()?;

        if flow == Flow::Continue && !self.is_streaming() {
            self.prompt()?;
        }
        Ok(flow)
    }

    async fn handle_item(&mut self, item: Option<Result<StreamEvent, ClientError>>) -> Result<()> {
        let Some(exchange) = self.exchange.as_mut() else {
            return Ok(());
        };
        let progress = self.controller.handle_stream_item(exchange, item).await;

        match progress {
            ExchangeProgress::Applied => self.print_new_text()?,
            ExchangeProgress::Completed => writeln!(self.out)?,
            ExchangeProgress::Failed => {
                writeln!(self.out)?;
                self.print_last_reply()?;
            }
            ExchangeProgress::Stale => {}
        }

        if progress.is_finished() {
            self.exchange = None;
            self.printed = 0;
            self.show_notices()?;
            self.prompt()?;
        }
        Ok(())
    }

    async fn execute(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Submit(text) => {
                if self.is_streaming() {
                    writeln!(
                        self.out,
                        "Still answering. Wait for the reply or start another chat."
                    )?;
                    return Ok(Flow::Continue);
                }
                match self.controller.submit(&text).await {
                    Some(exchange) => {
                        write!(self.out, "assistant> ")?;
                        self.out.flush()?;
                        self.exchange = Some(exchange);
                        self.printed = 0;
                    }
                    None => self.print_last_reply()?,
                }
            }
            Command::NewThread => {
                self.controller.start_new_thread().await;
                writeln!(self.out, "Started a new chat.")?;
            }
            Command::Threads => self.print_threads()?,
            Command::Switch(target) => {
                if let Some(id) = self.resolve_thread(target)? {
                    if self.controller.switch_thread(&id).await {
                        self.print_transcript()?;
                    }
                }
            }
            Command::Delete(target) => {
                if let Some(id) = self.resolve_thread(target)? {
                    self.controller.delete_thread(&id).await;
                    writeln!(self.out, "Deleted chat {}.", id)?;
                }
            }
            Command::Reset => {
                self.controller.reset_current_thread().await;
                writeln!(self.out, "Chat cleared.")?;
            }
            Command::Upload(path) => {
                if let Some(document) = self.controller.upload_document_from_path(&path).await {
                    if let Some(preview) = &document.preview {
                        writeln!(self.out, "  {}", preview.trim())?;
                    }
                }
            }
            Command::Docs => self.print_documents()?,
            Command::Toggle(position) => {
                if let Some(id) = self.resolve_document(position)? {
                    match self.controller.toggle_document(&id) {
                        Some(true) => writeln!(self.out, "Attached document {}.", position)?,
                        Some(false) => writeln!(self.out, "Detached document {}.", position)?,
                        None => {}
                    }
                }
            }
            Command::RemoveDoc(position) => {
                if let Some(id) = self.resolve_document(position)? {
                    self.controller.remove_document(&id);
                    writeln!(self.out, "Removed document {}.", position)?;
                }
            }
            Command::Pdfs => match self.controller.server_documents().await {
                Ok(pdfs) if pdfs.is_empty() => writeln!(self.out, "The server holds no PDFs.")?,
                Ok(pdfs) => {
                    for pdf in pdfs {
                        writeln!(
                            self.out,
                            "  {}  {}  {}",
                            pdf.id,
                            pdf.filename,
                            format_time(pdf.uploaded_at)
                        )?;
                    }
                }
                Err(e) => writeln!(self.out, "Could not list server PDFs: {}", e)?,
            },
            Command::Health => match self.controller.health().await {
                Ok(health) => {
                    writeln!(
                        self.out,
                        "Server {} (database: {}, cached PDFs: {})",
                        health.status,
                        health.database_status.as_deref().unwrap_or("unknown"),
                        health
                            .pdf_cache_size
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| "?".to_string())
                    )?;
                }
                Err(e) => writeln!(self.out, "Server unreachable: {}", e)?,
            },
            Command::Status => self.print_status()?,
            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn resolve_thread(&mut self, target: Target) -> Result<Option<String>> {
        match target {
            Target::Id(id) => Ok(Some(id)),
            Target::Position(n) => match self.controller.directory().threads().get(n - 1) {
                Some(thread) => Ok(Some(thread.id.clone())),
                None => {
                    writeln!(self.out, "No chat number {} (see /threads).", n)?;
                    Ok(None)
                }
            },
        }
    }

    fn resolve_document(&mut self, position: usize) -> Result<Option<DocumentId>> {
        match self.controller.documents().documents().get(position - 1) {
            Some(document) => Ok(Some(document.id.clone())),
            None => {
                writeln!(self.out, "No document number {} (see /docs).", position)?;
                Ok(None)
            }
        }
    }

    fn print_new_text(&mut self) -> Result<()> {
        if let Some(text) = self.controller.transcript().in_flight() {
            write!(self.out, "{}", &text[self.printed..])?;
            self.printed = text.len();
            self.out.flush()?;
        }
        Ok(())
    }

    fn print_last_reply(&mut self) -> Result<()> {
        if let Some(message) = self
            .controller
            .transcript()
            .messages()
            .last()
            .filter(|m| !m.is_user())
        {
            writeln!(self.out, "assistant> {}", message.content)?;
        }
        Ok(())
    }

    fn print_transcript(&mut self) -> Result<()> {
        for message in self.controller.transcript().messages() {
            let speaker = if message.is_user() { "you" } else { "assistant" };
            writeln!(self.out, "{}> {}", speaker, message.content)?;
        }
        Ok(())
    }

    fn print_threads(&mut self) -> Result<()> {
        let directory = self.controller.directory();
        if directory.is_empty() {
            writeln!(self.out, "No saved chats.")?;
            return Ok(());
        }
        let current = self.controller.current_thread_id();
        for (i, thread) in directory.threads().iter().enumerate() {
            let marker = if thread.id == current { '*' } else { ' ' };
            writeln!(
                self.out,
                "{}{:>3}. {}  ({} messages, {})",
                marker,
                i + 1,
                thread.title,
                thread.message_count,
                format_time(thread.last_activity)
            )?;
        }
        Ok(())
    }

    fn print_documents(&mut self) -> Result<()> {
        let registry = self.controller.documents();
        if registry.is_empty() {
            writeln!(
                self.out,
                "No documents uploaded (up to {}).",
                registry.capacity()
            )?;
            return Ok(());
        }
        for (i, document) in registry.documents().iter().enumerate() {
            let marker = if registry.is_active(&document.id) { "[x]" } else { "[ ]" };
            writeln!(self.out, "{} {}. {}", marker, i + 1, document.filename)?;
        }
        Ok(())
    }

    fn print_status(&mut self) -> Result<()> {
        let controller = &self.controller;
        let active = controller.documents().active_filenames();
        writeln!(self.out, "Chat: {}", controller.current_thread_id())?;
        writeln!(self.out, "State: {:?}", controller.state())?;
        if active.is_empty() {
            writeln!(self.out, "Attached documents: none")?;
        } else {
            writeln!(
                self.out,
                "Attached documents ({}): {}",
                active.len(),
                active.join(", ")
            )?;
        }
        Ok(())
    }

    fn show_notices(&mut self) -> Result<()> {
        for notice in self.controller.drain_notices() {
            writeln!(self.out, "! {}", notice)?;
        }
        Ok(())
    }

    fn prompt(&mut self) -> Result<()> {
        write!(self.out, "you> ")?;
        self.out.flush()?;
        Ok(())
    }
}

async fn next_item(
    exchange: &mut Option<StreamingExchange>,
) -> Option<Result<StreamEvent, ClientError>> {
    match exchange {
        Some(exchange) => exchange.next_item().await,
        None => std::future::pending().await,
    }
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    match time {
        Some(time) => time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => "no activity".to_string(),
    }
}
