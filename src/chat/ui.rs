//! UI surfaces a resolution session can talk to.
//!
//! The surface is chosen once per session and handed to the resolver. Only the
//! terminal surface can ask the user to pick between conversations.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::alias::AliasShortener;
use super::render::render_menu;
use super::types::Conversation;
use crate::error::Result;

/// Session UI.
pub enum ChatUi {
    /// Line-oriented terminal session.
    Terminal(Terminal),
    /// Machine-driven session (JSON output, scripts). Never prompts.
    Api,
}

impl ChatUi {
    pub fn can_prompt(&self) -> bool {
        matches!(self, ChatUi::Terminal(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChatUi::Terminal(_) => "terminal",
            ChatUi::Api => "api",
        }
    }
}

/// Where a terminal reads its lines from.
enum Input {
    Reader(Box<dyn AsyncBufRead + Unpin + Send>),
    /// Lines forwarded by a dedicated blocking reader thread.
    Lines(mpsc::Receiver<io::Result<String>>),
}

impl Input {
    /// Cancel safe: a line is either fully delivered or left for the next call.
    async fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        match self {
            Input::Reader(reader) => reader.read_line(buf).await,
            Input::Lines(rx) => match rx.recv().await {
                Some(Ok(line)) => {
                    buf.push_str(&line);
                    Ok(line.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            },
        }
    }
}

/// Prompting terminal over an async reader and writer.
pub struct Terminal {
    input: Input,
    writer: Box<dyn AsyncWrite + Unpin + Send>,
}

impl Terminal {
    pub fn new(
        reader: impl AsyncBufRead + Unpin + Send + 'static,
        writer: impl AsyncWrite + Unpin + Send + 'static,
    ) -> Self {
        Self {
            input: Input::Reader(Box::new(reader)),
            writer: Box::new(writer),
        }
    }

    /// Terminal over a blocking reader, read on its own OS thread.
    ///
    /// A blocked read never holds up runtime shutdown: the thread is detached
    /// and exits once the terminal is dropped and its next line is delivered.
    pub fn from_blocking_reader(
        mut reader: impl std::io::BufRead + Send + 'static,
        writer: impl AsyncWrite + Unpin + Send + 'static,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::channel(1);
        std::thread::Builder::new()
            .name("chatctl-input".to_string())
            .spawn(move || loop {
                let mut line = String::new();
                let read = reader.read_line(&mut line);
                let done = !matches!(read, Ok(n) if n > 0);
                if tx.blocking_send(read.map(|_| line)).is_err() || done {
                    break;
                }
            })?;

        Ok(Self {
            input: Input::Lines(rx),
            writer: Box::new(writer),
        })
    }

    /// Terminal bound to the process stdin/stdout.
    pub fn stdio() -> Result<Self> {
        Self::from_blocking_reader(
            std::io::BufReader::new(std::io::stdin()),
            tokio::io::stdout(),
        )
    }

    async fn write_str(&mut self, s: &str) -> Result<()> {
        self.writer.write_all(s.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Ask for an integer in `[low, high]` until one is entered.
    ///
    /// Bad input is reported and re-prompted. A closed input stream and a
    /// cancelled token both end the loop with an I/O error.
    pub async fn prompt_integer(
        &mut self,
        low: i64,
        high: i64,
        cancel: &CancellationToken,
    ) -> Result<i64> {
        loop {
            self.write_str(&format!("Select a conversation [{}-{}]: ", low, high))
                .await?;

            let mut line = String::new();
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "selection cancelled").into());
                }
                r = self.input.read_line(&mut line) => r?,
            };
            if read == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input closed before a conversation was selected",
                )
                .into());
            }

            let input = line.trim();
            match input.parse::<i64>() {
                Ok(n) if (low..=high).contains(&n) => return Ok(n),
                Ok(n) => {
                    tracing::debug!("selection {} out of range {}-{}", n, low, high);
                    self.write_str(&format!(
                        "{} is out of range, enter a number between {} and {}\n",
                        n, low, high
                    ))
                    .await?;
                }
                Err(_) => {
                    self.write_str(&format!("'{}' is not a number\n", input))
                        .await?;
                }
            }
        }
    }

    /// Show a numbered menu of `convs` and return the zero-based index picked.
    pub async fn choose(
        &mut self,
        convs: &[Conversation],
        shortener: &AliasShortener,
        cancel: &CancellationToken,
    ) -> Result<usize> {
        let menu = render_menu(convs, shortener);
        self.write_str(&format!(
            "Multiple conversations match:\n{}\n",
            menu
        ))
        .await?;

        let picked = self.prompt_integer(1, convs.len() as i64, cancel).await?;
        Ok((picked - 1) as usize)
    }
}
