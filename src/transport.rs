//! Message transport
//!
//! Delivers inbound chat lines to the bot and sends replies back.
//! [`ConsoleTransport`] drives the bot from stdin for local runs.

use async_trait::async_trait;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout,
};
use tokio::sync::Mutex;

pub const CONSOLE_USER: &str = "console";

/// A text message from a platform user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub user_id: String,
    pub text: String,
}

impl InboundMessage {
    /// Parse a `<user_id>: <text>` line. Lines without a user go to [`CONSOLE_USER`].
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (user_id, text) = match line.split_once(':') {
            Some((user, text)) if is_user_id(user.trim()) => (user.trim(), text.trim()),
            _ => (CONSOLE_USER, line),
        };

        Some(Self {
            user_id: user_id.to_string(),
            text: text.to_string(),
        })
    }
}

fn is_user_id(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '#'))
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Next inbound message, or `None` once the transport is closed
    async fn next_message(&self) -> crate::Result<Option<InboundMessage>>;

    async fn send(&self, to: &InboundMessage, text: &str) -> crate::Result<()>;
}

/// Line-oriented transport: one `<user_id>: <text>` message per input line,
/// one `[<user_id>] <reply>` line per output
pub struct LineTransport<R, W> {
    input: Mutex<Lines<BufReader<R>>>,
    output: Mutex<W>,
}

pub type ConsoleTransport = LineTransport<Stdin, Stdout>;

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            input: Mutex::new(BufReader::new(reader).lines()),
            output: Mutex::new(writer),
        }
    }
}

impl ConsoleTransport {
    pub fn console() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

#[async_trait]
impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn next_message(&self) -> crate::Result<Option<InboundMessage>> {
        let mut input = self.input.lock().await;
        while let Some(line) = input.next_line().await? {
            if let Some(message) = InboundMessage::from_line(&line) {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }

    async fn send(&self, to: &InboundMessage, text: &str) -> crate::Result<()> {
        let mut output = self.output.lock().await;
        output
            .write_all(format!("[{}] {}\n", to.user_id, text).as_bytes())
            .await?;
        output.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_with_user() {
        assert_eq!(
            InboundMessage::from_line("alice: !ask hello"),
            Some(InboundMessage {
                user_id: "alice".to_string(),
                text: "!ask hello".to_string(),
            })
        );
    }

    #[test]
    fn test_line_without_user() {
        let message = InboundMessage::from_line("!ask what time is it: noon?").unwrap();
        assert_eq!(message.user_id, CONSOLE_USER);
        assert_eq!(message.text, "!ask what time is it: noon?");

        assert_eq!(InboundMessage::from_line("   "), None);
    }

    #[tokio::test]
    async fn test_line_transport_reads_and_skips_blank_lines() {
        let reader = tokio_test::io::Builder::new()
            .read(b"alice: !ask hello\n\n")
            .read(b"bob: !help\n")
            .build();
        let writer = tokio_test::io::Builder::new().build();
        let transport = LineTransport::new(reader, writer);

        let first = transport.next_message().await.unwrap().unwrap();
        assert_eq!(first.user_id, "alice");
        assert_eq!(first.text, "!ask hello");

        let second = transport.next_message().await.unwrap().unwrap();
        assert_eq!(second.user_id, "bob");

        assert_eq!(transport.next_message().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_line_transport_writes_reply() {
        let reader = tokio_test::io::Builder::new().build();
        let writer = tokio_test::io::Builder::new()
            .write(b"[alice] hi!\n")
            .build();
        let transport = LineTransport::new(reader, writer);

        let to = InboundMessage::from_line("alice: !ask hello").unwrap();
        transport.send(&to, "hi!").await.unwrap();
    }
}
