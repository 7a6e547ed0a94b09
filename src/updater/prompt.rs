//! Interactive questions on the terminal

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

#[async_trait::async_trait]
pub trait Prompter: Send + Sync {
    /// Ask a question and return the trimmed answer, or `None` once input is closed
    async fn ask(&self, question: &str) -> std::io::Result<Option<String>>;
}

/// Reads answers line by line, printing questions to stdout
///
/// The reader is kept for the lifetime of the prompter so buffered lines
/// of piped input survive between questions.
#[derive(Debug)]
pub struct TerminalPrompter<R = BufReader<Stdin>> {
    input: Mutex<R>,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::with_input(BufReader::new(tokio::io::stdin()))
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> TerminalPrompter<R> {
    pub fn with_input(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

#[async_trait::async_trait]
impl<R> Prompter for TerminalPrompter<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn ask(&self, question: &str) -> std::io::Result<Option<String>> {
        print!("{} ", question);
        std::io::stdout().flush()?;

        let mut input = self.input.lock().await;
        let mut answer = String::new();
        if input.read_line(&mut answer).await? == 0 {
            return Ok(None);
        }

        Ok(Some(answer.trim().to_string()))
    }
}
