//! Handling of console input lines.

use tokio::io::{AsyncBufRead, Lines};
use tokio::select;

/// What a line typed at the prompt asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// End the session.
    Exit,
    /// Start a new conversation.
    Reset,
    /// Nothing was typed.
    Empty,
    /// Send the text to the assistant.
    Message(&'a str),
}

impl<'a> Command<'a> {
    /// Interprets one input line. Commands are matched case-insensitively.
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Command::Empty
        } else if line.eq_ignore_ascii_case("exit")
            || line.eq_ignore_ascii_case("quit")
        {
            Command::Exit
        } else if line.eq_ignore_ascii_case("reset") {
            Command::Reset
        } else {
            Command::Message(line)
        }
    }
}

/// The outcome of waiting at the prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Prompt {
    /// A line was entered.
    Line(String),
    /// The input ended or could not be read.
    Closed,
    /// The user interrupted the prompt.
    Interrupted,
}

/// Waits for the next input line, or for `interrupt` to fire first.
pub async fn next_prompt<R, F>(input: &mut Lines<R>, interrupt: F) -> Prompt
where
    R: AsyncBufRead + Unpin,
    F: Future,
{
    select! {
        _ = interrupt => Prompt::Interrupted,
        line = input.next_line() => match line {
            Ok(Some(line)) => Prompt::Line(line),
            Ok(None) => Prompt::Closed,
            Err(err) => {
                error!("error reading input: {err}");
                Prompt::Closed
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::future::{pending, ready};

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};

    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Command::parse("exit\n"), Command::Exit);
        assert_eq!(Command::parse("  QUIT "), Command::Exit);
        assert_eq!(Command::parse("Reset"), Command::Reset);
        assert_eq!(Command::parse("   \n"), Command::Empty);
        assert_eq!(
            Command::parse(" What is the debt today?\n"),
            Command::Message("What is the debt today?")
        );
        assert_eq!(
            Command::parse("exit the building"),
            Command::Message("exit the building")
        );
    }

    #[tokio::test]
    async fn test_interrupt_while_waiting_for_input() {
        let (_writer, reader) = duplex(64);
        let mut input = BufReader::new(reader).lines();
        assert_eq!(next_prompt(&mut input, ready(())).await, Prompt::Interrupted);

        // The prompt keeps working after an interrupt.
        assert_eq!(next_prompt(&mut input, ready(())).await, Prompt::Interrupted);
    }

    #[tokio::test]
    async fn test_line_and_end_of_input() {
        let (mut writer, reader) = duplex(64);
        let mut input = BufReader::new(reader).lines();

        writer.write_all(b"What is the debt?\n").await.unwrap();
        assert_eq!(
            next_prompt(&mut input, pending::<()>()).await,
            Prompt::Line("What is the debt?".to_owned())
        );

        drop(writer);
        assert_eq!(next_prompt(&mut input, pending::<()>()).await, Prompt::Closed);
    }
}
