use std::fmt;

use exam_core::model::{AnswerValue, QuestionKind};

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    /// Zero-based; the user types one-based numbers.
    GoTo(usize),
    Answer(String),
    Bookmark,
    Submit,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    MissingArgument(&'static str),
    InvalidNumber(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "type a command (h for help)"),
            CommandError::Unknown(cmd) => write!(f, "unknown command: {cmd}"),
            CommandError::MissingArgument(cmd) => write!(f, "{cmd} needs an argument"),
            CommandError::InvalidNumber(raw) => write!(f, "not a question number: {raw}"),
        }
    }
}

impl std::error::Error for CommandError {}

pub const HELP: &str = "\
commands:
  n | next          next question
  p | prev          previous question
  g <n>             go to question n
  a <answer>        answer: option id, ids separated by commas (multi-select), or text
  b                 toggle bookmark on the current question
  s | submit        submit the exam
  show              redraw the current question
  q | quit          leave without submitting";

/// Parse a line of input.
///
/// # Errors
///
/// Returns `CommandError` for empty, unknown or malformed commands.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head {
        "" => Err(CommandError::Empty),
        "n" | "next" => Ok(Command::Next),
        "p" | "prev" | "previous" => Ok(Command::Previous),
        "g" | "go" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument("g"));
            }
            match rest.parse::<usize>() {
                Ok(n) if n > 0 => Ok(Command::GoTo(n - 1)),
                _ => Err(CommandError::InvalidNumber(rest.to_string())),
            }
        }
        "a" | "answer" => {
            if rest.is_empty() {
                Err(CommandError::MissingArgument("a"))
            } else {
                Ok(Command::Answer(rest.to_string()))
            }
        }
        "b" | "bookmark" => Ok(Command::Bookmark),
        "s" | "submit" => Ok(Command::Submit),
        "show" => Ok(Command::Show),
        "h" | "help" | "?" => Ok(Command::Help),
        "q" | "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

/// Interpret typed answer text for a question of `kind`.
///
/// For multi-select a comma-separated list replaces the selection and a
/// single id toggles it.
#[must_use]
pub fn answer_value(kind: QuestionKind, raw: &str) -> AnswerValue {
    match kind {
        QuestionKind::SingleChoice => AnswerValue::option(raw.trim()),
        QuestionKind::MultiSelect if raw.contains(',') => AnswerValue::options(
            raw.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty()),
        ),
        QuestionKind::MultiSelect => AnswerValue::option(raw.trim()),
        QuestionKind::FreeResponse => AnswerValue::text(raw),
    }
}
