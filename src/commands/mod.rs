pub mod console;

use crate::widget::UserAction;
use std::fmt;

/// Команда консоли
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action(UserAction),
    /// `call <id>`: ввести id и сразу позвонить
    CallTo(String),
    Show,
    Json,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command: {} (type `help`)", self.0)
    }
}

pub const HELP: &str = "\
commands:
  target <id>   type the remote peer id
  call [<id>]   call the typed id (or <id>)
  hangup        end the current call
  copy          copy my id to the clipboard
  show          print the widget
  json          print the widget as JSON
  quit          leave";

/// Разбор строки ввода; пустая строка = None
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let cmd = match word {
        "target" => Command::Action(UserAction::SetTarget(rest.to_string())),
        "call" if rest.is_empty() => Command::Action(UserAction::Call),
        "call" => Command::CallTo(rest.to_string()),
        "hangup" => Command::Action(UserAction::HangUp),
        "copy" => Command::Action(UserAction::CopyId),
        "show" => Command::Show,
        "json" => Command::Json,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError(other.to_string())),
    };
    Ok(Some(cmd))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse("  ").unwrap(), None);
        assert_eq!(
            parse("target ABC123").unwrap(),
            Some(Command::Action(UserAction::SetTarget("ABC123".into())))
        );
        assert_eq!(
            parse("target").unwrap(),
            Some(Command::Action(UserAction::SetTarget(String::new())))
        );
        assert_eq!(parse("call").unwrap(), Some(Command::Action(UserAction::Call)));
        assert_eq!(parse("call  xyz ").unwrap(), Some(Command::CallTo("xyz".into())));
        assert_eq!(parse("copy").unwrap(), Some(Command::Action(UserAction::CopyId)));
        assert_eq!(parse("exit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn unknown_command() {
        let err = parse("dial 42").unwrap_err();
        assert_eq!(err, ParseError("dial".into()));
        assert!(err.to_string().contains("help"));
    }
}
