//! Password prompt.

use std::io::{BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Done,
    Cancelled,
}

/// Reads a password from the terminal without echoing it.
///
/// Piped input is read as a single line.
///
/// # Errors
///
/// Returns an error if stdin cannot be read, the prompt is cancelled with
/// Ctrl-C or Esc, or the password is empty.
pub fn read_password(prompt: &str) -> anyhow::Result<String> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;

    let password = if std::io::stdin().is_terminal() {
        read_hidden()?
    } else {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_string()
    };
    anyhow::ensure!(!password.is_empty(), "no password given");
    Ok(password)
}

fn read_hidden() -> anyhow::Result<String> {
    terminal::enable_raw_mode()?;
    let typed = read_keys();
    terminal::disable_raw_mode()?;
    eprintln!();
    typed
}

fn read_keys() -> anyhow::Result<String> {
    let mut buffer = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        match apply_key(&mut buffer, key) {
            KeyOutcome::Continue => {}
            KeyOutcome::Done => return Ok(buffer),
            KeyOutcome::Cancelled => anyhow::bail!("password entry cancelled"),
        }
    }
}

fn apply_key(buffer: &mut String, key: KeyEvent) -> KeyOutcome {
    if key.kind == KeyEventKind::Release {
        return KeyOutcome::Continue;
    }
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c' | 'd')) | (_, KeyCode::Esc) => {
            KeyOutcome::Cancelled
        }
        (_, KeyCode::Enter) => KeyOutcome::Done,
        (_, KeyCode::Backspace) => {
            buffer.pop();
            KeyOutcome::Continue
        }
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
            buffer.push(c);
            KeyOutcome::Continue
        }
        _ => KeyOutcome::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn typed(keys: &[KeyEvent]) -> (String, KeyOutcome) {
        let mut buffer = String::new();
        let mut outcome = KeyOutcome::Continue;
        for key in keys {
            outcome = apply_key(&mut buffer, *key);
            if outcome != KeyOutcome::Continue {
                break;
            }
        }
        (buffer, outcome)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_and_backspace_edit_the_buffer() {
        let (buffer, outcome) = typed(&[
            key(KeyCode::Char('s')),
            KeyEvent::new(KeyCode::Char('E'), KeyModifiers::SHIFT),
            key(KeyCode::Char('x')),
            key(KeyCode::Backspace),
            key(KeyCode::Char('c')),
            key(KeyCode::Enter),
            key(KeyCode::Char('z')),
        ]);

        assert_eq!(buffer, "sEc");
        assert_eq!(outcome, KeyOutcome::Done);
    }

    #[test]
    fn ctrl_c_cancels() {
        let (_, outcome) = typed(&[
            key(KeyCode::Char('a')),
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ]);

        assert_eq!(outcome, KeyOutcome::Cancelled);
    }

    #[test]
    fn releases_and_navigation_are_ignored() {
        let mut release = key(KeyCode::Char('q'));
        release.kind = KeyEventKind::Release;

        let (buffer, outcome) = typed(&[release, key(KeyCode::Left), key(KeyCode::Char('w'))]);

        assert_eq!(buffer, "w");
        assert_eq!(outcome, KeyOutcome::Continue);
    }
}
