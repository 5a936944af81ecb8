//! Terminal I/O utilities.
//!
//! Provides TTY detection and password prompting.

use std::io::{self, BufRead, IsTerminal, Write};

use crate::error::{Error, Result};

pub fn is_stdin_tty() -> bool {
    io::stdin().is_terminal()
}

/// Print `message` on stderr and read one answer from stdin.
///
/// The answer is kept as typed apart from the line ending. End of input is an error
/// so a closed stdin cannot turn a retry loop into a busy loop.
pub fn prompt_password(message: &str) -> Result<String> {
    eprint!("{}", message);
    io::stderr().flush().ok();

    read_answer(&mut io::stdin().lock())
}

fn read_answer(reader: &mut dyn BufRead) -> Result<String> {
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .map_err(|e| Error::internal_io(format!("Failed to read input: {}", e), None))?;

    if read == 0 {
        return Err(Error::internal_io(
            "Standard input closed while waiting for a password",
            Some("prompt".to_string()),
        )
        .with_hint("Provide passwords in recette.json or the system keychain when running unattended"));
    }

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn answer_keeps_surrounding_spaces() {
        let mut input = Cursor::new("  s3cret  \n");
        assert_eq!(read_answer(&mut input).unwrap(), "  s3cret  ");
    }

    #[test]
    fn blank_answer_is_not_empty() {
        let mut input = Cursor::new("   \r\n");
        assert_eq!(read_answer(&mut input).unwrap(), "   ");
    }

    #[test]
    fn bare_newline_is_empty() {
        let mut input = Cursor::new("\n");
        assert_eq!(read_answer(&mut input).unwrap(), "");
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut input = Cursor::new("");
        let err = read_answer(&mut input).unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }
}
