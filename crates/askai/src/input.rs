//! Reading the prompt and piped context.

use std::io::{BufRead, Write};

use askai_rs::Message;

/// Read piped input line by line, joining non-empty pieces with `\n`.
///
/// Lines must be valid UTF-8.
pub fn read_streamed<R: BufRead>(mut reader: R) -> Result<String, String> {
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| format!("failed to read prompt from stdin: {e}"))?;
        if read == 0 {
            break;
        }

        let line = std::str::from_utf8(&buf)
            .map_err(|_| "input from stdin is not valid utf-8".to_string())?;
        let line = line.trim_end_matches(['\n', '\r']);

        if !text.is_empty() && !line.is_empty() {
            text.push('\n');
        }
        text.push_str(line);
    }

    Ok(text)
}

/// Read the stdin part of the message.
///
/// Piped input is read to the end. On a terminal, one line is asked for
/// only when there is no command-line prompt and batch mode is off.
pub fn read_stdin<R, W>(
    reader: R,
    is_terminal: bool,
    has_prompt: bool,
    batch: bool,
    output: &mut W,
) -> Result<String, String>
where
    R: BufRead,
    W: Write,
{
    let text = if !is_terminal {
        read_streamed(reader)?
    } else if !has_prompt && !batch {
        writeln!(output, "Enter prompt to AI:")
            .and_then(|()| output.flush())
            .map_err(|e| format!("failed to write to stdout: {e}"))?;
        let mut line = String::new();
        let mut reader = reader;
        reader
            .read_line(&mut line)
            .map_err(|e| format!("failed to read prompt from stdin: {e}"))?;
        line
    } else {
        String::new()
    };

    Ok(text.trim().to_string())
}

/// Combine the command-line prompt and the stdin text.
pub fn build_message(prompt: &str, stdin_text: String) -> Result<Message, String> {
    let message = Message::new(prompt.trim(), stdin_text);
    if message.is_empty() {
        return Err("prompt to AI is empty".to_string());
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn piped_lines_are_joined() {
        let text = read_streamed(Cursor::new("first\r\nsecond\n\nthird")).unwrap();
        assert_eq!(text, "first\nsecond\nthird");
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = read_streamed(Cursor::new(vec![b'o', b'k', b'\n', 0xff, 0xfe])).unwrap_err();
        assert_eq!(err, "input from stdin is not valid utf-8");
    }

    #[test]
    fn terminal_asks_only_without_prompt() {
        let mut out = Vec::new();
        let text = read_stdin(Cursor::new("  typed question \n"), true, false, false, &mut out).unwrap();
        assert_eq!(text, "typed question");
        assert_eq!(out, b"Enter prompt to AI:\n");

        let mut out = Vec::new();
        let text = read_stdin(Cursor::new("ignored\n"), true, true, false, &mut out).unwrap();
        assert_eq!(text, "");
        assert!(out.is_empty());

        let text = read_stdin(Cursor::new("ignored\n"), true, false, true, &mut Vec::<u8>::new()).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn piped_input_is_trimmed() {
        let text = read_stdin(Cursor::new("\n  log line\n"), false, true, true, &mut Vec::<u8>::new()).unwrap();
        assert_eq!(text, "log line");
    }

    #[test]
    fn empty_message_is_an_error() {
        assert_eq!(build_message("  ", String::new()).unwrap_err(), "prompt to AI is empty");
        let message = build_message("Explain", "context".into()).unwrap();
        assert_eq!(message.full_prompt(), "Explain\ncontext");
    }
}
