// src/build/stdin.rs

use std::io::{IsTerminal, Read};

use anyhow::Context;

use crate::errors::Result;

/// Read everything piped on stdin.
///
/// Returns `None` when stdin is a terminal (nothing was piped) or when the
/// pipe was empty. Blocks until EOF, so call it from `spawn_blocking`.
pub fn capture_stdin() -> Result<Option<Vec<u8>>> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    read_all(stdin.lock())
}

fn read_all(mut reader: impl Read) -> Result<Option<Vec<u8>>> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .context("reading captured stdin")?;
    Ok(if bytes.is_empty() { None } else { Some(bytes) })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn empty_pipe_is_none() {
        assert_eq!(read_all(Cursor::new(Vec::new())).unwrap(), None);
    }

    #[test]
    fn piped_bytes_are_returned_verbatim() {
        let captured = read_all(Cursor::new(b"object Main\n".to_vec())).unwrap();
        assert_eq!(captured.as_deref(), Some(&b"object Main\n"[..]));
    }
}
