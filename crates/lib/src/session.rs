//! The interactive session loop.
//!
//! Drives one [`SessionClient`] from a line-oriented terminal: prompt,
//! read a command, send it, wait for the one response, print it. The loop
//! ends on end-of-input, a local `exit`, or the server hanging up; the
//! protocol itself has no termination command.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::client::{ClientError, SessionClient};

/// Prompt written before each command is read
pub const PROMPT: &str = "kvsh> ";

/// Notice printed when the server closes the connection mid-session
const DISCONNECT_NOTICE: &str = "server closed the connection";

/// Errors from the interactive loop
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("terminal I/O failed: {0}")]
    Terminal(#[from] std::io::Error),
    #[error("{0}")]
    Client(#[from] ClientError),
}

/// Run the interactive loop until the input is exhausted, the user types
/// `exit`, or the server closes the connection.
///
/// Every command is answered by exactly one receive before the next
/// command is read. Responses are written to `output` verbatim, one per
/// line. Empty input lines are skipped without touching the wire, and
/// `exit` (any case) ends the session locally.
pub fn run(
    client: &mut SessionClient,
    mut input: impl BufRead,
    mut output: impl Write,
) -> Result<(), SessionError> {
    let mut line = String::new();
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            debug!("input exhausted, ending session");
            return Ok(());
        }

        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if command.eq_ignore_ascii_case("exit") {
            return Ok(());
        }

        client.send(command)?;
        match client.receive()? {
            Some(response) => writeln!(output, "{response}")?,
            None => {
                writeln!(output, "{DISCONNECT_NOTICE}")?;
                return Ok(());
            }
        }
    }
}
