//! Session front-ends.
//!
//! Both the interactive loop and the network server feed lines to one
//! shared [`CommandProcessor`].

use std::io::{BufRead, Write};

use crate::command::{CommandProcessor, Outcome};
use crate::error::Result;

#[cfg(feature = "async")]
mod server;

#[cfg(feature = "async")]
pub use server::{Server, ServerOptions, DEFAULT_BACKLOG, DEFAULT_READ_BUFFER_SIZE};

/// Cut a received message down to its command line: everything before the
/// first newline, without a trailing carriage return.
pub fn strip_line(message: &str) -> &str {
    let line = match message.find('\n') {
        Some(pos) => &message[..pos],
        None => message,
    };
    line.strip_suffix('\r').unwrap_or(line)
}

/// Run the interactive loop until end of input or `Q`.
///
/// Empty lines are skipped. Bytes that are not UTF-8 are replaced, as on the
/// network path. Every reply is flushed before the next line is read.
pub fn run_interactive<R, W>(processor: &CommandProcessor, mut input: R, mut output: W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let message = String::from_utf8_lossy(&buf);
        let line = strip_line(&message);
        if line.is_empty() {
            continue;
        }

        match processor.process(line) {
            Outcome::Quit => break,
            Outcome::Reply(response) => {
                write!(output, "{}", response)?;
                output.flush()?;
            }
        }
    }
    Ok(())
}
