//! One-shot client: connect, send one command, read one reply.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{AclError, Result};

/// Default dialer timeout
pub const DEFAULT_DIALER_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest reply read back from the server
pub const MAX_REPLY_SIZE: usize = 1024;

/// Send `command` to the server at `host:port` and return its reply.
///
/// The host may be an IP literal or a name resolved through the system
/// resolver. Exactly one read is performed, so a reply is at most
/// [`MAX_REPLY_SIZE`] bytes.
pub fn send_command(host: &str, port: u16, command: &str) -> Result<String> {
    let mut stream = connect(host, port)?;

    stream.write_all(command.as_bytes())?;

    let mut buf = vec![0u8; MAX_REPLY_SIZE];
    let n = stream.read(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
}

/// Join command-line words into one command line
pub fn join_command<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|word| word.as_ref())
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Resolve `host` and connect to the first address that answers.
fn connect(host: &str, port: u16) -> Result<TcpStream> {
    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
    if addrs.is_empty() {
        return Err(AclError::IoError(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no address found for {}", host),
        )));
    }

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, DEFAULT_DIALER_TIMEOUT) {
            Ok(stream) => {
                tracing::debug!("connected to {}", addr);
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!("connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    Err(AclError::IoError(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotConnected, "connection failed")
    })))
}
