//! TCP front-end: one tokio task per connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::strip_line;
use crate::command::{CommandProcessor, Outcome};
use crate::error::{AclError, Result};

/// Default size of the per-connection read buffer. One read is one command.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Default listen backlog
pub const DEFAULT_BACKLOG: i32 = 128;

/// Server options.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Address to listen on
    pub bind_ip: IpAddr,
    /// Port to listen on (0 picks a free port)
    pub port: u16,
    /// Listen backlog
    pub backlog: i32,
    /// Bytes read per message
    pub read_buffer_size: usize,
    /// Set SO_REUSEPORT in addition to SO_REUSEADDR
    pub reuse_port: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 0,
            backlog: DEFAULT_BACKLOG,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            reuse_port: true,
        }
    }
}

impl ServerOptions {
    /// Create new server options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set listen port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set listen address.
    pub fn with_bind_ip(mut self, ip: IpAddr) -> Self {
        self.bind_ip = ip;
        self
    }

    /// Set listen backlog.
    pub fn with_backlog(mut self, backlog: i32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Set per-message read buffer size.
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Enable or disable SO_REUSEPORT.
    pub fn with_reuse_port(mut self, enabled: bool) -> Self {
        self.reuse_port = enabled;
        self
    }

    fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }
}

/// Listening server sharing one [`CommandProcessor`] across connections.
pub struct Server {
    listener: TcpListener,
    processor: Arc<CommandProcessor>,
    read_buffer_size: usize,
}

impl Server {
    /// Create the listening socket.
    ///
    /// Must be called from within a tokio runtime. Failures here are startup
    /// failures and should end the process.
    pub fn bind(options: &ServerOptions, processor: Arc<CommandProcessor>) -> Result<Self> {
        if options.read_buffer_size == 0 {
            return Err(AclError::ConfigError(
                "read buffer size must be non-zero".to_string(),
            ));
        }

        let socket = create_listen_socket(options)?;
        let listener = TcpListener::from_std(std::net::TcpListener::from(socket))?;
        tracing::info!("ACL server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            processor,
            read_buffer_size: options.read_buffer_size,
        })
    }

    /// Get the bound address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever, spawning one worker per connection.
    ///
    /// Accept errors are logged and the loop continues.
    pub async fn run(self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    tracing::debug!("client connected: {}", peer);
                    let processor = self.processor.clone();
                    let buffer_size = self.read_buffer_size;
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, processor, buffer_size).await {
                            tracing::warn!("connection {} ended with error: {}", peer, e);
                        }
                        tracing::debug!("client disconnected: {}", peer);
                    });
                }
                Err(e) => tracing::warn!("accept error: {}", e),
            }
        }
    }
}

/// Read one message at a time, answer it, repeat until `Q`, EOF or an error.
async fn serve_connection(
    mut stream: TcpStream,
    processor: Arc<CommandProcessor>,
    buffer_size: usize,
) -> Result<()> {
    let mut buf = vec![0u8; buffer_size];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }

        let message = String::from_utf8_lossy(&buf[..n]);
        match processor.process(strip_line(&message)) {
            Outcome::Quit => return Ok(()),
            Outcome::Reply(response) => {
                stream.write_all(response.to_string().as_bytes()).await?;
            }
        }
    }
}

/// Create a non-blocking listening socket with address reuse enabled.
fn create_listen_socket(options: &ServerOptions) -> Result<socket2::Socket> {
    let addr = options.socket_addr();
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    if options.reuse_port {
        set_reuse_port(&socket)?;
    }

    socket.bind(&addr.into())?;
    socket.listen(options.backlog)?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}

/// Set SO_REUSEPORT on a socket.
#[cfg(any(target_os = "linux", target_os = "macos"))]
fn set_reuse_port(socket: &socket2::Socket) -> Result<()> {
    use std::os::unix::io::AsRawFd;

    let val: libc::c_int = 1;
    let ret = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_REUSEPORT,
            &val as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if ret < 0 {
        return Err(AclError::IoError(std::io::Error::last_os_error()));
    }
    Ok(())
}

/// Stub for unsupported platforms.
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn set_reuse_port(_socket: &socket2::Socket) -> Result<()> {
    tracing::debug!("SO_REUSEPORT is not supported on this platform, skipping");
    Ok(())
}
