//! Socket transport helpers for the DenDen client.
//!
//! Connections to TCP and Unix endpoints are wrapped in a uniform
//! [`Connection`] so the exchange logic stays transport agnostic.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use denden_config::SocketEndpoint;
use denden_types::{RpcCall, RpcReply};

#[cfg(unix)]
use std::os::fd::OwnedFd;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

use crate::AppError;

/// Connect timeout used when the configuration disables call timeouts.
pub(crate) const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) enum Connection {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Connection {
    fn set_timeouts(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => {
                stream.set_read_timeout(timeout)?;
                stream.set_write_timeout(timeout)
            }
            #[cfg(unix)]
            Self::Unix(stream) => {
                stream.set_read_timeout(timeout)?;
                stream.set_write_timeout(timeout)
            }
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Opens a connection to `endpoint` with `timeout` applied to every read and
/// write. `None` leaves the connection blocking.
pub(crate) fn connect(
    endpoint: &SocketEndpoint,
    timeout: Option<Duration>,
) -> Result<Connection, AppError> {
    let connect_timeout = timeout.unwrap_or(CONNECTION_TIMEOUT);
    let connection = match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            let address = resolve_tcp_address(host, *port).map_err(|source| AppError::Resolve {
                endpoint: endpoint.to_string(),
                source,
            })?;
            TcpStream::connect_timeout(&address, connect_timeout)
                .map(Connection::Tcp)
                .map_err(|source| AppError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                })?
        }
        SocketEndpoint::Unix { path } => {
            #[cfg(unix)]
            {
                connect_unix(path.as_str(), connect_timeout).map_err(|source| {
                    AppError::Connect {
                        endpoint: endpoint.to_string(),
                        source,
                    }
                })?
            }

            #[cfg(not(unix))]
            {
                let _ = path;
                return Err(AppError::UnsupportedUnixTransport(endpoint.to_string()));
            }
        }
    };
    connection
        .set_timeouts(timeout)
        .map_err(AppError::Configure)?;
    Ok(connection)
}

fn resolve_tcp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}

#[cfg(unix)]
fn connect_unix(path: &str, timeout: Duration) -> io::Result<Connection> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, timeout)?;
    let stream = UnixStream::from(OwnedFd::from(socket));
    Ok(Connection::Unix(stream))
}

/// Writes one call frame and reads the single reply frame.
pub(crate) fn exchange<S>(stream: &mut S, call: &RpcCall) -> Result<RpcReply, AppError>
where
    S: Read + Write,
{
    let mut frame = serde_json::to_vec(call).map_err(AppError::SerialiseRequest)?;
    frame.push(b'\n');
    stream.write_all(&frame).map_err(AppError::from_send)?;
    stream.flush().map_err(AppError::from_send)?;

    let mut reply = String::new();
    let read = BufReader::new(stream)
        .read_line(&mut reply)
        .map_err(AppError::from_read)?;
    if read == 0 {
        return Err(AppError::ConnectionClosed);
    }
    serde_json::from_str(&reply).map_err(AppError::ParseReply)
}
