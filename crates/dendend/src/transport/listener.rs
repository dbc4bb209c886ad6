//! Accept loop feeding the worker pool.
//!
//! The listening socket runs non-blocking so the loop can notice shutdown
//! between polls. An accepted connection is held back while every worker is
//! busy; nothing further is accepted until it has been handed over.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use denden_config::SocketEndpoint;
use tracing::{debug, info, warn};

use super::pool::{DrainOutcome, Submit, WorkerPool};
use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError};

#[cfg(unix)]
use camino::Utf8Path;
#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};

const IDLE_POLL: Duration = Duration::from_millis(25);
const ERROR_POLL: Duration = Duration::from_millis(150);

/// A bound, not yet accepting, listening socket.
#[derive(Debug)]
pub(crate) struct SocketListener {
    endpoint: SocketEndpoint,
    socket: BoundSocket,
}

#[derive(Debug)]
enum BoundSocket {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

impl BoundSocket {
    fn set_nonblocking(&self) -> io::Result<()> {
        match self {
            Self::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            Self::Unix(listener) => listener.set_nonblocking(true),
        }
    }

    /// Accepts one pending connection, `None` when nothing is waiting.
    fn accept(&self) -> io::Result<Option<ConnectionStream>> {
        let accepted = match self {
            Self::Tcp(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Tcp(stream))
            }),
            #[cfg(unix)]
            Self::Unix(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Unix(stream))
            }),
        };
        match accepted {
            Ok(stream) => Ok(Some(stream)),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }
}

impl SocketListener {
    pub(crate) fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        let socket = match endpoint {
            SocketEndpoint::Tcp { host, port } => {
                BoundSocket::Tcp(bind_tcp(endpoint, host, *port)?)
            }
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => BoundSocket::Unix(bind_unix(endpoint, path)?),
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => {
                return Err(ListenerError::UnsupportedUnix {
                    endpoint: endpoint.to_string(),
                });
            }
        };
        Ok(Self {
            endpoint: endpoint.clone(),
            socket,
        })
    }

    /// Bound TCP address; `None` for Unix sockets.
    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        match &self.socket {
            BoundSocket::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            BoundSocket::Unix(_) => None,
        }
    }

    /// Starts accepting connections and serving them on `workers` threads.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
        workers: usize,
    ) -> Result<ListenerHandle, ListenerError> {
        if let Err(source) = self.socket.set_nonblocking() {
            self.remove_socket_file();
            return Err(ListenerError::NonBlocking { source });
        }
        let shutdown = Arc::new(AtomicBool::new(false));
        let accept_loop = AcceptLoop {
            listener: self,
            shutdown: Arc::clone(&shutdown),
            pool: WorkerPool::spawn(workers, &handler),
            held: None,
            last_error: None,
        };
        let handle = thread::Builder::new()
            .name("dendend-accept".to_owned())
            .spawn(move || accept_loop.run())
            .map_err(|source| ListenerError::Spawn { source })?;
        Ok(ListenerHandle {
            shutdown,
            handle: Some(handle),
        })
    }

    #[cfg(unix)]
    fn remove_socket_file(&self) {
        let Some(path) = self.endpoint.unix_path() else {
            return;
        };
        if let Err(error) = fs::remove_file(path)
            && error.kind() != io::ErrorKind::NotFound
        {
            warn!(
                target: LISTENER_TARGET,
                %error,
                %path,
                "failed to remove unix socket file"
            );
        }
    }

    #[cfg(not(unix))]
    fn remove_socket_file(&self) {}
}

/// Handle to the background accept thread and its workers.
pub(crate) struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<WorkerPool>>,
}

impl ListenerHandle {
    /// Stops accepting new connections.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Stops accepting and waits up to `grace` for queued and in-flight calls.
    pub(crate) fn drain(mut self, grace: Duration) -> Result<DrainOutcome, ListenerError> {
        self.shutdown();
        let Some(handle) = self.handle.take() else {
            return Ok(DrainOutcome::Completed);
        };
        let pool = handle.join().map_err(|_| ListenerError::ThreadPanic)?;
        Ok(pool.drain(grace))
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct AcceptLoop {
    listener: SocketListener,
    shutdown: Arc<AtomicBool>,
    pool: WorkerPool,
    held: Option<ConnectionStream>,
    last_error: Option<io::ErrorKind>,
}

impl AcceptLoop {
    fn run(mut self) -> WorkerPool {
        info!(
            target: LISTENER_TARGET,
            endpoint = %self.listener.endpoint,
            workers = self.pool.size(),
            "socket listener active"
        );
        while !self.shutdown.load(Ordering::SeqCst) {
            let keep_going = match self.held.take() {
                Some(stream) => self.hand_over(stream),
                None => {
                    self.poll_accept();
                    true
                }
            };
            if !keep_going {
                break;
            }
        }

        if self.held.is_some() {
            debug!(
                target: LISTENER_TARGET,
                "dropping connection accepted while all workers were busy"
            );
        }
        self.pool.close();
        self.listener.remove_socket_file();
        self.pool
    }

    /// Passes `stream` to a worker; `false` once the pool has closed.
    fn hand_over(&mut self, stream: ConnectionStream) -> bool {
        match self.pool.try_submit(stream) {
            Ok(()) => true,
            Err(Submit::Busy(stream)) => {
                self.held = Some(stream);
                thread::sleep(IDLE_POLL);
                true
            }
            Err(Submit::Closed) => false,
        }
    }

    fn poll_accept(&mut self) {
        match self.listener.socket.accept() {
            Ok(Some(stream)) => {
                self.last_error = None;
                self.held = Some(stream);
            }
            Ok(None) => thread::sleep(IDLE_POLL),
            Err(error) => {
                // Repeats of the same failure are logged once.
                if self.last_error != Some(error.kind()) {
                    warn!(target: LISTENER_TARGET, %error, "socket accept error");
                }
                self.last_error = Some(error.kind());
                thread::sleep(ERROR_POLL);
            }
        }
    }
}

fn bind_tcp(endpoint: &SocketEndpoint, host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let addr = (host, port)
        .to_socket_addrs()
        .and_then(|mut addrs| {
            addrs.next().ok_or_else(|| {
                io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses resolved")
            })
        })
        .map_err(|source| ListenerError::Resolve {
            endpoint: endpoint.to_string(),
            source,
        })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::Bind {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[cfg(unix)]
fn bind_unix(endpoint: &SocketEndpoint, path: &Utf8Path) -> Result<UnixListener, ListenerError> {
    clear_stale_socket(path)?;
    UnixListener::bind(path).map_err(|source| ListenerError::Bind {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Removes a socket file left behind by a server that is no longer running.
#[cfg(unix)]
fn clear_stale_socket(path: &Utf8Path) -> Result<(), ListenerError> {
    let stale = |source| ListenerError::UnixStale {
        path: path.to_string(),
        source,
    };
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(stale(error)),
    };
    if !metadata.file_type().is_socket() {
        return Err(stale(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "path exists and is not a socket",
        )));
    }
    if UnixStream::connect(path).is_ok() {
        return Err(ListenerError::UnixInUse {
            path: path.to_string(),
        });
    }
    fs::remove_file(path).map_err(stale)
}
