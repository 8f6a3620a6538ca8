use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::command::Command;
use crate::error::{Error, Result};

/// Identifies the connection an inbound [`Command`] arrived on, so a reply
/// (e.g. a controller's `getJSON()` dump) can be routed back to the
/// requester rather than broadcast.
pub type ConnectionId = u64;

struct Inbox {
    queue: Mutex<VecDeque<(ConnectionId, Command)>>,
}

/// The remote-operator pipe: a small TCP server accepting any number of
/// connections, each read on its own background thread and pushed onto a
/// shared mutex-protected FIFO drained once per tick by the main loop (spec
/// §5). Grounded on `team.rs`'s socket-owns-its-thread shape, adapted from
/// UDP's single nonblocking socket to TCP's one-thread-per-connection
/// model since the operator pipe is connection-oriented.
pub struct OperatorLink {
    listener_handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    inbox: Arc<Inbox>,
    writers: Arc<Mutex<std::collections::HashMap<ConnectionId, TcpStream>>>,
}

impl OperatorLink {
    /// Binds `addr` and spawns the accept-loop thread.
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|source| Error::OperatorBind {
            addr: "<operator>".to_owned(),
            source,
        })?;
        listener.set_nonblocking(true).map_err(|source| Error::OperatorBind {
            addr: "<operator>".to_owned(),
            source,
        })?;

        let running = Arc::new(AtomicBool::new(true));
        let inbox = Arc::new(Inbox {
            queue: Mutex::new(VecDeque::new()),
        });
        let writers = Arc::new(Mutex::new(std::collections::HashMap::new()));
        let next_id = Arc::new(AtomicU64::new(0));

        let accept_running = Arc::clone(&running);
        let accept_inbox = Arc::clone(&inbox);
        let accept_writers = Arc::clone(&writers);
        let listener_handle = std::thread::spawn(move || {
            accept_loop(listener, accept_running, accept_inbox, accept_writers, next_id);
        });

        Ok(Self {
            listener_handle: Some(listener_handle),
            running,
            inbox,
            writers,
        })
    }

    /// Drains every [`Command`] received since the last call, tagged with
    /// the connection it arrived on.
    pub fn poll_inbound(&self) -> Vec<(ConnectionId, Command)> {
        let mut queue = self.inbox.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.drain(..).collect()
    }

    /// Writes a newline-terminated reply back to one connection (used for
    /// `getJSON()` introspection dumps). Silently drops the reply if the
    /// connection has since closed.
    pub fn reply(&self, connection: ConnectionId, text: &str) {
        let mut writers = self.writers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(stream) = writers.get_mut(&connection) {
            let mut line = text.as_bytes().to_vec();
            line.push(b'\n');
            if stream.write_all(&line).is_err() {
                writers.remove(&connection);
            }
        }
    }

    /// Flips the shutdown flag; the accept thread and all reader threads
    /// observe it at their next loop iteration and exit.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.listener_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for OperatorLink {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

fn accept_loop(
    listener: TcpListener,
    running: Arc<AtomicBool>,
    inbox: Arc<Inbox>,
    writers: Arc<Mutex<std::collections::HashMap<ConnectionId, TcpStream>>>,
    next_id: Arc<AtomicU64>,
) {
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, addr)) => {
                let id = next_id.fetch_add(1, Ordering::SeqCst);
                tracing::debug!(?addr, connection = id, "operator connected");

                if let Ok(reader_stream) = stream.try_clone() {
                    writers.lock().unwrap_or_else(|e| e.into_inner()).insert(id, stream);

                    let reader_running = Arc::clone(&running);
                    let reader_inbox = Arc::clone(&inbox);
                    std::thread::spawn(move || read_loop(id, reader_stream, reader_running, reader_inbox));
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(std::time::Duration::from_millis(5));
            }
            Err(err) => {
                tracing::warn!(?err, "operator accept error");
            }
        }
    }
}

fn read_loop(id: ConnectionId, stream: TcpStream, running: Arc<AtomicBool>, inbox: Arc<Inbox>) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    while running.load(Ordering::SeqCst) {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => match Command::parse(&line) {
                Some(cmd) => {
                    inbox
                        .queue
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .push_back((id, cmd));
                }
                None => tracing::warn!(connection = id, line = line.trim(), "malformed operator message, ignored"),
            },
            Err(err) => {
                tracing::warn!(?err, connection = id, "operator socket error");
                break;
            }
        }
    }
    tracing::debug!(connection = id, "operator disconnected");
}
