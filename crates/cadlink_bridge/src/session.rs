//! Session connection table.

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use tracing::{debug, info};

/// Owns the live connection of every session.
///
/// Created when the bridge loads and torn down when it unloads. Commands
/// name the session they act on by key.
pub struct SessionManager {
    config: BridgeConfig,
    connections: RwLock<HashMap<String, TcpStream>>,
}

impl SessionManager {
    /// Creates an empty session table.
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Connects to `addr` and registers the stream under `key`.
    ///
    /// Dead connections are dropped first. An existing connection for the
    /// same key is closed and replaced.
    pub fn connect(&self, key: &str, addr: &str) -> BridgeResult<SocketAddr> {
        self.remove_dead();

        let target = addr
            .to_socket_addrs()
            .map_err(|e| BridgeError::InvalidAddress(format!("{addr}: {e}")))?
            .next()
            .ok_or_else(|| BridgeError::InvalidAddress(addr.to_string()))?;
        let stream = TcpStream::connect_timeout(&target, self.config.connect_timeout)?;
        stream.set_nodelay(self.config.nodelay)?;
        stream.set_read_timeout(self.config.read_timeout)?;
        stream.set_write_timeout(self.config.write_timeout)?;

        if let Some(old) = self.connections.write().insert(key.to_string(), stream) {
            let _ = old.shutdown(Shutdown::Both);
            debug!(session = key, "replaced existing connection");
        }
        info!(session = key, peer = %target, "session connected");
        Ok(target)
    }

    /// Closes and forgets the connection of `key`. Returns false if there
    /// was none.
    pub fn disconnect(&self, key: &str) -> bool {
        match self.connections.write().remove(key) {
            Some(stream) => {
                let _ = stream.shutdown(Shutdown::Both);
                info!(session = key, "session disconnected");
                true
            }
            None => false,
        }
    }

    /// Returns true if a connection is registered under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.connections.read().contains_key(key)
    }

    /// Registered session keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.connections.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    /// Returns true if no session is registered.
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    /// Drops connections the peer has closed. Returns how many were dropped.
    pub fn remove_dead(&self) -> usize {
        let mut connections = self.connections.write();
        let before = connections.len();
        connections.retain(|key, stream| {
            let alive = is_alive(stream);
            if !alive {
                debug!(session = %key, "dropping dead connection");
            }
            alive
        });
        before - connections.len()
    }

    /// A handle to the stream of `key`.
    ///
    /// The handle shares the socket with the table entry, so the table is
    /// not locked while a command runs.
    pub fn stream(&self, key: &str) -> BridgeResult<TcpStream> {
        let connections = self.connections.read();
        let stream = connections
            .get(key)
            .ok_or_else(|| BridgeError::NoSession(key.to_string()))?;
        Ok(stream.try_clone()?)
    }

    /// Runs `f` on the stream of `key`.
    pub fn with_stream<T, F>(&self, key: &str, f: F) -> BridgeResult<T>
    where
        F: FnOnce(&mut TcpStream) -> BridgeResult<T>,
    {
        let mut stream = self.stream(key)?;
        f(&mut stream)
    }

    /// Closes every connection.
    pub fn shutdown(&self) {
        for (key, stream) in self.connections.write().drain() {
            let _ = stream.shutdown(Shutdown::Both);
            debug!(session = %key, "session closed");
        }
    }
}

/// Peeks at a stream without consuming data.
fn is_alive(stream: &TcpStream) -> bool {
    if stream.set_nonblocking(true).is_err() {
        return false;
    }
    let mut peeked = [0u8; 1];
    let alive = match stream.peek(&mut peeked) {
        Ok(0) => false,
        Ok(_) => true,
        Err(e) => e.kind() == io::ErrorKind::WouldBlock,
    };
    stream.set_nonblocking(false).is_ok() && alive
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
