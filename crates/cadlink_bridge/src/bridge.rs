//! Host-side command surface.

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::handler::RequestHandler;
use crate::session::SessionManager;
use cadlink_engine::{CadDocument, Reconciler};
use cadlink_protocol::{
    encode_result, read_frame_limited, registry, write_frame, PlainResult, QueryResult, PING,
    PONG,
};
use std::net::{SocketAddr, TcpStream};
use tracing::{debug, error, info};

/// The bridge as loaded into a host document.
///
/// Each method corresponds to one command the host exposes. Commands run
/// one at a time on the host's thread, which is why they take `&mut self`.
pub struct Bridge<H: CadDocument> {
    config: BridgeConfig,
    sessions: SessionManager,
    handler: RequestHandler,
    host: H,
}

impl<H: CadDocument> Bridge<H> {
    /// Loads the bridge into `host`.
    ///
    /// # Errors
    ///
    /// Fails if the record registry cannot be built, so a broken type table
    /// surfaces at load time rather than on the first request.
    pub fn load(config: BridgeConfig, host: H) -> BridgeResult<Self> {
        let types = registry()?.len();
        let handler = RequestHandler::new(Reconciler::new(config.reconcile.clone()));
        info!(types, "bridge loaded");
        Ok(Self {
            sessions: SessionManager::new(config.clone()),
            config,
            handler,
            host,
        })
    }

    /// Connects session `key` to a listening client.
    ///
    /// # Errors
    ///
    /// Fails if the address does not resolve or the connection is refused.
    pub fn connect(&mut self, key: &str, addr: &str) -> BridgeResult<SocketAddr> {
        self.sessions.connect(key, addr)
    }

    /// Answers one liveness check on session `key`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnexpectedPing`] if the frame is not `ping`.
    /// Nothing is written back in that case.
    pub fn ping(&mut self, key: &str) -> BridgeResult<()> {
        let max = self.config.max_frame_len;
        self.sessions.with_stream(key, |stream| {
            let received = read_frame_limited(stream, max)?;
            if received != PING {
                return Err(BridgeError::UnexpectedPing { received });
            }
            write_frame(stream, PONG)?;
            debug!(session = key, "answered ping");
            Ok(())
        })
    }

    /// Runs one database operation on session `key`: reads a request,
    /// applies it to the document and writes the result.
    ///
    /// If anything fails, the error is logged and a failed result carrying
    /// its message is sent on a best-effort basis. A peer that closed
    /// cleanly between frames gets nothing, and neither does one whose
    /// read timed out: the client sent no request to pair a reply with.
    ///
    /// # Errors
    ///
    /// Returns the original failure, or [`BridgeError::NoSession`].
    pub fn db_operation(&mut self, key: &str) -> BridgeResult<()> {
        let mut stream = self.sessions.stream(key)?;
        match self.exchange(&mut stream) {
            Ok(()) => Ok(()),
            Err(e) if e.is_disconnect() => {
                debug!(session = key, "peer closed before sending a request");
                Err(e)
            }
            Err(e) if e.is_idle() => {
                debug!(session = key, "no request before read timeout");
                Err(e)
            }
            Err(e) if e.is_timeout() => {
                error!(command = "db_operation", session = key, error = %e, "request timed out mid-frame");
                Err(e)
            }
            Err(e) => {
                error!(command = "db_operation", session = key, error = %e, "command failed");
                let _ = send_unhandled(&mut stream, &e);
                Err(e)
            }
        }
    }

    /// Runs database operations on session `key` until the client closes
    /// the connection. Returns the number of requests answered.
    ///
    /// An idle read timeout does not end the loop.
    ///
    /// # Errors
    ///
    /// Stops at the first failure other than a clean close.
    pub fn serve(&mut self, key: &str) -> BridgeResult<usize> {
        let mut answered = 0;
        loop {
            match self.db_operation(key) {
                Ok(()) => answered += 1,
                Err(e) if e.is_idle() => continue,
                Err(e) if e.is_disconnect() => {
                    info!(session = key, answered, "client closed session");
                    self.sessions.disconnect(key);
                    return Ok(answered);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Closes every session and hands the document back.
    pub fn unload(self) -> H {
        self.sessions.shutdown();
        info!("bridge unloaded");
        self.host
    }

    /// The document.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the document.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The session table.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// The configuration the bridge was loaded with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn exchange(&mut self, stream: &mut TcpStream) -> BridgeResult<()> {
        let request = read_frame_limited(stream, self.config.max_frame_len)?;
        let response = self.handler.handle_payload(&mut self.host, &request)?;
        write_frame(stream, &response)?;
        Ok(())
    }
}

fn send_unhandled(stream: &mut TcpStream, cause: &BridgeError) -> BridgeResult<()> {
    let result = QueryResult::from(PlainResult::unhandled(cause));
    write_frame(stream, &encode_result(&result)?)?;
    Ok(())
}
