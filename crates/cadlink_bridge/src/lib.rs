//! # cadlink bridge
//!
//! The host side of the link: a plugin loaded into the CAD application
//! that connects out to a client and answers its requests against the
//! open document.
//!
//! ```text
//!  client (listens)                       host (Bridge)
//!        │  ◄──────── connect(key, addr) ──────  │
//!        │  ── "ping" ───────────────────────►   │ ping(key)
//!        │  ◄─────────────────────── "pong" ──   │
//!        │  ── query envelope ───────────────►   │ db_operation(key)
//!        │  ◄──────────────── result envelope ─  │
//! ```
//!
//! Every frame uses the length-prefixed format from
//! [`cadlink_protocol::frame`]. Sessions are keyed by a caller-chosen string
//! so one host can serve several clients.
//!
//! ```rust,ignore
//! use cadlink_bridge::{Bridge, BridgeConfig};
//! use cadlink_engine::MemoryDocument;
//!
//! let mut bridge = Bridge::load(BridgeConfig::default(), MemoryDocument::new())?;
//! bridge.connect("drawing-1", "127.0.0.1:7000")?;
//! bridge.serve("drawing-1")?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod bridge;
mod config;
mod error;
mod handler;
mod session;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
pub use handler::RequestHandler;
pub use session::SessionManager;
