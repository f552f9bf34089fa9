//! Client command implementation.
//!
//! Plays the external process: listens, waits for the host to connect and
//! sends one request.

use cadlink_protocol::{decode_query, read_frame, write_frame, PING};
use std::fs;
use std::net::TcpListener;
use std::path::Path;
use tracing::debug;

/// What the client sends.
#[derive(Debug, Clone)]
pub enum Request<'a> {
    /// A liveness check.
    Ping,
    /// A query read from a JSON file.
    Query(&'a Path),
}

/// Builds the payload for `request`, checking a query file before anything
/// is sent.
pub fn load_payload(request: Request<'_>) -> Result<String, Box<dyn std::error::Error>> {
    match request {
        Request::Ping => Ok(PING.to_string()),
        Request::Query(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
            let query = decode_query(&text)?;
            debug!(query = query.tag(), bytes = text.len(), "query validated");
            Ok(text)
        }
    }
}

/// Runs the client command.
pub fn run(listen: &str, request: Request<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let payload = load_payload(request)?;

    let listener = TcpListener::bind(listen)?;
    println!("Listening on {}", listener.local_addr()?);
    let (mut stream, peer) = listener.accept()?;
    println!("Host connected from {}", peer);

    write_frame(&mut stream, &payload)?;
    let reply = read_frame(&mut stream)?;

    match serde_json::from_str::<serde_json::Value>(&reply) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", reply),
    }
    Ok(())
}
