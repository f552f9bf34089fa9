//! Request handling for a single frame.

use crate::error::BridgeResult;
use cadlink_engine::{CadDocument, Reconciler};
use cadlink_protocol::{decode_query, encode_result, PlainResult, QueryResult, PING, PONG};
use tracing::{debug, warn};

/// Turns one request payload into one response payload.
///
/// Holds no connection state, so the same handler serves every session.
#[derive(Debug, Clone, Default)]
pub struct RequestHandler {
    reconciler: Reconciler,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(reconciler: Reconciler) -> Self {
        Self { reconciler }
    }

    /// The reconciler applied to decoded queries.
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Handles a request payload and returns the response payload.
    ///
    /// A `ping` payload is answered with `pong`. A payload that does not
    /// decode into a query is answered with a failed [`PlainResult`]
    /// instead of an error, so the client always gets a reply.
    ///
    /// # Errors
    ///
    /// Returns an error only if the response cannot be encoded.
    pub fn handle_payload<H: CadDocument>(&self, host: &mut H, payload: &str) -> BridgeResult<String> {
        if payload == PING {
            return Ok(PONG.to_string());
        }

        let result = match decode_query(payload) {
            Ok(query) => {
                debug!(query = query.tag(), "executing query");
                self.reconciler.execute(host, &query)
            }
            Err(e) => {
                warn!(error = %e, "rejecting undecodable request");
                QueryResult::from(PlainResult::unhandled(&e))
            }
        };
        Ok(encode_result(&result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadlink_engine::MemoryDocument;
    use cadlink_protocol::{decode_result, encode_query, Query, Status, UNHANDLED_PREFIX};
    use cadlink_testkit::{insert_query, sample_database};

    #[test]
    fn ping_is_answered() {
        let mut host = MemoryDocument::new();
        let reply = RequestHandler::default().handle_payload(&mut host, PING).unwrap();
        assert_eq!(reply, PONG);
    }

    #[test]
    fn insert_request_is_executed() {
        let mut host = MemoryDocument::new();
        let query = Query::from(insert_query(sample_database()));
        let payload = encode_query(&query).unwrap();

        let reply = RequestHandler::default().handle_payload(&mut host, &payload).unwrap();
        let result = decode_result(&reply).unwrap();
        assert!(matches!(result, QueryResult::DbInsertResult(_)));
        assert_eq!(result.props().status(), Status::Success);
    }

    #[test]
    fn malformed_request_gets_failed_result() {
        let mut host = MemoryDocument::new();
        let reply = RequestHandler::default()
            .handle_payload(&mut host, "{not json")
            .unwrap();
        let result = decode_result(&reply).unwrap();
        let props = result.props();
        assert_eq!(props.status(), Status::Failure);
        assert!(props
            .message
            .value()
            .is_some_and(|m| m.starts_with(UNHANDLED_PREFIX)));
    }

    #[test]
    fn unknown_tag_gets_failed_result() {
        let mut host = MemoryDocument::new();
        let reply = RequestHandler::default()
            .handle_payload(&mut host, r#"{"__cls__":"cadlink.query.Nope"}"#)
            .unwrap();
        let result = decode_result(&reply).unwrap();
        assert_eq!(result.props().status(), Status::Failure);
        assert_eq!(host.object_count(), MemoryDocument::new().object_count());
    }
}
