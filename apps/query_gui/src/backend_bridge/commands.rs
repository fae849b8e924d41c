//! Backend commands queued from UI to backend worker.

use shared::{domain::RequestToken, protocol::QueryRequest};

pub enum BackendCommand {
    /// Send `request`; aborts whatever query the worker still has in flight.
    Query {
        token: RequestToken,
        request: QueryRequest,
    },
    CancelInFlight,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Query { .. } => "query",
            Self::CancelInFlight => "cancel_in_flight",
        }
    }
}
