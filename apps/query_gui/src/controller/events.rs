//! Events the backend worker reports back to the UI thread.

use query_client::QueryError;
use shared::{domain::RequestToken, protocol::QueryResponse};

pub enum UiEvent {
    Info(String),
    QueryResolved {
        token: RequestToken,
        outcome: Result<QueryResponse, QueryError>,
    },
    WorkerFailed(String),
}
