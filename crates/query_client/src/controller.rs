//! Query submission lifecycle: validation, dispatch bookkeeping, response
//! interpretation and status transitions.
//!
//! Every accepted submission gets a fresh [`RequestToken`] that supersedes the
//! one in flight. Outcomes carrying any other token are dropped without
//! touching the view, so the submit control is re-enabled exactly once per
//! live submission no matter how many requests race.

use std::time::Instant;

use shared::{
    domain::{RequestToken, StatusKind},
    protocol::{QueryReply, QueryRequest, QueryResponse},
};
use tracing::{debug, info, warn};

use crate::{
    config::ClientSettings,
    error::QueryError,
    markup::{answer_markup, error_markup, escape_html, failure_message, local_failure_message},
    transport::QueryTransport,
    view::{QueryView, StatusUpdate},
};

pub const MSG_EMPTY_QUERY: &str = "Please enter a query";
pub const MSG_PROCESSING: &str = "Processing your query...";
pub const MSG_SUCCESS: &str = "Query processed successfully";
pub const MSG_PROCESSING_FAILED: &str = "Error processing query";
pub const MSG_CONNECTION_ERROR: &str = "Connection error";
pub const MSG_NO_ANSWER: &str = "No answer received from server";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub token: RequestToken,
    pub request: QueryRequest,
}

/// What a submission ended up showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Rejected locally; nothing was sent.
    EmptyQuery,
    Answer,
    ServerError,
    NoAnswer,
    Failed,
    /// A newer submission owns the view.
    Superseded,
}

impl Applied {
    pub fn is_error(self) -> bool {
        matches!(
            self,
            Self::EmptyQuery | Self::ServerError | Self::NoAnswer | Self::Failed
        )
    }
}

pub struct QueryController<V: QueryView> {
    view: V,
    settings: ClientSettings,
    last_token: RequestToken,
    in_flight: Option<RequestToken>,
    success_deadline: Option<Instant>,
}

impl<V: QueryView> QueryController<V> {
    pub fn new(view: V, settings: ClientSettings) -> Self {
        Self {
            view,
            settings,
            last_token: RequestToken::default(),
            in_flight: None,
            success_deadline: None,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn in_flight(&self) -> Option<RequestToken> {
        self.in_flight
    }

    pub fn success_deadline(&self) -> Option<Instant> {
        self.success_deadline
    }

    /// Validates the input and moves the panel into its loading state.
    ///
    /// Returns `None` for blank input; the caller must not send anything.
    pub fn begin_submission(&mut self) -> Option<PendingQuery> {
        let query = self.view.query_text().trim().to_string();
        if query.is_empty() {
            self.set_status(StatusKind::Error, MSG_EMPTY_QUERY);
            return None;
        }

        let token = self.last_token.next();
        self.last_token = token;
        if let Some(previous) = self.in_flight.replace(token) {
            debug!(%previous, %token, "superseding in-flight query");
        }

        self.view.set_submit_enabled(false);
        self.set_status(StatusKind::Loading, MSG_PROCESSING);
        self.view.clear_output();

        info!(%token, chars = query.chars().count(), "query submitted");
        Some(PendingQuery {
            token,
            request: QueryRequest::new(query, self.settings.top_k),
        })
    }

    pub fn apply_outcome(
        &mut self,
        token: RequestToken,
        outcome: Result<QueryResponse, QueryError>,
    ) -> Applied {
        if self.in_flight != Some(token) {
            debug!(%token, latest = ?self.in_flight, "dropping superseded query outcome");
            return Applied::Superseded;
        }
        self.in_flight = None;

        let applied = match outcome {
            Ok(response) => self.render_response(&response),
            Err(err) => {
                warn!(%token, "query failed: {err}");
                self.render_failure(&err);
                Applied::Failed
            }
        };
        info!(%token, ?applied, "query resolved");

        self.view.set_submit_enabled(true);
        applied
    }

    /// Runs one full submission against `transport`.
    pub async fn submit<T: QueryTransport + ?Sized>(&mut self, transport: &T) -> Applied {
        let Some(pending) = self.begin_submission() else {
            return Applied::EmptyQuery;
        };
        let outcome = transport.send_query(&pending.request).await;
        self.apply_outcome(pending.token, outcome)
    }

    /// Clears an expired success status. Returns true when the view changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.success_deadline {
            Some(deadline) if now >= deadline => {
                self.success_deadline = None;
                self.view.deactivate_status();
                true
            }
            _ => false,
        }
    }

    fn render_response(&mut self, response: &QueryResponse) -> Applied {
        match response.reply() {
            QueryReply::Answer(answer) => {
                self.view.show_output(answer_markup(answer));
                self.view.show_sources(&response.chunks);
                self.set_status(StatusKind::Success, MSG_SUCCESS);
                Applied::Answer
            }
            QueryReply::Error(message) => {
                let message = if self.settings.escape_server_errors {
                    escape_html(message)
                } else {
                    message.to_string()
                };
                self.view.show_output(error_markup(&message));
                self.set_status(StatusKind::Error, MSG_PROCESSING_FAILED);
                Applied::ServerError
            }
            QueryReply::Empty => {
                self.view.show_output(error_markup(MSG_NO_ANSWER));
                self.set_status(StatusKind::Error, MSG_PROCESSING_FAILED);
                Applied::NoAnswer
            }
        }
    }

    fn render_failure(&mut self, err: &QueryError) {
        let detail = escape_html(&err.to_string());
        let (message, status) = match err {
            QueryError::Dispatch(_) => (local_failure_message(&detail), MSG_PROCESSING_FAILED),
            _ => (
                failure_message(&detail, &self.settings.endpoint),
                MSG_CONNECTION_ERROR,
            ),
        };
        self.view.show_output(error_markup(&message));
        self.set_status(StatusKind::Error, status);
    }

    fn set_status(&mut self, kind: StatusKind, message: &str) {
        self.success_deadline = match kind {
            StatusKind::Success => Some(Instant::now() + self.settings.success_clear_after()),
            _ => None,
        };
        self.view.show_status(StatusUpdate::new(kind, message));
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
