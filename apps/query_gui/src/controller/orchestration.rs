//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};
use query_client::{Applied, QueryController, QueryError, QueryView};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), QueryError> {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(_)) => Err(QueryError::Dispatch(
            "UI command queue is full; please retry".to_string(),
        )),
        Err(TrySendError::Disconnected(_)) => Err(QueryError::Dispatch(
            "Backend worker disconnected (possible startup/runtime failure); restart the app"
                .to_string(),
        )),
    }
}

/// Shared by the Submit button and the Enter key.
///
/// A dispatch failure resolves the submission immediately so the submit
/// control never stays disabled.
pub fn submit_query<V: QueryView>(
    controller: &mut QueryController<V>,
    cmd_tx: &Sender<BackendCommand>,
) -> Option<Applied> {
    let pending = controller.begin_submission()?;
    let token = pending.token;
    match dispatch_backend_command(
        cmd_tx,
        BackendCommand::Query {
            token,
            request: pending.request,
        },
    ) {
        Ok(()) => None,
        Err(err) => {
            tracing::error!(%token, "failed to queue query: {err}");
            Some(controller.apply_outcome(token, Err(err)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use query_client::{ClientSettings, PanelState};
    use shared::domain::StatusKind;

    fn controller_with_query(query: &str) -> QueryController<PanelState> {
        let panel = PanelState {
            query_input: query.to_string(),
            ..PanelState::default()
        };
        QueryController::new(panel, ClientSettings::default())
    }

    #[test]
    fn queues_trimmed_query_with_current_token() {
        let (cmd_tx, cmd_rx) = bounded(4);
        let mut controller = controller_with_query("  hello  ");

        assert_eq!(submit_query(&mut controller, &cmd_tx), None);

        match cmd_rx.try_recv().expect("queued command") {
            BackendCommand::Query { token, request } => {
                assert_eq!(Some(token), controller.in_flight());
                assert_eq!(request.query, "hello");
            }
            BackendCommand::CancelInFlight => panic!("unexpected cancel"),
        }
        assert!(!controller.view().submit_enabled);
    }

    #[test]
    fn blank_query_queues_nothing() {
        let (cmd_tx, cmd_rx) = bounded(4);
        let mut controller = controller_with_query("   ");

        assert_eq!(submit_query(&mut controller, &cmd_tx), None);

        assert!(cmd_rx.try_recv().is_err());
        assert_eq!(controller.view().status.message, "Please enter a query");
    }

    #[test]
    fn disconnected_worker_resolves_submission_as_failure() {
        let (cmd_tx, cmd_rx) = bounded(4);
        drop(cmd_rx);
        let mut controller = controller_with_query("hello");

        let applied = submit_query(&mut controller, &cmd_tx);

        assert_eq!(applied, Some(Applied::Failed));
        let panel = controller.view();
        assert!(panel.submit_enabled);
        assert_eq!(panel.status.kind, StatusKind::Error);
        assert!(panel.output.markup.contains("Backend worker disconnected"));
        assert!(!panel.output.markup.contains("Make sure your backend is running"));
        assert_eq!(controller.in_flight(), None);
    }

    #[test]
    fn full_queue_is_reported() {
        let (cmd_tx, _cmd_rx) = bounded(1);
        cmd_tx
            .try_send(BackendCommand::CancelInFlight)
            .expect("fill queue");
        let mut controller = controller_with_query("hello");

        assert_eq!(
            submit_query(&mut controller, &cmd_tx),
            Some(Applied::Failed)
        );
        assert!(controller.view().output.markup.contains("queue is full"));
    }
}
