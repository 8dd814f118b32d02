use super::fetch::fetch_notifications;
use super::policy::compute_next_delay_for_latest;
use crate::notifications::maybe_notify_new_threads;
use crate::state::{AppState, RefreshRequest};
use crate::types::{IpcErrorCode, IpcResult, NotificationsStatus};
use tauri::{AppHandle, Runtime};
use tokio::sync::mpsc;

async fn refresh_once<R: Runtime>(app: &AppHandle<R>, state: &AppState<R>) -> IpcResult<()> {
    let simulated = state.debug_override.lock().await.snapshot();
    if let Some(snapshot) = simulated {
        maybe_notify_new_threads(app, state, &snapshot, true).await;
        state.update_snapshot(app, Some(snapshot)).await;
        return IpcResult::ok(());
    }

    let result = fetch_notifications(state).await;
    let snapshot = result.snapshot;

    match snapshot.status() {
        NotificationsStatus::Ok => log::info!("{} pull request notification(s)", snapshot.count()),
        NotificationsStatus::MissingToken => log::debug!("no GitHub credential configured"),
        NotificationsStatus::Unauthorized => {
            log::warn!("Can't authenticate with this token. Create a new one.")
        }
        status => log::warn!(
            "notification refresh failed ({status:?}): {}",
            snapshot.error_message().unwrap_or_default()
        ),
    }

    maybe_notify_new_threads(app, state, &snapshot, false).await;
    state.update_snapshot(app, Some(snapshot)).await;

    if result.keyring_error {
        return IpcResult::err(
            IpcErrorCode::Keyring,
            "OS keychain/secret service is unavailable.",
        );
    }

    IpcResult::ok(())
}

async fn next_delay<R: Runtime>(state: &AppState<R>) -> Option<u64> {
    let latest = state.latest_snapshot.lock().await.clone();
    compute_next_delay_for_latest(state.refresh_interval_seconds(), latest.as_ref())
}

enum Wake {
    Request(RefreshRequest),
    Timer,
    Closed,
}

/// Waits for a refresh request or, unless polling is paused (`None`), the next tick.
async fn wait_for_wake(
    rx: &mut mpsc::UnboundedReceiver<RefreshRequest>,
    delay_ms: Option<u64>,
) -> Wake {
    let Some(delay_ms) = delay_ms else {
        return rx.recv().await.map_or(Wake::Closed, Wake::Request);
    };

    tokio::select! {
        req = rx.recv() => req.map_or(Wake::Closed, Wake::Request),
        _ = tokio::time::sleep(std::time::Duration::from_millis(delay_ms)) => Wake::Timer,
    }
}

pub fn spawn_refresh_loop<R: Runtime>(
    app: AppHandle<R>,
    state: AppState<R>,
    mut rx: mpsc::UnboundedReceiver<RefreshRequest>,
) {
    tauri::async_runtime::spawn(async move {
        let mut next_delay_ms: Option<u64> = Some(0);

        loop {
            let request = match wait_for_wake(&mut rx, next_delay_ms).await {
                Wake::Request(req) => Some(req),
                Wake::Timer => None,
                Wake::Closed => break,
            };

            let result = refresh_once(&app, &state).await;
            next_delay_ms = next_delay(&state).await;
            if next_delay_ms.is_none() {
                log::info!("polling paused until a GitHub credential is saved");
            }

            if let Some(tx) = request.and_then(|r| r.respond_to) {
                let _ = tx.send(result);
            }
        }

        log::debug!("refresh loop stopped");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RefreshBus;
    use std::time::Duration;

    #[tokio::test]
    async fn paused_loop_wakes_when_a_credential_is_saved() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bus = RefreshBus::new(tx);

        let waiter = tokio::spawn(async move { wait_for_wake(&mut rx, None).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        bus.trigger();
        let wake = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(wake, Wake::Request(req) if req.respond_to.is_none()));
    }

    #[tokio::test]
    async fn scheduled_loop_wakes_on_timer() {
        let (_tx, mut rx) = mpsc::unbounded_channel::<RefreshRequest>();
        let wake = wait_for_wake(&mut rx, Some(10)).await;
        assert!(matches!(wake, Wake::Timer));
    }

    #[tokio::test]
    async fn loop_stops_when_every_sender_is_gone() {
        let (tx, mut rx) = mpsc::unbounded_channel::<RefreshRequest>();
        drop(tx);
        assert!(matches!(wait_for_wake(&mut rx, None).await, Wake::Closed));
        assert!(matches!(wait_for_wake(&mut rx, Some(60_000)).await, Wake::Closed));
    }
}
