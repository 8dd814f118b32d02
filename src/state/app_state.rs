use super::{CredentialStore, RefreshBus};
use crate::github::GitHubApiClient;
use crate::settings::{
    SettingsStore, DEFAULT_REFRESH_INTERVAL_SECONDS, KEY_REFRESH_INTERVAL_SECONDS,
    KEY_SHOW_NOTIFICATION_COUNT,
};
use crate::types::{NotificationReason, NotificationsSnapshot, ThreadSummary};
use std::collections::HashSet;
use std::sync::Arc;
use tauri::async_runtime::JoinHandle;
use tauri::{AppHandle, Emitter, EventTarget, Runtime};
use tokio::sync::Mutex;

fn now_iso() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Replaces GitHub data with a fixed number of fake threads (debug menu only).
#[derive(Debug, Clone, Default)]
pub struct DebugOverride {
    pub simulated_count: Option<usize>,
}

impl DebugOverride {
    pub fn snapshot(&self) -> Option<NotificationsSnapshot> {
        let count = self.simulated_count?;
        let threads = (1..=count)
            .map(|n| ThreadSummary {
                id: format!("debug-{n}"),
                title: format!("Simulated pull request #{n}"),
                repository: "octoblast/debug".to_string(),
                reason: NotificationReason::ReviewRequested,
                web_url: format!("{}?query=debug-{n}", crate::github::NOTIFICATIONS_WEB_URL),
            })
            .collect();
        Some(NotificationsSnapshot::Ok {
            count,
            threads,
            last_updated_at: now_iso(),
        })
    }
}

/// The browser sign-in currently waiting for GitHub, if any.
///
/// Starting a new sign-in aborts the running one, so a closed browser tab never blocks a retry.
#[derive(Default)]
pub struct OAuthAttempts {
    next_id: u64,
    current: Option<(u64, JoinHandle<()>)>,
}

impl OAuthAttempts {
    pub fn is_pending(&self) -> bool {
        self.current.is_some()
    }

    /// Aborts the running attempt and reserves the id of the next one.
    pub fn replace(&mut self) -> u64 {
        self.cancel();
        self.next_id += 1;
        self.next_id
    }

    pub fn track(&mut self, id: u64, task: JoinHandle<()>) {
        if id == self.next_id {
            self.current = Some((id, task));
        } else {
            task.abort();
        }
    }

    /// Clears the slot when `id` is still the running attempt. Returns whether it was.
    pub fn finish(&mut self, id: u64) -> bool {
        match self.current {
            Some((current, _)) if current == id => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) -> bool {
        match self.current.take() {
            Some((id, task)) => {
                log::info!("cancelling GitHub sign-in attempt {id}");
                task.abort();
                true
            }
            None => false,
        }
    }
}

pub struct AppState<R: tauri::Runtime> {
    pub settings: SettingsStore<R>,
    pub credential: CredentialStore,
    pub github: Arc<GitHubApiClient>,
    pub viewer_login: Arc<Mutex<Option<String>>>,
    pub oauth_attempts: Arc<Mutex<OAuthAttempts>>,
    pub latest_snapshot: Arc<Mutex<Option<NotificationsSnapshot>>>,
    /// Most recent successful fetch; the tray keeps its count while a refresh fails.
    pub last_ok_snapshot: Arc<Mutex<Option<NotificationsSnapshot>>>,
    pub seen_thread_ids: Arc<Mutex<Option<HashSet<String>>>>,
    pub debug_override: Arc<Mutex<DebugOverride>>,
    pub tray: crate::tray::TrayUi<R>,
    pub refresh: RefreshBus,
}

impl<R: tauri::Runtime> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            credential: self.credential.clone(),
            github: self.github.clone(),
            viewer_login: self.viewer_login.clone(),
            oauth_attempts: self.oauth_attempts.clone(),
            latest_snapshot: self.latest_snapshot.clone(),
            last_ok_snapshot: self.last_ok_snapshot.clone(),
            seen_thread_ids: self.seen_thread_ids.clone(),
            debug_override: self.debug_override.clone(),
            tray: self.tray.clone(),
            refresh: self.refresh.clone(),
        }
    }
}

impl<R: tauri::Runtime> AppState<R> {
    pub fn refresh_interval_seconds(&self) -> u64 {
        self.settings
            .get_u64(KEY_REFRESH_INTERVAL_SECONDS, DEFAULT_REFRESH_INTERVAL_SECONDS)
    }

    pub fn show_notification_count(&self) -> bool {
        self.settings.get_bool(KEY_SHOW_NOTIFICATION_COUNT, true)
    }

    /// Drops everything derived from the previous account.
    pub async fn clear_account(&self) {
        self.credential.forget().await;
        *self.viewer_login.lock().await = None;
        *self.seen_thread_ids.lock().await = None;
        *self.last_ok_snapshot.lock().await = None;
    }
}

const SNAPSHOT_EVENT: &str = "snapshot:updated";

impl<R: Runtime> AppState<R> {
    pub async fn update_snapshot(&self, app: &AppHandle<R>, snapshot: Option<NotificationsSnapshot>) {
        {
            let mut guard = self.latest_snapshot.lock().await;
            *guard = snapshot.clone();
        }

        let last_ok = {
            let mut guard = self.last_ok_snapshot.lock().await;
            match snapshot.as_ref() {
                Some(ok @ NotificationsSnapshot::Ok { .. }) => *guard = Some(ok.clone()),
                Some(NotificationsSnapshot::MissingToken { .. }) | None => *guard = None,
                Some(_) => {}
            }
            guard.clone()
        };

        self.redraw_tray(snapshot.as_ref(), last_ok.as_ref());
        let _ = app.emit_to(EventTarget::any(), SNAPSHOT_EVENT, snapshot);
    }

    /// Re-applies tint and count visibility without fetching.
    pub async fn redraw_latest(&self) {
        let latest = self.latest_snapshot.lock().await.clone();
        let last_ok = self.last_ok_snapshot.lock().await.clone();
        self.redraw_tray(latest.as_ref(), last_ok.as_ref());
    }

    fn redraw_tray(
        &self,
        snapshot: Option<&NotificationsSnapshot>,
        last_ok: Option<&NotificationsSnapshot>,
    ) {
        self.tray.update_snapshot(
            snapshot,
            last_ok,
            self.settings.icon_tint(),
            self.show_notification_count(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parked_task() -> (JoinHandle<()>, tokio::sync::oneshot::Receiver<()>) {
        let (alive_tx, alive_rx) = tokio::sync::oneshot::channel::<()>();
        let task = tauri::async_runtime::spawn(async move {
            let _alive = alive_tx;
            std::future::pending::<()>().await;
        });
        (task, alive_rx)
    }

    #[test]
    fn starting_a_new_sign_in_aborts_the_previous_one() {
        let mut attempts = OAuthAttempts::default();
        assert!(!attempts.is_pending());

        let first = attempts.replace();
        let (task, first_alive) = parked_task();
        attempts.track(first, task);
        assert!(attempts.is_pending());

        let second = attempts.replace();
        assert_ne!(first, second);
        assert!(!attempts.is_pending());
        assert!(tauri::async_runtime::block_on(first_alive).is_err());

        let (task, _second_alive) = parked_task();
        attempts.track(second, task);

        // A late finish from the superseded attempt leaves the new one in place.
        assert!(!attempts.finish(first));
        assert!(attempts.is_pending());
        assert!(attempts.finish(second));
        assert!(!attempts.is_pending());
    }

    #[test]
    fn cancel_aborts_running_attempt() {
        let mut attempts = OAuthAttempts::default();
        let id = attempts.replace();
        let (task, alive) = parked_task();
        attempts.track(id, task);

        assert!(attempts.cancel());
        assert!(!attempts.is_pending());
        assert!(tauri::async_runtime::block_on(alive).is_err());
        assert!(!attempts.cancel());
    }

    #[test]
    fn tracking_a_stale_id_aborts_the_task() {
        let mut attempts = OAuthAttempts::default();
        let stale = attempts.replace();
        let _current = attempts.replace();

        let (task, alive) = parked_task();
        attempts.track(stale, task);
        assert!(!attempts.is_pending());
        assert!(tauri::async_runtime::block_on(alive).is_err());
    }
}
