use crate::settings::KEY_NOTIFY_ON_NEW_THREADS;
use crate::state::AppState;
use crate::types::{NotificationReason, NotificationsSnapshot, ThreadSummary};
use std::collections::HashSet;
use tauri::{AppHandle, Runtime};
use tauri_plugin_notification::NotificationExt as _;

/// Threads not present in the last successful fetch. Nothing is new until a baseline exists.
pub(crate) fn decide_new_threads<'a>(
    seen: Option<&HashSet<String>>,
    current: &'a [ThreadSummary],
) -> Vec<&'a ThreadSummary> {
    let Some(seen) = seen else {
        return vec![];
    };
    current.iter().filter(|t| !seen.contains(&t.id)).collect()
}

pub(crate) fn reason_label(reason: &NotificationReason) -> &'static str {
    match reason {
        NotificationReason::ReviewRequested => "Review requested",
        NotificationReason::StateChange => "State changed",
        NotificationReason::Author => "Your pull request",
        NotificationReason::Mention | NotificationReason::TeamMention => "Mentioned",
        NotificationReason::Comment => "New comment",
        NotificationReason::Assign => "Assigned",
        _ => "Activity",
    }
}

fn notification_body(new_threads: &[&ThreadSummary]) -> String {
    match new_threads {
        [only] => format!(
            "{}: {} ({})",
            reason_label(&only.reason),
            only.title,
            only.repository
        ),
        many => format!("{} new pull request notifications", many.len()),
    }
}

async fn notify<R: Runtime>(app: &AppHandle<R>, body: &str) {
    let notification = app.notification().builder().title("OctoBlast").body(body);

    #[cfg(target_os = "macos")]
    let notification = notification.sound("Ping");

    #[cfg(target_os = "linux")]
    let notification = notification.sound("message-new-instant");

    let _ = notification.show();
}

/// Records the ids in `threads` as seen and returns the threads that were not.
///
/// Simulated data is neither reported nor recorded, so clearing a simulation compares real
/// threads against the last real fetch.
pub(crate) fn observe_threads(
    seen: &mut Option<HashSet<String>>,
    threads: &[ThreadSummary],
    simulated: bool,
) -> Vec<ThreadSummary> {
    if simulated {
        return vec![];
    }
    let new_threads = decide_new_threads(seen.as_ref(), threads)
        .into_iter()
        .cloned()
        .collect();
    *seen = Some(threads.iter().map(|t| t.id.clone()).collect());
    new_threads
}

pub async fn maybe_notify_new_threads<R: Runtime>(
    app: &AppHandle<R>,
    state: &AppState<R>,
    current: &NotificationsSnapshot,
    simulated: bool,
) {
    let NotificationsSnapshot::Ok { threads, .. } = current else {
        return;
    };

    let new_threads = observe_threads(&mut *state.seen_thread_ids.lock().await, threads, simulated);

    if !new_threads.is_empty() && state.settings.get_bool(KEY_NOTIFY_ON_NEW_THREADS, false) {
        log::debug!("{} new pull request thread(s)", new_threads.len());
        let refs: Vec<&ThreadSummary> = new_threads.iter().collect();
        notify(app, &notification_body(&refs)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, reason: NotificationReason) -> ThreadSummary {
        ThreadSummary {
            id: id.to_string(),
            title: format!("Fix {id}"),
            repository: "octo/blast".to_string(),
            reason,
            web_url: format!("https://github.com/octo/blast/pull/{id}"),
        }
    }

    #[test]
    fn nothing_is_new_without_a_baseline() {
        let current = vec![summary("1", NotificationReason::Author)];
        assert!(decide_new_threads(None, &current).is_empty());
    }

    #[test]
    fn reports_only_unseen_thread_ids() {
        let seen: HashSet<String> = ["1".to_string()].into_iter().collect();
        let current = vec![
            summary("1", NotificationReason::Author),
            summary("2", NotificationReason::ReviewRequested),
        ];
        let new: Vec<&str> = decide_new_threads(Some(&seen), &current)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(new, vec!["2"]);
    }

    #[test]
    fn body_describes_single_thread_or_counts_many() {
        let a = summary("1", NotificationReason::ReviewRequested);
        let b = summary("2", NotificationReason::StateChange);
        assert_eq!(
            notification_body(&[&a]),
            "Review requested: Fix 1 (octo/blast)"
        );
        assert_eq!(
            notification_body(&[&a, &b]),
            "2 new pull request notifications"
        );
    }

    #[test]
    fn simulated_threads_do_not_replace_the_baseline() {
        let real = vec![
            summary("1", NotificationReason::ReviewRequested),
            summary("2", NotificationReason::Author),
        ];
        let mut seen = None;
        assert!(observe_threads(&mut seen, &real, false).is_empty());

        let simulated = vec![summary("debug-1", NotificationReason::ReviewRequested)];
        assert!(observe_threads(&mut seen, &simulated, true).is_empty());

        let mut next = real.clone();
        next.push(summary("3", NotificationReason::Mention));
        let new: Vec<String> = observe_threads(&mut seen, &next, false)
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(new, vec!["3".to_string()]);
    }
}
