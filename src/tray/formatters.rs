use crate::notifications::reason_label;
use crate::types::{NotificationsSnapshot, NotificationsStatus, ThreadSummary};
use chrono::format::Locale;
use chrono::{DateTime, Local};

const MAX_LABEL_CHARS: usize = 60;

/// What the tray shows: the latest status, with the count and threads of the last
/// successful fetch carried across failed refreshes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrayView<'a> {
    pub latest: Option<&'a NotificationsSnapshot>,
    last_ok: Option<&'a NotificationsSnapshot>,
}

impl<'a> TrayView<'a> {
    pub fn new(
        latest: Option<&'a NotificationsSnapshot>,
        last_ok: Option<&'a NotificationsSnapshot>,
    ) -> Self {
        Self { latest, last_ok }
    }

    fn counted(&self) -> Option<&'a NotificationsSnapshot> {
        match self.latest {
            Some(ok @ NotificationsSnapshot::Ok { .. }) => Some(ok),
            Some(NotificationsSnapshot::MissingToken { .. }) | None => None,
            Some(_) => self.last_ok,
        }
    }

    pub fn count(&self) -> usize {
        self.counted().map(NotificationsSnapshot::count).unwrap_or(0)
    }

    pub fn threads(&self) -> &'a [ThreadSummary] {
        self.counted()
            .map(NotificationsSnapshot::threads)
            .unwrap_or(&[])
    }
}

/// Badge text next to the icon, e.g. `" 3"`. `None` hides the count.
pub(crate) fn format_tray_title(view: TrayView<'_>, show_count: bool) -> Option<String> {
    if !show_count {
        return None;
    }
    Some(format!(" {}", view.count()))
}

pub(crate) fn format_open_label(view: TrayView<'_>) -> String {
    format!("Open ({})", view.count())
}

pub(crate) fn status_label(status: NotificationsStatus) -> &'static str {
    match status {
        NotificationsStatus::Ok => "ok",
        NotificationsStatus::Unauthorized => "token rejected",
        NotificationsStatus::RateLimited => "rate limited",
        NotificationsStatus::Error => "error",
        NotificationsStatus::MissingToken => "not signed in",
    }
}

pub(crate) fn format_header(view: TrayView<'_>) -> String {
    match view.latest {
        None => "OctoBlast (no data)".to_string(),
        Some(NotificationsSnapshot::Ok { count: 1, .. }) => {
            "OctoBlast - 1 pull request".to_string()
        }
        Some(NotificationsSnapshot::Ok { count, .. }) => {
            format!("OctoBlast - {count} pull requests")
        }
        Some(other) => format!("OctoBlast ({})", status_label(other.status())),
    }
}

pub(crate) fn truncate_label(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub(crate) fn format_thread_label(thread: &ThreadSummary) -> String {
    truncate_label(
        &format!(
            "{} · {}: {}",
            reason_label(&thread.reason),
            thread.repository,
            thread.title
        ),
        MAX_LABEL_CHARS,
    )
}

fn system_locale() -> Locale {
    let tag = ["LC_TIME", "LC_ALL", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| "en_US".to_string());
    normalize_locale_tag(&tag).parse().unwrap_or(Locale::en_US)
}

pub(crate) fn normalize_locale_tag(tag: &str) -> String {
    let tag = tag.trim();
    let tag = tag.split('.').next().unwrap_or(tag).replace('-', "_");

    if tag.eq_ignore_ascii_case("c") {
        return "POSIX".to_string();
    }

    let mut parts = tag.split('_');
    let language = parts.next().unwrap_or_default().to_ascii_lowercase();
    match parts.next() {
        Some(territory) => format!("{language}_{}", territory.to_ascii_uppercase()),
        None => language,
    }
}

pub(crate) fn format_datetime_full(iso: &str) -> String {
    let Ok(dt) = DateTime::parse_from_rfc3339(iso) else {
        return iso.to_string();
    };
    let local = dt.with_timezone(&Local);
    let locale = system_locale();
    let date = local.format_localized("%x", locale).to_string();
    let time = local.format_localized("%X", locale).to_string();
    format!("{date}, {time}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NotificationReason;

    fn thread(id: &str) -> ThreadSummary {
        ThreadSummary {
            id: id.to_string(),
            title: "Add tray tint".to_string(),
            repository: "octo/blast".to_string(),
            reason: NotificationReason::ReviewRequested,
            web_url: format!("https://github.com/octo/blast/pull/{id}"),
        }
    }

    fn ok_snapshot(count: usize) -> NotificationsSnapshot {
        NotificationsSnapshot::Ok {
            count,
            threads: vec![],
            last_updated_at: "2026-01-06T22:59:31Z".to_string(),
        }
    }

    fn failed(status: NotificationsStatus) -> NotificationsSnapshot {
        let last_updated_at = "2026-01-06T23:04:31Z".to_string();
        let error_message = Some("Bad credentials".to_string());
        match status {
            NotificationsStatus::Unauthorized => NotificationsSnapshot::Unauthorized {
                last_updated_at,
                error_message,
            },
            NotificationsStatus::RateLimited => NotificationsSnapshot::RateLimited {
                last_updated_at,
                error_message,
            },
            NotificationsStatus::MissingToken => NotificationsSnapshot::MissingToken {
                last_updated_at,
                error_message,
            },
            _ => NotificationsSnapshot::Error {
                last_updated_at,
                error_message,
            },
        }
    }

    fn only(snapshot: &NotificationsSnapshot) -> TrayView<'_> {
        TrayView::new(Some(snapshot), None)
    }

    #[test]
    fn format_tray_title_shows_count_with_leading_space() {
        let ok = ok_snapshot(3);
        assert_eq!(format_tray_title(only(&ok), true).as_deref(), Some(" 3"));
        assert_eq!(
            format_tray_title(TrayView::new(None, None), true).as_deref(),
            Some(" 0")
        );
    }

    #[test]
    fn format_tray_title_is_hidden_when_disabled() {
        let ok = ok_snapshot(3);
        assert_eq!(format_tray_title(only(&ok), false), None);
    }

    #[test]
    fn failed_refresh_keeps_previous_count_and_threads() {
        let previous = NotificationsSnapshot::Ok {
            count: 3,
            threads: vec![thread("1"), thread("2"), thread("3")],
            last_updated_at: "2026-01-06T22:59:31Z".to_string(),
        };
        for status in [
            NotificationsStatus::Error,
            NotificationsStatus::RateLimited,
            NotificationsStatus::Unauthorized,
        ] {
            let latest = failed(status);
            let view = TrayView::new(Some(&latest), Some(&previous));
            assert_eq!(format_tray_title(view, true).as_deref(), Some(" 3"));
            assert_eq!(format_open_label(view), "Open (3)");
            assert_eq!(view.threads().len(), 3);
            assert_eq!(
                format_header(view),
                format!("OctoBlast ({})", status_label(status))
            );
        }
    }

    #[test]
    fn missing_token_drops_previous_count() {
        let previous = ok_snapshot(3);
        let latest = failed(NotificationsStatus::MissingToken);
        let view = TrayView::new(Some(&latest), Some(&previous));
        assert_eq!(view.count(), 0);
        assert!(view.threads().is_empty());
    }

    #[test]
    fn failure_without_previous_success_shows_zero() {
        let latest = failed(NotificationsStatus::Error);
        assert_eq!(format_tray_title(only(&latest), true).as_deref(), Some(" 0"));
    }

    #[test]
    fn format_open_label_uses_count() {
        let ok = ok_snapshot(7);
        assert_eq!(format_open_label(only(&ok)), "Open (7)");
        assert_eq!(format_open_label(TrayView::new(None, None)), "Open (0)");
    }

    #[test]
    fn format_header_pluralises_and_reports_status() {
        let one = ok_snapshot(1);
        let none = ok_snapshot(0);
        assert_eq!(format_header(only(&one)), "OctoBlast - 1 pull request");
        assert_eq!(format_header(only(&none)), "OctoBlast - 0 pull requests");
        let missing = failed(NotificationsStatus::MissingToken);
        assert_eq!(format_header(only(&missing)), "OctoBlast (not signed in)");
        assert_eq!(format_header(TrayView::new(None, None)), "OctoBlast (no data)");
    }

    #[test]
    fn truncate_label_adds_ellipsis() {
        assert_eq!(truncate_label("short", 10), "short");
        assert_eq!(truncate_label("abcdefghijkl", 5), "abcd…");
    }

    #[test]
    fn format_thread_label_includes_reason_and_repository() {
        assert_eq!(
            format_thread_label(&thread("1")),
            "Review requested · octo/blast: Add tray tint"
        );
    }

    #[test]
    fn format_datetime_full_falls_back_to_raw_input_on_parse_error() {
        assert_eq!(format_datetime_full("not-a-datetime"), "not-a-datetime");
        assert!(format_datetime_full("2026-01-06T22:59:31Z").contains(", "));
    }

    #[test]
    fn normalize_locale_tag_handles_common_env_values() {
        assert_eq!(normalize_locale_tag("pt_BR.UTF-8"), "pt_BR");
        assert_eq!(normalize_locale_tag("de-de.UTF-8"), "de_DE");
        assert_eq!(normalize_locale_tag("C.UTF-8"), "POSIX");
    }
}
