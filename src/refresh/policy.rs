use crate::settings::MIN_REFRESH_INTERVAL_SECONDS;
use crate::types::{NotificationsSnapshot, NotificationsStatus};

const RATE_LIMITED_BASE_MS: u64 = 5 * 60 * 1000;

/// Polling stops until the user fixes their credential.
pub(crate) fn should_pause_polling(snapshot: &NotificationsSnapshot) -> bool {
    matches!(
        snapshot.status(),
        NotificationsStatus::MissingToken | NotificationsStatus::Unauthorized
    )
}

fn compute_next_delay_ms_with_nanos(base_ms: u64, ratio: f64, nanos: i128) -> u64 {
    let frac = ((nanos % 1000) as f64) / 1000.0;
    let delta = (frac * 2.0 - 1.0) * (base_ms as f64 * ratio);
    ((base_ms as f64 + delta).max(1000.0)) as u64
}

pub(crate) fn compute_next_delay_ms(
    refresh_interval_seconds: u64,
    snapshot: &NotificationsSnapshot,
) -> u64 {
    let base_seconds = refresh_interval_seconds.max(MIN_REFRESH_INTERVAL_SECONDS);

    let (base_ms, ratio) = if snapshot.status() == NotificationsStatus::RateLimited {
        (RATE_LIMITED_BASE_MS, 0.2)
    } else {
        (base_seconds * 1000, 0.1)
    };

    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    compute_next_delay_ms_with_nanos(base_ms, ratio, nanos)
}

pub(crate) fn compute_next_delay_for_latest(
    refresh_interval_seconds: u64,
    snapshot: Option<&NotificationsSnapshot>,
) -> Option<u64> {
    let Some(snapshot) = snapshot else {
        return Some(60_000);
    };

    if should_pause_polling(snapshot) {
        None
    } else {
        Some(compute_next_delay_ms(refresh_interval_seconds, snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2026-01-01T00:00:00Z";

    fn snapshot_with_status(status: NotificationsStatus) -> NotificationsSnapshot {
        let last_updated_at = TS.to_string();
        match status {
            NotificationsStatus::Ok => NotificationsSnapshot::Ok {
                count: 3,
                threads: vec![],
                last_updated_at,
            },
            NotificationsStatus::Unauthorized => NotificationsSnapshot::Unauthorized {
                last_updated_at,
                error_message: None,
            },
            NotificationsStatus::RateLimited => NotificationsSnapshot::RateLimited {
                last_updated_at,
                error_message: None,
            },
            NotificationsStatus::Error => NotificationsSnapshot::Error {
                last_updated_at,
                error_message: None,
            },
            NotificationsStatus::MissingToken => NotificationsSnapshot::MissingToken {
                last_updated_at,
                error_message: None,
            },
        }
    }

    #[test]
    fn should_pause_polling_only_for_credential_problems() {
        assert!(should_pause_polling(&snapshot_with_status(
            NotificationsStatus::MissingToken
        )));
        assert!(should_pause_polling(&snapshot_with_status(
            NotificationsStatus::Unauthorized
        )));
        assert!(!should_pause_polling(&snapshot_with_status(
            NotificationsStatus::Error
        )));
        assert!(!should_pause_polling(&snapshot_with_status(
            NotificationsStatus::RateLimited
        )));
        assert!(!should_pause_polling(&snapshot_with_status(
            NotificationsStatus::Ok
        )));
    }

    #[test]
    fn compute_next_delay_ms_with_nanos_is_bounded() {
        let base_ms = 60_000_u64;

        let slow = compute_next_delay_ms_with_nanos(base_ms, 0.1, 0);
        assert!(slow <= base_ms);

        let fast = compute_next_delay_ms_with_nanos(base_ms, 0.1, 999);
        assert!(fast >= base_ms);

        let min = compute_next_delay_ms_with_nanos(500, 0.1, 0);
        assert!(min >= 1000);
    }

    #[test]
    fn compute_next_delay_ms_enforces_minimum_interval() {
        let ok = snapshot_with_status(NotificationsStatus::Ok);
        let delay = compute_next_delay_ms(5, &ok);
        assert!(delay >= 27_000 && delay <= 33_000, "delay was {delay}");
    }

    #[test]
    fn compute_next_delay_ms_backs_off_when_rate_limited() {
        let limited = snapshot_with_status(NotificationsStatus::RateLimited);
        let delay = compute_next_delay_ms(60, &limited);
        assert!(delay >= 240_000 && delay <= 360_000, "delay was {delay}");
    }

    #[test]
    fn compute_next_delay_for_latest_returns_none_when_paused() {
        let snapshot = snapshot_with_status(NotificationsStatus::MissingToken);
        assert_eq!(compute_next_delay_for_latest(60, Some(&snapshot)), None);
        assert_eq!(compute_next_delay_for_latest(60, None), Some(60_000));
    }
}
