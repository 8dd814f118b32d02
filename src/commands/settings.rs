use crate::settings::{
    KEY_AUTOSTART_ENABLED, KEY_CHECK_UPDATES_ON_STARTUP, KEY_ICON_TINT,
    KEY_NOTIFY_ON_NEW_THREADS, KEY_REFRESH_INTERVAL_SECONDS, KEY_SHOW_NOTIFICATION_COUNT,
    MIN_REFRESH_INTERVAL_SECONDS,
};
use crate::state::AppState;
use crate::tint::IconTint;
use crate::types::{IpcError, IpcErrorCode, IpcResult, SaveSettingsPayload, SettingsState};
use tauri::{AppHandle, Runtime, State};
use tauri_plugin_autostart::ManagerExt as _;

use super::auth::auth_state;

type CommandResult<T> = Result<T, IpcError>;

#[tauri::command]
pub async fn settings_get_state<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, AppState<R>>,
) -> CommandResult<SettingsState> {
    let latest_snapshot = state.latest_snapshot.lock().await.clone();

    let autostart_enabled = app
        .autolaunch()
        .is_enabled()
        .unwrap_or(state.settings.get_bool(KEY_AUTOSTART_ENABLED, false));

    Ok(SettingsState {
        auth: auth_state(state.inner()).await,
        refresh_interval_seconds: state
            .refresh_interval_seconds()
            .min(u32::MAX as u64) as u32,
        icon_tint: state.settings.icon_tint().to_hex(),
        show_notification_count: state.show_notification_count(),
        notify_on_new_threads: state.settings.get_bool(KEY_NOTIFY_ON_NEW_THREADS, false),
        autostart_enabled,
        check_updates_on_startup: state.settings.get_bool(KEY_CHECK_UPDATES_ON_STARTUP, true),
        latest_snapshot,
        keyring_available: state.credential.is_available(),
        version: app.package_info().version.to_string(),
    })
}

#[tauri::command]
pub async fn settings_refresh_now<R: Runtime>(
    _app: AppHandle<R>,
    state: State<'_, AppState<R>>,
) -> CommandResult<IpcResult<()>> {
    Ok(state.refresh.refresh_now().await)
}

#[tauri::command]
pub async fn settings_reset_tint<R: Runtime>(
    _app: AppHandle<R>,
    state: State<'_, AppState<R>>,
) -> CommandResult<IpcResult<String>> {
    let tint = IconTint::default().to_hex();
    state.settings.set(KEY_ICON_TINT, tint.clone());
    state.redraw_latest().await;
    Ok(IpcResult::ok(tint))
}

#[tauri::command]
pub async fn settings_save<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, AppState<R>>,
    payload: SaveSettingsPayload,
) -> CommandResult<IpcResult<()>> {
    let tint = match validate_payload(&payload) {
        Ok(tint) => tint,
        Err(message) => return Ok(IpcResult::err(IpcErrorCode::Validation, message)),
    };

    let result = if payload.autostart_enabled {
        app.autolaunch().enable()
    } else {
        app.autolaunch().disable()
    };
    if let Err(e) = result {
        log::warn!("failed to update launch-at-login: {e}");
    }

    let previous_interval = state.refresh_interval_seconds();

    state.settings.set(
        KEY_REFRESH_INTERVAL_SECONDS,
        u64::from(payload.refresh_interval_seconds),
    );
    state.settings.set(KEY_ICON_TINT, tint.to_hex());
    state
        .settings
        .set(KEY_SHOW_NOTIFICATION_COUNT, payload.show_notification_count);
    state
        .settings
        .set(KEY_NOTIFY_ON_NEW_THREADS, payload.notify_on_new_threads);
    state
        .settings
        .set(KEY_AUTOSTART_ENABLED, payload.autostart_enabled);
    state.settings.set(
        KEY_CHECK_UPDATES_ON_STARTUP,
        payload.check_updates_on_startup,
    );

    log::info!("settings saved");

    // Appearance changes apply immediately; a new interval needs the loop to reschedule.
    state.redraw_latest().await;
    if previous_interval != u64::from(payload.refresh_interval_seconds) {
        state.refresh.trigger();
    }

    Ok(IpcResult::ok(()))
}

/// Checks the interval floor and parses the tint, keeping any alpha channel.
pub(crate) fn validate_payload(payload: &SaveSettingsPayload) -> Result<IconTint, String> {
    if u64::from(payload.refresh_interval_seconds) < MIN_REFRESH_INTERVAL_SECONDS {
        return Err(format!(
            "Refresh interval must be >= {MIN_REFRESH_INTERVAL_SECONDS} seconds."
        ));
    }

    payload
        .icon_tint
        .trim()
        .parse::<IconTint>()
        .map_err(|e| format!("Icon tint is not a valid colour: {e}."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(interval: u32, tint: &str) -> SaveSettingsPayload {
        SaveSettingsPayload {
            refresh_interval_seconds: interval,
            icon_tint: tint.to_string(),
            show_notification_count: true,
            notify_on_new_threads: false,
            autostart_enabled: false,
            check_updates_on_startup: true,
        }
    }

    #[test]
    fn validate_payload_enforces_interval_floor() {
        let err = validate_payload(&payload(29, "#0969DA")).unwrap_err();
        assert_eq!(err, "Refresh interval must be >= 30 seconds.");
        assert!(validate_payload(&payload(30, "#0969DA")).is_ok());
        assert!(validate_payload(&payload(0, "#0969DA")).is_err());
    }

    #[test]
    fn validate_payload_rejects_unparseable_tint() {
        let err = validate_payload(&payload(60, "blue")).unwrap_err();
        assert!(err.starts_with("Icon tint is not a valid colour"));
        assert!(validate_payload(&payload(60, "#12345")).is_err());
        assert!(validate_payload(&payload(60, "#GG0000")).is_err());
    }

    #[test]
    fn validate_payload_keeps_alpha_channel() {
        let tint = validate_payload(&payload(60, " #0969DA80 ")).unwrap();
        assert_eq!(tint.a, 0x80);
        assert_eq!(tint.to_hex(), "#0969DA80");
    }
}
