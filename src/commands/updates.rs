use crate::github::NOTIFICATIONS_WEB_URL;
use crate::redact::redact_secrets;
use crate::types::{IpcError, IpcErrorCode, IpcResult};
use crate::updater;
use crate::windows::{open_settings_window, SettingsSection};
use tauri::{AppHandle, Runtime};
use tauri_plugin_opener::OpenerExt as _;

type CommandResult<T> = Result<T, IpcError>;

#[tauri::command]
pub async fn open_settings<R: Runtime>(app: AppHandle<R>) -> CommandResult<IpcResult<()>> {
    Ok(match open_settings_window(&app, SettingsSection::Appearance) {
        Ok(()) => IpcResult::ok(()),
        Err(e) => IpcResult::err(
            IpcErrorCode::Unknown,
            redact_secrets(&e.to_string()).to_string(),
        ),
    })
}

#[tauri::command]
pub async fn open_notifications<R: Runtime>(app: AppHandle<R>) -> CommandResult<IpcResult<()>> {
    Ok(match app.opener().open_url(NOTIFICATIONS_WEB_URL, None::<&str>) {
        Ok(()) => IpcResult::ok(()),
        Err(e) => IpcResult::err(IpcErrorCode::Unknown, e.to_string()),
    })
}

#[tauri::command]
pub async fn check_for_updates<R: Runtime>(app: AppHandle<R>) -> CommandResult<IpcResult<()>> {
    Ok(updater::check_for_updates_now(app).await)
}

#[tauri::command]
pub fn app_version<R: Runtime>(app: AppHandle<R>) -> String {
    app.package_info().version.to_string()
}
