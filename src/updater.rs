use crate::redact::redact_secrets;
use crate::types::{IpcErrorCode, IpcResult};
use tauri::Runtime;
use tauri_plugin_notification::NotificationExt as _;
use tauri_plugin_updater::UpdaterExt as _;

pub fn check_for_updates_background<R: Runtime>(app: tauri::AppHandle<R>) {
    tauri::async_runtime::spawn(async move {
        if let IpcResult::Err { error, .. } = check_for_updates_startup(app).await {
            log::warn!("startup update check failed: {}", error.message);
        }
    });
}

fn notify<R: Runtime>(app: &tauri::AppHandle<R>, body: &str) {
    let _ = app
        .notification()
        .builder()
        .title("OctoBlast")
        .body(body)
        .show();
}

/// `plugins.updater.pubkey` value shipped in the repository; release builds replace it.
const UNSET_RELEASE_KEY: &str = "SET_AT_RELEASE_TIME";

/// Whether the updater config carries a real minisign public key.
pub(crate) fn release_key_configured(updater_config: Option<&serde_json::Value>) -> bool {
    updater_config
        .and_then(|c| c.get("pubkey"))
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .is_some_and(|key| !key.is_empty() && key != UNSET_RELEASE_KEY)
}

fn updates_available<R: Runtime>(app: &tauri::AppHandle<R>) -> bool {
    release_key_configured(app.config().plugins.0.get("updater"))
}

fn updater_error<T>(e: impl std::fmt::Display) -> IpcResult<T> {
    IpcResult::err(
        IpcErrorCode::Updater,
        redact_secrets(&e.to_string()).to_string(),
    )
}

pub async fn check_for_updates_startup<R: Runtime>(app: tauri::AppHandle<R>) -> IpcResult<()> {
    if !updates_available(&app) {
        log::debug!("updater has no release key; skipping startup check");
        return IpcResult::ok(());
    }

    let updater = match app.updater() {
        Ok(u) => u,
        Err(e) => return updater_error(e),
    };

    match updater.check().await {
        Ok(Some(update)) => {
            log::info!("update available: v{}", update.version);
            notify(
                &app,
                &format!(
                    "Update available: v{}. Use “Check for Updates…” to install.",
                    update.version
                ),
            );
            IpcResult::ok(())
        }
        Ok(None) => {
            log::debug!("no update available");
            IpcResult::ok(())
        }
        Err(e) => updater_error(e),
    }
}

/// Checks, downloads and installs, then restarts into the new version.
pub async fn check_for_updates_now<R: Runtime>(app: tauri::AppHandle<R>) -> IpcResult<()> {
    if !updates_available(&app) {
        return IpcResult::err(
            IpcErrorCode::Updater,
            "Updates are not available in this build.",
        );
    }

    let updater = match app.updater() {
        Ok(u) => u,
        Err(e) => return updater_error(e),
    };

    match updater.check().await {
        Ok(None) => {
            notify(&app, "You're up to date.");
            IpcResult::ok(())
        }
        Ok(Some(update)) => {
            log::info!("installing update v{}", update.version);
            notify(&app, &format!("Downloading update v{}…", update.version));
            match update
                .download_and_install(|_chunk, _total| {}, || {})
                .await
            {
                Ok(()) => {
                    notify(&app, "Update installed. Restarting…");
                    app.restart()
                }
                Err(e) => {
                    log::warn!("update install failed: {}", redact_secrets(&e.to_string()));
                    updater_error(e)
                }
            }
        }
        Err(e) => updater_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bundled_updater_points_at_project_releases() {
        let config: serde_json::Value =
            serde_json::from_str(include_str!("../tauri.conf.json")).unwrap();
        assert_eq!(
            config["plugins"]["updater"]["endpoints"][0],
            "https://github.com/jbw/OctoBlast/releases/latest/download/latest.json"
        );
        assert!(config["bundle"].get("createUpdaterArtifacts").is_none());
    }

    #[test]
    fn release_key_configured_rejects_placeholder_and_missing_key() {
        assert!(!release_key_configured(None));
        assert!(!release_key_configured(Some(&json!({}))));
        assert!(!release_key_configured(Some(&json!({ "pubkey": "" }))));
        assert!(!release_key_configured(Some(&json!({ "pubkey": UNSET_RELEASE_KEY }))));
        assert!(release_key_configured(Some(&json!({
            "pubkey": "dW50cnVzdGVkIGNvbW1lbnQ6IG1pbmlzaWduIHB1YmxpYyBrZXk="
        }))));
    }
}
