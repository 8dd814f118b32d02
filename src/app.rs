use crate::commands;
use crate::github::{GitHubApiClient, NOTIFICATIONS_WEB_URL};
use crate::refresh::spawn_refresh_loop;
use crate::settings::SettingsStore;
use crate::state::{
  AppState, CredentialStore, DebugOverride, OAuthAttempts, RefreshBus,
  KEYRING_USER_GITHUB_ACCESS_TOKEN,
};
use crate::tray::{self, TrayUi};
use crate::windows::{open_settings_window, SettingsSection};
use std::sync::Arc;
use tauri::{AppHandle, Manager, Runtime};
use tauri_plugin_opener::OpenerExt as _;
use tokio::sync::{mpsc, Mutex};

fn setup_error(e: impl std::error::Error + 'static) -> tauri::Error {
  let err: Box<dyn std::error::Error> = Box::new(e);
  tauri::Error::Setup(err.into())
}

fn open_url<R: Runtime>(app: &AppHandle<R>, url: &str) {
  if let Err(e) = app.opener().open_url(url, None::<&str>) {
    log::warn!("failed to open {url}: {e}");
  }
}

fn simulate<R: Runtime>(app: &AppHandle<R>, simulated_count: Option<usize>) {
  let state = app.state::<AppState<R>>().inner().clone();
  tauri::async_runtime::spawn(async move {
    *state.debug_override.lock().await = DebugOverride { simulated_count };
    state.refresh.trigger();
  });
}

fn handle_menu_event<R: Runtime>(app: &AppHandle<R>, id: &str) {
  if let Some(url) = id.strip_prefix(tray::ITEM_THREAD_PREFIX) {
    open_url(app, url);
    return;
  }

  match id {
    tray::ITEM_OPEN_NOTIFICATIONS => open_url(app, NOTIFICATIONS_WEB_URL),
    tray::ITEM_OPEN_PREFERENCES => {
      if let Err(e) = open_settings_window(app, SettingsSection::Appearance) {
        log::warn!("failed to open preferences: {e}");
      }
    }
    tray::ITEM_CHECK_NOW => {
      let refresh = app.state::<AppState<R>>().refresh.clone();
      tauri::async_runtime::spawn(async move {
        if let crate::types::IpcResult::Err { error, .. } = refresh.refresh_now().await {
          log::warn!("manual refresh failed: {}", error.message);
        }
      });
    }
    tray::ITEM_CHECK_UPDATES => {
      let app = app.clone();
      tauri::async_runtime::spawn(async move {
        if let crate::types::IpcResult::Err { error, .. } =
          crate::updater::check_for_updates_now(app).await
        {
          log::warn!("update check failed: {}", error.message);
        }
      });
    }
    tray::ITEM_DEBUG_SIMULATE_SOME => simulate(app, Some(3)),
    tray::ITEM_DEBUG_SIMULATE_NONE => simulate(app, Some(0)),
    tray::ITEM_DEBUG_CLEAR_SIMULATION => simulate(app, None),
    tray::ITEM_QUIT => {
      log::info!("quitting");
      app.exit(0);
    }
    _ => {}
  }
}

pub fn run() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  tauri::Builder::default()
    .plugin(tauri_plugin_opener::init())
    .plugin(tauri_plugin_store::Builder::default().build())
    .plugin(tauri_plugin_autostart::init(
      tauri_plugin_autostart::MacosLauncher::LaunchAgent,
      None,
    ))
    .plugin(tauri_plugin_notification::init())
    .plugin(tauri_plugin_updater::Builder::new().build())
    .invoke_handler(tauri::generate_handler![
      commands::settings::settings_get_state,
      commands::settings::settings_save,
      commands::settings::settings_reset_tint,
      commands::settings::settings_refresh_now,
      commands::auth::auth_save_personal_token,
      commands::auth::auth_start_oauth,
      commands::auth::auth_logout,
      commands::updates::open_settings,
      commands::updates::open_notifications,
      commands::updates::check_for_updates,
      commands::updates::app_version,
    ])
    .on_menu_event(|app, event| handle_menu_event(app, event.id().as_ref()))
    .setup(|app| {
      #[cfg(target_os = "macos")]
      {
        app.set_activation_policy(tauri::ActivationPolicy::Accessory);
      }

      let app_handle = app.handle().clone();
      let settings = SettingsStore::new(&app_handle).map_err(setup_error)?;
      let tray = TrayUi::new(&app_handle)?;
      let github = GitHubApiClient::new().map_err(setup_error)?;

      let (tx, rx) = mpsc::unbounded_channel();
      let refresh = RefreshBus::new(tx);

      let state = AppState {
        settings: settings.clone(),
        credential: CredentialStore::new(KEYRING_USER_GITHUB_ACCESS_TOKEN),
        github: Arc::new(github),
        viewer_login: Arc::new(Mutex::new(None)),
        oauth_attempts: Arc::new(Mutex::new(OAuthAttempts::default())),
        latest_snapshot: Arc::new(Mutex::new(None)),
        last_ok_snapshot: Arc::new(Mutex::new(None)),
        seen_thread_ids: Arc::new(Mutex::new(None)),
        debug_override: Arc::new(Mutex::new(DebugOverride::default())),
        tray,
        refresh,
      };

      if tray::debug_menu_enabled() {
        log::info!("debug menu enabled");
      }

      spawn_refresh_loop(app_handle.clone(), state.clone(), rx);

      // First launch without a credential goes straight to the sign-in section.
      let credential = state.credential.clone();
      let handle = app_handle.clone();
      tauri::async_runtime::spawn(async move {
        if let Ok(None) = credential.load().await {
          if let Err(e) = open_settings_window(&handle, SettingsSection::Access) {
            log::warn!("failed to open preferences: {e}");
          }
        }
      });

      if settings.get_bool(crate::settings::KEY_CHECK_UPDATES_ON_STARTUP, true) {
        crate::updater::check_for_updates_background(app_handle.clone());
      }

      app.manage(state);
      Ok(())
    })
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
