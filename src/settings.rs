use crate::tint::IconTint;
use serde_json::json;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tauri::Runtime;
use tauri_plugin_store::{JsonValue, Store, StoreBuilder};

const SETTINGS_STORE_FILE: &str = "octoblast-settings.json";

pub const KEY_REFRESH_INTERVAL_SECONDS: &str = "refreshIntervalSeconds";
pub const KEY_ICON_TINT: &str = "iconTint";
pub const KEY_SHOW_NOTIFICATION_COUNT: &str = "showNotificationCount";
pub const KEY_NOTIFY_ON_NEW_THREADS: &str = "notifyOnNewThreads";
pub const KEY_AUTOSTART_ENABLED: &str = "autostartEnabled";
pub const KEY_CHECK_UPDATES_ON_STARTUP: &str = "checkUpdatesOnStartup";

pub const DEFAULT_REFRESH_INTERVAL_SECONDS: u64 = 60;
pub const MIN_REFRESH_INTERVAL_SECONDS: u64 = 30;

fn defaults() -> HashMap<String, JsonValue> {
    HashMap::from([
        (
            KEY_REFRESH_INTERVAL_SECONDS.to_string(),
            json!(DEFAULT_REFRESH_INTERVAL_SECONDS),
        ),
        (
            KEY_ICON_TINT.to_string(),
            json!(IconTint::default().to_hex()),
        ),
        (KEY_SHOW_NOTIFICATION_COUNT.to_string(), json!(true)),
        (KEY_NOTIFY_ON_NEW_THREADS.to_string(), json!(false)),
        (KEY_AUTOSTART_ENABLED.to_string(), json!(false)),
        (KEY_CHECK_UPDATES_ON_STARTUP.to_string(), json!(true)),
    ])
}

pub struct SettingsStore<R: Runtime> {
    store: Arc<Store<R>>,
}

impl<R: Runtime> Clone for SettingsStore<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<R: Runtime> SettingsStore<R> {
    pub fn new(app: &tauri::AppHandle<R>) -> tauri_plugin_store::Result<Self> {
        let store = StoreBuilder::new(app, SETTINGS_STORE_FILE)
            .defaults(defaults())
            .auto_save(Duration::from_millis(200))
            .build()?;
        Ok(Self { store })
    }

    pub fn get_u64(&self, key: &str, fallback: u64) -> u64 {
        self.store
            .get(key)
            .and_then(|v| v.as_u64())
            .unwrap_or(fallback)
    }

    pub fn get_bool(&self, key: &str, fallback: bool) -> bool {
        self.store
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(fallback)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        let v = self.store.get(key)?;
        let s = v.as_str()?.trim();
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    }

    pub fn set(&self, key: &str, value: impl Into<JsonValue>) {
        self.store.set(key.to_string(), value.into());
    }

    /// Falls back to the default tint when the stored value no longer parses.
    pub fn icon_tint(&self) -> IconTint {
        self.get_string(KEY_ICON_TINT)
            .and_then(|hex| hex.parse().ok())
            .unwrap_or_default()
    }
}
