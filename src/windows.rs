use tauri::{AppHandle, Emitter, Manager, Runtime, WebviewUrl, WebviewWindowBuilder};

pub const SETTINGS_WINDOW_LABEL: &str = "settings";

const SECTION_EVENT: &str = "settings:section";

/// Tab the preferences window should show when opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSection {
    Access,
    Appearance,
}

impl SettingsSection {
    fn anchor(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Appearance => "appearance",
        }
    }
}

pub fn open_settings_window<R: Runtime>(
    app: &AppHandle<R>,
    section: SettingsSection,
) -> tauri::Result<()> {
    if let Some(window) = app.get_webview_window(SETTINGS_WINDOW_LABEL) {
        window.emit(SECTION_EVENT, section.anchor())?;
        window.show()?;
        window.set_focus()?;
        return Ok(());
    }

    let url = format!("index.html#{}", section.anchor());
    let window = WebviewWindowBuilder::new(app, SETTINGS_WINDOW_LABEL, WebviewUrl::App(url.into()))
        .title("OctoBlast Preferences")
        .inner_size(480.0, 560.0)
        .center()
        .resizable(false)
        .minimizable(false)
        .maximizable(false)
        .skip_taskbar(true)
        .visible(true)
        .build()?;

    window.set_focus()?;
    Ok(())
}
